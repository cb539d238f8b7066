//! Tag construction: vocabulary, casing, cleaning, tier assembly and joining.

mod assembler;
mod cleaner;
mod joiner;
mod tag;
mod vocabulary;

pub use assembler::{
    AssembledTags, MAX_NOTE_TAGS, MatchContext, TagPolicy, TagTier, TierKind, assemble, build_tiers,
    clean_scorer_name, is_team_only_action_tag, merge_tiers,
};
pub use cleaner::{RawTags, clean_raw_tags};
pub use joiner::{SEPARATOR, join_within_limit};
pub use tag::{Tag, TagKind, case_tag};
pub use vocabulary::{HIGHLIGHTS, Language, Vocabulary, contains_action_word};

/// Longest tag, in characters, accepted from any non-mandatory source.
pub const MAX_TAG_CHARS: usize = 60;
