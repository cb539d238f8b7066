//! Tiered tag assembly.
//!
//! Tags are built in priority tiers and merged with first-seen-wins
//! deduplication, so a higher tier always keeps its spelling when two tiers
//! produce the same tag key. The two mandatory tiers come first and are the
//! head of the merged list; the joiner relies on that.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use super::tag::Tag;
use super::vocabulary::{HIGHLIGHTS, Vocabulary, is_action_word};
use super::MAX_TAG_CHARS;
use crate::canonical::TeamResolution;
use crate::normalize::{collapse_whitespace, tag_key};

/// Maximum number of tags taken from free-text context notes.
pub const MAX_NOTE_TAGS: usize = 3;

/// Priority tiers, highest first. The derive order is the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TierKind {
    EnglishMandatory,
    LocalMandatory,
    Contextual,
    Scorer,
    Alias,
    Generated,
}

impl TierKind {
    /// Tags from mandatory tiers are never dropped by length limits.
    pub fn is_mandatory(self) -> bool {
        matches!(self, Self::EnglishMandatory | Self::LocalMandatory)
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnglishMandatory => "english-mandatory",
            Self::LocalMandatory => "local-mandatory",
            Self::Contextual => "contextual",
            Self::Scorer => "scorer",
            Self::Alias => "alias",
            Self::Generated => "generated",
        };
        write!(f, "{name}")
    }
}

/// An ordered group of candidate tags sharing one priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTier {
    pub kind: TierKind,
    pub tags: Vec<Tag>,
}

impl TagTier {
    pub fn new(kind: TierKind, tags: Vec<Tag>) -> Self {
        Self { kind, tags }
    }
}

/// Which mandatory and brand tags to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    /// Suffixes for the English cross tags, one tag per suffix and ordering.
    pub english_suffixes: Vec<String>,
    /// Brand allow-list. Always used for casing; emitted only with `include_brands`.
    pub brands: Vec<String>,
    /// Whether brand tags join the mandatory head.
    pub include_brands: bool,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            english_suffixes: vec![HIGHLIGHTS.to_string()],
            brands: vec!["Disney Plus".to_string(), "ESPN".to_string()],
            include_brands: false,
        }
    }
}

/// Everything the assembler needs to know about one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    pub home: TeamResolution,
    pub away: TeamResolution,
    pub competition: Option<String>,
    pub score: Option<(u32, u32)>,
    pub scorers: Vec<String>,
    pub context_notes: Option<String>,
    pub season: Option<i32>,
}

impl MatchContext {
    pub fn new(home: TeamResolution, away: TeamResolution) -> Self {
        Self {
            home,
            away,
            competition: None,
            score: None,
            scorers: Vec::new(),
            context_notes: None,
            season: None,
        }
    }

    fn competition(&self) -> Option<&str> {
        self.competition
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Both orderings: home first, then away first.
    fn orderings(&self) -> [(&str, &str); 2] {
        let home = self.home.canonical.as_str();
        let away = self.away.canonical.as_str();
        [(home, away), (away, home)]
    }
}

/// Result of merging the tiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssembledTags {
    pub tags: Vec<Tag>,
    /// Number of leading tags that came from mandatory tiers.
    pub mandatory_count: usize,
}

impl AssembledTags {
    pub fn texts(&self) -> Vec<&str> {
        self.tags.iter().map(Tag::text).collect()
    }
}

/// Builds the deterministic tiers for a match.
pub fn build_tiers(ctx: &MatchContext, policy: &TagPolicy, vocab: &Vocabulary) -> Vec<TagTier> {
    vec![
        TagTier::new(TierKind::EnglishMandatory, english_mandatory(ctx, policy)),
        TagTier::new(TierKind::LocalMandatory, local_mandatory(ctx, policy, vocab)),
        TagTier::new(TierKind::Contextual, contextual(ctx, policy, vocab)),
        TagTier::new(TierKind::Scorer, scorer_tags(ctx, vocab)),
        TagTier::new(TierKind::Alias, alias_tags(ctx)),
    ]
}

/// Builds and merges the deterministic tiers.
///
/// # Examples
///
/// ```
/// use matchtags::canonical::resolve;
/// use matchtags::directory::NicknameDirectory;
/// use matchtags::tags::{MatchContext, TagPolicy, Vocabulary, assemble};
///
/// let directory = NicknameDirectory::empty();
/// let ctx = MatchContext::new(resolve("alpha", &directory), resolve("beta", &directory));
/// let assembled = assemble(&ctx, &TagPolicy::default(), &Vocabulary::default());
///
/// assert_eq!(assembled.mandatory_count, 5);
/// assert_eq!(assembled.texts()[..3], ["Alpha vs Beta highlights", "Beta vs Alpha highlights", "highlights"]);
/// ```
pub fn assemble(ctx: &MatchContext, policy: &TagPolicy, vocab: &Vocabulary) -> AssembledTags {
    merge_tiers(build_tiers(ctx, policy, vocab))
}

/// Merges tiers in priority order with first-seen-wins deduplication.
///
/// Tiers are sorted by [`TierKind`] first (stable), so callers may append
/// extra tiers in any order. Tags with an empty key are skipped, and
/// non-mandatory tags longer than 60 characters are dropped.
pub fn merge_tiers(mut tiers: Vec<TagTier>) -> AssembledTags {
    tiers.sort_by_key(|tier| tier.kind);

    let mut seen = HashSet::new();
    let mut assembled = AssembledTags::default();

    for tier in tiers {
        let mandatory = tier.kind.is_mandatory();
        let before = assembled.tags.len();

        for tag in tier.tags {
            if tag.key().is_empty() || seen.contains(tag.key()) {
                continue;
            }
            if !mandatory && tag.char_len() > MAX_TAG_CHARS {
                continue;
            }
            seen.insert(tag.key().to_string());
            assembled.tags.push(tag);
            if mandatory {
                assembled.mandatory_count += 1;
            }
        }

        debug!(tier = %tier.kind, kept = assembled.tags.len() - before, "Merged tag tier");
    }

    assembled
}

fn english_mandatory(ctx: &MatchContext, policy: &TagPolicy) -> Vec<Tag> {
    let mut tags: Vec<Tag> = ctx
        .orderings()
        .into_iter()
        .flat_map(|(left, right)| {
            policy
                .english_suffixes
                .iter()
                .map(move |suffix| Tag::cross(left, right, Some(suffix.as_str())))
        })
        .collect();
    tags.push(Tag::action(HIGHLIGHTS));
    tags
}

fn local_mandatory(ctx: &MatchContext, policy: &TagPolicy, vocab: &Vocabulary) -> Vec<Tag> {
    let mut tags: Vec<Tag> = ctx
        .orderings()
        .into_iter()
        .map(|(left, right)| Tag::cross(left, right, Some(vocab.summary)))
        .collect();
    if policy.include_brands {
        tags.extend(policy.brands.iter().map(|brand| Tag::brand(brand)));
    }
    tags
}

fn contextual(ctx: &MatchContext, policy: &TagPolicy, vocab: &Vocabulary) -> Vec<Tag> {
    let mut tags = Vec::new();
    let home = ctx.home.canonical.as_str();
    let away = ctx.away.canonical.as_str();

    if let Some(competition) = ctx.competition() {
        tags.push(Tag::classify(competition, &policy.brands));
        if let Some(season) = ctx.season {
            tags.push(Tag::generic(&format!("{competition} {season}")));
        }
    }

    tags.push(Tag::cross(home, away, None));
    tags.push(Tag::cross(home, away, Some(vocab.goals)));

    if let Some((home_goals, away_goals)) = ctx.score {
        tags.push(Tag::cross(home, away, Some(format!("{home_goals}-{away_goals}").as_str())));
        tags.push(Tag::cross(away, home, Some(format!("{away_goals}-{home_goals}").as_str())));
    }

    tags.push(Tag::action(vocab.summary));
    tags.push(Tag::action(vocab.goals));
    tags.push(Tag::action(vocab.result));

    tags.extend(
        note_fragments(ctx.context_notes.as_deref())
            .into_iter()
            .filter(|note| !is_team_only_action_tag(note, &ctx.home, &ctx.away))
            .take(MAX_NOTE_TAGS)
            .map(|note| Tag::classify(&note, &policy.brands)),
    );

    tags
}

/// Splits context notes into verbatim fragments that fit a tag.
fn note_fragments(notes: Option<&str>) -> Vec<String> {
    let Some(notes) = notes else {
        return Vec::new();
    };
    notes
        .split(['\n', ';', ','])
        .map(collapse_whitespace)
        .filter(|fragment| !fragment.is_empty() && fragment.chars().count() <= MAX_TAG_CHARS)
        .collect()
}

fn scorer_tags(ctx: &MatchContext, vocab: &Vocabulary) -> Vec<Tag> {
    let mut tags = Vec::new();
    for scorer in &ctx.scorers {
        let name = clean_scorer_name(scorer);
        if name.is_empty() {
            continue;
        }
        tags.push(Tag::scorer(vocab.goal_by, &name));
        if let Some((_, surname)) = name.rsplit_once(' ') {
            tags.push(Tag::scorer(vocab.goal_by, surname));
        }
    }
    tags
}

/// Strips trailing minute markers such as `23'` or `(45+2')` from a scorer entry.
pub fn clean_scorer_name(raw: &str) -> String {
    let trimmed = raw.trim_end_matches(|c: char| {
        c.is_ascii_digit() || c.is_whitespace() || matches!(c, '\'' | '’' | '+' | '(' | ')' | '.')
    });
    collapse_whitespace(trimmed)
}

fn alias_tags(ctx: &MatchContext) -> Vec<Tag> {
    [&ctx.home, &ctx.away]
        .into_iter()
        .filter(|team| team.has_distinct_short())
        .map(|team| Tag::generic(&team.short))
        .collect()
}

/// Whether a free-text tag pairs an action word with only one of the teams.
///
/// Such tags fit either club's own upload better than the shared match video,
/// so they are rejected from free-text pools. Team names are matched as whole
/// word sequences (canonical or short form), never as substrings.
///
/// # Examples
///
/// ```
/// use matchtags::canonical::TeamResolution;
/// use matchtags::tags::is_team_only_action_tag;
///
/// let alpha = TeamResolution { canonical: "Alpha".into(), short: "Alpha".into() };
/// let beta = TeamResolution { canonical: "Beta".into(), short: "Beta".into() };
///
/// assert!(is_team_only_action_tag("Alpha goals", &alpha, &beta));
/// assert!(!is_team_only_action_tag("Alpha Beta goals", &alpha, &beta));
/// assert!(!is_team_only_action_tag("Alpha fans", &alpha, &beta));
/// ```
pub fn is_team_only_action_tag(tag: &str, home: &TeamResolution, away: &TeamResolution) -> bool {
    let key = tag_key(tag);
    let tokens: Vec<&str> = key.split(' ').filter(|t| !t.is_empty()).collect();

    if !tokens.iter().any(|token| is_action_word(token)) {
        return false;
    }

    mentions_team(&tokens, home) != mentions_team(&tokens, away)
}

fn mentions_team(tokens: &[&str], team: &TeamResolution) -> bool {
    [&team.canonical, &team.short].into_iter().any(|name| {
        let name_key = tag_key(name);
        let name_tokens: Vec<&str> = name_key.split(' ').filter(|t| !t.is_empty()).collect();
        !name_tokens.is_empty() && tokens.windows(name_tokens.len()).any(|w| w == name_tokens.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::vocabulary::Language;

    fn team(canonical: &str, short: &str) -> TeamResolution {
        TeamResolution {
            canonical: canonical.to_string(),
            short: short.to_string(),
        }
    }

    fn river_boca() -> MatchContext {
        let mut ctx = MatchContext::new(team("River Plate", "River"), team("Boca Juniors", "Boca"));
        ctx.score = Some((2, 1));
        ctx.scorers = vec!["Julián Álvarez".to_string(), "Edinson Cavani 67'".to_string()];
        ctx
    }

    #[test]
    fn mandatory_head_is_english_then_local() {
        let assembled = assemble(&river_boca(), &TagPolicy::default(), &Vocabulary::default());

        assert_eq!(assembled.mandatory_count, 5);
        assert_eq!(
            assembled.texts()[..5],
            [
                "River Plate vs Boca Juniors highlights",
                "Boca Juniors vs River Plate highlights",
                "highlights",
                "River Plate vs Boca Juniors resumen",
                "Boca Juniors vs River Plate resumen",
            ]
        );
    }

    #[test]
    fn brands_join_mandatory_head_when_enabled() {
        let policy = TagPolicy {
            include_brands: true,
            ..TagPolicy::default()
        };
        let assembled = assemble(&river_boca(), &policy, &Vocabulary::default());

        assert_eq!(assembled.mandatory_count, 7);
        assert_eq!(assembled.texts()[5..7], ["Disney Plus", "ESPN"]);
    }

    #[test]
    fn extra_english_suffixes_multiply_cross_tags() {
        let policy = TagPolicy {
            english_suffixes: vec!["highlights".to_string(), "goals".to_string()],
            ..TagPolicy::default()
        };
        let assembled = assemble(&river_boca(), &policy, &Vocabulary::default());

        assert_eq!(assembled.mandatory_count, 7);
        assert_eq!(assembled.texts()[1], "River Plate vs Boca Juniors goals");
    }

    #[test]
    fn score_tags_are_written_from_each_side() {
        let texts: Vec<String> = assemble(&river_boca(), &TagPolicy::default(), &Vocabulary::default())
            .tags
            .into_iter()
            .map(Tag::into_text)
            .collect();

        assert!(texts.contains(&"River Plate vs Boca Juniors 2-1".to_string()));
        assert!(texts.contains(&"Boca Juniors vs River Plate 1-2".to_string()));
    }

    #[test]
    fn scorer_tags_include_full_name_and_surname() {
        let assembled = assemble(&river_boca(), &TagPolicy::default(), &Vocabulary::default());
        let texts = assembled.texts();

        assert!(texts.contains(&"gol de Julián Álvarez"));
        assert!(texts.contains(&"gol de Álvarez"));
        assert!(texts.contains(&"gol de Edinson Cavani"));
        assert!(texts.contains(&"gol de Cavani"));
    }

    #[test]
    fn english_vocabulary_changes_local_words() {
        let vocab = Language::En.vocabulary();
        let assembled = assemble(&river_boca(), &TagPolicy::default(), &vocab);
        let texts = assembled.texts();

        assert_eq!(texts[3], "River Plate vs Boca Juniors summary");
        assert!(texts.contains(&"goal by Cavani"));
    }

    #[test]
    fn alias_tier_uses_distinct_short_forms() {
        let assembled = assemble(&river_boca(), &TagPolicy::default(), &Vocabulary::default());
        let texts = assembled.texts();
        let n = texts.len();

        assert_eq!(texts[n - 2..], ["River", "Boca"]);
    }

    #[test]
    fn alias_tier_skips_short_equal_to_canonical() {
        let ctx = MatchContext::new(team("Alpha", "Alpha"), team("Beta", "BETA"));
        let assembled = assemble(&ctx, &TagPolicy::default(), &Vocabulary::default());

        assert!(!assembled.texts().contains(&"Alpha"));
        assert!(!assembled.texts().contains(&"Beta"));
    }

    #[test]
    fn merged_tags_have_unique_keys() {
        let mut ctx = river_boca();
        ctx.context_notes = Some("Superclásico; River Plate vs Boca Juniors\nresumen".to_string());
        let assembled = assemble(&ctx, &TagPolicy::default(), &Vocabulary::default());

        let keys: HashSet<&str> = assembled.tags.iter().map(Tag::key).collect();
        assert_eq!(keys.len(), assembled.tags.len());
        assert!(assembled.texts().contains(&"Superclásico"));
    }

    #[test]
    fn higher_tier_wins_duplicate() {
        let tiers = vec![
            TagTier::new(TierKind::Generated, vec![Tag::generic("boca juniors")]),
            TagTier::new(TierKind::Contextual, vec![Tag::brand("BOCA JUNIORS")]),
        ];
        let assembled = merge_tiers(tiers);

        assert_eq!(assembled.texts(), ["BOCA JUNIORS"]);
        assert_eq!(assembled.mandatory_count, 0);
    }

    #[test]
    fn long_optional_tags_are_dropped_but_mandatory_are_kept() {
        let long = "x".repeat(70);
        let tiers = vec![
            TagTier::new(TierKind::EnglishMandatory, vec![Tag::action(&long)]),
            TagTier::new(TierKind::Contextual, vec![Tag::action(&"y".repeat(61))]),
        ];
        let assembled = merge_tiers(tiers);

        assert_eq!(assembled.texts(), [long.as_str()]);
        assert_eq!(assembled.mandatory_count, 1);
    }

    #[test]
    fn context_notes_capped_at_three() {
        let mut ctx = river_boca();
        ctx.context_notes = Some("uno, dos, tres, cuatro".to_string());
        let tags = contextual(&ctx, &TagPolicy::default(), &Vocabulary::default());
        let texts: Vec<&str> = tags.iter().map(Tag::text).collect();

        assert!(texts.contains(&"Tres"));
        assert!(!texts.contains(&"Cuatro"));
    }

    #[test]
    fn single_team_action_notes_are_rejected() {
        let mut ctx = river_boca();
        ctx.context_notes = Some("goles de River; Boca highlights; River Boca goles".to_string());
        let tags = contextual(&ctx, &TagPolicy::default(), &Vocabulary::default());
        let keys: Vec<&str> = tags.iter().map(Tag::key).collect();

        assert!(!keys.contains(&"goles de river"));
        assert!(!keys.contains(&"boca highlights"));
        assert!(keys.contains(&"river boca goles"));
    }

    #[test]
    fn rejected_notes_do_not_use_up_note_slots() {
        let mut ctx = river_boca();
        ctx.context_notes = Some("resumen River, goles de Boca, uno, dos, tres".to_string());
        let tags = contextual(&ctx, &TagPolicy::default(), &Vocabulary::default());
        let texts: Vec<&str> = tags.iter().map(Tag::text).collect();

        assert!(texts.ends_with(&["Uno", "Dos", "Tres"]));
    }

    #[test]
    fn competition_and_season_tags() {
        let mut ctx = river_boca();
        ctx.competition = Some("Liga Profesional".to_string());
        ctx.season = Some(2024);
        let tags = contextual(&ctx, &TagPolicy::default(), &Vocabulary::default());

        assert_eq!(tags[0].text(), "Liga Profesional");
        assert_eq!(tags[1].text(), "Liga Profesional 2024");
    }

    #[test]
    fn clean_scorer_name_strips_minutes() {
        assert_eq!(clean_scorer_name("Cavani 67'"), "Cavani");
        assert_eq!(clean_scorer_name("Julián Álvarez (45+2')"), "Julián Álvarez");
        assert_eq!(clean_scorer_name("  Borja  "), "Borja");
        assert_eq!(clean_scorer_name("90'"), "");
    }

    #[test]
    fn team_only_action_filter() {
        let alpha = team("Alpha", "Alpha");
        let beta = team("Beta", "Beta");

        assert!(is_team_only_action_tag("Alpha goals", &alpha, &beta));
        assert!(is_team_only_action_tag("resumen Beta", &alpha, &beta));
        assert!(!is_team_only_action_tag("Alpha Beta goals", &alpha, &beta));
        assert!(!is_team_only_action_tag("Beta Alpha goals", &alpha, &beta));
        assert!(!is_team_only_action_tag("goals", &alpha, &beta));
    }

    #[test]
    fn team_only_filter_uses_word_boundaries() {
        let alpha = team("Alpha", "Alpha");
        let beta = team("Beta", "Beta");

        // "Alphabet" contains "Alpha" as a substring only.
        assert!(!is_team_only_action_tag("Alphabet goals", &alpha, &beta));
    }

    #[test]
    fn team_only_filter_matches_short_forms() {
        let river = team("River Plate", "River");
        let boca = team("Boca Juniors", "Boca");

        assert!(is_team_only_action_tag("goles de River", &river, &boca));
        assert!(!is_team_only_action_tag("River vs Boca highlights", &river, &boca));
        assert!(is_team_only_action_tag("Boca Juniors highlights", &river, &boca));
    }
}
