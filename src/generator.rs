//! Request-level tag generation.
//!
//! [`TagGenerator`] ties the pieces together: it validates a
//! [`MatchRequest`], canonicalizes both teams against the cached directory,
//! assembles the deterministic tiers, optionally asks a [`TextGenerator`] for
//! extra candidates, and joins the result within the requested budget.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;
use time::macros::format_description;
use tracing::{debug, info};

use crate::canonical::{TeamResolution, resolve_with_mode};
use crate::directory::DirectoryCache;
use crate::llm::{LlmError, TextGenerator};
use crate::tags::{
    Language, MatchContext, RawTags, Tag, TagPolicy, TagTier, TierKind, build_tiers, clean_raw_tags,
    clean_scorer_name, is_team_only_action_tag, join_within_limit, merge_tiers,
};

/// Default language code when the request names none.
pub const DEFAULT_LANG: &str = "es";

/// Default character budget for the joined tag string.
pub const DEFAULT_MAX_LEN: usize = 500;

/// Prompt template for the optional text-generation tier.
///
/// `{language}` and `{match}` are substituted before sending.
const PROMPT_TEMPLATE: &str = r#"Suggest extra video tags for a football match highlights upload.

RULES:
1. Return ONLY a comma-separated list of tags, no numbering and no commentary
2. Give 5 to 15 tags, each at most 60 characters
3. Use only the facts below; never invent players, scores or events
4. Never pair a category word (highlights, goals, resumen, goles) with just one of the teams
5. Write the tags in {language}

MATCH:
{match}

TAGS:"#;

/// Errors surfaced by [`TagGenerator::generate`].
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The request is unusable as given.
    #[error("{0}")]
    Validation(String),

    /// The text-generation service failed.
    #[error("Text generation failed: {0}")]
    Upstream(#[source] LlmError),
}

/// A score given either as a JSON number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(u32),
    Text(String),
}

impl From<u32> for ScoreValue {
    fn from(value: u32) -> Self {
        Self::Number(value)
    }
}

/// Scorers given as a list or as one newline-delimited string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScorerList {
    Text(String),
    List(Vec<String>),
}

impl ScorerList {
    /// Non-empty entries with minute markers removed.
    pub fn names(&self) -> Vec<String> {
        let entries: Vec<&str> = match self {
            Self::Text(text) => text.lines().collect(),
            Self::List(items) => items.iter().map(String::as_str).collect(),
        };
        entries
            .into_iter()
            .map(clean_scorer_name)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

impl From<Vec<String>> for ScorerList {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Incoming match metadata, as posted to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub home_score: Option<ScoreValue>,
    #[serde(default)]
    pub away_score: Option<ScoreValue>,
    #[serde(default)]
    pub scorers: Option<ScorerList>,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    #[serde(default)]
    pub match_date: Option<String>,
    #[serde(default)]
    pub context_notes: Option<String>,
}

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

fn default_max_len() -> usize {
    DEFAULT_MAX_LEN
}

impl MatchRequest {
    /// A request with just the two team names and every default.
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            competition: None,
            home_team: Some(home_team.into()),
            away_team: Some(away_team.into()),
            home_score: None,
            away_score: None,
            scorers: None,
            lang: default_lang(),
            max_len: default_max_len(),
            match_date: None,
            context_notes: None,
        }
    }

    fn team_name<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, GenerateError> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GenerateError::Validation(format!("{field} is required")))
    }

    /// Both scores, or `None` when either is missing or blank.
    fn score(&self) -> Result<Option<(u32, u32)>, GenerateError> {
        let home = parse_score(self.home_score.as_ref(), "homeScore")?;
        let away = parse_score(self.away_score.as_ref(), "awayScore")?;
        Ok(home.zip(away))
    }

    /// Year of `matchDate` when it parses as `YYYY-MM-DD` (a longer timestamp
    /// is cut to its date part).
    fn season(&self) -> Option<i32> {
        let raw = self.match_date.as_deref()?.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        match Date::parse(date_part, format_description!("[year]-[month]-[day]")) {
            Ok(date) => Some(date.year()),
            Err(e) => {
                debug!(match_date = raw, error = %e, "Ignoring unparsable match date");
                None
            }
        }
    }
}

fn parse_score(value: Option<&ScoreValue>, field: &str) -> Result<Option<u32>, GenerateError> {
    match value {
        None => Ok(None),
        Some(ScoreValue::Number(n)) => Ok(Some(*n)),
        Some(ScoreValue::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(ScoreValue::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            GenerateError::Validation(format!("{field} must be a non-negative integer"))
        }),
    }
}

/// Canonical names for both sides, as echoed in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTeams {
    pub home: TeamResolution,
    pub away: TeamResolution,
}

/// Outcome of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResult {
    /// Tags joined with `", "` within the requested budget.
    pub tags: String,
    /// Every assembled tag, before the budget is applied.
    pub tag_list: Vec<Tag>,
    pub mandatory_count: usize,
    pub teams: ResolvedTeams,
}

/// Generates tags for match requests.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use matchtags::directory::{DirectoryCache, NicknameDirectory};
/// use matchtags::generator::{MatchRequest, TagGenerator};
/// use matchtags::tags::TagPolicy;
///
/// let cache = Arc::new(DirectoryCache::preloaded(NicknameDirectory::empty()));
/// let generator = TagGenerator::new(cache, TagPolicy::default());
///
/// let result = generator.generate(&MatchRequest::new("alpha", "beta")).unwrap();
/// assert!(result.tags.starts_with("Alpha vs Beta highlights, Beta vs Alpha highlights, highlights"));
/// ```
pub struct TagGenerator {
    directory: Arc<DirectoryCache>,
    policy: TagPolicy,
    text_generator: Option<Arc<dyn TextGenerator>>,
}

impl TagGenerator {
    pub fn new(directory: Arc<DirectoryCache>, policy: TagPolicy) -> Self {
        Self {
            directory,
            policy,
            text_generator: None,
        }
    }

    /// Adds the text-generation tier.
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    pub fn policy(&self) -> &TagPolicy {
        &self.policy
    }

    /// Runs the whole pipeline for one request.
    ///
    /// Validation happens before any collaborator is contacted.
    pub fn generate(&self, request: &MatchRequest) -> Result<TagResult, GenerateError> {
        let home_raw = MatchRequest::team_name(&request.home_team, "homeTeam")?;
        let away_raw = MatchRequest::team_name(&request.away_team, "awayTeam")?;
        let score = request.score()?;

        let language = Language::parse(&request.lang);
        let vocab = language.vocabulary();

        let directory = self.directory.get();
        let (home, home_mode) = resolve_with_mode(home_raw, &directory);
        let (away, away_mode) = resolve_with_mode(away_raw, &directory);
        debug!(home = %home.canonical, %home_mode, away = %away.canonical, %away_mode, "Teams resolved");

        let ctx = MatchContext {
            home,
            away,
            competition: request.competition.clone(),
            score,
            scorers: request.scorers.as_ref().map(ScorerList::names).unwrap_or_default(),
            context_notes: request.context_notes.clone(),
            season: request.season(),
        };

        let mut tiers = build_tiers(&ctx, &self.policy, &vocab);
        if let Some(generator) = &self.text_generator {
            tiers.push(self.generated_tier(generator.as_ref(), &ctx, language)?);
        }

        let assembled = merge_tiers(tiers);
        let texts: Vec<&str> = assembled.texts();
        let joined = join_within_limit(&texts, request.max_len, assembled.mandatory_count);

        info!(
            home = %ctx.home.canonical,
            away = %ctx.away.canonical,
            tags = assembled.tags.len(),
            mandatory = assembled.mandatory_count,
            joined_chars = joined.chars().count(),
            "Tags generated"
        );

        Ok(TagResult {
            tags: joined,
            tag_list: assembled.tags,
            mandatory_count: assembled.mandatory_count,
            teams: ResolvedTeams {
                home: ctx.home,
                away: ctx.away,
            },
        })
    }

    fn generated_tier(
        &self,
        generator: &dyn TextGenerator,
        ctx: &MatchContext,
        language: Language,
    ) -> Result<TagTier, GenerateError> {
        let prompt = build_prompt(ctx, language);
        let raw = generator.generate(&prompt).map_err(GenerateError::Upstream)?;

        let cleaned = clean_raw_tags(&RawTags::Text(raw));
        let received = cleaned.len();
        let tags: Vec<Tag> = cleaned
            .into_iter()
            .filter(|tag| !is_team_only_action_tag(tag, &ctx.home, &ctx.away))
            .map(|tag| Tag::classify(&tag, &self.policy.brands))
            .collect();

        debug!(received, kept = tags.len(), "Generated tags cleaned");
        Ok(TagTier::new(TierKind::Generated, tags))
    }
}

/// Renders the prompt sent to the text generator.
pub fn build_prompt(ctx: &MatchContext, language: Language) -> String {
    let mut lines = vec![
        format!("Home: {}", ctx.home.canonical),
        format!("Away: {}", ctx.away.canonical),
    ];
    if let Some(competition) = ctx.competition.as_deref().filter(|c| !c.trim().is_empty()) {
        lines.push(format!("Competition: {}", competition.trim()));
    }
    if let Some(season) = ctx.season {
        lines.push(format!("Season: {season}"));
    }
    if let Some((home, away)) = ctx.score {
        lines.push(format!("Score: {home}-{away}"));
    }
    if !ctx.scorers.is_empty() {
        lines.push(format!("Scorers: {}", ctx.scorers.join("; ")));
    }
    if let Some(notes) = ctx.context_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(format!("Notes: {}", notes.trim()));
    }

    let language_name = match language {
        Language::Es => "Spanish",
        Language::En => "English",
    };

    PROMPT_TEMPLATE
        .replace("{language}", language_name)
        .replace("{match}", &lines.join("\n"))
}
