//! Process configuration read from environment variables.
//!
//! The binary loads `.env` with `dotenvy` before calling [`Config::from_env`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::directory::{DirectoryCache, DirectoryError, source_for_location};
use crate::llm::{LlmClientBuilder, LlmError, TextGenerator};
use crate::tags::{HIGHLIGHTS, TagPolicy};

pub const DEFAULT_NICKNAMES_SOURCE: &str = "data/nicknames.json";
pub const DEFAULT_CORS_ALLOW_ORIGIN: &str = "*";

/// Timeout for fetching a remote nickname directory.
const DIRECTORY_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({expected})")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Settings for the optional text-generation tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File path or http(s) URL of the nickname directory.
    pub nicknames_source: String,
    pub include_brands: bool,
    pub brands: Vec<String>,
    pub english_suffixes: Vec<String>,
    pub cors_allow_origin: String,
    /// `None` when `LLM_API_KEY` is unset, which disables the generated tier.
    pub llm: Option<LlmSettings>,
}

impl Default for Config {
    fn default() -> Self {
        let policy = TagPolicy::default();
        Self {
            nicknames_source: DEFAULT_NICKNAMES_SOURCE.to_string(),
            include_brands: policy.include_brands,
            brands: policy.brands,
            english_suffixes: policy.english_suffixes,
            cors_allow_origin: DEFAULT_CORS_ALLOW_ORIGIN.to_string(),
            llm: None,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Unset or blank variables take their defaults. Malformed booleans or
    /// numbers are errors rather than silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let include_brands = match get("TAGS_INCLUDE_BRANDS") {
            Some(value) => parse_bool("TAGS_INCLUDE_BRANDS", &value)?,
            None => defaults.include_brands,
        };

        let mut english_suffixes = get("TAGS_ENGLISH_SUFFIXES")
            .map(|v| parse_list(&v))
            .unwrap_or(defaults.english_suffixes);
        if english_suffixes.is_empty() {
            english_suffixes.push(HIGHLIGHTS.to_string());
        }

        let llm = match get("LLM_API_KEY") {
            Some(api_key) => {
                let timeout = get("LLM_TIMEOUT_SECS")
                    .map(|v| parse_secs("LLM_TIMEOUT_SECS", &v))
                    .transpose()?;
                Some(LlmSettings {
                    api_key: api_key.trim().to_string(),
                    base_url: get("LLM_BASE_URL"),
                    model: get("LLM_MODEL"),
                    timeout,
                })
            }
            None => None,
        };

        Ok(Self {
            nicknames_source: get("NICKNAMES_SOURCE")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.nicknames_source),
            include_brands,
            brands: get("TAGS_BRANDS").map(|v| parse_list(&v)).unwrap_or(defaults.brands),
            english_suffixes,
            cors_allow_origin: get("CORS_ALLOW_ORIGIN")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.cors_allow_origin),
            llm,
        })
    }

    pub fn tag_policy(&self) -> TagPolicy {
        TagPolicy {
            english_suffixes: self.english_suffixes.clone(),
            brands: self.brands.clone(),
            include_brands: self.include_brands,
        }
    }

    /// Builds the (not yet loaded) directory cache for the configured source.
    pub fn directory_cache(&self) -> Result<DirectoryCache, DirectoryError> {
        let source = source_for_location(&self.nicknames_source, DIRECTORY_FETCH_TIMEOUT)?;
        Ok(DirectoryCache::from_boxed(source))
    }

    /// Builds the text generator, or `None` when no API key is configured.
    pub fn text_generator(&self) -> Result<Option<Arc<dyn TextGenerator>>, LlmError> {
        let Some(settings) = &self.llm else {
            return Ok(None);
        };

        let mut builder = LlmClientBuilder::new().api_key(settings.api_key.clone());
        if let Some(url) = &settings.base_url {
            builder = builder.base_url(url.clone());
        }
        if let Some(model) = &settings.model {
            builder = builder.model(model.clone());
        }
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        let client: Arc<dyn TextGenerator> = Arc::new(builder.build()?);
        Ok(Some(client))
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            expected: "true or false",
        }),
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            expected: "a positive number of seconds",
        }),
    }
}

/// Comma-separated list, blanks dropped.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
