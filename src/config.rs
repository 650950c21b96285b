//! Feed list parser for `config/feeds.yaml`.
//!
//! Unlike most optional settings files, the feed list is a hard startup
//! precondition: a missing or malformed file is a fatal [`ConfigError`].
//! Category order in the YAML mapping is preserved because it decides the
//! tie-break order of the final snapshot.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Mirror used when the config names none.
pub const DEFAULT_NITTER_BASE: &str = "https://nitter.net";

/// Category key whose entries are `{handle}` declarations read through Nitter.
pub const TWITTER_ACCOUNTS_KEY: &str = "twitter_accounts";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Feed config not found: {0}")]
    NotFound(String),

    #[error("Failed to read feed config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML in feed config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid feed config: {0}")]
    Invalid(String),

    #[error("Feed config too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// A `{name, url}` declaration from any generic category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedFeed {
    pub name: String,
    pub url: String,
}

/// A `{handle}` declaration from `twitter_accounts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TwitterAccount {
    pub handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySources {
    Named(Vec<NamedFeed>),
    Twitter(Vec<TwitterAccount>),
}

/// One `categories.<key>` entry, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub key: String,
    pub sources: CategorySources,
}

/// Parsed feed list.
///
/// `nitter_mirrors` is never empty after [`FeedsConfig::load`]: an absent or
/// empty list falls back to `[nitter_base]`. Base URLs are stored without a
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedsConfig {
    pub nitter_base: String,
    pub nitter_mirrors: Vec<String>,
    pub categories: Vec<Category>,
}

#[derive(Deserialize)]
struct RawConfig {
    nitter_base: Option<String>,
    nitter_mirrors: Option<Vec<String>>,
    categories: serde_yaml::Mapping,
}

impl FeedsConfig {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load the feed list from a YAML file.
    ///
    /// - Missing file → `Err(ConfigError::NotFound)`
    /// - Invalid YAML or missing `categories` → `Err(ConfigError::Parse)`
    /// - Non-string category key → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.display(),
            categories = config.categories.len(),
            mirrors = config.nitter_mirrors.len(),
            "Loaded feed config"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(content)?;

        let nitter_base = raw
            .nitter_base
            .as_deref()
            .map(trim_base)
            .unwrap_or_else(|| DEFAULT_NITTER_BASE.to_string());

        let nitter_mirrors: Vec<String> = raw
            .nitter_mirrors
            .unwrap_or_default()
            .iter()
            .map(|m| trim_base(m))
            .filter(|m| !m.is_empty())
            .collect();
        let nitter_mirrors = if nitter_mirrors.is_empty() {
            vec![nitter_base.clone()]
        } else {
            nitter_mirrors
        };

        let mut categories = Vec::with_capacity(raw.categories.len());
        for (key, value) in raw.categories {
            let key = key
                .as_str()
                .ok_or_else(|| ConfigError::Invalid(format!("category key {key:?} is not a string")))?
                .to_string();

            // `substack:` with nothing under it is an empty list, not an error
            let sources = if value.is_null() {
                if key == TWITTER_ACCOUNTS_KEY {
                    CategorySources::Twitter(Vec::new())
                } else {
                    CategorySources::Named(Vec::new())
                }
            } else if key == TWITTER_ACCOUNTS_KEY {
                CategorySources::Twitter(serde_yaml::from_value(value)?)
            } else {
                CategorySources::Named(serde_yaml::from_value(value)?)
            };

            categories.push(Category { key, sources });
        }

        Ok(Self {
            nitter_base,
            nitter_mirrors,
            categories,
        })
    }
}

fn trim_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

// ============================================================================
// Tests
// ============================================================================
