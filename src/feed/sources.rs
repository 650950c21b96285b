use crate::config::{CategorySources, FeedsConfig};

/// Category assigned to every Nitter-backed source.
pub const TWITTER_CATEGORY: &str = "twitter";

/// One feed to poll during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Written to the `source` column and part of the dedupe fingerprint
    pub display_name: String,
    pub category: String,
    /// Primary fetch URL
    pub url: String,
    /// Bare handle for Nitter sources; its presence switches the fetcher to
    /// mirror fallback
    pub mirror_key: Option<String>,
}

impl SourceSpec {
    /// What a failure report should point at: the handle for mirror-backed
    /// sources, since any of several mirror URLs may have been tried, else
    /// the URL.
    pub fn origin(&self) -> &str {
        self.mirror_key.as_deref().unwrap_or(&self.url)
    }
}

/// Builds `{base}/{handle}/rss` for a Nitter mirror.
pub fn mirror_rss_url(base: &str, handle: &str) -> String {
    format!("{}/{}/rss", base.trim_end_matches('/'), handle)
}

/// Flattens the configured categories into the ordered list of sources.
///
/// Order is category declaration order, then list order inside each category,
/// and determines the final tie-break order of the snapshot. Every named feed
/// takes the category key it was declared under.
pub fn expand_sources(config: &FeedsConfig) -> Vec<SourceSpec> {
    let mut sources = Vec::new();

    for category in &config.categories {
        match &category.sources {
            CategorySources::Named(feeds) => {
                sources.extend(feeds.iter().map(|feed| SourceSpec {
                    display_name: feed.name.clone(),
                    category: category.key.clone(),
                    url: feed.url.trim().to_string(),
                    mirror_key: None,
                }));
            }
            CategorySources::Twitter(accounts) => {
                for account in accounts {
                    let handle = account.handle.trim().trim_start_matches('@');
                    if handle.is_empty() {
                        tracing::warn!(category = %category.key, "Skipping account with empty handle");
                        continue;
                    }
                    sources.push(SourceSpec {
                        display_name: format!("Twitter:{handle}"),
                        category: TWITTER_CATEGORY.to_string(),
                        url: mirror_rss_url(&config.nitter_base, handle),
                        mirror_key: Some(handle.to_string()),
                    });
                }
            }
        }
    }

    sources
}
