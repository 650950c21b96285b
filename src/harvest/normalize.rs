use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::feed::{RawEntry, SourceSpec};
use crate::util::clean_summary;

/// One snapshot row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsRecord {
    pub source: String,
    pub category: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    #[serde(serialize_with = "iso8601")]
    pub published: DateTime<Utc>,
    #[serde(serialize_with = "iso8601")]
    pub collected_at: DateTime<Utc>,
}

fn iso8601<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339())
}

/// Converts a parsed entry into a row, stamping it with the current instant.
///
/// Returns `None` for entries with neither a title nor a link.
pub fn normalize_entry(source: &SourceSpec, entry: RawEntry) -> Option<NewsRecord> {
    normalize_entry_at(source, entry, Utc::now())
}

/// [`normalize_entry`] with an explicit collection instant.
///
/// An entry without a usable date is published "now", so its `published`
/// equals its `collected_at`.
pub fn normalize_entry_at(
    source: &SourceSpec,
    entry: RawEntry,
    collected_at: DateTime<Utc>,
) -> Option<NewsRecord> {
    let title = trimmed(entry.title);
    let link = trimmed(entry.link);
    if title.is_empty() && link.is_empty() {
        return None;
    }

    let summary = entry
        .summary
        .filter(|s| !s.trim().is_empty())
        .or(entry.description)
        .map(|s| clean_summary(&s))
        .unwrap_or_default();

    let published = entry
        .published
        .or(entry.updated)
        .unwrap_or(collected_at);

    Some(NewsRecord {
        source: source.display_name.clone(),
        category: source.category.clone(),
        title,
        link,
        summary,
        published,
        collected_at,
    })
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
