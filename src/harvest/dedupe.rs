use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::harvest::NewsRecord;

/// Separates the hashed fields so `("ab", "c")` and `("a", "bc")` differ.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Hex SHA-256 over `(source, title, link)`.
///
/// Summary and timestamps are deliberately excluded: the same post seen twice
/// with a refreshed summary is still the same post.
pub fn fingerprint(source: &str, title: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(title.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(link.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Everything a run accumulates: fingerprints seen so far and the kept rows
/// in arrival order.
#[derive(Debug, Default)]
pub struct RunState {
    seen: HashSet<String>,
    records: Vec<NewsRecord>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `record` unless a record with the same fingerprint was already
    /// kept this run. Returns whether it was kept.
    pub fn admit(&mut self, record: NewsRecord) -> bool {
        let key = fingerprint(&record.source, &record.title, &record.link);
        if !self.seen.insert(key) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NewsRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NewsRecord> {
        self.records
    }
}
