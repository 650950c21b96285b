//! The collection run: fetch every source in order, normalize and dedupe the
//! entries, then write the dated snapshot.
//!
//! Runs are strictly sequential. A source that cannot be fetched or parsed
//! contributes nothing and the run carries on; only a failure to write the
//! snapshot itself is returned as an error.

mod dedupe;
mod normalize;

pub use dedupe::{fingerprint, RunState};
pub use normalize::{normalize_entry, normalize_entry_at, NewsRecord};

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::FeedsConfig;
use crate::feed::{expand_sources, parse_feed, FetchError, Fetcher, ParseError, SourceSpec};
use crate::storage::{write_snapshot, SnapshotError};

/// Entries kept per source, in feed order.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Why a single source contributed nothing.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    /// Calendar date naming the snapshot file
    pub date: NaiveDate,
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: usize,
    pub failed_sources: usize,
    pub rows: usize,
    pub path: PathBuf,
}

/// Fetches and normalizes sources into a [`RunState`].
pub struct Harvester {
    fetcher: Fetcher,
    max_entries: usize,
}

impl Harvester {
    pub fn new(fetcher: Fetcher, max_entries: usize) -> Self {
        Self {
            fetcher,
            max_entries,
        }
    }

    /// Processes one source, adding its new records to `state`.
    ///
    /// Returns how many records were kept after dedupe.
    pub async fn harvest_source(
        &self,
        source: &SourceSpec,
        state: &mut RunState,
    ) -> Result<usize, SourceError> {
        let fetched = self.fetcher.fetch(source).await?;
        let parsed = parse_feed(&fetched.body, self.max_entries)?;

        if let Some(problem) = &parsed.recovered_from {
            tracing::warn!(source = %source.display_name, error = %problem, "Parsing issue, using recovered entries");
        }
        if parsed.total > parsed.entries.len() {
            tracing::debug!(
                source = %source.display_name,
                total = parsed.total,
                kept = parsed.entries.len(),
                "Entry cap applied"
            );
        }

        let mut kept = 0;
        for entry in parsed.entries {
            if let Some(record) = normalize_entry(source, entry) {
                if state.admit(record) {
                    kept += 1;
                }
            }
        }
        Ok(kept)
    }

    /// Runs every source in order. Per-source failures are logged and counted.
    pub async fn collect(&self, sources: &[SourceSpec], state: &mut RunState) -> usize {
        let mut failed = 0;
        for source in sources {
            match self.harvest_source(source, state).await {
                Ok(kept) => {
                    tracing::debug!(source = %source.display_name, kept = kept, "Source done");
                }
                Err(e) => {
                    failed += 1;
                    log_skip(source, &e);
                }
            }
        }
        failed
    }
}

fn log_skip(source: &SourceSpec, error: &SourceError) {
    let origin = source.origin();
    match error {
        SourceError::Fetch(e) => tracing::warn!(
            source = %source.display_name,
            origin = %origin,
            error = %e,
            "SKIP (unreachable)"
        ),
        SourceError::Parse(e) => tracing::warn!(
            source = %source.display_name,
            origin = %origin,
            error = %e,
            "SKIP (unparseable)"
        ),
    }
}

/// One full collection run against `config`.
///
/// # Errors
///
/// Only [`SnapshotError`]: failing sources never fail the run.
pub async fn run(
    config: &FeedsConfig,
    fetcher: Fetcher,
    options: &RunOptions,
) -> Result<RunSummary, SnapshotError> {
    let sources = expand_sources(config);
    tracing::info!(feeds = sources.len(), "Loaded feeds");

    let harvester = Harvester::new(fetcher, options.max_entries);
    let mut state = RunState::new();
    let failed_sources = harvester.collect(&sources, &mut state).await;
    tracing::info!(
        items = state.len(),
        failed_sources = failed_sources,
        "Collected items"
    );

    let mut records = state.into_records();
    let path = write_snapshot(&options.output_dir, options.date, &mut records)?;

    Ok(RunSummary {
        sources: sources.len(),
        failed_sources,
        rows: records.len(),
        path,
    })
}
