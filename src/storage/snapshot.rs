use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::harvest::NewsRecord;

/// Column order of every snapshot, matching [`NewsRecord`]'s field order.
pub const HEADER: [&str; 7] = [
    "source",
    "category",
    "title",
    "link",
    "summary",
    "published",
    "collected_at",
];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to prepare output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write snapshot '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `{dir}/news_raw_{YYYY-MM-DD}.csv`
pub fn snapshot_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("news_raw_{}.csv", date.format("%Y-%m-%d")))
}

/// Orders rows newest first. Stable, so equal timestamps keep arrival order.
pub fn sort_newest_first(records: &mut [NewsRecord]) {
    records.sort_by(|a, b| b.published.cmp(&a.published));
}

/// Encodes rows as CSV with a header and minimal quoting.
///
/// The header is written even when there are no rows.
pub fn encode_csv(records: &[NewsRecord]) -> Result<Vec<u8>, SnapshotError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| SnapshotError::Csv(e.into_error().into()))
}

/// Sorts `records` and writes the dated snapshot, replacing any file already
/// written for `date`.
///
/// Returns the path written.
pub fn write_snapshot(
    dir: &Path,
    date: NaiveDate,
    records: &mut [NewsRecord],
) -> Result<PathBuf, SnapshotError> {
    std::fs::create_dir_all(dir).map_err(|source| SnapshotError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    sort_newest_first(records);
    let bytes = encode_csv(records)?;

    let path = snapshot_path(dir, date);
    atomic_write(&path, &bytes).map_err(|source| SnapshotError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), rows = records.len(), "Wrote snapshot");
    Ok(path)
}

/// Write-to-temp-then-rename so a reader never sees a half-written snapshot.
fn atomic_write(dst: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let result = (|| {
        let mut temp_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        temp_file.write_all(content)?;
        temp_file.sync_all()?;
        drop(temp_file);

        // On Windows, rename fails if destination exists
        #[cfg(windows)]
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }

        std::fs::rename(&temp_path, dst)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}
