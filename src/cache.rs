//! Cache Snapshot persistence.
//!
//! The snapshot is a UTF-8 JSON array of `{ id, question, answer, url }`
//! records at a fixed path. A missing file is a cache miss, not an error.
//! A snapshot's age is its file modification time.
//! Writes go to a sibling temp file first and are renamed into place so a
//! crash mid-write never leaves a truncated snapshot behind.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use crate::error::CacheError;
use crate::models::FaqEntry;

/// A snapshot as read from disk.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub entries: Vec<FaqEntry>,
    /// Time since the file was last written.
    pub age: Duration,
}

impl Snapshot {
    pub fn is_expired(&self, max_age: Option<Duration>) -> bool {
        max_age.is_some_and(|max_age| self.age > max_age)
    }
}

/// Read the snapshot at `path`. Returns `Ok(None)` when the file does not exist.
///
/// Expiry is left to the caller so an expired snapshot can still be served
/// when the source is unreachable.
pub fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, CacheError> {
    if !path.exists() {
        return Ok(None);
    }

    let modified = std::fs::metadata(path)?.modified()?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default();

    let content = std::fs::read_to_string(path)?;
    let entries: Vec<FaqEntry> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), age_secs = age.as_secs(), "read cache snapshot");
    Ok(Some(Snapshot { entries, age }))
}

/// Overwrite the snapshot at `path` with `entries`.
pub fn write_snapshot(path: &Path, entries: &[FaqEntry]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(entries)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Last-modified time of the snapshot, if it exists.
pub fn snapshot_modified(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
