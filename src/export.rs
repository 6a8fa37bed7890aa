//! Export delivery: hand the CSV to a download capability or return it inline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::EXPORT_FILE_PREFIX;
use crate::csv_export::build_csv;
use crate::error::{CacheError, Result};
use crate::models::Cache;

/// Something that can save a file on the user's behalf
pub trait Downloads: Send + Sync {
    /// Save `bytes` as `filename`, returning an id for the download
    fn download(&self, filename: &str, bytes: &[u8]) -> Result<u64>;
}

/// Saves downloads into a directory
#[derive(Debug)]
pub struct DirectoryDownloads {
    dir: PathBuf,
    next_id: AtomicU64,
}

impl DirectoryDownloads {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            next_id: AtomicU64::new(1),
        }
    }

    /// The user's download directory, falling back to the current directory
    pub fn user_default() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloads for DirectoryDownloads {
    fn download(&self, filename: &str, bytes: &[u8]) -> Result<u64> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| CacheError::Download(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)
            .map_err(|e| CacheError::Download(format!("{}: {}", path.display(), e)))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        log::info!("Saved export to {} (download {})", path.display(), id);
        Ok(id)
    }
}

/// How an export was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    Downloads,
    Inline,
}

/// Outcome of an export request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExportMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
    pub count: usize,
    pub last_sync: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExportResult {
    fn empty(last_sync: Option<i64>) -> Self {
        Self {
            ok: false,
            mode: None,
            download_id: None,
            filename: None,
            csv: None,
            count: 0,
            last_sync,
            reason: Some("empty".to_string()),
        }
    }

    /// True when there was nothing to export
    pub fn is_empty(&self) -> bool {
        self.reason.as_deref() == Some("empty")
    }
}

/// File name for an export taken at `now_ms`
pub fn export_filename(now_ms: i64) -> String {
    format!("{}{}.csv", EXPORT_FILE_PREFIX, now_ms)
}

/// Export the cache. An absent or empty cache is reported as
/// `reason: "empty"`, not as an error.
pub fn handle_export(
    cache: Option<&Cache>,
    downloads: Option<&dyn Downloads>,
    now_ms: i64,
) -> Result<ExportResult> {
    let last_sync = cache.map(|c| c.last_sync).filter(|ms| *ms > 0);
    let entries = cache.map(|c| c.entries.as_slice()).unwrap_or_default();

    if entries.is_empty() {
        log::debug!("Nothing to export");
        return Ok(ExportResult::empty(last_sync));
    }

    let csv = build_csv(entries);
    let filename = export_filename(now_ms);
    let count = entries.len();

    match downloads {
        Some(downloads) => {
            let download_id = downloads.download(&filename, csv.as_bytes())?;
            Ok(ExportResult {
                ok: true,
                mode: Some(ExportMode::Downloads),
                download_id: Some(download_id),
                filename: Some(filename),
                csv: None,
                count,
                last_sync,
                reason: None,
            })
        }
        None => Ok(ExportResult {
            ok: true,
            mode: Some(ExportMode::Inline),
            download_id: None,
            filename: Some(filename),
            csv: Some(csv),
            count,
            last_sync,
            reason: None,
        }),
    }
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
