//! Model downloads into the registered category directories.
//!
//! A download streams into `<destination>.tmp` and is renamed only once the
//! byte count matches the announced length, so a scan never picks up a
//! partial file. Downloads run as background tasks; callers poll them by id
//! and may cancel them at any time. A finished download is reported once and
//! then forgotten.

use crate::config::{is_asset_category, DownloadConfig};
use crate::error::{LinkerError, Result};
use crate::models::AssetRecord;
use crate::registry::{canonical_category, FolderPaths};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{Notify, RwLock};
use tracing::{debug, error, info, warn};

fn default_category() -> String {
    DownloadConfig::DEFAULT_CATEGORY.to_string()
}

/// What to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Relative to the category's first directory.
    pub filename: String,
    /// Caller-chosen handle for progress and cancellation.
    pub download_id: String,
}

/// Returned when a download has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadStarted {
    pub download_id: String,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
}

/// Bytes received so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadProgress {
    pub downloaded: u64,
    /// Zero when the server sent no length.
    pub total: u64,
    /// Whole percent, zero when `total` is unknown.
    pub percent: u64,
}

impl DownloadProgress {
    fn new(downloaded: u64, total: u64) -> Self {
        let percent = if total > 0 {
            downloaded.saturating_mul(100) / total
        } else {
            0
        };
        Self {
            downloaded,
            total,
            percent,
        }
    }
}

/// A file that landed at its final name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub size: u64,
    pub category: String,
    pub base_directory: PathBuf,
}

impl DownloadResult {
    /// Record the scanner would produce for the downloaded file.
    pub fn to_record(&self) -> AssetRecord {
        let relative = self
            .path
            .strip_prefix(&self.base_directory)
            .unwrap_or(&self.path);
        AssetRecord {
            filename: self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            absolute_path: self.path.to_string_lossy().to_string(),
            relative_path: relative.to_string_lossy().to_string(),
            category: self.category.clone(),
            base_directory: self.base_directory.to_string_lossy().to_string(),
        }
    }
}

/// Point-in-time view of one download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSnapshot {
    pub status: DownloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<DownloadProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DownloadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
enum DownloadOutcome {
    Completed(DownloadResult),
    Failed(String),
    Cancelled,
}

struct ActiveDownload {
    url: String,
    destination: PathBuf,
    category: String,
    base_directory: PathBuf,
    downloaded: AtomicU64,
    total: AtomicU64,
    cancelled: AtomicBool,
    cancel_notify: Notify,
    outcome: OnceLock<DownloadOutcome>,
}

impl ActiveDownload {
    fn progress(&self) -> DownloadProgress {
        DownloadProgress::new(
            self.downloaded.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }

    fn is_finished(&self) -> bool {
        self.outcome.get().is_some()
    }

    fn snapshot(&self) -> DownloadSnapshot {
        let progress = Some(self.progress());
        match self.outcome.get() {
            Some(DownloadOutcome::Completed(result)) => DownloadSnapshot {
                status: DownloadStatus::Completed,
                progress,
                result: Some(result.clone()),
                error: None,
            },
            Some(DownloadOutcome::Failed(message)) => DownloadSnapshot {
                status: DownloadStatus::Failed,
                progress,
                result: None,
                error: Some(message.clone()),
            },
            Some(DownloadOutcome::Cancelled) => DownloadSnapshot {
                status: DownloadStatus::Cancelled,
                progress,
                result: None,
                error: None,
            },
            None if self.cancelled.load(Ordering::SeqCst) => DownloadSnapshot {
                status: DownloadStatus::Cancelling,
                progress,
                result: None,
                error: None,
            },
            None => DownloadSnapshot {
                status: DownloadStatus::Downloading,
                progress,
                result: None,
                error: None,
            },
        }
    }
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(DownloadConfig::TEMP_SUFFIX);
    PathBuf::from(name)
}

fn invalid(message: impl Into<String>) -> LinkerError {
    LinkerError::InvalidParams {
        message: message.into(),
    }
}

/// Only plain relative components; no `..`, no roots.
fn validate_filename(filename: &str) -> Result<()> {
    let path = Path::new(filename);
    let plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !plain || path.file_name().is_none() {
        return Err(invalid(format!(
            "filename must be a relative path inside the category directory: {}",
            filename
        )));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| invalid(format!("invalid url {}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(format!("unsupported url scheme: {}", scheme))),
    }
}

/// Tracks background downloads by id.
///
/// Cheap to clone; clones share the download table.
#[derive(Clone)]
pub struct DownloadManager {
    client: reqwest::Client,
    downloads: Arc<RwLock<HashMap<String, Arc<ActiveDownload>>>>,
}

impl DownloadManager {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(DownloadConfig::CONNECT_TIMEOUT)
            .user_agent(DownloadConfig::USER_AGENT)
            .build()
            .map_err(|e| LinkerError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            downloads: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate a request and start it in the background.
    ///
    /// The file goes to the first directory registered for the category.
    /// An existing file at the destination is never overwritten.
    pub async fn start(
        &self,
        folders: &FolderPaths,
        request: DownloadRequest,
    ) -> Result<DownloadStarted> {
        let DownloadRequest {
            url,
            category,
            filename,
            download_id,
        } = request;
        if url.is_empty() || filename.is_empty() || download_id.is_empty() {
            return Err(invalid("url, filename, and download_id are required"));
        }
        validate_url(&url)?;
        validate_filename(&filename)?;

        let category = canonical_category(&category).to_string();
        let base_directory = match folders.paths(&category).first() {
            Some(dir) if is_asset_category(&category) => dir.clone(),
            _ => return Err(LinkerError::UnknownCategory(category)),
        };
        let destination = base_directory.join(&filename);
        if destination.exists() {
            return Err(LinkerError::AlreadyExists(destination));
        }

        let entry = {
            let mut downloads = self.downloads.write().await;
            if downloads
                .get(&download_id)
                .is_some_and(|existing| !existing.is_finished())
            {
                return Err(invalid(format!("download already active: {}", download_id)));
            }
            if downloads
                .values()
                .any(|d| !d.is_finished() && d.destination == destination)
            {
                return Err(LinkerError::AlreadyExists(destination));
            }

            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LinkerError::io_with_path(e, parent))?;
            }

            let entry = Arc::new(ActiveDownload {
                url,
                destination: destination.clone(),
                category,
                base_directory,
                downloaded: AtomicU64::new(0),
                total: AtomicU64::new(0),
                cancelled: AtomicBool::new(false),
                cancel_notify: Notify::new(),
                outcome: OnceLock::new(),
            });
            downloads.insert(download_id.clone(), entry.clone());
            entry
        };

        info!(
            "Starting download {} from {} to {}",
            download_id,
            entry.url,
            destination.display()
        );
        tokio::spawn(run(self.client.clone(), download_id.clone(), entry));

        Ok(DownloadStarted {
            download_id,
            destination,
        })
    }

    /// Current state of a download.
    ///
    /// Finished downloads are removed from the table once reported.
    pub async fn progress(&self, download_id: &str) -> Result<DownloadSnapshot> {
        let entry = self
            .downloads
            .read()
            .await
            .get(download_id)
            .cloned()
            .ok_or_else(|| LinkerError::DownloadNotFound(download_id.to_string()))?;

        let snapshot = entry.snapshot();
        if entry.is_finished() {
            self.downloads.write().await.remove(download_id);
        }
        Ok(snapshot)
    }

    /// Ask a download to stop. Its temp file is removed by the task.
    pub async fn cancel(&self, download_id: &str) -> Result<()> {
        let entry = self
            .downloads
            .read()
            .await
            .get(download_id)
            .cloned()
            .ok_or_else(|| LinkerError::DownloadNotFound(download_id.to_string()))?;

        info!("Cancelling download {}", download_id);
        entry.cancelled.store(true, Ordering::SeqCst);
        entry.cancel_notify.notify_one();
        Ok(())
    }

    /// Ids of downloads that have not been reported as finished.
    pub async fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.downloads.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

async fn run(client: reqwest::Client, download_id: String, entry: Arc<ActiveDownload>) {
    let temp_path = temp_path_for(&entry.destination);

    let outcome = match fetch(&client, &entry, &temp_path).await {
        Ok(size) => match finish(&entry, &temp_path, size) {
            Ok(result) => {
                info!(
                    "Download {} complete: {} bytes at {}",
                    download_id,
                    size,
                    result.path.display()
                );
                DownloadOutcome::Completed(result)
            }
            Err(e) => DownloadOutcome::Failed(e.to_string()),
        },
        Err(LinkerError::DownloadCancelled) => {
            info!("Download {} cancelled", download_id);
            DownloadOutcome::Cancelled
        }
        Err(e) => DownloadOutcome::Failed(e.to_string()),
    };

    if !matches!(outcome, DownloadOutcome::Completed(_)) && temp_path.exists() {
        match std::fs::remove_file(&temp_path) {
            Ok(()) => debug!("Removed temp file {}", temp_path.display()),
            Err(e) => warn!("Failed to remove temp file {}: {}", temp_path.display(), e),
        }
    }
    if let DownloadOutcome::Failed(message) = &outcome {
        error!("Download {} failed: {}", download_id, message);
    }
    let _ = entry.outcome.set(outcome);
}

async fn fetch(client: &reqwest::Client, entry: &ActiveDownload, temp_path: &Path) -> Result<u64> {
    let response = tokio::select! {
        biased;
        _ = entry.cancel_notify.notified() => return Err(LinkerError::DownloadCancelled),
        response = client.get(&entry.url).send() => response?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(LinkerError::DownloadFailed {
            url: entry.url.clone(),
            message: format!("HTTP {}", status),
        });
    }

    let total = response.content_length().unwrap_or(0);
    entry.total.store(total, Ordering::SeqCst);

    let mut file =
        std::fs::File::create(temp_path).map_err(|e| LinkerError::io_with_path(e, temp_path))?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    loop {
        if entry.cancelled.load(Ordering::SeqCst) {
            return Err(LinkerError::DownloadCancelled);
        }
        let next = tokio::select! {
            biased;
            _ = entry.cancel_notify.notified() => return Err(LinkerError::DownloadCancelled),
            next = stream.next() => next,
        };
        let Some(chunk) = next else { break };
        let chunk = chunk.map_err(|e| LinkerError::Network {
            message: format!("Error reading download stream: {}", e),
            source: Some(e),
        })?;

        file.write_all(&chunk)
            .map_err(|e| LinkerError::io_with_path(e, temp_path))?;
        downloaded += chunk.len() as u64;
        entry.downloaded.store(downloaded, Ordering::SeqCst);
    }

    file.flush()
        .and_then(|_| file.sync_all())
        .map_err(|e| LinkerError::io_with_path(e, temp_path))?;

    if total > 0 && downloaded != total {
        return Err(LinkerError::DownloadFailed {
            url: entry.url.clone(),
            message: format!("Download incomplete: {}/{} bytes", downloaded, total),
        });
    }
    Ok(downloaded)
}

fn finish(entry: &ActiveDownload, temp_path: &Path, size: u64) -> Result<DownloadResult> {
    if entry.destination.exists() {
        return Err(LinkerError::AlreadyExists(entry.destination.clone()));
    }
    std::fs::rename(temp_path, &entry.destination)
        .map_err(|e| LinkerError::io_with_path(e, &entry.destination))?;
    Ok(DownloadResult {
        path: entry.destination.clone(),
        size,
        category: entry.category.clone(),
        base_directory: entry.base_directory.clone(),
    })
}
