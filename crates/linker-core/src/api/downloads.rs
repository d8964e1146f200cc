//! Model download methods on ModelLinker.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::download::{DownloadRequest, DownloadSnapshot, DownloadStarted};
use crate::error::Result;
use crate::models::AssetRecord;
use crate::ModelLinker;

impl ModelLinker {
    // ========================================
    // Download Methods
    // ========================================

    /// Start downloading a model into the first directory of its category.
    pub async fn download_model(&self, request: DownloadRequest) -> Result<DownloadStarted> {
        self.state
            .downloads
            .start(&self.state.folders, request)
            .await
    }

    /// Poll a download.
    ///
    /// A completed download is added to the record snapshot, so it can be
    /// matched without a rescan.
    pub async fn download_progress(&self, download_id: &str) -> Result<DownloadSnapshot> {
        let snapshot = self.state.downloads.progress(download_id).await?;
        if let Some(result) = &snapshot.result {
            if let Err(e) = self.add_record(result.to_record()).await {
                warn!("Failed to record download {}: {}", download_id, e);
            }
        }
        Ok(snapshot)
    }

    pub async fn cancel_download(&self, download_id: &str) -> Result<()> {
        self.state.downloads.cancel(download_id).await
    }

    async fn add_record(&self, record: AssetRecord) -> Result<()> {
        let current = self.get_models(true).await?;
        if current
            .iter()
            .any(|r| r.absolute_path == record.absolute_path)
        {
            return Ok(());
        }

        debug!("Adding downloaded {} to snapshot", record.absolute_path);
        let mut records = current.as_ref().clone();
        records.push(record);
        if let Some(cache) = &self.state.cache {
            if let Err(e) = cache.save(&records, None) {
                warn!("Failed to save cache: {}", e);
            }
        }
        *self.state.records.write().await = Some(Arc::new(records));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::LinkerSettings;
    use crate::download::{DownloadRequest, DownloadStatus};
    use crate::error::LinkerError;
    use crate::ModelLinker;
    use axum::routing::get;
    use axum::Router;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_completed_download_joins_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let checkpoints = temp_dir.path().join("models").join("checkpoints");
        std::fs::create_dir_all(&checkpoints).unwrap();
        std::fs::write(checkpoints.join("old.safetensors"), b"x").unwrap();

        let router = Router::new().route("/f", get(|| async { vec![3u8; 128] }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let linker = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(LinkerSettings::default())
            .with_cache_path(temp_dir.path().join("cache.json"))
            .build()
            .unwrap();
        assert_eq!(linker.get_models(true).await.unwrap().len(), 1);

        let started = linker
            .download_model(DownloadRequest {
                url: format!("http://{}/f", addr),
                category: "checkpoints".into(),
                filename: "new.safetensors".into(),
                download_id: "dl".into(),
            })
            .await
            .unwrap();
        assert_eq!(started.destination, checkpoints.join("new.safetensors"));

        let mut status = DownloadStatus::Downloading;
        for _ in 0..500 {
            status = linker.download_progress("dl").await.unwrap().status;
            if status != DownloadStatus::Downloading {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, DownloadStatus::Completed);

        let records = linker.get_models(true).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.filename == "new.safetensors"));

        assert!(matches!(
            linker.cancel_download("dl").await,
            Err(LinkerError::DownloadNotFound(_))
        ));
    }
}
