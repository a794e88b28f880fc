//! Video/audio merge stage.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::ytdlp::YtDlp;
use crate::models::ProcessedFile;
use crate::storage;

/// Produces a local file for a chosen format of a page.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// `None` is the only failure signal; causes are logged.
    async fn process(&self, page_url: &str, format_id: &str) -> Option<ProcessedFile>;
}

/// Merges through yt-dlp into the downloads directory.
pub struct YtDlpProcessor {
    ytdlp: YtDlp,
    downloads_dir: PathBuf,
    jobs: Arc<Semaphore>,
}

impl YtDlpProcessor {
    pub fn new(ytdlp: YtDlp, downloads_dir: PathBuf, jobs: Arc<Semaphore>) -> Self {
        Self {
            ytdlp,
            downloads_dir,
            jobs,
        }
    }
}

#[async_trait]
impl MediaProcessor for YtDlpProcessor {
    async fn process(&self, page_url: &str, format_id: &str) -> Option<ProcessedFile> {
        let file_id = storage::new_file_id();

        if let Err(e) = tokio::fs::create_dir_all(&self.downloads_dir).await {
            warn!(
                "Cannot create downloads directory {}: {}",
                self.downloads_dir.display(),
                e
            );
            return None;
        }

        let template = self.downloads_dir.join(format!("{}.%(ext)s", file_id));

        {
            let _permit = self.jobs.acquire().await.ok()?;
            if let Err(e) = self
                .ytdlp
                .download_merged(page_url, format_id, &template)
                .await
            {
                warn!("Processing {} ({}) failed: {:#}", page_url, format_id, e);
                return None;
            }
        }

        match storage::find_by_prefix(&self.downloads_dir, &file_id).await {
            Ok(Some(path)) => {
                let filename = path.file_name()?.to_string_lossy().to_string();
                info!("Processed {} into {}", page_url, filename);
                Some(ProcessedFile {
                    file_id,
                    filename,
                    path,
                })
            }
            Ok(None) => {
                warn!("yt-dlp finished but no output file starts with {}", file_id);
                None
            }
            Err(e) => {
                warn!("Cannot scan {}: {}", self.downloads_dir.display(), e);
                None
            }
        }
    }
}
