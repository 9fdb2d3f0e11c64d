use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::model::AttachmentRef;
use crate::platform::OutgoingFile;

/// Fetches raw bytes for CDN URLs (attachments, emoji and sticker images).
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Download failed: {}", status);
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct StagedAttachment {
    pub path: PathBuf,
    pub filename: String,
}

/// Attachments downloaded for a single outgoing message.
///
/// Dropping the guard deletes every staged file, so cleanup happens after the
/// send attempt on both the success and failure paths.
#[derive(Debug, Default)]
pub struct StagedFiles {
    files: Vec<StagedAttachment>,
}

impl StagedFiles {
    pub fn outgoing(&self) -> Vec<OutgoingFile> {
        self.files
            .iter()
            .map(|file| OutgoingFile {
                path: file.path.clone(),
                filename: file.filename.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for file in self.files.drain(..) {
            match std::fs::remove_file(&file.path) {
                Ok(()) => debug!("Removed staged file {:?}", file.path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to delete staged file {:?}: {}", file.path, e),
            }
        }
    }
}

static STAGE_SEQ: AtomicU64 = AtomicU64::new(0);

fn staged_name(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("attachment");
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        STAGE_SEQ.fetch_add(1, Ordering::Relaxed),
        base
    )
}

/// Downloads every attachment of a message into `dir`.
///
/// A failed download is logged and left out; it never aborts the message.
pub async fn stage_attachments(
    downloader: &dyn Downloader,
    attachments: &[AttachmentRef],
    dir: &Path,
    delay: Duration,
) -> StagedFiles {
    let mut staged = StagedFiles::default();
    if attachments.is_empty() {
        return staged;
    }

    info!("  Downloading {} attachment(s)...", attachments.len());
    for attachment in attachments {
        match download_one(downloader, attachment, dir).await {
            Ok(file) => {
                staged.files.push(file);
                tokio::time::sleep(delay).await;
            }
            Err(e) => warn!(
                "    Attachment download failed for {}: {}",
                attachment.filename, e
            ),
        }
    }
    staged
}

async fn download_one(
    downloader: &dyn Downloader,
    attachment: &AttachmentRef,
    dir: &Path,
) -> anyhow::Result<StagedAttachment> {
    let data = downloader.fetch(&attachment.url).await?;
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(staged_name(&attachment.filename));
    tokio::fs::write(&path, &data).await?;
    debug!("Staged {} ({} bytes) at {:?}", attachment.filename, data.len(), path);

    Ok(StagedAttachment {
        path,
        filename: attachment.filename.clone(),
    })
}

/// Best-effort removal of the run's staging directory.
pub async fn remove_staging_dir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!("Removed staging directory {:?}", dir),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove staging directory {:?}: {}", dir, e),
    }
}
