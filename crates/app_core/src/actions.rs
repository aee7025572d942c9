//! One-shot file operations outside the listing flow

use crate::AppError;
use app_api::{DiskInfo, FileEntry, PreviewKind, PublishSettings, RemoteFileGateway};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A downloaded file ready to be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFile {
    pub path: PathBuf,
    pub kind: PreviewKind,
}

/// Publish, rename, delete and download against the remote disk
pub struct FileActions {
    gateway: Arc<dyn RemoteFileGateway>,
    download_dir: PathBuf,
    preview_dir: PathBuf,
}

impl FileActions {
    pub fn new(gateway: Arc<dyn RemoteFileGateway>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            download_dir: download_dir.into(),
            preview_dir: std::env::temp_dir().join("cloud_drive_preview"),
        }
    }

    pub fn with_preview_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preview_dir = dir.into();
        self
    }

    /// Publish `path` and return its public link
    pub async fn publish(&self, path: &str, settings: &PublishSettings) -> Result<String, AppError> {
        self.gateway.publish(path, settings).await?;
        let url = self.gateway.fetch_public_url(path).await?;
        tracing::info!(path, "Published");
        Ok(url)
    }

    /// Rename within the same parent directory
    pub async fn rename(&self, entry: &FileEntry, new_name: &str) -> Result<FileEntry, AppError> {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name.contains('/') {
            return Err(AppError::InvalidName(new_name.to_string()));
        }
        if new_name == entry.name {
            return Ok(entry.clone());
        }

        let parent = app_api::parent_path(&entry.path);
        let new_path = if parent.ends_with('/') {
            format!("{}{}", parent, new_name)
        } else {
            format!("{}/{}", parent, new_name)
        };

        let moved = self.gateway.rename(&entry.path, &new_path).await?;
        tracing::info!(from = %entry.path, to = %new_path, "Renamed");

        let created = Some(moved.created.as_str()).filter(|c| !c.is_empty());
        Ok(entry.renamed(&new_path, created))
    }

    pub async fn delete(&self, path: &str, permanently: bool) -> Result<(), AppError> {
        self.gateway.delete(path, permanently).await?;
        tracing::info!(path, permanently, "Deleted");
        Ok(())
    }

    /// Download `path` into the download directory.
    ///
    /// A file already present under the same name is returned as is.
    pub async fn download(&self, path: &str) -> Result<PathBuf, AppError> {
        let name = app_api::file_name(path);
        if name.is_empty() {
            return Err(AppError::InvalidName(path.to_string()));
        }

        let target = self.download_dir.join(name);
        if tokio::fs::try_exists(&target).await? {
            tracing::debug!("Already downloaded: {:?}", target);
            return Ok(target);
        }

        self.fetch_to(path, &target).await?;
        tracing::info!(path, "Downloaded to {:?}", target);
        Ok(target)
    }

    /// Download `entry` to a uniquely named temp file for viewing
    pub async fn download_for_preview(&self, entry: &FileEntry) -> Result<PreviewFile, AppError> {
        if entry.is_dir() {
            return Err(AppError::InvalidOperation(format!("{} is a directory", entry.path)));
        }

        let mut name = uuid::Uuid::new_v4().to_string();
        if let Some(ext) = entry.extension() {
            name.push('.');
            name.push_str(&ext);
        }

        let path = self.preview_dir.join(name);
        self.fetch_to(&entry.path, &path).await?;

        Ok(PreviewFile {
            path,
            kind: entry.preview_kind(),
        })
    }

    pub async fn disk_info(&self) -> Result<DiskInfo, AppError> {
        Ok(self.gateway.disk_info().await?)
    }

    /// Link, then bytes, then disk; a partial file never lands at `target`
    async fn fetch_to(&self, remote: &str, target: &Path) -> Result<(), AppError> {
        let link = self.gateway.request_download_link(remote).await?;
        let bytes = self.gateway.download_bytes(&link).await?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut partial = target.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, target).await?;
        Ok(())
    }
}
