//! Remote gateway trait

use crate::{Bucket, DiskInfo, EntryKind, FileEntry, PublishSettings, Result};
use async_trait::async_trait;

/// Async access to the remote disk.
///
/// Implementations carry their own credentials. Every method resolves to a
/// typed payload or an [`ApiError`](crate::ApiError) the caller can classify
/// as connectivity or not.
#[async_trait]
pub trait RemoteFileGateway: Send + Sync {
    /// One page of files in a bucket
    async fn list_files(&self, bucket: Bucket, limit: usize, offset: usize) -> Result<Vec<FileEntry>>;

    /// One page of directories in a bucket
    async fn list_dirs(&self, bucket: Bucket, limit: usize, offset: usize) -> Result<Vec<FileEntry>>;

    /// One mixed page of a bucket, both kinds in server order.
    ///
    /// Used for buckets whose [`PageRequest`](crate::PageRequest) is `Mixed`;
    /// the page is short only when the server's window is.
    async fn list_bucket(&self, bucket: Bucket, limit: usize, offset: usize) -> Result<Vec<FileEntry>>;

    /// One page of a folder's children, files and directories mixed
    async fn list_folder(&self, path: &str, limit: usize, offset: usize) -> Result<Vec<FileEntry>>;

    async fn publish(&self, path: &str, settings: &PublishSettings) -> Result<()>;

    async fn unpublish(&self, path: &str) -> Result<()>;

    async fn fetch_public_url(&self, path: &str) -> Result<String>;

    /// Move `from` to `to` and return the entry at its new location
    async fn rename(&self, from: &str, to: &str) -> Result<FileEntry>;

    async fn delete(&self, path: &str, permanently: bool) -> Result<()>;

    /// Short-lived URL the content can be fetched from
    async fn request_download_link(&self, path: &str) -> Result<String>;

    async fn download_bytes(&self, url: &str) -> Result<Vec<u8>>;

    async fn disk_info(&self) -> Result<DiskInfo>;

    /// Dispatch to `list_files` or `list_dirs`
    async fn list_kind(
        &self,
        bucket: Bucket,
        kind: EntryKind,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FileEntry>> {
        match kind {
            EntryKind::File => self.list_files(bucket, limit, offset).await,
            EntryKind::Dir => self.list_dirs(bucket, limit, offset).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn RemoteFileGateway) {}

    #[test]
    fn gateway_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn RemoteFileGateway>();
    }
}
