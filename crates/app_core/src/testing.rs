//! Scripted gateway for controller and action tests

use crate::{AppError, ListingView};
use app_api::{
    ApiError, Bucket, DiskInfo, EntryKind, FileEntry, PublishSettings, RemoteFileGateway,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

type ApiResult<T> = Result<T, ApiError>;

/// A queued listing response, optionally held until a gate opens
pub struct Scripted {
    result: ApiResult<Vec<FileEntry>>,
    gate: Option<oneshot::Receiver<()>>,
}

impl Scripted {
    pub fn ok(entries: Vec<FileEntry>) -> Self {
        Self { result: Ok(entries), gate: None }
    }

    pub fn err(error: ApiError) -> Self {
        Self { result: Err(error), gate: None }
    }

    /// Response that resolves only after the returned sender fires
    pub fn gated(entries: Vec<FileEntry>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { result: Ok(entries), gate: Some(rx) }, tx)
    }
}

/// Gateway answering from queues; unscripted listings return empty pages
#[derive(Default)]
pub struct ScriptedGateway {
    files: Mutex<VecDeque<Scripted>>,
    dirs: Mutex<VecDeque<Scripted>>,
    bucket: Mutex<VecDeque<Scripted>>,
    folder: Mutex<VecDeque<Scripted>>,
    unpublish: Mutex<VecDeque<ApiResult<()>>>,
    download_link: Mutex<VecDeque<ApiResult<String>>>,
    download_bytes: Mutex<VecDeque<ApiResult<Vec<u8>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_files(&self, response: Scripted) {
        self.files.lock().push_back(response);
    }

    pub fn push_dirs(&self, response: Scripted) {
        self.dirs.lock().push_back(response);
    }

    /// Mixed window for a bucket listed with one request
    pub fn push_bucket(&self, response: Scripted) {
        self.bucket.lock().push_back(response);
    }

    pub fn push_folder(&self, response: Scripted) {
        self.folder.lock().push_back(response);
    }

    pub fn push_unpublish(&self, result: ApiResult<()>) {
        self.unpublish.lock().push_back(result);
    }

    pub fn push_download_link(&self, result: ApiResult<String>) {
        self.download_link.lock().push_back(result);
    }

    pub fn push_download_bytes(&self, result: ApiResult<Vec<u8>>) {
        self.download_bytes.lock().push_back(result);
    }

    /// Every call so far, e.g. `dirs:published_files:20:0`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    async fn answer(queue: &Mutex<VecDeque<Scripted>>) -> ApiResult<Vec<FileEntry>> {
        let scripted = queue.lock().pop_front();
        match scripted {
            Some(Scripted { result, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl RemoteFileGateway for ScriptedGateway {
    async fn list_files(&self, bucket: Bucket, limit: usize, offset: usize) -> ApiResult<Vec<FileEntry>> {
        self.record(format!("files:{}:{}:{}", bucket, limit, offset));
        Self::answer(&self.files).await
    }

    async fn list_dirs(&self, bucket: Bucket, limit: usize, offset: usize) -> ApiResult<Vec<FileEntry>> {
        self.record(format!("dirs:{}:{}:{}", bucket, limit, offset));
        Self::answer(&self.dirs).await
    }

    async fn list_bucket(&self, bucket: Bucket, limit: usize, offset: usize) -> ApiResult<Vec<FileEntry>> {
        self.record(format!("bucket:{}:{}:{}", bucket, limit, offset));
        Self::answer(&self.bucket).await
    }

    async fn list_folder(&self, path: &str, limit: usize, offset: usize) -> ApiResult<Vec<FileEntry>> {
        self.record(format!("folder:{}:{}:{}", path, limit, offset));
        Self::answer(&self.folder).await
    }

    async fn publish(&self, path: &str, _settings: &PublishSettings) -> ApiResult<()> {
        self.record(format!("publish:{}", path));
        Ok(())
    }

    async fn unpublish(&self, path: &str) -> ApiResult<()> {
        self.record(format!("unpublish:{}", path));
        self.unpublish.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn fetch_public_url(&self, path: &str) -> ApiResult<String> {
        self.record(format!("public_url:{}", path));
        Ok(format!("https://yadi.sk/d/{}", app_api::file_name(path)))
    }

    async fn rename(&self, from: &str, to: &str) -> ApiResult<FileEntry> {
        self.record(format!("rename:{}:{}", from, to));
        let mut entry = FileEntry::new(app_api::file_name(to), to, EntryKind::File);
        entry.created = "2024-06-01T08:00:00+00:00".into();
        Ok(entry)
    }

    async fn delete(&self, path: &str, permanently: bool) -> ApiResult<()> {
        self.record(format!("delete:{}:{}", path, permanently));
        Ok(())
    }

    async fn request_download_link(&self, path: &str) -> ApiResult<String> {
        self.record(format!("download_link:{}", path));
        self.download_link
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("https://downloader.test/{}", app_api::file_name(path))))
    }

    async fn download_bytes(&self, url: &str) -> ApiResult<Vec<u8>> {
        self.record(format!("download:{}", url));
        self.download_bytes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(b"content".to_vec()))
    }

    async fn disk_info(&self) -> ApiResult<DiskInfo> {
        self.record("disk_info".to_string());
        Ok(DiskInfo { total_space: 10 << 30, used_space: 3 << 30, trash_size: 0 })
    }
}

/// `dirs` directories and `files` files, alternating while both last
pub fn interleaved(dirs: usize, files: usize) -> Vec<FileEntry> {
    let mut dir_entries = entries("dir", EntryKind::Dir, dirs).into_iter();
    let mut file_entries = entries("file", EntryKind::File, files).into_iter();
    let mut window = Vec::with_capacity(dirs + files);
    loop {
        match (file_entries.next(), dir_entries.next()) {
            (None, None) => break,
            (file, dir) => window.extend(file.into_iter().chain(dir)),
        }
    }
    window
}

/// `n` entries of `kind` named `{prefix}{i}`
pub fn entries(prefix: &str, kind: EntryKind, n: usize) -> Vec<FileEntry> {
    (0..n)
        .map(|i| {
            let name = format!("{}{}", prefix, i);
            let mut entry = FileEntry::new(name.clone(), format!("disk:/{}", name), kind);
            if kind == EntryKind::File {
                entry.size = Some(1024 * (i as u64 + 1));
            }
            entry
        })
        .collect()
}

/// One call made on a [`RecordingView`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Loading,
    LoadingDone,
    Items(Vec<FileEntry>),
    FolderItems(Vec<FileEntry>),
    Error(String),
    OfflineBanner(String),
}

/// View that records every call in order
#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    /// Drain recorded events
    pub fn take(&self) -> Vec<ViewEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn count(&self, matches: impl Fn(&ViewEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| matches(e)).count()
    }

    /// Most recent listing pushed, bucket or folder
    pub fn last_items(&self) -> Option<Vec<FileEntry>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            ViewEvent::Items(items) | ViewEvent::FolderItems(items) => Some(items.clone()),
            _ => None,
        })
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().push(event);
    }
}

impl ListingView for RecordingView {
    fn show_loading(&self) {
        self.push(ViewEvent::Loading);
    }

    fn hide_loading(&self) {
        self.push(ViewEvent::LoadingDone);
    }

    fn show_items(&self, items: &[FileEntry]) {
        self.push(ViewEvent::Items(items.to_vec()));
    }

    fn show_folder_items(&self, items: &[FileEntry]) {
        self.push(ViewEvent::FolderItems(items.to_vec()));
    }

    fn show_error(&self, error: &AppError) {
        self.push(ViewEvent::Error(error.to_string()));
    }

    fn show_offline_banner(&self, message: &str) {
        self.push(ViewEvent::OfflineBanner(message.to_string()));
    }
}

/// Local HTTP server answering every request with the same JSON body
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn serve(body: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let seen = seen.clone();
                let body = body.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => head.extend_from_slice(&chunk[..n]),
                        }
                    }
                    if let Some(line) = String::from_utf8_lossy(&head).lines().next() {
                        seen.lock().push(line.to_string());
                    }

                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base_url, requests }
    }

    /// Request lines received so far, e.g. `GET /resources?... HTTP/1.1`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

/// Resource list JSON for `entries`, in the server's wire shape
pub fn resource_list_json(entries: &[FileEntry]) -> String {
    let items: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                r#"{{"name":"{}","path":"{}","type":"{}","created":"2024-05-01T10:00:00+00:00"}}"#,
                e.name, e.path, e.kind
            )
        })
        .collect();
    format!(r#"{{"_embedded":{{"items":[{}]}}}}"#, items.join(","))
}
