//! Paginated listing with offline fallback
//!
//! A controller drives one screen. Each page is fetched from the gateway
//! (directories and files as separate requests for the published and
//! last-uploaded screens, one mixed window for the root listing and for
//! folders). Bucket pages put directories ahead of files. Pages are
//! appended to the accumulated listing and written through to the local
//! store. When the device is offline the screen is answered from the
//! store instead.
//!
//! Every fetch is tagged with the generation it was issued under. Starting
//! a new listing or refreshing bumps the generation, so a response that
//! arrives after a context switch is recognised as stale and dropped.

use crate::{AppError, ListingView, LocalFileStore};
use app_api::{ApiError, Bucket, EntryKind, FileEntry, PageRequest, RemoteFileGateway};
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;

pub const OFFLINE_MESSAGE: &str = "No internet. Loading cache data.";

/// What is being paginated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingContext {
    /// Flat listing of a screen
    Bucket(Bucket),
    /// Children of a folder opened from a screen
    Folder { bucket: Bucket, path: String },
}

impl ListingContext {
    pub fn folder(bucket: Bucket, path: impl Into<String>) -> Self {
        ListingContext::Folder { bucket, path: path.into() }
    }

    /// Screen this context belongs to
    pub fn bucket(&self) -> Bucket {
        match self {
            ListingContext::Bucket(bucket) | ListingContext::Folder { bucket, .. } => *bucket,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ListingContext::Folder { .. })
    }
}

/// Pagination bookkeeping for the active context
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    pub limit: usize,
    /// Start of the most recently issued page
    pub offset: usize,
    pub is_loading: bool,
    pub is_exhausted: bool,
    /// Directories first, then files, per page; pages in fetch order
    pub accumulated: Vec<FileEntry>,
    /// Last page failed outright and should be re-requested
    retry_pending: bool,
    generation: u64,
}

impl PaginationState {
    fn fresh(limit: usize, generation: u64) -> Self {
        Self {
            limit: limit.max(1),
            generation,
            ..Self::default()
        }
    }
}

/// Identity of an issued fetch
#[derive(Debug, Clone)]
struct PageTag {
    generation: u64,
    context: ListingContext,
    limit: usize,
    offset: usize,
}

/// Result of one sub-request; `kind` is `None` for mixed windows
struct PagePart {
    kind: Option<EntryKind>,
    result: Result<Vec<FileEntry>, ApiError>,
}

/// What the view must be told once state is updated
enum PageOutcome {
    Stale { newer_in_flight: bool },
    Loaded { snapshot: Vec<FileEntry>, persist: Option<Bucket> },
    Empty { snapshot: Vec<FileEntry>, persist: Option<Bucket> },
    Offline { fallback: Fallback },
    Failed { snapshot: Vec<FileEntry>, error: AppError },
}

enum Fallback {
    Cache(Bucket),
    Snapshot(Vec<FileEntry>),
}

struct Inner {
    context: Option<ListingContext>,
    state: PaginationState,
}

/// Incrementally loaded listing for one screen
pub struct PaginatedListingController {
    gateway: Arc<dyn RemoteFileGateway>,
    store: Arc<dyn LocalFileStore>,
    view: Arc<dyn ListingView>,
    inner: Mutex<Inner>,
}

impl PaginatedListingController {
    pub fn new(
        gateway: Arc<dyn RemoteFileGateway>,
        store: Arc<dyn LocalFileStore>,
        view: Arc<dyn ListingView>,
    ) -> Self {
        Self {
            gateway,
            store,
            view,
            inner: Mutex::new(Inner {
                context: None,
                state: PaginationState::default(),
            }),
        }
    }

    // ===== Accessors =====

    pub fn context(&self) -> Option<ListingContext> {
        self.inner.lock().context.clone()
    }

    /// Snapshot of the accumulated listing
    pub fn items(&self) -> Vec<FileEntry> {
        self.inner.lock().state.accumulated.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().state.is_loading
    }

    pub fn is_exhausted(&self) -> bool {
        self.inner.lock().state.is_exhausted
    }

    pub fn offset(&self) -> usize {
        self.inner.lock().state.offset
    }

    pub fn limit(&self) -> usize {
        self.inner.lock().state.limit
    }

    // ===== Operations =====

    /// Reset pagination for `context` and fetch its first page.
    ///
    /// Any fetch still in flight for the previous context becomes stale.
    pub async fn start_listing(&self, context: ListingContext, limit: usize) {
        let tag = {
            let mut inner = self.inner.lock();
            let generation = inner.state.generation + 1;
            inner.state = PaginationState::fresh(limit, generation);
            inner.context = Some(context);
            Self::issue(&mut inner)
        };

        tracing::debug!(context = ?tag.context, limit = tag.limit, "Starting listing");
        self.fetch_page(tag).await;
    }

    /// Fetch the page after the last one, unless loading or exhausted.
    ///
    /// Calls arriving while a page is in flight are dropped, not queued.
    pub async fn load_next_page(&self) {
        let tag = {
            let mut inner = self.inner.lock();
            if inner.context.is_none() || inner.state.is_loading || inner.state.is_exhausted {
                tracing::trace!("Next page suppressed");
                return;
            }

            let state = &mut inner.state;
            if state.retry_pending {
                state.retry_pending = false;
            } else {
                state.offset += state.limit;
            }
            Self::issue(&mut inner)
        };

        self.fetch_page(tag).await;
    }

    /// Re-fetch the current context from the first page.
    ///
    /// The accumulated listing stays visible until the new first page
    /// resolves and replaces it.
    pub async fn refresh(&self) {
        let tag = {
            let mut inner = self.inner.lock();
            if inner.context.is_none() {
                return;
            }

            let state = &mut inner.state;
            state.generation += 1;
            state.offset = 0;
            state.is_exhausted = false;
            state.retry_pending = false;
            Self::issue(&mut inner)
        };

        tracing::debug!(context = ?tag.context, "Refreshing listing");
        self.fetch_page(tag).await;
    }

    /// Unpublish `path` and reload the published listing from scratch.
    ///
    /// Only valid while the published screen is active. The server is
    /// trusted for the new state; nothing is removed locally.
    pub async fn unpublish(&self, path: &str) -> Result<(), AppError> {
        let limit = {
            let inner = self.inner.lock();
            match inner.context {
                Some(ListingContext::Bucket(Bucket::Published)) => inner.state.limit,
                _ => {
                    return Err(AppError::InvalidOperation(
                        "unpublish is only available on the published files screen".to_string(),
                    ))
                }
            }
        };

        if let Err(e) = self.gateway.unpublish(path).await {
            let error = AppError::from(e);
            tracing::warn!(path, "Unpublish failed: {}", error);
            self.view.show_error(&error);
            return Err(error);
        }

        tracing::info!(path, "Unpublished, reloading published files");
        if self.context() == Some(ListingContext::Bucket(Bucket::Published)) {
            self.start_listing(ListingContext::Bucket(Bucket::Published), limit).await;
        }
        Ok(())
    }

    // ===== Fetch =====

    /// Mark loading and describe the page about to be fetched
    fn issue(inner: &mut Inner) -> PageTag {
        inner.state.is_loading = true;
        PageTag {
            generation: inner.state.generation,
            // Callers only issue with a context set
            context: inner
                .context
                .clone()
                .unwrap_or(ListingContext::Bucket(Bucket::AllFiles)),
            limit: inner.state.limit,
            offset: inner.state.offset,
        }
    }

    async fn fetch_page(&self, tag: PageTag) {
        self.view.show_loading();

        let (limit, offset) = (tag.limit, tag.offset);
        let parts = match &tag.context {
            ListingContext::Bucket(bucket) => {
                let bucket = *bucket;
                match bucket.page_request() {
                    PageRequest::Mixed => vec![PagePart {
                        kind: None,
                        result: self
                            .gateway
                            .list_bucket(bucket, limit, offset)
                            .await
                            .map(dirs_first),
                    }],
                    PageRequest::PerKind(kinds) => {
                        let gateway = &self.gateway;
                        let requests = kinds.iter().map(move |&kind| async move {
                            PagePart {
                                kind: Some(kind),
                                result: gateway.list_kind(bucket, kind, limit, offset).await,
                            }
                        });
                        join_all(requests).await
                    }
                }
            }
            ListingContext::Folder { path, .. } => vec![PagePart {
                kind: None,
                result: self.gateway.list_folder(path, limit, offset).await,
            }],
        };

        let outcome = self.complete_page(&tag, parts);
        // A newer fetch still in flight owns the indicator
        let superseded = matches!(outcome, PageOutcome::Stale { newer_in_flight: true });
        self.notify(&tag, outcome);

        if !superseded {
            self.view.hide_loading();
        }
    }

    /// Fold a finished page into state
    fn complete_page(&self, tag: &PageTag, parts: Vec<PagePart>) -> PageOutcome {
        let mut inner = self.inner.lock();
        if inner.state.generation != tag.generation {
            tracing::debug!(context = ?tag.context, offset = tag.offset, "Discarding stale page");
            return PageOutcome::Stale {
                newer_in_flight: inner.state.is_loading,
            };
        }

        let state = &mut inner.state;
        state.is_loading = false;

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let mut first_error = None;
        let mut all_short = true;

        for part in parts {
            match part.result {
                Ok(entries) => {
                    all_short &= entries.len() < tag.limit;
                    match part.kind {
                        Some(EntryKind::Dir) => dirs.extend(entries),
                        // Mixed windows keep the order they arrived in
                        Some(EntryKind::File) | None => files.extend(entries),
                    }
                }
                Err(e) => {
                    tracing::warn!(context = ?tag.context, offset = tag.offset, kind = ?part.kind, "Page request failed: {}", e);
                    all_short = false;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        let mut merged = dirs;
        merged.extend(files);

        if first_error.is_none() && all_short {
            state.is_exhausted = true;
        }

        let persist = match &tag.context {
            ListingContext::Bucket(bucket) => Some(*bucket),
            ListingContext::Folder { .. } => None,
        };

        if !merged.is_empty() {
            if tag.offset == 0 {
                state.accumulated = merged;
            } else {
                state.accumulated.extend(merged);
            }
            return PageOutcome::Loaded { snapshot: state.accumulated.clone(), persist };
        }

        match first_error {
            None => {
                if tag.offset == 0 {
                    state.accumulated.clear();
                }
                PageOutcome::Empty {
                    snapshot: state.accumulated.clone(),
                    persist: persist.filter(|_| tag.offset == 0),
                }
            }
            Some(error) => {
                state.retry_pending = true;
                let error = AppError::from(error);
                if error.is_connectivity() {
                    let fallback = match persist {
                        Some(bucket) => Fallback::Cache(bucket),
                        None => Fallback::Snapshot(state.accumulated.clone()),
                    };
                    PageOutcome::Offline { fallback }
                } else {
                    PageOutcome::Failed { snapshot: state.accumulated.clone(), error }
                }
            }
        }
    }

    /// Persist and notify; runs without the state lock held
    fn notify(&self, tag: &PageTag, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Stale { .. } => {}
            PageOutcome::Loaded { snapshot, persist } | PageOutcome::Empty { snapshot, persist } => {
                if let Some(bucket) = persist {
                    self.store.save(bucket.cache_key(), &snapshot);
                }
                self.show(&tag.context, &snapshot);
            }
            PageOutcome::Offline { fallback } => {
                tracing::info!(context = ?tag.context, "Offline, serving cached listing");
                self.view.show_offline_banner(OFFLINE_MESSAGE);
                let entries = match fallback {
                    Fallback::Cache(bucket) => self.store.fetch(bucket.cache_key()),
                    Fallback::Snapshot(entries) => entries,
                };
                self.show(&tag.context, &entries);
            }
            PageOutcome::Failed { snapshot, error } => {
                self.show(&tag.context, &snapshot);
                self.view.show_error(&error);
            }
        }
    }

    fn show(&self, context: &ListingContext, entries: &[FileEntry]) {
        if context.is_folder() {
            self.view.show_folder_items(entries);
        } else {
            self.view.show_items(entries);
        }
    }
}

/// Stable partition of one mixed window, directories ahead of files
fn dirs_first(mut entries: Vec<FileEntry>) -> Vec<FileEntry> {
    entries.sort_by_key(|e| !e.is_dir());
    entries
}
