//! Application state management

use crate::{
    AppConfig, AppError, CachedFileStore, FileActions, ListingContext, ListingView,
    LocalFileStore, MemoryFileStore, PaginatedListingController,
};
use app_api::{Bucket, HttpGateway, RemoteFileGateway};
use parking_lot::RwLock;
use std::sync::Arc;

/// Main application state
pub struct AppState {
    /// Application configuration
    pub config: RwLock<AppConfig>,

    /// Remote disk
    pub gateway: Arc<dyn RemoteFileGateway>,

    /// Offline listing snapshots
    pub store: Arc<dyn LocalFileStore>,

    /// Publish, rename, delete, download
    pub actions: FileActions,
}

impl AppState {
    /// Create a new application state talking to the configured server
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let gateway = HttpGateway::new(config.gateway_options()?)
            .map_err(|e| AppError::Init(e.to_string()))?;

        let store: Arc<dyn LocalFileStore> = if config.cache.enabled {
            let cache = app_db::init_at(&config.cache_db_path())
                .map_err(|e| AppError::Init(e.to_string()))?;
            Arc::new(CachedFileStore::new(cache))
        } else {
            tracing::info!("Listing cache disabled, keeping listings in memory");
            Arc::new(MemoryFileStore::new())
        };

        Ok(Self::with_parts(config, Arc::new(gateway), store))
    }

    /// Assemble from an existing gateway and store
    pub fn with_parts(
        config: AppConfig,
        gateway: Arc<dyn RemoteFileGateway>,
        store: Arc<dyn LocalFileStore>,
    ) -> Self {
        let actions = FileActions::new(gateway.clone(), config.download_dir());
        Self {
            config: RwLock::new(config),
            gateway,
            store,
            actions,
        }
    }

    /// A fresh controller reporting to `view`
    pub fn listing(&self, view: Arc<dyn ListingView>) -> PaginatedListingController {
        PaginatedListingController::new(self.gateway.clone(), self.store.clone(), view)
    }

    /// Context and page size for a bucket screen
    pub fn bucket_listing(&self, bucket: Bucket) -> (ListingContext, usize) {
        (ListingContext::Bucket(bucket), self.config.read().page_size_for(bucket))
    }

    /// Forget cached listings and the stored token
    pub fn logout(&self) -> anyhow::Result<()> {
        self.store.clear_all();

        let mut config = self.config.write();
        if config.api.oauth_token.take().is_some() {
            config.save()?;
        }
        tracing::info!("Logged out, local listings cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entries, RecordingView, Scripted, ScriptedGateway};
    use app_api::EntryKind;

    #[tokio::test]
    async fn test_listing_shares_store() {
        let gateway = Arc::new(ScriptedGateway::new());
        let store: Arc<dyn LocalFileStore> = Arc::new(MemoryFileStore::new());
        let state = AppState::with_parts(AppConfig::default(), gateway.clone(), store.clone());

        gateway.push_files(Scripted::ok(entries("f", EntryKind::File, 4)));
        let (context, limit) = state.bucket_listing(Bucket::LastUploaded);
        assert_eq!(limit, 50);

        let controller = state.listing(Arc::new(RecordingView::new()));
        controller.start_listing(context, limit).await;

        assert_eq!(store.fetch("last_uploaded").len(), 4);
        state.store.clear_all();
        assert!(store.fetch_all().is_empty());
    }

    #[test]
    fn test_new_requires_token() {
        if std::env::var(crate::config::TOKEN_ENV).is_ok() {
            return;
        }
        let mut config = AppConfig::default();
        config.cache.enabled = false;
        assert!(matches!(AppState::new(config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_new_with_sqlite_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.api.oauth_token = Some("token".into());
        config.cache.db_path = Some(dir.path().join("cache.db"));

        let state = AppState::new(config).unwrap();
        assert!(state.store.fetch_all().is_empty());
        assert!(dir.path().join("cache.db").exists());
    }
}
