//! CloudDrive Core Domain Logic
//!
//! This crate contains:
//! - Application state management
//! - Paginated listing with offline fallback
//! - Local listing storage
//! - File actions (publish, rename, delete, download)
//! - Configuration
//! - Error types

pub mod state;
pub mod config;
pub mod error;
pub mod listing;
pub mod store;
pub mod view;
pub mod actions;
pub mod format;

#[cfg(test)]
mod testing;

pub use state::AppState;
pub use config::{AppConfig, ApiConfig, CacheConfig, DownloadConfig, ListingConfig, TOKEN_ENV};
pub use error::AppError;
pub use listing::{ListingContext, PaginatedListingController, PaginationState, OFFLINE_MESSAGE};
pub use store::{CachedFileStore, LocalFileStore, MemoryFileStore};
pub use view::ListingView;
pub use actions::{FileActions, PreviewFile};
pub use format::{format_created, format_file_size};
