//! CloudDrive remote API layer
//!
//! Provides:
//! - The remote resource model (`FileEntry`, `Bucket`, `DiskInfo`)
//! - `RemoteFileGateway`, the async seam the listing core talks to
//! - `HttpGateway`, a REST implementation of that seam

mod model;
mod gateway;
mod http;

pub use model::{
    file_name, parent_path, Bucket, DiskInfo, EntryKind, FileEntry, PageRequest, PreviewKind,
    PublishSettings,
};
pub use gateway::RemoteFileGateway;
pub use http::{GatewayOptions, HttpGateway, DEFAULT_BASE_URL};

use thiserror::Error;

/// Remote API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not connected to the internet")]
    Offline,

    #[error("Cannot find host: {0}")]
    HostNotFound(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unauthorized: the OAuth token was rejected")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Device offline or host unreachable.
    ///
    /// Only these two trigger the cache fallback; everything else, timeouts
    /// included, is surfaced to the user.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Offline | ApiError::HostNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
