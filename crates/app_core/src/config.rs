//! Application configuration

use crate::AppError;
use app_api::{Bucket, GatewayOptions, DEFAULT_BASE_URL};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api.oauth_token`
pub const TOKEN_ENV: &str = "DRIVE_OAUTH_TOKEN";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub listing: ListingConfig,
    pub cache: CacheConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub oauth_token: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub preview_size: String,
    pub preview_crop: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            oauth_token: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            preview_size: "S".to_string(),
            preview_crop: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Page size for the file and published screens and for folders
    pub page_size: usize,
    /// Page size for the last-uploaded feed
    pub last_uploaded_page_size: usize,
    /// Server-side sort field
    pub sort: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            last_uploaded_page_size: 50,
            sort: "created".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist listings for offline use
    pub enabled: bool,
    /// Overrides the default database location
    pub db_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Where downloads land; defaults to the user's download directory
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// OAuth token, with the environment taking precedence over the file
    pub fn token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.api.oauth_token.clone().filter(|t| !t.trim().is_empty()))
    }

    /// Gateway settings; fails when no token is configured
    pub fn gateway_options(&self) -> Result<GatewayOptions, AppError> {
        let token = self.token().ok_or_else(|| {
            AppError::Config(format!(
                "no OAuth token: set {} or api.oauth_token in {:?}",
                TOKEN_ENV,
                Self::config_path()
            ))
        })?;

        Ok(GatewayOptions {
            base_url: self.api.base_url.clone(),
            token,
            timeout: Duration::from_secs(self.api.timeout_secs),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
            preview_size: self.api.preview_size.clone(),
            preview_crop: self.api.preview_crop,
            sort: self.listing.sort.clone(),
        })
    }

    /// Page size used when listing `bucket`
    pub fn page_size_for(&self, bucket: Bucket) -> usize {
        let size = match bucket {
            Bucket::LastUploaded => self.listing.last_uploaded_page_size,
            Bucket::AllFiles | Bucket::Published => self.listing.page_size,
        };
        size.max(1)
    }

    pub fn cache_db_path(&self) -> PathBuf {
        self.cache
            .db_path
            .clone()
            .unwrap_or_else(|| app_db::db_dir().join("cache.db"))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download
            .dir
            .clone()
            .or_else(|| directories::UserDirs::new().and_then(|u| u.download_dir().map(Path::to_path_buf)))
            .unwrap_or_else(|| PathBuf::from("./downloads"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "CloudDrive", "CloudDrive")
}
