use baro_core::{ExtremumPresence, NormalizeOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatasetConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NormalizeConfig {
    pub extremum_presence: Option<ExtremumPresence>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub backend: Option<BackendConfig>,
    pub server: Option<ServerConfig>,
    pub dataset: Option<DatasetConfig>,
    pub normalize: Option<NormalizeConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from BARO_CONFIG path (TOML) if present, with reasonable defaults.
    /// BARO_BACKEND_URL overrides `[backend] url`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("BARO_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = Self::load_from(&path)?;
        if let Ok(url) = std::env::var("BARO_BACKEND_URL") {
            cfg.backend.get_or_insert_with(BackendConfig::default).url = Some(url);
        }
        Ok(cfg)
    }

    /// Read `path`, or defaults when it does not exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Backend location fetched on each trigger (default http://localhost:8080)
    pub fn backend_url(&self) -> String {
        self.backend
            .as_ref()
            .and_then(|b| b.url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .backend
            .as_ref()
            .and_then(|b| b.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    /// Archive export served at `/`, if any
    pub fn dataset_path(&self) -> Option<PathBuf> {
        self.dataset.as_ref().and_then(|d| d.path.clone())
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            extremum_presence: self
                .normalize
                .as_ref()
                .and_then(|n| n.extremum_presence)
                .unwrap_or_default(),
        }
    }
}
