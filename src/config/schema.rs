//! Configuration schema for depcache
//!
//! Global configuration lives at `~/.config/depcache/config.toml`; a project
//! may add a `.depcache.toml` that overrides it.

use crate::error::{DepcacheError, DepcacheResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Local cache settings
    pub cache: CacheConfig,

    /// Remote object-store settings
    pub remote: RemoteConfig,
}

impl Config {
    /// Local cache root: configured directory, else `~/.package_cache`
    pub fn cache_directory(&self) -> PathBuf {
        self.cache.directory.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".package_cache")
        })
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Local cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory
    pub directory: Option<PathBuf>,
}

/// Remote cache configuration
///
/// The remote tier is enabled only when the key pair and bucket are all set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,

    /// Bucket region
    pub region: String,

    /// Custom S3-compatible endpoint (MinIO, R2, ...)
    pub endpoint: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            bucket: None,
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }
}

/// Complete remote settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

impl RemoteConfig {
    /// Remote settings if configured, `None` for local-only.
    ///
    /// Setting only some of the required keys is an error rather than a
    /// silent fallback to local-only.
    pub fn settings(&self) -> DepcacheResult<Option<RemoteSettings>> {
        let required = [
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
            ("bucket", &self.bucket),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.as_deref().map_or(true, str::is_empty))
            .map(|(k, _)| *k)
            .collect();

        match (missing.len(), &self.access_key_id, &self.secret_access_key, &self.bucket) {
            (0, Some(id), Some(secret), Some(bucket)) => Ok(Some(RemoteSettings {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
                bucket: bucket.clone(),
                region: self.region.clone(),
                endpoint: self.endpoint.clone(),
            })),
            (n, ..) if n == required.len() => Ok(None),
            _ => Err(DepcacheError::RemoteConfigIncomplete {
                missing: missing.join(", "),
            }),
        }
    }
}
