//! Per-backend install flow
//!
//! ```text
//! manifest? --no--> Skipped
//!     |
//! toolchain probe (ToolMissing is fatal)
//!     |
//! fingerprint -> key
//!     |
//! local hit? --yes--> restore --> CacheHit(local)
//!     |
//! remote hit? --yes--> restore --> CacheHit(remote)
//!     |   404 / 403: fall through, anything else is fatal
//!     |
//! install (non-zero exit is fatal) --> archive --> publish
//! ```
//!
//! A forced refresh skips both lookups. A local entry that fails to restore
//! is evicted and treated as a miss.

use super::runner::CommandRunner;
use crate::backend::BackendConfig;
use crate::cache::{CacheKey, CacheTier, TieredCache};
use crate::error::{DepcacheError, DepcacheResult};
use crate::fingerprint::{Fingerprint, Manifest};
use crate::remote::DownloadFailure;
use crate::ui::format_bytes;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Per-run switches
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Reinstall and overwrite cache entries even on a hit
    pub force_refresh: bool,
}

/// How a backend run ended, short of a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Restored from a cache entry; the install command did not run
    CacheHit { tier: CacheTier },
    /// Installed and archived into the local tier
    InstalledAndCached,
    /// Installed, but the install directory does not exist so nothing was archived
    Installed,
    /// Installed, but the entry could not be written
    InstalledCacheFailed { reason: String },
    /// No manifest in the project
    Skipped,
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheHit { tier } => write!(f, "restored from {tier} cache"),
            Self::InstalledAndCached => write!(f, "installed and cached"),
            Self::Installed => write!(f, "installed, nothing to cache"),
            Self::InstalledCacheFailed { reason } => {
                write!(f, "installed, cache not written: {reason}")
            }
            Self::Skipped => write!(f, "skipped, no manifest"),
        }
    }
}

/// Runs the install flow for one backend
pub struct Orchestrator<'a> {
    cache: &'a TieredCache,
    runner: &'a dyn CommandRunner,
    options: InstallOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(cache: &'a TieredCache, runner: &'a dyn CommandRunner, options: InstallOptions) -> Self {
        Self {
            cache,
            runner,
            options,
        }
    }

    /// Restore `backend`'s dependencies from cache, or install and cache them
    pub async fn load_dependencies(&self, backend: &BackendConfig) -> DepcacheResult<InstallOutcome> {
        let present = tokio::fs::try_exists(&backend.manifest_path)
            .await
            .map_err(|e| DepcacheError::ManifestUnreadable {
                backend: backend.name.clone(),
                path: backend.manifest_path.clone(),
                reason: e.to_string(),
            })?;
        if !present {
            info!(
                "No {} found, skipping",
                backend
                    .manifest_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            );
            return Ok(InstallOutcome::Skipped);
        }

        let toolchain = backend.resolve_toolchain(self.runner).await?;
        let manifest =
            Manifest::read(&backend.name, &backend.manifest_path, &backend.manifest_fields).await?;
        let fingerprint = Fingerprint::compute(&manifest);
        let project = manifest
            .name
            .clone()
            .unwrap_or_else(|| backend.fallback_project_name());

        let key = CacheKey::resolve(&backend.name, &project, &toolchain, &fingerprint);
        info!("Dependency hash {}", fingerprint);
        debug!("Cache key {}", key);

        if self.options.force_refresh {
            info!("Refresh forced, ignoring cached entries");
            return self.install_then_archive(backend, &key).await;
        }

        if self.try_restore_local(backend, &key).await? {
            return Ok(InstallOutcome::CacheHit {
                tier: CacheTier::Local,
            });
        }

        if self.try_restore_remote(backend, &key).await? {
            return Ok(InstallOutcome::CacheHit {
                tier: CacheTier::Remote,
            });
        }

        self.install_then_archive(backend, &key).await
    }

    async fn try_restore_local(&self, backend: &BackendConfig, key: &CacheKey) -> DepcacheResult<bool> {
        let local = self.cache.local();
        let Some(size) = local.entry_size(key).await else {
            debug!("Local miss: {}", local.entry_path(key).display());
            return Ok(false);
        };

        info!(
            "Restoring {} from local cache ({})",
            backend.install_dir.display(),
            format_bytes(size)
        );
        self.restore(backend, key).await
    }

    async fn try_restore_remote(&self, backend: &BackendConfig, key: &CacheKey) -> DepcacheResult<bool> {
        let Some(remote) = self.cache.remote() else {
            return Ok(false);
        };

        let destination = self.cache.local().entry_path(key);
        match remote.fetch(key, &destination, &backend.name).await {
            Ok(bytes) => {
                debug!("Downloaded {} bytes", bytes);
                info!("Restoring {} from remote cache", backend.install_dir.display());
                self.restore(backend, key).await
            }
            Err(err) => match DownloadFailure::classify(&err) {
                DownloadFailure::NotFound => {
                    info!("Not in remote cache: {}", err);
                    Ok(false)
                }
                DownloadFailure::Forbidden => {
                    error!("Remote cache denied access: {}. Check your S3 credentials", err);
                    Ok(false)
                }
                DownloadFailure::Unknown => Err(DepcacheError::remote(&backend.name, err)),
            },
        }
    }

    /// Decompress the local entry; a broken entry is evicted and reported as
    /// a miss
    async fn restore(&self, backend: &BackendConfig, key: &CacheKey) -> DepcacheResult<bool> {
        let local = self.cache.local();
        match local.fetch(key, &backend.install_dir).await {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!("Discarding unreadable cache entry: {}", err);
                local.evict(key).await?;
                Ok(false)
            }
        }
    }

    async fn install_then_archive(
        &self,
        backend: &BackendConfig,
        key: &CacheKey,
    ) -> DepcacheResult<InstallOutcome> {
        info!("Running {}", backend.install_command);
        let code = self
            .runner
            .run(&backend.install_command, &backend.project_dir)
            .await?;
        if code != 0 {
            return Err(DepcacheError::InstallFailed {
                backend: backend.name.clone(),
                command: backend.install_command.clone(),
                code,
            });
        }

        let local = self.cache.local();
        match local.store(key, &backend.install_dir, &backend.name).await {
            Ok(true) => {}
            Ok(false) => return Ok(InstallOutcome::Installed),
            Err(err) if !err.is_fatal() => {
                warn!("{}", err);
                return Ok(InstallOutcome::InstalledCacheFailed {
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
        info!("Cached {}", local.entry_path(key).display());

        if let Some(remote) = self.cache.remote() {
            let source = local.entry_path(key);
            match remote.store(key, &source, &backend.name).await {
                Ok(bytes) => debug!("Uploaded {} bytes", bytes),
                Err(err) => warn!(
                    "Could not upload to {}, but local installation worked: {}",
                    remote.store_name(),
                    err
                ),
            }
        }

        Ok(InstallOutcome::InstalledAndCached)
    }
}
