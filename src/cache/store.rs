//! Two-tier cache store
//!
//! The local tier is always present. The remote tier is optional and every
//! remote fetch lands in the local entry path, so a fetched entry is restored
//! the same way as a local hit.

use super::key::CacheKey;
use super::local::LocalTier;
use crate::remote::{ObjectStore, RemoteError, TransferProgress};
use crate::ui::TransferBars;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Tier an entry was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Local,
    Remote,
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Object-store tier bound to one bucket
#[derive(Clone)]
pub struct RemoteTier {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    bars: TransferBars,
}

impl RemoteTier {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, bars: TransferBars) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            bars,
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.store_name()
    }

    /// Download the entry for `key` into `destination`
    pub async fn fetch(
        &self,
        key: &CacheKey,
        destination: &Path,
        label: &str,
    ) -> Result<u64, RemoteError> {
        let remote_key = key.remote_key();
        debug!(
            "Fetching {}://{}/{}",
            self.store.store_name(),
            self.bucket,
            remote_key
        );

        let (tx, rx) = watch::channel(TransferProgress::default());
        let tracker = self.bars.track(format!("{label} download"), rx);
        let result = self
            .store
            .download(&self.bucket, &remote_key, destination, tx)
            .await;
        let _ = tracker.await;
        result
    }

    /// Upload the file at `source` as the entry for `key`
    pub async fn store(
        &self,
        key: &CacheKey,
        source: &Path,
        label: &str,
    ) -> Result<u64, RemoteError> {
        let remote_key = key.remote_key();
        debug!(
            "Uploading {} to {}://{}/{}",
            source.display(),
            self.store.store_name(),
            self.bucket,
            remote_key
        );

        let (tx, rx) = watch::channel(TransferProgress::default());
        let tracker = self.bars.track(format!("{label} upload"), rx);
        let result = self
            .store
            .upload(source, &self.bucket, &remote_key, tx)
            .await;
        let _ = tracker.await;
        result
    }
}

/// Local tier plus optional remote tier, shared by all backends of a run
#[derive(Clone)]
pub struct TieredCache {
    local: LocalTier,
    remote: Option<RemoteTier>,
}

impl TieredCache {
    pub fn new(local: LocalTier, remote: Option<RemoteTier>) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &LocalTier {
        &self.local
    }

    pub fn remote(&self) -> Option<&RemoteTier> {
        self.remote.as_ref()
    }
}
