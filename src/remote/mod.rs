//! Remote object-store tier
//!
//! The remote tier shares cache entries between machines. Transfers report
//! byte progress over a `watch` channel and finish with a typed result, so a
//! caller can classify failures by status code (see [`policy`]).

pub mod policy;
pub mod s3;
mod sign;

pub use policy::DownloadFailure;
pub use s3::{S3Credentials, S3Store};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::sync::watch;

/// Errors from a remote transfer
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("{key} does not exist in the bucket (bad bucket name or not uploaded yet)")]
    NotFound { key: String },

    #[error("access to {key} was denied")]
    Forbidden { key: String },

    #[error("HTTP {status} for {key}")]
    Status { status: u16, key: String },

    #[error("transfer failed: {0}")]
    Transport(String),

    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// Build the error for an HTTP status code
    pub fn from_status(status: u16, key: &str) -> Self {
        let key = key.to_string();
        match status {
            404 => Self::NotFound { key },
            403 => Self::Forbidden { key },
            status => Self::Status { status, key },
        }
    }

    /// Whether a failed download of this kind aborts the backend
    pub fn is_fatal(&self) -> bool {
        DownloadFailure::classify(self).is_fatal()
    }
}

/// Bytes moved so far, and the total when the peer announced it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferProgress {
    pub transferred: u64,
    pub total: Option<u64>,
}

/// Sending half of a transfer's progress channel
pub type ProgressSender = watch::Sender<TransferProgress>;

/// Object-store collaborator
///
/// Implementations must not leave a partial file at `destination` when a
/// download fails.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `key` from `bucket` into `destination`, returning the byte count
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
        progress: ProgressSender,
    ) -> Result<u64, RemoteError>;

    /// Upload the file at `source` to `key` in `bucket`, returning the byte count
    async fn upload(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        progress: ProgressSender,
    ) -> Result<u64, RemoteError>;

    /// Human-readable store name for logs
    fn store_name(&self) -> &'static str;
}
