//! Remote failure classification
//!
//! | Download failure | Effect |
//! |------------------|--------|
//! | NotFound (404) | install locally, then publish |
//! | Forbidden (403) | logged as an error, install locally |
//! | anything else | fatal for the backend |
//!
//! Upload failures never abort: the local install already succeeded, the
//! entry is just not shared.

use super::RemoteError;

/// Classified download failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFailure {
    NotFound,
    Forbidden,
    Unknown,
}

impl DownloadFailure {
    pub fn classify(err: &RemoteError) -> Self {
        match err {
            RemoteError::NotFound { .. } => Self::NotFound,
            RemoteError::Forbidden { .. } => Self::Forbidden,
            RemoteError::Status { .. } | RemoteError::Transport(_) | RemoteError::Io(_) => {
                Self::Unknown
            }
        }
    }

    /// Whether the backend must stop instead of installing locally
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Unknown)
    }
}
