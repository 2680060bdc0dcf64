//! Error types for depcache
//!
//! All modules use `DepcacheResult<T>` as their return type. Remote-store
//! failures have their own enum in [`crate::remote`] so the tier policy can
//! classify them before they are folded into this one.

use crate::remote::RemoteError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for depcache operations
pub type DepcacheResult<T> = Result<T, DepcacheError>;

/// All errors that can occur in depcache
#[derive(Error, Debug)]
pub enum DepcacheError {
    // Backend errors
    #[error("[{backend}] manifest {path} is unreadable: {reason}")]
    ManifestUnreadable {
        backend: String,
        path: PathBuf,
        reason: String,
    },

    #[error("[{backend}] command line tool {tool} not installed")]
    ToolMissing { backend: String, tool: String },

    #[error("[{backend}] error running {command} (exit code {code})")]
    InstallFailed {
        backend: String,
        command: String,
        code: i32,
    },

    #[error("[{backend}] error archiving {path}: {reason}")]
    ArchiveFailed {
        backend: String,
        path: PathBuf,
        reason: String,
    },

    #[error("[{backend}] could not write cache entry {path}: {reason}")]
    CacheWriteFailed {
        backend: String,
        path: PathBuf,
        reason: String,
    },

    #[error("[{backend}] remote cache: {source}")]
    Remote {
        backend: String,
        #[source]
        source: RemoteError,
    },

    #[error("Unknown package manager: {0}")]
    UnknownBackend(String),

    #[error("{count} package manager(s) failed: {names}")]
    BackendsFailed { count: usize, names: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Remote cache requires access_key_id, secret_access_key and bucket (missing: {missing})")]
    RemoteConfigIncomplete { missing: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DepcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Wrap a remote-store error for a backend
    pub fn remote(backend: impl Into<String>, source: RemoteError) -> Self {
        Self::Remote {
            backend: backend.into(),
            source,
        }
    }

    /// Whether this error aborts the backend that raised it.
    ///
    /// Archive and cache write failures after a successful install, and remote
    /// misses or credential rejections, only degrade caching.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::CacheWriteFailed { .. } | Self::ArchiveFailed { .. } => false,
            Self::Remote { source, .. } => source.is_fatal(),
            _ => true,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolMissing { .. } => Some("Install the package manager or drop it from the install list"),
            Self::RemoteConfigIncomplete { .. } => {
                Some("Set all three keys under [remote] in .depcache.toml, or remove the section")
            }
            Self::Remote {
                source: RemoteError::Forbidden { .. },
                ..
            } => Some("Check your S3 credentials"),
            Self::UnknownBackend(_) => Some("Run: depcache backends"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_backend() {
        let err = DepcacheError::InstallFailed {
            backend: "npm".to_string(),
            command: "npm install".to_string(),
            code: 1,
        };
        assert_eq!(err.to_string(), "[npm] error running npm install (exit code 1)");
    }

    #[test]
    fn error_hint() {
        let err = DepcacheError::ToolMissing {
            backend: "bower".to_string(),
            tool: "bower".to_string(),
        };
        assert!(err.hint().is_some());
        assert!(DepcacheError::Internal("x".to_string()).hint().is_none());
    }

    #[test]
    fn error_fatality() {
        let write = DepcacheError::CacheWriteFailed {
            backend: "npm".to_string(),
            path: PathBuf::from("/tmp/x.tar.gz"),
            reason: "disk full".to_string(),
        };
        assert!(!write.is_fatal());

        let not_found = DepcacheError::remote(
            "npm",
            RemoteError::NotFound {
                key: "npm/app/abc.tar.gz".to_string(),
            },
        );
        assert!(!not_found.is_fatal());

        let transport = DepcacheError::remote("npm", RemoteError::Transport("reset".to_string()));
        assert!(transport.is_fatal());
    }
}
