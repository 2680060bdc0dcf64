//! depcache - dependency install cache
//!
//! Fingerprints package-manager manifests and reuses archived install
//! directories from a local cache or an S3 bucket, running several package
//! managers concurrently.

pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod install;
pub mod remote;
pub mod ui;

#[cfg(test)]
mod testing;

pub use error::{DepcacheError, DepcacheResult};
