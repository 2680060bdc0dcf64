//! Fingerprint-keyed dependency cache
//!
//! Install directories are archived once per dependency state and restored
//! on later runs instead of reinstalling.
//!
//! # Layout
//!
//! | Tier | Address |
//! |------|---------|
//! | local | `<root>/<backend>/<project>/<toolchain...>/<fp>.tar.gz` |
//! | remote | `<backend>/<project>/<toolchain...>/<fp>.tar.gz` in the bucket |
//!
//! Entries are write-once. A changed manifest yields a new fingerprint and a
//! new entry; stale entries stay until `depcache clean`.

pub mod archive;
pub mod key;
pub mod local;
pub mod store;

pub use key::{CacheKey, ToolchainVersion};
pub use local::LocalTier;
pub use store::{CacheTier, RemoteTier, TieredCache};
