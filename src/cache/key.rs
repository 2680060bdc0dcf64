//! Cache key resolution
//!
//! A key is the ordered component list
//! `backend / project / toolchain... / <fingerprint>.tar.gz`. The local tier
//! joins it under the cache root with the platform separator, the remote tier
//! joins it with `/` so object keys look the same from every host.

use crate::fingerprint::Fingerprint;
use std::fmt;
use std::path::{Path, PathBuf};

/// File suffix of every cache entry
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Ordered version components that namespace a backend's cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainVersion {
    components: Vec<String>,
}

impl ToolchainVersion {
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            components: components
                .into_iter()
                .map(|c| sanitize_component(c.as_ref()))
                .collect(),
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl fmt::Display for ToolchainVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

/// Make a string safe to use as a single path segment or key segment.
///
/// Whitespace and separators become `-`; an empty result becomes `_`.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' || c == ':' {
                '-'
            } else {
                c
            }
        })
        .collect();

    match cleaned.as_str() {
        "" => "_".to_string(),
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned,
    }
}

/// Address of one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Directory components: backend, project, toolchain...
    namespace: Vec<String>,
    fingerprint: Fingerprint,
}

impl CacheKey {
    /// Resolve the key for a backend run
    pub fn resolve(
        backend: &str,
        project: &str,
        toolchain: &ToolchainVersion,
        fingerprint: &Fingerprint,
    ) -> Self {
        let mut namespace = Vec::with_capacity(2 + toolchain.components().len());
        namespace.push(sanitize_component(backend));
        namespace.push(sanitize_component(project));
        namespace.extend(toolchain.components().iter().cloned());

        Self {
            namespace,
            fingerprint: fingerprint.clone(),
        }
    }

    /// Entry file name: `<fingerprint>.tar.gz`
    pub fn file_name(&self) -> String {
        format!("{}{}", self.fingerprint, ARCHIVE_SUFFIX)
    }

    /// Directory holding the entry under a cache root
    pub fn local_dir(&self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        dir.extend(&self.namespace);
        dir
    }

    /// Full local path of the entry under a cache root
    pub fn local_path(&self, root: &Path) -> PathBuf {
        self.local_dir(root).join(self.file_name())
    }

    /// Object key on the remote tier, always `/`-joined
    pub fn remote_key(&self) -> String {
        let mut parts: Vec<&str> = self.namespace.iter().map(String::as_str).collect();
        let file_name = self.file_name();
        parts.push(&file_name);
        parts.join("/")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.remote_key())
    }
}

/// Whether a file name looks like a cache entry (`<32 hex>.tar.gz`)
pub fn is_entry_file_name(name: &str) -> bool {
    match name.strip_suffix(ARCHIVE_SUFFIX) {
        Some(stem) => stem.len() == 32 && stem.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
