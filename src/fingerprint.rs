//! Manifest parsing and fingerprinting
//!
//! A fingerprint identifies the installable state of a manifest: the
//! dependency name/version pairs of its primary, development and override
//! sets. Key order inside the manifest does not matter, any change to a
//! tracked pair does.

use crate::error::{DepcacheError, DepcacheResult};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Number of digest bytes kept; rendered as 32 hex characters
const FINGERPRINT_BYTES: usize = 16;

/// Dependency name/version pairs in manifest order
pub type DependencyMap = Vec<(String, String)>;

/// Manifest keys holding the three tracked dependency sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFields {
    pub primary: String,
    pub development: String,
    pub overrides: Option<String>,
}

impl ManifestFields {
    pub fn new(primary: &str, development: &str, overrides: Option<&str>) -> Self {
        Self {
            primary: primary.to_string(),
            development: development.to_string(),
            overrides: overrides.map(str::to_string),
        }
    }
}

/// Parsed dependency manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Project name, when the manifest declares one
    pub name: Option<String>,
    pub primary: DependencyMap,
    pub development: DependencyMap,
    pub overrides: DependencyMap,
}

impl Manifest {
    /// Parse manifest JSON, extracting the tracked dependency sets.
    ///
    /// Missing sets are empty. Anything that is not a JSON object fails.
    pub fn parse(content: &str, fields: &ManifestFields) -> Result<Self, String> {
        let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        let Value::Object(root) = value else {
            return Err("manifest root is not a JSON object".to_string());
        };

        let name = root.get("name").and_then(Value::as_str).map(str::to_string);
        let section = |key: Option<&str>| -> Result<DependencyMap, String> {
            match key.and_then(|k| root.get(k)) {
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(Value::Object(map)) => Ok(map
                    .iter()
                    .map(|(dep, spec)| (dep.clone(), version_spec(spec)))
                    .collect()),
                Some(_) => Err(format!(
                    "field '{}' is not an object",
                    key.unwrap_or_default()
                )),
            }
        };

        Ok(Self {
            name,
            primary: section(Some(&fields.primary))?,
            development: section(Some(&fields.development))?,
            overrides: section(fields.overrides.as_deref())?,
        })
    }

    /// Read and parse a manifest file for a backend
    pub async fn read(backend: &str, path: &Path, fields: &ManifestFields) -> DepcacheResult<Self> {
        let unreadable = |reason: String| DepcacheError::ManifestUnreadable {
            backend: backend.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| unreadable(e.to_string()))?;
        Self::parse(&content, fields).map_err(unreadable)
    }
}

fn version_spec(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Digest input: each set flattened to sorted `name + version` strings
#[derive(Serialize)]
struct DigestInput {
    primary: Vec<String>,
    development: Vec<String>,
    overrides: Vec<String>,
}

fn sorted_entries(map: &DependencyMap) -> Vec<String> {
    let mut entries: Vec<String> = map
        .iter()
        .map(|(name, version)| format!("{name}{version}"))
        .collect();
    entries.sort();
    entries
}

/// Content fingerprint of a manifest's dependency sets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a parsed manifest
    pub fn compute(manifest: &Manifest) -> Self {
        let input = DigestInput {
            primary: sorted_entries(&manifest.primary),
            development: sorted_entries(&manifest.development),
            overrides: sorted_entries(&manifest.overrides),
        };
        // Serializing Vec<String> cannot fail
        let encoded = serde_json::to_vec(&input).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        let digest = hasher.finalize();

        let fingerprint = Self(hex::encode(&digest[..FINGERPRINT_BYTES]));
        debug!("Fingerprint {} over {} bytes", fingerprint, encoded.len());
        fingerprint
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn npm_fields() -> ManifestFields {
        ManifestFields::new("dependencies", "devDependencies", Some("overrides"))
    }

    fn pairs(items: &[(&str, &str)]) -> DependencyMap {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = Manifest {
            primary: pairs(&[("left-pad", "1.0.0"), ("lodash", "^4.17.0")]),
            development: pairs(&[("mocha", "10.0.0"), ("chai", "4.0.0")]),
            ..Default::default()
        };
        let b = Manifest {
            primary: pairs(&[("lodash", "^4.17.0"), ("left-pad", "1.0.0")]),
            development: pairs(&[("chai", "4.0.0"), ("mocha", "10.0.0")]),
            ..Default::default()
        };
        assert_eq!(Fingerprint::compute(&a), Fingerprint::compute(&b));
    }

    #[test]
    fn version_change_changes_fingerprint() {
        let a = Manifest {
            primary: pairs(&[("lodash", "4.17.0")]),
            ..Default::default()
        };
        let b = Manifest {
            primary: pairs(&[("lodash", "4.17.1")]),
            ..Default::default()
        };
        assert_ne!(Fingerprint::compute(&a), Fingerprint::compute(&b));
    }

    #[test]
    fn sets_are_not_interchangeable() {
        let a = Manifest {
            primary: pairs(&[("lodash", "4.17.0")]),
            ..Default::default()
        };
        let b = Manifest {
            development: pairs(&[("lodash", "4.17.0")]),
            ..Default::default()
        };
        assert_ne!(Fingerprint::compute(&a), Fingerprint::compute(&b));
    }

    #[test]
    fn fingerprint_is_32_hex_chars() {
        let fp = Fingerprint::compute(&Manifest::default());
        assert_eq!(fp.as_str().len(), 32);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn name_and_scripts_are_not_tracked() {
        let fields = npm_fields();
        let a = Manifest::parse(
            r#"{"name": "a", "scripts": {"test": "x"}, "dependencies": {"q": "1"}}"#,
            &fields,
        )
        .unwrap();
        let b = Manifest::parse(r#"{"name": "b", "dependencies": {"q": "1"}}"#, &fields).unwrap();
        assert_eq!(Fingerprint::compute(&a), Fingerprint::compute(&b));
        assert_eq!(a.name.as_deref(), Some("a"));
    }

    #[test]
    fn parse_missing_sets_are_empty() {
        let manifest = Manifest::parse(r#"{"name": "bare"}"#, &npm_fields()).unwrap();
        assert!(manifest.primary.is_empty());
        assert!(manifest.development.is_empty());
        assert!(manifest.overrides.is_empty());
    }

    #[test]
    fn parse_without_override_field() {
        let fields = ManifestFields::new("require", "require-dev", None);
        let manifest = Manifest::parse(
            r#"{"require": {"php": ">=8.1"}, "overrides": {"x": "1"}}"#,
            &fields,
        )
        .unwrap();
        assert_eq!(manifest.primary, pairs(&[("php", ">=8.1")]));
        assert!(manifest.overrides.is_empty());
    }

    #[test]
    fn parse_rejects_non_object() {
        assert!(Manifest::parse("[1, 2]", &npm_fields()).is_err());
        assert!(Manifest::parse("not json", &npm_fields()).is_err());
        assert!(Manifest::parse(r#"{"dependencies": "nope"}"#, &npm_fields()).is_err());
    }

    #[tokio::test]
    async fn read_reports_unreadable_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{ broken").unwrap();

        let err = Manifest::read("npm", &path, &npm_fields()).await.unwrap_err();
        assert!(matches!(err, DepcacheError::ManifestUnreadable { .. }));
        assert!(err.to_string().starts_with("[npm]"));
    }
}
