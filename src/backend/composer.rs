//! composer backend

use super::{read_json_object, BackendConfig, VersionProbe};
use crate::error::DepcacheResult;
use crate::fingerprint::ManifestFields;
use std::path::Path;

pub const NAME: &str = "composer";
pub const MANIFEST: &str = "composer.json";

const DEFAULT_VENDOR_DIR: &str = "vendor";

/// Backend for a project in `project_dir`.
///
/// The install directory honours `config.vendor-dir` from the manifest.
/// Composer has no override set.
pub fn config(project_dir: &Path) -> DepcacheResult<BackendConfig> {
    let manifest_path = project_dir.join(MANIFEST);
    let vendor_dir = read_json_object(&manifest_path)
        .and_then(|m| {
            m.get("config")?
                .get("vendor-dir")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_VENDOR_DIR.to_string());

    Ok(BackendConfig {
        name: NAME.to_string(),
        project_dir: project_dir.to_path_buf(),
        manifest_path,
        manifest_fields: ManifestFields::new("require", "require-dev", None),
        install_dir: project_dir.join(vendor_dir),
        install_command: "composer install".to_string(),
        toolchain: vec![VersionProbe::tool("composer --version", "")],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_vendor_dir() {
        let dir = TempDir::new().unwrap();
        let cfg = config(dir.path()).unwrap();
        assert_eq!(cfg.install_dir, dir.path().join("vendor"));
        assert!(cfg.manifest_fields.overrides.is_none());
    }

    #[test]
    fn custom_vendor_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("composer.json"),
            r#"{"require": {"php": ">=8.1"}, "config": {"vendor-dir": "lib/vendor"}}"#,
        )
        .unwrap();
        let cfg = config(dir.path()).unwrap();
        assert_eq!(cfg.install_dir, dir.path().join("lib/vendor"));
    }
}
