//! npm backend

use super::{BackendConfig, VersionProbe};
use crate::error::DepcacheResult;
use crate::fingerprint::ManifestFields;
use std::path::Path;

pub const NAME: &str = "npm";

/// Manifest file names, in lookup order
pub const MANIFESTS: [&str; 2] = ["npm-shrinkwrap.json", "package.json"];

/// Backend for a project in `project_dir`.
///
/// A shrinkwrap file pins the full tree, so it is fingerprinted instead of
/// `package.json` when present.
pub fn config(project_dir: &Path) -> DepcacheResult<BackendConfig> {
    let manifest_path = MANIFESTS
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| project_dir.join("package.json"));

    Ok(BackendConfig {
        name: NAME.to_string(),
        project_dir: project_dir.to_path_buf(),
        manifest_path,
        manifest_fields: ManifestFields::new("dependencies", "devDependencies", Some("overrides")),
        install_dir: project_dir.join("node_modules"),
        install_command: "npm install".to_string(),
        toolchain: vec![
            VersionProbe::HostPlatform,
            VersionProbe::tool("node -v", "node-"),
            VersionProbe::tool("npm --version", "npm-"),
        ],
    })
}
