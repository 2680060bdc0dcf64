//! bower backend

use super::{read_json_object, BackendConfig, VersionProbe};
use crate::error::DepcacheResult;
use crate::fingerprint::ManifestFields;
use std::path::Path;

pub const NAME: &str = "bower";
pub const MANIFEST: &str = "bower.json";

const DEFAULT_DIRECTORY: &str = "bower_components";

/// Backend for a project in `project_dir`.
///
/// The install directory honours `directory` from `.bowerrc`.
pub fn config(project_dir: &Path) -> DepcacheResult<BackendConfig> {
    let directory = read_json_object(&project_dir.join(".bowerrc"))
        .and_then(|rc| rc.get("directory")?.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DIRECTORY.to_string());

    Ok(BackendConfig {
        name: NAME.to_string(),
        project_dir: project_dir.to_path_buf(),
        manifest_path: project_dir.join(MANIFEST),
        manifest_fields: ManifestFields::new("dependencies", "devDependencies", Some("overrides")),
        install_dir: project_dir.join(directory),
        install_command: "bower install".to_string(),
        toolchain: vec![VersionProbe::tool("bower --version", "")],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_directory() {
        let dir = TempDir::new().unwrap();
        let cfg = config(dir.path()).unwrap();
        assert_eq!(cfg.install_dir, dir.path().join("bower_components"));
        assert_eq!(cfg.manifest_path, dir.path().join("bower.json"));
    }

    #[test]
    fn bowerrc_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".bowerrc"), r#"{"directory": "public/lib"}"#).unwrap();
        let cfg = config(dir.path()).unwrap();
        assert_eq!(cfg.install_dir, dir.path().join("public/lib"));
    }

    #[test]
    fn broken_bowerrc_uses_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".bowerrc"), "not json").unwrap();
        let cfg = config(dir.path()).unwrap();
        assert_eq!(cfg.install_dir, dir.path().join("bower_components"));
    }
}
