//! Integration tests for depcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn depcache() -> Command {
        cargo_bin_cmd!("depcache")
    }

    /// Command isolated from the user's config and cache
    fn isolated(home: &TempDir) -> Command {
        let mut cmd = depcache();
        cmd.env_remove("DEPCACHE_DIR")
            .env_remove("DEPCACHE_CONFIG")
            .arg("--config")
            .arg(home.path().join("absent.toml"))
            .arg("--no-local")
            .arg("--cache-directory")
            .arg(home.path().join("cache"));
        cmd
    }

    #[test]
    fn help_displays() {
        depcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("manifest fingerprint"));
    }

    #[test]
    fn version_displays() {
        depcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("depcache"));
    }

    #[test]
    fn backends_lists_builtins() {
        depcache()
            .arg("backends")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("npm")
                    .and(predicate::str::contains("bower.json"))
                    .and(predicate::str::contains("composer.json")),
            );
    }

    #[test]
    fn install_without_manifests_skips() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        isolated(&home)
            .arg("install")
            .arg("--project")
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("skipped, no manifest"));
    }

    #[test]
    fn install_unknown_manager_fails() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        isolated(&home)
            .args(["install", "--project"])
            .arg(project.path())
            .arg("yarn")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown package manager: yarn"));
    }

    #[test]
    fn install_with_partial_remote_config_fails() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let config = home.path().join("config.toml");
        fs::write(&config, "[remote]\nbucket = \"deps\"\n").unwrap();

        depcache()
            .env_remove("DEPCACHE_DIR")
            .arg("--config")
            .arg(&config)
            .arg("--no-local")
            .args(["install", "--project"])
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing: access_key_id, secret_access_key"));
    }

    #[test]
    fn install_reads_local_config_from_project() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join(".depcache.toml"),
            "[remote]\nbucket = \"deps\"\n",
        )
        .unwrap();

        depcache()
            .current_dir(home.path())
            .env_remove("DEPCACHE_DIR")
            .env_remove("DEPCACHE_CONFIG")
            .arg("--config")
            .arg(home.path().join("absent.toml"))
            .arg("--cache-directory")
            .arg(home.path().join("cache"))
            .args(["install", "--project"])
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing: access_key_id, secret_access_key"));
    }

    #[test]
    fn clean_removes_only_entries() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join("cache/npm/app/node-v20");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("0123456789abcdef0123456789abcdef.tar.gz"), "x").unwrap();
        fs::write(dir.join("README"), "keep").unwrap();

        isolated(&home)
            .arg("clean")
            .assert()
            .success()
            .stdout(predicate::str::contains("cleaned 1 files from cache directory"));

        assert!(!dir.join("0123456789abcdef0123456789abcdef.tar.gz").exists());
        assert!(dir.join("README").exists());
    }

    #[test]
    fn invalid_config_fails_with_path() {
        let home = TempDir::new().unwrap();
        let config = home.path().join("config.toml");
        fs::write(&config, "[cache\n").unwrap();

        depcache()
            .arg("--config")
            .arg(&config)
            .arg("--no-local")
            .arg("clean")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
