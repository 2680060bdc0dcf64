//! Package-manager backends
//!
//! A backend is plain data: where its manifest lives, which manifest fields
//! hold dependencies, where installs land, the install command, and how to
//! probe the toolchain version that namespaces its cache entries.

pub mod bower;
pub mod composer;
pub mod npm;
mod registry;

pub use registry::{BackendFactory, BackendRegistry};

use crate::cache::ToolchainVersion;
use crate::error::{DepcacheError, DepcacheResult};
use crate::fingerprint::ManifestFields;
use crate::install::CommandRunner;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One source of a toolchain version component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionProbe {
    /// `<os>-<arch>` of the running host
    HostPlatform,
    /// Output of `command`, prefixed with `prefix`
    Tool { command: String, prefix: String },
}

impl VersionProbe {
    pub fn tool(command: &str, prefix: &str) -> Self {
        Self::Tool {
            command: command.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

/// Everything an orchestrator needs to run one package manager
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub name: String,
    pub project_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest_fields: ManifestFields,
    pub install_dir: PathBuf,
    pub install_command: String,
    pub toolchain: Vec<VersionProbe>,
}

impl BackendConfig {
    /// Append extra arguments to the install command
    pub fn with_install_args(mut self, args: &[String]) -> Self {
        for arg in args {
            self.install_command.push(' ');
            self.install_command.push_str(&shell_quote(arg));
        }
        self
    }

    /// Project name for the cache key when the manifest has none
    pub fn fallback_project_name(&self) -> String {
        self.project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }

    /// Probe every toolchain component in declared order.
    ///
    /// A tool that cannot be run is `ToolMissing`.
    pub async fn resolve_toolchain(
        &self,
        runner: &dyn CommandRunner,
    ) -> DepcacheResult<ToolchainVersion> {
        let mut components = Vec::with_capacity(self.toolchain.len());
        for probe in &self.toolchain {
            match probe {
                VersionProbe::HostPlatform => components.push(host_platform()),
                VersionProbe::Tool { command, prefix } => {
                    let output = runner.output(command, &self.project_dir).await?;
                    let Some(output) = output else {
                        return Err(DepcacheError::ToolMissing {
                            backend: self.name.clone(),
                            tool: command.split_whitespace().next().unwrap_or(command).to_string(),
                        });
                    };
                    components.push(format!("{prefix}{}", version_token(&output)));
                }
            }
        }

        let toolchain = ToolchainVersion::new(components);
        debug!("Toolchain for {}: {}", self.name, toolchain);
        Ok(toolchain)
    }
}

fn host_platform() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Version out of a `--version` banner: the first token starting with a
/// digit, else the whole first line
fn version_token(output: &str) -> &str {
    let first_line = output.lines().next().unwrap_or_default().trim();
    first_line
        .split_whitespace()
        .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(first_line)
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Read an optional JSON object file, returning `None` when absent or not
/// parseable
pub(crate) fn read_json_object(path: &Path) -> Option<serde_json::Map<String, serde_json::Value>> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => {
            debug!("Ignoring unparseable {}", path.display());
            None
        }
    }
}
