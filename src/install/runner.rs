//! Shell command execution
//!
//! Install commands run through the platform shell with inherited stdio, so
//! the package manager's own output and prompts reach the user unchanged.

use crate::error::{DepcacheError, DepcacheResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs shell command strings in a working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run interactively and return the exit code
    async fn run(&self, command: &str, cwd: &Path) -> DepcacheResult<i32>;

    /// Run quietly and return trimmed stdout, or `None` if the command could
    /// not be started or exited non-zero
    async fn output(&self, command: &str, cwd: &Path) -> DepcacheResult<Option<String>>;
}

/// Runner backed by `sh -c` (or `cmd /C` on Windows)
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    fn command(command: &str, cwd: &Path) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };
        cmd.arg(command).current_dir(cwd);
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, cwd: &Path) -> DepcacheResult<i32> {
        debug!("Executing interactively: {} (in {})", command, cwd.display());

        let status = Self::command(command, cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DepcacheError::command_failed(command, e))?;

        Ok(status.code().unwrap_or(-1))
    }

    async fn output(&self, command: &str, cwd: &Path) -> DepcacheResult<Option<String>> {
        debug!("Executing: {}", command);

        let output = match Self::command(command, cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DepcacheError::command_failed(command, e)),
        };

        if !output.status.success() {
            debug!(
                "{} exited with {:?}: {}",
                command,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    }
}
