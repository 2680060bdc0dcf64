//! In-memory collaborators for unit tests

use crate::error::DepcacheResult;
use crate::install::CommandRunner;
use crate::remote::{ObjectStore, ProgressSender, RemoteError, TransferProgress};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Command runner that records invocations instead of spawning processes.
///
/// `run` creates `installs` (with one file inside) and exits with `exit_code`.
/// `output` answers from the configured table, `1.0.0` by default.
#[derive(Default)]
pub struct MockRunner {
    exit_code: i32,
    installs: Option<PathBuf>,
    outputs: HashMap<String, String>,
    missing: HashSet<String>,
    runs: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installing_into(mut self, dir: impl Into<PathBuf>) -> Self {
        self.installs = Some(dir.into());
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    pub fn with_missing_tool(mut self, command: &str) -> Self {
        self.missing.insert(command.to_string());
        self
    }

    /// Commands passed to `run`, in order
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &str, _cwd: &Path) -> DepcacheResult<i32> {
        self.runs.lock().unwrap().push(command.to_string());
        if self.exit_code == 0 {
            if let Some(ref dir) = self.installs {
                std::fs::create_dir_all(dir.join("pkg")).unwrap();
                std::fs::write(dir.join("pkg/index.js"), command).unwrap();
            }
        }
        Ok(self.exit_code)
    }

    async fn output(&self, command: &str, _cwd: &Path) -> DepcacheResult<Option<String>> {
        if self.missing.contains(command) {
            return Ok(None);
        }
        Ok(Some(
            self.outputs
                .get(command)
                .cloned()
                .unwrap_or_else(|| "1.0.0".to_string()),
        ))
    }
}

/// Object store backed by a map, with injectable failures
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    download_status: Option<u16>,
    upload_status: Option<u16>,
    downloads: Mutex<usize>,
    uploads: Mutex<usize>,
}

impl MemoryStore {
    /// Every download fails with `status`
    pub fn failing_downloads(status: u16) -> Self {
        Self {
            download_status: Some(status),
            ..Default::default()
        }
    }

    /// Every upload fails with `status`
    pub fn failing_uploads(status: u16) -> Self {
        Self {
            upload_status: Some(status),
            ..Default::default()
        }
    }

    pub fn insert(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{bucket}/{key}"), data);
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&format!("{bucket}/{key}"))
    }

    pub fn downloads(&self) -> usize {
        *self.downloads.lock().unwrap()
    }

    pub fn uploads(&self) -> usize {
        *self.uploads.lock().unwrap()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
        progress: ProgressSender,
    ) -> Result<u64, RemoteError> {
        *self.downloads.lock().unwrap() += 1;
        if let Some(status) = self.download_status {
            return Err(RemoteError::from_status(status, key));
        }

        let data = self
            .objects
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{key}"))
            .cloned()
            .ok_or_else(|| RemoteError::from_status(404, key))?;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, &data)?;
        let total = data.len() as u64;
        progress.send_replace(TransferProgress {
            transferred: total,
            total: Some(total),
        });
        Ok(total)
    }

    async fn upload(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        progress: ProgressSender,
    ) -> Result<u64, RemoteError> {
        *self.uploads.lock().unwrap() += 1;
        if let Some(status) = self.upload_status {
            return Err(RemoteError::from_status(status, key));
        }

        let data = std::fs::read(source)?;
        let total = data.len() as u64;
        self.insert(bucket, key, data);
        progress.send_replace(TransferProgress {
            transferred: total,
            total: Some(total),
        });
        Ok(total)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
