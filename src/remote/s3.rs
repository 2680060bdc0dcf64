//! S3-compatible object store over HTTPS
//!
//! Path-style requests (`<endpoint>/<bucket>/<key>`) signed with SigV4. The
//! HTTP client is blocking, so each transfer runs on tokio's blocking pool
//! and never stalls other backends.

use super::sign::{self, SigningRequest};
use super::{ObjectStore, ProgressSender, RemoteError, TransferProgress};
use async_trait::async_trait;
use chrono::Utc;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

/// Access key pair for the bucket
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// S3 store client
#[derive(Clone)]
pub struct S3Store {
    agent: ureq::Agent,
    /// `scheme://host[:port]`
    origin: String,
    host: String,
    /// Path prefix of the endpoint, empty or starting with `/`
    base_path: String,
    region: String,
    credentials: Arc<S3Credentials>,
}

impl S3Store {
    /// Create a client for `region`, optionally against a custom endpoint
    /// (MinIO, R2, ...). Without one, the AWS regional endpoint is used.
    pub fn new(credentials: S3Credentials, region: &str, endpoint: Option<&str>) -> Self {
        let endpoint = endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://s3.{region}.amazonaws.com"));
        let (origin, host, base_path) = split_endpoint(&endpoint);

        Self {
            agent: ureq::Agent::new_with_defaults(),
            origin,
            host,
            base_path,
            region: region.to_string(),
            credentials: Arc::new(credentials),
        }
    }

    /// Request path, signed exactly as sent
    fn object_path(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_path,
            sign::encode_key(bucket),
            sign::encode_key(key)
        )
    }

    fn signed_headers(&self, method: &str, path: &str) -> Vec<(&'static str, String)> {
        sign::sign(&SigningRequest {
            method,
            host: &self.host,
            path,
            region: &self.region,
            access_key_id: &self.credentials.access_key_id,
            secret_access_key: &self.credentials.secret_access_key,
            now: Utc::now(),
        })
    }

    fn download_blocking(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
        progress: &ProgressSender,
    ) -> Result<u64, RemoteError> {
        let path = self.object_path(bucket, key);
        let url = format!("{}{}", self.origin, path);
        debug!("GET {url}");

        let mut req = self.agent.get(&url);
        for (name, value) in self.signed_headers("GET", &path) {
            req = req.header(name, value.as_str());
        }
        let resp = req.call().map_err(|e| map_ureq_error(e, key))?;

        let total = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        progress.send_replace(TransferProgress {
            transferred: 0,
            total,
        });

        let parent = destination
            .parent()
            .ok_or_else(|| RemoteError::Transport("destination has no parent".to_string()))?;
        fs::create_dir_all(parent)?;
        let mut tmp = NamedTempFile::new_in(parent)?;

        let mut reader = resp.into_body().into_reader();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            if n == 0 {
                break;
            }
            tmp.write_all(&buf[..n])?;
            transferred += n as u64;
            progress.send_replace(TransferProgress { transferred, total });
        }

        tmp.as_file().sync_all()?;
        tmp.persist(destination).map_err(|e| RemoteError::Io(e.error))?;
        Ok(transferred)
    }

    fn upload_blocking(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        progress: &ProgressSender,
    ) -> Result<u64, RemoteError> {
        let file = File::open(source)?;
        let total = file.metadata()?.len();
        progress.send_replace(TransferProgress {
            transferred: 0,
            total: Some(total),
        });

        let path = self.object_path(bucket, key);
        let url = format!("{}{}", self.origin, path);
        debug!("PUT {url} ({total} bytes)");

        let mut req = self
            .agent
            .put(&url)
            .header("Content-Type", "application/gzip")
            .header("Content-Length", total.to_string().as_str());
        for (name, value) in self.signed_headers("PUT", &path) {
            req = req.header(name, value.as_str());
        }

        let mut reader = ProgressReader {
            inner: file,
            transferred: 0,
            total,
            progress,
        };
        req.send(ureq::SendBody::from_reader(&mut reader))
            .map_err(|e| map_ureq_error(e, key))?;
        Ok(reader.transferred)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
        progress: ProgressSender,
    ) -> Result<u64, RemoteError> {
        let store = self.clone();
        let (bucket, key) = (bucket.to_string(), key.to_string());
        let destination: PathBuf = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            store.download_blocking(&bucket, &key, &destination, &progress)
        })
        .await
        .map_err(|e| RemoteError::Transport(format!("download task failed: {e}")))?
    }

    async fn upload(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        progress: ProgressSender,
    ) -> Result<u64, RemoteError> {
        let store = self.clone();
        let (bucket, key) = (bucket.to_string(), key.to_string());
        let source: PathBuf = source.to_path_buf();
        tokio::task::spawn_blocking(move || store.upload_blocking(&source, &bucket, &key, &progress))
            .await
            .map_err(|e| RemoteError::Transport(format!("upload task failed: {e}")))?
    }

    fn store_name(&self) -> &'static str {
        "s3"
    }
}

fn map_ureq_error(err: ureq::Error, key: &str) -> RemoteError {
    match err {
        ureq::Error::StatusCode(status) => RemoteError::from_status(status, key),
        other => RemoteError::Transport(other.to_string()),
    }
}

/// Reports every chunk read from `inner` as upload progress
struct ProgressReader<'a, R> {
    inner: R,
    transferred: u64,
    total: u64,
    progress: &'a ProgressSender,
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.transferred += n as u64;
            self.progress.send_replace(TransferProgress {
                transferred: self.transferred,
                total: Some(self.total),
            });
        }
        Ok(n)
    }
}

/// Split an endpoint URL into `(origin, host[:port], path prefix)`
fn split_endpoint(endpoint: &str) -> (String, String, String) {
    let (scheme, rest) = endpoint.split_once("://").unwrap_or(("https", endpoint));
    let (host, base_path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    (
        format!("{scheme}://{host}"),
        host.to_string(),
        base_path.trim_end_matches('/').to_string(),
    )
}
