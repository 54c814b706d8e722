//! Artifact sinks and snapshot readers for local files and HTTP endpoints.

use crate::data::{ArtifactSink, SnapshotSource, SourceError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Writes the artifact to a local path.
///
/// Writes are atomic: write to a sibling `.tmp` file then rename into place,
/// so readers never observe a half-written artifact. The temp file is removed
/// when either step fails.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "artifact".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ArtifactSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn local_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn write(&self, bytes: &[u8]) -> Result<(), SourceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.tmp_path();
        let result = fs::write(&tmp_path, bytes)
            .map_err(SourceError::from)
            .and_then(|()| {
                fs::rename(&tmp_path, &self.path)
                    .map_err(|e| SourceError::Other(format!("atomic rename failed: {e}")))
            });
        if result.is_err() {
            // A failed write may leave a partial temp file behind.
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }
}

/// Reads a published artifact from a local path.
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSnapshot {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        fs::read(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound {
                id: self.path.display().to_string(),
            },
            _ => SourceError::Io(e),
        })
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, SourceError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("moneyflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SourceError::Other(format!("failed to build HTTP client: {e}")))
}

fn transport_error(e: reqwest::Error) -> SourceError {
    if e.is_connect() || e.is_timeout() {
        SourceError::NetworkUnreachable(e.to_string())
    } else {
        SourceError::Other(e.to_string())
    }
}

fn check_status(status: reqwest::StatusCode, url: &str) -> Result<(), SourceError> {
    if status.is_success() {
        return Ok(());
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(SourceError::RateLimited);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound { id: url.to_string() });
    }
    Err(SourceError::Http {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

/// Uploads the artifact with an HTTP `PUT` (object-storage style full replace).
pub struct HttpSink {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(Duration::from_secs(60))?,
            url: url.into(),
        })
    }
}

impl ArtifactSink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    fn write(&self, bytes: &[u8]) -> Result<(), SourceError> {
        let resp = self
            .client
            .put(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/csv; charset=utf-8")
            .body(bytes.to_vec())
            .send()
            .map_err(transport_error)?;
        check_status(resp.status(), &self.url)
    }
}

/// Fetches the published artifact over HTTP `GET`.
pub struct HttpSnapshot {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSnapshot {
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(Duration::from_secs(30))?,
            url: url.into(),
        })
    }
}

impl SnapshotSource for HttpSnapshot {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        let resp = self.client.get(&self.url).send().map_err(transport_error)?;
        check_status(resp.status(), &self.url)?;
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| SourceError::Malformed(format!("failed to read body: {e}")))
    }
}

/// True when `location` looks like an HTTP(S) URL rather than a file path.
pub fn is_http_location(location: &str) -> bool {
    let lower = location.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
