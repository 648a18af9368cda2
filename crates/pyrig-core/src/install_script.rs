use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum InstallScriptError {
    #[error("failed to build installer download client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("failed to download installer script from {url}: {details}")]
    Request { url: String, details: String },
    #[error("installer script download failed with HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("installer script checksum mismatch: expected {expected_sha256}, got {actual_sha256}")]
    ChecksumMismatch {
        expected_sha256: String,
        actual_sha256: String,
    },
    #[error("failed to write installer script: {0}")]
    Write(#[source] std::io::Error),
}

/// Where installer scripts come from.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallScriptError>;
}

#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Delay before each attempt; one entry means a single attempt.
    pub retry_delays: Vec<Duration>,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_delays: vec![Duration::ZERO],
        }
    }
}

pub struct HttpScriptSource {
    client: reqwest::Client,
    retry_delays: Vec<Duration>,
}

impl HttpScriptSource {
    /// Build a source with the given timeout/retry policy.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(policy: &DownloadPolicy) -> Result<Self, InstallScriptError> {
        let client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .connect_timeout(policy.connect_timeout)
            .user_agent(format!("pyrig/{}/installer-script", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(InstallScriptError::ClientBuild)?;

        let retry_delays = if policy.retry_delays.is_empty() {
            vec![Duration::ZERO]
        } else {
            policy.retry_delays.clone()
        };

        Ok(Self {
            client,
            retry_delays,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, InstallScriptError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| InstallScriptError::Request {
                    url: url.to_string(),
                    details: source.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(InstallScriptError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| InstallScriptError::Request {
                url: url.to_string(),
                details: source.to_string(),
            })
    }
}

#[async_trait]
impl ScriptSource for HttpScriptSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallScriptError> {
        let mut last_error = None;

        for delay in &self.retry_delays {
            if !delay.is_zero() {
                debug!("Retrying {url} in {}s", delay.as_secs());
                tokio::time::sleep(*delay).await;
            }

            match self.fetch_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(error) => {
                    debug!("Download attempt for {url} failed: {error}");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| InstallScriptError::Request {
            url: url.to_string(),
            details: "no download attempts were made".to_string(),
        }))
    }
}

/// Download an installer script into a private temporary file. The file is
/// removed when the returned handle is dropped.
///
/// # Errors
/// Returns an error if the download fails, the checksum does not match
/// `expected_sha256`, or the script cannot be written to disk.
pub async fn download_install_script(
    source: &dyn ScriptSource,
    url: &str,
    expected_sha256: Option<&str>,
) -> Result<NamedTempFile, InstallScriptError> {
    info!("Downloading {url}");
    let script = source.fetch(url).await?;

    if let Some(expected) = expected_sha256 {
        verify_checksum(&script, expected)?;
    }

    let file = tempfile::Builder::new()
        .prefix("pyrig-installer-")
        .suffix(".sh")
        .tempfile()
        .map_err(InstallScriptError::Write)?;
    tokio::fs::write(file.path(), &script)
        .await
        .map_err(InstallScriptError::Write)?;

    debug!(
        "Wrote {} bytes from {url} to {}",
        script.len(),
        file.path().display()
    );
    Ok(file)
}

fn verify_checksum(script: &[u8], expected_sha256: &str) -> Result<(), InstallScriptError> {
    let actual_sha256 = format!("{:x}", Sha256::digest(script));
    if actual_sha256.eq_ignore_ascii_case(expected_sha256) {
        return Ok(());
    }

    Err(InstallScriptError::ChecksumMismatch {
        expected_sha256: expected_sha256.to_ascii_lowercase(),
        actual_sha256,
    })
}
