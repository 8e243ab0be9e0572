//! Final asset retrieval and persistence.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::FetchError;
use crate::retry::RetryPolicy;

/// Default number of download attempts before a fetch fails.
pub const DOWNLOAD_ATTEMPTS: u32 = 3;

/// Future returned by [`Transport::get`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;

/// Fetches the bytes behind a URI.
///
/// A non-success response must be reported as an error.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, uri: &'a str) -> TransportFuture<'a>;
}

/// Wraps a [`Transport`] with bounded automatic retry.
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    /// Makes at most `attempts` attempts (at least one), backing off from
    /// 500 ms up to 4 s between them.
    pub fn with_attempts(inner: T, attempts: u32) -> Self {
        let policy = RetryPolicy::bounded(attempts.max(1)).with_backoff(
            Duration::from_millis(500),
            Duration::from_secs(4),
            2.0,
        );
        Self::with_policy(inner, policy)
    }

    pub fn with_policy(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T: Transport> Transport for RetryingTransport<T> {
    fn get<'a>(&'a self, uri: &'a str) -> TransportFuture<'a> {
        Box::pin(async move {
            let mut attempt: u32 = 0;
            loop {
                attempt = attempt.saturating_add(1);
                match self.inner.get(uri).await {
                    Ok(bytes) => return Ok(bytes),
                    Err(e) if self.policy.allows(attempt.saturating_add(1)) => {
                        let delay = self.policy.delay_for_retry(attempt);
                        warn!(uri, attempt, error = %e, "download attempt failed, retrying");
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    Err(e) => {
                        return Err(FetchError::Exhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                }
            }
        })
    }
}

/// Callback invoked with the saved path after a successful fetch.
pub type CompletionCallback = Box<dyn Fn(&Path) + Send + Sync>;

/// Downloads an asset and writes it whole to disk.
pub struct AssetFetcher<T> {
    transport: T,
    on_complete: Option<CompletionCallback>,
}

impl<T: Transport> AssetFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            on_complete: None,
        }
    }

    /// Sets the callback invoked after each successful save.
    pub fn on_complete(mut self, cb: CompletionCallback) -> Self {
        self.on_complete = Some(cb);
        self
    }

    /// Fetches `uri` and writes the bytes to `path`, replacing any existing
    /// file.
    ///
    /// Failures are logged with the target path and returned; nothing is
    /// written when the transport fails.
    pub async fn fetch(&self, uri: &str, path: &Path) -> Result<PathBuf, FetchError> {
        match self.save(uri, path).await {
            Ok(size) => {
                info!(path = %path.display(), bytes = size, "file saved");
                if let Some(cb) = &self.on_complete {
                    cb(path);
                }
                Ok(path.to_path_buf())
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "error downloading or saving the file"
                );
                Err(e)
            }
        }
    }

    async fn save(&self, uri: &str, path: &Path) -> Result<usize, FetchError> {
        let bytes = self.transport.get(uri).await?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| FetchError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(bytes.len())
    }
}
