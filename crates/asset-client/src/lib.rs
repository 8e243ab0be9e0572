//! HTTP transport for generated assets.
//!
//! A single GET per call; retrying is layered on top with
//! [`imagine_pipeline::RetryingTransport`].

use std::time::Duration;

use imagine_pipeline::{FetchError, Transport, TransportFuture};
use tracing::debug;

/// Overall timeout for one download request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads asset bytes over HTTP(S).
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the default request timeout.
    pub fn new() -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self { http })
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                uri: uri.to_string(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        debug!(uri, bytes = bytes.len(), "downloaded asset");
        Ok(bytes.to_vec())
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, uri: &'a str) -> TransportFuture<'a> {
        Box::pin(self.download(uri))
    }
}
