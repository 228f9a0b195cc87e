use crate::log_entry::LogEntry;
use crate::query_structures::QueryParams;
use anyhow::{Context, Result};
use derive_more::derive::{Display, Error};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

pub const LOGS_PATH: &str = "/api/v1/logs";

/// Marks a request sent by another instance. Such requests are answered from
/// the local file only.
pub const HOP_HEADER: &str = "X-Log-Collection-Hop";

/// Largest peer response body buffered before giving up on the peer.
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Why a peer contributed no entries to a query.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum PeerFailure {
    #[display("invalid peer address: {reason}")]
    InvalidUrl { reason: String },
    #[display("request failed: {reason}")]
    Transport { reason: String },
    #[display("peer answered {status}")]
    Status { status: StatusCode },
    #[display("response exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[display("undecodable response: {reason}")]
    Decode { reason: String },
    #[display("no answer before the fan-out deadline")]
    TimedOut,
    #[display("worker stopped before answering")]
    WorkerLost,
}

/// HTTP client used to query peers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    body_limit: usize,
}

impl ApiClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            body_limit: MAX_RESPONSE_BYTES,
        })
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Builds the `/api/v1/logs` URL of `peer` carrying the query's `n`,
    /// `file` and `filter`. Bare `host:port` peers are addressed over http.
    pub fn peer_url(peer: &str, params: &QueryParams) -> Result<Url, PeerFailure> {
        let base = if peer.contains("://") {
            peer.to_string()
        } else {
            format!("http://{peer}")
        };
        let mut url = Url::parse(&base)
            .and_then(|base| base.join(LOGS_PATH))
            .map_err(|e| PeerFailure::InvalidUrl {
                reason: format!("{peer}: {e}"),
            })?;
        url.query_pairs_mut()
            .append_pair("n", &params.line_count().to_string())
            .append_pair("file", params.file_name())
            .append_pair("filter", params.filter());
        Ok(url)
    }

    pub async fn fetch_logs(&self, url: Url) -> Result<Vec<LogEntry>, PeerFailure> {
        let response = self
            .client
            .get(url)
            .header(HOP_HEADER, "1")
            .send()
            .await
            .map_err(|e| PeerFailure::Transport { reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PeerFailure::Status { status });
        }

        let body = self.read_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| PeerFailure::Decode { reason: e.to_string() })
    }

    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, PeerFailure> {
        let too_large = PeerFailure::TooLarge { limit: self.body_limit };
        let declared = response.content_length().unwrap_or(0);
        if declared > self.body_limit as u64 {
            return Err(too_large);
        }

        let mut body = Vec::with_capacity(declared as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PeerFailure::Transport { reason: e.to_string() })?
        {
            if body.len() + chunk.len() > self.body_limit {
                return Err(too_large);
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(filter: &str) -> QueryParams {
        QueryParams::new("system.log", 25, filter).unwrap()
    }

    #[test]
    fn bare_peer_gets_http_scheme_and_query() {
        let url = ApiClient::peer_url("10.0.0.2:8080", &params("error")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.2:8080/api/v1/logs?n=25&file=system.log&filter=error"
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = ApiClient::peer_url("https://logs.internal:8443", &params("")).unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.path(), LOGS_PATH);
    }

    #[test]
    fn filter_is_encoded() {
        let url = ApiClient::peer_url("peer:8080", &params("disk full & more")).unwrap();
        let filter = url
            .query_pairs()
            .find(|(key, _)| key == "filter")
            .map(|(_, value)| value.into_owned());
        assert_eq!(filter.as_deref(), Some("disk full & more"));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn garbage_peer_is_invalid() {
        let err = ApiClient::peer_url("http://", &params("")).unwrap_err();
        assert!(matches!(err, PeerFailure::InvalidUrl { .. }));
    }
}
