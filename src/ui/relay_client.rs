use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum RelayError {
    /// The caller cancelled the in-flight call. Propagated as-is so the
    /// caller can decide whether to show anything at all.
    Aborted,
    Http(reqwest::Error),
    Endpoint { status: StatusCode, message: String },
    MalformedReply(reqwest::Error),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => write!(f, "relay call aborted"),
            Self::Http(err) => write!(f, "relay request failed: {err}"),
            Self::Endpoint { status, message } => {
                write!(f, "relay endpoint returned {status}: {message}")
            }
            Self::MalformedReply(err) => write!(f, "malformed relay reply: {err}"),
        }
    }
}

impl Error for RelayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) | Self::MalformedReply(err) => Some(err),
            _ => None,
        }
    }
}

impl RelayError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// One message out, one reply back. The controller only depends on this
/// seam, which keeps it testable without a server.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn send(&self, message: &str, cancel: &CancellationToken)
        -> Result<String, RelayError>;
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ReplyBody {
    reply: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpRelayClient {
    http: reqwest::Client,
    endpoint_url: String,
}

impl HttpRelayClient {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint_url: endpoint_url.into(),
        }
    }

    async fn post_message(&self, message: &str) -> Result<String, RelayError> {
        let response = self
            .http
            .post(&self.endpoint_url)
            .json(&RelayRequest { message })
            .send()
            .await
            .map_err(RelayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "The server returned an error.".to_string());
            return Err(RelayError::Endpoint { status, message });
        }

        let body: ReplyBody = response.json().await.map_err(RelayError::MalformedReply)?;
        Ok(body.reply)
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn send(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String, RelayError> {
        // biased so an already-cancelled token never races the request
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RelayError::Aborted),
            result = self.post_message(message) => result,
        }
    }
}
