use std::error::Error;
use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RelayConfig;

/// Returned in place of a reply when the upstream response is missing the
/// candidate/content/part text path.
pub const REPLY_FALLBACK: &str = "Sorry, I couldn't generate a response.";

const GENERIC_UPSTREAM_ERROR: &str = "Failed to get a response from the AI.";

#[derive(Debug)]
pub enum UpstreamError {
    MissingApiKey,
    Send(reqwest::Error),
    Api { status: StatusCode, message: String },
    Body(reqwest::Error),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "GEMINI_API_KEY is not set"),
            Self::Send(err) => write!(f, "failed to send upstream request: {err}"),
            Self::Api { status, message } => {
                write!(f, "upstream API returned {status}: {message}")
            }
            Self::Body(err) => write!(f, "failed to read upstream response body: {err}"),
        }
    }
}

impl Error for UpstreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Send(err) | Self::Body(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Single-shot call to the generative-language API. The configured system
/// prompt and the user message are combined into one user-role content
/// entry. No retries, no streaming, no timeout beyond the client default.
pub async fn generate_reply(
    http: &reqwest::Client,
    cfg: &RelayConfig,
    message: &str,
) -> Result<String, UpstreamError> {
    if cfg.api_key.trim().is_empty() {
        return Err(UpstreamError::MissingApiKey);
    }

    let combined = format!("{} --- USER QUESTION: {}", cfg.system_prompt, message);
    let payload = GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: combined }],
        }],
    };

    let url = format!("{}/v1/models/{}:generateContent", cfg.api_base, cfg.model);
    debug!(model = %cfg.model, "sending generateContent request");

    let response = http
        .post(&url)
        .query(&[("key", cfg.api_key.as_str())])
        .json(&payload)
        .send()
        .await
        .map_err(UpstreamError::Send)?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .and_then(|err| err.message)
            .unwrap_or_else(|| GENERIC_UPSTREAM_ERROR.to_string());
        return Err(UpstreamError::Api { status, message });
    }

    let body: GenerateResponse = response.json().await.map_err(UpstreamError::Body)?;
    Ok(extract_reply(body))
}

fn extract_reply(body: GenerateResponse) -> String {
    body.candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .unwrap_or_else(|| REPLY_FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::{extract_reply, GenerateResponse, REPLY_FALLBACK};

    fn parse(raw: &str) -> GenerateResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn extracts_first_candidate_text() {
        let body = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"hello"},{"text":"ignored"}]}}]}"#,
        );
        assert_eq!(extract_reply(body), "hello");
    }

    #[test]
    fn falls_back_when_candidates_missing() {
        assert_eq!(extract_reply(parse("{}")), REPLY_FALLBACK);
    }

    #[test]
    fn falls_back_when_parts_empty() {
        let body = parse(r#"{"candidates":[{"content":{"parts":[]}}]}"#);
        assert_eq!(extract_reply(body), REPLY_FALLBACK);
    }

    #[test]
    fn falls_back_when_text_field_missing() {
        let body = parse(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#);
        assert_eq!(extract_reply(body), REPLY_FALLBACK);
    }
}
