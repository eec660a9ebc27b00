use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::upstream::{self, UpstreamError};
use crate::AppState;

use super::models::{ChatReply, ChatRequest, ErrorResponse};

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, (StatusCode, Json<ErrorResponse>)> {
    // axum's default rejection is plain text and echoes parser detail;
    // clients only ever get the JSON error shape
    let Json(payload) = payload.map_err(|rejection| {
        error!("rejected chat request body: {rejection}");
        reject(
            StatusCode::BAD_REQUEST,
            "Request body must be JSON with a \"message\" field",
        )
    })?;

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Field \"message\" must be a non-empty string",
        ));
    }

    match upstream::generate_reply(&state.http, &state.config, message).await {
        Ok(reply) => Ok(Json(ChatReply { reply })),
        Err(err) => Err(error_response(err)),
    }
}

// Clients only ever see a short message string; the underlying detail is
// logged here and never returned.
fn error_response(err: UpstreamError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        UpstreamError::MissingApiKey => {
            error!("{err}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error.",
            )
        }
        UpstreamError::Api { status, message } => {
            error!(%status, %message, "upstream API error");
            reject(status, &message)
        }
        other => {
            error!("chat request failed: {other}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.",
            )
        }
    }
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Method Not Allowed".to_string(),
        }),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
        .into_response()
}
