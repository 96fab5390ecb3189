use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Verification(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Rate limit exceeded")]
    QuotaExceeded {
        limit: u32,
        reset_at: DateTime<Utc>,
    },

    #[error("Failed to send message")]
    Delivery(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Verification(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Configuration(msg) => {
                tracing::error!(reason = %msg, "Request rejected: server misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
            AppError::QuotaExceeded { limit, reset_at } => {
                let body = json!({
                    "error": format!(
                        "Rate limit exceeded. You can send up to {} messages per day. Try again after {}",
                        limit,
                        reset_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    )
                });
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert("X-RateLimit-Limit", header_value(limit.to_string()));
                headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
                headers.insert(
                    "X-RateLimit-Reset",
                    header_value(reset_at.timestamp_millis().to_string()),
                );
                response
            }
            AppError::Delivery(err) => {
                // Never leak mail-relay internals to the client
                tracing::error!(error = ?err, "Failed to deliver contact emails");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to send message. Please try again." })),
                )
                    .into_response()
            }
        }
    }
}

fn header_value(value: String) -> HeaderValue {
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("0"))
}
