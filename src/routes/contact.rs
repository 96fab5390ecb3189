use axum::{
    Json,
    extract::{Form, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::client_ip::{UNKNOWN_CLIENT, client_ip};
use crate::email::Submission;
use crate::error::AppError;
use crate::quota::QuotaDecision;
use crate::routes::AppState;

const DEFAULT_SUBJECT: &str = "Contact Form Submission";

// local-part@domain.tld shape; anything stricter belongs to the mail relay
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Form field names match what the site's contact form posts
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Subject", default)]
    pub subject: Option<String>,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "turnstile-token", default)]
    pub turnstile_token: String,
}

/// POST /api/contact - validate a submission and dispatch both emails
///
/// Validation steps run in a fixed order and short-circuit: quota, required
/// fields, bot-check token, email syntax, server configuration.
pub async fn post_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let mut quota_decision: Option<QuotaDecision> = None;

    if state.config.rate_limit.enabled {
        let client = client_ip(&headers);
        if client == UNKNOWN_CLIENT {
            // no address to key on, let the request through
            info!("Client address unknown, skipping quota check");
        } else {
            match state.quota.check_and_count(&client).await {
                Ok(decision) if !decision.allowed => {
                    info!(client = %client, "Rate limit exceeded");
                    return Err(AppError::QuotaExceeded {
                        limit: state.config.rate_limit.max_requests,
                        reset_at: decision.reset_at,
                    });
                }
                Ok(decision) => quota_decision = Some(decision),
                Err(e) => {
                    // fail open: a broken quota store must not block legitimate mail
                    warn!(error = %e, client = %client, "Quota store error, allowing request");
                }
            }
        }
    }

    if form.name.is_empty() || form.email.is_empty() || form.message.is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    let subject = form
        .subject
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

    if state.config.turnstile.enabled {
        if form.turnstile_token.is_empty() {
            return Err(AppError::Verification(
                "Missing security verification".to_string(),
            ));
        }
        if !state.verifier.verify(&form.turnstile_token).await {
            return Err(AppError::Verification(
                "Security verification failed".to_string(),
            ));
        }
    }

    if !EMAIL_SHAPE.is_match(&form.email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    if state.config.smtp.username.is_empty() || state.config.smtp.password.is_empty() {
        return Err(AppError::Configuration(
            "Email service not configured".to_string(),
        ));
    }
    if state.config.turnstile.enabled && state.config.turnstile.secret_key.is_empty() {
        return Err(AppError::Configuration(
            "Security service not configured".to_string(),
        ));
    }

    let submission = Submission {
        name: form.name,
        email: form.email,
        subject,
        message: form.message,
    };

    state
        .email
        .send_owner_notification(&submission)
        .map_err(AppError::Delivery)?;
    state
        .email
        .send_auto_reply(&submission)
        .map_err(AppError::Delivery)?;

    info!(email = %submission.email, "Contact submission delivered");

    let mut response = (StatusCode::OK, Json(json!({ "ok": true }))).into_response();
    if let Some(decision) = quota_decision {
        let headers = response.headers_mut();
        headers.insert(
            "X-RateLimit-Limit",
            header_value(state.config.rate_limit.max_requests.to_string()),
        );
        headers.insert(
            "X-RateLimit-Remaining",
            header_value(decision.remaining.to_string()),
        );
        headers.insert(
            "X-RateLimit-Reset",
            header_value(decision.reset_at.timestamp_millis().to_string()),
        );
    }
    Ok(response)
}

fn header_value(value: String) -> HeaderValue {
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape_accepts_plain_addresses() {
        assert!(EMAIL_SHAPE.is_match("jane@example.com"));
        assert!(EMAIL_SHAPE.is_match("a.b+c@sub.domain.io"));
    }

    #[test]
    fn test_email_shape_rejects_malformed_addresses() {
        assert!(!EMAIL_SHAPE.is_match("not-an-email"));
        assert!(!EMAIL_SHAPE.is_match("missing@tld"));
        assert!(!EMAIL_SHAPE.is_match("two@@example.com"));
        assert!(!EMAIL_SHAPE.is_match("spaces in@example.com"));
    }
}
