//! Test helper functions for building the app with mock collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use portfolio_api::config::{
    Config, ContactConfig, ObservabilityConfig, RateLimitConfig, ServerConfig, SmtpConfig,
    TurnstileConfig,
};
use portfolio_api::email::{EmailService, Outbox};
use portfolio_api::quota::{
    ManualClock, MemoryQuotaStore, QuotaDecision, QuotaStore, QuotaStoreError,
};
use portfolio_api::verify::TurnstileVerifier;
use portfolio_api::{AppState, create_app};
use std::sync::Arc;

/// App under test plus handles on its injected collaborators
pub struct TestApp {
    pub app: Router,
    pub outbox: Outbox,
    pub clock: ManualClock,
}

/// Configuration with SMTP credentials and a bot-check secret present,
/// so the configuration check passes
pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: "test@test.com".to_string(),
            password: "test".to_string(),
            from_name: "Portfolio Contact".to_string(),
        },
        contact: ContactConfig {
            owner_email: "owner@portfolio.test".to_string(),
            owner_name: "Portfolio Owner".to_string(),
        },
        turnstile: TurnstileConfig {
            enabled: true,
            secret_key: "test-secret".to_string(),
            verify_url: String::new(),
        },
        rate_limit: RateLimitConfig {
            enabled: true,
            max_requests: 2,
            window_hours: 24,
            sweep_interval_secs: 3600,
        },
        observability: ObservabilityConfig::default(),
    }
}

/// Build the app with a manual clock, a recording outbox, and a verifier
/// reporting a fixed outcome
pub fn build_test_app(config: Config, verifier_outcome: bool) -> TestApp {
    let clock = ManualClock::new(Utc::now());
    let quota: Arc<dyn QuotaStore> = Arc::new(MemoryQuotaStore::new(
        config.rate_limit.max_requests,
        Duration::hours(i64::from(config.rate_limit.window_hours)),
        Arc::new(clock.clone()),
    ));
    build_test_app_with_store(config, verifier_outcome, quota, clock)
}

pub fn build_test_app_with_store(
    config: Config,
    verifier_outcome: bool,
    quota: Arc<dyn QuotaStore>,
    clock: ManualClock,
) -> TestApp {
    let (email, outbox) = EmailService::new_mock(&config.contact);
    let state = AppState {
        config,
        quota,
        verifier: TurnstileVerifier::new_mock(verifier_outcome),
        email,
    };
    TestApp {
        app: create_app(state),
        outbox,
        clock,
    }
}

/// Quota store stub that always errors, for exercising the fail-open path
pub struct FailingQuotaStore;

#[async_trait]
impl QuotaStore for FailingQuotaStore {
    async fn check_and_count(&self, _client_id: &str) -> Result<QuotaDecision, QuotaStoreError> {
        Err(QuotaStoreError("store unreachable".to_string()))
    }

    async fn sweep(&self) -> Result<usize, QuotaStoreError> {
        Err(QuotaStoreError("store unreachable".to_string()))
    }
}

/// A complete, valid set of form fields
pub fn valid_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Name", "Jane Visitor"),
        ("Email", "jane@example.com"),
        ("Subject", "Project idea"),
        ("Message", "I have a project for you."),
        ("turnstile-token", "tok-123"),
    ]
}

/// Build a form-encoded POST /api/contact request
pub fn contact_request(fields: &[(&str, &str)], client_ip: Option<&str>) -> Request<Body> {
    let body = serde_urlencoded::to_string(fields).expect("encode form body");
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(ip) = client_ip {
        builder = builder.header("x-forwarded-for", ip);
    }
    builder.body(Body::from(body)).expect("build request")
}

/// Read a JSON response body
pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse json body")
}
