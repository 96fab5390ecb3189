//! Bot-check token verification against the Turnstile siteverify endpoint

use crate::config::TurnstileConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Serialize)]
struct VerifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
}

/// Client for the external token verification service
#[derive(Clone)]
pub struct TurnstileVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret_key: String,
    mock_outcome: Option<bool>,
}

impl TurnstileVerifier {
    pub fn new(config: &TurnstileConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url: config.verify_url.clone(),
            secret_key: config.secret_key.clone(),
            mock_outcome: None,
        }
    }

    /// Create a verifier that always reports the given outcome
    ///
    /// This function is intended for test use only; no network call is made.
    pub fn new_mock(outcome: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url: String::new(),
            secret_key: String::new(),
            mock_outcome: Some(outcome),
        }
    }

    /// Verify a client token with the external service
    ///
    /// An unreachable service or an undecodable reply counts as a failed
    /// verification; the caller rejects the submission either way.
    pub async fn verify(&self, token: &str) -> bool {
        if let Some(outcome) = self.mock_outcome {
            return outcome;
        }

        let body = VerifyRequest {
            secret: &self.secret_key,
            response: token,
        };

        let response = match self.client.post(&self.verify_url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token verification request failed");
                return false;
            }
        };

        match response.json::<VerifyResponse>().await {
            Ok(outcome) => {
                info!(success = outcome.success, "Token verification completed");
                outcome.success
            }
            Err(e) => {
                warn!(error = %e, "Token verification returned an unreadable response");
                false
            }
        }
    }
}
