pub mod contact;
pub mod health;

pub use contact::post_contact;
pub use health::health;

use crate::config::Config;
use crate::email::EmailService;
use crate::quota::QuotaStore;
use crate::verify::TurnstileVerifier;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub quota: Arc<dyn QuotaStore>,
    pub verifier: TurnstileVerifier,
    pub email: EmailService,
}
