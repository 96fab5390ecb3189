pub mod client_ip;
pub mod config;
pub mod email;
pub mod error;
pub mod observability;
pub mod quota;
pub mod routes;
pub mod server;
pub mod verify;

pub use config::Config;
pub use routes::AppState;

use axum::{
    Router,
    routing::{get, post},
};

/// Create the application router
///
/// Takes fully constructed state so integration tests can inject mock
/// collaborators (email outbox, fixed verifier outcome, manual clock)
/// without starting the full server.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/contact", post(routes::post_contact))
        .with_state(state)
}
