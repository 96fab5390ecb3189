//! Web server implementation using Axum

use crate::config::Config;
use crate::email::EmailService;
use crate::quota::{MemoryQuotaStore, QuotaStore, SystemClock};
use crate::routes::AppState;
use crate::verify::TurnstileVerifier;
use chrono::Duration;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Start the web server
pub async fn serve(config: Config, host: String, port: u16) -> anyhow::Result<()> {
    let quota: Arc<dyn QuotaStore> = Arc::new(MemoryQuotaStore::new(
        config.rate_limit.max_requests,
        Duration::hours(i64::from(config.rate_limit.window_hours)),
        Arc::new(SystemClock),
    ));

    // Periodic sweep of expired quota records
    if config.rate_limit.enabled {
        let sweep_store = quota.clone();
        let sweep_interval = StdDuration::from_secs(config.rate_limit.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            // first tick fires immediately, skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                match sweep_store.sweep().await {
                    Ok(removed) if removed > 0 => {
                        info!(removed, "Swept expired quota records");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Quota sweep failed");
                    }
                }
            }
        });
    }

    let verifier = TurnstileVerifier::new(&config.turnstile);
    let email = EmailService::new(&config.smtp, &config.contact)?;

    let state = AppState {
        config,
        quota,
        verifier,
        email,
    };

    let app = crate::create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
