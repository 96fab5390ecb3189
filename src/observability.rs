use anyhow::Result;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing and logging
///
/// This sets up:
/// - Structured JSON logging (for production)
/// - Console logging (for development)
/// - Environment-based log level filtering
pub fn init_observability(service_name: &str, service_version: &str, log_level: &str) -> Result<()> {
    // Create environment filter for log levels
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // Determine if we should use JSON logging (production) or pretty console (development)
    let is_production = std::env::var("ENVIRONMENT")
        .map(|env| env == "production")
        .unwrap_or(false);

    if is_production {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_filter(env_filter))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(env_filter),
            )
            .try_init()?;
    }

    tracing::info!(
        service.name = service_name,
        service.version = service_version,
        "Observability initialized"
    );

    Ok(())
}
