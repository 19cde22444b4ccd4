//! TripSync HTTP microservice.
//!
//! Exposes the trip-planning tool registry over REST, streams broadcast
//! envelopes to the display surface via server-sent events, and serves
//! Prometheus metrics and health probes.
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `GEOCODER_URL` - Forward-geocoding endpoint (optional; built-in gazetteer otherwise)
//! - `DIRECTIONS_URL` / `DIRECTIONS_TOKEN` - Directions provider (optional)
//! - `PROVIDER_TIMEOUT_MS` - External call deadline (default: 5000)
//! - `SETTLEMENT_ADDRESS` - Vendor receiving address (optional)

use std::env;
use std::net::SocketAddr;

use tracing::info;

use tripsync_lib::{EngineConfig, SettlementIdentity, TripContext};
use tripsync_service::{build_router, init_logging, init_metrics, LoggingConfig, MetricsConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (reads LOG_FORMAT from environment)
    let logging_config = LoggingConfig::from_env().with_service("tripsync");
    init_logging(&logging_config);

    // Initialize metrics; failure is logged but not fatal
    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    // The context owns every stateful engine component; it is built once
    // here and shared by reference everywhere else.
    let engine_config = EngineConfig::from_env();
    let settlement = SettlementIdentity::from_env();

    info!(
        port,
        geocoder = engine_config.geocoder_url.as_deref().unwrap_or("builtin-gazetteer"),
        directions = engine_config.directions_url.as_deref().unwrap_or("fallback-only"),
        "starting tripsync service"
    );

    let context = TripContext::from_config(&engine_config, settlement);
    let app = build_router(context);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
