//! Shared infrastructure and router for the TripSync HTTP service.
//!
//! The service follows a thin-handler pattern: all business logic resides in
//! `tripsync-lib` behind the `tripsync-tools` registry, and this crate
//! provides only HTTP glue:
//!
//! - [`logging`]: structured JSON logging setup
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`middleware`]: request tracking and HTTP metrics middleware
//! - [`problem`]: RFC 9457 Problem Details for HTTP-level faults
//! - [`routes`]: the axum router and handlers
//!
//! Tool-level faults never become HTTP errors: a failed tool call returns
//! 200 with an `error` field so the calling orchestrator's conversation
//! continues.

#![deny(warnings)]

pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod problem;
pub mod routes;

pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{init_metrics, metrics_handler, MetricsConfig, MetricsError};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use problem::ProblemDetails;
pub use routes::{build_router, AppState};
