//! Lectern Observability
//!
//! - [`logging`]: tracing subscriber setup and the request logging middleware
//! - [`metrics`]: Prometheus recorder, HTTP metrics middleware and the
//!   business counters recorded by the auth and telemetry code
//!
//! The counters are no-ops until [`init_metrics`] installs a recorder, so
//! library code can call the `track_*` helpers unconditionally.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, logging_middleware};
pub use metrics::{
    LoginOutcome, PrometheusHandle, init_metrics, is_metrics_enabled, metrics_app,
    metrics_middleware, set_hub_subscribers, track_hub_dropped, track_login, track_sample,
    track_token_issued,
};
