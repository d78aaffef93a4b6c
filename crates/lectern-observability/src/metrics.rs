//! Prometheus metrics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

pub use metrics_exporter_prometheus::PrometheusHandle;

static METRICS_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn is_metrics_enabled() -> bool {
    METRICS_ENABLED.load(Ordering::Relaxed)
}

/// Installs the global Prometheus recorder and its upkeep task.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep.run_upkeep();
        }
    });

    METRICS_ENABLED.store(true, Ordering::Relaxed);
    Ok(handle)
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_metrics_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics

/// Result of a login attempt, as the `status` label of `auth_logins_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    /// Unknown email or wrong password.
    Failure,
    /// Right password, account not active.
    Forbidden,
}

impl LoginOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginOutcome::Success => "success",
            LoginOutcome::Failure => "failure",
            LoginOutcome::Forbidden => "forbidden",
        }
    }
}

pub fn track_login(outcome: LoginOutcome) {
    counter!("auth_logins_total", "status" => outcome.as_str()).increment(1);
}

pub fn track_token_issued(typ: &'static str) {
    counter!("auth_tokens_issued_total", "typ" => typ).increment(1);
}

pub fn track_sample(success: bool) {
    let status = if success { "success" } else { "error" };
    counter!("telemetry_samples_total", "status" => status).increment(1);
}

pub fn set_hub_subscribers(count: usize) {
    gauge!("telemetry_hub_subscribers").set(count as f64);
}

pub fn track_hub_dropped() {
    counter!("telemetry_hub_dropped_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_outcome_labels() {
        assert_eq!(LoginOutcome::Success.as_str(), "success");
        assert_eq!(LoginOutcome::Failure.as_str(), "failure");
        assert_eq!(LoginOutcome::Forbidden.as_str(), "forbidden");
    }

    #[test]
    fn test_track_login_without_recorder() {
        // No recorder installed: recording is a no-op, never a panic.
        track_login(LoginOutcome::Failure);
    }
}
