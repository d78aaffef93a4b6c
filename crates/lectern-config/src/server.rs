use std::time::Duration;

use crate::env;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long in-flight requests may run after shutdown starts.
    pub shutdown_grace_secs: u64,
    /// Serve `/metrics` and record Prometheus counters.
    pub observability_enabled: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env::process_env)
    }

    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let observability_enabled = env::lookup(&get, "OBSERVABILITY_ENABLED")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Self {
            host: env::lookup(&get, "HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env::parse_or(&get, "PORT", 8080),
            shutdown_grace_secs: env::parse_or(&get, "SHUTDOWN_GRACE_SECONDS", 5),
            observability_enabled,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
