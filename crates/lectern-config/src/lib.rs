//! # Lectern Config
//!
//! Configuration types for the Lectern API, loaded from environment variables:
//!
//! - [`jwt`]: token signing secret, issuer and lifetimes
//! - [`cors`]: allowed browser origins
//! - [`metrics`]: telemetry sampling interval, disk path and queue sizes
//! - [`server`]: bind address and shutdown grace period
//! - [`logging`]: log level, format and rolling file output
//!
//! Every struct exposes `from_env()`. The ones that can fail return
//! [`ConfigError`], which the server binary treats as fatal.
//!
//! # Example
//!
//! ```ignore
//! use lectern_config::{JwtConfig, MetricsConfig};
//!
//! let jwt = JwtConfig::from_env()?;
//! let metrics = MetricsConfig::from_env();
//! ```

pub mod cors;
pub mod error;
pub mod jwt;
pub mod logging;
pub mod metrics;
pub mod server;

mod env;

pub use cors::CorsConfig;
pub use error::ConfigError;
pub use jwt::JwtConfig;
pub use logging::LoggingConfig;
pub use metrics::MetricsConfig;
pub use server::ServerConfig;

/// Reads `DATABASE_URL`.
pub fn database_url() -> Result<String, ConfigError> {
    env::required(&env::process_env, "DATABASE_URL")
}
