//! Logging configuration.
//!
//! `RUST_LOG` wins over `LOG_LEVEL` when both are set; the subscriber reads
//! `RUST_LOG` itself, so only `LOG_LEVEL` is captured here.

use crate::env;

pub const MAX_RETENTION_DAYS: usize = 7;

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON lines instead of the compact console format.
    pub json: bool,
    /// Directory for daily rolling files; console only when `None`.
    pub dir: Option<String>,
    pub retention_days: usize,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env::process_env)
    }

    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            level: env::lookup(&get, "LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            json: env::lookup(&get, "LOG_FORMAT")
                .is_some_and(|v| v.eq_ignore_ascii_case("json")),
            dir: env::lookup(&get, "LOG_DIR"),
            retention_days: env::parse_or(&get, "LOG_RETENTION_DAYS", MAX_RETENTION_DAYS)
                .clamp(1, MAX_RETENTION_DAYS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::from_pairs;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_lookup(from_pairs(&[]));
        assert_eq!(config.level, "info");
        assert!(!config.json);
        assert!(config.dir.is_none());
        assert_eq!(config.retention_days, 7);
    }

    #[test]
    fn test_retention_is_clamped() {
        let high = LoggingConfig::from_lookup(from_pairs(&[("LOG_RETENTION_DAYS", "30")]));
        let low = LoggingConfig::from_lookup(from_pairs(&[("LOG_RETENTION_DAYS", "0")]));
        assert_eq!(high.retention_days, 7);
        assert_eq!(low.retention_days, 1);
    }

    #[test]
    fn test_json_format() {
        let config = LoggingConfig::from_lookup(from_pairs(&[
            ("LOG_FORMAT", "JSON"),
            ("LOG_DIR", "/var/log/lectern"),
        ]));
        assert!(config.json);
        assert_eq!(config.dir.as_deref(), Some("/var/log/lectern"));
    }
}
