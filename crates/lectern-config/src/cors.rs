use crate::env;

/// Browser origins allowed by the CORS layer.
///
/// Read from the comma separated `CORS_ORIGINS`. An empty list means the
/// server installs no CORS layer at all.
#[derive(Clone, Debug, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env::process_env)
    }

    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            allowed_origins: env::csv(&get, "CORS_ORIGINS"),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.allowed_origins.is_empty()
    }
}
