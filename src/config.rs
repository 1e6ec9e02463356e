//! Configuration types.

use std::time::Duration;

use crate::lookup::viacep::DEFAULT_BASE_URL;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the REST surface binds to.
    pub port: u16,
    /// Base URL of the postal-code service.
    pub viacep_base_url: String,
    /// Upper bound on a single postal-code lookup. A slow or unreachable
    /// service must not hang the Infrastructure step.
    pub lookup_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            viacep_base_url: DEFAULT_BASE_URL.to_string(),
            lookup_timeout: Duration::from_secs(4),
        }
    }
}

impl AppConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port: u16 = std::env::var("PRICING_ASSIST_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let viacep_base_url = std::env::var("PRICING_ASSIST_VIACEP_URL")
            .unwrap_or(defaults.viacep_base_url);

        let lookup_timeout_secs: u64 = std::env::var("PRICING_ASSIST_LOOKUP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.lookup_timeout.as_secs());

        Self {
            port,
            viacep_base_url,
            lookup_timeout: Duration::from_secs(lookup_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.viacep_base_url, "https://viacep.com.br");
        assert_eq!(config.lookup_timeout, Duration::from_secs(4));
    }
}
