//! Application configuration loaded from environment variables.

use std::time::Duration;

use checkout::{DEFAULT_BUDGET, DEFAULT_STORE_LABEL, DEFAULT_SWEEP_INTERVAL, RegistryConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `CHECKOUT_BUDGET_SECS`: time budget of a transaction (default: `40`)
/// - `SWEEP_INTERVAL_SECS`: period of the timeout sweep (default: `10`, minimum `1`)
/// - `STORE_LABEL`: label reported to the validating party (default: `"MyStoreQR"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub budget: Duration,
    pub sweep_interval: Duration,
    pub store_label: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            budget: secs("CHECKOUT_BUDGET_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.budget),
            sweep_interval: secs("SWEEP_INTERVAL_SECS")
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or(defaults.sweep_interval),
            store_label: lookup("STORE_LABEL").unwrap_or(defaults.store_label),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the settings the job registry is built with.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::new(self.budget, self.store_label.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            budget: DEFAULT_BUDGET,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            store_label: DEFAULT_STORE_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.budget, Duration::from_secs(40));
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
        assert_eq!(config.store_label, "MyStoreQR");
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_timing_overrides() {
        let config = from_pairs(&[
            ("CHECKOUT_BUDGET_SECS", "90"),
            ("SWEEP_INTERVAL_SECS", "5"),
            ("STORE_LABEL", "Melons"),
        ]);
        assert_eq!(config.budget, Duration::from_secs(90));
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.registry_config().store_label.as_ref(), "Melons");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[("PORT", "http"), ("CHECKOUT_BUDGET_SECS", "-3")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.budget, Duration::from_secs(40));
    }

    #[test]
    fn test_zero_sweep_interval_is_raised() {
        let config = from_pairs(&[("SWEEP_INTERVAL_SECS", "0")]);
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
    }
}
