//! Scan configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! concurrency = 3
//! inter_file_delay_ms = 500
//!
//! [breaker]
//! max_consecutive_failures = 5
//! min_attempts_for_ratio = 10
//! max_failure_ratio = 0.5
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default worker count
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default pause after each file, per worker
pub const DEFAULT_INTER_FILE_DELAY_MS: u64 = 500;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Maximum files analyzed at once
    pub concurrency: usize,
    /// Pause after each file to stay under analyzer rate limits
    pub inter_file_delay_ms: u64,
    /// Circuit breaker thresholds
    pub breaker: BreakerConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            inter_file_delay_ms: DEFAULT_INTER_FILE_DELAY_MS,
            breaker: BreakerConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Parse and validate TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency",
                reason: "must be at least 1".into(),
            });
        }
        self.breaker.validate()
    }

    /// With worker count
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// With inter-file delay
    #[inline]
    #[must_use]
    pub fn with_inter_file_delay_ms(mut self, ms: u64) -> Self {
        self.inter_file_delay_ms = ms;
        self
    }

    /// With breaker thresholds
    #[inline]
    #[must_use]
    pub fn with_breaker(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Inter-file delay as a duration
    #[inline]
    #[must_use]
    pub fn inter_file_delay(&self) -> Duration {
        Duration::from_millis(self.inter_file_delay_ms)
    }
}

/// Circuit breaker thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakerConfig {
    /// Trip after this many failures in a row
    pub max_consecutive_failures: u32,
    /// Attempts needed before the ratio rule applies
    pub min_attempts_for_ratio: u32,
    /// Trip when failures / attempts exceeds this
    pub max_failure_ratio: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            min_attempts_for_ratio: 10,
            max_failure_ratio: 0.5,
        }
    }
}

impl BreakerConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid {
                field: "breaker.max_consecutive_failures",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.max_failure_ratio > 0.0 && self.max_failure_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "breaker.max_failure_ratio",
                reason: format!("{} is outside (0, 1]", self.max_failure_ratio),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_uses_defaults() {
        assert_eq!(ScanConfig::from_toml_str("").unwrap(), ScanConfig::default());
    }

    #[test]
    fn partial_breaker_table() {
        let config = ScanConfig::from_toml_str(
            "concurrency = 8\n[breaker]\nmax_failure_ratio = 0.25\n",
        )
        .unwrap();

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.inter_file_delay_ms, DEFAULT_INTER_FILE_DELAY_MS);
        assert_eq!(config.breaker.max_failure_ratio, 0.25);
        assert_eq!(config.breaker.max_consecutive_failures, 5);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = ScanConfig::from_toml_str("concurrency = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "concurrency", .. }));
    }

    #[test]
    fn ratio_out_of_range_is_rejected() {
        let err = ScanConfig::from_toml_str("[breaker]\nmax_failure_ratio = 1.5").unwrap_err();
        assert!(err.to_string().contains("max_failure_ratio"));
    }

    #[test]
    fn zero_ratio_is_rejected() {
        assert!(ScanConfig::from_toml_str("[breaker]\nmax_failure_ratio = 0.0").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ScanConfig::from_toml_str("concurency = 2"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        std::fs::write(&path, "inter_file_delay_ms = 0\n").unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.inter_file_delay(), Duration::ZERO);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ScanConfig::load("/nonexistent/sift.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sift.toml"));
    }
}
