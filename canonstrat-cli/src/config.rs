//! Operator configuration loaded from `canonstrat.toml`.
//!
//! ```toml
//! [defaults]
//! balance = 50000.0
//! fallback_timezone = "America/New_York"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use canonstrat_core::resolve_timezone;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;

/// File read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "canonstrat.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Account balance used by `evaluate` and `scan` when `--balance` is absent.
    pub balance: f64,
    /// Trader timezone used by `convert-time` when `--tz` is absent.
    pub fallback_timezone: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// EnvFilter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self { defaults: DefaultsConfig::default(), logging: LoggingConfig::default() }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { balance: 50_000.0, fallback_timezone: "America/New_York".into() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".into() }
    }
}

impl CliConfig {
    /// Parse and check a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid config TOML")?;
        config.check()?;
        Ok(config)
    }

    /// Load an explicit config file. The file must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Explicit path if given, else `canonstrat.toml` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn fallback_timezone(&self) -> Result<Tz> {
        Ok(resolve_timezone(&self.defaults.fallback_timezone)?)
    }

    fn check(&self) -> Result<()> {
        self.fallback_timezone().context("defaults.fallback_timezone")?;
        if !(self.defaults.balance.is_finite() && self.defaults.balance >= 0.0) {
            anyhow::bail!("defaults.balance must be a non-negative number");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = CliConfig::from_toml("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.fallback_timezone().unwrap(), Tz::America__New_York);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CliConfig::from_toml("[defaults]\nbalance = 100000.0\n").unwrap();
        assert_eq!(config.defaults.balance, 100_000.0);
        assert_eq!(config.defaults.fallback_timezone, "America/New_York");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn free_form_fallback_timezone() {
        let config =
            CliConfig::from_toml("[defaults]\nfallback_timezone = \"Central Time\"\n").unwrap();
        assert_eq!(config.fallback_timezone().unwrap(), Tz::America__Chicago);
    }

    #[test]
    fn unresolvable_timezone_is_an_error() {
        let err = CliConfig::from_toml("[defaults]\nfallback_timezone = \"Narnia\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("fallback_timezone"));
    }

    #[test]
    fn negative_balance_is_an_error() {
        assert!(CliConfig::from_toml("[defaults]\nbalance = -5.0\n").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CliConfig::from_toml("[defaults]\nbalanse = 1.0\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();
        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = CliConfig::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
