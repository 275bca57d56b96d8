use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::types::{Address, Amount};

pub const DEFAULT_MIN_LOAN_AMOUNT: u64 = 10_000;
pub const DEFAULT_SECONDS_PER_DAY: u64 = 86_400;
pub const DEFAULT_ESCROW_INDEX: u64 = 0xe5c0;

/// Ledger policy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Smallest principal an offer may ask for
    pub min_loan_amount: u64,
    /// Length of one loan day in seconds
    pub seconds_per_day: u64,
    /// Account that holds escrowed collateral and currency
    pub escrow: Address,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_loan_amount: DEFAULT_MIN_LOAN_AMOUNT,
            seconds_per_day: DEFAULT_SECONDS_PER_DAY,
            escrow: Address::from_index(DEFAULT_ESCROW_INDEX),
        }
    }
}

impl LedgerConfig {
    /// Load config from a TOML file, or use defaults when no path is given
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let Some(path) = config_path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(
            path = %path.display(),
            min_loan_amount = config.min_loan_amount,
            seconds_per_day = config.seconds_per_day,
            "Ledger configuration loaded"
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LOAN_LEDGER_*` environment overrides on top of `self`
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(raw) = env::var("LOAN_LEDGER_MIN_AMOUNT") {
            self.min_loan_amount = raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfig(format!("Invalid min loan amount: {} ({})", raw, e))
            })?;
        }

        if let Ok(raw) = env::var("LOAN_LEDGER_SECONDS_PER_DAY") {
            self.seconds_per_day = raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfig(format!("Invalid seconds per day: {} ({})", raw, e))
            })?;
        }

        if let Ok(raw) = env::var("LOAN_LEDGER_ESCROW") {
            self.escrow = Address::parse(&raw)?;
        }

        self.validate()?;

        debug!(
            min_loan_amount = self.min_loan_amount,
            seconds_per_day = self.seconds_per_day,
            escrow = %self.escrow,
            "Ledger configuration resolved from environment"
        );
        Ok(self)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn min_loan_amount(&self) -> Amount {
        Amount::from(self.min_loan_amount)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_loan_amount == 0 {
            return Err(ConfigError::InvalidConfig(
                "min_loan_amount must be greater than 0".to_string(),
            ));
        }
        if self.seconds_per_day == 0 {
            return Err(ConfigError::InvalidConfig(
                "seconds_per_day must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize to TOML, e.g. to write out a starter config
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.min_loan_amount, 10_000);
        assert_eq!(config.seconds_per_day, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LedgerConfig::from_toml_str("min_loan_amount = 500\n").unwrap();
        assert_eq!(config.min_loan_amount, 500);
        assert_eq!(config.seconds_per_day, DEFAULT_SECONDS_PER_DAY);
        assert_eq!(config.escrow, Address::from_index(DEFAULT_ESCROW_INDEX));
    }

    #[test]
    fn test_toml_escrow_is_parsed() {
        let config = LedgerConfig::from_toml_str(
            "escrow = \"0x00000000000000000000000000000000000000ff\"\nseconds_per_day = 60\n",
        )
        .unwrap();
        assert_eq!(config.escrow, Address::from_index(255));
        assert_eq!(config.seconds_per_day, 60);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(LedgerConfig::from_toml_str("seconds_per_day = 0\n").is_err());
        assert!(LedgerConfig::from_toml_str("min_loan_amount = 0\n").is_err());
        assert!(LedgerConfig::from_toml_str("escrow = \"0x12\"\n").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LedgerConfig {
            min_loan_amount: 42,
            ..LedgerConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(LedgerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("LOAN_LEDGER_MIN_AMOUNT", "777");
        env::set_var("LOAN_LEDGER_SECONDS_PER_DAY", "10");
        env::remove_var("LOAN_LEDGER_ESCROW");

        let config = LedgerConfig::from_env().expect("Should load with overrides");
        assert_eq!(config.min_loan_amount(), 777);
        assert_eq!(config.seconds_per_day, 10);

        env::set_var("LOAN_LEDGER_SECONDS_PER_DAY", "soon");
        assert!(matches!(
            LedgerConfig::from_env(),
            Err(ConfigError::InvalidConfig(_))
        ));

        env::remove_var("LOAN_LEDGER_MIN_AMOUNT");
        env::remove_var("LOAN_LEDGER_SECONDS_PER_DAY");
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(LedgerConfig::load(None).unwrap(), LedgerConfig::default());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = LedgerConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
