//! # CLI Configuration
//!
//! Loads the [`EngineConfig`] the engine runs with.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BILLING_MONETARY_PRECISION=0                                       │
//! │     BILLING_CURRENCY_SYMBOL=¥                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/billing/billing.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tally.billing/billing.toml (mac) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     2 decimals, "$", ".", ",", one cent tolerance                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Environment values that fail to parse are logged and skipped, so a typo
//! in one variable never discards the rest of the configuration.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use billing_core::EngineConfig;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "billing.toml";

// Environment variable names
pub const ENV_MONETARY_PRECISION: &str = "BILLING_MONETARY_PRECISION";
pub const ENV_TAX_PRECISION: &str = "BILLING_TAX_PRECISION";
pub const ENV_TAX_EPSILON: &str = "BILLING_TAX_EPSILON";
pub const ENV_CURRENCY_SYMBOL: &str = "BILLING_CURRENCY_SYMBOL";
pub const ENV_CURRENCY_CODE: &str = "BILLING_CURRENCY_CODE";
pub const ENV_DECIMAL_SEPARATOR: &str = "BILLING_DECIMAL_SEPARATOR";
pub const ENV_THOUSANDS_SEPARATOR: &str = "BILLING_THOUSANDS_SEPARATOR";
pub const ENV_TOTAL_TOLERANCE: &str = "BILLING_TOTAL_TOLERANCE";

// =============================================================================
// Loading
// =============================================================================

/// Loads configuration from file, environment, and defaults.
///
/// ## Load Order (later overrides earlier)
/// 1. Default values
/// 2. Config file (explicit path, else the platform `billing.toml`)
/// 3. Environment variables
///
/// An explicit path must exist; a missing platform file just means
/// defaults.
pub fn load(config_path: Option<PathBuf>) -> CliResult<EngineConfig> {
    let mut config = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::ConfigNotFound(path));
            }
            read_file(&path)?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => read_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                EngineConfig::default()
            }
            None => EngineConfig::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config.validate()?;

    Ok(config)
}

/// Writes `config` as TOML and returns the path written.
pub fn save(config: &EngineConfig, config_path: Option<PathBuf>) -> CliResult<PathBuf> {
    let path = config_path
        .or_else(default_config_path)
        .ok_or(CliError::NoConfigDir)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;

    info!(?path, "Billing config saved");
    Ok(path)
}

/// Returns the default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "tally", "billing")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn read_file(path: &Path) -> CliResult<EngineConfig> {
    info!(?path, "Loading billing config from file");
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

// =============================================================================
// Environment Overrides
// =============================================================================

/// Applies `BILLING_*` overrides read through `lookup`.
///
/// `load` passes `std::env::var`; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut EngineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = parse_override(&lookup, ENV_MONETARY_PRECISION) {
        config.precision.monetary = value;
    }
    if let Some(value) = parse_override(&lookup, ENV_TAX_PRECISION) {
        config.precision.tax_percentage = value;
    }
    if let Some(value) = parse_override(&lookup, ENV_TAX_EPSILON) {
        config.precision.tax_percentage_epsilon = value;
    }
    if let Some(value) = parse_override(&lookup, ENV_CURRENCY_SYMBOL) {
        config.currency.symbol = value;
    }
    if let Some(value) = parse_override(&lookup, ENV_CURRENCY_CODE) {
        config.currency.code = value;
    }
    if let Some(value) = parse_override(&lookup, ENV_DECIMAL_SEPARATOR) {
        config.currency.decimal_separator = value;
    }
    if let Some(value) = parse_override(&lookup, ENV_THOUSANDS_SEPARATOR) {
        config.currency.thousands_separator = value;
    }
    if let Some(value) = parse_override(&lookup, ENV_TOTAL_TOLERANCE) {
        config.validation.expected_total_tolerance = value;
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key)?;
    match raw.parse::<T>() {
        Ok(value) => {
            debug!(key, value = %raw, "Overriding billing config from environment");
            Some(value)
        }
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring invalid environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::Decimal;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = EngineConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_MONETARY_PRECISION, "0"),
                (ENV_TAX_PRECISION, "1"),
                (ENV_TAX_EPSILON, "0.05"),
                (ENV_CURRENCY_SYMBOL, "¥"),
                (ENV_CURRENCY_CODE, "JPY"),
                (ENV_TOTAL_TOLERANCE, "1"),
            ]),
        );

        assert_eq!(config.precision.monetary, 0);
        assert_eq!(config.precision.tax_percentage, 1);
        assert_eq!(config.precision.tax_percentage_epsilon, Decimal::new(5, 2));
        assert_eq!(config.currency.symbol, "¥");
        assert_eq!(config.currency.code, "JPY");
        assert_eq!(config.validation.expected_total_tolerance, Decimal::ONE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = EngineConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_MONETARY_PRECISION, "two"),
                (ENV_TOTAL_TOLERANCE, "a cent"),
                (ENV_CURRENCY_SYMBOL, "€"),
            ]),
        );

        assert_eq!(config.precision.monetary, 2);
        assert_eq!(config.validation.expected_total_tolerance, Decimal::new(1, 2));
        assert_eq!(config.currency.symbol, "€");
    }

    #[test]
    fn test_separators_from_env() {
        let mut config = EngineConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[(ENV_DECIMAL_SEPARATOR, ","), (ENV_THOUSANDS_SEPARATOR, ".")]),
        );
        assert_eq!(config.currency.decimal_separator, ",");
        assert_eq!(config.currency.thousands_separator, ".");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[currency]\nsymbol = \"€\"\ndecimal_separator = \",\"\nthousands_separator = \".\"\n",
        )
        .unwrap();

        let config = load(Some(path)).unwrap();
        assert_eq!(config.currency.symbol, "€");
        assert_eq!(config.currency.decimal_separator, ",");
        assert_eq!(config.precision.monetary, 2);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(Some(dir.path().join("missing.toml")));
        assert!(matches!(result, Err(CliError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[precision]\nmonetary = 9\n").unwrap();

        assert!(matches!(load(Some(path)), Err(CliError::Billing(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = EngineConfig::default();
        config.currency.code = "EUR".to_string();
        config.currency.symbol = "€".to_string();
        config.validation.expected_total_tolerance = Decimal::new(5, 2);

        let written = save(&config, Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[precision]"));
        assert!(contents.contains("[currency]"));
        let loaded = load(Some(path)).unwrap();
        assert_eq!(loaded.currency.code, "EUR");
        assert_eq!(loaded.validation.expected_total_tolerance, Decimal::new(5, 2));
    }
}
