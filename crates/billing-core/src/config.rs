//! # Engine Configuration
//!
//! Precision, currency and tolerance settings consumed by the engine.
//!
//! This module only defines the settings and their defaults. Reading them
//! from a file or the environment is the application's job; billing-core
//! never touches either.
//!
//! ## Configuration File Format
//! ```toml
//! [precision]
//! monetary = 2
//! tax_percentage = 2
//! tax_percentage_epsilon = 0.005
//!
//! [currency]
//! code = "EUR"
//! symbol = "€"
//! decimal_separator = ","
//! thousands_separator = "."
//!
//! [validation]
//! expected_total_tolerance = 0.01
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound for both precision settings.
pub const MAX_PRECISION: u32 = 6;

// =============================================================================
// Precision
// =============================================================================

/// Rounding precisions used before amounts and rates are compared or summed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionConfig {
    /// Decimals kept for money amounts.
    #[serde(default = "default_monetary")]
    pub monetary: u32,

    /// Decimals kept for tax percentages when grouping.
    #[serde(default = "default_tax_percentage")]
    pub tax_percentage: u32,

    /// Two rounded rates closer than this belong to the same tax group.
    #[serde(default = "default_tax_percentage_epsilon")]
    pub tax_percentage_epsilon: Decimal,
}

fn default_monetary() -> u32 {
    2
}

fn default_tax_percentage() -> u32 {
    2
}

fn default_tax_percentage_epsilon() -> Decimal {
    Decimal::new(5, 3)
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        PrecisionConfig {
            monetary: default_monetary(),
            tax_percentage: default_tax_percentage(),
            tax_percentage_epsilon: default_tax_percentage_epsilon(),
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// How amounts are rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO 4217 code, informational only.
    #[serde(default = "default_code")]
    pub code: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,

    /// May be empty to disable grouping.
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
}

fn default_code() -> String {
    "USD".to_string()
}

fn default_symbol() -> String {
    "$".to_string()
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

fn default_thousands_separator() -> String {
    ",".to_string()
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            code: default_code(),
            symbol: default_symbol(),
            decimal_separator: default_decimal_separator(),
            thousands_separator: default_thousands_separator(),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Settings for the expected-total check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Largest difference between expected and computed total that is
    /// still considered a match.
    #[serde(default = "default_tolerance")]
    pub expected_total_tolerance: Decimal,
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            expected_total_tolerance: default_tolerance(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
///
/// Every section falls back to its defaults, so a partial file is fine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub precision: PrecisionConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let precision = &self.precision;
        if precision.monetary > MAX_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "monetary precision must be at most {}, got {}",
                MAX_PRECISION, precision.monetary
            )));
        }
        if precision.tax_percentage > MAX_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "tax percentage precision must be at most {}, got {}",
                MAX_PRECISION, precision.tax_percentage
            )));
        }
        if precision.tax_percentage_epsilon < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "tax percentage epsilon must not be negative, got {}",
                precision.tax_percentage_epsilon
            )));
        }

        let currency = &self.currency;
        if currency.decimal_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "decimal separator must not be empty".into(),
            ));
        }
        if currency.decimal_separator == currency.thousands_separator {
            return Err(ConfigError::Invalid(format!(
                "decimal and thousands separators must differ, both are '{}'",
                currency.decimal_separator
            )));
        }

        let tolerance = self.validation.expected_total_tolerance;
        if tolerance < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "expected total tolerance must not be negative, got {}",
                tolerance
            )));
        }

        Ok(())
    }
}
