//! # Money Module
//!
//! Rounding, minor-unit amounts and display formatting.
//!
//! ## Why Decimal, Never Float
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Prices arrive as decimals and tax is extracted with a division:       │
//! │    f64:  121.00 × 0.21 / 1.21 = 20.999999999999996                     │
//! │    f64:  1.005 × 100          = 100.49999999999999                     │
//! │                                                                         │
//! │  Any "close enough to one half" guard has to pick a slack, and at      │
//! │  invoice scale (millions) the slack swallows real digits.              │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 arithmetic end to end                           │
//! │    Decimal                 prices, rates, tax: exact, no guards        │
//! │    round_to(x, precision)  half away from zero, the only rounding      │
//! │    Money(i64)              display figures in minor units, so sums     │
//! │                            of displayed lines are exact integers       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billing_core::money::{round_to, CurrencyFormatter, Money};
//! use billing_core::config::CurrencyConfig;
//! use rust_decimal_macros::dec;
//!
//! assert_eq!(round_to(dec!(1.005), 2), dec!(1.01));
//!
//! let total = Money::from_decimal(dec!(1234.5), 2);
//! assert_eq!(total.minor_units(), 123450);
//!
//! let formatter = CurrencyFormatter::new(&CurrencyConfig::default(), 2);
//! assert_eq!(formatter.format_money(total), "$ 1,234.50");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::config::{CurrencyConfig, EngineConfig, MAX_PRECISION};

// =============================================================================
// Rounding
// =============================================================================

/// Rounds `value` to `precision` decimals, half away from zero.
///
/// ## Example
/// ```rust
/// use billing_core::money::round_to;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_to(dec!(2.345), 2), dec!(2.35));
/// assert_eq!(round_to(dec!(-2.345), 2), dec!(-2.35));
/// assert_eq!(round_to(dec!(6000000.00), 2), dec!(6000000));
/// ```
#[inline]
pub fn round_to(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units at the configured monetary precision
/// (cents when the precision is 2).
///
/// ## Design Decisions
/// - **i64 (signed)**: Discount lines and forced totals may be negative
/// - **No scale field**: The precision is an engine-wide setting, passed
///   explicitly wherever a conversion happens
/// - **Integer sums**: The reconciled subtotal plus the displayed tax
///   lines add up to the displayed total with `==`, not with a tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor_units(minor: i64) -> Self {
        Money(minor)
    }

    /// Rounds a decimal amount to `precision` and converts it to minor units.
    ///
    /// Precisions above [`MAX_PRECISION`] are capped; amounts beyond the
    /// i64 range saturate.
    ///
    /// ## Example
    /// ```rust
    /// use billing_core::money::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(Money::from_decimal(dec!(10.995), 2).minor_units(), 1100);
    /// assert_eq!(Money::from_decimal(dec!(-5.5), 2).minor_units(), -550);
    /// assert_eq!(Money::from_decimal(dec!(22000000), 2).minor_units(), 2_200_000_000);
    /// ```
    pub fn from_decimal(amount: Decimal, precision: u32) -> Self {
        let precision = precision.min(MAX_PRECISION);
        let mut rounded = round_to(amount, precision);
        rounded.rescale(precision);

        let minor = rounded.mantissa();
        Money(i64::try_from(minor).unwrap_or(if minor < 0 { i64::MIN } else { i64::MAX }))
    }

    /// Converts back to a decimal amount.
    pub fn to_decimal(&self, precision: u32) -> Decimal {
        Decimal::new(self.0, precision.min(MAX_PRECISION))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Currency Formatter
// =============================================================================

/// Renders amounts as `"{symbol} {amount}"` with the configured separators.
///
/// ## Example
/// ```rust
/// use billing_core::config::CurrencyConfig;
/// use billing_core::money::CurrencyFormatter;
/// use rust_decimal_macros::dec;
///
/// let euro = CurrencyConfig {
///     code: "EUR".into(),
///     symbol: "€".into(),
///     decimal_separator: ",".into(),
///     thousands_separator: ".".into(),
/// };
/// let formatter = CurrencyFormatter::new(&euro, 2);
/// assert_eq!(formatter.format(dec!(1234567.891)), "€ 1.234.567,89");
/// assert_eq!(formatter.format(dec!(-0.5)), "€ -0,50");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyFormatter {
    symbol: String,
    decimal_separator: String,
    thousands_separator: String,
    precision: u32,
}

impl CurrencyFormatter {
    /// Precisions above [`MAX_PRECISION`] are capped to it.
    pub fn new(currency: &CurrencyConfig, precision: u32) -> Self {
        CurrencyFormatter {
            symbol: currency.symbol.clone(),
            decimal_separator: currency.decimal_separator.clone(),
            thousands_separator: currency.thousands_separator.clone(),
            precision: precision.min(MAX_PRECISION),
        }
    }

    /// Builds a formatter from the currency section and monetary precision.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.currency, config.precision.monetary)
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Formats a decimal amount, rounding it to the monetary precision.
    pub fn format(&self, amount: Decimal) -> String {
        self.format_money(Money::from_decimal(amount, self.precision))
    }

    /// Formats an amount already in minor units.
    pub fn format_money(&self, money: Money) -> String {
        let factor = 10u64.pow(self.precision);
        let minor = money.minor_units().unsigned_abs();
        let major = minor / factor;
        let fraction = minor % factor;

        let mut number = String::new();
        if money.is_negative() {
            number.push('-');
        }
        number.push_str(&self.group_thousands(major));
        if self.precision > 0 {
            number.push_str(&self.decimal_separator);
            number.push_str(&format!(
                "{:0width$}",
                fraction,
                width = self.precision as usize
            ));
        }

        format!("{} {}", self.symbol, number)
    }

    fn group_thousands(&self, major: u64) -> String {
        let digits: Vec<char> = major.to_string().chars().collect();
        digits
            .rchunks(3)
            .rev()
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(&self.thousands_separator)
    }
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
