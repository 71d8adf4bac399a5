//! # Billable Items
//!
//! The priced rows that make up a billing document.
//!
//! ## Item Kinds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PricedItem capability                           │
//! │        title · quantity · unit_price · tax_rate_percent                 │
//! │                                                                         │
//! │  ┌─────────────────────┐            ┌─────────────────────┐            │
//! │  │      LineItem       │            │      UsageItem      │            │
//! │  │  ─────────────────  │            │  ─────────────────  │            │
//! │  │  title              │            │  title              │            │
//! │  │  description        │            │  quantity (usage)   │            │
//! │  │  quantity           │            │  unit_price         │            │
//! │  │  unit_price         │            │  tax_rate_percent   │            │
//! │  │  tax_rate_percent   │            └─────────────────────┘            │
//! │  └─────────────────────┘                  (usage receipts)             │
//! │        (invoices)                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pricing Conventions
//! - Unit prices are **tax-inclusive**: tax is extracted, never added
//! - A negative unit price is a discount line
//! - `tax_rate_percent == None` means the row is not taxed at all
//! - Quantities, prices and rates are [`Decimal`], so `0.1 × 3` is `0.3`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ItemValidationError;

/// Largest accepted |unit_price × quantity|, in major units.
pub const MAX_LINE_AMOUNT: i64 = 1_000_000_000_000;

// =============================================================================
// Priced Item Capability
// =============================================================================

/// Anything the tax and totals engine can price.
///
/// Implemented by both [`LineItem`] and [`UsageItem`] so the reconciliation
/// logic exists exactly once.
pub trait PricedItem {
    fn title(&self) -> &str;

    fn quantity(&self) -> Decimal;

    /// Tax-inclusive price of one unit.
    fn unit_price(&self) -> Decimal;

    /// Tax rate in percent (21 = 21%), or `None` when untaxed.
    fn tax_rate_percent(&self) -> Option<Decimal>;

    /// Tax-inclusive line total: `unit_price × quantity`.
    ///
    /// Exact for every item that passed [`validate`](Self::validate).
    fn line_total(&self) -> Decimal {
        self.unit_price() * self.quantity()
    }

    /// Checks the item's fields in a fixed order; the first failure wins.
    ///
    /// ## Rules
    /// 1. Title must not be blank
    /// 2. Quantity must be greater than zero
    /// 3. `unit_price × quantity` must stay within ±[`MAX_LINE_AMOUNT`]
    ///    (any sign)
    /// 4. Tax rate, when present, must lie in [0, 100]
    fn validate(&self) -> Result<(), ItemValidationError> {
        if self.title().trim().is_empty() {
            return Err(ItemValidationError::EmptyTitle);
        }

        let quantity = self.quantity();
        if quantity <= Decimal::ZERO {
            return Err(ItemValidationError::NonPositiveQuantity { quantity });
        }

        let unit_price = self.unit_price();
        match unit_price.checked_mul(quantity) {
            Some(line_total) if line_total.abs() <= Decimal::from(MAX_LINE_AMOUNT) => {}
            _ => return Err(ItemValidationError::InvalidUnitPrice { unit_price }),
        }

        if let Some(rate_percent) = self.tax_rate_percent() {
            if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&rate_percent) {
                return Err(ItemValidationError::TaxRateOutOfRange { rate_percent });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One billable row on an invoice.
///
/// ## Example
/// ```rust
/// use billing_core::item::{LineItem, PricedItem};
/// use rust_decimal_macros::dec;
///
/// let item = LineItem::new("Consulting", dec!(121.00))
///     .with_quantity(dec!(2))
///     .with_tax_rate(dec!(21))
///     .with_description("March, on site");
///
/// assert_eq!(item.line_total(), dec!(242.00));
/// assert!(item.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_quantity")]
    #[ts(type = "string")]
    pub quantity: Decimal,

    /// Tax-inclusive unit price. Negative for discounts.
    #[serde(default)]
    #[ts(type = "string")]
    pub unit_price: Decimal,

    #[serde(default)]
    #[ts(type = "string | null")]
    pub tax_rate_percent: Option<Decimal>,
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

impl LineItem {
    /// Creates an untaxed item with quantity 1.
    pub fn new(title: impl Into<String>, unit_price: Decimal) -> Self {
        LineItem {
            title: title.into(),
            description: None,
            quantity: default_quantity(),
            unit_price,
            tax_rate_percent: None,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_tax_rate(mut self, rate_percent: Decimal) -> Self {
        self.tax_rate_percent = Some(rate_percent);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true for discount lines.
    pub fn is_discount(&self) -> bool {
        self.unit_price < Decimal::ZERO
    }
}

impl PricedItem for LineItem {
    fn title(&self) -> &str {
        &self.title
    }

    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn tax_rate_percent(&self) -> Option<Decimal> {
        self.tax_rate_percent
    }
}

// =============================================================================
// Usage Item
// =============================================================================

/// A metered row on a usage receipt, e.g. "API calls × 1,200".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UsageItem {
    pub title: String,

    /// Units consumed.
    #[ts(type = "string")]
    pub quantity: Decimal,

    /// Tax-inclusive price per unit.
    #[ts(type = "string")]
    pub unit_price: Decimal,

    #[serde(default)]
    #[ts(type = "string | null")]
    pub tax_rate_percent: Option<Decimal>,
}

impl UsageItem {
    pub fn new(title: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        UsageItem {
            title: title.into(),
            quantity,
            unit_price,
            tax_rate_percent: None,
        }
    }

    pub fn with_tax_rate(mut self, rate_percent: Decimal) -> Self {
        self.tax_rate_percent = Some(rate_percent);
        self
    }
}

impl PricedItem for UsageItem {
    fn title(&self) -> &str {
        &self.title
    }

    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn tax_rate_percent(&self) -> Option<Decimal> {
        self.tax_rate_percent
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
