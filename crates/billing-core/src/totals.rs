//! # Document Totals
//!
//! Aggregates priced items into the figures printed on a document.
//!
//! ## Figures and How They Relate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  items_total  = Σ unit_price × quantity        (raw, never rounded)    │
//! │  tax_amount   = Σ extracted tax                (rounded once)          │
//! │  subtotal     = items_total − tax_amount                               │
//! │  total        = forced_total ?? items_total    (reporting override)    │
//! │                                                                         │
//! │  reconciled_subtotal  (in minor units)                                  │
//! │               = money(total) − Σ money(tax_for_group(g))               │
//! │                                                                         │
//! │  Printed document:                                                      │
//! │    Subtotal      reconciled_subtotal  ─┐                                │
//! │    VAT 21%       round(tax 21%)        ├─ adds up to the cent           │
//! │    VAT 9%        round(tax 9%)         │                                │
//! │    Total         round(total)         ◄┘                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding each printed line independently cannot guarantee the sum when
//! several rates are mixed; deriving the subtotal backwards from the
//! rounded total and rounded group taxes does. The subtraction happens on
//! integer minor units, after each figure has been rounded, so a forced
//! total with digits beyond the precision cannot break the sum.
//!
//! ## Forced Totals
//! `total()` reports the forced total when one is set. `items_total()`,
//! `subtotal()` and `tax_amount()` ignore it. Callers that need the
//! accounting identity `subtotal + tax == total` must use `items_total()`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::item::PricedItem;
use crate::money::{CurrencyFormatter, Money};
use crate::tax::TaxCalculator;

// =============================================================================
// Document Totals
// =============================================================================

/// Totals view over a borrowed item slice.
///
/// ## Example
/// ```rust
/// use billing_core::item::LineItem;
/// use billing_core::tax::TaxCalculator;
/// use billing_core::totals::DocumentTotals;
/// use rust_decimal_macros::dec;
///
/// let items = vec![
///     LineItem::new("Hosting", dec!(121)).with_tax_rate(dec!(21)),
///     LineItem::new("Support", dec!(110)).with_tax_rate(dec!(10)),
/// ];
/// let totals = DocumentTotals::new(&items, TaxCalculator::default());
///
/// assert_eq!(totals.items_total(), dec!(231));
/// assert_eq!(totals.tax_amount(), dec!(31));
/// assert_eq!(totals.subtotal(), dec!(200));
/// assert_eq!(totals.reconciled_subtotal(), dec!(200));
/// ```
#[derive(Debug)]
pub struct DocumentTotals<'a, I> {
    items: &'a [I],
    forced_total: Option<Decimal>,
    calculator: TaxCalculator,
}

// Manual impls: the view only borrows items, so `I` needn't be Copy.
impl<I> Clone for DocumentTotals<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for DocumentTotals<'_, I> {}

impl<'a, I: PricedItem> DocumentTotals<'a, I> {
    pub fn new(items: &'a [I], calculator: TaxCalculator) -> Self {
        DocumentTotals {
            items,
            forced_total: None,
            calculator,
        }
    }

    /// Overrides what [`total`](Self::total) reports.
    pub fn with_forced_total(mut self, forced_total: Option<Decimal>) -> Self {
        self.forced_total = forced_total;
        self
    }

    pub fn items(&self) -> &'a [I] {
        self.items
    }

    pub fn forced_total(&self) -> Option<Decimal> {
        self.forced_total
    }

    pub fn calculator(&self) -> &TaxCalculator {
        &self.calculator
    }

    /// Sum of all line totals, computed straight from the item fields.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(PricedItem::line_total).sum()
    }

    pub fn tax_amount(&self) -> Decimal {
        self.calculator.tax_amount(self.items)
    }

    /// Tax-exclusive amount, unrounded.
    pub fn subtotal(&self) -> Decimal {
        self.items_total() - self.tax_amount()
    }

    /// The grand total to report: the forced total if set, else the items total.
    pub fn total(&self) -> Decimal {
        self.forced_total.unwrap_or_else(|| self.items_total())
    }

    pub fn tax_groups(&self) -> Vec<Decimal> {
        self.calculator.tax_groups(self.items)
    }

    pub fn tax_for_group(&self, rate_percent: Decimal) -> Decimal {
        self.calculator.tax_for_group(self.items, rate_percent)
    }

    pub fn subtotal_for_group(&self, rate_percent: Decimal) -> Decimal {
        self.calculator.subtotal_for_group(self.items, rate_percent)
    }

    /// Subtotal derived backwards from the reported total and the rounded
    /// per-group taxes, so the printed figures add up exactly.
    pub fn reconciled_subtotal(&self) -> Decimal {
        self.reconciled_money().to_decimal(self.precision())
    }

    /// Every figure at display precision, in minor units.
    pub fn summary(&self) -> TotalsSummary {
        let money = |amount: Decimal| self.money(amount);

        let tax_groups: Vec<TaxGroupLine> = self
            .calculator
            .group_breakdown(self.items)
            .into_iter()
            .map(|group| TaxGroupLine {
                rate_percent: group.rate_percent,
                tax: money(group.tax),
                subtotal: money(group.subtotal),
            })
            .collect();

        let summary = TotalsSummary {
            items_total: money(self.items_total()),
            subtotal: money(self.subtotal()),
            tax_amount: money(self.tax_amount()),
            total: money(self.total()),
            reconciled_subtotal: self.reconciled_money(),
            tax_groups,
        };

        debug!(
            items = self.items.len(),
            items_total = summary.items_total.minor_units(),
            tax_amount = summary.tax_amount.minor_units(),
            total = summary.total.minor_units(),
            reconciled_subtotal = summary.reconciled_subtotal.minor_units(),
            groups = summary.tax_groups.len(),
            forced = self.forced_total.is_some(),
            "Computed document totals"
        );

        summary
    }

    fn precision(&self) -> u32 {
        self.calculator.precision().monetary
    }

    fn money(&self, amount: Decimal) -> Money {
        Money::from_decimal(amount, self.precision())
    }

    fn reconciled_money(&self) -> Money {
        let group_tax: Money = self
            .tax_groups()
            .into_iter()
            .map(|rate| self.money(self.tax_for_group(rate)))
            .sum();
        self.money(self.total()) - group_tax
    }
}

// =============================================================================
// Summary Types
// =============================================================================

/// One printed tax line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxGroupLine {
    #[ts(type = "string")]
    pub rate_percent: Decimal,
    pub tax: Money,
    pub subtotal: Money,
}

/// All produced figures, rounded to the monetary precision.
///
/// `reconciled_subtotal + Σ tax_groups[i].tax == total` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TotalsSummary {
    pub items_total: Money,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total: Money,
    pub reconciled_subtotal: Money,
    pub tax_groups: Vec<TaxGroupLine>,
}

impl TotalsSummary {
    /// Sum of the printed tax lines.
    pub fn group_tax_total(&self) -> Money {
        self.tax_groups.iter().map(|group| group.tax).sum()
    }

    /// Renders every figure with the given formatter.
    pub fn display(&self, formatter: &CurrencyFormatter) -> DisplayTotals {
        DisplayTotals {
            items_total: formatter.format_money(self.items_total),
            subtotal: formatter.format_money(self.reconciled_subtotal),
            tax_amount: formatter.format_money(self.tax_amount),
            total: formatter.format_money(self.total),
            tax_groups: self
                .tax_groups
                .iter()
                .map(|group| DisplayTaxGroup {
                    rate_percent: group.rate_percent,
                    tax: formatter.format_money(group.tax),
                })
                .collect(),
        }
    }
}

/// A printed tax line as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DisplayTaxGroup {
    #[ts(type = "string")]
    pub rate_percent: Decimal,
    pub tax: String,
}

/// The strings handed to the rendering surface.
///
/// `subtotal` is the reconciled subtotal, the one meant to be printed
/// beside the tax lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DisplayTotals {
    pub items_total: String,
    pub subtotal: String,
    pub tax_amount: String,
    pub total: String,
    pub tax_groups: Vec<DisplayTaxGroup>,
}

// =============================================================================
// Unit Tests
// =============================================================================
