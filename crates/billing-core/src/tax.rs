//! # Tax Calculator
//!
//! Extracts tax from tax-inclusive prices and groups items by rate.
//!
//! ## Inverse VAT Extraction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Price already contains tax, so tax is taken OUT, not added ON:        │
//! │                                                                         │
//! │    rate = tax_rate_percent / 100                                        │
//! │    tax  = line_total × rate / (1 + rate)                                │
//! │                                                                         │
//! │    121.00 at 21%  →  121.00 × 21 / 121     =  21.00                     │
//! │    110.00 at 10%  →  110.00 × 10 / 110     =  10.00                     │
//! │                                                                         │
//! │  Rates of 0 or None never form a group: "no tax" is not a 0% band.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Grouping
//! Rates are rounded to the tax-percentage precision and compared with an
//! epsilon, so `20.999999` and `21` land in the same group.
//!
//! ## Usage
//! ```rust
//! use billing_core::item::LineItem;
//! use billing_core::tax::TaxCalculator;
//! use rust_decimal_macros::dec;
//!
//! let items = vec![
//!     LineItem::new("Book", dec!(109)).with_tax_rate(dec!(9)),
//!     LineItem::new("Laptop", dec!(1210)).with_tax_rate(dec!(21)),
//! ];
//! let calc = TaxCalculator::default();
//!
//! assert_eq!(calc.tax_groups(&items), vec![dec!(21), dec!(9)]);
//! assert_eq!(calc.tax_for_group(&items, dec!(21)), dec!(210));
//! assert_eq!(calc.subtotal_for_group(&items, dec!(9)), dec!(100));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PrecisionConfig;
use crate::item::PricedItem;
use crate::money::round_to;

// =============================================================================
// Tax Group
// =============================================================================

/// Tax and tax-exclusive subtotal for one rate band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxGroup {
    /// Rounded rate in percent.
    pub rate_percent: Decimal,
    /// Tax extracted from the band, rounded to money precision.
    pub tax: Decimal,
    /// Tax-exclusive amount of the band, rounded to money precision.
    pub subtotal: Decimal,
}

// =============================================================================
// Tax Calculator
// =============================================================================

/// Stateless tax functions over a slice of priced items.
///
/// The calculator only carries the precision settings, which are copied in
/// once and never change, so one instance can be shared freely.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaxCalculator {
    precision: PrecisionConfig,
}

impl TaxCalculator {
    pub fn new(precision: PrecisionConfig) -> Self {
        TaxCalculator { precision }
    }

    pub fn precision(&self) -> &PrecisionConfig {
        &self.precision
    }

    /// Rounds an amount to money precision.
    #[inline]
    pub fn round_money(&self, amount: Decimal) -> Decimal {
        round_to(amount, self.precision.monetary)
    }

    /// Rounds a rate to tax-percentage precision, without trailing zeros.
    #[inline]
    pub fn round_rate(&self, rate_percent: Decimal) -> Decimal {
        round_to(rate_percent, self.precision.tax_percentage).normalize()
    }

    /// True when two rates belong to the same group.
    pub fn same_rate(&self, a: Decimal, b: Decimal) -> bool {
        (self.round_rate(a) - self.round_rate(b)).abs() < self.precision.tax_percentage_epsilon
    }

    /// Total tax contained in the items, rounded once at the end.
    ///
    /// Items without a rate, or with a rate of zero or less, add nothing.
    pub fn tax_amount<I: PricedItem>(&self, items: &[I]) -> Decimal {
        let tax: Decimal = items.iter().filter_map(extracted_tax).sum();
        self.round_money(tax)
    }

    /// Distinct positive rates, rounded and sorted from highest to lowest.
    ///
    /// Rates within epsilon of an already collected rate are merged into it.
    pub fn tax_groups<I: PricedItem>(&self, items: &[I]) -> Vec<Decimal> {
        let mut rates: Vec<Decimal> = items
            .iter()
            .filter_map(PricedItem::tax_rate_percent)
            .filter(|rate| *rate > Decimal::ZERO)
            .map(|rate| self.round_rate(rate))
            .collect();
        rates.sort_by(|a, b| b.cmp(a));

        let epsilon = self.precision.tax_percentage_epsilon;
        let mut groups: Vec<Decimal> = Vec::with_capacity(rates.len());
        for rate in rates {
            match groups.last() {
                Some(last) if (*last - rate).abs() < epsilon => {}
                _ => groups.push(rate),
            }
        }
        groups
    }

    /// Tax extracted from the items that fall in `rate_percent`'s group.
    pub fn tax_for_group<I: PricedItem>(&self, items: &[I], rate_percent: Decimal) -> Decimal {
        let tax: Decimal = self
            .group_members(items, rate_percent)
            .filter_map(extracted_tax)
            .sum();
        self.round_money(tax)
    }

    /// Tax-exclusive amount of the items in `rate_percent`'s group.
    pub fn subtotal_for_group<I: PricedItem>(&self, items: &[I], rate_percent: Decimal) -> Decimal {
        let gross: Decimal = self
            .group_members(items, rate_percent)
            .map(PricedItem::line_total)
            .sum();
        self.round_money(gross - self.tax_for_group(items, rate_percent))
    }

    /// One entry per tax group, highest rate first.
    pub fn group_breakdown<I: PricedItem>(&self, items: &[I]) -> Vec<TaxGroup> {
        self.tax_groups(items)
            .into_iter()
            .map(|rate_percent| TaxGroup {
                rate_percent,
                tax: self.tax_for_group(items, rate_percent),
                subtotal: self.subtotal_for_group(items, rate_percent),
            })
            .collect()
    }

    fn group_members<'a, I: PricedItem>(
        &'a self,
        items: &'a [I],
        rate_percent: Decimal,
    ) -> impl Iterator<Item = &'a I> + 'a {
        items.iter().filter(move |item| match item.tax_rate_percent() {
            Some(rate) if rate > Decimal::ZERO => self.same_rate(rate, rate_percent),
            _ => false,
        })
    }
}

/// Tax contained in one item's line total, if it is taxed.
fn extracted_tax<I: PricedItem>(item: &I) -> Option<Decimal> {
    let rate_percent = item.tax_rate_percent().filter(|rate| *rate > Decimal::ZERO)?;
    Some(item.line_total() * rate_percent / (Decimal::ONE_HUNDRED + rate_percent))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{LineItem, UsageItem};
    use rust_decimal_macros::dec;

    fn item(price: Decimal, rate: Option<Decimal>) -> LineItem {
        let item = LineItem::new("Item", price);
        match rate {
            Some(rate) => item.with_tax_rate(rate),
            None => item,
        }
    }

    #[test]
    fn test_tax_amount_mixed_rates() {
        let items = vec![item(dec!(121), Some(dec!(21))), item(dec!(110), Some(dec!(10)))];
        let calc = TaxCalculator::default();
        assert_eq!(calc.tax_amount(&items), dec!(31));
    }

    #[test]
    fn test_tax_amount_respects_quantity() {
        let items = vec![item(dec!(121), Some(dec!(21))).with_quantity(dec!(2))];
        assert_eq!(TaxCalculator::default().tax_amount(&items), dec!(42));
    }

    #[test]
    fn test_untaxed_and_zero_rates_contribute_nothing() {
        let items = vec![item(dec!(50), None), item(dec!(50), Some(dec!(0)))];
        let calc = TaxCalculator::default();
        assert_eq!(calc.tax_amount(&items), Decimal::ZERO);
        assert!(calc.tax_groups(&items).is_empty());
    }

    #[test]
    fn test_empty_items() {
        let items: Vec<LineItem> = Vec::new();
        let calc = TaxCalculator::default();
        assert_eq!(calc.tax_amount(&items), Decimal::ZERO);
        assert!(calc.tax_groups(&items).is_empty());
        assert_eq!(calc.tax_for_group(&items, dec!(21)), Decimal::ZERO);
        assert_eq!(calc.subtotal_for_group(&items, dec!(21)), Decimal::ZERO);
        assert!(calc.group_breakdown(&items).is_empty());
    }

    #[test]
    fn test_tax_groups_sorted_descending_and_deduplicated() {
        let items = vec![
            item(dec!(10), Some(dec!(21))),
            item(dec!(10), Some(dec!(9))),
            item(dec!(10), Some(dec!(21.00))),
            item(dec!(10), None),
        ];
        assert_eq!(TaxCalculator::default().tax_groups(&items), vec![dec!(21), dec!(9)]);
    }

    #[test]
    fn test_tax_groups_merge_rate_noise() {
        let items = vec![
            item(dec!(10), Some(dec!(20.999999))),
            item(dec!(10), Some(dec!(21))),
            item(dec!(10), Some(dec!(21.001))),
        ];
        let calc = TaxCalculator::default();
        assert_eq!(calc.tax_groups(&items), vec![dec!(21)]);

        // All three rows are members of the single group
        let per_group = calc.tax_for_group(&items, dec!(21));
        assert_eq!(per_group, calc.tax_amount(&items));
    }

    #[test]
    fn test_nearby_rates_stay_distinct() {
        let items = vec![item(dec!(10), Some(dec!(5.5))), item(dec!(10), Some(dec!(5.51)))];
        assert_eq!(
            TaxCalculator::default().tax_groups(&items),
            vec![dec!(5.51), dec!(5.5)]
        );
    }

    #[test]
    fn test_negative_rate_never_forms_group() {
        // Validation rejects this, but the calculator must still be total
        let items = vec![item(dec!(10), Some(dec!(-5)))];
        let calc = TaxCalculator::default();
        assert!(calc.tax_groups(&items).is_empty());
        assert_eq!(calc.tax_amount(&items), Decimal::ZERO);
        assert_eq!(calc.tax_for_group(&items, dec!(-5)), Decimal::ZERO);
    }

    #[test]
    fn test_tax_and_subtotal_for_group() {
        let items = vec![
            item(dec!(121), Some(dec!(21))),
            item(dec!(60.5), Some(dec!(21))).with_quantity(dec!(2)),
            item(dec!(110), Some(dec!(10))),
            item(dec!(40), None),
        ];
        let calc = TaxCalculator::default();

        assert_eq!(calc.tax_for_group(&items, dec!(21)), dec!(42));
        assert_eq!(calc.subtotal_for_group(&items, dec!(21)), dec!(200));
        assert_eq!(calc.tax_for_group(&items, dec!(10)), dec!(10));
        assert_eq!(calc.subtotal_for_group(&items, dec!(10)), dec!(100));
        assert_eq!(calc.tax_for_group(&items, dec!(5)), Decimal::ZERO);
    }

    #[test]
    fn test_discount_line_reduces_group_tax() {
        let items = vec![item(dec!(121), Some(dec!(21))), item(dec!(-12.1), Some(dec!(21)))];
        let calc = TaxCalculator::default();
        assert_eq!(calc.tax_for_group(&items, dec!(21)), dec!(18.9));
        assert_eq!(calc.subtotal_for_group(&items, dec!(21)), dec!(90));
    }

    #[test]
    fn test_group_breakdown() {
        let items = vec![item(dec!(121), Some(dec!(21))), item(dec!(109), Some(dec!(9)))];
        let breakdown = TaxCalculator::default().group_breakdown(&items);
        assert_eq!(
            breakdown,
            vec![
                TaxGroup { rate_percent: dec!(21), tax: dec!(21), subtotal: dec!(100) },
                TaxGroup { rate_percent: dec!(9), tax: dec!(9), subtotal: dec!(100) },
            ]
        );
    }

    #[test]
    fn test_works_over_usage_items() {
        let items = vec![UsageItem::new("Storage GB", dec!(10), dec!(1.21)).with_tax_rate(dec!(21))];
        let calc = TaxCalculator::default();
        assert_eq!(calc.tax_amount(&items), dec!(2.1));
        assert_eq!(calc.subtotal_for_group(&items, dec!(21)), dec!(10));
    }

    #[test]
    fn test_extraction_is_exact_at_large_amounts() {
        let items = vec![
            item(dec!(6050000.00), Some(dec!(21))),
            item(dec!(109000000.00), Some(dec!(9))),
        ];
        let calc = TaxCalculator::default();
        assert_eq!(calc.tax_for_group(&items, dec!(21)), dec!(1050000.00));
        assert_eq!(calc.subtotal_for_group(&items, dec!(21)), dec!(5000000.00));
        assert_eq!(calc.tax_for_group(&items, dec!(9)), dec!(9000000.00));
        assert_eq!(calc.tax_amount(&items), dec!(10050000.00));
    }

    #[test]
    fn test_rounded_rates_drop_trailing_zeros() {
        let items = vec![item(dec!(10), Some(dec!(21.000)))];
        let groups = TaxCalculator::default().tax_groups(&items);
        assert_eq!(groups[0].to_string(), "21");
    }

    #[test]
    fn test_coarser_precision_merges_rates() {
        let calc = TaxCalculator::new(PrecisionConfig {
            monetary: 2,
            tax_percentage: 0,
            tax_percentage_epsilon: dec!(0.5),
        });
        let items = vec![item(dec!(10), Some(dec!(20.6))), item(dec!(10), Some(dec!(21.2)))];
        assert_eq!(calc.tax_groups(&items), vec![dec!(21)]);
    }
}
