//! # Billing Documents
//!
//! Invoices and usage receipts: an owned item list plus the reporting
//! overrides that sit on top of it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DocumentBuilder ──► build() ──► Document (immutable)                   │
//! │   .buyer(..)          │            │                                    │
//! │   .item(..)           │            ├── totals()      figures           │
//! │   .forced_total(..)   │            ├── check_expected_total()          │
//! │   .expected_total(..) │            └── render()      display strings    │
//! │                       │                                                 │
//! │                       └── DocumentValidationError                       │
//! │                           MissingBuyer │ NoItems │ item N: ...          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Document` can only come out of a successful `build()`, and it exposes
//! no way to change its items, so anything holding one holds a valid,
//! frozen document.
//!
//! ## Example
//! ```rust
//! use billing_core::document::{Invoice, PartyRef};
//! use billing_core::item::LineItem;
//! use billing_core::tax::TaxCalculator;
//! use rust_decimal_macros::dec;
//!
//! let invoice = Invoice::builder()
//!     .id("INV-2024-0001")
//!     .buyer(PartyRef::new("Acme Corp"))
//!     .item(LineItem::new("Hosting", dec!(121.00)).with_tax_rate(dec!(21)))
//!     .build()
//!     .unwrap();
//!
//! let totals = invoice.totals(TaxCalculator::default());
//! assert_eq!(totals.total(), dec!(121));
//! assert_eq!(totals.subtotal(), dec!(100));
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{BillingResult, DocumentValidationError, TotalMismatch};
use crate::item::{LineItem, PricedItem, UsageItem};
use crate::money::CurrencyFormatter;
use crate::tax::TaxCalculator;
use crate::totals::{DisplayTotals, DocumentTotals, TotalsSummary};
use crate::validation::{
    validate_document, DocumentContext, ExpectedTotal, ExpectedTotalValidator, MismatchSink,
    ValidationResult,
};

// =============================================================================
// Document Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    UsageReceipt,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Invoice => write!(f, "invoice"),
            DocumentKind::UsageReceipt => write!(f, "usage receipt"),
        }
    }
}

/// Ties an item type to the kind of document it appears on.
pub trait DocumentItem: PricedItem {
    const KIND: DocumentKind;
}

impl DocumentItem for LineItem {
    const KIND: DocumentKind = DocumentKind::Invoice;
}

impl DocumentItem for UsageItem {
    const KIND: DocumentKind = DocumentKind::UsageReceipt;
}

// =============================================================================
// Party Reference
// =============================================================================

/// A buyer or seller as far as the engine cares: a name and an optional
/// external reference (customer number, VAT id, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRef {
    pub name: String,

    #[serde(default)]
    pub reference: Option<String>,
}

impl PartyRef {
    pub fn new(name: impl Into<String>) -> Self {
        PartyRef {
            name: name.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// =============================================================================
// Document
// =============================================================================

/// A validated billing document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document<I> {
    id: String,
    kind: DocumentKind,
    issued_on: Option<NaiveDate>,
    buyer: PartyRef,
    seller: Option<PartyRef>,
    items: Vec<I>,
    forced_total: Option<Decimal>,
    expected_total: Option<ExpectedTotal>,
}

pub type Invoice = Document<LineItem>;
pub type UsageReceipt = Document<UsageItem>;

impl<I: DocumentItem> Document<I> {
    /// Starts a document of this item's kind, e.g. `Invoice::builder()`.
    pub fn builder() -> DocumentBuilder<I> {
        DocumentBuilder::new()
    }

    /// Opaque identifier, e.g. the serial number printed on the document.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn issued_on(&self) -> Option<NaiveDate> {
        self.issued_on
    }

    pub fn buyer(&self) -> &PartyRef {
        &self.buyer
    }

    pub fn seller(&self) -> Option<&PartyRef> {
        self.seller.as_ref()
    }

    /// Items in display order.
    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn forced_total(&self) -> Option<Decimal> {
        self.forced_total
    }

    pub fn expected_total(&self) -> Option<&ExpectedTotal> {
        self.expected_total.as_ref()
    }

    /// Totals view honoring the forced total.
    pub fn totals(&self, calculator: TaxCalculator) -> DocumentTotals<'_, I> {
        DocumentTotals::new(&self.items, calculator).with_forced_total(self.forced_total)
    }

    pub fn summary(&self, calculator: TaxCalculator) -> TotalsSummary {
        self.totals(calculator).summary()
    }

    pub fn context(&self) -> DocumentContext<'_> {
        DocumentContext {
            document_id: &self.id,
            issued_on: self.issued_on,
        }
    }

    /// Compares the expected total, if any, with the reported total.
    pub fn check_expected_total(
        &self,
        calculator: TaxCalculator,
        validator: &ExpectedTotalValidator,
        sink: &dyn MismatchSink,
    ) -> Result<(), TotalMismatch> {
        let actual = self.totals(calculator).total();
        validator.check(self.expected_total.as_ref(), actual, self.context(), sink)
    }

    /// Runs the expected-total check and produces the display figures.
    ///
    /// This is the hand-off to the rendering surface: a rejected config or
    /// a strict mismatch stops here, a soft mismatch has already been logged.
    pub fn render(&self, config: &EngineConfig, sink: &dyn MismatchSink) -> BillingResult<DisplayTotals> {
        config.validate()?;

        let calculator = TaxCalculator::new(config.precision);
        let validator = ExpectedTotalValidator::from_config(&config.validation);

        self.check_expected_total(calculator, &validator, sink)?;

        let formatter = CurrencyFormatter::from_config(config);
        Ok(self.summary(calculator).display(&formatter))
    }
}

// =============================================================================
// Document Builder
// =============================================================================

/// Collects document parts and validates them on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct DocumentBuilder<I> {
    id: Option<String>,
    issued_on: Option<NaiveDate>,
    buyer: Option<PartyRef>,
    seller: Option<PartyRef>,
    items: Vec<I>,
    forced_total: Option<Decimal>,
    expected_total: Option<ExpectedTotal>,
}

impl<I> Default for DocumentBuilder<I> {
    fn default() -> Self {
        DocumentBuilder {
            id: None,
            issued_on: None,
            buyer: None,
            seller: None,
            items: Vec::new(),
            forced_total: None,
            expected_total: None,
        }
    }
}

impl<I: DocumentItem> DocumentBuilder<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identifier. A UUID is generated when none is given.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn issued_on(mut self, date: NaiveDate) -> Self {
        self.issued_on = Some(date);
        self
    }

    pub fn buyer(mut self, buyer: PartyRef) -> Self {
        self.buyer = Some(buyer);
        self
    }

    pub fn seller(mut self, seller: PartyRef) -> Self {
        self.seller = Some(seller);
        self
    }

    pub fn item(mut self, item: I) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = I>) -> Self {
        self.items.extend(items);
        self
    }

    /// Overrides the reported grand total.
    pub fn forced_total(mut self, total: Decimal) -> Self {
        self.forced_total = Some(total);
        self
    }

    pub fn expected_total(mut self, expected: ExpectedTotal) -> Self {
        self.expected_total = Some(expected);
        self
    }

    /// Validates the parts and freezes them into a [`Document`].
    pub fn build(self) -> ValidationResult<Document<I>> {
        validate_document(self.buyer.as_ref(), &self.items)?;
        let buyer = self.buyer.ok_or(DocumentValidationError::MissingBuyer)?;

        Ok(Document {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            kind: I::KIND,
            issued_on: self.issued_on,
            buyer,
            seller: self.seller,
            items: self.items,
            forced_total: self.forced_total,
            expected_total: self.expected_total,
        })
    }
}

// =============================================================================
// Document Input
// =============================================================================

/// Statically typed ingestion record for a document.
///
/// Every field maps to exactly one builder call; unknown fields are
/// rejected rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentInput<I> {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub issued_on: Option<NaiveDate>,

    #[serde(default)]
    pub buyer: Option<PartyRef>,

    #[serde(default)]
    pub seller: Option<PartyRef>,

    pub items: Vec<I>,

    #[serde(default)]
    pub forced_total: Option<Decimal>,

    #[serde(default)]
    pub expected_total: Option<ExpectedTotal>,
}

impl<I: DocumentItem> DocumentInput<I> {
    pub fn into_builder(self) -> DocumentBuilder<I> {
        DocumentBuilder {
            id: self.id,
            issued_on: self.issued_on,
            buyer: self.buyer,
            seller: self.seller,
            items: self.items,
            forced_total: self.forced_total,
            expected_total: self.expected_total,
        }
    }

    pub fn build(self) -> ValidationResult<Document<I>> {
        self.into_builder().build()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BillingError, ItemValidationError};
    use crate::config::PrecisionConfig;
    use crate::validation::RecordingSink;
    use rust_decimal_macros::dec;

    fn invoice_with(items: Vec<LineItem>) -> DocumentBuilder<LineItem> {
        Invoice::builder()
            .id("INV-1")
            .buyer(PartyRef::new("Acme Corp"))
            .items(items)
    }

    #[test]
    fn test_build_requires_buyer() {
        let result = Invoice::builder()
            .item(LineItem::new("Widget", dec!(1)))
            .build();
        assert_eq!(result.unwrap_err(), DocumentValidationError::MissingBuyer);
    }

    #[test]
    fn test_build_requires_items() {
        let result = invoice_with(Vec::new()).build();
        assert_eq!(result.unwrap_err(), DocumentValidationError::NoItems);
    }

    #[test]
    fn test_build_reports_first_bad_item() {
        let result = invoice_with(vec![
            LineItem::new("Widget", dec!(1)),
            LineItem::new("Gadget", dec!(1)).with_tax_rate(dec!(120)),
            LineItem::new("", dec!(1)),
        ])
        .build();

        let err = result.unwrap_err();
        assert_eq!(
            err,
            DocumentValidationError::Item {
                index: 1,
                source: ItemValidationError::TaxRateOutOfRange { rate_percent: dec!(120) },
            }
        );
        assert!(err.to_string().starts_with("item 1: "));
    }

    #[test]
    fn test_build_generates_id() {
        let invoice = Invoice::builder()
            .buyer(PartyRef::new("Acme Corp"))
            .item(LineItem::new("Widget", dec!(1)))
            .build()
            .unwrap();
        assert!(Uuid::parse_str(invoice.id()).is_ok());
        assert_eq!(invoice.kind(), DocumentKind::Invoice);
    }

    #[test]
    fn test_usage_receipt_kind() {
        let receipt = UsageReceipt::builder()
            .id("R-9")
            .buyer(PartyRef::new("Tenant 42").with_reference("cus_42"))
            .item(UsageItem::new("API calls", dec!(1200), dec!(0.01)))
            .build()
            .unwrap();
        assert_eq!(receipt.kind(), DocumentKind::UsageReceipt);
        assert_eq!(receipt.buyer().reference.as_deref(), Some("cus_42"));
        assert_eq!(receipt.totals(TaxCalculator::default()).total(), dec!(12));
    }

    #[test]
    fn test_forced_total_flows_into_totals() {
        let invoice = invoice_with(vec![LineItem::new("Widget", dec!(20))])
            .forced_total(dec!(25.5))
            .build()
            .unwrap();
        let totals = invoice.totals(TaxCalculator::default());
        assert_eq!(totals.total(), dec!(25.5));
        assert_eq!(totals.items_total(), dec!(20));
    }

    #[test]
    fn test_soft_expected_total_logs_without_failing() {
        let invoice = invoice_with(vec![LineItem::new("Widget", dec!(10))])
            .issued_on(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .expected_total(ExpectedTotal::soft(dec!(100)))
            .build()
            .unwrap();
        let sink = RecordingSink::new();

        let result = invoice.check_expected_total(
            TaxCalculator::default(),
            &ExpectedTotalValidator::default(),
            &sink,
        );

        assert!(result.is_ok());
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.document_id, "INV-1");
        assert_eq!(records[0].1.difference, dec!(90));
    }

    #[test]
    fn test_strict_expected_total_fails_after_logging() {
        let invoice = invoice_with(vec![LineItem::new("Widget", dec!(10))])
            .expected_total(ExpectedTotal::strict(dec!(100)))
            .build()
            .unwrap();
        let sink = RecordingSink::new();

        let result = invoice.check_expected_total(
            TaxCalculator::default(),
            &ExpectedTotalValidator::default(),
            &sink,
        );

        assert!(result.is_err());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_expected_total_checks_forced_total() {
        let invoice = invoice_with(vec![LineItem::new("Widget", dec!(10))])
            .forced_total(dec!(100))
            .expected_total(ExpectedTotal::strict(dec!(100)))
            .build()
            .unwrap();
        let sink = RecordingSink::new();

        assert!(invoice
            .check_expected_total(TaxCalculator::default(), &ExpectedTotalValidator::default(), &sink)
            .is_ok());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_render_produces_display_strings() {
        let invoice = invoice_with(vec![
            LineItem::new("Hosting", dec!(121)).with_tax_rate(dec!(21)),
            LineItem::new("Support", dec!(110)).with_tax_rate(dec!(10)),
        ])
        .build()
        .unwrap();

        let display = invoice
            .render(&EngineConfig::default(), &RecordingSink::new())
            .unwrap();

        assert_eq!(display.subtotal, "$ 200.00");
        assert_eq!(display.tax_amount, "$ 31.00");
        assert_eq!(display.total, "$ 231.00");
        assert_eq!(display.tax_groups[0].rate_percent, dec!(21));
        assert_eq!(display.tax_groups[0].tax, "$ 21.00");
    }

    #[test]
    fn test_render_stops_on_strict_mismatch() {
        let invoice = invoice_with(vec![LineItem::new("Widget", dec!(10))])
            .expected_total(ExpectedTotal::strict(dec!(11)))
            .build()
            .unwrap();

        let err = invoice
            .render(&EngineConfig::default(), &RecordingSink::new())
            .unwrap_err();
        assert!(matches!(err, BillingError::TotalMismatch(_)));
    }

    #[test]
    fn test_render_rejects_invalid_config() {
        let invoice = invoice_with(vec![LineItem::new("Widget", dec!(10))])
            .build()
            .unwrap();
        let config = EngineConfig {
            precision: PrecisionConfig {
                monetary: 20,
                ..PrecisionConfig::default()
            },
            ..EngineConfig::default()
        };

        let err = invoice.render(&config, &RecordingSink::new()).unwrap_err();
        assert!(matches!(err, BillingError::Config(_)));
    }

    #[test]
    fn test_document_input_builds_through_validation() {
        let input: DocumentInput<LineItem> = serde_json::from_str(
            r#"{
                "id": "INV-77",
                "issued_on": "2024-06-30",
                "buyer": { "name": "Acme Corp" },
                "items": [
                    { "title": "Hosting", "unit_price": 121.0, "tax_rate_percent": 21.0 },
                    { "title": "Setup", "unit_price": 50.0, "quantity": 2 }
                ],
                "expected_total": { "amount": 221.0, "throw_on_mismatch": true }
            }"#,
        )
        .unwrap();

        let invoice = input.build().unwrap();
        assert_eq!(invoice.id(), "INV-77");
        assert_eq!(invoice.items().len(), 2);
        assert_eq!(invoice.issued_on(), NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(invoice.expected_total(), Some(&ExpectedTotal::strict(dec!(221))));
        assert_eq!(invoice.items()[1].quantity, dec!(2));
    }

    #[test]
    fn test_document_input_rejects_unknown_fields() {
        let result: Result<DocumentInput<LineItem>, _> = serde_json::from_str(
            r#"{ "items": [], "setTotal": 5 }"#,
        );
        assert!(result.is_err());
    }
}
