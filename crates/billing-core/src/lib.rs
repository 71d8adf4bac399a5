//! # billing-core: Monetary Engine for Billing Documents
//!
//! This crate computes and checks the figures printed on invoices and
//! usage receipts. It contains no I/O: rendering, templates, translations
//! and file handling belong to the callers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Rendering surface (PDF templates, CLI, ...)          │   │
//! │  │       receives DisplayTotals, never does arithmetic itself      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ billing-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │   item   │─►│   tax    │─►│  totals  │─►│  validation  │   │   │
//! │  │   │ LineItem │  │ TaxCalc  │  │ Document │  │ ExpectedTotal│   │   │
//! │  │   │UsageItem │  │  groups  │  │  Totals  │  │  Validator   │   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   money: round_to · Money · CurrencyFormatter                  │   │
//! │  │   document: Document · DocumentBuilder · DocumentInput         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO ENVIRONMENT • DETERMINISTIC           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`item`] - Priced items (LineItem, UsageItem) and their validation
//! - [`tax`] - Tax extraction and grouping by rate
//! - [`totals`] - Document totals and the reconciled subtotal
//! - [`validation`] - Document checks and the expected-total validator
//! - [`document`] - Invoices, usage receipts and their builder
//! - [`money`] - Rounding, minor units and currency formatting
//! - [`config`] - Precision, currency and tolerance settings
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Tax-inclusive prices**: tax is extracted from prices, never added
//! 2. **Decimal, never float**: amounts and rates are `rust_decimal`
//!    values; one rounding primitive (half away from zero) is applied
//!    before anything is compared or summed for display
//! 3. **Printed figures add up**: the subtotal is derived backwards from
//!    the rounded total and rounded group taxes
//! 4. **Explicit errors**: validation fails fast with typed errors; the
//!    calculations themselves never fail
//!
//! ## Example Usage
//!
//! ```rust
//! use billing_core::config::EngineConfig;
//! use billing_core::document::{Invoice, PartyRef};
//! use billing_core::item::LineItem;
//! use billing_core::validation::TracingSink;
//! use rust_decimal_macros::dec;
//!
//! let invoice = Invoice::builder()
//!     .id("INV-2024-0042")
//!     .buyer(PartyRef::new("Acme Corp"))
//!     .item(LineItem::new("Hosting", dec!(121.00)).with_tax_rate(dec!(21)))
//!     .item(LineItem::new("Book", dec!(109.00)).with_tax_rate(dec!(9)))
//!     .build()
//!     .unwrap();
//!
//! let display = invoice.render(&EngineConfig::default(), &TracingSink).unwrap();
//! assert_eq!(display.subtotal, "$ 200.00");
//! assert_eq!(display.total, "$ 230.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod document;
pub mod error;
pub mod item;
pub mod money;
pub mod tax;
pub mod totals;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use billing_core::LineItem` instead of
// `use billing_core::item::LineItem`

pub use config::EngineConfig;
pub use document::{Document, DocumentBuilder, DocumentInput, DocumentKind, Invoice, PartyRef, UsageReceipt};
pub use error::{
    BillingError, BillingResult, ConfigError, DocumentValidationError, ItemValidationError,
    TotalMismatch,
};
pub use item::{LineItem, PricedItem, UsageItem};
pub use money::{round_to, CurrencyFormatter, Money};
pub use tax::{TaxCalculator, TaxGroup};
pub use totals::{DisplayTotals, DocumentTotals, TotalsSummary};
pub use validation::{
    ExpectedTotal, ExpectedTotalValidator, MismatchReport, MismatchSink, RecordingSink, TracingSink,
};

// Callers build items from the same Decimal type the engine computes with
pub use rust_decimal::Decimal;
