//! # Error Types
//!
//! Domain-specific error types for billing-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  BillingError              - Umbrella for callers that don't care      │
//! │  ├── DocumentValidationError - MissingBuyer, NoItems, Item { index }   │
//! │  │   └── ItemValidationError - EmptyTitle, NonPositiveQuantity, ...    │
//! │  ├── TotalMismatch           - Only when strict reconciliation is on   │
//! │  └── ConfigError             - Rejected precision/currency settings    │
//! │                                                                         │
//! │  Calculation functions never fail: bad input is rejected by           │
//! │  validation before any totals are computed.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (index, amounts)
//! 3. Errors are enum variants, never String
//! 4. First error wins: no multi-error aggregation

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Item Validation Error
// =============================================================================

/// A single item failed its field constraints.
///
/// Checks run in a fixed order (title, quantity, unit price, tax rate) and
/// the first failure is reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemValidationError {
    /// Title is empty or whitespace only.
    #[error("title must not be empty")]
    EmptyTitle,

    /// Quantity is zero or negative.
    #[error("quantity must be greater than zero, got {quantity}")]
    NonPositiveQuantity { quantity: Decimal },

    /// Unit price times quantity falls outside the supported line amount.
    /// Negative prices are discount lines and are accepted.
    #[error("unit price {unit_price} puts the line total out of range")]
    InvalidUnitPrice { unit_price: Decimal },

    /// Tax rate is outside the closed interval [0, 100].
    #[error("tax rate must be between 0 and 100 percent, got {rate_percent}")]
    TaxRateOutOfRange { rate_percent: Decimal },
}

// =============================================================================
// Document Validation Error
// =============================================================================

/// Document-level validation failures.
///
/// ## When This Occurs
/// - `DocumentBuilder::build` is called without a buyer
/// - No items were added
/// - One of the items is invalid (the first one found, 0-based index)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentValidationError {
    /// No buyer party reference was set.
    #[error("document has no buyer")]
    MissingBuyer,

    /// The document has no items.
    #[error("document has no items")]
    NoItems,

    /// An item failed validation.
    #[error("item {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: ItemValidationError,
    },
}

// =============================================================================
// Total Mismatch
// =============================================================================

/// The caller's expected total disagrees with the computed total.
///
/// Only raised when `throw_on_mismatch` was requested; otherwise the same
/// condition is just logged.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected total {expected:.2} does not match computed total {actual:.2} (difference {difference:.2})")]
pub struct TotalMismatch {
    pub expected: Decimal,
    pub actual: Decimal,
    pub difference: Decimal,
}

// =============================================================================
// Config Error
// =============================================================================

/// Engine configuration was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A setting is outside its allowed range.
    #[error("Invalid engine configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Billing Error
// =============================================================================

/// Any error billing-core can produce.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    Validation(#[from] DocumentValidationError),

    #[error(transparent)]
    TotalMismatch(#[from] TotalMismatch),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with BillingError.
pub type BillingResult<T> = Result<T, BillingError>;

// =============================================================================
// Unit Tests
// =============================================================================
