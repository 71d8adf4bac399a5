//! # Validation Module
//!
//! Item, document and expected-total checks.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Item (PricedItem::validate)                                  │
//! │  ├── title → quantity → unit price → tax rate                          │
//! │  └── first failure wins                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Document (validate_document)                                 │
//! │  ├── buyer present, at least one item                                  │
//! │  └── first bad item reported with its 0-based index                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Expected total (ExpectedTotalValidator)                      │
//! │  ├── |expected − total| ≤ tolerance → nothing happens                  │
//! │  ├── otherwise → ONE structured log record, always                     │
//! │  └── and TotalMismatch only if the caller asked for strict mode        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Layers 1 and 2 run before a document exists. Layer 3 runs at render
//! time: a mismatched expected total usually comes from an upstream quote,
//! so by default it is made visible without blocking issuance.

use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ValidationConfig;
use crate::document::PartyRef;
use crate::error::{DocumentValidationError, TotalMismatch};
use crate::item::PricedItem;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, DocumentValidationError>;

const MISMATCH_MESSAGE: &str = "Expected total does not match computed total";

// =============================================================================
// Document Validators
// =============================================================================

/// Validates every item, reporting the first failure with its index.
pub fn validate_items<I: PricedItem>(items: &[I]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(DocumentValidationError::NoItems);
    }

    for (index, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|source| DocumentValidationError::Item { index, source })?;
    }

    Ok(())
}

/// Validates a document's parts before it may be rendered.
///
/// ## Rules
/// - A buyer must be set
/// - There must be at least one item
/// - Every item must pass [`PricedItem::validate`]
pub fn validate_document<I: PricedItem>(
    buyer: Option<&PartyRef>,
    items: &[I],
) -> ValidationResult<()> {
    if buyer.is_none() {
        return Err(DocumentValidationError::MissingBuyer);
    }

    validate_items(items)
}

// =============================================================================
// Expected Total
// =============================================================================

/// A total the caller believes the document should come to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedTotal {
    pub amount: Decimal,

    /// Fail with [`TotalMismatch`] instead of only logging.
    #[serde(default)]
    pub throw_on_mismatch: bool,
}

impl ExpectedTotal {
    /// An expected total that is only logged on mismatch.
    pub fn soft(amount: Decimal) -> Self {
        ExpectedTotal {
            amount,
            throw_on_mismatch: false,
        }
    }

    /// An expected total that fails the check on mismatch.
    pub fn strict(amount: Decimal) -> Self {
        ExpectedTotal {
            amount,
            throw_on_mismatch: true,
        }
    }
}

// =============================================================================
// Mismatch Diagnostics
// =============================================================================

/// Structured fields describing one mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchReport {
    pub document_id: String,
    pub issued_on: Option<NaiveDate>,
    pub expected: Decimal,
    pub actual: Decimal,
    pub difference: Decimal,
}

/// Where mismatch diagnostics go.
///
/// Called exactly once per detected mismatch and never retried. Sinks are
/// shared between threads, so implementations must synchronize themselves.
pub trait MismatchSink: Send + Sync {
    fn record(&self, message: &str, report: &MismatchReport);
}

/// Emits each mismatch as a `warn!` event with the report as fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MismatchSink for TracingSink {
    fn record(&self, message: &str, report: &MismatchReport) {
        warn!(
            document_id = %report.document_id,
            issued_on = ?report.issued_on,
            expected = %report.expected,
            actual = %report.actual,
            difference = %report.difference,
            "{}",
            message
        );
    }
}

/// Keeps every mismatch in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(String, MismatchReport)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded (message, report) pairs, oldest first.
    pub fn records(&self) -> Vec<(String, MismatchReport)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MismatchSink for RecordingSink {
    fn record(&self, message: &str, report: &MismatchReport) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.to_string(), report.clone()));
    }
}

// =============================================================================
// Expected Total Validator
// =============================================================================

/// Identifies the document in mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentContext<'a> {
    pub document_id: &'a str,
    pub issued_on: Option<NaiveDate>,
}

/// Compares an expected total with the computed one.
///
/// ## Example
/// ```rust
/// use billing_core::validation::{
///     DocumentContext, ExpectedTotal, ExpectedTotalValidator, RecordingSink,
/// };
/// use rust_decimal_macros::dec;
///
/// let validator = ExpectedTotalValidator::default();
/// let sink = RecordingSink::new();
/// let context = DocumentContext { document_id: "INV-7", issued_on: None };
///
/// // Soft: logged, not failed
/// let soft = ExpectedTotal::soft(dec!(100));
/// assert!(validator.check(Some(&soft), dec!(10), context, &sink).is_ok());
/// assert_eq!(sink.len(), 1);
///
/// // Strict: logged and failed
/// let strict = ExpectedTotal::strict(dec!(100));
/// assert!(validator.check(Some(&strict), dec!(10), context, &sink).is_err());
/// assert_eq!(sink.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedTotalValidator {
    tolerance: Decimal,
}

impl ExpectedTotalValidator {
    pub fn new(tolerance: Decimal) -> Self {
        ExpectedTotalValidator { tolerance }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.expected_total_tolerance)
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Checks `actual` against `expected`.
    ///
    /// - `None` expected: nothing to check
    /// - within tolerance (inclusive): nothing happens
    /// - otherwise: one record goes to `sink`, then `TotalMismatch` is
    ///   returned if `throw_on_mismatch` is set
    pub fn check(
        &self,
        expected: Option<&ExpectedTotal>,
        actual: Decimal,
        context: DocumentContext<'_>,
        sink: &dyn MismatchSink,
    ) -> Result<(), TotalMismatch> {
        let Some(expected) = expected else {
            return Ok(());
        };

        let difference = (expected.amount - actual).abs();
        if difference <= self.tolerance {
            return Ok(());
        }

        let report = MismatchReport {
            document_id: context.document_id.to_string(),
            issued_on: context.issued_on,
            expected: expected.amount,
            actual,
            difference,
        };
        sink.record(MISMATCH_MESSAGE, &report);

        if expected.throw_on_mismatch {
            return Err(TotalMismatch {
                expected: expected.amount,
                actual,
                difference,
            });
        }

        Ok(())
    }
}

impl Default for ExpectedTotalValidator {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
