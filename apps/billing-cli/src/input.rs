//! Document files as read by the CLI.
//!
//! A document file is the JSON form of [`DocumentInput`] plus a `kind`
//! field selecting the item type:
//!
//! ```json
//! {
//!   "kind": "invoice",
//!   "id": "INV-2024-0042",
//!   "buyer": { "name": "Acme Corp" },
//!   "items": [{ "title": "Hosting", "unit_price": 121.0, "tax_rate_percent": 21.0 }],
//!   "expected_total": { "amount": 121.0, "throw_on_mismatch": true }
//! }
//! ```
//!
//! `kind` defaults to `invoice` when absent.

use std::io::Read;
use std::path::Path;

use billing_core::document::DocumentItem;
use billing_core::tax::TaxCalculator;
use billing_core::validation::{ExpectedTotalValidator, MismatchSink};
use billing_core::{
    BillingResult, DisplayTotals, Document, DocumentInput, DocumentKind, EngineConfig, Invoice,
    TotalMismatch, TotalsSummary, UsageReceipt,
};
use serde_json::Value;

use crate::error::CliResult;

/// A validated document of either kind.
#[derive(Debug, Clone)]
pub enum LoadedDocument {
    Invoice(Invoice),
    UsageReceipt(UsageReceipt),
}

impl LoadedDocument {
    /// Parses and validates a document file.
    pub fn from_json(json: &str) -> CliResult<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        let kind = match value.as_object_mut().and_then(|fields| fields.remove("kind")) {
            Some(kind) => serde_json::from_value(kind)?,
            None => DocumentKind::Invoice,
        };

        Ok(match kind {
            DocumentKind::Invoice => LoadedDocument::Invoice(build(value)?),
            DocumentKind::UsageReceipt => LoadedDocument::UsageReceipt(build(value)?),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            LoadedDocument::Invoice(doc) => doc.id(),
            LoadedDocument::UsageReceipt(doc) => doc.id(),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            LoadedDocument::Invoice(doc) => doc.kind(),
            LoadedDocument::UsageReceipt(doc) => doc.kind(),
        }
    }

    pub fn summary(&self, calculator: TaxCalculator) -> TotalsSummary {
        match self {
            LoadedDocument::Invoice(doc) => doc.summary(calculator),
            LoadedDocument::UsageReceipt(doc) => doc.summary(calculator),
        }
    }

    pub fn check_expected_total(
        &self,
        calculator: TaxCalculator,
        validator: &ExpectedTotalValidator,
        sink: &dyn MismatchSink,
    ) -> Result<(), TotalMismatch> {
        match self {
            LoadedDocument::Invoice(doc) => doc.check_expected_total(calculator, validator, sink),
            LoadedDocument::UsageReceipt(doc) => {
                doc.check_expected_total(calculator, validator, sink)
            }
        }
    }

    pub fn render(&self, config: &EngineConfig, sink: &dyn MismatchSink) -> BillingResult<DisplayTotals> {
        match self {
            LoadedDocument::Invoice(doc) => doc.render(config, sink),
            LoadedDocument::UsageReceipt(doc) => doc.render(config, sink),
        }
    }
}

fn build<I>(value: Value) -> CliResult<Document<I>>
where
    I: DocumentItem + serde::de::DeserializeOwned,
{
    let input: DocumentInput<I> = serde_json::from_value(value)?;
    Ok(input.build()?)
}

/// Reads the document text from `path`, or stdin when it is absent or `-`.
pub fn read_input(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
