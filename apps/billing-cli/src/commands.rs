use std::fmt;

use billing_core::tax::TaxCalculator;
use billing_core::validation::{ExpectedTotalValidator, TracingSink};
use billing_core::{DisplayTotals, DocumentKind, EngineConfig, TotalsSummary};
use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, Command, ConfigArgs, DocumentArgs, OutputFormat};
use crate::config;
use crate::error::CliResult;
use crate::input::{read_input, LoadedDocument};

pub fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Totals(args) => cmd_totals(args, cli.config, cli.format),
        Command::Check(args) => cmd_check(args, cli.config, cli.format),
        Command::Config(args) => cmd_config(args, cli.config, cli.format),
    }
}

// =============================================================================
// totals
// =============================================================================

/// Everything `billing totals --format json` prints.
#[derive(Debug, Serialize)]
pub struct TotalsReport {
    pub id: String,
    pub kind: DocumentKind,
    pub figures: TotalsSummary,
    pub display: DisplayTotals,
}

fn cmd_totals(
    args: DocumentArgs,
    config_path: Option<std::path::PathBuf>,
    format: OutputFormat,
) -> CliResult<()> {
    let config = config::load(config_path)?;
    let document = LoadedDocument::from_json(&read_input(args.path.as_deref())?)?;

    let display = document.render(&config, &TracingSink)?;
    let report = TotalsReport {
        id: document.id().to_string(),
        kind: document.kind(),
        figures: document.summary(TaxCalculator::new(config.precision)),
        display,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}

/// Plain-text layout used by `--format text`.
impl fmt::Display for TotalsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display = &self.display;

        writeln!(f, "{} {}", self.kind, self.id)?;
        writeln!(f, "  {:<16}{}", "Items total", display.items_total)?;
        writeln!(f, "  {:<16}{}", "Subtotal", display.subtotal)?;
        for group in &display.tax_groups {
            let label = format!("Tax {}%", group.rate_percent.normalize());
            writeln!(f, "  {:<16}{}", label, group.tax)?;
        }
        writeln!(f, "  {:<16}{}", "Tax", display.tax_amount)?;
        writeln!(f, "  {:<16}{}", "Total", display.total)
    }
}

// =============================================================================
// check
// =============================================================================

fn cmd_check(
    args: DocumentArgs,
    config_path: Option<std::path::PathBuf>,
    format: OutputFormat,
) -> CliResult<()> {
    let config = config::load(config_path)?;
    let document = LoadedDocument::from_json(&read_input(args.path.as_deref())?)?;

    document.check_expected_total(
        TaxCalculator::new(config.precision),
        &ExpectedTotalValidator::from_config(&config.validation),
        &TracingSink,
    )?;

    info!(id = document.id(), kind = %document.kind(), "Document is valid");
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "id": document.id(), "kind": document.kind(), "valid": true })
        ),
        OutputFormat::Text => println!("ok: {} {}", document.kind(), document.id()),
    }
    Ok(())
}

// =============================================================================
// config
// =============================================================================

fn cmd_config(
    args: ConfigArgs,
    config_path: Option<std::path::PathBuf>,
    format: OutputFormat,
) -> CliResult<()> {
    if args.init {
        let path = config::save(&EngineConfig::default(), config_path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = config::load(config_path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_layout() {
        let document = LoadedDocument::from_json(
            r#"{ "id": "INV-9", "buyer": { "name": "Acme" },
                 "items": [
                    { "title": "Hosting", "unit_price": 121.0, "tax_rate_percent": 21.0 },
                    { "title": "Book", "unit_price": 109.0, "tax_rate_percent": 9.0 },
                    { "title": "Voucher", "unit_price": 50.0 }
                 ] }"#,
        )
        .unwrap();
        let config = EngineConfig::default();
        let report = TotalsReport {
            id: document.id().to_string(),
            kind: document.kind(),
            figures: document.summary(TaxCalculator::default()),
            display: document.render(&config, &TracingSink).unwrap(),
        };

        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "invoice INV-9");
        assert_eq!(lines[1], "  Items total     $ 280.00");
        assert_eq!(lines[2], "  Subtotal        $ 250.00");
        assert_eq!(lines[3], "  Tax 21%         $ 21.00");
        assert_eq!(lines[4], "  Tax 9%          $ 9.00");
        assert_eq!(lines[5], "  Tax             $ 30.00");
        assert_eq!(lines[6], "  Total           $ 280.00");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_text_labels_keep_fractional_rates() {
        let document = LoadedDocument::from_json(
            r#"{ "id": "INV-11", "buyer": { "name": "Acme" },
                 "items": [{ "title": "Books", "unit_price": 105.5, "tax_rate_percent": 5.50 }] }"#,
        )
        .unwrap();
        let report = TotalsReport {
            id: document.id().to_string(),
            kind: document.kind(),
            figures: document.summary(TaxCalculator::default()),
            display: document.render(&EngineConfig::default(), &TracingSink).unwrap(),
        };

        let text = report.to_string();
        assert!(text.contains("  Tax 5.5%        $ 5.50\n"));
        assert!(text.ends_with("  Total           $ 105.50\n"));
    }

    #[test]
    fn test_report_json_carries_minor_units() {
        let document = LoadedDocument::from_json(
            r#"{ "id": "INV-10", "buyer": { "name": "Acme" },
                 "items": [{ "title": "Hosting", "unit_price": 121.0, "tax_rate_percent": 21.0 }] }"#,
        )
        .unwrap();
        let report = TotalsReport {
            id: document.id().to_string(),
            kind: document.kind(),
            figures: document.summary(TaxCalculator::default()),
            display: document.render(&EngineConfig::default(), &TracingSink).unwrap(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "invoice");
        assert_eq!(json["figures"]["total"], 12100);
        assert_eq!(json["display"]["subtotal"], "$ 100.00");
    }
}
