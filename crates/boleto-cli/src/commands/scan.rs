//! Scan command - turn a single payment slip into a billing entry.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info};

use boleto_core::slip::rules::{parse_brl_amount, parse_slip_date};
use boleto_core::{ErrorKind, NewBillingEntry, PartialBillingRecord, ScanPipeline};

use super::{format_entry, load_config, BackendArg, OutputFormat};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Input file (slip image, or text with --backend text)
    #[arg(required = true)]
    input: PathBuf,

    /// Amount, overriding what is read from the slip (e.g. 1.234,56)
    #[arg(long, value_parser = parse_amount_arg)]
    amount: Option<Decimal>,

    /// Due date, overriding what is read from the slip (dd/mm/yyyy)
    #[arg(long, value_parser = parse_date_arg)]
    due_date: Option<NaiveDate>,

    /// Payee name, overriding what is read from the slip
    #[arg(long)]
    payee: Option<String>,

    /// Reference code (digitable line or barcode digits)
    #[arg(long)]
    code: Option<String>,

    /// Free-text notes
    #[arg(long)]
    notes: Option<String>,

    /// Category id
    #[arg(long)]
    category: Option<i64>,

    /// OCR backend (default: from config)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

impl ScanArgs {
    fn overrides(&self) -> PartialBillingRecord {
        PartialBillingRecord {
            amount: self.amount,
            due_date: self.due_date,
            payee: self.payee.clone(),
            reference_code: self.code.clone(),
            notes: self.notes.clone(),
            category_id: self.category,
        }
    }
}

/// Parse `--amount`: positive, with at most two decimal places.
///
/// `1.234` is refused rather than guessed; write `1.234,00` or `1234`.
pub fn parse_amount_arg(s: &str) -> Result<Decimal, String> {
    let s = s.trim();
    if s.starts_with('-') {
        return Err(format!("invalid amount (must be positive): {s}"));
    }
    if let Some(pos) = s.rfind([',', '.']) {
        let decimals = s[pos + 1..].chars().filter(char::is_ascii_digit).count();
        if decimals > 2 {
            return Err(format!(
                "invalid amount (ambiguous separator, use 1.234,56 style): {s}"
            ));
        }
    }

    match parse_brl_amount(s) {
        Some(amount) if amount > Decimal::ZERO => Ok(amount),
        Some(_) => Err(format!("invalid amount (must be positive): {s}")),
        None => Err(format!("invalid amount: {s}")),
    }
}

pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_slip_date(s).ok_or_else(|| format!("invalid date (expected dd/mm/yyyy): {s}"))
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(backend) = args.backend {
        config.ocr.backend = backend.into();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Scanning file: {}", args.input.display());

    let image = fs::read(&args.input)?;
    let today = config
        .extraction
        .reference_date
        .unwrap_or_else(|| Local::now().date_naive());
    let pipeline = Arc::new(ScanPipeline::from_config(&config));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Scanning with {} backend...", pipeline.recognizer_name()));

    let result = pipeline.spawn(image, args.overrides()).wait().await;
    pb.finish_and_clear();

    let record = match result {
        Ok(record) => record,
        Err(e) if e.kind() == ErrorKind::ExtractionIncomplete => {
            let missing: Vec<String> = e.missing_fields().iter().map(ToString::to_string).collect();
            eprintln!(
                "{} Could not determine: {}",
                style("✗").red(),
                missing.join(", ")
            );
            eprintln!("  Supply them with --amount, --due-date or --payee and scan again.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let entry = NewBillingEntry::from_reconciled(record, today)?;
    let output = format_entry(&entry, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_arg() {
        assert_eq!(parse_amount_arg("1.234,56"), Ok(Decimal::new(123456, 2)));
        assert_eq!(parse_amount_arg("150,00"), Ok(Decimal::new(15000, 2)));
        assert!(parse_amount_arg("abc").is_err());
    }

    #[test]
    fn test_parse_amount_arg_rejects_sign_and_ambiguity() {
        assert!(parse_amount_arg("-5").unwrap_err().contains("positive"));
        assert!(parse_amount_arg("0,00").unwrap_err().contains("positive"));
        assert!(parse_amount_arg("1.234").unwrap_err().contains("ambiguous"));
        assert!(parse_amount_arg("1,234").unwrap_err().contains("ambiguous"));
        assert_eq!(parse_amount_arg("1.234,5"), Ok(Decimal::new(12345, 1)));
        assert_eq!(parse_amount_arg("1234"), Ok(Decimal::from(1234)));
    }

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(parse_date_arg("05/03/2026"), Ok(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()));
        assert!(parse_date_arg("2026-03-05").is_err());
    }
}
