//! Batch command - scan multiple payment slips concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use boleto_core::slip::rules::format_brl_amount;
use boleto_core::{NewBillingEntry, PartialBillingRecord, ScanPipeline};

use super::{format_entry, load_config, BackendArg, OutputFormat};

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "txt",
];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of scans in flight at once
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// OCR backend (default: from config)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,
}

/// Result of scanning a single file.
struct ScanResult {
    path: PathBuf,
    entry: Option<NewBillingEntry>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(backend) = args.backend {
        config.ocr.backend = backend.into();
    }

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to scan",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let today = config
        .extraction
        .reference_date
        .unwrap_or_else(|| Local::now().date_naive());
    let pipeline = Arc::new(ScanPipeline::from_config(&config));

    let mut scans = stream::iter(files.into_iter().map(|path| {
        let pipeline = Arc::clone(&pipeline);
        async move { scan_file(&pipeline, path, today).await }
    }))
    .buffered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some(result) = scans.next().await {
        if let Some(ref error_msg) = result.error {
            if args.continue_on_error {
                warn!("Failed to scan {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to scan {}: {}", result.path.display(), error_msg);
                overall_pb.abandon();
                anyhow::bail!("Scan failed for {}: {}", result.path.display(), error_msg);
            }
        }
        results.push(result);
        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.entry.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        let Some(entry) = &result.entry else {
            continue;
        };

        match &args.output_dir {
            Some(output_dir) => {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("slip");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_entry(entry, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
            None => println!(
                "{} {}: {} R$ {} due {}",
                style("✓").green(),
                result.path.display(),
                entry.payee,
                format_brl_amount(entry.amount),
                entry.due_date.format("%d/%m/%Y")
            ),
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Scanned {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn scan_file(pipeline: &Arc<ScanPipeline>, path: PathBuf, today: NaiveDate) -> ScanResult {
    let file_start = Instant::now();

    let outcome = match fs::read(&path) {
        Ok(bytes) => match pipeline.spawn(bytes, PartialBillingRecord::new()).wait().await {
            Ok(record) => NewBillingEntry::from_reconciled(record, today).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        },
        Err(e) => Err(e.to_string()),
    };

    let processing_time_ms = file_start.elapsed().as_millis() as u64;
    match outcome {
        Ok(entry) => ScanResult {
            path,
            entry: Some(entry),
            error: None,
            processing_time_ms,
        },
        Err(error) => ScanResult {
            path,
            entry: None,
            error: Some(error),
            processing_time_ms,
        },
    }
}

fn write_summary(path: &Path, results: &[ScanResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "payee",
        "amount",
        "due_date",
        "reference_code",
        "billing_status",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(entry) = &result.entry {
            wtr.write_record([
                filename,
                "success",
                &entry.payee,
                &entry.amount.to_string(),
                &entry.due_date.format("%d/%m/%Y").to_string(),
                entry.reference_code.as_deref().unwrap_or(""),
                &entry.status.to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
