//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod scan;

use std::path::{Path, PathBuf};

use boleto_core::models::config::{BoletoConfig, OcrBackendKind};
use boleto_core::slip::rules::format_brl_amount;
use boleto_core::NewBillingEntry;
use tracing::debug;

/// Output format for billing entries.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

/// OCR backend selectable on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum BackendArg {
    /// Google Cloud Vision
    Vision,
    /// Local PaddleOCR models
    Onnx,
    /// Input files are already text
    Text,
}

impl From<BackendArg> for OcrBackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Vision => Self::Vision,
            BackendArg::Onnx => Self::Onnx,
            BackendArg::Text => Self::Text,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("boleto")
        .join("config.json")
}

/// Load the explicit config file, else the default one if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BoletoConfig> {
    let config = match config_path {
        Some(path) => BoletoConfig::from_file(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                BoletoConfig::from_file(&path)?
            } else {
                BoletoConfig::default()
            }
        }
    };

    Ok(config.apply_env())
}

pub fn format_entry(entry: &NewBillingEntry, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entry)?),
        OutputFormat::Csv => format_entry_csv(entry),
        OutputFormat::Text => Ok(format_entry_text(entry)),
    }
}

fn format_entry_csv(entry: &NewBillingEntry) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "payee",
        "amount",
        "due_date",
        "reference_code",
        "notes",
        "category_id",
        "status",
    ])?;

    wtr.write_record([
        entry.payee.as_str(),
        &entry.amount.to_string(),
        &entry.due_date.format("%d/%m/%Y").to_string(),
        entry.reference_code.as_deref().unwrap_or(""),
        entry.notes.as_deref().unwrap_or(""),
        &entry.category_id.map(|c| c.to_string()).unwrap_or_default(),
        &entry.status.to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_entry_text(entry: &NewBillingEntry) -> String {
    let mut output = String::new();

    output.push_str(&format!("Payee:    {}\n", entry.payee));
    output.push_str(&format!("Amount:   R$ {}\n", format_brl_amount(entry.amount)));
    output.push_str(&format!("Due date: {}\n", entry.due_date.format("%d/%m/%Y")));
    output.push_str(&format!("Status:   {}\n", entry.status));

    if let Some(code) = &entry.reference_code {
        output.push_str(&format!("Code:     {}\n", code));
    }
    if let Some(notes) = &entry.notes {
        output.push_str(&format!("Notes:    {}\n", notes));
    }
    if let Some(category) = entry.category_id {
        output.push_str(&format!("Category: {}\n", category));
    }

    output
}
