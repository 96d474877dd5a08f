//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod vendors;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use console::style;
use tracing::debug;

use invx_core::{BatchReport, ExtractionOutput, InvxConfig, Table};

/// How reports are printed.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON status report
    Json,
    /// Plain text summary
    Text,
}

/// `<config dir>/invx/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invx")
        .join("config.json")
}

/// Explicit `--config` file, else the default file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvxConfig> {
    if let Some(path) = config_path {
        return Ok(InvxConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(InvxConfig::from_file(&default_path)?)
    } else {
        Ok(InvxConfig::default())
    }
}

/// Apply `--uploads-dir` / `--output-dir` overrides.
pub fn apply_dirs(config: &mut InvxConfig, uploads_dir: Option<PathBuf>, output_dir: Option<PathBuf>) {
    if let Some(dir) = uploads_dir {
        config.paths.uploads_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.paths.extracted_dir = dir;
    }
}

pub fn render(report: &BatchReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &BatchReport) -> String {
    let mut output = String::new();

    for (file_name, status) in report {
        if status.is_success() {
            let _ = writeln!(output, "{} {} [{}]", style("✓").green(), file_name, status.method_used());
            if let Some(path) = status.output_path() {
                let _ = writeln!(output, "  Workbook: {}", path.display());
            }
            if let Some(data) = status.data() {
                render_output(&mut output, data);
            }
        } else {
            let _ = writeln!(
                output,
                "{} {} [{}]: {}",
                style("✗").red(),
                file_name,
                status.method_used(),
                status.error().unwrap_or("unknown error")
            );
        }
    }

    output
}

fn render_output(output: &mut String, data: &ExtractionOutput) {
    match data {
        ExtractionOutput::Invoice(result) => {
            let _ = writeln!(output, "  Summary:");
            render_fields(output, result.invoice_summary());
            let _ = writeln!(output, "  Items: {}", result.item_details().len());
        }
        ExtractionOutput::Legacy(table) => {
            let _ = writeln!(output, "  Rows: {}", table.len());
        }
    }
}

fn render_fields(output: &mut String, summary: &Table) {
    let pairs: Vec<(&str, &str)> = if summary.columns() == ["Field", "Value"] {
        summary.rows().iter().map(|r| (r[0].as_str(), r[1].as_str())).collect()
    } else {
        match summary.rows().first() {
            Some(row) => summary
                .columns()
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    };

    for (field, value) in pairs.into_iter().filter(|(_, v)| !v.is_empty()) {
        let _ = writeln!(output, "    {}: {}", field, value);
    }
}
