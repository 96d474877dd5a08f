//! Batch command - extract every matching upload with one method.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use invx_core::{BatchReport, ExtractionOutput, ExtractionStatus, Pipeline};

use super::{OutputFormat, apply_dirs, load_config, render};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern, resolved inside the uploads directory
    #[arg(required = true)]
    pattern: String,

    /// Extraction method (see `invx vendors`)
    #[arg(short, long)]
    method: String,

    /// Directory holding uploaded PDFs
    #[arg(short, long)]
    uploads_dir: Option<PathBuf>,

    /// Directory receiving workbooks
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for the report
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write summary.csv to the output directory
    #[arg(long)]
    summary: bool,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    apply_dirs(&mut config, args.uploads_dir, args.output_dir);

    let files = matching_files(&config.paths.uploads_dir, &args.pattern)?;
    if files.is_empty() {
        anyhow::bail!(
            "No matching files found for pattern {} in {}",
            args.pattern,
            config.paths.uploads_dir.display()
        );
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    let pipeline = Pipeline::new(config);
    let report = pipeline.process_files_with(files.as_slice(), &args.method, |file_name, status| {
        if let Some(error) = status.error() {
            warn!("Failed to process {}: {}", file_name, error);
        }
        pb.set_message(file_name.to_string());
        pb.inc(1);
    });
    pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = pipeline.config().paths.extracted_dir.join("summary.csv");
        write_summary(&summary_path, &report)?;
        eprintln!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    println!("{}", render(&report, args.format)?);

    let succeeded = report.values().filter(|s| s.is_success()).count();
    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        report.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(succeeded).green(),
        style(report.len() - succeeded).red()
    );

    Ok(())
}

/// Names of regular files under `uploads_dir` matching `pattern`, sorted.
fn matching_files(uploads_dir: &Path, pattern: &str) -> anyhow::Result<Vec<String>> {
    let full = uploads_dir.join(pattern);
    let mut files: Vec<String> = glob(&full.to_string_lossy())?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    files.sort();
    files.dedup();
    debug!("{} matched {} files", full.display(), files.len());
    Ok(files)
}

fn write_summary(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "method", "status", "rows", "items", "output_path", "error"])?;

    for (file_name, status) in report {
        let (rows, items) = counts(status);
        let output_path = status
            .output_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        wtr.write_record([
            file_name.as_str(),
            status.method_used(),
            if status.is_success() { "success" } else { "failed" },
            rows.as_str(),
            items.as_str(),
            output_path.as_str(),
            status.error().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Summary rows and item rows, blank when there is no data.
fn counts(status: &ExtractionStatus) -> (String, String) {
    match status.data() {
        Some(ExtractionOutput::Invoice(result)) => (
            result.invoice_summary().len().to_string(),
            result.item_details().len().to_string(),
        ),
        Some(ExtractionOutput::Legacy(table)) => (table.len().to_string(), String::new()),
        None => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_files_stays_in_uploads_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("a.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("dir.pdf")).unwrap();

        assert_eq!(matching_files(dir.path(), "*.pdf").unwrap(), ["a.pdf", "b.pdf"]);
        assert!(matching_files(dir.path(), "*.xlsx").unwrap().is_empty());
    }

    #[test]
    fn test_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.csv");

        let mut report = BatchReport::new();
        report.insert("b.pdf".to_string(), ExtractionStatus::failed("amazon", "b.pdf not found"));
        write_summary(&path, &report).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("filename,method,status,rows,items,output_path,error"));
        assert_eq!(lines.next(), Some("b.pdf,amazon,failed,,,,b.pdf not found"));
    }
}
