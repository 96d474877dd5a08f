//! Process command - extract one invoice file.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invx_core::{Pipeline, REQUIRED_FIELDS, validate_summary};

use super::{OutputFormat, apply_dirs, load_config, render};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// File name inside the uploads directory, or a path to the file
    #[arg(required = true)]
    input: String,

    /// Extraction method (see `invx vendors`)
    #[arg(short, long)]
    method: String,

    /// Directory holding uploaded PDFs
    #[arg(short, long)]
    uploads_dir: Option<PathBuf>,

    /// Directory receiving workbooks
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Report missing header fields
    #[arg(long)]
    validate: bool,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;

    let (uploads_dir, file_name) = split_input(&args.input, args.uploads_dir);
    apply_dirs(&mut config, uploads_dir, args.output_dir);

    info!("Processing {} with {}", file_name, args.method);
    let pipeline = Pipeline::new(config);
    let report = pipeline.process_files(&[file_name.as_str()], &args.method);

    if args.validate {
        for (name, status) in &report {
            let Some(data) = status.data() else { continue };
            let missing = validate_summary(data, &REQUIRED_FIELDS);
            if !missing.is_empty() {
                eprintln!("{} {}", style("Validation issues in").yellow(), name);
                for field in &missing {
                    eprintln!("  - missing {}", field);
                }
            }
        }
    }

    println!("{}", render(&report, args.format)?);

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// A path with a directory part names its own uploads directory, unless
/// `--uploads-dir` was given.
fn split_input(input: &str, uploads_dir: Option<PathBuf>) -> (Option<PathBuf>, String) {
    let path = std::path::Path::new(input);
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());

    match (uploads_dir, parent, path.file_name()) {
        (None, Some(parent), Some(name)) => (Some(parent.to_path_buf()), name.to_string_lossy().into_owned()),
        (uploads_dir, _, _) => (uploads_dir, input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_input() {
        assert_eq!(split_input("a.pdf", None), (None, "a.pdf".to_string()));
        assert_eq!(
            split_input("in/a.pdf", None),
            (Some(PathBuf::from("in")), "a.pdf".to_string())
        );
        assert_eq!(
            split_input("in/a.pdf", Some(PathBuf::from("up"))),
            (Some(PathBuf::from("up")), "in/a.pdf".to_string())
        );
    }
}
