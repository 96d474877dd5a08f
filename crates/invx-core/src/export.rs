//! Workbook export of extraction output.
//!
//! Output paths are deterministic (`<dir>/<stem>_<method>.xlsx`), so a rerun
//! for the same file and method overwrites the previous workbook.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::{debug, error, info, warn};

use crate::error::ExportError;
use crate::models::config::{ExportConfig, InvxConfig};
use crate::models::{ExtractionOutput, Table};

type Result<T> = std::result::Result<T, ExportError>;

/// Writes [`ExtractionOutput`] to `.xlsx` workbooks.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    layout: ExportConfig,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, layout: ExportConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            layout,
        }
    }

    pub fn from_config(config: &InvxConfig) -> Self {
        Self::new(config.paths.extracted_dir.clone(), config.export.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<stem>_<method>.xlsx`
    pub fn output_path(&self, file_name: &str, method: &str) -> PathBuf {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        self.output_dir.join(format!("{}_{}.xlsx", stem, method))
    }

    /// Write the workbook, falling back to a summary-only workbook.
    ///
    /// Returns the written path, or `None` when both attempts failed.
    pub fn export(&self, output: &ExtractionOutput, file_name: &str, method: &str) -> Option<PathBuf> {
        let path = self.output_path(file_name, method);

        match self.write_full(output, &path) {
            Ok(()) => {
                info!("Exported {} to {}", file_name, path.display());
                return Some(path);
            }
            Err(e) => warn!("Full export of {} failed: {}; writing summary only", file_name, e),
        }

        match self.write_summary_only(output, &path) {
            Ok(()) => {
                info!("Exported summary of {} to {}", file_name, path.display());
                Some(path)
            }
            Err(e) => {
                error!("Export of {} failed: {}", file_name, e);
                None
            }
        }
    }

    fn prepare_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    fn write_full(&self, output: &ExtractionOutput, path: &Path) -> Result<()> {
        self.prepare_dir()?;
        let mut workbook = Workbook::new();

        match output {
            ExtractionOutput::Invoice(result) => {
                write_sheet(&mut workbook, &self.layout.summary_sheet, result.invoice_summary())?;
                if result.has_items() {
                    write_sheet(&mut workbook, &self.layout.items_sheet, result.item_details())?;
                } else {
                    let placeholder = Table::single_row([("Message", self.layout.empty_items_message.as_str())]);
                    write_sheet(&mut workbook, &self.layout.items_sheet, &placeholder)?;
                }
            }
            ExtractionOutput::Legacy(table) => {
                write_sheet(&mut workbook, &self.layout.legacy_sheet, table)?;
            }
        }

        workbook.save(path)?;
        Ok(())
    }

    fn write_summary_only(&self, output: &ExtractionOutput, path: &Path) -> Result<()> {
        let summary = output.summary();
        if summary.columns().is_empty() {
            return Err(ExportError::NoFallback);
        }
        let sheet = match output {
            ExtractionOutput::Invoice(_) => &self.layout.summary_sheet,
            ExtractionOutput::Legacy(_) => &self.layout.legacy_sheet,
        };

        self.prepare_dir()?;
        let mut workbook = Workbook::new();
        write_sheet(&mut workbook, sheet, summary)?;
        workbook.save(path)?;
        Ok(())
    }
}

/// One sheet: bold header row, then one row per table row.
fn write_sheet(workbook: &mut Workbook, name: &str, table: &Table) -> Result<()> {
    debug!("Writing sheet {} ({} rows)", name, table.len());
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name)?;

    for (col, column) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, column, &bold)?;
    }
    for (row_idx, row) in table.rows().iter().enumerate() {
        let row_num = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in row.iter().enumerate() {
            worksheet.write_string(row_num, column_index(col)?, cell)?;
        }
    }
    Ok(())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| ExportError::Workbook(XlsxError::RowColumnLimitError))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionResult;
    use calamine::{Reader, Xlsx, open_workbook};
    use pretty_assertions::assert_eq;

    fn exporter(dir: &Path) -> Exporter {
        Exporter::new(dir.join("extracted"), ExportConfig::default())
    }

    fn invoice(items: bool) -> ExtractionOutput {
        let summary = Table::single_row([("Invoice Number", "INV-2024-001"), ("Total", "100.00")]);
        let mut details = Table::new(["Item", "Qty", "Amount"]);
        if items {
            details.push_row(["Widget", "2", "100.00"]);
        }
        ExtractionResult::new(summary, details).into()
    }

    fn read(path: &Path) -> Vec<(String, Vec<Vec<String>>)> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        workbook
            .sheet_names()
            .into_iter()
            .map(|name| {
                let range = workbook.worksheet_range(&name).unwrap();
                let rows = range
                    .rows()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .collect();
                (name, rows)
            })
            .collect()
    }

    #[test]
    fn test_output_path() {
        let exporter = Exporter::new("out", ExportConfig::default());
        assert_eq!(
            exporter.output_path("invoice.pdf", "amazon"),
            PathBuf::from("out/invoice_amazon.xlsx")
        );
        assert_eq!(
            exporter.output_path("march.bill.pdf", "zomato"),
            PathBuf::from("out/march.bill_zomato.xlsx")
        );
    }

    #[test]
    fn test_two_sheet_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = exporter(dir.path()).export(&invoice(true), "invoice.pdf", "amazon").unwrap();

        let sheets = read(&path);
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].0, "Invoice Summary");
        assert_eq!(sheets[0].1, vec![vec!["Invoice Number", "Total"], vec!["INV-2024-001", "100.00"]]);
        assert_eq!(sheets[1].0, "Item Details");
        assert_eq!(sheets[1].1, vec![vec!["Item", "Qty", "Amount"], vec!["Widget", "2", "100.00"]]);
    }

    #[test]
    fn test_empty_items_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = exporter(dir.path()).export(&invoice(false), "invoice.pdf", "amazon").unwrap();

        let sheets = read(&path);
        assert_eq!(sheets[1].0, "Item Details");
        assert_eq!(sheets[1].1, vec![vec!["Message"], vec!["No item details found"]]);
    }

    #[test]
    fn test_legacy_data_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::new(["Invoice_Number", "Amount"]);
        table.push_row(["FAF1", "10.00"]);

        let path = exporter(dir.path())
            .export(&ExtractionOutput::Legacy(table), "fk.pdf", "flipkart")
            .unwrap();

        let sheets = read(&path);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].0, "Data");
        assert_eq!(sheets[0].1[1], vec!["FAF1", "10.00"]);
    }

    #[test]
    fn test_export_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path());

        let first = exporter.export(&invoice(true), "invoice.pdf", "vendorX").unwrap();
        let first_content = read(&first);
        let second = exporter.export(&invoice(true), "invoice.pdf", "vendorX").unwrap();

        assert_eq!(first, second);
        assert_eq!(first_content, read(&second));
        assert_eq!(std::fs::read_dir(exporter.output_dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_summary_only_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ExportConfig {
            items_sheet: "Items[bad]".to_string(),
            ..ExportConfig::default()
        };
        let exporter = Exporter::new(dir.path().join("extracted"), layout);

        let path = exporter.export(&invoice(true), "invoice.pdf", "amazon").unwrap();
        let sheets = read(&path);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].0, "Invoice Summary");
    }

    #[test]
    fn test_unwritable_dir_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("extracted");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let exporter = Exporter::new(&blocker, ExportConfig::default());
        assert!(exporter.export(&invoice(true), "invoice.pdf", "amazon").is_none());
    }
}
