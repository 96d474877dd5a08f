//! The output contract shared by all vendor extractors, and the per-file
//! status reported by the pipeline.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::table::Table;

/// Header record plus line items for one invoice file.
///
/// Only constructed through [`ExtractionResult::new`], which derives
/// `has_items` from the item row count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    invoice_summary: Table,
    item_details: Table,
    has_items: bool,
}

impl ExtractionResult {
    /// Package a summary table and an item table.
    pub fn new(invoice_summary: Table, item_details: Table) -> Self {
        let has_items = !item_details.is_empty();
        let result = Self {
            invoice_summary,
            item_details,
            has_items,
        };
        debug_assert!(result.is_consistent());
        result
    }

    /// Both tables empty.
    pub fn empty() -> Self {
        Self::new(Table::default(), Table::default())
    }

    /// Header-level fields (normally a single row).
    pub fn invoice_summary(&self) -> &Table {
        &self.invoice_summary
    }

    /// Line items, possibly empty.
    pub fn item_details(&self) -> &Table {
        &self.item_details
    }

    /// True iff `item_details` has at least one row.
    pub fn has_items(&self) -> bool {
        self.has_items
    }

    /// Either table holds a row.
    pub fn has_data(&self) -> bool {
        !self.invoice_summary.is_empty() || !self.item_details.is_empty()
    }

    fn is_consistent(&self) -> bool {
        self.has_items == !self.item_details.is_empty()
    }
}

/// What an extractor hands back: the two-table invoice shape, or a single
/// flat table for extractors that only produce one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ExtractionOutput {
    /// Header record + line items.
    Invoice(ExtractionResult),
    /// One table, exported as a single sheet.
    Legacy(Table),
}

impl ExtractionOutput {
    /// Empty two-table output.
    pub fn empty() -> Self {
        Self::Invoice(ExtractionResult::empty())
    }

    /// Whether any table in the output has a row.
    pub fn has_data(&self) -> bool {
        match self {
            Self::Invoice(result) => result.has_data(),
            Self::Legacy(table) => !table.is_empty(),
        }
    }

    /// The table carrying header-level fields.
    pub fn summary(&self) -> &Table {
        match self {
            Self::Invoice(result) => result.invoice_summary(),
            Self::Legacy(table) => table,
        }
    }
}

impl From<ExtractionResult> for ExtractionOutput {
    fn from(result: ExtractionResult) -> Self {
        Self::Invoice(result)
    }
}

/// Outcome of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failed,
}

/// Per-file status returned to the caller of the pipeline.
///
/// `status` is `Success` exactly when `data` is present and holds at least
/// one row; `error` is present exactly when `status` is `Failed`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionStatus {
    method_used: String,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ExtractionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<PathBuf>,
}

impl ExtractionStatus {
    /// Success when the output has data, otherwise `No data extracted`.
    pub fn from_output(method: impl Into<String>, output: ExtractionOutput) -> Self {
        if !output.has_data() {
            return Self::failed(method, "No data extracted");
        }
        Self {
            method_used: method.into(),
            status: Status::Success,
            data: Some(output),
            error: None,
            output_path: None,
        }
    }

    /// A failed entry with a human-readable cause.
    pub fn failed(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            method_used: method.into(),
            status: Status::Failed,
            data: None,
            error: Some(error.into()),
            output_path: None,
        }
    }

    /// Record where the workbook was written.
    pub fn with_output_path(mut self, path: Option<PathBuf>) -> Self {
        self.output_path = path;
        self
    }

    pub fn method_used(&self) -> &str {
        &self.method_used
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn data(&self) -> Option<&ExtractionOutput> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Workbook location, when export succeeded.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Table {
        let mut table = Table::new(["Item"]);
        for i in 0..n {
            table.push_row([format!("item {}", i)]);
        }
        table
    }

    #[test]
    fn test_has_items_tracks_rows() {
        for n in [0, 1, 3] {
            let result = ExtractionResult::new(Table::default(), items(n));
            assert_eq!(result.has_items(), n > 0);
            assert_eq!(result.has_items(), !result.item_details().is_empty());
        }
    }

    #[test]
    fn test_empty_result() {
        let result = ExtractionResult::empty();
        assert!(!result.has_items());
        assert!(!result.has_data());
        assert!(!ExtractionOutput::empty().has_data());
    }

    #[test]
    fn test_summary_only_counts_as_data() {
        let summary = Table::single_row([("Invoice Number", "X1")]);
        let output = ExtractionOutput::from(ExtractionResult::new(summary, Table::default()));
        assert!(output.has_data());
    }

    #[test]
    fn test_status_from_empty_output_fails() {
        let status = ExtractionStatus::from_output("amazon", ExtractionOutput::empty());
        assert_eq!(status.status(), Status::Failed);
        assert_eq!(status.error(), Some("No data extracted"));
        assert!(status.data().is_none());
    }

    #[test]
    fn test_status_success_carries_data() {
        let output = ExtractionOutput::Legacy(items(2));
        let status = ExtractionStatus::from_output("flipkart", output);
        assert!(status.is_success());
        assert!(status.error().is_none());
        assert!(status.data().is_some());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let status = ExtractionStatus::failed("nonexistent_vendor", "Extractor not found");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["method_used"], "nonexistent_vendor");
        assert_eq!(json["error"], "Extractor not found");
        assert!(json.get("data").is_none());
    }
}
