//! Tata 1mg pharmacy invoices.

use lazy_static::lazy_static;

use super::rules::{FieldRule, HeaderBuilder};
use super::{VendorExtractor, require_text, source_name};
use crate::acquire::{Acquired, Grid};
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

lazy_static! {
    static ref FIELDS: Vec<FieldRule> = vec![
        FieldRule::new("Invoice_Number", &[r"(?i)Invoice\s*no\.:?\s*([A-Z0-9]+)"]),
        FieldRule::new("Date", &[r"(?i)Date\s*:\s*([\d\-/]+)"]),
        FieldRule::new("Amount", &[r"(?i)(?:BILL AMOUNT|PAYABLE AMOUNT)\s*:\s*₹?\s*([\d.]+)"]),
        FieldRule::new("Order_ID", &[r"(?i)Order ID\s*:\s*([A-Z0-9]+)"]),
        FieldRule::new("Patient_Name", &[r"(?i)Patient Name\s*:\s*([^\n]+)"]),
        FieldRule::new("Contact", &[r"(?i)Contact\s*:\s*(\d+)"]),
        FieldRule::new("Place_of_Supply", &[r"(?i)Place of supply\s*:\s*([A-Za-z ]+)"]),
        FieldRule::new("GST_Number", &[r"(?i)GST\s*:\s*([A-Z0-9]+)"]),
    ];
}

/// Standard item columns of a 1mg bill, left to right.
const ITEM_COLUMNS: [&str; 15] = [
    "Sr No",
    "Product Name",
    "Manufacturer",
    "Batch No",
    "Expiry Date",
    "Quantity",
    "UOM",
    "Pack Size",
    "MRP",
    "Discount",
    "Taxable Amount",
    "HSN",
    "GST Rate (%)",
    "GST Amount",
    "Total Amount",
];

const MIN_TABLE_ROWS: usize = 5;
const MIN_TABLE_COLUMNS: usize = 8;

pub struct OneMgExtractor;

impl OneMgExtractor {
    fn header(text: &str, file_name: &str) -> HeaderBuilder {
        let mut header = HeaderBuilder::new("");
        header
            .set("Invoice_Number", "")
            .set("Date", "")
            .set("Vendor", "1mg")
            .set("Amount", "")
            .set("Description", "1mg Invoice")
            .apply(&FIELDS, text)
            .set("Source_File", source_name(file_name));
        header
    }

    /// Item rows of one table. A row whose first cell is a serial number
    /// starts an item; following rows are wrapped text of the same item and
    /// are appended cell by cell.
    fn merge_rows(cells: &Grid, source: &str) -> Table {
        let header = &cells[0];
        let width = header.len();
        let mut columns: Vec<String> = if width <= ITEM_COLUMNS.len() {
            ITEM_COLUMNS[..width].iter().map(|c| c.to_string()).collect()
        } else {
            header.clone()
        };
        columns.extend(["Source File".to_string(), "Custom Sr No".to_string()]);

        let mut table = Table::new(columns);
        let mut current: Option<Vec<String>> = None;
        let mut serial = 0;

        for row in &cells[1..] {
            let first = row.first().map(|c| c.trim()).unwrap_or("");
            if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
                if let Some(done) = current.take() {
                    table.push_row(done);
                }
                serial += 1;
                let mut item: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
                item.resize(width, String::new());
                item.push(source.to_string());
                item.push(format!("1mg.{}", serial));
                current = Some(item);
            } else if let Some(item) = current.as_mut() {
                for (slot, cell) in item.iter_mut().zip(row).take(width) {
                    let cell = cell.trim();
                    if !cell.is_empty() {
                        *slot = format!("{} {}", slot, cell).trim().to_string();
                    }
                }
            }
        }
        if let Some(done) = current {
            table.push_row(done);
        }

        table
    }

    fn items(acquired: &Acquired, source: &str) -> Table {
        let tables: Vec<Table> = acquired
            .tables()
            .iter()
            .filter(|t| t.cells.len() >= MIN_TABLE_ROWS && t.cells[0].len() >= MIN_TABLE_COLUMNS)
            .map(|t| Self::merge_rows(&t.cells, source))
            .collect();

        let mut items = Table::concat(&tables);
        if let Some(col) = items.column_index("Product Name") {
            items.retain_rows(|row| !row[col].trim().is_empty());
        }
        items
    }
}

impl VendorExtractor for OneMgExtractor {
    fn tag(&self) -> &'static str {
        "onemg"
    }

    fn label(&self) -> &'static str {
        "Tata 1mg"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = require_text(acquired, file_name)?;
        let header = Self::header(&text, file_name);
        let source = source_name(file_name);

        let mut items = Self::items(acquired, &source);
        if !items.is_empty() {
            for (name, value) in header.fields() {
                if name != "Source_File" {
                    items = items.with_constant_column(name.clone(), value.clone());
                }
            }
        }

        Ok(ExtractionResult::new(header.to_row(), items).into())
    }
}
