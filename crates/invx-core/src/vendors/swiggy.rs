//! Swiggy food-delivery invoices.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::rules::{FieldRule, HeaderBuilder, clean_text};
use super::{VendorExtractor, require_text, source_name};
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

const BUYER_ADDRESS: &str = r"(?s)Customer Address:\s*(.+?)\s+Restaurant GSTIN";

lazy_static! {
    static ref ADDRESS_BLOCK: Regex = Regex::new(BUYER_ADDRESS).unwrap();

    static ref FIELDS: Vec<FieldRule> = vec![
        FieldRule::new("Buyer Name", &[r"(?s)Invoice To:\s*(.+?)\s*Invoice issued by"]),
        FieldRule::new("Buyer Address", &[BUYER_ADDRESS]),
        FieldRule::new("Restaurant Name", &[r"Restaurant Name:\s*(.+)"]),
        FieldRule::new("Restaurant GSTIN", &[r"Restaurant GSTIN:\s*([A-Z0-9]+)"]),
        FieldRule::new("Order ID", &[r"Order ID:\s*(\d+)"]),
        FieldRule::new("Invoice Number", &[r"Invoice No:\s*(\S+)"]),
        FieldRule::new("Invoice Date", &[r"Date of Invoice:\s*(\d{2}-\d{2}-\d{4})"]),
        FieldRule::new("Invoice Total", &[r"Invoice Total\s+([\d.]+)"]),
        FieldRule::new(
            "Invoice Total (Words)",
            &[r"(?s)Invoice total in words\s+(.+?)\s+Authorized Signature"],
        ),
    ];

    /// `1. Paneer Tikka  OTH  2  150.00  300.00  30.00  270.00`
    static ref ITEM_LINE: Regex = Regex::new(
        r"^(\d+\.\s+.+?)\s+OTH\s+(\d+)\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)"
    ).unwrap();
}

const ITEM_COLUMNS: [&str; 7] = [
    "Description",
    "Unit",
    "Quantity",
    "Unit Price",
    "Amount",
    "Discount",
    "Net Value",
];

pub struct SwiggyExtractor;

impl SwiggyExtractor {
    /// Address lines joined with `, `.
    fn buyer_address(text: &str) -> Option<String> {
        let caps = ADDRESS_BLOCK.captures(text)?;
        let lines: Vec<String> = caps[1]
            .lines()
            .map(clean_text)
            .filter(|l| !l.is_empty())
            .collect();
        Some(lines.join(", "))
    }

    /// First detected table whose header row mentions `Description`, when
    /// it has item rows.
    fn table_items(acquired: &Acquired) -> Option<Table> {
        let table = acquired
            .tables()
            .iter()
            .find(|t| {
                t.cells
                    .first()
                    .is_some_and(|header| header.iter().any(|c| c.contains("Description")))
            })
            .map(|t| Table::from_grid(&t.cells))?;

        if table.is_empty() {
            debug!(vendor = "swiggy", "Description table has no rows, reading item lines");
            return None;
        }
        Some(table)
    }

    /// Line-by-line fallback over `OTH` item lines.
    fn line_items(acquired: &Acquired) -> Table {
        let mut table = Table::new(ITEM_COLUMNS);
        for page in acquired.pages() {
            for line in page.lines() {
                if let Some(caps) = ITEM_LINE.captures(line.trim()) {
                    table.push_row([
                        clean_text(&caps[1]),
                        "OTH".to_string(),
                        caps[2].to_string(),
                        caps[3].to_string(),
                        caps[4].to_string(),
                        caps[5].to_string(),
                        caps[6].to_string(),
                    ]);
                }
            }
        }
        table
    }
}

impl VendorExtractor for SwiggyExtractor {
    fn tag(&self) -> &'static str {
        "swiggy"
    }

    fn label(&self) -> &'static str {
        "Swiggy"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = require_text(acquired, file_name)?;

        let mut header = HeaderBuilder::new("");
        header.apply(&FIELDS, &text);
        if let Some(address) = Self::buyer_address(&text) {
            header.set("Buyer Address", address);
        }

        let mut items = Self::table_items(acquired).unwrap_or_else(|| Self::line_items(acquired));
        if !items.is_empty() {
            items = items.with_constant_column("Source_File", source_name(file_name));
        }

        Ok(ExtractionResult::new(header.to_row(), items).into())
    }
}
