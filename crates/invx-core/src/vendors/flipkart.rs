//! Flipkart invoices, produced as a single flat table.
//!
//! One order PDF can hold several tax invoices (one per seller shipment);
//! each `Tax Invoice` section becomes one row.

use lazy_static::lazy_static;
use regex::Regex;

use super::rules::{FieldExtractor, FieldRule};
use super::{VendorExtractor, require_text};
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, Table};

const COLUMNS: [&str; 5] = ["Invoice_Number", "Date", "Amount", "Vendor", "Description"];

lazy_static! {
    static ref SECTION: Regex = Regex::new(r"(?i)Tax Invoice").unwrap();

    static ref INVOICE_NUMBER: FieldRule = FieldRule::new(
        "Invoice_Number",
        &[r"(?i)Invoice (?:Number|No)\.?\s*#?\s*:?\s*([A-Z0-9\-/]+)"],
    );
    static ref DATE: FieldRule = FieldRule::new(
        "Date",
        &[
            r"(?i)Invoice Date\s*:?\s*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(?i)Order Date\s*:?\s*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    );
    static ref AMOUNT: FieldRule = FieldRule::new(
        "Amount",
        &[
            r"(?i)Grand Total\s*:?\s*(?:₹|Rs\.?)?\s*([\d,]+\.?\d*)",
            r"(?i)\bTotal\s*:?\s*(?:₹|Rs\.?)?\s*([\d,]+\.\d+)",
        ],
    );
    static ref VENDOR: FieldRule = FieldRule::new("Vendor", &[r"(?i)Sold By\s*:?\s*([^,\n]+)"]);
    static ref DESCRIPTION: FieldRule = FieldRule::new(
        "Description",
        &[
            r"(?i)Product Title\s*:?\s*([^\n]+)",
            r"(?im)^\s*\d+\s+([A-Za-z][^\n]*?)\s+\d+\s+(?:₹|Rs\.?)?\s*[\d,]+\.\d+",
        ],
    );
}

pub struct FlipkartExtractor;

impl FlipkartExtractor {
    fn section_row(section: &str) -> Option<Vec<String>> {
        let invoice_number = INVOICE_NUMBER.extract(section)?;
        let mut row = vec![invoice_number];
        row.extend(
            [&*DATE, &*AMOUNT, &*VENDOR, &*DESCRIPTION]
                .iter()
                .map(|rule| rule.extract(section).unwrap_or_default()),
        );
        Some(row)
    }
}

impl VendorExtractor for FlipkartExtractor {
    fn tag(&self) -> &'static str {
        "flipkart"
    }

    fn label(&self) -> &'static str {
        "Flipkart"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = require_text(acquired, file_name)?;

        let mut table = Table::new(COLUMNS);
        for section in SECTION.split(&text) {
            if let Some(row) = Self::section_row(section) {
                table.push_row(row);
            }
        }

        Ok(ExtractionOutput::Legacy(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ORDER: &str = "\
Tax Invoice
Sold By: Retail Net, Plot 4, Bhiwandi
Invoice Number # FAF1234567
Order Date: 02-05-2024
Invoice Date: 03-05-2024
1 Boat Rockerz 450 Headphones 1 1,499.00 1,499.00
Grand Total ₹ 1,499.00
Tax Invoice
Sold By: SuperComNet, Whitefield
Invoice Number # FAG7654321
Invoice Date: 04-05-2024
Product Title: USB-C Cable 1m
Grand Total ₹ 299.00";

    fn table(text: &str) -> Table {
        match FlipkartExtractor.extract_from(&Acquired::from_text(text), "fk.pdf").unwrap() {
            ExtractionOutput::Legacy(table) => table,
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_row_per_tax_invoice() {
        let table = table(ORDER);
        assert_eq!(table.columns(), COLUMNS);
        assert_eq!(table.len(), 2);

        assert_eq!(table.get(0, "Invoice_Number"), Some("FAF1234567"));
        assert_eq!(table.get(0, "Date"), Some("03-05-2024"));
        assert_eq!(table.get(0, "Amount"), Some("1,499.00"));
        assert_eq!(table.get(0, "Vendor"), Some("Retail Net"));
        assert_eq!(table.get(0, "Description"), Some("Boat Rockerz 450 Headphones"));

        assert_eq!(table.get(1, "Invoice_Number"), Some("FAG7654321"));
        assert_eq!(table.get(1, "Amount"), Some("299.00"));
        assert_eq!(table.get(1, "Description"), Some("USB-C Cable 1m"));
    }

    #[test]
    fn test_sections_without_invoice_number_skipped() {
        let table = table("Order summary only\nGrand Total 10.00");
        assert!(table.is_empty());
        assert_eq!(table.columns(), COLUMNS);
    }
}
