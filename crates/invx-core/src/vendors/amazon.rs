//! Amazon India GST invoices.

use lazy_static::lazy_static;

use super::rules::{FieldRule, HeaderBuilder};
use super::{VendorExtractor, require_text, source_name};
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

lazy_static! {
    static ref FIELDS: Vec<FieldRule> = [
        ("invoice_type", r"(Tax Invoice/Bill of Supply/Cash Memo)"),
        ("order_number", r"Order Number\s*[:\-]?\s*([A-Z0-9\-]+)"),
        ("invoice_number", r"Invoice Number\s*[:\-]?\s*([A-Z0-9\-]+)"),
        ("order_date", r"Order Date\s*[:\-]?\s*(\d{2}.\d{2}.\d{4})"),
        ("invoice_date", r"Invoice Date\s*[:\-]?\s*(\d{2}.\d{2}.\d{4})"),
        ("seller_name", r"Sold By\s*[:\-]?\s*([^\n]+)"),
        ("seller_gst", r"GST Registration No[.:]?\s*([A-Z0-9]+)"),
        ("billing_address", r"Billing Address\s*[:\-]?\s*(.*?)State/UT Code"),
        ("shipping_address", r"Shipping Address\s*[:\-]?\s*(.*?)State/UT Code"),
        ("place_of_supply", r"Place of supply\s*[:\-]?\s*([^\n]+)"),
        ("place_of_delivery", r"Place of delivery\s*[:\-]?\s*([^\n]+)"),
        ("fssai_license", r"FSSAI License No\.\s*([0-9]+)"),
        ("pan", r"PAN No\s*[:\-]?\s*([A-Z0-9]+)"),
        ("total_tax", r"Total Tax Amount\s*[:\-]?\s*₹?\s*([\d,.]+)"),
        ("total_amount", r"Total Amount\s*[:\-]?\s*₹?\s*([\d,.]+)"),
        ("amount_in_words", r"Amount in Words\s*[:\-]?\s*(.+)"),
    ]
    .iter()
    .map(|&(name, pattern)| FieldRule::new(name, &[format!("(?is){}", pattern).as_str()]))
    .collect();
}

pub struct AmazonExtractor;

impl AmazonExtractor {
    /// Detected tables with a header and at least one data row.
    fn tables(acquired: &Acquired) -> Vec<Table> {
        acquired
            .tables()
            .iter()
            .filter(|t| t.cells.len() >= 2)
            .map(|t| Table::from_grid(&t.cells))
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl VendorExtractor for AmazonExtractor {
    fn tag(&self) -> &'static str {
        "amazon"
    }

    fn label(&self) -> &'static str {
        "Amazon"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = require_text(acquired, file_name)?;

        let mut header = HeaderBuilder::new("");
        header
            .apply(&FIELDS, &text)
            .set("vendor", "Amazon")
            .set("source_file", source_name(file_name));

        let items = Self::tables(acquired).into_iter().next().unwrap_or_default();

        Ok(ExtractionResult::new(header.to_row(), items).into())
    }
}
