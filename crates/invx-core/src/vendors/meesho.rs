//! Meesho marketplace invoices.

use lazy_static::lazy_static;
use regex::Regex;

use super::rules::{FieldRule, HeaderBuilder, clean_text};
use super::{VendorExtractor, require_text};
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

lazy_static! {
    static ref FIELDS: Vec<FieldRule> = vec![
        FieldRule::new("Bill To", &[r"(?s)Bill To\s*(.*?)\s*Ship To"]),
        FieldRule::new("Ship To", &[r"(?s)Ship To\s*(.*?)\s*Invoice Number"]),
        FieldRule::new("Invoice Number", &[r"Invoice Number\s*(\S+)"]),
        FieldRule::new("Order Number", &[r"Order Number\s*(\S+)"]),
        FieldRule::new("Invoice Date", &[r"Invoice Date\s*(.*)"]),
        FieldRule::new("Order Date", &[r"Order Date\s*(.*)"]),
        FieldRule::new("Place of Supply", &[r"Place of Supply\s*:\s*(.*)"]),
        FieldRule::new("Seller Name", &[r"Sold by:\s*(.*?)\n"]),
        FieldRule::new("Seller Address", &[r"Sold by:[\s\S]*?\d{6}"]),
        FieldRule::new("Seller GSTIN", &[r"\d{2}[A-Z]{5}\d{4}[A-Z]\dZ[A-Z\d]"]),
    ];

    static ref ITEM: Regex = Regex::new(concat!(
        r"(?m)(?P<sn>\d+)\s+",
        r"(?P<description>[^\d]+?)\s+",
        r"(?P<hsn>\d{6})\s+",
        r"(?P<qty>\S+)\s+",
        r"Rs\.(?P<gross>\d+\.\d{2})\s+",
        r"Rs\.(?P<discount>\d+\.\d{2})\s+",
        r"Rs\.(?P<taxable>\d+\.\d{2})\s+",
        r"IGST\s+@[\d.]+% :Rs\.(?P<taxes>\d+\.\d{2})\s+",
        r"Rs\.(?P<total>\d+\.\d{2})",
    ))
    .unwrap();
}

const ITEM_COLUMNS: [(&str, &str); 9] = [
    ("SN", "sn"),
    ("Description", "description"),
    ("HSN", "hsn"),
    ("Qty", "qty"),
    ("Gross Amount", "gross"),
    ("Discount", "discount"),
    ("Taxable Value", "taxable"),
    ("Taxes", "taxes"),
    ("Total", "total"),
];

pub struct MeeshoExtractor;

impl MeeshoExtractor {
    fn items(text: &str) -> Table {
        let mut table = Table::new(ITEM_COLUMNS.map(|(column, _)| column));
        for caps in ITEM.captures_iter(text) {
            table.push_row(ITEM_COLUMNS.map(|(_, group)| clean_text(&caps[group])));
        }
        table
    }
}

impl VendorExtractor for MeeshoExtractor {
    fn tag(&self) -> &'static str {
        "meesho"
    }

    fn label(&self) -> &'static str {
        "Meesho"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = require_text(acquired, file_name)?;

        let mut header = HeaderBuilder::new("N/A");
        header.apply(&FIELDS, &text);

        Ok(ExtractionResult::new(header.to_field_value(), Self::items(&text)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INVOICE: &str = "\
Bill To Kavya Iyer
14 Temple Street Chennai
Ship To Kavya Iyer
Invoice Number MSH7781
Order Number 99881122
Invoice Date 02.09.2024
Sold by: Trendy Threads
Plot 9, Surat Gujarat 395003
GSTIN 24ABCDE1234F1Z8
1 Cotton Kurti Blue
Medium 620520 1 Rs.499.00 Rs.50.00 Rs.427.62 IGST @5.0% :Rs.21.38 Rs.449.00";

    fn result() -> ExtractionResult {
        match MeeshoExtractor.extract_from(&Acquired::from_text(INVOICE), "m.pdf").unwrap() {
            ExtractionOutput::Invoice(result) => result,
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_header_with_sentinel() {
        let result = result();
        let summary = result.invoice_summary();
        let value = |field: &str| {
            summary
                .rows()
                .iter()
                .find(|r| r[0] == field)
                .map(|r| r[1].clone())
        };

        assert_eq!(value("Bill To").as_deref(), Some("Kavya Iyer 14 Temple Street Chennai"));
        assert_eq!(value("Invoice Number").as_deref(), Some("MSH7781"));
        assert_eq!(value("Seller Name").as_deref(), Some("Trendy Threads"));
        assert_eq!(value("Seller Address").as_deref(), Some("Sold by: Trendy Threads Plot 9, Surat Gujarat 395003"));
        assert_eq!(value("Seller GSTIN").as_deref(), Some("24ABCDE1234F1Z8"));
        assert_eq!(value("Place of Supply").as_deref(), Some("N/A"));
    }

    #[test]
    fn test_multiline_item() {
        let result = result();
        let items = result.item_details();
        assert_eq!(items.len(), 1);
        assert_eq!(items.get(0, "Description"), Some("Cotton Kurti Blue Medium"));
        assert_eq!(items.get(0, "HSN"), Some("620520"));
        assert_eq!(items.get(0, "Taxes"), Some("21.38"));
        assert_eq!(items.get(0, "Total"), Some("449.00"));
    }
}
