//! Reliance Digital retail invoices. Everything is read from the first page.

use lazy_static::lazy_static;
use regex::Regex;

use super::rules::{FieldExtractor, FieldRule, HeaderBuilder, clean_text};
use super::{VendorExtractor, source_name};
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

lazy_static! {
    static ref FIELDS: Vec<FieldRule> = vec![
        FieldRule::new("Invoice Number", &[r"Tax Invoice No:\s*(D\d+[A-Z0-9]*)"]),
        FieldRule::new("Invoice Date", &[r"Dated:\s*(\d{2}-\d{2}-\d{4})"]),
        FieldRule::new("Seller", &[r"(?s)Seller/Consignor:\s*(.*?)\s*Tax Invoice No"]),
    ];
    static ref MOBILE: FieldRule = FieldRule::new("Buyer Mobile", &[r"Mobile\s*:\s*(\d+)"]);
    static ref TOTAL: FieldRule = FieldRule::new(
        "Total Amount",
        &[
            r"Total Invoice Value[\s\S]*?([\d,]+\.\d+)",
            r"Total in Words\s*:[^\n]*\n[^\n]*?([\d,]+\.\d+)",
        ],
    );

    /// Name on the line after the label, address on the line after that.
    static ref RECIPIENT: Regex = Regex::new(r"Recipient Address:\s*(.*?)\n(.*?)\n").unwrap();
}

pub struct RelianceDigitalExtractor;

impl VendorExtractor for RelianceDigitalExtractor {
    fn tag(&self) -> &'static str {
        "reliance_digital"
    }

    fn label(&self) -> &'static str {
        "Reliance Digital"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = acquired.page(1);
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText(file_name.to_string()));
        }

        let mut header = HeaderBuilder::new("");
        header.apply(&FIELDS, text);

        let recipient = RECIPIENT.captures(text);
        header
            .set_or_sentinel("Buyer Name", recipient.as_ref().map(|c| clean_text(&c[1])))
            .set_or_sentinel("Buyer Address", recipient.as_ref().map(|c| clean_text(&c[2])))
            .set_or_sentinel("Buyer Mobile", MOBILE.extract(text))
            .set_or_sentinel("Total Amount", TOTAL.extract(text));

        let mut items = acquired
            .tables_on_page(1)
            .next()
            .map(|t| Table::from_grid(&t.cells))
            .unwrap_or_default();
        if !items.is_empty() {
            items = items.with_constant_column("Source_File", source_name(file_name));
        }

        Ok(ExtractionResult::new(header.to_row(), items).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE_ONE: &str = "\
Seller/Consignor: Reliance Retail Ltd
Andheri East, Mumbai
Tax Invoice No: D123456AB7
Dated: 14-08-2024
Recipient Address: Priya Shah
22 Hill Road, Bandra
Mobile : 9820012345
| Sl | Description | Qty | Value |
| 1 | LED TV 43in | 1 | 28,990.00 |
Total Invoice Value
Rs 28,990.00";

    fn result(text: &str) -> ExtractionResult {
        match RelianceDigitalExtractor.extract_from(&Acquired::from_text(text), "rd.pdf").unwrap() {
            ExtractionOutput::Invoice(result) => result,
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_header_from_first_page() {
        let result = result(PAGE_ONE);
        let summary = result.invoice_summary();
        assert_eq!(
            summary.columns(),
            ["Invoice Number", "Invoice Date", "Seller", "Buyer Name", "Buyer Address", "Buyer Mobile", "Total Amount"]
        );
        assert_eq!(summary.get(0, "Invoice Number"), Some("D123456AB7"));
        assert_eq!(summary.get(0, "Seller"), Some("Reliance Retail Ltd Andheri East, Mumbai"));
        assert_eq!(summary.get(0, "Buyer Name"), Some("Priya Shah"));
        assert_eq!(summary.get(0, "Buyer Address"), Some("22 Hill Road, Bandra"));
        assert_eq!(summary.get(0, "Total Amount"), Some("28,990.00"));
    }

    #[test]
    fn test_items_from_first_table() {
        let result = result(PAGE_ONE);
        let items = result.item_details();
        assert_eq!(items.columns(), ["Sl", "Description", "Qty", "Value", "Source_File"]);
        assert_eq!(items.get(0, "Description"), Some("LED TV 43in"));
    }

    #[test]
    fn test_later_pages_ignored() {
        let text = "Tax Invoice No: D1\u{c}| A | B |\n| 1 | 2 |";
        let result = result(text);
        assert!(!result.has_items());
        assert_eq!(result.invoice_summary().get(0, "Invoice Number"), Some("D1"));
    }
}
