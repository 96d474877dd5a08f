//! Swiggy Instamart grocery invoices.
//!
//! Items are read with a layout-assumption strategy: on the first page the
//! product description spans raw lines 11-13 (amounts on line 12) and the
//! shipping charge spans lines 14-16 (amounts on line 15). When the page is
//! shorter than that, or the amount line does not carry six numbers, the
//! assumption is reported with `warn!` and no row is produced.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::rules::{FieldRule, HeaderBuilder, clean_text};
use super::VendorExtractor;
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

lazy_static! {
    static ref FIELDS: Vec<FieldRule> = vec![
        FieldRule::new("Order Id", &[r"Order Id:\s*([A-Z0-9]+)"]),
        FieldRule::new("Order Date", &[r"Order Date:\s*([0-9\-:, PMA]+)"]),
        FieldRule::new("Invoice No", &[r"Invoice No:\s*([A-Z0-9]+)"]),
        FieldRule::new("Invoice Date", &[r"Invoice Date:\s*([0-9\-:, PMA]+)"]),
        FieldRule::new("GSTIN", &[r"GSTIN:\s*([A-Z0-9]+)"]),
        FieldRule::new("PAN", &[r"PAN:\s*([A-Z0-9]+)"]),
        FieldRule::new("Sold By", &[r"(?s)Sold By\s*(.*?)(?:Shipping ADDRESS|Billing Address)"]),
        FieldRule::new("Seller GST", &[r"\bGST:\s*([A-Z0-9]+)"]),
        FieldRule::new("Billing Address", &[r"(?s)Billing Address\s*(.*?)(?:Gross Taxable|Product Description)"]),
        FieldRule::new("Shipping Address", &[r"(?s)Shipping ADDRESS\s*(.*?)(?:Gross Taxable|Product Description)"]),
        FieldRule::new("Seller Registered Address", &[r"(?s)Seller Registered Address:\s*(.*?)Declaration"]),
        FieldRule::new("Total Qty", &[r"TOTAL QTY:\s*([0-9]+)"]),
        FieldRule::new("Total Price", &[r"TOTAL PRICE:\s*([0-9.]+)"]),
    ];

    static ref NUMBER: Regex = Regex::new(r"\d+\.\d+|\d+").unwrap();
    static ref HSN: Regex = Regex::new(r"HSN: (\d+)").unwrap();
    static ref IGST: Regex = Regex::new(r"IGST: (\d+%)").unwrap();
}

const ITEM_COLUMNS: [&str; 8] = [
    "Description",
    "HSN/Tax Info",
    "Qty",
    "Gross Amount",
    "Discount",
    "Taxable Value",
    "IGST Amount",
    "Total",
];

/// Raw line indexes the layout is assumed to follow.
const PRODUCT_LINES: [usize; 3] = [11, 12, 13];
const SHIPPING_LINES: [usize; 3] = [14, 15, 16];

pub struct InstamartExtractor;

impl InstamartExtractor {
    fn product_row(lines: &[&str]) -> Option<Vec<String>> {
        let [first, amounts, last] = PRODUCT_LINES.map(|i| lines[i]);
        let description = format!(
            "{} {}{}",
            first,
            amounts.split("HSN:").next().unwrap_or(""),
            last
        )
        .replace('|', "");

        let hsn = HSN.captures(amounts).map(|c| c[1].to_string());
        let igst = IGST.captures(amounts).map(|c| c[1].to_string());
        let tax_info = format!(
            "HSN: {} | IGST: {}",
            hsn.as_deref().unwrap_or("N/A"),
            igst.as_deref().unwrap_or("N/A")
        );

        let numbers: Vec<&str> = NUMBER.find_iter(amounts).map(|m| m.as_str()).collect();
        if numbers.len() < 6 {
            warn!(vendor = "instamart", "Product amount line {} has {} numbers, expected 6", PRODUCT_LINES[1], numbers.len());
            return None;
        }
        let tail = &numbers[numbers.len() - 6..];

        let mut row = vec![clean_text(&description), tax_info];
        row.extend(tail.iter().map(|n| n.to_string()));
        Some(row)
    }

    fn shipping_row(lines: &[&str]) -> Option<Vec<String>> {
        let [first, amounts, last] = SHIPPING_LINES.map(|i| lines[i]);
        let numbers: Vec<&str> = NUMBER.find_iter(amounts).map(|m| m.as_str()).collect();
        if numbers.len() < 6 {
            warn!(vendor = "instamart", "Shipping amount line {} has {} numbers, expected 6", SHIPPING_LINES[1], numbers.len());
            return None;
        }

        let mut row = vec![clean_text(&format!("{} {}", first, last)), String::new()];
        row.extend(numbers[..6].iter().map(|n| n.to_string()));
        Some(row)
    }

    /// Items by fixed line offsets on the first page.
    fn layout_items(page: &str) -> Table {
        let lines: Vec<&str> = page.split('\n').collect();
        let mut table = Table::new(ITEM_COLUMNS);

        if lines.len() <= PRODUCT_LINES[2] {
            let e = ExtractionError::Layout(format!(
                "first page has {} lines, product expected at lines {}-{}",
                lines.len(),
                PRODUCT_LINES[0],
                PRODUCT_LINES[2]
            ));
            warn!(vendor = "instamart", "{}", e);
            return table;
        }
        if let Some(row) = Self::product_row(&lines) {
            table.push_row(row);
        }

        if lines.len() <= SHIPPING_LINES[2] {
            let e = ExtractionError::Layout(format!(
                "first page has {} lines, shipping expected at lines {}-{}",
                lines.len(),
                SHIPPING_LINES[0],
                SHIPPING_LINES[2]
            ));
            warn!(vendor = "instamart", "{}", e);
            return table;
        }
        if let Some(row) = Self::shipping_row(&lines) {
            table.push_row(row);
        }

        table
    }
}

impl VendorExtractor for InstamartExtractor {
    fn tag(&self) -> &'static str {
        "instamart"
    }

    fn label(&self) -> &'static str {
        "Swiggy Instamart"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let page = acquired.page(1);
        if page.trim().is_empty() {
            return Err(ExtractionError::NoText(file_name.to_string()));
        }

        let mut header = HeaderBuilder::new("");
        header.apply(&FIELDS, page);

        let items = Self::layout_items(page);
        Ok(ExtractionResult::new(header.to_field_value(), items).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "\
Tax Invoice
Order Id: 1234ABCD
Order Date: 01-07-2024, 10:15 AM
Invoice No: IM5566
Invoice Date: 01-07-2024, 10:20 AM
Sold By Fresh Mart Pvt Ltd
Billing Address Anita Rao
MG Road Bengaluru
Product Description
GSTIN: 29ABCDE1234F1Z5
Qty Gross Discount Taxable IGST Total
Amul Taka Butter 500g |
Pouch HSN: 0405 IGST: 12% 2 560.00 20.00 482.14 57.86 540.00
Pack
Handling and
1 25.00 0.00 21.19 3.81 25.00
Delivery Fee
TOTAL QTY: 3
TOTAL PRICE: 565.00";

    fn result(text: &str) -> ExtractionResult {
        match InstamartExtractor.extract_from(&Acquired::from_text(text), "im.pdf").unwrap() {
            ExtractionOutput::Invoice(result) => result,
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_field_value_header() {
        let result = result(PAGE);
        let summary = result.invoice_summary();
        assert_eq!(summary.columns(), ["Field", "Value"]);
        assert_eq!(summary.len(), FIELDS.len());
        assert_eq!(summary.rows()[0], vec!["Order Id", "1234ABCD"]);
        assert_eq!(summary.rows()[2], vec!["Invoice No", "IM5566"]);
        assert_eq!(summary.rows()[6], vec!["Sold By", "Fresh Mart Pvt Ltd"]);
        assert_eq!(summary.rows()[8], vec!["Billing Address", "Anita Rao MG Road Bengaluru"]);
        assert_eq!(summary.rows()[12], vec!["Total Price", "565.00"]);
    }

    #[test]
    fn test_layout_items() {
        let result = result(PAGE);
        let items = result.item_details();
        assert_eq!(items.len(), 2);
        assert_eq!(items.get(0, "Description"), Some("Amul Taka Butter 500g Pouch Pack"));
        assert_eq!(items.get(0, "HSN/Tax Info"), Some("HSN: 0405 | IGST: 12%"));
        assert_eq!(items.get(0, "Qty"), Some("2"));
        assert_eq!(items.get(0, "Total"), Some("540.00"));
        assert_eq!(items.get(1, "Description"), Some("Handling and Delivery Fee"));
        assert_eq!(items.get(1, "Gross Amount"), Some("25.00"));
    }

    #[test]
    fn test_short_page_violates_layout() {
        let result = result("Order Id: X1\nInvoice No: Y2\nTOTAL PRICE: 10.00");
        assert!(!result.has_items());
        assert_eq!(result.invoice_summary().rows()[0], vec!["Order Id", "X1"]);
    }
}
