//! Building blocks shared by the vendor extractors: ordered regex field
//! rules, header assembly with a fixed sentinel, and amount arithmetic.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use crate::models::Table;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref CURRENCY: Regex = Regex::new(r"(?i)₹|\bRs\.?|\bINR\b|,|\s").unwrap();
}

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A named header field with ordered candidate patterns.
///
/// The first pattern that matches wins. The value is the first capture
/// group that participated in the match, or the whole match when the
/// pattern has no groups. Values are whitespace-collapsed.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: &'static str,
    patterns: Vec<Regex>,
}

impl FieldRule {
    /// Compile a rule from pattern sources.
    ///
    /// Panics on an invalid pattern; rules are built once in static tables.
    pub fn new(name: &'static str, patterns: &[&str]) -> Self {
        Self {
            name,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("bad pattern for {}: {}", name, e)))
                .collect(),
        }
    }

    /// Column name the value is stored under.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// First participating capture group, else the whole match.
pub fn capture_value(caps: &Captures<'_>) -> String {
    let value = caps
        .iter()
        .skip(1)
        .flatten()
        .next()
        .or_else(|| caps.get(0))
        .map(|m| m.as_str())
        .unwrap_or("");
    clean_text(value)
}

impl FieldExtractor for FieldRule {
    type Output = String;

    fn extract(&self, text: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|p| p.captures(text))
            .map(|caps| capture_value(&caps))
    }

    fn extract_all(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .flat_map(|p| p.captures_iter(text).map(|caps| capture_value(&caps)))
            .collect()
    }
}

/// Ordered single-row header with a vendor-wide sentinel for misses.
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    sentinel: &'static str,
    fields: Vec<(String, String)>,
}

impl HeaderBuilder {
    pub fn new(sentinel: &'static str) -> Self {
        Self {
            sentinel,
            fields: Vec::new(),
        }
    }

    /// Set a field, keeping its original position if already present.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let (name, value) = (name.into(), value.into());
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Set a field to a value, or to the sentinel when absent.
    pub fn set_or_sentinel(&mut self, name: impl Into<String>, value: Option<String>) -> &mut Self {
        let value = value.unwrap_or_else(|| self.sentinel.to_string());
        self.set(name, value)
    }

    /// Apply each rule to `text` under its own name.
    pub fn apply(&mut self, rules: &[FieldRule], text: &str) -> &mut Self {
        for rule in rules {
            self.set_or_sentinel(rule.name(), rule.extract(text));
        }
        self
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a field holds a real value rather than the sentinel.
    pub fn is_found(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| !v.is_empty() && v != self.sentinel)
    }

    pub fn sentinel(&self) -> &'static str {
        self.sentinel
    }

    /// One row, one column per field.
    pub fn to_row(&self) -> Table {
        Table::single_row(self.fields.iter().cloned())
    }

    /// `Field`/`Value` layout, one row per field.
    pub fn to_field_value(&self) -> Table {
        Table::field_value(self.fields.iter().cloned())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Collapse whitespace runs (newlines included) and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Parse a rupee amount such as `₹1,299.00` or `Rs. 45`.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let cleaned = CURRENCY.replace_all(text, "");
    // `1,299.` is a whole amount.
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// Render a computed amount with at least two decimals, keeping any extra
/// precision an exact split produced (`23.785` stays as is).
pub fn format_amount(amount: Decimal) -> String {
    let amount = amount.normalize();
    if amount.scale() <= 2 {
        format!("{:.2}", amount)
    } else {
        amount.to_string()
    }
}

/// A tax amount divided between central/state or integrated GST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSplit {
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
}

/// Split a combined tax amount. IGST is carried whole; anything else is
/// halved into CGST and SGST with exact decimal division.
pub fn split_tax(amount: Decimal, tax_type: &str) -> TaxSplit {
    if tax_type.trim().eq_ignore_ascii_case("IGST") {
        TaxSplit {
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            igst: amount,
        }
    } else {
        let half = amount / Decimal::TWO;
        TaxSplit {
            cgst: half,
            sgst: half,
            igst: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_first_pattern_wins() {
        let rule = FieldRule::new("Total", &[r"Grand Total\s*:\s*([\d.]+)", r"Total\s*:\s*([\d.]+)"]);
        let text = "Total: 10.00\nGrand Total: 12.00";
        assert_eq!(rule.extract(text).as_deref(), Some("12.00"));
        assert_eq!(rule.extract("nothing here"), None);
    }

    #[test]
    fn test_invoice_number_pattern() {
        let rule = FieldRule::new("invoice_number", &[r"Invoice Number\s*[:\-]?\s*([A-Z0-9\-]+)"]);
        assert_eq!(
            rule.extract("Invoice Number: INV-2024-001\nDate: 01-01-2024").as_deref(),
            Some("INV-2024-001")
        );
    }

    #[test]
    fn test_dotall_value_is_collapsed() {
        let rule = FieldRule::new("Seller", &[r"(?s)Seller:\s*(.*?)\s*GSTIN"]);
        let text = "Seller: Acme Retail\n12 Main Road\nPune GSTIN 27ABC";
        assert_eq!(rule.extract(text).as_deref(), Some("Acme Retail 12 Main Road Pune"));
    }

    #[test]
    fn test_extract_all_and_alternation() {
        let rule = FieldRule::new("Invoice", &[r"Invoice No:\s*(\S+)|Bill No:\s*(\S+)"]);
        let text = "Invoice No: A1\nBill No: B2\nInvoice No: C3";
        assert_eq!(rule.extract_all(text), vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn test_header_builder_sentinel_and_order() {
        let rules = [
            FieldRule::new("Order ID", &[r"Order ID:\s*(\d+)"]),
            FieldRule::new("GSTIN", &[r"GSTIN:\s*(\w+)"]),
        ];
        let mut header = HeaderBuilder::new("N/A");
        header.apply(&rules, "Order ID: 42").set("Vendor", "Zomato");

        assert!(header.is_found("Order ID"));
        assert!(!header.is_found("GSTIN"));
        let table = header.to_row();
        assert_eq!(table.columns(), ["Order ID", "GSTIN", "Vendor"]);
        assert_eq!(table.rows(), [vec!["42", "N/A", "Zomato"]]);
    }

    #[test]
    fn test_header_set_keeps_position() {
        let mut header = HeaderBuilder::new("");
        header.set("A", "1").set("B", "2").set("A", "3");
        assert_eq!(header.to_field_value().rows(), [vec!["A", "3"], vec!["B", "2"]]);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("₹1,299.50"), Some(dec("1299.50")));
        assert_eq!(parse_amount("Rs. 45"), Some(dec("45")));
        assert_eq!(parse_amount("INR 2,00,000.00"), Some(dec("200000.00")));
        assert_eq!(parse_amount("Rs 1,299."), Some(dec("1299")));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount(","), None);
        assert_eq!(parse_amount("."), None);
    }

    #[test]
    fn test_split_tax_halves() {
        let split = split_tax(dec("100.00"), "CGST+SGST");
        assert_eq!(format_amount(split.cgst), "50.00");
        assert_eq!(format_amount(split.sgst), "50.00");
        assert_eq!(split.igst, Decimal::ZERO);
    }

    #[test]
    fn test_split_tax_igst() {
        let split = split_tax(dec("100.00"), "IGST");
        assert_eq!(format_amount(split.igst), "100.00");
        assert_eq!(format_amount(split.cgst), "0.00");
        assert_eq!(format_amount(split.sgst), "0.00");
    }

    #[test]
    fn test_split_tax_odd_amount_is_exact() {
        let split = split_tax(dec("0.01"), "");
        assert_eq!(split.cgst, dec("0.005"));
        assert_eq!(format_amount(split.sgst), "0.005");
        assert_eq!(split.cgst + split.sgst, dec("0.01"));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\n  b\tc  "), "a b c");
    }
}
