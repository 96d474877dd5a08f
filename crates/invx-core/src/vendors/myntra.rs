//! Myntra fashion invoices.
//!
//! One PDF may bundle several tax invoices (product and platform fee), so
//! invoice numbers are collected from every section, sellers are numbered,
//! and the financial summary sums every `TOTAL` line.

use std::ops::RangeInclusive;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use tracing::warn;

use super::rules::{FieldExtractor, FieldRule, HeaderBuilder, clean_text, format_amount, parse_amount, split_tax};
use super::{VendorExtractor, require_text};
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

const NOT_FOUND: &str = "Not found";

lazy_static! {
    static ref ORDER_NUMBER: FieldRule =
        FieldRule::new("order_number", &[r"Order Number:\s*(\S+)", r"Order Number\s*(\S+)"]);
    static ref INVOICE_NUMBER: FieldRule = FieldRule::new("invoice_numbers", &[r"Invoice Number:\s*(\S+)"]);
    static ref DETAILS: Vec<FieldRule> = vec![
        FieldRule::new("packet_id", &[r"PacketID:\s*(\S+)"]),
        FieldRule::new(
            "invoice_date",
            &[
                r"Invoice Date:\s*(\d{1,2}\s+\w+\s+\d{4})",
                r"Date:\s*(\d{1,2}\s+\w+\s+\d{4})",
                r"Invoice Date:\s*(\d{1,2}[/-]\d{1,2}[/-]\d{4})",
            ],
        ),
        FieldRule::new("order_date", &[r"Order Date:\s*(\d{1,2}\s+\w+\s+\d{4})"]),
        FieldRule::new("nature_of_transaction", &[r"Nature of Transaction:\s*([^\n]+)"]),
        FieldRule::new("place_of_supply", &[r"Place of Supply:\s*([^\n]+)"]),
        FieldRule::new("nature_of_supply", &[r"Nature of Supply:\s*([^\n]+)"]),
    ];
    static ref CUSTOMER_TYPE: FieldRule = FieldRule::new("customer_type", &[r"Customer Type:\s*([^\n]+)"]);

    static ref CUSTOMER_BLOCK: Regex = Regex::new(r"(?s)Bill to / Ship to:\s*(.*?)Customer Type:").unwrap();
    static ref PINCODE: Regex = Regex::new(r"(\d{6})").unwrap();
    static ref STATE: Regex = Regex::new(r"([A-Z]{2}),?\s*India").unwrap();

    static ref SELLER_BLOCK: Regex =
        Regex::new(r"(?s)Bill From:\s*(.*?)(?:Ship From:|GSTIN Number:|\z)").unwrap();
    static ref SELLER_GSTIN: Regex = Regex::new(r"GSTIN Number:\s*([A-Z0-9]+)").unwrap();
    static ref SELLER_CIN: Regex = Regex::new(r"CIN:\s*([A-Z0-9]+)").unwrap();

    static ref TOTALS: Regex = Regex::new(
        r"TOTAL\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)"
    ).unwrap();

    static ref SECTION: Regex = Regex::new("Tax Invoice").unwrap();
    static ref ITEM_PATTERNS: Vec<Regex> = [
        r"([A-Z0-9]+ - [^H]+?)",
        r"(Platform Fee)",
    ]
    .iter()
    .map(|description| {
        Regex::new(&format!(
            r"(?s){}\s+HSN:\s*(\d+),\s*([\d.]+)%\s*(IGST|CGST|SGST).*?(\d+)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)\s+Rs\s+([\d,]+\.?\d*)",
            description
        ))
        .unwrap()
    })
    .collect();
}

const ITEM_COLUMNS: [&str; 14] = [
    "product_description",
    "hsn_code",
    "tax_rate",
    "tax_type",
    "quantity",
    "gross_amount",
    "discount",
    "other_charges",
    "taxable_amount",
    "cgst_amount",
    "sgst_ugst_amount",
    "igst_amount",
    "cess_amount",
    "total_amount",
];

#[derive(Debug, Default)]
struct Seller {
    company_name: String,
    address: String,
    gstin: String,
    cin: String,
}

/// Amounts in capture groups `groups`, or `None` when any of them does not
/// parse. The offending value is logged and the match is skipped.
fn amounts(caps: &Captures<'_>, groups: RangeInclusive<usize>, context: &str) -> Option<Vec<Decimal>> {
    groups
        .map(|group| {
            let value = parse_amount(&caps[group]);
            if value.is_none() {
                let e = ExtractionError::Parse {
                    field: context.to_string(),
                    value: caps[group].to_string(),
                };
                warn!(vendor = "myntra", "Skipping {} match: {}", context, e);
            }
            value
        })
        .collect()
}

/// First line and the remaining lines of a block, blank lines skipped.
fn split_block(block: &str) -> (String, String) {
    let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next().map(clean_text).unwrap_or_default();
    let rest = clean_text(&lines.collect::<Vec<_>>().join(" "));
    (first, rest)
}

pub struct MyntraExtractor;

impl MyntraExtractor {
    fn customer(header: &mut HeaderBuilder, text: &str) {
        let mut name = None;
        let mut address = None;
        let mut pincode = None;
        let mut state = None;

        if let Some(caps) = CUSTOMER_BLOCK.captures(text) {
            let (first, rest) = split_block(&caps[1]);
            if !first.is_empty() {
                name = Some(first);
            }
            if !rest.is_empty() {
                pincode = PINCODE.captures(&rest).map(|c| c[1].to_string());
                state = STATE.captures(&rest).map(|c| c[1].to_string());
                address = Some(rest);
            }
        }

        header
            .set_or_sentinel("customer_name", name)
            .set_or_sentinel("full_address", address)
            .set_or_sentinel("pincode", pincode)
            .set_or_sentinel("state", state)
            .set_or_sentinel("customer_type", CUSTOMER_TYPE.extract(text));
    }

    fn sellers(text: &str) -> Vec<Seller> {
        let mut sellers: Vec<Seller> = SELLER_BLOCK
            .captures_iter(text)
            .map(|caps| {
                let (company_name, address) = split_block(&caps[1]);
                Seller {
                    company_name,
                    address,
                    ..Seller::default()
                }
            })
            .collect();

        for (seller, caps) in sellers.iter_mut().zip(SELLER_GSTIN.captures_iter(text)) {
            seller.gstin = caps[1].to_string();
        }
        for (seller, caps) in sellers.iter_mut().zip(SELLER_CIN.captures_iter(text)) {
            seller.cin = caps[1].to_string();
        }
        sellers
    }

    fn financial_summary(header: &mut HeaderBuilder, text: &str) {
        let totals: Vec<Vec<Decimal>> = TOTALS
            .captures_iter(text)
            .filter_map(|caps| amounts(&caps, 1..=6, "TOTAL"))
            .collect();
        if totals.is_empty() {
            return;
        }

        let mut sums = [Decimal::ZERO; 6];
        for row in &totals {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += *value;
            }
        }
        let [gross, discount, other, taxable, tax, grand] = sums;
        let effective_rate = if taxable.is_zero() {
            Decimal::ZERO
        } else {
            (tax / taxable * Decimal::ONE_HUNDRED).round_dp(2)
        };

        header
            .set("total_gross_amount", format_amount(gross))
            .set("total_discount", format_amount(discount))
            .set("total_other_charges", format_amount(other))
            .set("total_taxable_amount", format_amount(taxable))
            .set("total_tax_amount", format_amount(tax))
            .set("grand_total", format_amount(grand))
            .set("net_savings", format_amount(discount))
            .set("effective_tax_rate", format_amount(effective_rate));
    }

    fn items(text: &str) -> Table {
        let mut table = Table::new(ITEM_COLUMNS);

        for section in SECTION.split(text).filter(|s| !s.trim().is_empty()) {
            for pattern in ITEM_PATTERNS.iter() {
                for caps in pattern.captures_iter(section) {
                    let Some(values) = amounts(&caps, 6..=11, "item") else {
                        continue;
                    };
                    let [gross, discount, other, taxable, tax, total] = values[..] else {
                        continue;
                    };
                    let tax_type = clean_text(&caps[4]);
                    let split = split_tax(tax, &tax_type);

                    table.push_row([
                        clean_text(&caps[1]),
                        clean_text(&caps[2]),
                        caps[3].to_string(),
                        tax_type,
                        caps[5].to_string(),
                        format_amount(gross),
                        format_amount(discount),
                        format_amount(other),
                        format_amount(taxable),
                        format_amount(split.cgst),
                        format_amount(split.sgst),
                        format_amount(split.igst),
                        format_amount(Decimal::ZERO),
                        format_amount(total),
                    ]);
                }
            }
        }

        table
    }
}

impl VendorExtractor for MyntraExtractor {
    fn tag(&self) -> &'static str {
        "myntra"
    }

    fn label(&self) -> &'static str {
        "Myntra"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = require_text(acquired, file_name)?;

        let mut header = HeaderBuilder::new(NOT_FOUND);
        header.set_or_sentinel(ORDER_NUMBER.name(), ORDER_NUMBER.extract(&text));

        let invoice_numbers = INVOICE_NUMBER.extract_all(&text);
        header.set(
            INVOICE_NUMBER.name(),
            if invoice_numbers.is_empty() {
                NOT_FOUND.to_string()
            } else {
                invoice_numbers.join(", ")
            },
        );

        header.apply(&DETAILS, &text);
        Self::customer(&mut header, &text);

        let sellers = Self::sellers(&text);
        for (i, seller) in sellers.iter().enumerate() {
            let prefix = if sellers.len() > 1 {
                format!("seller_{}_", i + 1)
            } else {
                "seller_".to_string()
            };
            header
                .set(format!("{}company_name", prefix), seller.company_name.clone())
                .set(format!("{}address", prefix), seller.address.clone())
                .set(format!("{}gstin", prefix), seller.gstin.clone())
                .set(format!("{}cin", prefix), seller.cin.clone());
        }

        Self::financial_summary(&mut header, &text);

        Ok(ExtractionResult::new(header.to_row(), Self::items(&text)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INVOICE: &str = "\
Tax Invoice
Order Number: 1100223344
Invoice Number: MYN-INV-1
PacketID: PKT77
Invoice Date: 12 March 2024
Order Date: 10 March 2024
Nature of Transaction: Intra-State
Place of Supply: Karnataka
Bill to / Ship to: Rahul Verma
5th Cross, Indiranagar
Bengaluru 560038 KA, India
Customer Type: Unregistered
Bill From: Fashion Hub
Koramangala Bengaluru
Ship From: Warehouse 2
GSTIN Number: 29AAACF1234A1Z1
CIN: U12345KA2010PTC000001
ABC123 - Slim Fit Shirt HSN: 6205, 5.0% CGST+SGST 1 Rs 1,299.00 Rs 300.00 Rs 0.00 Rs 951.43 Rs 47.57 Rs 999.00
TOTAL Rs 1,299.00 Rs 300.00 Rs 0.00 Rs 951.43 Rs 47.57 Rs 999.00
Tax Invoice
Invoice Number: MYN-INV-2
Platform Fee HSN: 9985, 18.0% IGST 1 Rs 20.00 Rs 0.00 Rs 0.00 Rs 16.95 Rs 3.05 Rs 20.00
TOTAL Rs 20.00 Rs 0.00 Rs 0.00 Rs 16.95 Rs 3.05 Rs 20.00";

    fn result(text: &str) -> ExtractionResult {
        match MyntraExtractor.extract_from(&Acquired::from_text(text), "myntra.pdf").unwrap() {
            ExtractionOutput::Invoice(result) => result,
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_all_invoice_numbers_collected() {
        let result = result(INVOICE);
        let summary = result.invoice_summary();
        assert_eq!(summary.get(0, "invoice_numbers"), Some("MYN-INV-1, MYN-INV-2"));
        assert_eq!(summary.get(0, "order_number"), Some("1100223344"));
        assert_eq!(summary.get(0, "invoice_date"), Some("12 March 2024"));
        assert_eq!(summary.get(0, "nature_of_supply"), Some(NOT_FOUND));
    }

    #[test]
    fn test_customer_and_seller() {
        let result = result(INVOICE);
        let summary = result.invoice_summary();
        assert_eq!(summary.get(0, "customer_name"), Some("Rahul Verma"));
        assert_eq!(summary.get(0, "pincode"), Some("560038"));
        assert_eq!(summary.get(0, "state"), Some("KA"));
        assert_eq!(summary.get(0, "customer_type"), Some("Unregistered"));
        assert_eq!(summary.get(0, "seller_company_name"), Some("Fashion Hub"));
        assert_eq!(summary.get(0, "seller_address"), Some("Koramangala Bengaluru"));
        assert_eq!(summary.get(0, "seller_gstin"), Some("29AAACF1234A1Z1"));
        assert_eq!(summary.get(0, "seller_cin"), Some("U12345KA2010PTC000001"));
    }

    #[test]
    fn test_totals_summed_over_sections() {
        let result = result(INVOICE);
        let summary = result.invoice_summary();
        assert_eq!(summary.get(0, "total_gross_amount"), Some("1319.00"));
        assert_eq!(summary.get(0, "total_tax_amount"), Some("50.62"));
        assert_eq!(summary.get(0, "grand_total"), Some("1019.00"));
        assert_eq!(summary.get(0, "net_savings"), Some("300.00"));
        assert_eq!(summary.get(0, "effective_tax_rate"), Some("5.23"));
    }

    #[test]
    fn test_items_with_tax_split() {
        let result = result(INVOICE);
        let items = result.item_details();
        assert_eq!(items.len(), 2);

        assert_eq!(items.get(0, "product_description"), Some("ABC123 - Slim Fit Shirt"));
        assert_eq!(items.get(0, "tax_type"), Some("CGST"));
        assert_eq!(items.get(0, "cgst_amount"), Some("23.785"));
        assert_eq!(items.get(0, "sgst_ugst_amount"), Some("23.785"));
        assert_eq!(items.get(0, "igst_amount"), Some("0.00"));
        assert_eq!(items.get(0, "gross_amount"), Some("1299.00"));

        assert_eq!(items.get(1, "product_description"), Some("Platform Fee"));
        assert_eq!(items.get(1, "igst_amount"), Some("3.05"));
        assert_eq!(items.get(1, "cgst_amount"), Some("0.00"));
    }

    #[test]
    fn test_multiple_sellers_are_numbered() {
        let text = "Order Number: 1\nBill From: Seller One\nShip From: X\nBill From: Seller Two\nGSTIN Number: 29AB1\nGSTIN Number: 27CD2";
        let result = result(text);
        let summary = result.invoice_summary();
        assert_eq!(summary.get(0, "seller_1_company_name"), Some("Seller One"));
        assert_eq!(summary.get(0, "seller_2_company_name"), Some("Seller Two"));
        assert_eq!(summary.get(0, "seller_1_gstin"), Some("29AB1"));
        assert_eq!(summary.get(0, "seller_2_gstin"), Some("27CD2"));
        assert_eq!(summary.get(0, "invoice_numbers"), Some(NOT_FOUND));
        assert!(!result.has_items());
    }

    #[test]
    fn test_unparsable_amounts_skip_only_their_match() {
        let text = "\
Tax Invoice
Order Number: 1100223344
ABC123 - Slim Fit Shirt HSN: 6205, 5.0% IGST 1 Rs 1,299. Rs 300.00 Rs 0.00 Rs 951.43 Rs 47.57 Rs 999.00
XYZ9 - Socks HSN: 6115, 5.0% IGST 1 Rs , Rs 0.00 Rs 0.00 Rs 95.24 Rs 4.76 Rs 100.00
TOTAL Rs , Rs 0.00 Rs 0.00 Rs 95.24 Rs 4.76 Rs 100.00
TOTAL Rs 1,299. Rs 300.00 Rs 0.00 Rs 951.43 Rs 47.57 Rs 999.00";

        let result = result(text);
        let items = result.item_details();
        assert_eq!(items.len(), 1);
        assert_eq!(items.get(0, "product_description"), Some("ABC123 - Slim Fit Shirt"));
        assert_eq!(items.get(0, "gross_amount"), Some("1299.00"));

        let summary = result.invoice_summary();
        assert_eq!(summary.get(0, "total_gross_amount"), Some("1299.00"));
        assert_eq!(summary.get(0, "grand_total"), Some("999.00"));
    }
}
