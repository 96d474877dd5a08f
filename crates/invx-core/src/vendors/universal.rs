//! Catch-all extractor for invoices from unknown vendors.
//!
//! Header fields are searched with broad case-insensitive patterns; a match
//! only counts when its value is longer than two characters. Items come from
//! the detected tables when there are any, else from item-looking lines.

use std::collections::HashSet;

use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;

use super::rules::{FieldExtractor, FieldRule, HeaderBuilder, clean_text};
use super::{VendorExtractor, require_text};
use crate::acquire::Acquired;
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

const MAX_LINE_ITEMS: usize = 10;

lazy_static! {
    static ref FIELDS: Vec<FieldRule> = vec![
        FieldRule::new(
            "invoice_number",
            &[
                r"(?i)invoice\s*(?:no|number|#)[:\s]*([A-Z0-9\-/]+)",
                r"(?i)bill\s*(?:no|number)[:\s]*([A-Z0-9\-/]+)",
                r"(?i)receipt\s*(?:no|number)[:\s]*([A-Z0-9\-/]+)",
                r"(\d{10,})",
            ],
        ),
        FieldRule::new(
            "order_number",
            &[
                r"(?i)order\s*(?:no|number|id)[:\s]*([A-Z0-9\-/]+)",
                r"(?i)order[:\s]*([A-Z0-9\-/]+)",
                r"(?i)ref(?:erence)?\s*(?:no|number)[:\s]*([A-Z0-9\-/]+)",
            ],
        ),
        FieldRule::new(
            "date",
            &[
                r"(?i)date[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                r"(?i)date[:\s]*(\d{4}-\d{2}-\d{2})",
                r"(\d{1,2}\s+[A-Za-z]+\s+\d{4})",
                r"(\d{2}\.\d{2}\.\d{4})",
            ],
        ),
        FieldRule::new(
            "amount",
            &[
                r"(?i)total[:\s]*₹?\s*([0-9,]+\.?\d*)",
                r"(?i)amount[:\s]*₹?\s*([0-9,]+\.?\d*)",
                r"₹\s*([0-9,]+\.?\d*)",
                r"(?i)rs\.?\s*([0-9,]+\.?\d*)",
                r"(?i)inr\s*([0-9,]+\.?\d*)",
            ],
        ),
        FieldRule::new(
            "customer",
            &[
                r"(?i)(?:customer|bill\s*to|ship\s*to|sold\s*to)[:\s]*([A-Za-z\s]+)",
                r"(?i)name[:\s]*([A-Za-z\s]+)",
            ],
        ),
        FieldRule::new(
            "gst",
            &[
                r"(?i)gst(?:in)?[:\s]*([A-Z0-9]{15})",
                r"(?i)tax\s*id[:\s]*([A-Z0-9]{15})",
                r"([A-Z0-9]{2}[A-Z0-9]{10}[A-Z0-9]{3})",
            ],
        ),
        FieldRule::new(
            "seller",
            &[
                r"(?i)(?:sold\s*by|seller|vendor)[:\s]*([A-Za-z\s&.,()]+)",
                r"(?i)(?:from|by)[:\s]*([A-Za-z\s&.,()]+)",
            ],
        ),
        FieldRule::new(
            "address",
            &[r"(?i)address[:\s]*([A-Za-z0-9\s,.-]+)", r"(?i)([A-Za-z\s,.-]+\d{6})"],
        ),
    ];

    static ref COMPANY: FieldRule = FieldRule::new(
        "detected_company",
        &[
            r"([A-Z][A-Za-z\s&]+(?:LTD|LIMITED|PRIVATE|PVT|COMPANY|CORP|INC))",
            r"([A-Z][A-Za-z]+\.com)",
            r"([A-Z][A-Za-z\s]+(?:STORE|MART|SHOP|PHARMACY))",
        ],
    );

    /// `qty description amount`
    static ref QTY_FIRST: Regex =
        Regex::new(r"(\d+)\s+([A-Za-z][^0-9\n]{10,50}?)\s+₹?\s*([0-9,]+\.?\d*)").unwrap();
    /// `description qty amount`
    static ref QTY_AFTER: Regex =
        Regex::new(r"([A-Za-z][^0-9\n]{10,50}?)\s+(\d+)\s+₹?\s*([0-9,]+\.?\d*)").unwrap();
    /// `description amount`
    static ref NO_QTY: Regex = Regex::new(r"([A-Za-z][^0-9\n]{15,}?)\s+₹?\s*([0-9,]+\.?\d*)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LineItem {
    description: String,
    quantity: String,
    amount: String,
}

impl LineItem {
    fn is_plausible(&self) -> bool {
        self.description.chars().count() > 5 && !self.description.chars().all(|c| c.is_ascii_digit())
    }
}

pub struct UniversalExtractor;

impl UniversalExtractor {
    fn header(text: &str, file_name: &str, method: &str) -> Table {
        let mut header = HeaderBuilder::new("");
        header
            .set("filename", file_name)
            .set("extraction_method", method)
            .set("extraction_timestamp", Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

        for rule in FIELDS.iter() {
            let value = rule.extract_all(text).into_iter().find(|v| v.chars().count() > 2);
            header.set_or_sentinel(rule.name(), value);
        }
        header.set_or_sentinel(COMPANY.name(), COMPANY.extract(text));

        header.to_row().drop_empty_columns()
    }

    /// Item-looking lines, de-duplicated on description and amount.
    fn line_items(text: &str) -> Table {
        let mut items = Vec::new();

        for caps in QTY_FIRST.captures_iter(text) {
            items.push(LineItem {
                quantity: caps[1].to_string(),
                description: clean_text(&caps[2]),
                amount: caps[3].to_string(),
            });
        }
        for caps in QTY_AFTER.captures_iter(text) {
            items.push(LineItem {
                description: clean_text(&caps[1]),
                quantity: caps[2].to_string(),
                amount: caps[3].to_string(),
            });
        }
        for caps in NO_QTY.captures_iter(text) {
            items.push(LineItem {
                description: clean_text(&caps[1]),
                quantity: "1".to_string(),
                amount: caps[2].to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut table = Table::new(["description", "quantity", "amount"]);
        for item in items
            .into_iter()
            .filter(LineItem::is_plausible)
            .filter(|item| seen.insert((item.description.clone(), item.amount.clone())))
            .take(MAX_LINE_ITEMS)
        {
            table.push_row([item.description, item.quantity, item.amount]);
        }
        table
    }

    fn items(acquired: &Acquired, text: &str) -> Table {
        let tables: Vec<Table> = acquired
            .tables()
            .iter()
            .filter(|t| t.cells.len() > 1)
            .map(|t| Table::from_grid(&t.cells))
            .collect();

        let items = if tables.is_empty() {
            Self::line_items(text)
        } else {
            Table::concat(&tables)
        };
        items.drop_empty_columns()
    }
}

impl VendorExtractor for UniversalExtractor {
    fn tag(&self) -> &'static str {
        "universal"
    }

    fn label(&self) -> &'static str {
        "Universal (any vendor)"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        let text = require_text(acquired, file_name)?;

        let summary = Self::header(&text, file_name, self.tag());
        let items = Self::items(acquired, &text);

        Ok(ExtractionResult::new(summary, items).into())
    }
}
