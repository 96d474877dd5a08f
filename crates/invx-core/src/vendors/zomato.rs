//! Zomato restaurant invoices.
//!
//! The restaurant header lives on the first page; each field has an ordered
//! list of candidate patterns. Items come from the first detected table,
//! whose real header row is located by its `Particulars`/`Item` cell.

use lazy_static::lazy_static;

use super::rules::{FieldExtractor, FieldRule, HeaderBuilder};
use super::VendorExtractor;
use crate::acquire::{Acquired, Grid};
use crate::error::ExtractionError;
use crate::models::{ExtractionOutput, ExtractionResult, Table};

const NA: &str = "N/A";

lazy_static! {
    static ref FIELDS: Vec<FieldRule> = vec![
        FieldRule::new(
            "Legal Entity Name",
            &[
                r"(?is)Legal Entity Name[:\s]*(.+?)(?:\n|Restaurant Name|\z)",
                r"(?is)Legal Entity[:\s]*(.+?)(?:\n|Restaurant|\z)",
            ],
        ),
        FieldRule::new(
            "Restaurant Name",
            &[
                r"(?is)Restaurant Name[:\s]*(.+?)(?:\n|Restaurant Address|Address|\z)",
                r"(?is)Restaurant[:\s]*(.+?)(?:\n|Address|\z)",
            ],
        ),
        FieldRule::new(
            "Restaurant Address",
            &[
                r"(?is)Restaurant Address[:\s]*(.+?)(?:\n|Restaurant GSTIN|GSTIN|\z)",
                r"(?is)Address[:\s]*(.+?)(?:\n|GSTIN|\z)",
            ],
        ),
        FieldRule::new(
            "Restaurant GSTIN",
            &[r"(?is)Restaurant GSTIN[:\s]*([A-Z0-9]{15})", r"(?is)GSTIN[:\s]*([A-Z0-9]{15})"],
        ),
        FieldRule::new(
            "Restaurant FSSAI",
            &[r"(?is)Restaurant FSSAI[:\s]*(\d{14})", r"(?is)FSSAI[:\s]*(\d{14})"],
        ),
        FieldRule::new(
            "Invoice No.",
            &[r"(?is)Invoice No\.?[:\s]*([A-Z0-9\-/]+)", r"(?is)Invoice Number[:\s]*([A-Z0-9\-/]+)"],
        ),
        FieldRule::new(
            "Invoice Date",
            &[
                r"(?is)Invoice Date[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{4})",
                r"(?is)Date[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{4})",
            ],
        ),
        FieldRule::new(
            "Customer Name",
            &[
                r"(?is)Customer Name[:\s]*(.+?)(?:\n|Delivery Address|Address|\z)",
                r"(?is)Customer[:\s]*(.+?)(?:\n|Address|\z)",
            ],
        ),
        FieldRule::new("Order ID", &[r"(?is)Order ID[:\s]*(\d+)", r"(?is)Order[:\s]*(\d+)"]),
        FieldRule::new("HSN Code", &[r"(?is)HSN Code[:\s]*(\d+)", r"(?is)HSN[:\s]*(\d+)"]),
    ];

    static ref DELIVERY_ADDRESS: FieldRule = FieldRule::new(
        "Delivery Address",
        &[
            r"(?is)Delivery Address[:\s]*(.+?)(?:\n.*?State|State name|\z)",
            r"(?is)Address[:\s]*(.+?)(?:\n.*?State|\z)",
        ],
    );

    static ref TRAILING: Vec<FieldRule> = vec![
        FieldRule::new(
            "State name & Place of Supply",
            &[r"(?is)State name.*?Place of Supply[:\s]*(.+?)(?:\n|\z)"],
        ),
        FieldRule::new("Service Description", &[r"(?is)Service Description[:\s]*(.+?)(?:\n|Amount|\z)"]),
        FieldRule::new("Amount (in words)", &[r"(?is)Amount.*?words\)?[:\s]*(.+?)(?:\n|Order|\z)"]),
    ];
}

pub struct ZomatoExtractor;

impl ZomatoExtractor {
    /// Delivery address needs more than three characters to count.
    fn delivery_address(text: &str) -> Option<String> {
        DELIVERY_ADDRESS
            .extract_all(text)
            .into_iter()
            .find(|value| value.chars().count() > 3)
    }

    fn items(grid: &Grid) -> Table {
        let header_row = grid.iter().position(|row| {
            let joined = row.join(" ").to_lowercase();
            joined.contains("particulars") || joined.contains("item")
        });

        let table = match header_row {
            Some(idx) => Table::from_grid(&grid[idx..]),
            None => {
                let width = grid.iter().map(Vec::len).max().unwrap_or(0);
                let mut table = Table::new((0..width).map(|i| i.to_string()));
                for row in grid {
                    table.push_row(row.iter().map(|c| c.trim().to_string()));
                }
                table
            }
        };

        table.drop_empty_columns().dedupe_columns().drop_blank_rows()
    }
}

impl VendorExtractor for ZomatoExtractor {
    fn tag(&self) -> &'static str {
        "zomato"
    }

    fn label(&self) -> &'static str {
        "Zomato"
    }

    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError> {
        if acquired.is_blank() {
            return Err(ExtractionError::NoText(file_name.to_string()));
        }
        let page = acquired.page(1);

        let mut header = HeaderBuilder::new(NA);
        header
            .apply(&FIELDS, page)
            .set_or_sentinel(DELIVERY_ADDRESS.name(), Self::delivery_address(page))
            .apply(&TRAILING, page);

        let items = acquired
            .tables()
            .first()
            .map(|t| Self::items(&t.cells))
            .unwrap_or_default();

        Ok(ExtractionResult::new(header.to_row(), items).into())
    }
}
