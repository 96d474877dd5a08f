//! Per-vendor invoice extractors.
//!
//! Every vendor is an independent strategy behind [`VendorExtractor`]: it
//! receives acquired page text and tables and returns an
//! [`ExtractionOutput`]. Vendor formats are not related to each other, so
//! each module keeps its own pattern table and item heuristics.

pub mod rules;

mod amazon;
mod flipkart;
mod instamart;
mod meesho;
mod myntra;
mod onemg;
mod reliance_digital;
mod swiggy;
mod universal;
mod zomato;

pub use amazon::AmazonExtractor;
pub use flipkart::FlipkartExtractor;
pub use instamart::InstamartExtractor;
pub use meesho::MeeshoExtractor;
pub use myntra::MyntraExtractor;
pub use onemg::OneMgExtractor;
pub use reliance_digital::RelianceDigitalExtractor;
pub use swiggy::SwiggyExtractor;
pub use universal::UniversalExtractor;
pub use zomato::ZomatoExtractor;

use std::path::Path;

use tracing::{info, warn};

use crate::acquire::{Acquired, Acquirer};
use crate::error::ExtractionError;
use crate::models::ExtractionOutput;

/// An extractor for one vendor's invoice layout.
pub trait VendorExtractor: Send + Sync {
    /// Registry key, e.g. `amazon`.
    fn tag(&self) -> &'static str;

    /// Human-readable vendor name.
    fn label(&self) -> &'static str;

    /// Build the output from already-acquired content.
    fn extract_from(&self, acquired: &Acquired, file_name: &str) -> Result<ExtractionOutput, ExtractionError>;

    /// Acquire `file_name` from `uploads_dir` and extract it.
    ///
    /// Never fails: a missing file or an internal error yields an empty
    /// output, and the cause is logged.
    fn extract(&self, acquirer: &dyn Acquirer, uploads_dir: &Path, file_name: &str) -> ExtractionOutput {
        let path = uploads_dir.join(file_name);
        if !path.is_file() {
            warn!(vendor = self.tag(), "File not found: {}", path.display());
            return ExtractionOutput::empty();
        }

        let acquired = acquirer.acquire(&path);
        match self.extract_from(&acquired, file_name) {
            Ok(output) => {
                match &output {
                    ExtractionOutput::Invoice(result) => info!(
                        vendor = self.tag(),
                        "Processed {}: {} summary rows, {} items",
                        file_name,
                        result.invoice_summary().len(),
                        result.item_details().len()
                    ),
                    ExtractionOutput::Legacy(table) => {
                        info!(vendor = self.tag(), "Processed {}: {} rows", file_name, table.len())
                    }
                }
                output
            }
            Err(e) => {
                warn!(vendor = self.tag(), "Error processing {}: {}", file_name, e);
                ExtractionOutput::empty()
            }
        }
    }
}

/// Bail out of `extract_from` when acquisition produced no text.
pub(crate) fn require_text(acquired: &Acquired, file_name: &str) -> Result<String, ExtractionError> {
    if acquired.is_blank() {
        return Err(ExtractionError::NoText(file_name.to_string()));
    }
    Ok(acquired.text())
}

/// Base name of an upload, used for `Source_File` columns.
pub(crate) fn source_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

/// Every built-in vendor, in registration order.
pub fn builtin() -> Vec<Box<dyn VendorExtractor>> {
    vec![
        Box::new(OneMgExtractor),
        Box::new(SwiggyExtractor),
        Box::new(MyntraExtractor),
        Box::new(RelianceDigitalExtractor),
        Box::new(InstamartExtractor),
        Box::new(MeeshoExtractor),
        Box::new(ZomatoExtractor),
        Box::new(AmazonExtractor),
        Box::new(FlipkartExtractor),
        Box::new(UniversalExtractor),
    ]
}
