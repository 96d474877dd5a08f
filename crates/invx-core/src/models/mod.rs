//! Data models: tables, extraction results, and configuration.

pub mod config;
pub mod result;
pub mod table;

pub use result::{ExtractionOutput, ExtractionResult, ExtractionStatus, Status};
pub use table::Table;
