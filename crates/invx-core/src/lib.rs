//! Core library for vendor invoice extraction.
//!
//! This crate provides:
//! - PDF acquisition (page text via lopdf, pdf-extract fallback, optional OCR)
//! - Table detection from text-run geometry, with a text-based fallback
//! - Per-vendor extractors behind a single trait, looked up by method name
//! - Workbook export of the extracted summary and line items
//! - A batch pipeline that reports a status per file and never aborts

pub mod acquire;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod registry;
pub mod validate;
pub mod vendors;

pub use acquire::{Acquired, Acquirer, PdfAcquirer};
pub use dispatch::Dispatcher;
pub use error::{InvxError, Result};
pub use export::Exporter;
pub use models::config::InvxConfig;
pub use models::{ExtractionOutput, ExtractionResult, ExtractionStatus, Status, Table};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::{BatchReport, Pipeline};
pub use registry::Registry;
pub use validate::{REQUIRED_FIELDS, validate_summary};
pub use vendors::VendorExtractor;
