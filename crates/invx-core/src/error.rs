//! Error types for the invx-core library.

use thiserror::Error;

/// Main error type for the invx library.
#[derive(Error, Debug)]
pub enum InvxError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Vendor extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Workbook export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration file could not be parsed or serialized.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// Table detection backend failed.
    #[error("table detection failed ({backend}): {reason}")]
    TableDetection { backend: &'static str, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// OCR support was not compiled in.
    #[error("OCR support is not enabled")]
    Unavailable,

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors raised inside a vendor extractor.
///
/// These never cross the extractor boundary: `VendorExtractor::extract`
/// logs them and returns an empty output instead.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The input file does not exist in the uploads directory.
    #[error("{0} not found")]
    FileNotFound(String),

    /// Acquisition produced no text at all.
    #[error("no extractable text in {0}")]
    NoText(String),

    /// A fixed-offset layout assumption did not hold.
    #[error("layout assumption violated: {0}")]
    Layout(String),

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },
}

/// Errors related to workbook export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Workbook writer rejected the data or failed to save.
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// Could not prepare the output directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing in the output can be written as a fallback.
    #[error("no fallback sheet available")]
    NoFallback,
}

/// Result type for the invx library.
pub type Result<T> = std::result::Result<T, InvxError>;
