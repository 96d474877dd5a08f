//! Turns a PDF on disk into page text and candidate tables.
//!
//! Acquisition never fails: every backend failure degrades to "no text" or
//! "no tables" and is logged.

mod layout;
mod ocr;
mod tables;

pub use layout::LayoutTableFinder;
pub use ocr::{OcrBackend, load_backend};
#[cfg(feature = "ocr")]
pub use ocr::PureOcrBackend;
pub use tables::{Grid, RuledTableBackend, StreamTableBackend, TableBackend, TableChain, TableGrid};

use std::path::Path;

use tracing::{debug, info, warn};

use crate::models::config::InvxConfig;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Page text and tables read from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acquired {
    pages: Vec<String>,
    tables: Vec<TableGrid>,
}

impl Acquired {
    pub fn new(pages: Vec<String>, tables: Vec<TableGrid>) -> Self {
        Self { pages, tables }
    }

    /// Build from plain text, splitting pages on form feeds and detecting
    /// tables with the default chain.
    pub fn from_text(text: &str) -> Self {
        let pages = split_pages(text);
        let tables = TableChain::default().detect(&pages);
        Self { pages, tables }
    }

    /// Page texts in page order.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Text of a page (1-indexed); empty when the page does not exist.
    pub fn page(&self, number: usize) -> &str {
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// All pages joined with newlines.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    /// Detected tables in page order.
    pub fn tables(&self) -> &[TableGrid] {
        &self.tables
    }

    /// Tables found on one page (1-indexed).
    pub fn tables_on_page(&self, page: u32) -> impl Iterator<Item = &TableGrid> {
        self.tables.iter().filter(move |t| t.page == page)
    }

    /// No text on any page.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

fn split_pages(text: &str) -> Vec<String> {
    text.split('\u{c}').map(str::to_string).collect()
}

/// Reads a document into [`Acquired`].
pub trait Acquirer: Send + Sync {
    /// Never fails; unreadable input yields empty pages and no tables.
    fn acquire(&self, path: &Path) -> Acquired;
}

/// Production acquirer: lopdf page text, pdf-extract fallback, OCR last.
/// Tables come from text-run geometry, with the text-based chain covering
/// pages where geometry finds nothing.
pub struct PdfAcquirer {
    max_pages: usize,
    layout: LayoutTableFinder,
    tables: TableChain,
    ocr: Option<Box<dyn OcrBackend>>,
}

impl PdfAcquirer {
    /// Build from configuration, loading OCR models when available.
    pub fn new(config: &InvxConfig) -> Self {
        let ocr = match load_backend(&config.ocr) {
            Ok(backend) => Some(backend),
            Err(e) => {
                debug!("OCR fallback disabled: {}", e);
                None
            }
        };

        Self {
            max_pages: config.pdf.max_pages,
            layout: LayoutTableFinder::new(&config.tables),
            tables: TableChain::from_config(&config.tables),
            ocr,
        }
    }

    /// Replace the OCR backend.
    pub fn with_ocr(mut self, ocr: Option<Box<dyn OcrBackend>>) -> Self {
        self.ocr = ocr;
        self
    }

    fn whole_document_pages(&self, extractor: &PdfExtractor) -> Vec<String> {
        match extractor.extract_text() {
            Ok(text) => {
                let mut pages = split_pages(&text);
                if self.max_pages > 0 {
                    pages.truncate(self.max_pages);
                }
                pages
            }
            Err(e) => {
                debug!("pdf-extract fallback failed: {}", e);
                Vec::new()
            }
        }
    }

    fn ocr_pages(&self, extractor: &PdfExtractor) -> Vec<String> {
        let Some(ocr) = &self.ocr else {
            debug!("No OCR backend, document stays blank");
            return Vec::new();
        };

        extractor
            .page_numbers()
            .map(|page| {
                let images = extractor.extract_images(page).unwrap_or_default();
                images
                    .iter()
                    .filter_map(|image| match ocr.recognize(image) {
                        Ok(text) => Some(text),
                        Err(e) => {
                            warn!("OCR failed on page {}: {}", page, e);
                            None
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect()
    }

    fn layout_tables(&self, extractor: &PdfExtractor) -> Vec<TableGrid> {
        extractor
            .page_numbers()
            .zip(extractor.extract_runs())
            .flat_map(|(page, runs)| {
                self.layout
                    .detect(&runs)
                    .into_iter()
                    .map(move |cells| TableGrid { page, cells })
            })
            .filter(|table| !table.is_blank())
            .collect()
    }

    /// Geometry tables per page; text-chain tables for the remaining pages.
    fn detect_tables(&self, extractor: &PdfExtractor, pages: &[String]) -> Vec<TableGrid> {
        let mut tables = self.layout_tables(extractor);
        let covered: Vec<u32> = tables.iter().map(|t| t.page).collect();
        debug!("Layout finder found tables on pages {:?}", covered);

        tables.extend(
            self.tables
                .detect(pages)
                .into_iter()
                .filter(|t| !covered.contains(&t.page)),
        );
        tables.sort_by_key(|t| t.page);
        tables
    }
}

fn all_blank(pages: &[String]) -> bool {
    pages.iter().all(|p| p.trim().is_empty())
}

impl Acquirer for PdfAcquirer {
    fn acquire(&self, path: &Path) -> Acquired {
        let extractor = match PdfExtractor::open(path, self.max_pages) {
            Ok(extractor) => extractor,
            Err(e) => {
                warn!("Could not open {}: {}", path.display(), e);
                return Acquired::default();
            }
        };

        let mut pages = extractor.extract_pages();
        if all_blank(&pages) {
            debug!("No text via lopdf, trying pdf-extract");
            pages = self.whole_document_pages(&extractor);
        }
        if all_blank(&pages) {
            info!("No text layer in {}, trying OCR", path.display());
            pages = self.ocr_pages(&extractor);
        }
        if all_blank(&pages) {
            warn!("No text could be acquired from {}", path.display());
            return Acquired::default();
        }

        let tables = self.detect_tables(&extractor, &pages);
        debug!(
            "Acquired {} pages and {} tables from {}",
            pages.len(),
            tables.len(),
            path.display()
        );
        Acquired::new(pages, tables)
    }
}
