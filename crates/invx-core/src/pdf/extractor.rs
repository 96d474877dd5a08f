//! PDF text and image extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::layout::{self, TextRun};
use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    max_pages: usize,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            max_pages: 0,
        }
    }

    /// Limit how many leading pages are read (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Read a PDF from disk and load it. The file handle is released before
    /// this returns.
    pub fn open(path: &Path, max_pages: usize) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        let mut extractor = Self::new().with_max_pages(max_pages);
        extractor.load(&data)?;
        Ok(extractor)
    }

    /// Page numbers to read, honoring the page limit.
    pub fn page_numbers(&self) -> std::ops::RangeInclusive<u32> {
        let count = self.page_count();
        let limit = if self.max_pages == 0 {
            count
        } else {
            count.min(self.max_pages as u32)
        };
        1..=limit
    }

    /// Text of each page via lopdf's content-stream decoder. Pages that fail
    /// to decode come back blank.
    pub fn extract_pages(&self) -> Vec<String> {
        self.page_numbers()
            .map(|page| {
                self.extract_page_text(page).unwrap_or_else(|e| {
                    debug!("lopdf could not read page {}: {}", page, e);
                    String::new()
                })
            })
            .collect()
    }

    /// Positioned text runs of a page (1-indexed), in drawing order.
    pub fn extract_page_runs(&self, page: u32) -> Result<Vec<TextRun>> {
        let doc = self.document.as_ref().ok_or(PdfError::Parse("No document loaded".to_string()))?;
        let page_id = *doc.get_pages().get(&page).ok_or(PdfError::InvalidPage(page))?;

        let bytes = doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let content = panic::catch_unwind(AssertUnwindSafe(|| Content::decode(&bytes)))
            .map_err(|_| PdfError::TextExtraction(format!("lopdf panicked on page {}", page)))?
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let runs = layout::text_runs(&content.operations);
        trace!("Read {} text runs from page {}", runs.len(), page);
        Ok(runs)
    }

    /// Text runs of each page, honoring the page limit. Pages that fail to
    /// decode come back empty.
    pub fn extract_runs(&self) -> Vec<Vec<TextRun>> {
        self.page_numbers()
            .map(|page| {
                self.extract_page_runs(page).unwrap_or_else(|e| {
                    debug!("no text runs for page {}: {}", page, e);
                    Vec::new()
                })
            })
            .collect()
    }

    fn resources_of(&self, doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res))) = doc.dereference(resources) {
                return Some(res.clone());
            }
        }

        // Resources are inheritable from the page tree.
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => self.resources_of(doc, *parent),
            _ => None,
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes too.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        if self.raw_data.is_empty() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        // pdf-extract panics on some malformed font programs.
        let data = &self.raw_data;
        panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data)))
            .map_err(|_| PdfError::TextExtraction("pdf-extract panicked".to_string()))?
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document.as_ref().ok_or(PdfError::Parse("No document loaded".to_string()))?;
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        panic::catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[page])))
            .map_err(|_| PdfError::TextExtraction(format!("lopdf panicked on page {}", page)))?
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document.as_ref().ok_or(PdfError::Parse("No document loaded".to_string()))?;
        let page_id = *doc.get_pages().get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        let Some(resources) = self.resources_of(doc, page_id) else {
            return Ok(images);
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(images);
        };
        if let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) {
            for (_, reference) in xobjects.iter() {
                let Ok((_, object)) = doc.dereference(reference) else {
                    continue;
                };
                match decode_image(object) {
                    Ok(Some(image)) => images.push(image),
                    Ok(None) => {}
                    Err(e) => debug!("Skipping image on page {}: {}", page, e),
                }
            }
        }

        trace!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}

/// Decode an image XObject. JPEG streams are decoded directly; raw 8-bit
/// RGB and grayscale samples are wrapped. Other encodings are skipped.
fn decode_image(object: &Object) -> Result<Option<DynamicImage>> {
    let Object::Stream(stream) = object else {
        return Ok(None);
    };
    let dict = &stream.dict;
    let is_image = dict
        .get(b"Subtype")
        .and_then(|o| o.as_name())
        .is_ok_and(|name| name == b"Image");
    if !is_image {
        return Ok(None);
    }

    let dimension = |key: &[u8]| -> Result<u32> {
        let value = dict
            .get(key)
            .and_then(|o| o.as_i64())
            .map_err(|e| PdfError::ImageExtraction(e.to_string()))?;
        u32::try_from(value)
            .map_err(|_| PdfError::ImageExtraction(format!("invalid image dimension {}", value)))
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });
    if filter == Some(b"DCTDecode".as_slice()) {
        return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
            .map(Some)
            .map_err(|e| PdfError::ImageExtraction(e.to_string()));
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Skipping image with {} bits per component", bits);
        return Ok(None);
    }

    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| PdfError::ImageExtraction(format!("image too large: {}x{}", width, height)))?;

    let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| o.as_name().ok())
        .unwrap_or(b"DeviceRGB");

    let image = match color_space {
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        b"DeviceRGB" | b"RGB" if pixels.checked_mul(3).is_some_and(|n| data.len() >= n) => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        _ => None,
    };
    Ok(image)
}
