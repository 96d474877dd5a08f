//! Last-resort text recognition for PDFs without a text layer.

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Recognizes text in a rendered page image.
pub trait OcrBackend: Send + Sync {
    /// Text of the image in reading order, lines joined with `\n`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Load the configured OCR backend.
///
/// Fails with [`OcrError::Unavailable`] when OCR is disabled or compiled out,
/// and with [`OcrError::ModelLoad`] when model files are missing.
pub fn load_backend(config: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    if !config.enabled {
        return Err(OcrError::Unavailable);
    }
    if !config.models_present() {
        return Err(OcrError::ModelLoad(format!(
            "model files not found in {}",
            config.model_dir.display()
        )));
    }

    #[cfg(feature = "ocr")]
    {
        Ok(Box::new(PureOcrBackend::from_config(config)?))
    }

    #[cfg(not(feature = "ocr"))]
    {
        Err(OcrError::Unavailable)
    }
}

/// OCR backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
#[cfg(feature = "ocr")]
pub struct PureOcrBackend {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

#[cfg(feature = "ocr")]
impl PureOcrBackend {
    /// Build the engine from the model files named in the config.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(config.model_path(&config.detection_model))
            .rec_model_path(config.model_path(&config.recognition_model))
            .dictionary_path(config.model_path(&config.dictionary))
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());
        Ok(Self { engine })
    }
}

#[cfg(feature = "ocr")]
impl OcrBackend for PureOcrBackend {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        // Reading order: 20px row bands top to bottom, then left to right.
        let mut lines: Vec<(i64, f64, String)> = results
            .iter()
            .map(|r| {
                let (x, y) = r
                    .bounding_box
                    .exterior()
                    .coords()
                    .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)));
                ((y / 20.0) as i64, x, r.text.replace("[UNK]", " "))
            })
            .collect();
        lines.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)));

        Ok(lines.into_iter().map(|(_, _, text)| text).collect::<Vec<_>>().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_ocr_is_unavailable() {
        let config = OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        };
        assert!(matches!(load_backend(&config), Err(OcrError::Unavailable)));
    }

    #[test]
    fn test_missing_models_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = OcrConfig {
            model_dir: dir.path().to_path_buf(),
            ..OcrConfig::default()
        };
        assert!(matches!(load_backend(&config), Err(OcrError::ModelLoad(_))));
    }
}
