//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the invx pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvxConfig {
    /// Input and output directories.
    pub paths: PathsConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Table detection configuration.
    pub tables: TableConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Workbook export configuration.
    pub export: ExportConfig,
}

/// Well-known directories. File names handed to the pipeline are always
/// resolved relative to `uploads_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding uploaded PDFs.
    pub uploads_dir: PathBuf,

    /// Directory receiving generated workbooks.
    pub extracted_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            extracted_dir: PathBuf::from("extracted_excels"),
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,
}

/// Table detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Minimum number of consecutive rows that form a table.
    pub min_rows: usize,

    /// Minimum number of cells per row.
    pub min_columns: usize,

    /// Number of spaces that separate whitespace-aligned columns.
    pub column_gap: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            column_gap: 2,
        }
    }
}

/// OCR fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run OCR when a PDF has no text layer.
    pub enabled: bool,

    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }

    /// Whether all model files are present on disk.
    pub fn models_present(&self) -> bool {
        [&self.detection_model, &self.recognition_model, &self.dictionary]
            .iter()
            .all(|name| self.model_path(name).exists())
    }
}

/// Workbook layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sheet holding the header record.
    pub summary_sheet: String,

    /// Sheet holding the line items.
    pub items_sheet: String,

    /// Sheet used for single-table output.
    pub legacy_sheet: String,

    /// Placeholder written when there are no line items.
    pub empty_items_message: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            summary_sheet: "Invoice Summary".to_string(),
            items_sheet: "Item Details".to_string(),
            legacy_sheet: "Data".to_string(),
            empty_items_message: "No item details found".to_string(),
        }
    }
}

impl InvxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: InvxConfig =
            serde_json::from_str(r#"{"paths": {"uploads_dir": "in"}}"#).unwrap();

        assert_eq!(config.paths.uploads_dir, PathBuf::from("in"));
        assert_eq!(config.paths.extracted_dir, PathBuf::from("extracted_excels"));
        assert_eq!(config.export.items_sheet, "Item Details");
        assert_eq!(config.tables.column_gap, 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = InvxConfig::default();
        config.ocr.enabled = false;
        config.save(&path).unwrap();

        let loaded = InvxConfig::from_file(&path).unwrap();
        assert!(!loaded.ocr.enabled);
        assert_eq!(loaded.export.legacy_sheet, "Data");
    }

    #[test]
    fn test_load_errors_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let missing = InvxConfig::from_file(&path);
        assert!(matches!(missing, Err(crate::InvxError::Io(_))));

        std::fs::write(&path, "{ not json").unwrap();
        let malformed = InvxConfig::from_file(&path);
        assert!(matches!(malformed, Err(crate::InvxError::Config(_))));
    }
}
