//! Method lookup, extraction and export for a single file.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};

use tracing::{error, info, warn};

use crate::acquire::{Acquirer, PdfAcquirer};
use crate::error::ExtractionError;
use crate::export::Exporter;
use crate::models::config::InvxConfig;
use crate::models::ExtractionStatus;
use crate::registry::Registry;

pub const EXTRACTOR_NOT_FOUND: &str = "Extractor not found";
pub const INVALID_FILE_NAME: &str = "Invalid file name";

/// Runs one (file, method) pair through its extractor and the exporter.
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    acquirer: Box<dyn Acquirer>,
    uploads_dir: PathBuf,
    exporter: Exporter,
}

impl Dispatcher<'static> {
    /// Built-in vendors, PDF acquisition and export as configured.
    pub fn from_config(config: &InvxConfig) -> Self {
        Self::new(
            Registry::builtin(),
            Box::new(PdfAcquirer::new(config)),
            config.paths.uploads_dir.clone(),
            Exporter::from_config(config),
        )
    }
}

impl<'r> Dispatcher<'r> {
    pub fn new(
        registry: &'r Registry,
        acquirer: Box<dyn Acquirer>,
        uploads_dir: impl Into<PathBuf>,
        exporter: Exporter,
    ) -> Self {
        Self {
            registry,
            acquirer,
            uploads_dir: uploads_dir.into(),
            exporter,
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Extract `file_name` with `method` and export the result.
    ///
    /// Never fails and never panics; every problem becomes a `Failed` status.
    pub fn dispatch(&self, file_name: &str, method: &str) -> ExtractionStatus {
        let Some(extractor) = self.registry.get(method) else {
            warn!("Unknown extraction method: {}", method);
            return ExtractionStatus::failed(method, EXTRACTOR_NOT_FOUND);
        };

        if !is_bare_file_name(file_name) {
            warn!("Rejected file name: {:?}", file_name);
            return ExtractionStatus::failed(method, INVALID_FILE_NAME);
        }

        if !self.uploads_dir.join(file_name).is_file() {
            let e = ExtractionError::FileNotFound(file_name.to_string());
            warn!("{}", e);
            return ExtractionStatus::failed(method, e.to_string());
        }

        info!(vendor = method, "Extracting {}", file_name);
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            extractor.extract(self.acquirer.as_ref(), &self.uploads_dir, file_name)
        }));
        let output = match extracted {
            Ok(output) => output,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(vendor = method, "Extractor panicked on {}: {}", file_name, message);
                return ExtractionStatus::failed(method, message);
            }
        };

        let status = ExtractionStatus::from_output(method, output);
        match status.data() {
            Some(data) => {
                let path = self.exporter.export(data, file_name, method);
                status.with_output_path(path)
            }
            None => {
                info!(vendor = method, "No data extracted from {}", file_name);
                status
            }
        }
    }
}

/// A plain name inside the uploads directory: a single normal path
/// component, so no separators and neither `.` nor `..`.
fn is_bare_file_name(file_name: &str) -> bool {
    if file_name.trim().is_empty() || file_name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(file_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "extractor panicked".to_string()
    }
}
