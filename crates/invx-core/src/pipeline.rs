//! Batch entry point: one method over a list of uploaded files.

use std::collections::BTreeMap;

use tracing::info;

use crate::dispatch::Dispatcher;
use crate::models::config::InvxConfig;
use crate::models::ExtractionStatus;

/// Per-file status keyed by the file name as given.
pub type BatchReport = BTreeMap<String, ExtractionStatus>;

/// Sequential extraction pipeline.
pub struct Pipeline<'r> {
    config: InvxConfig,
    dispatcher: Dispatcher<'r>,
}

impl Pipeline<'static> {
    /// Pipeline over the built-in vendors.
    pub fn new(config: InvxConfig) -> Self {
        let dispatcher = Dispatcher::from_config(&config);
        Self { config, dispatcher }
    }
}

impl<'r> Pipeline<'r> {
    pub fn with_dispatcher(config: InvxConfig, dispatcher: Dispatcher<'r>) -> Self {
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &InvxConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher<'r> {
        &self.dispatcher
    }

    /// Extract and export one file.
    pub fn extract_details(&self, file_name: &str, method: &str) -> ExtractionStatus {
        self.dispatcher.dispatch(file_name, method)
    }

    /// Run `method` over every file, one at a time.
    ///
    /// Always returns one entry per distinct input name; failures are
    /// reported in the entries, never by the call itself.
    pub fn process_files<S: AsRef<str>>(&self, files: &[S], method: &str) -> BatchReport {
        self.process_files_with(files, method, |_, _| {})
    }

    /// Like [`process_files`](Self::process_files), calling `on_file` after
    /// each file with its status.
    pub fn process_files_with<S, F>(&self, files: &[S], method: &str, mut on_file: F) -> BatchReport
    where
        S: AsRef<str>,
        F: FnMut(&str, &ExtractionStatus),
    {
        let mut report = BatchReport::new();
        for file_name in files {
            let file_name = file_name.as_ref();
            let status = self.extract_details(file_name, method);
            on_file(file_name, &status);
            report.insert(file_name.to_string(), status);
        }

        let succeeded = report.values().filter(|s| s.is_success()).count();
        info!(
            "Processed {} files with {}: {} succeeded, {} failed",
            report.len(),
            method,
            succeeded,
            report.len() - succeeded
        );
        report
    }
}
