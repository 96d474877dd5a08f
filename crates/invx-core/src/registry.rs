//! Method name to vendor extractor lookup.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::vendors::{self, VendorExtractor};

lazy_static! {
    static ref BUILTIN: Registry = Registry::with_extractors(vendors::builtin());
}

/// Immutable map from method name to extractor.
#[derive(Default)]
pub struct Registry {
    extractors: HashMap<&'static str, Box<dyn VendorExtractor>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry of built-in vendors.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    fn with_extractors(extractors: Vec<Box<dyn VendorExtractor>>) -> Self {
        extractors.into_iter().fold(Self::new(), Self::register)
    }

    /// Add an extractor under its tag. A later extractor with the same tag
    /// replaces the earlier one.
    pub fn register(mut self, extractor: Box<dyn VendorExtractor>) -> Self {
        let tag = extractor.tag();
        debug!("Registering extractor {}", tag);
        self.extractors.insert(tag, extractor);
        self
    }

    /// Look up an extractor by method name.
    pub fn get(&self, method: &str) -> Option<&dyn VendorExtractor> {
        self.extractors.get(method).map(|e| e.as_ref())
    }

    pub fn contains(&self, method: &str) -> bool {
        self.extractors.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.extractors.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// `(tag, label)` pairs, sorted by tag.
    pub fn entries(&self) -> Vec<(&'static str, &'static str)> {
        self.tags()
            .into_iter()
            .filter_map(|tag| self.get(tag).map(|e| (tag, e.label())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::Acquired;
    use crate::error::ExtractionError;
    use crate::models::ExtractionOutput;

    struct Named(&'static str, &'static str);

    impl VendorExtractor for Named {
        fn tag(&self) -> &'static str {
            self.0
        }

        fn label(&self) -> &'static str {
            self.1
        }

        fn extract_from(&self, _: &Acquired, _: &str) -> Result<ExtractionOutput, ExtractionError> {
            Ok(ExtractionOutput::empty())
        }
    }

    #[test]
    fn test_builtin_vendors() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.tags(),
            [
                "amazon",
                "flipkart",
                "instamart",
                "meesho",
                "myntra",
                "onemg",
                "reliance_digital",
                "swiggy",
                "universal",
                "zomato"
            ]
        );
        assert!(registry.get("amazon").is_some());
        assert!(registry.get("nonexistent_vendor").is_none());
    }

    #[test]
    fn test_builtin_is_shared() {
        assert!(std::ptr::eq(Registry::builtin(), Registry::builtin()));
    }

    #[test]
    fn test_custom_registry() {
        let registry = Registry::new()
            .register(Box::new(Named("b", "Bee")))
            .register(Box::new(Named("a", "Ay")));
        assert_eq!(registry.tags(), ["a", "b"]);
        assert_eq!(registry.entries(), [("a", "Ay"), ("b", "Bee")]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_same_tag_replaces() {
        let registry = Registry::new()
            .register(Box::new(Named("a", "First")))
            .register(Box::new(Named("a", "Second")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").map(|e| e.label()), Some("Second"));
    }
}
