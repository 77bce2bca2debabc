//! Extension-indexed extractor registry.
//!
//! Built once at process start; first matching extractor wins and files
//! with unknown extensions are silently skipped.

use crate::extractor::LanguageExtractor;
use crate::languages::{
    CExtractor, CppExtractor, JavaExtractor, JavaScriptExtractor, PythonExtractor, RustExtractor,
    TypeScriptExtractor,
};

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn LanguageExtractor>>,
}

impl ExtractorRegistry {
    /// Empty registry; languages are registered in priority order.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Registry with all built-in language front ends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PythonExtractor));
        registry.register(Box::new(TypeScriptExtractor));
        registry.register(Box::new(JavaScriptExtractor));
        registry.register(Box::new(RustExtractor));
        registry.register(Box::new(CppExtractor));
        registry.register(Box::new(CExtractor));
        registry.register(Box::new(JavaExtractor));
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn LanguageExtractor>) {
        self.extractors.push(extractor);
    }

    /// First extractor claiming the path, if any.
    pub fn get(&self, file_path: &str) -> Option<&dyn LanguageExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(file_path))
            .map(|e| e.as_ref())
    }

    /// Whether any extractor claims the path.
    pub fn supports(&self, file_path: &str) -> bool {
        self.get(file_path).is_some()
    }

    /// All supported extensions, in registration order.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions = Vec::new();
        for extractor in &self.extractors {
            for ext in extractor.file_extensions() {
                if !extensions.contains(ext) {
                    extensions.push(ext);
                }
            }
        }
        extensions
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
