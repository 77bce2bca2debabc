//! lattice-extract: Multi-language entity extraction.
//!
//! One full-AST reference extractor (Python, via tree-sitter) plus six
//! regex-based extractors (TypeScript, JavaScript, Rust, C, C++, Java).
//! Every extractor is total: parse failures yield an empty or partial
//! entity list, never an error across the extraction boundary.

pub mod builtins;
pub mod extractor;
pub mod hash;
pub mod languages;
pub mod regex_base;
pub mod registry;

pub use extractor::LanguageExtractor;
pub use registry::ExtractorRegistry;
