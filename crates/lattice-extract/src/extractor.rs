//! LanguageExtractor trait: the uniform capability set every language
//! front end exposes to the registry and the incremental engine.

use lattice_core::Entity;

/// Trait for per-language entity extraction from source text.
///
/// Contract:
/// - entities are produced in source order;
/// - methods/members are scoped under their class as `Class.method`;
/// - all entity fields are filled (lists may be empty, never missing);
/// - builtin call targets and language-standard decorators/annotations
///   are filtered through per-language deny-sets;
/// - extraction is total: parse failures return an empty or partial
///   list, never an error.
pub trait LanguageExtractor: Send + Sync {
    /// Human-readable language name (e.g. "python", "rust").
    fn language_name(&self) -> &'static str;

    /// File extensions handled, without the leading dot (e.g. `["rs"]`).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Whether this extractor handles the given path.
    fn can_handle(&self, file_path: &str) -> bool {
        match std::path::Path::new(file_path)
            .extension()
            .and_then(|e| e.to_str())
        {
            Some(ext) => self.file_extensions().contains(&ext),
            None => false,
        }
    }

    /// Parse `source` and return its entities in source order.
    fn extract(&self, source: &str, file_path: &str) -> Vec<Entity>;
}
