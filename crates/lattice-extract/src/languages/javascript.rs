//! JavaScript language extractor: the TypeScript rules minus type
//! annotations, over the JS extension set.

use crate::builtins::{TS_BUILTINS, TS_COMMON_METHODS};
use crate::regex_base::{DeclRule, ImportRule, RegexRules, CONTROL_KEYWORDS};
use std::collections::HashSet;

use super::typescript::jsx_components;

/// Extract code entities from JavaScript/JSX source.
pub struct JavaScriptExtractor;

impl RegexRules for JavaScriptExtractor {
    fn language_name(&self) -> &'static str {
        "javascript"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn declarations(&self) -> &[DeclRule] {
        &super::typescript::DECLS
    }

    fn imports(&self) -> &[ImportRule] {
        &super::typescript::IMPORTS
    }

    fn builtins(&self) -> &HashSet<&'static str> {
        &TS_BUILTINS
    }

    fn common_methods(&self) -> &HashSet<&'static str> {
        &TS_COMMON_METHODS
    }

    fn declaration_deny(&self) -> &HashSet<&'static str> {
        &CONTROL_KEYWORDS
    }

    fn extra_calls(&self, body: &str) -> Vec<String> {
        jsx_components(body)
    }
}
