//! Rust language extractor using regex-based parsing.

use crate::builtins::{RUST_BUILTINS, RUST_COMMON_METHODS, RUST_STANDARD_ATTRS};
use crate::regex_base::{DeclRule, ImportRule, RegexRules};
use lattice_core::EntityKind;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Extract code entities from Rust source.
pub struct RustExtractor;

/// Strip pattern covering raw strings, byte strings, and char literals.
static RUST_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r##"(?m)(?://[^\n]*|/\*[\s\S]*?\*/|r#+"[\s\S]*?"#+|r"[^"]*"|b?'(?:[^'\\]|\\.)'|b?"(?:[^"\\]|\\.)*")"##,
    )
    .expect("rust strip pattern")
});

static FN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(?P<name>[a-z_]\w*)\s*(?:<[^>]*>)?\s*\("#,
    )
    .expect("rust fn pattern")
});

static MACRO_RULES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)macro_rules!\s+(?P<name>[a-z_]\w*)").expect("rust macro"));

static STRUCT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:pub(?:\([^)]*\))?\s+)?struct\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?")
        .expect("rust struct pattern")
});

static ENUM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:pub(?:\([^)]*\))?\s+)?enum\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?")
        .expect("rust enum pattern")
});

static TRAIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?trait\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?(?:\s*:\s*(?P<inherits>[A-Za-z_]\w*(?:\s*\+\s*[A-Za-z_]\w*)*))?",
    )
    .expect("rust trait pattern")
});

static IMPL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)impl\s*(?:<[^>]*>)?\s+(?:(?P<trait>[A-Z]\w*)\s+for\s+)?(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?\s*\{",
    )
    .expect("rust impl pattern")
});

static TYPE_ALIAS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:pub(?:\([^)]*\))?\s+)?type\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?\s*=")
        .expect("rust type alias pattern")
});

static CONST_STATIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:pub(?:\([^)]*\))?\s+)?(?:const|static)\s+(?P<name>[A-Z_]\w*)\s*:")
        .expect("rust const pattern")
});

static MOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:pub(?:\([^)]*\))?\s+)?mod\s+(?P<name>[a-z_]\w*)\s*[\{;]")
        .expect("rust mod pattern")
});

static DECLS: LazyLock<Vec<DeclRule>> = LazyLock::new(|| {
    vec![
        DeclRule {
            kind: EntityKind::Function,
            regex: &FN_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Function,
            regex: &MACRO_RULES_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &STRUCT_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &ENUM_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &TRAIT_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &IMPL_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Variable,
            regex: &TYPE_ALIAS_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Variable,
            regex: &CONST_STATIC_PATTERN,
        },
        DeclRule {
            kind: EntityKind::ModuleCode,
            regex: &MOD_PATTERN,
        },
    ]
});

static USE_RENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)use\s+(?:(?:crate|super|self)::)?(?P<path>[\w:]+)::(?P<orig>[A-Za-z_]\w*)\s+as\s+(?P<name>[A-Za-z_]\w*)\s*;",
    )
    .expect("rust use-rename pattern")
});

static USE_BRACED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)use\s+(?:(?:crate|super|self)::)?(?P<path>[\w:]+)::\{(?P<names>[^}]+)\}\s*;",
    )
    .expect("rust use-braced pattern")
});

static USE_SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)use\s+(?:(?:crate|super|self)::)?(?P<path>[\w:]+)::(?P<name>[A-Za-z_]\w*)\s*;")
        .expect("rust use-simple pattern")
});

static USE_GLOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)use\s+(?:(?:crate|super|self)::)?(?P<path>[\w:]+)::\*\s*;")
        .expect("rust use-glob pattern")
});

fn parse_use_rename(caps: &Captures) -> Vec<(String, String)> {
    vec![(caps["path"].to_string(), caps["name"].to_string())]
}

fn parse_use_braced(caps: &Captures) -> Vec<(String, String)> {
    let path = caps["path"].to_string();
    caps["names"]
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let name = match part.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => part,
            };
            Some((path.clone(), name.to_string()))
        })
        .collect()
}

fn parse_use_simple(caps: &Captures) -> Vec<(String, String)> {
    vec![(caps["path"].to_string(), caps["name"].to_string())]
}

fn parse_use_glob(caps: &Captures) -> Vec<(String, String)> {
    vec![(caps["path"].to_string(), "*".to_string())]
}

static IMPORTS: LazyLock<Vec<ImportRule>> = LazyLock::new(|| {
    vec![
        ImportRule {
            regex: &USE_RENAME,
            parse: parse_use_rename,
        },
        ImportRule {
            regex: &USE_BRACED,
            parse: parse_use_braced,
        },
        ImportRule {
            regex: &USE_SIMPLE,
            parse: parse_use_simple,
        },
        ImportRule {
            regex: &USE_GLOB,
            parse: parse_use_glob,
        },
    ]
});

static ATTRIBUTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#!?\[(\w+(?:::\w+)*)").expect("rust attribute pattern"));

static GENERIC_PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("rust generic pattern"));

impl RegexRules for RustExtractor {
    fn language_name(&self) -> &'static str {
        "rust"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn strip_regex(&self) -> &Regex {
        &RUST_STRIP
    }

    fn declarations(&self) -> &[DeclRule] {
        &DECLS
    }

    fn imports(&self) -> &[ImportRule] {
        &IMPORTS
    }

    fn builtins(&self) -> &HashSet<&'static str> {
        &RUST_BUILTINS
    }

    fn common_methods(&self) -> &HashSet<&'static str> {
        &RUST_COMMON_METHODS
    }

    fn standard_decorators(&self) -> &HashSet<&'static str> {
        &RUST_STANDARD_ATTRS
    }

    /// Trait bounds (`:` separated by `+`) and the `impl Trait for Type`
    /// form both read as inheritance.
    fn parse_inherits(&self, caps: &Captures) -> Vec<String> {
        if let Some(trait_name) = caps.name("trait") {
            return vec![trait_name.as_str().to_string()];
        }
        let Some(inherits) = caps.name("inherits") else {
            return Vec::new();
        };
        inherits
            .as_str()
            .split('+')
            .filter_map(|part| {
                let name = GENERIC_PARAMS.replace_all(part.trim(), "").trim().to_string();
                let keep = name
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_uppercase())
                    && !RUST_BUILTINS.contains(name.as_str());
                keep.then_some(name)
            })
            .collect()
    }

    /// Rust attributes `#[...]` act as decorators.
    fn decorators(&self, stripped_lines: &[&str], decl_line: usize) -> Vec<String> {
        let mut decorators = Vec::new();
        let mut i = decl_line;
        while i > 0 {
            i -= 1;
            let line = stripped_lines[i].trim();
            if line.starts_with("#[") || line.starts_with("#![") {
                if let Some(caps) = ATTRIBUTE_PATTERN.captures(line) {
                    let name = caps[1].to_string();
                    if !RUST_STANDARD_ATTRS.contains(name.as_str()) {
                        decorators.push(name);
                    }
                }
            } else if !line.is_empty() {
                break;
            }
        }
        decorators.reverse();
        decorators
    }
}
