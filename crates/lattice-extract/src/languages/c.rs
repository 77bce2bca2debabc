//! C language extractor using regex-based parsing.
//!
//! Simplified version of the C++ extractor: functions, structs, enums,
//! unions, typedefs, #define macros. No classes, namespaces, or
//! inheritance.

use crate::builtins::{C_BUILTINS, C_COMMON_METHODS};
use crate::regex_base::{DeclRule, ImportRule, RegexRules, CONTROL_KEYWORDS};
use lattice_core::EntityKind;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Extract code entities from C source.
pub struct CExtractor;

static C_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?://[^\n]*|/\*[\s\S]*?\*/|'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*")"#)
        .expect("c strip pattern")
});

static FUNC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:(?:static|inline|extern)\s+)*(?:[\w*]+\s+)+?(?P<name>[a-z_]\w*)\s*\([^)]*\)\s*\{")
        .expect("c function pattern")
});

static STRUCT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:typedef\s+)?struct\s+(?P<name>[A-Za-z_]\w*)\s*\{").expect("c struct pattern")
});

static ENUM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:typedef\s+)?enum\s+(?P<name>[A-Za-z_]\w*)\s*\{").expect("c enum pattern")
});

static UNION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:typedef\s+)?union\s+(?P<name>[A-Za-z_]\w*)\s*\{").expect("c union pattern")
});

static TYPEDEF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)typedef\s+[^;\n]*?\s+(?P<name>[A-Za-z_]\w*)\s*;").expect("c typedef pattern")
});

static DEFINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)#\s*define\s+(?P<name>[A-Za-z_]\w*)").expect("c define pattern")
});

static DECLS: LazyLock<Vec<DeclRule>> = LazyLock::new(|| {
    vec![
        DeclRule {
            kind: EntityKind::Function,
            regex: &FUNC_PATTERN,
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
            regex: &UNION_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Variable,
            regex: &TYPEDEF_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Variable,
            regex: &DEFINE_PATTERN,
        },
    ]
});

static INCLUDE_LOCAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)#\s*include\s+"(?P<path>[^"]+)""#).expect("c local include")
});

static INCLUDE_SYSTEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)#\s*include\s+<(?P<path>[^>]+)>").expect("c system include"));

fn parse_include_local(caps: &Captures) -> Vec<(String, String)> {
    vec![(".".to_string(), caps["path"].to_string())]
}

fn parse_include_system(caps: &Captures) -> Vec<(String, String)> {
    vec![(String::new(), caps["path"].to_string())]
}

static IMPORTS: LazyLock<Vec<ImportRule>> = LazyLock::new(|| {
    vec![
        ImportRule {
            regex: &INCLUDE_LOCAL,
            parse: parse_include_local,
        },
        ImportRule {
            regex: &INCLUDE_SYSTEM,
            parse: parse_include_system,
        },
    ]
});

impl RegexRules for CExtractor {
    fn language_name(&self) -> &'static str {
        "c"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["c"]
    }

    fn strip_regex(&self) -> &Regex {
        &C_STRIP
    }

    fn declarations(&self) -> &[DeclRule] {
        &DECLS
    }

    fn imports(&self) -> &[ImportRule] {
        &IMPORTS
    }

    fn builtins(&self) -> &HashSet<&'static str> {
        &C_BUILTINS
    }

    fn common_methods(&self) -> &HashSet<&'static str> {
        &C_COMMON_METHODS
    }

    fn declaration_deny(&self) -> &HashSet<&'static str> {
        &CONTROL_KEYWORDS
    }
}
