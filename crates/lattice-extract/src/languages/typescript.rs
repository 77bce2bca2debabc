//! TypeScript language extractor using regex-based parsing.

use crate::builtins::{TS_BUILTINS, TS_COMMON_METHODS, TS_TYPE_BUILTINS};
use crate::regex_base::{DeclRule, ImportRule, RegexRules};
use lattice_core::EntityKind;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Extract code entities from TypeScript/TSX source.
pub struct TypeScriptExtractor;

static FUNC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s+(?P<name>[A-Za-z_$]\w*)\s*(?:<[^>]*>)?\s*\(",
    )
    .expect("ts function pattern")
});

static ARROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$]\w*)\s*(?::\s*[^=]+?)?\s*=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$]\w*)\s*(?::\s*[^=]*?)?\s*=>",
    )
    .expect("ts arrow pattern")
});

static CLASS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(?P<name>[A-Za-z_$]\w*)\s*(?:<[^>]*>)?(?:\s+extends\s+(?P<inherits>[A-Za-z_$][\w.]*(?:\s*<[^>]*>)?(?:\s*,\s*[A-Za-z_$][\w.]*(?:\s*<[^>]*>)?)*))?(?:\s+implements\s+[^\{]*?)?\s*\{",
    )
    .expect("ts class pattern")
});

static INTERFACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:export\s+)?(?:default\s+)?interface\s+(?P<name>[A-Za-z_$]\w*)\s*(?:<[^>]*>)?(?:\s+extends\s+(?P<inherits>[A-Za-z_$][\w.]*(?:\s*<[^>]*>)?(?:\s*,\s*[A-Za-z_$][\w.]*(?:\s*<[^>]*>)?)*))?\s*\{",
    )
    .expect("ts interface pattern")
});

static ENUM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:export\s+)?(?:const\s+)?enum\s+(?P<name>[A-Za-z_$]\w*)\s*\{")
        .expect("ts enum pattern")
});

static TYPE_ALIAS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:export\s+)?type\s+(?P<name>[A-Za-z_$]\w*)\s*(?:<[^>]*>)?\s*=")
        .expect("ts type alias pattern")
});

static METHOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s+(?:public\s+|private\s+|protected\s+)?(?:static\s+)?(?:readonly\s+)?(?:async\s+)?(?:get\s+|set\s+)?(?P<name>[A-Za-z_$]\w*)\s*(?:<[^>]*>)?\s*\([^)]*\)\s*(?::\s*[^\{;]+)?\s*\{",
    )
    .expect("ts method pattern")
});

pub(crate) static DECLS: LazyLock<Vec<DeclRule>> = LazyLock::new(|| {
    vec![
        DeclRule {
            kind: EntityKind::Function,
            regex: &FUNC_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Function,
            regex: &ARROW_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Function,
            regex: &METHOD_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &CLASS_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &INTERFACE_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &ENUM_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Variable,
            regex: &TYPE_ALIAS_PATTERN,
        },
    ]
});

static IMPORT_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)import\s+(?:type\s+)?\{([^}]+)\}\s+from\s+['"]([^'"]+)['"]"#)
        .expect("ts named import")
});

static IMPORT_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)import\s+([A-Za-z_$]\w*)\s+from\s+['"]([^'"]+)['"]"#)
        .expect("ts default import")
});

static IMPORT_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)import\s+\*\s+as\s+([A-Za-z_$]\w*)\s+from\s+['"]([^'"]+)['"]"#)
        .expect("ts star import")
});

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?:const|let|var)\s+(?:\{([^}]+)\}|([A-Za-z_$]\w*))\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    )
    .expect("ts require")
});

/// Split a `{a, b as c}` name list against one module.
fn split_name_list(names: &str, module: &str) -> Vec<(String, String)> {
    names
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
            Some((module.to_string(), name.to_string()))
        })
        .collect()
}

fn parse_named(caps: &Captures) -> Vec<(String, String)> {
    split_name_list(&caps[1], &caps[2])
}

fn parse_default(caps: &Captures) -> Vec<(String, String)> {
    vec![(caps[2].to_string(), caps[1].to_string())]
}

fn parse_require(caps: &Captures) -> Vec<(String, String)> {
    let module = &caps[3];
    if let Some(destructured) = caps.get(1) {
        split_name_list(destructured.as_str(), module)
    } else if let Some(default_name) = caps.get(2) {
        vec![(module.to_string(), default_name.as_str().to_string())]
    } else {
        Vec::new()
    }
}

pub(crate) static IMPORTS: LazyLock<Vec<ImportRule>> = LazyLock::new(|| {
    vec![
        ImportRule {
            regex: &IMPORT_NAMED,
            parse: parse_named,
        },
        ImportRule {
            regex: &IMPORT_STAR,
            parse: parse_default,
        },
        ImportRule {
            regex: &IMPORT_DEFAULT,
            parse: parse_default,
        },
        ImportRule {
            regex: &REQUIRE,
            parse: parse_require,
        },
    ]
});

static TYPE_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*([A-Z][A-Za-z0-9_]*)").expect("ts type ref"));
static GENERIC_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*([A-Z][A-Za-z0-9_]*)").expect("ts generic ref"));
static JSX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*([A-Z][A-Za-z0-9_]*)").expect("jsx pattern"));

pub(crate) fn ts_type_refs(body: &str) -> Vec<String> {
    let mut refs = Vec::new();
    let mut seen = HashSet::new();
    for pattern in [&*TYPE_REF_PATTERN, &*GENERIC_REF_PATTERN] {
        for caps in pattern.captures_iter(body) {
            let name = caps[1].to_string();
            if !TS_TYPE_BUILTINS.contains(name.as_str()) && seen.insert(name.clone()) {
                refs.push(name);
            }
        }
    }
    refs
}

/// JSX component usage reads as a call on the component.
pub(crate) fn jsx_components(body: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut seen = HashSet::new();
    for caps in JSX_PATTERN.captures_iter(body) {
        let name = caps[1].to_string();
        if !TS_BUILTINS.contains(name.as_str())
            && !TS_TYPE_BUILTINS.contains(name.as_str())
            && seen.insert(name.clone())
        {
            components.push(name);
        }
    }
    components
}

impl RegexRules for TypeScriptExtractor {
    fn language_name(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx"]
    }

    fn declarations(&self) -> &[DeclRule] {
        &DECLS
    }

    fn imports(&self) -> &[ImportRule] {
        &IMPORTS
    }

    fn builtins(&self) -> &HashSet<&'static str> {
        &TS_BUILTINS
    }

    fn common_methods(&self) -> &HashSet<&'static str> {
        &TS_COMMON_METHODS
    }

    fn declaration_deny(&self) -> &HashSet<&'static str> {
        &crate::regex_base::CONTROL_KEYWORDS
    }

    fn type_refs(&self, body: &str) -> Vec<String> {
        ts_type_refs(body)
    }

    fn extra_calls(&self, body: &str) -> Vec<String> {
        jsx_components(body)
    }
}
