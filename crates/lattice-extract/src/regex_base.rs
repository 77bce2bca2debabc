//! Shared machinery for the regex-based language extractors.
//!
//! Provides comment/string stripping, brace counting, call extraction,
//! decorator scanning, scope tracking, and the main extract pipeline.
//! Language modules supply declaration patterns, import patterns, and
//! builtin deny-sets through the [`RegexRules`] trait; every
//! `RegexRules` implementor is a [`LanguageExtractor`] via the blanket
//! impl below.

use crate::extractor::LanguageExtractor;
use crate::hash;
use lattice_core::{Confidence, Entity, EntityKind};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// One declaration pattern and the entity kind it produces.
///
/// Patterns must carry a named group `name`; optionally `inherits`.
pub struct DeclRule {
    pub kind: EntityKind,
    pub regex: &'static Regex,
}

/// One import pattern with its capture parser.
pub struct ImportRule {
    pub regex: &'static Regex,
    /// Parse a match into `(module, symbol)` pairs.
    pub parse: fn(&Captures) -> Vec<(String, String)>,
}

/// Language-specific hooks consumed by the shared extract pipeline.
pub trait RegexRules: Send + Sync {
    fn language_name(&self) -> &'static str;
    fn file_extensions(&self) -> &'static [&'static str];

    /// Pattern matching comments and string literals to blank out.
    fn strip_regex(&self) -> &Regex {
        &C_STYLE_STRIP
    }

    fn declarations(&self) -> &[DeclRule];
    fn imports(&self) -> &[ImportRule];

    fn builtins(&self) -> &HashSet<&'static str>;
    fn common_methods(&self) -> &HashSet<&'static str>;

    /// Standard decorators/annotations filtered from `decorators`.
    fn standard_decorators(&self) -> &HashSet<&'static str> {
        &EMPTY_SET
    }

    /// Names a declaration pattern may capture that are never
    /// declarations (control-flow keywords).
    fn declaration_deny(&self) -> &HashSet<&'static str> {
        &EMPTY_SET
    }

    /// Parse the inheritance list from a declaration match.
    fn parse_inherits(&self, caps: &Captures) -> Vec<String> {
        default_inherits(caps, self.builtins())
    }

    /// Extract type-position references from declaration/body text.
    fn type_refs(&self, _body: &str) -> Vec<String> {
        Vec::new()
    }

    /// Extra call-like references (e.g. JSX components).
    fn extra_calls(&self, _body: &str) -> Vec<String> {
        Vec::new()
    }

    /// Extract decorator names from the lines preceding a declaration.
    fn decorators(&self, stripped_lines: &[&str], decl_line: usize) -> Vec<String> {
        at_style_decorators(stripped_lines, decl_line, self.standard_decorators())
    }
}

impl<R: RegexRules> LanguageExtractor for R {
    fn language_name(&self) -> &'static str {
        RegexRules::language_name(self)
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        RegexRules::file_extensions(self)
    }

    fn extract(&self, source: &str, file_path: &str) -> Vec<Entity> {
        extract_with(self, source, file_path)
    }
}

static EMPTY_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(HashSet::new);

/// Control-flow keywords that brace-and-paren declaration patterns can
/// capture by accident in C-family languages.
pub static CONTROL_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "if", "else", "for", "while", "do", "switch", "catch", "return", "new", "throw", "await",
        "typeof", "delete", "sizeof", "yield",
    ])
});

/// Default strip pattern for C-style languages (also handles Python
/// triple quotes and backtick template literals).
pub static C_STYLE_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?://[^\n]*|/\*[\s\S]*?\*/|'''[\s\S]*?'''|"""[\s\S]*?"""|'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|`(?:[^`\\]|\\.)*`)"#,
    )
    .expect("strip pattern")
});

static CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)?)\s*\(").expect("call pattern")
});

static DECORATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(\w+(?:\.\w+)*)").expect("decorator pattern"));

static GENERIC_PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("generic pattern"));

// ── Text preparation ────────────────────────────────────────────────────────

/// Replace comments and string contents with spaces, preserving line
/// structure so line numbers stay correct.
pub fn strip_comments_and_strings(strip: &Regex, source: &str) -> String {
    strip
        .replace_all(source, |caps: &Captures| {
            caps[0]
                .chars()
                .map(|c| if c == '\n' { '\n' } else { ' ' })
                .collect::<String>()
        })
        .into_owned()
}

/// 1-indexed line number of a byte offset.
pub fn line_of_offset(text: &str, offset: usize) -> u32 {
    text[..offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1
}

/// Find the closing-brace line (0-indexed) for a declaration starting at
/// `start_line`. Falls back to the last line when no brace closes.
pub fn find_body_end(stripped_lines: &[&str], start_line: usize) -> usize {
    let mut depth = 0i32;
    let mut found_open = false;
    for (i, line) in stripped_lines.iter().enumerate().skip(start_line) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    found_open = true;
                }
                '}' => {
                    depth -= 1;
                    if found_open && depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
        }
    }
    stripped_lines.len().saturating_sub(1)
}

// ── Call extraction ─────────────────────────────────────────────────────────

/// Extract function/method call names from a stripped body, filtering
/// builtins and common attribute methods.
pub fn calls_from_body(
    body: &str,
    builtins: &HashSet<&'static str>,
    common: &HashSet<&'static str>,
) -> Vec<String> {
    let mut calls = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for caps in CALL_PATTERN.captures_iter(body) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        if name.is_empty() || !seen.insert(name) {
            continue;
        }
        let bare = name.rsplit('.').next().unwrap_or(name);
        if builtins.contains(bare) || builtins.contains(name) || CONTROL_KEYWORDS.contains(bare) {
            continue;
        }
        match name.split_once('.') {
            None => {
                if common.contains(bare) {
                    continue;
                }
            }
            Some((receiver, _)) => {
                if builtins.contains(receiver) || common.contains(bare) {
                    continue;
                }
            }
        }
        calls.push(name.to_string());
    }
    calls
}

// ── Decorators / inheritance / params ───────────────────────────────────────

/// Walk upward from the declaration collecting `@name` decorator lines.
pub fn at_style_decorators(
    lines: &[&str],
    decl_line: usize,
    deny: &HashSet<&'static str>,
) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut i = decl_line;
    while i > 0 {
        i -= 1;
        let line = lines[i].trim();
        match DECORATOR_PATTERN.captures(line) {
            Some(caps) => {
                let name = caps[1].to_string();
                if !deny.contains(name.as_str()) {
                    decorators.push(name);
                }
            }
            None => break,
        }
    }
    decorators.reverse();
    decorators
}

/// Default inheritance parsing: comma-split the `inherits` group, strip
/// generics and access keywords, keep uppercase-initial non-builtins.
pub fn default_inherits(caps: &Captures, builtins: &HashSet<&'static str>) -> Vec<String> {
    let Some(inherits) = caps.name("inherits") else {
        return Vec::new();
    };
    inherits
        .as_str()
        .split(',')
        .filter_map(|base| {
            let base = GENERIC_PARAMS.replace_all(base.trim(), "");
            let last = base.split_whitespace().last()?.to_string();
            let keep = last
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase())
                && !builtins.contains(last.as_str());
            keep.then_some(last)
        })
        .collect()
}

/// Parameter names from a declaration's parenthesized list.
///
/// Handles `name: Type` (TS/Rust), `Type name` (Java/C/C++), and
/// defaults (`name = expr`).
pub fn params_from_decl(decl_text: &str) -> Vec<String> {
    let Some(open) = decl_text.find('(') else {
        return Vec::new();
    };
    let mut depth = 0i32;
    let mut close = None;
    for (i, ch) in decl_text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        return Vec::new();
    };
    decl_text[open + 1..close]
        .split(',')
        .filter_map(|piece| {
            let piece = piece.split('=').next().unwrap_or(piece).trim();
            if piece.is_empty() {
                return None;
            }
            let name = match piece.split_once(':') {
                // "name: Type" — take the identifier before the colon
                Some((before, _)) => before.split_whitespace().last()?.to_string(),
                // "Type name" / "name" — take the last identifier
                None => piece
                    .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .find(|s| !s.is_empty())?
                    .to_string(),
            };
            let valid = name
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_');
            (valid && name != "self" && name != "this").then_some(name)
        })
        .collect()
}

// ── Scope tracking ──────────────────────────────────────────────────────────

/// Apply hierarchical scoping: entities nested in a class get
/// `Parent.child` names. Classes act as scope containers.
pub fn apply_scoping(entities: &mut Vec<Entity>) {
    entities.sort_by(|a, b| {
        a.line_start
            .cmp(&b.line_start)
            .then_with(|| (b.line_end - b.line_start).cmp(&(a.line_end - a.line_start)))
    });
    let mut scope_stack: Vec<(String, u32)> = Vec::new();
    for entity in entities.iter_mut() {
        while scope_stack
            .last()
            .is_some_and(|(_, end)| entity.line_start > *end)
        {
            scope_stack.pop();
        }
        if let Some((parent, _)) = scope_stack.last() {
            if entity.kind != EntityKind::Import {
                entity.name = format!("{parent}.{}", entity.name);
            }
        }
        if entity.kind == EntityKind::Class {
            scope_stack.push((entity.name.clone(), entity.line_end));
        }
    }
}

/// Enforce the per-file `(entity_type, name)` uniqueness invariant:
/// the later definition wins.
pub fn dedupe_entities(entities: Vec<Entity>) -> Vec<Entity> {
    let mut result: Vec<Entity> = Vec::with_capacity(entities.len());
    for entity in entities {
        if let Some(pos) = result
            .iter()
            .position(|e| e.kind == entity.kind && e.name == entity.name)
        {
            result.remove(pos);
        }
        result.push(entity);
    }
    result
}

// ── Main pipeline ───────────────────────────────────────────────────────────

/// Shared extract pipeline: strip → imports → declarations → scoping.
pub fn extract_with<R: RegexRules + ?Sized>(
    rules: &R,
    source: &str,
    file_path: &str,
) -> Vec<Entity> {
    if source.trim().is_empty() {
        return Vec::new();
    }

    let stripped = strip_comments_and_strings(rules.strip_regex(), source);
    let stripped_lines: Vec<&str> = stripped.split('\n').collect();

    let mut entities = Vec::new();

    // Imports scan the original source: module paths live in string
    // literals the strip pass blanks out.
    for rule in rules.imports() {
        for caps in rule.regex.captures_iter(source) {
            let m = caps.get(0).expect("whole match");
            let line_start = line_of_offset(source, m.start());
            let line_end = line_of_offset(source, m.end());
            for (module, symbol) in (rule.parse)(&caps) {
                entities.push(Entity {
                    kind: EntityKind::Import,
                    name: symbol.clone(),
                    file_path: file_path.to_string(),
                    line_start,
                    line_end,
                    signature_hash: hash::short_hash(&format!("import:{module}:{symbol}")),
                    structure_hash: hash::short_hash("other:import"),
                    calls: vec![],
                    inherits: vec![],
                    type_refs: vec![],
                    decorators: vec![],
                    imports: vec![(module, symbol)],
                    params: vec![],
                    uses: vec![],
                    confidence: Confidence::High,
                });
            }
        }
    }

    for rule in rules.declarations() {
        for caps in rule.regex.captures_iter(&stripped) {
            let Some(name_match) = caps.name("name") else {
                continue;
            };
            let name = name_match.as_str().to_string();
            if name.is_empty() || rules.declaration_deny().contains(name.as_str()) {
                continue;
            }

            let line_start = line_of_offset(&stripped, caps.get(0).expect("match").start());
            let decl_idx = (line_start - 1) as usize;
            let mut line_end = find_body_end(&stripped_lines, decl_idx) as u32 + 1;
            if line_end == line_start && rule.kind == EntityKind::Variable {
                line_end = line_of_offset(&stripped, caps.get(0).expect("match").end());
            }
            if line_end < line_start {
                line_end = line_start;
            }

            let stripped_body = stripped_lines[decl_idx..line_end as usize].join("\n");
            let mut calls = calls_from_body(&stripped_body, rules.builtins(), rules.common_methods());
            for extra in rules.extra_calls(&stripped_body) {
                if !calls.contains(&extra) {
                    calls.push(extra);
                }
            }
            // The declaration line itself matches the call pattern.
            calls.retain(|c| c != &name);

            // Some declaration patterns stop at the opening paren, so
            // the parameter scan starts from the match and balances
            // parens over the stripped text.
            let params = if rule.kind == EntityKind::Function {
                params_from_decl(&stripped[caps.get(0).expect("match").start()..])
            } else {
                Vec::new()
            };

            // Hashes cover the stripped text: blanked comments trim
            // away as trailing whitespace, so comment-only edits keep
            // both hashes stable.
            let sig_text = stripped_lines[decl_idx..line_end as usize].join("\n");
            entities.push(Entity {
                kind: rule.kind,
                name: name.clone(),
                file_path: file_path.to_string(),
                line_start,
                line_end,
                signature_hash: hash::signature_hash(&sig_text),
                structure_hash: hash::structure_hash(&sig_text, &name),
                calls,
                inherits: rules.parse_inherits(&caps),
                type_refs: rules.type_refs(&stripped_body),
                decorators: rules.decorators(&stripped_lines, decl_idx),
                imports: vec![],
                params,
                uses: vec![],
                confidence: Confidence::High,
            });
        }
    }

    apply_scoping(&mut entities);
    dedupe_entities(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn strip_preserves_line_numbers() {
        let source = "int a; // trailing\n/* block\n comment */ int b;\n\"str\" int c;";
        let stripped = strip_comments_and_strings(&C_STYLE_STRIP, source);
        assert_eq!(source.matches('\n').count(), stripped.matches('\n').count());
        assert!(!stripped.contains("trailing"));
        assert!(!stripped.contains("comment"));
        assert!(!stripped.contains("str"));
        assert!(stripped.contains("int b;"));
    }

    #[test]
    fn body_end_counts_braces() {
        let lines = vec!["fn f() {", "  if x {", "  }", "}", "fn g() {}"];
        assert_eq!(find_body_end(&lines, 0), 3);
        assert_eq!(find_body_end(&lines, 4), 4);
    }

    #[test]
    fn body_end_without_close_returns_last_line() {
        let lines = vec!["fn f() {", "  x();"];
        assert_eq!(find_body_end(&lines, 0), 1);
    }

    #[test]
    fn calls_filter_builtins_and_common_methods() {
        let body = "helper(); printf(x); obj.process(); obj.get(k); Math.floor(y);";
        let calls = calls_from_body(body, &builtins::C_BUILTINS, &builtins::PY_COMMON_ATTR_METHODS);
        assert!(calls.contains(&"helper".to_string()));
        assert!(calls.contains(&"obj.process".to_string()));
        assert!(!calls.iter().any(|c| c == "printf"));
        assert!(!calls.iter().any(|c| c.ends_with(".get")));
    }

    #[test]
    fn params_handle_both_styles() {
        assert_eq!(
            params_from_decl("function f(a: string, b = 3, c)"),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            params_from_decl("static int f(int a, char *b)"),
            vec!["a", "b"]
        );
        assert!(params_from_decl("struct Foo").is_empty());
    }

    #[test]
    fn scoping_nests_under_classes() {
        let mk = |kind, name: &str, start, end| Entity {
            kind,
            name: name.to_string(),
            file_path: "t".to_string(),
            line_start: start,
            line_end: end,
            signature_hash: String::new(),
            structure_hash: String::new(),
            calls: vec![],
            inherits: vec![],
            type_refs: vec![],
            decorators: vec![],
            imports: vec![],
            params: vec![],
            uses: vec![],
            confidence: Confidence::High,
        };
        let mut entities = vec![
            mk(EntityKind::Function, "bark", 3, 4),
            mk(EntityKind::Class, "Dog", 1, 5),
            mk(EntityKind::Function, "free", 7, 8),
        ];
        apply_scoping(&mut entities);
        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Dog", "Dog.bark", "free"]);
    }

    #[test]
    fn dedupe_keeps_later_definition() {
        let mk = |name: &str, sig: &str| Entity {
            kind: EntityKind::Function,
            name: name.to_string(),
            file_path: "t".to_string(),
            line_start: 1,
            line_end: 1,
            signature_hash: sig.to_string(),
            structure_hash: String::new(),
            calls: vec![],
            inherits: vec![],
            type_refs: vec![],
            decorators: vec![],
            imports: vec![],
            params: vec![],
            uses: vec![],
            confidence: Confidence::High,
        };
        let result = dedupe_entities(vec![mk("f", "first"), mk("f", "second")]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].signature_hash, "second");
    }
}
