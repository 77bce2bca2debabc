//! Java language extractor using regex-based parsing.

use crate::builtins::{
    JAVA_BUILTINS, JAVA_COMMON_METHODS, JAVA_STANDARD_ANNOTATIONS, JAVA_TYPE_BUILTINS,
};
use crate::regex_base::{DeclRule, ImportRule, RegexRules, CONTROL_KEYWORDS};
use lattice_core::EntityKind;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Extract code entities from Java source.
pub struct JavaExtractor;

static JAVA_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?://[^\n]*|/\*[\s\S]*?\*/|"""[\s\S]*?"""|'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*")"#,
    )
    .expect("java strip pattern")
});

const MODIFIERS: &str = r"(?:(?:public|private|protected|static|final|abstract|synchronized|native|strictfp|sealed|default)\s+)*";

static CLASS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m){MODIFIERS}class\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?(?:\s+extends\s+(?P<inherits>[A-Za-z_]\w*(?:\s*<[^>]*>)?))?(?:\s+implements\s+[A-Za-z_][\w.,<>\s]*)?\s*\{{"
    ))
    .expect("java class pattern")
});

static INTERFACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m){MODIFIERS}interface\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?(?:\s+extends\s+(?P<inherits>[A-Za-z_][\w.,<>\s]*))?\s*\{{"
    ))
    .expect("java interface pattern")
});

static ENUM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m){MODIFIERS}enum\s+(?P<name>[A-Z]\w*)\s*(?:\s+implements\s+(?P<inherits>[A-Za-z_][\w.,<>\s]*))?\s*\{{"
    ))
    .expect("java enum pattern")
});

static RECORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m){MODIFIERS}record\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?\s*\([^)]*\)(?:\s+implements\s+(?P<inherits>[A-Za-z_][\w.,<>\s]*))?\s*\{{"
    ))
    .expect("java record pattern")
});

static ANNOTATION_TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m){MODIFIERS}@interface\s+(?P<name>[A-Z]\w*)\s*\{{"))
        .expect("java annotation type pattern")
});

static METHOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m){MODIFIERS}(?:<[^>]*>\s+)?(?:[\w<>\[\],.\s]+?\s+)(?P<name>[a-z_]\w*)\s*\([^)]*\)\s*(?:throws\s+[\w.,\s]+)?\s*\{{"
    ))
    .expect("java method pattern")
});

static CONSTRUCTOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m){MODIFIERS}(?P<name>[A-Z]\w*)\s*\([^)]*\)\s*(?:throws\s+[\w.,\s]+)?\s*\{{"
    ))
    .expect("java constructor pattern")
});

static DECLS: LazyLock<Vec<DeclRule>> = LazyLock::new(|| {
    vec![
        DeclRule {
            kind: EntityKind::Function,
            regex: &METHOD_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Function,
            regex: &CONSTRUCTOR_PATTERN,
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
            kind: EntityKind::Class,
            regex: &RECORD_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &ANNOTATION_TYPE_PATTERN,
        },
    ]
});

static IMPORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)import\s+(?:static\s+)?(?P<path>[\w.]+)\.(?P<name>[A-Za-z_]\w*|\*)\s*;")
        .expect("java import pattern")
});

fn parse_import(caps: &Captures) -> Vec<(String, String)> {
    vec![(caps["path"].to_string(), caps["name"].to_string())]
}

static IMPORTS: LazyLock<Vec<ImportRule>> = LazyLock::new(|| {
    vec![ImportRule {
        regex: &IMPORT_PATTERN,
        parse: parse_import,
    }]
});

static TYPE_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:<\s*|,\s*)([A-Z][A-Za-z0-9_]*)").expect("java type ref"));

impl RegexRules for JavaExtractor {
    fn language_name(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn strip_regex(&self) -> &Regex {
        &JAVA_STRIP
    }

    fn declarations(&self) -> &[DeclRule] {
        &DECLS
    }

    fn imports(&self) -> &[ImportRule] {
        &IMPORTS
    }

    fn builtins(&self) -> &HashSet<&'static str> {
        &JAVA_BUILTINS
    }

    fn common_methods(&self) -> &HashSet<&'static str> {
        &JAVA_COMMON_METHODS
    }

    fn standard_decorators(&self) -> &HashSet<&'static str> {
        &JAVA_STANDARD_ANNOTATIONS
    }

    fn declaration_deny(&self) -> &HashSet<&'static str> {
        &CONTROL_KEYWORDS
    }

    fn type_refs(&self, body: &str) -> Vec<String> {
        let mut refs = Vec::new();
        let mut seen = HashSet::new();
        for caps in TYPE_REF_PATTERN.captures_iter(body) {
            let name = caps[1].to_string();
            if !JAVA_TYPE_BUILTINS.contains(name.as_str())
                && !JAVA_BUILTINS.contains(name.as_str())
                && seen.insert(name.clone())
            {
                refs.push(name);
            }
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::LanguageExtractor;
    use lattice_core::EntityKind;

    #[test]
    fn extract_class_with_methods_and_inheritance() {
        let source = r#"
public class OrderService extends BaseService {
    public Receipt checkout(Cart cart) {
        validateCart(cart);
        return buildReceipt(cart);
    }
}
"#;
        let entities = JavaExtractor.extract(source, "src/OrderService.java");
        let service = entities.iter().find(|e| e.name == "OrderService").unwrap();
        assert_eq!(service.kind, EntityKind::Class);
        assert_eq!(service.inherits, vec!["BaseService"]);
        let checkout = entities
            .iter()
            .find(|e| e.name == "OrderService.checkout")
            .unwrap();
        assert!(checkout.calls.contains(&"validateCart".to_string()));
        assert!(checkout.calls.contains(&"buildReceipt".to_string()));
        assert_eq!(checkout.params, vec!["cart"]);
    }

    #[test]
    fn imports_split_path_and_name() {
        let source = "import java.util.List;\nimport com.acme.billing.Invoice;\n";
        let entities = JavaExtractor.extract(source, "src/Main.java");
        let imports: Vec<_> = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Import)
            .collect();
        assert!(imports
            .iter()
            .any(|e| e.name == "Invoice" && e.imports[0].0 == "com.acme.billing"));
        assert!(imports.iter().any(|e| e.name == "List"));
    }

    #[test]
    fn standard_annotations_filtered() {
        let source =
            "public class T {\n    @Override\n    @Transactional\n    public void go() {\n    }\n}\n";
        let entities = JavaExtractor.extract(source, "src/T.java");
        let go = entities.iter().find(|e| e.name == "T.go").unwrap();
        assert_eq!(go.decorators, vec!["Transactional"]);
    }

    #[test]
    fn interface_extends_recorded() {
        let source = "public interface Audited extends Logged {\n}\n";
        let entities = JavaExtractor.extract(source, "src/Audited.java");
        let audited = entities.iter().find(|e| e.name == "Audited").unwrap();
        assert_eq!(audited.inherits, vec!["Logged"]);
    }

    #[test]
    fn constructor_extracted() {
        let source = "public class Cart {\n    public Cart(int size) {\n    }\n}\n";
        let entities = JavaExtractor.extract(source, "src/Cart.java");
        assert!(entities
            .iter()
            .any(|e| e.name == "Cart.Cart" && e.kind == EntityKind::Function));
    }
}
