//! C++ language extractor using regex-based parsing.

use crate::builtins::{CPP_BUILTINS, CPP_COMMON_METHODS};
use crate::regex_base::{DeclRule, ImportRule, RegexRules, CONTROL_KEYWORDS};
use lattice_core::EntityKind;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Extract code entities from C++ source.
pub struct CppExtractor;

// Raw strings are matched approximately: the regex crate has no
// backreferences, so custom delimiters fall back to plain-string rules.
static CPP_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?://[^\n]*|/\*[\s\S]*?\*/|R"[^("]*\([\s\S]*?\)[^("]*"|'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*")"#,
    )
    .expect("cpp strip pattern")
});

static FUNC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:template\s*<[^>]*>\s*)?(?:(?:static|inline|virtual|explicit|constexpr|extern)\s+)*(?:[\w:*&<>]+\s+)+?(?P<name>[a-z_]\w*)\s*\([^)]*\)\s*(?:const\s*)?(?:noexcept\s*(?:\([^)]*\))?\s*)?(?:override\s*|final\s*)*\{",
    )
    .expect("cpp function pattern")
});

static CTOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:explicit\s+)?~?(?P<name>[A-Z]\w*)\s*\([^)]*\)\s*(?::\s*[^\{;]*?)?\s*\{")
        .expect("cpp ctor pattern")
});

static CLASS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:template\s*<[^>]*>\s*)?class\s+(?P<name>[A-Z]\w*)\s*(?:final\s*)?(?::\s*(?P<inherits>(?:(?:public|private|protected)\s+)?[A-Za-z_]\w*(?:\s*<[^>]*>)?(?:\s*,\s*(?:(?:public|private|protected)\s+)?[A-Za-z_]\w*(?:\s*<[^>]*>)?)*))?\s*\{",
    )
    .expect("cpp class pattern")
});

static STRUCT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:template\s*<[^>]*>\s*)?struct\s+(?P<name>[A-Z]\w*)\s*(?:final\s*)?(?::\s*(?P<inherits>(?:(?:public|private|protected)\s+)?[A-Za-z_]\w*(?:\s*<[^>]*>)?(?:\s*,\s*(?:(?:public|private|protected)\s+)?[A-Za-z_]\w*(?:\s*<[^>]*>)?)*))?\s*\{",
    )
    .expect("cpp struct pattern")
});

static ENUM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)enum\s+(?:class\s+)?(?P<name>[A-Z]\w*)\s*(?::\s*\w+\s*)?\{")
        .expect("cpp enum pattern")
});

static NAMESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)namespace\s+(?P<name>[A-Za-z_]\w*)\s*\{").expect("cpp namespace pattern")
});

static USING_ALIAS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)using\s+(?P<name>[A-Za-z_]\w*)\s*=").expect("cpp using alias pattern")
});

static TYPEDEF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)typedef\s+[^;\n]*?\s+(?P<name>[A-Za-z_]\w*)\s*;").expect("cpp typedef pattern")
});

static DECLS: LazyLock<Vec<DeclRule>> = LazyLock::new(|| {
    vec![
        DeclRule {
            kind: EntityKind::Function,
            regex: &FUNC_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Function,
            regex: &CTOR_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Class,
            regex: &CLASS_PATTERN,
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
            regex: &NAMESPACE_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Variable,
            regex: &USING_ALIAS_PATTERN,
        },
        DeclRule {
            kind: EntityKind::Variable,
            regex: &TYPEDEF_PATTERN,
        },
    ]
});

static INCLUDE_LOCAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)#\s*include\s+"(?P<path>[^"]+)""#).expect("cpp local include")
});

static INCLUDE_SYSTEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)#\s*include\s+<(?P<path>[^>]+)>").expect("cpp system include")
});

static USING_NS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)using\s+namespace\s+(?P<name>[A-Za-z_]\w*(?:::[A-Za-z_]\w*)*)\s*;")
        .expect("cpp using namespace")
});

fn parse_include_local(caps: &Captures) -> Vec<(String, String)> {
    vec![(".".to_string(), caps["path"].to_string())]
}

fn parse_include_system(caps: &Captures) -> Vec<(String, String)> {
    vec![(String::new(), caps["path"].to_string())]
}

fn parse_using_ns(caps: &Captures) -> Vec<(String, String)> {
    let name = caps["name"].to_string();
    vec![(name.clone(), name)]
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
        ImportRule {
            regex: &USING_NS,
            parse: parse_using_ns,
        },
    ]
});

impl RegexRules for CppExtractor {
    fn language_name(&self) -> &'static str {
        "cpp"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["cpp", "cc", "cxx", "hpp", "hh", "hxx", "h"]
    }

    fn strip_regex(&self) -> &Regex {
        &CPP_STRIP
    }

    fn declarations(&self) -> &[DeclRule] {
        &DECLS
    }

    fn imports(&self) -> &[ImportRule] {
        &IMPORTS
    }

    fn builtins(&self) -> &HashSet<&'static str> {
        &CPP_BUILTINS
    }

    fn common_methods(&self) -> &HashSet<&'static str> {
        &CPP_COMMON_METHODS
    }

    fn declaration_deny(&self) -> &HashSet<&'static str> {
        &CONTROL_KEYWORDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::LanguageExtractor;
    use lattice_core::EntityKind;

    #[test]
    fn extract_class_with_inheritance_and_methods() {
        let source = r#"
class AudioSink : public Sink, private Clocked {
public:
    void drain(int frames) {
        resample(frames);
    }
};
"#;
        let entities = CppExtractor.extract(source, "src/audio.cpp");
        let sink = entities.iter().find(|e| e.name == "AudioSink").unwrap();
        assert_eq!(sink.kind, EntityKind::Class);
        assert_eq!(sink.inherits, vec!["Sink", "Clocked"]);
        let drain = entities.iter().find(|e| e.name == "AudioSink.drain").unwrap();
        assert!(drain.calls.contains(&"resample".to_string()));
    }

    #[test]
    fn constructor_extracted_by_name() {
        let source = "AudioSink::AudioSink(int rate) : rate_(rate) {\n}\n";
        let entities = CppExtractor.extract(source, "src/audio.cpp");
        assert!(entities
            .iter()
            .any(|e| e.name == "AudioSink" && e.kind == EntityKind::Function));
    }

    #[test]
    fn namespace_and_using_alias() {
        let source = "namespace audio {\nusing FrameVec = std::vector<Frame>;\n}\n";
        let entities = CppExtractor.extract(source, "src/ns.hpp");
        assert!(entities
            .iter()
            .any(|e| e.name == "audio" && e.kind == EntityKind::Class));
        // Namespaces act as scope containers.
        assert!(entities
            .iter()
            .any(|e| e.name == "audio.FrameVec" && e.kind == EntityKind::Variable));
    }

    #[test]
    fn includes_and_using_namespace() {
        let source = "#include \"sink.hpp\"\n#include <vector>\nusing namespace audio;\n";
        let entities = CppExtractor.extract(source, "src/main.cpp");
        let imports: Vec<_> = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Import)
            .collect();
        assert!(imports.iter().any(|e| e.name == "sink.hpp"));
        assert!(imports.iter().any(|e| e.name == "vector"));
        assert!(imports.iter().any(|e| e.name == "audio"));
    }
}
