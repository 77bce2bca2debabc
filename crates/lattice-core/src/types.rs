use serde::{Deserialize, Serialize};

use crate::LatticeError;

// ── Entity Model ────────────────────────────────────────────────────────────

/// The kinds of source-code entities recognized by extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Class,
    Variable,
    Import,
    /// Synthetic entity holding free module-level code.
    ModuleCode,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Class => write!(f, "class"),
            Self::Variable => write!(f, "variable"),
            Self::Import => write!(f, "import"),
            Self::ModuleCode => write!(f, "module_code"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = LatticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(Self::Function),
            "class" => Ok(Self::Class),
            "variable" => Ok(Self::Variable),
            "import" => Ok(Self::Import),
            "module_code" => Ok(Self::ModuleCode),
            _ => Err(LatticeError::Graph(format!("invalid entity kind: {s}"))),
        }
    }
}

/// A unit of code structure extracted from one file.
///
/// Methods carry scoped names (`Outer.inner`); free names are bare.
/// List fields may be empty but are never missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "entity_type")]
    pub kind: EntityKind,
    pub name: String,
    /// Project-relative, forward-slash path.
    pub file_path: String,
    /// 1-indexed, inclusive.
    pub line_start: u32,
    pub line_end: u32,
    /// 12-hex-digit prefix of the hash of the entity's canonical text.
    pub signature_hash: String,
    /// Same, with the defined name replaced by a sentinel before hashing.
    pub structure_hash: String,
    #[serde(default)]
    pub calls: Vec<String>,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub type_refs: Vec<String>,
    #[serde(default)]
    pub decorators: Vec<String>,
    /// `(module, symbol)` pairs; `module` may be empty for plain imports.
    #[serde(default)]
    pub imports: Vec<(String, String)>,
    #[serde(default)]
    pub params: Vec<String>,
    /// Names referenced in load position; an explicit export marker
    /// (`__all__`-style) stores its published names here.
    #[serde(default)]
    pub uses: Vec<String>,
    #[serde(default = "Confidence::high")]
    pub confidence: Confidence,
}

impl Entity {
    /// Last segment of the scoped name.
    pub fn bare_name(&self) -> &str {
        bare_name(&self.name)
    }

    /// Diff key: entities are matched across versions by kind + name.
    pub fn key(&self) -> (EntityKind, &str) {
        (self.kind, self.name.as_str())
    }
}

/// Strip scope prefixes from a scoped name (`Outer.inner` → `inner`).
pub fn bare_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

// ── Graph Node / Edge ───────────────────────────────────────────────────────

/// Resolution certainty for edges and recovered entities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    #[default]
    High,
}

impl Confidence {
    pub fn high() -> Self {
        Self::High
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// The graph's persistent view of an entity.
///
/// Identity is `file_path + "::" + scoped_name`; a node survives
/// modification in place and is deleted only when its entity disappears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeNode {
    pub id: String,
    #[serde(flatten)]
    pub entity: Entity,
    /// Epoch seconds of the extraction that last touched this node.
    pub last_seen: i64,
}

impl CodeNode {
    pub fn new(entity: Entity) -> Self {
        let id = node_id(&entity.file_path, &entity.name);
        Self {
            id,
            entity,
            last_seen: chrono::Utc::now().timestamp(),
        }
    }
}

/// Build a node id from its two identity components.
pub fn node_id(file_path: &str, scoped_name: &str) -> String {
    format!("{file_path}::{scoped_name}")
}

/// The kinds of directed relationships between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Calls,
    Imports,
    Inherits,
    UsesType,
    DecoratedBy,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 5] = [
        EdgeKind::Calls,
        EdgeKind::Imports,
        EdgeKind::Inherits,
        EdgeKind::UsesType,
        EdgeKind::DecoratedBy,
    ];
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calls => write!(f, "calls"),
            Self::Imports => write!(f, "imports"),
            Self::Inherits => write!(f, "inherits"),
            Self::UsesType => write!(f, "uses_type"),
            Self::DecoratedBy => write!(f, "decorated_by"),
        }
    }
}

impl std::str::FromStr for EdgeKind {
    type Err = LatticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calls" => Ok(Self::Calls),
            "imports" => Ok(Self::Imports),
            "inherits" => Ok(Self::Inherits),
            "uses_type" => Ok(Self::UsesType),
            "decorated_by" => Ok(Self::DecoratedBy),
            _ => Err(LatticeError::Graph(format!("invalid edge kind: {s}"))),
        }
    }
}

/// Prefix of symbolic targets for edges whose definition is not yet known.
pub const UNRESOLVED_PREFIX: &str = "unresolved:";

/// Symbolic target id for an unresolved name.
pub fn placeholder_target(name: &str) -> String {
    format!("{UNRESOLVED_PREFIX}{}", bare_name(name))
}

/// If `id` is a placeholder target, return the bare name it stands for.
pub fn placeholder_name(id: &str) -> Option<&str> {
    id.strip_prefix(UNRESOLVED_PREFIX)
}

/// A directed labeled edge. At most one edge of a given kind exists
/// between a given ordered pair of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEdge {
    pub source_id: String,
    /// Real node id, or `unresolved:<name>` while the target is unknown.
    #[serde(rename = "target_id_or_placeholder")]
    pub target_id: String,
    pub kind: EdgeKind,
    pub confidence: Confidence,
    /// Always the file of the source node; used to bulk-invalidate edges
    /// when that file is re-extracted.
    pub source_file: String,
}

impl CodeEdge {
    pub fn is_unresolved(&self) -> bool {
        self.target_id.starts_with(UNRESOLVED_PREFIX)
    }
}

// ── Change Events ───────────────────────────────────────────────────────────

/// What kind of file event the host observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Edit,
    Create,
    Delete,
}

/// Warnings attached to the report of one `process_change` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// This edit introduced a file-level dependency cycle.
    CycleIntroduced { files: Vec<String> },
    /// A node that previously had callers now has none.
    NewlyDead { name: String, file_path: String },
    /// A public entity's signature changed and parameters were lost or
    /// reordered.
    BreakingChange {
        name: String,
        file_path: String,
        lost_params: Vec<String>,
    },
    /// The file could not be parsed; previous entities were retained.
    ParseFailure { file_path: String },
    /// The propagator queue exceeded its budget; excess work was dropped.
    PropagationBudget { dropped: usize },
}

/// Structured result of one `process_change` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeReport {
    pub file_path: String,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub renamed: usize,
    pub warnings: Vec<Warning>,
    /// Files re-resolved by the bounded propagator during this call.
    pub propagated: Vec<String>,
}

impl ChangeReport {
    pub fn for_file(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            ..Default::default()
        }
    }

    /// True when the call changed nothing in the graph.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.modified == 0 && self.renamed == 0
    }
}

// ── Test-file Detection ─────────────────────────────────────────────────────

/// Heuristic multi-language test-file check.
///
/// Matches `test_*.py`, `*_test.py`, `*.test.ts`, `*.spec.js`,
/// `*_test.rs`, `*Test.java`, `*_test.c`/`.cc`/`.cpp`, and anything
/// under a `tests/`, `test/`, `testing/`, `__tests__/`, or `spec/` dir.
pub fn is_test_file(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    let basename = normalized.rsplit('/').next().unwrap_or(&normalized);

    if basename.starts_with("test_") || basename.ends_with("_test.py") {
        return true;
    }
    const JS_SUFFIXES: [&str; 10] = [
        ".test.ts", ".spec.ts", ".test.tsx", ".spec.tsx", ".test.js", ".spec.js", ".test.jsx",
        ".spec.jsx", ".test.mjs", ".spec.mjs",
    ];
    if JS_SUFFIXES.iter().any(|s| basename.ends_with(s)) {
        return true;
    }
    if basename.ends_with("_test.rs") {
        return true;
    }
    if basename.ends_with("Test.java") || basename.ends_with("Tests.java") {
        return true;
    }
    const C_SUFFIXES: [&str; 6] = [
        "_test.cpp", "_test.cc", "_test.cxx", "_test.c", "_test.hpp", "_test.h",
    ];
    if C_SUFFIXES.iter().any(|s| basename.ends_with(s)) {
        return true;
    }

    normalized
        .split('/')
        .any(|p| matches!(p, "tests" | "test" | "testing" | "__tests__" | "spec"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(kind: EntityKind, name: &str) -> Entity {
        Entity {
            kind,
            name: name.to_string(),
            file_path: "src/app.py".to_string(),
            line_start: 1,
            line_end: 3,
            signature_hash: "a".repeat(12),
            structure_hash: "b".repeat(12),
            calls: vec![],
            inherits: vec![],
            type_refs: vec![],
            decorators: vec![],
            imports: vec![],
            params: vec![],
            uses: vec![],
            confidence: Confidence::High,
        }
    }

    #[test]
    fn node_id_joins_file_and_name() {
        assert_eq!(node_id("src/a.py", "Foo.bar"), "src/a.py::Foo.bar");
    }

    #[test]
    fn bare_name_strips_scope() {
        assert_eq!(bare_name("Outer.inner"), "inner");
        assert_eq!(bare_name("free"), "free");
        assert_eq!(bare_name("A.B.c"), "c");
    }

    #[test]
    fn placeholder_roundtrip() {
        let target = placeholder_target("Service.handle");
        assert_eq!(target, "unresolved:handle");
        assert_eq!(placeholder_name(&target), Some("handle"));
        assert_eq!(placeholder_name("src/a.py::handle"), None);
    }

    #[test]
    fn confidence_orders_low_to_high() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn entity_serde_uses_spec_field_names() {
        let e = entity(EntityKind::Function, "go");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["entity_type"], "function");
        assert!(json["signature_hash"].is_string());
        assert!(json["params"].is_array());
    }

    #[test]
    fn edge_serde_uses_placeholder_field_name() {
        let edge = CodeEdge {
            source_id: "a.py::go".to_string(),
            target_id: placeholder_target("util"),
            kind: EdgeKind::Calls,
            confidence: Confidence::Low,
            source_file: "a.py".to_string(),
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["target_id_or_placeholder"], "unresolved:util");
        assert_eq!(json["kind"], "calls");
        assert!(edge.is_unresolved());
    }

    #[test]
    fn kind_display_roundtrips() {
        for kind in EdgeKind::ALL {
            let parsed: EdgeKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        let parsed: EntityKind = "module_code".parse().unwrap();
        assert_eq!(parsed, EntityKind::ModuleCode);
    }

    #[test]
    fn test_file_detection_multi_language() {
        assert!(is_test_file("tests/test_bridge.py"));
        assert!(is_test_file("src/app.test.ts"));
        assert!(is_test_file("src/parser_test.rs"));
        assert!(is_test_file("src/FooTest.java"));
        assert!(is_test_file("pkg/__tests__/widget.js"));
        assert!(!is_test_file("src/app.py"));
        assert!(!is_test_file("src/contest.py"));
    }

    #[test]
    fn report_noop_when_all_buckets_empty() {
        let report = ChangeReport::for_file("a.py");
        assert!(report.is_noop());
        let mut changed = ChangeReport::for_file("a.py");
        changed.modified = 1;
        assert!(!changed.is_noop());
    }
}
