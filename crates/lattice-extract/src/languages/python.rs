//! Python reference extractor: a full-AST front end on tree-sitter-python.
//!
//! Covers functions, classes, decorators, imports, type annotations,
//! module-level variables, `__all__` exports, and a synthetic
//! `__module__` entity for free module-level calls. When the parse tree
//! contains errors the partial-recovery path in [`super::recovery`]
//! takes over.

use crate::builtins::{
    PY_BUILTINS, PY_COMMON_ATTR_METHODS, PY_EXTERNAL_PACKAGES, PY_STANDARD_DECORATORS,
    PY_STDLIB_MODULES, PY_TYPE_BUILTINS,
};
use crate::extractor::LanguageExtractor;
use crate::hash;
use crate::regex_base::dedupe_entities;
use lattice_core::{Confidence, Entity, EntityKind};
use std::collections::{HashMap, HashSet};
use tree_sitter::{Node, Parser, Tree};

use super::recovery;

/// Python language extractor for tree-sitter-based full-AST extraction.
pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn language_name(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Vec<Entity> {
        if source.trim().is_empty() {
            return Vec::new();
        }
        match parse(source) {
            Some(tree) if !tree.root_node().has_error() => extract_tree(&tree, source, file_path),
            _ => {
                tracing::debug!("partial recovery for unparseable file {file_path}");
                recovery::recover(source, file_path)
            }
        }
    }
}

/// Parse Python source; `None` only if the grammar fails to load.
pub(crate) fn parse(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .ok()?;
    parser.parse(source.as_bytes(), None)
}

/// Extract entities from a clean (error-free) parse tree.
pub(crate) fn extract_tree(tree: &Tree, source: &str, file_path: &str) -> Vec<Entity> {
    let src = source.as_bytes();
    let root = tree.root_node();
    let ctx = ModuleContext::collect(root, src);

    let mut entities = Vec::new();
    let mut scope: Vec<String> = Vec::new();
    visit(root, src, file_path, &ctx, &mut scope, &mut entities);
    extract_module_calls(root, src, file_path, &ctx, &mut entities);
    dedupe_entities(entities)
}

// ── Module pre-passes ───────────────────────────────────────────────────────

/// File-wide context collected before the entity walk.
struct ModuleContext {
    /// Local names bound to stdlib or known-external imports.
    stdlib_names: HashSet<String>,
    /// PascalCase names imported from external packages.
    external_types: HashSet<String>,
    /// Module-level variable → type mappings (`x = SomeClass()`).
    module_types: HashMap<String, String>,
}

impl ModuleContext {
    fn collect(root: Node, src: &[u8]) -> Self {
        let mut stdlib_names = HashSet::new();
        let mut external_types = HashSet::new();

        walk_nodes(root, &mut |node| match node.kind() {
            "import_statement" => {
                for (module, _symbol, local) in import_aliases(node, src) {
                    let top = module.split('.').next().unwrap_or(&module);
                    if PY_STDLIB_MODULES.contains(top) || PY_EXTERNAL_PACKAGES.contains(top) {
                        stdlib_names.insert(local.clone());
                        if PY_EXTERNAL_PACKAGES.contains(top) && starts_upper(&local) {
                            external_types.insert(local);
                        }
                    }
                }
            }
            "import_from_statement" => {
                let module = from_module(node, src);
                let top = module.split('.').next().unwrap_or(&module);
                if PY_STDLIB_MODULES.contains(top) || PY_EXTERNAL_PACKAGES.contains(top) {
                    for (_symbol, local) in from_names(node, src) {
                        stdlib_names.insert(local.clone());
                        if PY_EXTERNAL_PACKAGES.contains(top) && starts_upper(&local) {
                            external_types.insert(local);
                        }
                    }
                }
            }
            _ => {}
        });

        let mut module_types = HashMap::new();
        for stmt in named_children(root) {
            if stmt.kind() == "expression_statement" {
                if let Some(assign) = stmt.named_child(0).filter(|n| n.kind() == "assignment") {
                    collect_type_bindings(assign, src, &mut module_types);
                }
            }
        }

        Self {
            stdlib_names,
            external_types,
            module_types,
        }
    }
}

/// Record `x = SomeClass()` and `x: SomeClass` bindings from one
/// assignment node.
fn collect_type_bindings(assign: Node, src: &[u8], out: &mut HashMap<String, String>) {
    let Some(left) = assign.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let target = node_text(left, src);

    if let Some(type_node) = assign.child_by_field_name("type") {
        if let Some(name) = annotation_head(type_node, src) {
            out.insert(target, name);
            return;
        }
    }
    if let Some(right) = assign.child_by_field_name("right") {
        if right.kind() == "call" {
            if let Some(func) = right.child_by_field_name("function") {
                match func.kind() {
                    "identifier" => {
                        out.insert(target, node_text(func, src));
                    }
                    "attribute" => {
                        if let Some(attr) = func.child_by_field_name("attribute") {
                            out.insert(target, node_text(attr, src));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// First plain identifier of an annotation (`Foo`, `mod.Foo`).
fn annotation_head(type_node: Node, src: &[u8]) -> Option<String> {
    let inner = if type_node.kind() == "type" {
        type_node.named_child(0)?
    } else {
        type_node
    };
    match inner.kind() {
        "identifier" => Some(node_text(inner, src)),
        "attribute" => inner
            .child_by_field_name("attribute")
            .map(|n| node_text(n, src)),
        _ => None,
    }
}

// ── Entity walk ─────────────────────────────────────────────────────────────

fn visit(
    node: Node,
    src: &[u8],
    file_path: &str,
    ctx: &ModuleContext,
    scope: &mut Vec<String>,
    entities: &mut Vec<Entity>,
) {
    match node.kind() {
        "function_definition" => {
            visit_function(node, src, file_path, ctx, scope, Vec::new(), entities);
            return;
        }
        "class_definition" => {
            visit_class(node, src, file_path, ctx, scope, Vec::new(), entities);
            return;
        }
        "decorated_definition" => {
            let decorators = decorator_names(node, src);
            if let Some(inner) = node.child_by_field_name("definition") {
                match inner.kind() {
                    "function_definition" => {
                        visit_function(inner, src, file_path, ctx, scope, decorators, entities);
                    }
                    "class_definition" => {
                        visit_class(inner, src, file_path, ctx, scope, decorators, entities);
                    }
                    _ => {}
                }
            }
            return;
        }
        "import_statement" => {
            visit_import(node, src, file_path, entities);
            return;
        }
        "import_from_statement" => {
            visit_import_from(node, src, file_path, entities);
            return;
        }
        "expression_statement" => {
            if scope.is_empty() {
                if let Some(assign) = node.named_child(0).filter(|n| n.kind() == "assignment") {
                    visit_module_assign(assign, node, src, file_path, entities);
                    return;
                }
            }
        }
        _ => {}
    }

    for child in named_children(node) {
        visit(child, src, file_path, ctx, scope, entities);
    }
}

fn visit_function(
    node: Node,
    src: &[u8],
    file_path: &str,
    ctx: &ModuleContext,
    scope: &mut Vec<String>,
    decorators: Vec<String>,
    entities: &mut Vec<Entity>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let bare = node_text(name_node, src);
    let scoped = scoped_name(scope, &bare);

    let all_params = parameter_names(node, src, false);
    let params = parameter_names(node, src, true);
    let type_ctx = function_type_context(node, src);
    let enclosing_class = scope.last().cloned();

    let fp = fingerprint(node, src, None);
    let fp_nameless = fingerprint(node, src, Some(&bare));

    entities.push(Entity {
        kind: EntityKind::Function,
        name: scoped,
        file_path: file_path.to_string(),
        line_start: node.start_position().row as u32 + 1,
        line_end: node.end_position().row as u32 + 1,
        signature_hash: hash::short_hash(&format!(
            "func:{bare}({})|body:{}",
            all_params.join(","),
            hash::short_hash_len(&fp, 8)
        )),
        structure_hash: hash::short_hash(&format!(
            "func_struct:({})|{}",
            all_params.join(","),
            hash::short_hash_len(&fp_nameless, 8)
        )),
        calls: extract_calls(node, src, enclosing_class.as_deref(), ctx, &type_ctx),
        inherits: vec![],
        type_refs: annotation_refs(node, src),
        decorators,
        imports: vec![],
        params,
        uses: load_names(node, src),
        confidence: Confidence::High,
    });

    scope.push(bare);
    if let Some(body) = node.child_by_field_name("body") {
        for child in named_children(body) {
            visit(child, src, file_path, ctx, scope, entities);
        }
    }
    scope.pop();
}

fn visit_class(
    node: Node,
    src: &[u8],
    file_path: &str,
    ctx: &ModuleContext,
    scope: &mut Vec<String>,
    decorators: Vec<String>,
    entities: &mut Vec<Entity>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let bare = node_text(name_node, src);
    let scoped = scoped_name(scope, &bare);

    let mut inherits = Vec::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        for child in named_children(superclasses) {
            match child.kind() {
                "identifier" => inherits.push(node_text(child, src)),
                "attribute" => {
                    if let Some(attr) = child.child_by_field_name("attribute") {
                        inherits.push(node_text(attr, src));
                    }
                }
                _ => {}
            }
        }
    }

    let fp = fingerprint(node, src, None);
    let fp_nameless = fingerprint(node, src, Some(&bare));
    let empty_ctx = HashMap::new();

    entities.push(Entity {
        kind: EntityKind::Class,
        name: scoped,
        file_path: file_path.to_string(),
        line_start: node.start_position().row as u32 + 1,
        line_end: node.end_position().row as u32 + 1,
        signature_hash: hash::short_hash(&format!(
            "class:{bare}({})|body:{}",
            inherits.join(","),
            hash::short_hash_len(&fp, 8)
        )),
        structure_hash: hash::short_hash(&format!(
            "class_struct:|{}",
            hash::short_hash_len(&fp_nameless, 8)
        )),
        calls: extract_calls(node, src, scope.last().map(|s| s.as_str()), ctx, &empty_ctx),
        inherits: inherits.clone(),
        type_refs: vec![],
        decorators,
        imports: vec![],
        params: vec![],
        uses: load_names(node, src),
        confidence: Confidence::High,
    });

    scope.push(bare);
    if let Some(body) = node.child_by_field_name("body") {
        for child in named_children(body) {
            visit(child, src, file_path, ctx, scope, entities);
        }
    }
    scope.pop();
}

fn visit_module_assign(
    assign: Node,
    stmt: Node,
    src: &[u8],
    file_path: &str,
    entities: &mut Vec<Entity>,
) {
    let Some(left) = assign.child_by_field_name("left") else {
        return;
    };
    let mut target_names = Vec::new();
    match left.kind() {
        "identifier" => target_names.push(node_text(left, src)),
        "pattern_list" | "tuple_pattern" => {
            for child in named_children(left) {
                if child.kind() == "identifier" {
                    target_names.push(node_text(child, src));
                }
            }
        }
        _ => {}
    }
    if target_names.is_empty() {
        return;
    }
    let name = target_names.join(", ");

    let right = assign.child_by_field_name("right");
    let mut uses = right.map(|r| load_names(r, src)).unwrap_or_default();
    // `__all__` publishes its string elements as the exported set.
    if name == "__all__" {
        if let Some(r) = right.filter(|r| matches!(r.kind(), "list" | "tuple")) {
            uses = named_children(r)
                .filter(|c| c.kind() == "string")
                .map(|c| string_content(c, src))
                .collect();
        }
    }

    let value_fp = right
        .map(|r| fingerprint(r, src, None))
        .unwrap_or_default();
    entities.push(Entity {
        kind: EntityKind::Variable,
        name,
        file_path: file_path.to_string(),
        line_start: stmt.start_position().row as u32 + 1,
        line_end: stmt.end_position().row as u32 + 1,
        signature_hash: hash::short_hash(&format!("var:{}|{value_fp}", node_text(left, src))),
        structure_hash: hash::short_hash("other:assignment"),
        calls: vec![],
        inherits: vec![],
        type_refs: vec![],
        decorators: vec![],
        imports: vec![],
        params: vec![],
        uses,
        confidence: Confidence::High,
    });
}

fn visit_import(node: Node, src: &[u8], file_path: &str, entities: &mut Vec<Entity>) {
    let stmt_text = node_text(node, src);
    let sig_hash = hash::short_hash(&format!("import:{stmt_text}"));
    let struct_hash = hash::short_hash("other:import");
    for (_module, symbol, local) in import_aliases(node, src) {
        entities.push(import_entity(
            node, file_path, local, String::new(), symbol, &sig_hash, &struct_hash,
        ));
    }
}

fn visit_import_from(node: Node, src: &[u8], file_path: &str, entities: &mut Vec<Entity>) {
    let stmt_text = node_text(node, src);
    let sig_hash = hash::short_hash(&format!("import:{stmt_text}"));
    let struct_hash = hash::short_hash("other:import");
    let module = from_module(node, src);
    for (symbol, local) in from_names(node, src) {
        entities.push(import_entity(
            node,
            file_path,
            local,
            module.clone(),
            symbol,
            &sig_hash,
            &struct_hash,
        ));
    }
}

fn import_entity(
    node: Node,
    file_path: &str,
    local: String,
    module: String,
    symbol: String,
    sig_hash: &str,
    struct_hash: &str,
) -> Entity {
    Entity {
        kind: EntityKind::Import,
        name: local,
        file_path: file_path.to_string(),
        line_start: node.start_position().row as u32 + 1,
        line_end: node.end_position().row as u32 + 1,
        signature_hash: sig_hash.to_string(),
        structure_hash: struct_hash.to_string(),
        calls: vec![],
        inherits: vec![],
        type_refs: vec![],
        decorators: vec![],
        imports: vec![(module, symbol)],
        params: vec![],
        uses: vec![],
        confidence: Confidence::High,
    }
}

/// Synthetic `__module__` entity for free module-level calls.
fn extract_module_calls(
    root: Node,
    src: &[u8],
    file_path: &str,
    ctx: &ModuleContext,
    entities: &mut Vec<Entity>,
) {
    let mut module_calls = Vec::new();
    for stmt in named_children(root) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(call) = stmt.named_child(0).filter(|n| n.kind() == "call") else {
            continue;
        };
        let Some(func) = call.child_by_field_name("function") else {
            continue;
        };
        match func.kind() {
            "identifier" => {
                let name = node_text(func, src);
                if !PY_BUILTINS.contains(name.as_str()) && !ctx.stdlib_names.contains(&name) {
                    module_calls.push(name);
                }
            }
            "attribute" => {
                let bare = func
                    .child_by_field_name("attribute")
                    .map(|n| node_text(n, src))
                    .unwrap_or_default();
                let receiver = func
                    .child_by_field_name("object")
                    .filter(|o| o.kind() == "identifier")
                    .map(|o| node_text(o, src));
                if receiver
                    .as_ref()
                    .is_some_and(|r| ctx.stdlib_names.contains(r))
                {
                    continue;
                }
                if !PY_BUILTINS.contains(bare.as_str())
                    && !PY_COMMON_ATTR_METHODS.contains(bare.as_str())
                {
                    module_calls.push(bare);
                }
            }
            _ => {}
        }
    }

    if !module_calls.is_empty() {
        entities.push(Entity {
            kind: EntityKind::ModuleCode,
            name: "__module__".to_string(),
            file_path: file_path.to_string(),
            line_start: 1,
            line_end: 1,
            signature_hash: "module".to_string(),
            structure_hash: "module".to_string(),
            calls: module_calls,
            inherits: vec![],
            type_refs: vec![],
            decorators: vec![],
            imports: vec![],
            params: vec![],
            uses: vec![],
            confidence: Confidence::High,
        });
    }
}

// ── Call / annotation / parameter helpers ───────────────────────────────────

/// Extract call targets from a subtree.
///
/// `self.method()` inside a class becomes `Class.method`; calls through
/// stdlib or external receivers are skipped; typed receivers qualify the
/// call as `Type.method`.
fn extract_calls(
    node: Node,
    src: &[u8],
    enclosing_class: Option<&str>,
    ctx: &ModuleContext,
    type_ctx: &HashMap<String, String>,
) -> Vec<String> {
    let mut calls = Vec::new();
    walk_nodes(node, &mut |n| {
        if n.kind() != "call" {
            return;
        }
        let Some(func) = n.child_by_field_name("function") else {
            return;
        };
        match func.kind() {
            "identifier" => {
                let name = node_text(func, src);
                if !PY_BUILTINS.contains(name.as_str()) && !ctx.stdlib_names.contains(&name) {
                    calls.push(name);
                }
            }
            "attribute" => {
                let bare = func
                    .child_by_field_name("attribute")
                    .map(|a| node_text(a, src))
                    .unwrap_or_default();
                let receiver = func
                    .child_by_field_name("object")
                    .filter(|o| o.kind() == "identifier")
                    .map(|o| node_text(o, src));

                match receiver.as_deref() {
                    Some("self") | Some("cls") if enclosing_class.is_some() => {
                        calls.push(format!("{}.{bare}", enclosing_class.unwrap_or_default()));
                    }
                    Some(r) if ctx.stdlib_names.contains(r) => {}
                    Some(r) if type_ctx.contains_key(r) || ctx.module_types.contains_key(r) => {
                        let class_name = type_ctx
                            .get(r)
                            .or_else(|| ctx.module_types.get(r))
                            .cloned()
                            .unwrap_or_default();
                        if !ctx.external_types.contains(&class_name) {
                            calls.push(format!("{class_name}.{bare}"));
                        }
                    }
                    receiver => {
                        if !PY_BUILTINS.contains(bare.as_str())
                            && !PY_COMMON_ATTR_METHODS.contains(bare.as_str())
                        {
                            match receiver {
                                Some(r) if !PY_BUILTINS.contains(r) => {
                                    calls.push(format!("{r}.{bare}"));
                                }
                                _ => calls.push(bare),
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    });
    calls
}

/// Type-position names from parameter annotations and the return type.
fn annotation_refs(node: Node, src: &[u8]) -> Vec<String> {
    let mut refs = Vec::new();
    let mut seen = HashSet::new();
    let mut collect = |ann: Node| {
        collect_annotation_names(ann, src, &mut refs, &mut seen);
    };

    if let Some(parameters) = node.child_by_field_name("parameters") {
        walk_nodes(parameters, &mut |n| {
            if n.kind() == "type" {
                collect(n);
            }
        });
    }
    if let Some(return_type) = node.child_by_field_name("return_type") {
        collect(return_type);
    }
    refs
}

fn collect_annotation_names(
    node: Node,
    src: &[u8],
    refs: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    match node.kind() {
        "identifier" => {
            let name = node_text(node, src);
            if !PY_TYPE_BUILTINS.contains(name.as_str()) && seen.insert(name.clone()) {
                refs.push(name);
            }
        }
        "attribute" => {
            if let Some(attr) = node.child_by_field_name("attribute") {
                let name = node_text(attr, src);
                if !PY_TYPE_BUILTINS.contains(name.as_str()) && seen.insert(name.clone()) {
                    refs.push(name);
                }
            }
        }
        _ => {
            for child in named_children(node) {
                collect_annotation_names(child, src, refs, seen);
            }
        }
    }
}

/// Parameter names; optionally excluding `self`/`cls`.
fn parameter_names(node: Node, src: &[u8], skip_receiver: bool) -> Vec<String> {
    let Some(parameters) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut params = Vec::new();
    for child in named_children(parameters) {
        let name = match child.kind() {
            "identifier" => Some(node_text(child, src)),
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => child
                .named_child(0)
                .filter(|n| n.kind() == "identifier")
                .map(|n| node_text(n, src)),
            "default_parameter" | "typed_default_parameter" => child
                .child_by_field_name("name")
                .map(|n| node_text(n, src)),
            _ => None,
        };
        if let Some(name) = name {
            if !(skip_receiver && (name == "self" || name == "cls")) {
                params.push(name);
            }
        }
    }
    params
}

/// Variable → type bindings visible inside one function.
fn function_type_context(node: Node, src: &[u8]) -> HashMap<String, String> {
    let mut ctx = HashMap::new();
    if let Some(parameters) = node.child_by_field_name("parameters") {
        for child in named_children(parameters) {
            let (name_node, type_node) = match child.kind() {
                "typed_parameter" => (child.named_child(0), child.child_by_field_name("type")),
                "typed_default_parameter" => (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("type"),
                ),
                _ => (None, None),
            };
            if let (Some(name_node), Some(type_node)) = (name_node, type_node) {
                if name_node.kind() == "identifier" {
                    let name = node_text(name_node, src);
                    if name != "self" && name != "cls" {
                        if let Some(ty) = annotation_head(type_node, src) {
                            ctx.insert(name, ty);
                        }
                    }
                }
            }
        }
    }
    walk_nodes(node, &mut |n| {
        if n.kind() == "assignment" {
            collect_type_bindings(n, src, &mut ctx);
        }
    });
    ctx
}

/// Decorator names on a decorated_definition, standard ones filtered.
fn decorator_names(node: Node, src: &[u8]) -> Vec<String> {
    let mut decorators = Vec::new();
    for child in named_children(node) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some(expr) = child.named_child(0) else {
            continue;
        };
        let name = match expr.kind() {
            "identifier" | "attribute" => Some(node_text(expr, src)),
            "call" => expr
                .child_by_field_name("function")
                .map(|f| node_text(f, src)),
            _ => None,
        };
        if let Some(name) = name {
            let bare = name.rsplit('.').next().unwrap_or(&name);
            if !PY_STANDARD_DECORATORS.contains(bare) {
                decorators.push(name);
            }
        }
    }
    decorators
}

/// All identifier names read within a subtree (deduplicated, builtins
/// excluded).
fn load_names(node: Node, src: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    walk_nodes(node, &mut |n| {
        if n.kind() == "identifier" {
            let name = node_text(n, src);
            if !PY_BUILTINS.contains(name.as_str()) && seen.insert(name.clone()) {
                names.push(name);
            }
        }
    });
    names
}

// ── Import helpers ──────────────────────────────────────────────────────────

/// `import a.b, c as d` → [(module, symbol, local_name)].
fn import_aliases(node: Node, src: &[u8]) -> Vec<(String, String, String)> {
    let mut result = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "dotted_name" => {
                let text = node_text(child, src);
                result.push((text.clone(), text.clone(), text));
            }
            "aliased_import" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src))
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, src))
                    .unwrap_or_else(|| name.clone());
                result.push((name.clone(), name, alias));
            }
            _ => {}
        }
    }
    result
}

/// Module path of a `from X import ...` statement.
fn from_module(node: Node, src: &[u8]) -> String {
    node.child_by_field_name("module_name")
        .map(|n| node_text(n, src))
        .unwrap_or_default()
}

/// `(symbol, local_name)` pairs of a `from X import ...` statement.
fn from_names(node: Node, src: &[u8]) -> Vec<(String, String)> {
    let mut result = Vec::new();
    let module_node = node.child_by_field_name("module_name");
    for child in named_children(node) {
        if module_node.is_some_and(|m| m.id() == child.id()) {
            continue;
        }
        match child.kind() {
            "dotted_name" => {
                let text = node_text(child, src);
                result.push((text.clone(), text));
            }
            "aliased_import" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src))
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, src))
                    .unwrap_or_else(|| name.clone());
                result.push((name, alias));
            }
            "wildcard_import" => result.push(("*".to_string(), "*".to_string())),
            _ => {}
        }
    }
    result
}

// ── AST fingerprinting ──────────────────────────────────────────────────────

/// Serialize a subtree into a stable fingerprint, skipping comments so
/// that comment and indentation edits hash identically. When `rename`
/// is given, identifier tokens with that exact text are blanked, which
/// is what keeps the structure hash stable across renames.
pub(crate) fn fingerprint(node: Node, src: &[u8], rename: Option<&str>) -> String {
    let mut out = String::new();
    fingerprint_rec(node, src, rename, &mut out);
    out
}

fn fingerprint_rec(node: Node, src: &[u8], rename: Option<&str>, out: &mut String) {
    if node.kind() == "comment" {
        return;
    }
    out.push('(');
    out.push_str(node.kind());
    if node.child_count() == 0 {
        if node.is_named() {
            let text = node_text(node, src);
            out.push(':');
            if node.kind() == "identifier" && rename == Some(text.as_str()) {
                out.push_str(hash::STRUCTURE_SENTINEL);
            } else {
                out.push_str(&text);
            }
        }
    } else {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                fingerprint_rec(child, src, rename, out);
            }
        }
    }
    out.push(')');
}

// ── Small node helpers ──────────────────────────────────────────────────────

fn node_text(node: Node, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or("").to_string()
}

/// Content of a string literal, quotes stripped.
fn string_content(node: Node, src: &[u8]) -> String {
    named_children(node)
        .find(|c| c.kind() == "string_content")
        .map(|c| node_text(c, src))
        .unwrap_or_else(|| {
            node_text(node, src)
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
}

fn starts_upper(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn scoped_name(scope: &[String], bare: &str) -> String {
    if scope.is_empty() {
        bare.to_string()
    } else {
        format!("{}.{bare}", scope.join("."))
    }
}

fn named_children<'a>(node: Node<'a>) -> impl Iterator<Item = Node<'a>> + 'a {
    (0..node.named_child_count()).filter_map(move |i| node.named_child(i))
}

/// Depth-first walk applying `f` to every node in the subtree.
fn walk_nodes<'a, F: FnMut(Node<'a>)>(node: Node<'a>, f: &mut F) {
    f(node);
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk_nodes(child, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<Entity> {
        PythonExtractor.extract(source, "test.py")
    }

    #[test]
    fn extract_function_with_calls_and_params() {
        let source = r#"
def process(order, retries=3):
    validate(order)
    order.submit()
    return finalize(order)
"#;
        let entities = extract(source);
        let process = entities.iter().find(|e| e.name == "process").unwrap();
        assert_eq!(process.kind, EntityKind::Function);
        assert_eq!(process.params, vec!["order", "retries"]);
        assert!(process.calls.contains(&"validate".to_string()));
        assert!(process.calls.contains(&"finalize".to_string()));
        // `submit` is not a common attr method, receiver unknown
        assert!(process.calls.contains(&"order.submit".to_string()));
    }

    #[test]
    fn class_methods_scoped_and_self_calls_qualified() {
        let source = r#"
class Pipeline:
    def run(self):
        self.prepare()
        return self.finish()

    def prepare(self):
        pass
"#;
        let entities = extract(source);
        assert!(entities.iter().any(|e| e.name == "Pipeline"));
        let run = entities.iter().find(|e| e.name == "Pipeline.run").unwrap();
        assert!(run.calls.contains(&"Pipeline.prepare".to_string()));
        assert!(run.calls.contains(&"Pipeline.finish".to_string()));
        assert!(entities.iter().any(|e| e.name == "Pipeline.prepare"));
    }

    #[test]
    fn inheritance_recorded() {
        let source = "class Base:\n    pass\n\nclass Derived(Base, mixins.Logged):\n    pass\n";
        let entities = extract(source);
        let derived = entities.iter().find(|e| e.name == "Derived").unwrap();
        assert_eq!(derived.inherits, vec!["Base", "Logged"]);
    }

    #[test]
    fn imports_one_entity_per_name() {
        let source = "import os\nfrom api.auth import login, logout as exit_session\n";
        let entities = extract(source);
        let imports: Vec<_> = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Import)
            .collect();
        assert!(imports
            .iter()
            .any(|e| e.name == "os" && e.imports[0] == (String::new(), "os".to_string())));
        assert!(imports
            .iter()
            .any(|e| e.name == "login" && e.imports[0].0 == "api.auth"));
        assert!(imports
            .iter()
            .any(|e| e.name == "exit_session" && e.imports[0].1 == "logout"));
    }

    #[test]
    fn stdlib_calls_filtered() {
        let source = "import json\nimport os\n\ndef dump(data):\n    json.dumps(data)\n    os.getenv(\"HOME\")\n    custom_sink(data)\n";
        let entities = extract(source);
        let dump = entities.iter().find(|e| e.name == "dump").unwrap();
        assert_eq!(dump.calls, vec!["custom_sink"]);
    }

    #[test]
    fn typed_receiver_qualifies_call() {
        let source = r#"
def handle(svc: AuthService):
    svc.login()
"#;
        let entities = extract(source);
        let handle = entities.iter().find(|e| e.name == "handle").unwrap();
        assert!(handle.calls.contains(&"AuthService.login".to_string()));
        assert_eq!(handle.type_refs, vec!["AuthService"]);
    }

    #[test]
    fn dunder_all_exports_in_uses() {
        let source = "__all__ = [\"alpha\", \"beta\"]\n\ndef alpha():\n    pass\n";
        let entities = extract(source);
        let all_var = entities.iter().find(|e| e.name == "__all__").unwrap();
        assert_eq!(all_var.kind, EntityKind::Variable);
        assert_eq!(all_var.uses, vec!["alpha", "beta"]);
    }

    #[test]
    fn module_level_calls_become_module_entity() {
        let source = "def setup():\n    pass\n\nsetup()\nbootstrap()\n";
        let entities = extract(source);
        let module = entities.iter().find(|e| e.name == "__module__").unwrap();
        assert_eq!(module.kind, EntityKind::ModuleCode);
        assert!(module.calls.contains(&"setup".to_string()));
        assert!(module.calls.contains(&"bootstrap".to_string()));
    }

    #[test]
    fn standard_decorators_filtered_custom_kept() {
        let source = r#"
class Svc:
    @property
    def value(self):
        return 1

    @retry_on_failure
    def fetch(self):
        pass
"#;
        let entities = extract(source);
        let value = entities.iter().find(|e| e.name == "Svc.value").unwrap();
        assert!(value.decorators.is_empty());
        let fetch = entities.iter().find(|e| e.name == "Svc.fetch").unwrap();
        assert_eq!(fetch.decorators, vec!["retry_on_failure"]);
    }

    #[test]
    fn comment_and_blank_line_edits_keep_signature_hash() {
        let before = "def calc(x):\n    return x + 1\n";
        let after = "def calc(x):\n    # doubled comment\n\n    return x + 1\n";
        let a = extract(before);
        let b = extract(after);
        let fa = a.iter().find(|e| e.name == "calc").unwrap();
        let fb = b.iter().find(|e| e.name == "calc").unwrap();
        assert_eq!(fa.signature_hash, fb.signature_hash);
    }

    #[test]
    fn rename_only_preserves_structure_hash() {
        let before = "def original(x):\n    return helper(x)\n";
        let after = "def renamed(x):\n    return helper(x)\n";
        let a = extract(before);
        let b = extract(after);
        let fa = a.iter().find(|e| e.name == "original").unwrap();
        let fb = b.iter().find(|e| e.name == "renamed").unwrap();
        assert_eq!(fa.structure_hash, fb.structure_hash);
        assert_ne!(fa.signature_hash, fb.signature_hash);
    }

    #[test]
    fn body_change_changes_structure_hash() {
        let before = "def f(x):\n    return helper(x)\n";
        let after = "def f(x):\n    return other(x) + 1\n";
        let a = extract(before);
        let b = extract(after);
        assert_ne!(a[0].structure_hash, b[0].structure_hash);
    }

    #[test]
    fn broken_source_recovers_partial_entities() {
        let source = "def good():\n    return 1\n\ndef broken(:\n";
        let entities = extract(source);
        let good = entities.iter().find(|e| e.name == "good");
        assert!(good.is_some(), "expected recovery to salvage `good`");
        assert_eq!(good.unwrap().confidence, Confidence::Medium);
    }

    #[test]
    fn empty_source_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("   \n\n").is_empty());
    }

    #[test]
    fn nested_function_scoped_under_parent() {
        let source = "def outer():\n    def inner():\n        pass\n    return inner\n";
        let entities = extract(source);
        assert!(entities.iter().any(|e| e.name == "outer"));
        assert!(entities.iter().any(|e| e.name == "outer.inner"));
    }
}
