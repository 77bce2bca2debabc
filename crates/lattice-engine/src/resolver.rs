//! Two-pass edge resolution.
//!
//! Pass one materializes edges for a freshly extracted file, walking a
//! resolution ladder: in-file exact name, in-file class method,
//! import-binding lookup, then project-wide bare-name match (medium
//! when unique, placeholder when absent or ambiguous). Pass two
//! revisits unresolved edges whose placeholder matches a newly added or
//! renamed name and promotes them; confidence never decreases.

use lattice_core::{
    bare_name, node_id, placeholder_target, CodeEdge, CodeNode, Confidence, EdgeKind, Entity,
    EntityKind,
};
use lattice_graph::CodeGraph;
use serde::Serialize;
use std::collections::HashMap;

/// Resolution counters surfaced by the `stats` query.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ResolutionStats {
    pub attempted: u64,
    pub resolved: u64,
    pub ambiguous: u64,
    pub unresolved: u64,
    pub promoted: u64,
}

/// Read-only context the resolver consults.
pub struct ResolverContext<'a> {
    /// Module path (and suffix variants) → defining file.
    pub module_index: &'a HashMap<String, String>,
    /// Per-file exported names (for star-import expansion).
    pub exports: &'a HashMap<String, Vec<String>>,
}

/// Entity kinds a target may have for each edge kind.
fn target_kinds(kind: EdgeKind) -> &'static [EntityKind] {
    match kind {
        EdgeKind::Calls | EdgeKind::DecoratedBy => &[EntityKind::Function, EntityKind::Class],
        EdgeKind::Inherits | EdgeKind::UsesType => &[EntityKind::Class],
        EdgeKind::Imports => &[
            EntityKind::Function,
            EntityKind::Class,
            EntityKind::Variable,
        ],
    }
}

const DEFINITION_KINDS: [EntityKind; 3] = [
    EntityKind::Function,
    EntityKind::Class,
    EntityKind::Variable,
];

// ── Pass one ────────────────────────────────────────────────────────────────

/// Materialize all edges sourced from `file_path`. The caller has
/// already bulk-deleted that file's previous edges.
pub fn resolve_file(
    graph: &mut CodeGraph,
    ctx: &ResolverContext,
    file_path: &str,
    stats: &mut ResolutionStats,
) {
    let mut nodes: Vec<CodeNode> = graph
        .nodes_in_file(file_path)
        .into_iter()
        .cloned()
        .collect();
    // Imports first: later call resolution reads their bindings.
    nodes.sort_by_key(|n| n.entity.kind != EntityKind::Import);

    for node in nodes {
        let planned = plan_edges(graph, ctx, &node, stats);
        for edge in planned {
            graph.add_edge(edge);
        }
    }
}

/// Edges one node should source, resolved against the current graph.
fn plan_edges(
    graph: &CodeGraph,
    ctx: &ResolverContext,
    node: &CodeNode,
    stats: &mut ResolutionStats,
) -> Vec<CodeEdge> {
    let mut edges = Vec::new();
    let entity = &node.entity;

    for (names, kind) in [
        (&entity.calls, EdgeKind::Calls),
        (&entity.inherits, EdgeKind::Inherits),
        (&entity.type_refs, EdgeKind::UsesType),
        (&entity.decorators, EdgeKind::DecoratedBy),
    ] {
        for name in names {
            let target = resolve_target(graph, ctx, entity, name, target_kinds(kind), stats);
            push_edge(&mut edges, node, target, kind, name);
        }
    }
    if entity.kind == EntityKind::Import {
        for (module, symbol) in &entity.imports {
            if symbol == "*" {
                edges.extend(expand_star_import(graph, ctx, node, module));
                continue;
            }
            let target = resolve_import(graph, ctx, entity, module, symbol, stats);
            push_edge(&mut edges, node, target, EdgeKind::Imports, symbol);
        }
    }
    edges
}

fn push_edge(
    edges: &mut Vec<CodeEdge>,
    node: &CodeNode,
    target: Resolution,
    kind: EdgeKind,
    name: &str,
) {
    let (target_id, confidence) = match target {
        Resolution::Node(id, confidence) => (id, confidence),
        Resolution::Unresolved => (placeholder_target(name), Confidence::Low),
    };
    if target_id != node.id {
        edges.push(CodeEdge {
            source_id: node.id.clone(),
            target_id,
            kind,
            confidence,
            source_file: node.entity.file_path.clone(),
        });
    }
}

enum Resolution {
    Node(String, Confidence),
    Unresolved,
}

/// The resolution ladder of §calls: in-file exact → in-file class
/// method → import binding → unique project-wide bare name.
fn resolve_target(
    graph: &CodeGraph,
    ctx: &ResolverContext,
    source: &Entity,
    name: &str,
    kinds: &[EntityKind],
    stats: &mut ResolutionStats,
) -> Resolution {
    stats.attempted += 1;
    let bare = bare_name(name);
    let file = &source.file_path;

    // (i) in-file exact name.
    for node in graph.nodes_in_file(file) {
        if kinds.contains(&node.entity.kind)
            && (node.entity.name == name || node.entity.name == bare)
        {
            stats.resolved += 1;
            return Resolution::Node(node.id.clone(), Confidence::High);
        }
    }

    // (ii) in-file class method: a caller inside a class naming an
    // unqualified sibling method.
    if !name.contains('.') {
        if let Some((class_name, _)) = source.name.rsplit_once('.') {
            let candidate = node_id(file, &format!("{class_name}.{name}"));
            if let Some(node) = graph.get_node(&candidate) {
                if kinds.contains(&node.entity.kind) {
                    stats.resolved += 1;
                    return Resolution::Node(node.id.clone(), Confidence::High);
                }
            }
        }
    }

    // Qualified names resolve their receiver first.
    if let Some((receiver, method)) = name.split_once('.') {
        // Class-qualified: find the class, then the method in its file.
        if receiver.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            for class_id in graph.ids_with_bare_name(receiver) {
                let Some(class_node) = graph.get_node(class_id) else {
                    continue;
                };
                if class_node.entity.kind != EntityKind::Class {
                    continue;
                }
                for node in graph.nodes_in_file(&class_node.entity.file_path) {
                    if kinds.contains(&node.entity.kind)
                        && (node.entity.name == name || node.entity.name.ends_with(&format!(".{method}")))
                    {
                        stats.resolved += 1;
                        return Resolution::Node(node.id.clone(), Confidence::High);
                    }
                }
            }
        }
        // Import-qualified: `recv.method()` where recv is imported here.
        if let Some(target_file) = receiver_file(graph, ctx, file, receiver) {
            for node in graph.nodes_in_file(&target_file) {
                if kinds.contains(&node.entity.kind)
                    && (bare_name(&node.entity.name) == method || node.entity.name == name)
                {
                    stats.resolved += 1;
                    return Resolution::Node(node.id.clone(), Confidence::High);
                }
            }
        }
    } else if let Some(target_file) = import_binding_file(graph, ctx, file, name) {
        // (iii) cross-file: this file imports `name` explicitly.
        for node in graph.nodes_in_file(&target_file) {
            if kinds.contains(&node.entity.kind) && bare_name(&node.entity.name) == name {
                stats.resolved += 1;
                return Resolution::Node(node.id.clone(), Confidence::High);
            }
        }
    }

    // (iv) fallback: project-wide bare-name match.
    let mut candidates: Vec<&CodeNode> = graph
        .ids_with_bare_name(bare)
        .into_iter()
        .filter_map(|id| graph.get_node(id))
        .filter(|n| kinds.contains(&n.entity.kind))
        .collect();
    candidates.sort_by(|a, b| {
        (&a.entity.file_path, &a.entity.name).cmp(&(&b.entity.file_path, &b.entity.name))
    });
    match candidates.len() {
        1 => {
            stats.resolved += 1;
            Resolution::Node(candidates[0].id.clone(), Confidence::Medium)
        }
        0 => {
            stats.unresolved += 1;
            Resolution::Unresolved
        }
        _ => {
            stats.ambiguous += 1;
            Resolution::Unresolved
        }
    }
}

/// File that defines a bare name imported by `file`, via the file's
/// import entities and the module index.
fn import_binding_file(
    graph: &CodeGraph,
    ctx: &ResolverContext,
    file: &str,
    name: &str,
) -> Option<String> {
    for node in graph.nodes_in_file(file) {
        if node.entity.kind != EntityKind::Import || node.entity.name != name {
            continue;
        }
        for (module, _symbol) in &node.entity.imports {
            if let Some(target) = ctx.module_index.get(module) {
                if target != file {
                    return Some(target.clone());
                }
            }
        }
        // Binding exists but the module is unknown; follow an already
        // resolved imports edge instead.
        for edge in graph.outgoing_by_kind(&node.id, EdgeKind::Imports) {
            if let Some(target) = graph.get_node(&edge.target_id) {
                return Some(target.entity.file_path.clone());
            }
        }
    }
    None
}

/// File behind a receiver name: an import binding or a module path.
fn receiver_file(
    graph: &CodeGraph,
    ctx: &ResolverContext,
    file: &str,
    receiver: &str,
) -> Option<String> {
    if let Some(target) = import_binding_file(graph, ctx, file, receiver) {
        return Some(target);
    }
    ctx.module_index.get(receiver).cloned()
}

/// Resolve one `(module, symbol)` import binding to its definition.
fn resolve_import(
    graph: &CodeGraph,
    ctx: &ResolverContext,
    source: &Entity,
    module: &str,
    symbol: &str,
    stats: &mut ResolutionStats,
) -> Resolution {
    stats.attempted += 1;

    if let Some(target_file) = ctx.module_index.get(module) {
        if target_file != &source.file_path {
            for node in graph.nodes_in_file(target_file) {
                if DEFINITION_KINDS.contains(&node.entity.kind)
                    && bare_name(&node.entity.name) == symbol
                {
                    stats.resolved += 1;
                    return Resolution::Node(node.id.clone(), Confidence::High);
                }
            }
        }
    }

    // Fallback: any definition with the bare name, preferring cross-file.
    let mut candidates: Vec<&CodeNode> = graph
        .ids_with_bare_name(symbol)
        .into_iter()
        .filter_map(|id| graph.get_node(id))
        .filter(|n| DEFINITION_KINDS.contains(&n.entity.kind))
        .collect();
    candidates.sort_by(|a, b| {
        (&a.entity.file_path, &a.entity.name).cmp(&(&b.entity.file_path, &b.entity.name))
    });
    let cross: Vec<&&CodeNode> = candidates
        .iter()
        .filter(|n| n.entity.file_path != source.file_path)
        .collect();
    match cross.len() {
        1 => {
            stats.resolved += 1;
            Resolution::Node(cross[0].id.clone(), Confidence::High)
        }
        0 => {
            stats.unresolved += 1;
            Resolution::Unresolved
        }
        _ => {
            stats.ambiguous += 1;
            Resolution::Unresolved
        }
    }
}

/// `from module import *`: one medium-confidence edge per exported
/// definition of the target file.
fn expand_star_import(
    graph: &CodeGraph,
    ctx: &ResolverContext,
    source: &CodeNode,
    module: &str,
) -> Vec<CodeEdge> {
    let Some(target_file) = ctx.module_index.get(module) else {
        return Vec::new();
    };
    let exported: Vec<String> = match ctx.exports.get(target_file) {
        Some(names) => names.clone(),
        None => graph
            .nodes_in_file(target_file)
            .iter()
            .filter(|n| {
                DEFINITION_KINDS.contains(&n.entity.kind) && !n.entity.name.contains('.')
            })
            .map(|n| n.entity.name.clone())
            .collect(),
    };

    let mut edges = Vec::new();
    for name in exported {
        for node in graph.nodes_in_file(target_file) {
            if DEFINITION_KINDS.contains(&node.entity.kind) && node.entity.name == name {
                edges.push(CodeEdge {
                    source_id: source.id.clone(),
                    target_id: node.id.clone(),
                    kind: EdgeKind::Imports,
                    confidence: Confidence::Medium,
                    source_file: source.entity.file_path.clone(),
                });
                break;
            }
        }
    }
    edges
}

// ── Pass two ────────────────────────────────────────────────────────────────

/// Promote unresolved edges whose placeholder matches one of `names`.
/// Confidence only ever increases. Returns the number promoted.
pub fn promote_unresolved(
    graph: &mut CodeGraph,
    ctx: &ResolverContext,
    names: &[String],
    stats: &mut ResolutionStats,
) -> usize {
    let mut promoted = 0;
    for name in names {
        let bare = bare_name(name).to_string();
        for edge in graph.unresolved_edges_for(&bare) {
            let Some(source) = graph.get_node(&edge.source_id) else {
                continue;
            };
            let source_entity = source.entity.clone();

            let resolution = if edge.kind == EdgeKind::Imports {
                promote_import(graph, ctx, &source_entity, &bare)
            } else {
                promote_reference(graph, &source_entity, &bare, target_kinds(edge.kind))
            };

            if let Some((target_id, confidence)) = resolution {
                if target_id == edge.source_id {
                    continue;
                }
                let confidence = confidence.max(edge.confidence);
                graph.take_edge(&edge.source_id, &edge.target_id, edge.kind);
                graph.add_edge(CodeEdge {
                    target_id,
                    confidence,
                    ..edge
                });
                promoted += 1;
                stats.promoted += 1;
            }
        }
    }
    promoted
}

/// Import placeholders promote to high when the binding's module (or a
/// unique cross-file definition) now resolves.
fn promote_import(
    graph: &CodeGraph,
    ctx: &ResolverContext,
    source: &Entity,
    bare: &str,
) -> Option<(String, Confidence)> {
    let module = source
        .imports
        .iter()
        .find(|(_, symbol)| bare_name(symbol) == bare)
        .map(|(module, _)| module.clone());

    if let Some(module) = module {
        if let Some(target_file) = ctx.module_index.get(&module) {
            for node in graph.nodes_in_file(target_file) {
                if DEFINITION_KINDS.contains(&node.entity.kind)
                    && bare_name(&node.entity.name) == bare
                {
                    return Some((node.id.clone(), Confidence::High));
                }
            }
        }
    }

    let candidates = definition_candidates(graph, bare, &DEFINITION_KINDS, &source.file_path);
    match candidates.len() {
        1 => Some((candidates[0].clone(), Confidence::High)),
        _ => None,
    }
}

/// Non-import placeholders promote to high for a same-file definition,
/// medium for a unique cross-file one.
fn promote_reference(
    graph: &CodeGraph,
    source: &Entity,
    bare: &str,
    kinds: &[EntityKind],
) -> Option<(String, Confidence)> {
    let mut same_file = None;
    let mut cross: Vec<String> = Vec::new();
    for id in graph.ids_with_bare_name(bare) {
        let Some(node) = graph.get_node(id) else {
            continue;
        };
        if !kinds.contains(&node.entity.kind) {
            continue;
        }
        if node.entity.file_path == source.file_path {
            same_file.get_or_insert_with(|| node.id.clone());
        } else {
            cross.push(node.id.clone());
        }
    }
    if let Some(id) = same_file {
        return Some((id, Confidence::High));
    }
    cross.sort();
    match cross.len() {
        1 => Some((cross.remove(0), Confidence::Medium)),
        _ => None,
    }
}

/// Cross-file definition candidates for a bare name, sorted.
fn definition_candidates(
    graph: &CodeGraph,
    bare: &str,
    kinds: &[EntityKind],
    exclude_file: &str,
) -> Vec<String> {
    let mut candidates: Vec<String> = graph
        .ids_with_bare_name(bare)
        .into_iter()
        .filter_map(|id| graph.get_node(id))
        .filter(|n| kinds.contains(&n.entity.kind) && n.entity.file_path != exclude_file)
        .map(|n| n.id.clone())
        .collect();
    candidates.sort();
    candidates
}
