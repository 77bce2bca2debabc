//! lattice-graph: Typed directed multigraph with node and edge indices.
//!
//! The store keeps five indices in sync on every mutation: nodes by id,
//! node ids by bare name, node ids by file, per-kind outgoing/incoming
//! edge lists, and edges by source file (for bulk invalidation when a
//! file is re-extracted). Unresolved edges point at symbolic
//! `unresolved:<name>` targets and participate in the incoming index so
//! later definitions can promote them.

pub mod algorithms;
pub mod query;

use lattice_core::{bare_name, placeholder_target, CodeEdge, CodeNode, EdgeKind};
use std::collections::{BTreeSet, HashMap};

/// In-memory code graph. All edge mutations go through
/// [`add_edge`](CodeGraph::add_edge) / [`take_edge`](CodeGraph::take_edge)
/// so the three edge indices never drift.
#[derive(Default)]
pub struct CodeGraph {
    nodes: HashMap<String, CodeNode>,
    ids_by_name: HashMap<String, BTreeSet<String>>,
    ids_by_file: HashMap<String, BTreeSet<String>>,
    outgoing: HashMap<String, HashMap<EdgeKind, Vec<CodeEdge>>>,
    incoming: HashMap<String, HashMap<EdgeKind, Vec<CodeEdge>>>,
    edges_by_source_file: HashMap<String, Vec<CodeEdge>>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Nodes ───────────────────────────────────────────────────────────

    /// Insert or replace a node, updating all indices.
    pub fn add_node(&mut self, node: CodeNode) {
        self.ids_by_name
            .entry(bare_name(&node.entity.name).to_string())
            .or_default()
            .insert(node.id.clone());
        self.ids_by_file
            .entry(node.entity.file_path.clone())
            .or_default()
            .insert(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    /// Remove a node and cascade-remove all its edges.
    ///
    /// Callers that need to keep incoming edges alive (file deletion,
    /// entity removal) must demote them first via
    /// [`demote_incoming`](CodeGraph::demote_incoming).
    pub fn remove_node(&mut self, node_id: &str) -> Option<CodeNode> {
        let node = self.nodes.remove(node_id)?;

        let bare = bare_name(&node.entity.name).to_string();
        if let Some(set) = self.ids_by_name.get_mut(&bare) {
            set.remove(node_id);
            if set.is_empty() {
                self.ids_by_name.remove(&bare);
            }
        }
        if let Some(set) = self.ids_by_file.get_mut(&node.entity.file_path) {
            set.remove(node_id);
            if set.is_empty() {
                self.ids_by_file.remove(&node.entity.file_path);
            }
        }

        for edge in self.outgoing_edges(node_id) {
            self.take_edge(&edge.source_id, &edge.target_id, edge.kind);
        }
        for edge in self.incoming_edges(node_id) {
            self.take_edge(&edge.source_id, &edge.target_id, edge.kind);
        }

        Some(node)
    }

    /// Move a node to a new identity while preserving its incoming
    /// edges (their target ids are rewritten in place). Outgoing edges
    /// keep the old source id; the caller is expected to bulk-delete
    /// and rebuild them, which the incremental engine does on every
    /// file update.
    pub fn rename_node(&mut self, old_id: &str, new_node: CodeNode) -> bool {
        if !self.nodes.contains_key(old_id) {
            return false;
        }
        let preserved = self.incoming_edges(old_id);
        for edge in &preserved {
            self.take_edge(&edge.source_id, &edge.target_id, edge.kind);
        }
        let outgoing = self.outgoing_edges(old_id);
        self.remove_node(old_id);

        let new_id = new_node.id.clone();
        self.add_node(new_node);
        for edge in preserved {
            self.add_edge(CodeEdge {
                target_id: new_id.clone(),
                ..edge
            });
        }
        // Stale outgoing edges stay keyed under the old source id until
        // the engine's per-file bulk delete sweeps them.
        for edge in outgoing {
            self.add_edge(edge);
        }
        true
    }

    pub fn get_node(&self, node_id: &str) -> Option<&CodeNode> {
        self.nodes.get(node_id)
    }

    pub fn get_node_mut(&mut self, node_id: &str) -> Option<&mut CodeNode> {
        self.nodes.get_mut(node_id)
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &CodeNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids carrying the given bare name.
    pub fn ids_with_bare_name(&self, bare: &str) -> Vec<&str> {
        self.ids_by_name
            .get(bare)
            .map(|set| set.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// All nodes in a file, ordered by `(file_path, scoped_name)`.
    pub fn nodes_in_file(&self, file_path: &str) -> Vec<&CodeNode> {
        let mut nodes: Vec<&CodeNode> = self
            .ids_by_file
            .get(file_path)
            .map(|set| set.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default();
        nodes.sort_by(|a, b| a.entity.name.cmp(&b.entity.name));
        nodes
    }

    /// All files with at least one node.
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.ids_by_file.keys().map(|s| s.as_str()).collect();
        files.sort();
        files
    }

    // ── Edges ───────────────────────────────────────────────────────────

    /// Add an edge unless an edge of the same kind already connects the
    /// same ordered pair. Returns whether the edge was inserted.
    pub fn add_edge(&mut self, edge: CodeEdge) -> bool {
        let exists = self
            .outgoing
            .get(&edge.source_id)
            .and_then(|kinds| kinds.get(&edge.kind))
            .is_some_and(|edges| edges.iter().any(|e| e.target_id == edge.target_id));
        if exists {
            return false;
        }
        self.outgoing
            .entry(edge.source_id.clone())
            .or_default()
            .entry(edge.kind)
            .or_default()
            .push(edge.clone());
        self.incoming
            .entry(edge.target_id.clone())
            .or_default()
            .entry(edge.kind)
            .or_default()
            .push(edge.clone());
        self.edges_by_source_file
            .entry(edge.source_file.clone())
            .or_default()
            .push(edge);
        true
    }

    /// Remove one edge by its `(source, target, kind)` key, returning it.
    pub fn take_edge(&mut self, source_id: &str, target_id: &str, kind: EdgeKind) -> Option<CodeEdge> {
        let mut removed = None;
        if let Some(kinds) = self.outgoing.get_mut(source_id) {
            if let Some(edges) = kinds.get_mut(&kind) {
                if let Some(pos) = edges.iter().position(|e| e.target_id == target_id) {
                    removed = Some(edges.remove(pos));
                }
                if edges.is_empty() {
                    kinds.remove(&kind);
                }
            }
            if kinds.is_empty() {
                self.outgoing.remove(source_id);
            }
        }
        let removed = removed?;

        if let Some(kinds) = self.incoming.get_mut(target_id) {
            if let Some(edges) = kinds.get_mut(&kind) {
                edges.retain(|e| e.source_id != source_id);
                if edges.is_empty() {
                    kinds.remove(&kind);
                }
            }
            if kinds.is_empty() {
                self.incoming.remove(target_id);
            }
        }
        if let Some(edges) = self.edges_by_source_file.get_mut(&removed.source_file) {
            edges.retain(|e| {
                !(e.source_id == source_id && e.target_id == target_id && e.kind == kind)
            });
            if edges.is_empty() {
                self.edges_by_source_file.remove(&removed.source_file);
            }
        }
        Some(removed)
    }

    /// Remove every edge whose source file is `file_path`. Returns the
    /// number removed.
    pub fn remove_edges_from_file(&mut self, file_path: &str) -> usize {
        let edges = self
            .edges_by_source_file
            .get(file_path)
            .cloned()
            .unwrap_or_default();
        for edge in &edges {
            self.take_edge(&edge.source_id, &edge.target_id, edge.kind);
        }
        edges.len()
    }

    /// Rewrite incoming edges of a node into low-confidence placeholder
    /// edges so references survive the node's removal.
    pub fn demote_incoming(&mut self, node_id: &str) -> usize {
        let Some(node) = self.nodes.get(node_id) else {
            return 0;
        };
        let placeholder = placeholder_target(&node.entity.name);
        let edges = self.incoming_edges(node_id);
        let mut demoted = 0;
        for edge in edges {
            self.take_edge(&edge.source_id, &edge.target_id, edge.kind);
            if self.add_edge(CodeEdge {
                target_id: placeholder.clone(),
                confidence: lattice_core::Confidence::Low,
                ..edge
            }) {
                demoted += 1;
            }
        }
        demoted
    }

    pub fn outgoing_edges(&self, node_id: &str) -> Vec<CodeEdge> {
        self.outgoing
            .get(node_id)
            .map(|kinds| {
                let mut edges: Vec<CodeEdge> = kinds.values().flatten().cloned().collect();
                edges.sort_by(|a, b| (a.kind.to_string(), &a.target_id).cmp(&(b.kind.to_string(), &b.target_id)));
                edges
            })
            .unwrap_or_default()
    }

    pub fn incoming_edges(&self, node_id: &str) -> Vec<CodeEdge> {
        self.incoming
            .get(node_id)
            .map(|kinds| {
                let mut edges: Vec<CodeEdge> = kinds.values().flatten().cloned().collect();
                edges.sort_by(|a, b| (a.kind.to_string(), &a.source_id).cmp(&(b.kind.to_string(), &b.source_id)));
                edges
            })
            .unwrap_or_default()
    }

    pub fn outgoing_by_kind(&self, node_id: &str, kind: EdgeKind) -> Vec<CodeEdge> {
        self.outgoing
            .get(node_id)
            .and_then(|kinds| kinds.get(&kind))
            .cloned()
            .unwrap_or_default()
    }

    pub fn incoming_by_kind(&self, node_id: &str, kind: EdgeKind) -> Vec<CodeEdge> {
        self.incoming
            .get(node_id)
            .and_then(|kinds| kinds.get(&kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Unresolved edges whose placeholder matches a bare name.
    pub fn unresolved_edges_for(&self, bare: &str) -> Vec<CodeEdge> {
        self.incoming_edges(&placeholder_target(bare))
    }

    /// All unresolved (placeholder-target) edges.
    pub fn unresolved_edges(&self) -> Vec<CodeEdge> {
        let mut edges: Vec<CodeEdge> = self
            .incoming
            .iter()
            .filter(|(target, _)| lattice_core::placeholder_name(target).is_some())
            .flat_map(|(_, kinds)| kinds.values().flatten().cloned())
            .collect();
        edges.sort_by(|a, b| (&a.source_id, &a.target_id).cmp(&(&b.source_id, &b.target_id)));
        edges
    }

    pub fn all_edges(&self) -> Vec<CodeEdge> {
        let mut edges: Vec<CodeEdge> = self
            .outgoing
            .values()
            .flat_map(|kinds| kinds.values().flatten().cloned())
            .collect();
        edges.sort_by(|a, b| {
            (&a.source_id, &a.target_id, a.kind.to_string())
                .cmp(&(&b.source_id, &b.target_id, b.kind.to_string()))
        });
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing
            .values()
            .flat_map(|kinds| kinds.values())
            .map(|edges| edges.len())
            .sum()
    }

    // ── File-level views ────────────────────────────────────────────────

    /// Distinct target files of resolved outgoing edges from a file.
    pub fn file_deps(&self, file_path: &str) -> Vec<String> {
        let mut deps = BTreeSet::new();
        for node in self.nodes_in_file(file_path) {
            for edge in self.outgoing_edges(&node.id) {
                if let Some(target) = self.nodes.get(&edge.target_id) {
                    if target.entity.file_path != file_path {
                        deps.insert(target.entity.file_path.clone());
                    }
                }
            }
        }
        deps.into_iter().collect()
    }

    /// Distinct source files of incoming edges to a file.
    pub fn reverse_file_deps(&self, file_path: &str) -> Vec<String> {
        let mut deps = BTreeSet::new();
        for node in self.nodes_in_file(file_path) {
            for edge in self.incoming_edges(&node.id) {
                if edge.source_file != file_path {
                    deps.insert(edge.source_file.clone());
                }
            }
        }
        deps.into_iter().collect()
    }

    // ── Name lookup ─────────────────────────────────────────────────────

    /// Progressive node lookup: exact id → scoped-name exact →
    /// suffix match → regex fallback. Results are ordered by
    /// `(file_path, scoped_name)` so repeated queries are stable.
    pub fn lookup(&self, name: &str) -> Vec<&CodeNode> {
        if name.contains("::") {
            return self.nodes.get(name).map(|n| vec![n]).unwrap_or_default();
        }

        let bare = bare_name(name);
        let candidates: Vec<&CodeNode> = self
            .ids_by_name
            .get(bare)
            .map(|set| set.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default();

        let exact: Vec<&CodeNode> = candidates
            .iter()
            .copied()
            .filter(|n| n.entity.name == name)
            .collect();
        if !exact.is_empty() {
            return sorted(exact);
        }

        let suffix = format!(".{name}");
        let suffixed: Vec<&CodeNode> = candidates
            .iter()
            .copied()
            .filter(|n| n.entity.name.ends_with(&suffix))
            .collect();
        if !suffixed.is_empty() {
            return sorted(suffixed);
        }

        match regex::Regex::new(name) {
            Ok(re) => sorted(
                self.nodes
                    .values()
                    .filter(|n| re.is_match(&n.entity.name))
                    .collect(),
            ),
            Err(_) => Vec::new(),
        }
    }
}

fn sorted(mut nodes: Vec<&CodeNode>) -> Vec<&CodeNode> {
    nodes.sort_by(|a, b| {
        (&a.entity.file_path, &a.entity.name).cmp(&(&b.entity.file_path, &b.entity.name))
    });
    nodes
}

#[cfg(test)]
pub(crate) mod testutil {
    use lattice_core::{node_id, CodeEdge, CodeNode, Confidence, EdgeKind, Entity, EntityKind};

    pub fn entity(kind: EntityKind, name: &str, file: &str) -> Entity {
        Entity {
            kind,
            name: name.to_string(),
            file_path: file.to_string(),
            line_start: 1,
            line_end: 2,
            signature_hash: format!("sig-{name}"),
            structure_hash: format!("struct-{name}"),
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

    pub fn node(kind: EntityKind, name: &str, file: &str) -> CodeNode {
        CodeNode::new(entity(kind, name, file))
    }

    pub fn edge(src_file: &str, src_name: &str, dst_file: &str, dst_name: &str, kind: EdgeKind) -> CodeEdge {
        CodeEdge {
            source_id: node_id(src_file, src_name),
            target_id: node_id(dst_file, dst_name),
            kind,
            confidence: Confidence::High,
            source_file: src_file.to_string(),
        }
    }
}
