//! Read-only query engine over the code graph.
//!
//! Every query is a pure read; misses return empty results with a
//! `found` flag rather than errors.

use crate::{algorithms, CodeGraph};
use lattice_core::{bare_name, CodeEdge, CodeNode, Confidence, EdgeKind, QueryConfig};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// A node reference in query results.
#[derive(Debug, Clone, Serialize)]
pub struct NodeHit {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
}

impl NodeHit {
    fn from_node(node: &CodeNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.entity.name.clone(),
            entity_type: node.entity.kind.to_string(),
            file_path: node.entity.file_path.clone(),
            line_start: node.entity.line_start,
            line_end: node.entity.line_end,
        }
    }
}

/// One edge attached to a query hit; `other_*` describes the far end.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeHit {
    pub kind: EdgeKind,
    pub confidence: Confidence,
    pub other_id: String,
    pub other_name: String,
    pub other_file: Option<String>,
}

/// Result of `callers`/`callees`/`entity`: resolved nodes with their
/// incoming or outgoing edges.
#[derive(Debug, Clone, Serialize)]
pub struct NeighborReport {
    pub query: String,
    pub found: bool,
    pub nodes: Vec<NodeNeighbors>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeNeighbors {
    pub node: NodeHit,
    pub edges: Vec<EdgeHit>,
}

/// Architecture summary returned by the `summary` query.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub nodes: usize,
    pub edges: usize,
    pub files: usize,
    pub top_incoming: Vec<(String, usize)>,
    pub top_outgoing: Vec<(String, usize)>,
    pub entry_points: Vec<String>,
    pub cycles: Vec<Vec<String>>,
}

/// Query engine borrowing the graph and the per-file exported sets.
///
/// `exports` is what each file publishes (explicit marker or top-level
/// fallback); `explicit_exports` holds only marker-declared sets, the
/// ones that shield names from dead-code reports.
pub struct QueryEngine<'a> {
    graph: &'a CodeGraph,
    exports: &'a HashMap<String, Vec<String>>,
    explicit_exports: &'a HashMap<String, Vec<String>>,
    config: &'a QueryConfig,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        graph: &'a CodeGraph,
        exports: &'a HashMap<String, Vec<String>>,
        explicit_exports: &'a HashMap<String, Vec<String>>,
        config: &'a QueryConfig,
    ) -> Self {
        Self {
            graph,
            exports,
            explicit_exports,
            config,
        }
    }

    /// Incoming edges of every node matching `name`.
    pub fn callers(&self, name: &str) -> NeighborReport {
        self.neighbors(name, true)
    }

    /// Outgoing edges of every node matching `name`.
    pub fn callees(&self, name: &str) -> NeighborReport {
        self.neighbors(name, false)
    }

    fn neighbors(&self, name: &str, incoming: bool) -> NeighborReport {
        let matches = self.graph.lookup(name);
        let nodes = matches
            .iter()
            .map(|node| {
                let edges = if incoming {
                    self.graph.incoming_edges(&node.id)
                } else {
                    self.graph.outgoing_edges(&node.id)
                };
                NodeNeighbors {
                    node: NodeHit::from_node(node),
                    edges: edges
                        .iter()
                        .map(|e| self.edge_hit(e, incoming))
                        .collect(),
                }
            })
            .collect::<Vec<_>>();
        NeighborReport {
            query: name.to_string(),
            found: !nodes.is_empty(),
            nodes,
        }
    }

    fn edge_hit(&self, edge: &CodeEdge, incoming: bool) -> EdgeHit {
        let other_id = if incoming {
            edge.source_id.clone()
        } else {
            edge.target_id.clone()
        };
        let other = self.graph.get_node(&other_id);
        EdgeHit {
            kind: edge.kind,
            confidence: edge.confidence,
            other_name: other
                .map(|n| n.entity.name.clone())
                .unwrap_or_else(|| other_id.clone()),
            other_file: other.map(|n| n.entity.file_path.clone()),
            other_id,
        }
    }

    /// Forward file-level dependencies.
    pub fn deps(&self, file_path: &str) -> Vec<String> {
        self.graph.file_deps(file_path)
    }

    /// Reverse file-level dependencies.
    pub fn rdeps(&self, file_path: &str) -> Vec<String> {
        self.graph.reverse_file_deps(file_path)
    }

    /// Files affected by a change to `file_path` (optionally to one name).
    pub fn impact(&self, file_path: &str, name: Option<&str>) -> Vec<String> {
        algorithms::impact(self.graph, file_path, name, self.config.impact_depth)
    }

    /// Shortest dependency path between two names; at most one path,
    /// ties broken lexicographically.
    pub fn path(&self, source: &str, target: &str) -> Option<Vec<String>> {
        let sources = self.graph.lookup(source);
        let targets = self.graph.lookup(target);
        let target_node = targets.first()?;
        sources
            .iter()
            .filter_map(|s| algorithms::shortest_path(self.graph, &s.id, &target_node.id))
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
    }

    /// Unreferenced function/class nodes.
    pub fn dead(&self) -> Vec<NodeHit> {
        let patterns: Vec<Regex> = self
            .config
            .entry_points
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        algorithms::dead_nodes(self.graph, self.explicit_exports, &patterns)
            .into_iter()
            .map(NodeHit::from_node)
            .collect()
    }

    /// File-level dependency cycles.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        algorithms::find_cycles(self.graph, true)
    }

    /// Regex search over node names. Patterns without explicit anchors
    /// are anchored at word boundaries.
    pub fn search(&self, pattern: &str) -> Vec<NodeHit> {
        let effective = if pattern.contains('^') || pattern.contains('$') {
            pattern.to_string()
        } else {
            format!(r"\b(?:{pattern})\b")
        };
        let Ok(re) = Regex::new(&effective) else {
            tracing::debug!("invalid search pattern: {pattern}");
            return Vec::new();
        };
        let mut hits: Vec<NodeHit> = self
            .graph
            .all_nodes()
            .filter(|n| re.is_match(&n.entity.name))
            .map(NodeHit::from_node)
            .collect();
        hits.sort_by(|a, b| (&a.file_path, &a.name).cmp(&(&b.file_path, &b.name)));
        hits
    }

    /// Exported names of a file, as recorded by the engine.
    pub fn exports(&self, file_path: &str) -> Vec<String> {
        self.exports.get(file_path).cloned().unwrap_or_default()
    }

    /// All entities in a file.
    pub fn file(&self, file_path: &str) -> Vec<NodeHit> {
        self.graph
            .nodes_in_file(file_path)
            .into_iter()
            .map(NodeHit::from_node)
            .collect()
    }

    /// Full detail for an entity: both edge directions.
    pub fn entity(&self, name: &str) -> NeighborReport {
        let matches = self.graph.lookup(name);
        let nodes = matches
            .iter()
            .map(|node| {
                let mut edges: Vec<EdgeHit> = self
                    .graph
                    .incoming_edges(&node.id)
                    .iter()
                    .map(|e| self.edge_hit(e, true))
                    .collect();
                edges.extend(
                    self.graph
                        .outgoing_edges(&node.id)
                        .iter()
                        .map(|e| self.edge_hit(e, false)),
                );
                NodeNeighbors {
                    node: NodeHit::from_node(node),
                    edges,
                }
            })
            .collect::<Vec<_>>();
        NeighborReport {
            query: name.to_string(),
            found: !nodes.is_empty(),
            nodes,
        }
    }

    /// Counts, top-degree nodes, entry-point candidates, and cycles.
    pub fn summary(&self) -> Summary {
        let top_k = self.config.summary_top_k;
        let mut by_in: Vec<(String, usize)> = self
            .graph
            .all_nodes()
            .map(|n| (n.entity.name.clone(), self.graph.incoming_edges(&n.id).len()))
            .filter(|(_, count)| *count > 0)
            .collect();
        by_in.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        by_in.truncate(top_k);

        let mut by_out: Vec<(String, usize)> = self
            .graph
            .all_nodes()
            .map(|n| (n.entity.name.clone(), self.graph.outgoing_edges(&n.id).len()))
            .filter(|(_, count)| *count > 0)
            .collect();
        by_out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        by_out.truncate(top_k);

        let entry_re = Regex::new("^(main|run|start|handler|init)$").expect("entry pattern");
        let mut entry_points: Vec<String> = self
            .graph
            .all_nodes()
            .filter(|n| {
                let bare = bare_name(&n.entity.name);
                let stem = file_stem(&n.entity.file_path);
                entry_re.is_match(bare) || stem == "__main__"
            })
            .map(|n| n.id.clone())
            .collect();
        entry_points.sort();

        Summary {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            files: self.graph.files().len(),
            top_incoming: by_in,
            top_outgoing: by_out,
            entry_points,
            cycles: self.cycles(),
        }
    }
}

fn file_stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use lattice_core::EntityKind;

    fn fixture() -> (CodeGraph, HashMap<String, Vec<String>>, QueryConfig) {
        let mut graph = CodeGraph::new();
        graph.add_node(node(EntityKind::Function, "util", "a.py"));
        graph.add_node(node(EntityKind::Function, "go", "b.py"));
        graph.add_node(node(EntityKind::Import, "util", "b.py"));
        graph.add_edge(edge("b.py", "go", "a.py", "util", EdgeKind::Calls));
        graph.add_edge(edge("b.py", "util", "a.py", "util", EdgeKind::Imports));
        // `util` is declared through an explicit export marker.
        let exports = HashMap::from([("a.py".to_string(), vec!["util".to_string()])]);
        (graph, exports, QueryConfig::default())
    }

    #[test]
    fn callers_returns_incoming_with_confidence() {
        let (graph, exports, config) = fixture();
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        let report = engine.callers("util");
        assert!(report.found);
        // Both the definition in a.py and the import node in b.py match.
        let def = report
            .nodes
            .iter()
            .find(|n| n.node.file_path == "a.py")
            .unwrap();
        assert_eq!(def.edges.len(), 2);
        assert!(def
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Calls && e.other_name == "go"));
        assert!(def.edges.iter().all(|e| e.confidence == Confidence::High));
    }

    #[test]
    fn callees_returns_outgoing() {
        let (graph, exports, config) = fixture();
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        let report = engine.callees("go");
        assert!(report.found);
        assert_eq!(report.nodes[0].edges.len(), 1);
        assert_eq!(report.nodes[0].edges[0].other_name, "util");
    }

    #[test]
    fn missing_name_reports_not_found() {
        let (graph, exports, config) = fixture();
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        let report = engine.callers("nonexistent_zz");
        assert!(!report.found);
        assert!(report.nodes.is_empty());
    }

    #[test]
    fn search_is_word_anchored_by_default() {
        let (graph, exports, config) = fixture();
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        assert_eq!(engine.search("util").len(), 2);
        assert!(engine.search("uti").is_empty());
        assert_eq!(engine.search("^go$").len(), 1);
    }

    #[test]
    fn exports_and_file_listing() {
        let (graph, exports, config) = fixture();
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        assert_eq!(engine.exports("a.py"), vec!["util"]);
        assert!(engine.exports("b.py").is_empty());
        assert_eq!(engine.file("b.py").len(), 2);
    }

    #[test]
    fn path_between_names() {
        let (graph, exports, config) = fixture();
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        let path = engine.path("go", "util").unwrap();
        assert_eq!(path.len(), 2);
        assert!(engine.path("util", "go").is_none());
    }

    #[test]
    fn summary_counts_and_entry_points() {
        let (mut graph, exports, config) = fixture();
        graph.add_node(node(EntityKind::Function, "main", "cli.py"));
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        let summary = engine.summary();
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.edges, 2);
        assert!(summary
            .entry_points
            .iter()
            .any(|id| id.contains("cli.py::main")));
        assert!(summary.top_incoming.iter().any(|(name, n)| name == "util" && *n == 2));
    }

    #[test]
    fn dead_respects_exports() {
        let (graph, exports, config) = fixture();
        let engine = QueryEngine::new(&graph, &exports, &exports, &config);
        let dead = engine.dead();
        // `go` has no incoming edges and is not exported; `util` is exported
        // and called.
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].name, "go");
    }
}
