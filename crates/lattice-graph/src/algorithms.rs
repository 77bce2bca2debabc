//! Graph algorithms: file-level cycle detection, shortest paths,
//! impact analysis, and dead-node detection.

use crate::CodeGraph;
use lattice_core::{is_test_file, CodeNode, EntityKind};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Name prefixes of framework-invoked entities never reported dead.
const FRAMEWORK_PREFIXES: [&str; 4] = ["test_", "visit_", "setUp", "tearDown"];

/// Build the condensed file-level graph: an edge F₁ → F₂ exists iff
/// some node in F₁ has a resolved outgoing edge to a node in F₂.
/// Same-file edges are dropped (every file would be a self-loop
/// otherwise).
pub fn file_graph(
    graph: &CodeGraph,
    exclude_tests: bool,
) -> (DiGraph<String, ()>, HashMap<String, NodeIndex>) {
    let mut fg = DiGraph::new();
    let mut indices: HashMap<String, NodeIndex> = HashMap::new();

    let mut index_of = |fg: &mut DiGraph<String, ()>, file: &str| -> NodeIndex {
        *indices
            .entry(file.to_string())
            .or_insert_with(|| fg.add_node(file.to_string()))
    };

    let mut seen_pairs: BTreeSet<(String, String)> = BTreeSet::new();
    for file in graph.files() {
        if exclude_tests && is_test_file(file) {
            continue;
        }
        index_of(&mut fg, file);
        for target in graph.file_deps(file) {
            if exclude_tests && is_test_file(&target) {
                continue;
            }
            if seen_pairs.insert((file.to_string(), target.clone())) {
                let src = index_of(&mut fg, file);
                let dst = index_of(&mut fg, &target);
                fg.add_edge(src, dst, ());
            }
        }
    }
    (fg, indices)
}

/// File-level circular dependencies: SCCs with more than one file, or
/// self-loops. Each cycle is sorted and cycles are returned in a
/// deterministic order.
pub fn find_cycles(graph: &CodeGraph, exclude_tests: bool) -> Vec<Vec<String>> {
    let (fg, _) = file_graph(graph, exclude_tests);
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for component in tarjan_scc(&fg) {
        let is_cycle = component.len() > 1
            || component
                .iter()
                .any(|&idx| fg.find_edge(idx, idx).is_some());
        if is_cycle {
            let mut files: Vec<String> = component.iter().map(|&idx| fg[idx].clone()).collect();
            files.sort();
            cycles.push(files);
        }
    }
    cycles.sort();
    cycles
}

/// BFS shortest path between two nodes following outgoing edges.
/// Neighbors are visited in lexicographic target order so ties break
/// deterministically. Returns node ids, source first.
pub fn shortest_path(graph: &CodeGraph, source_id: &str, target_id: &str) -> Option<Vec<String>> {
    if source_id == target_id {
        return Some(vec![source_id.to_string()]);
    }
    let mut visited: HashSet<String> = HashSet::from([source_id.to_string()]);
    let mut parent: HashMap<String, String> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::from([source_id.to_string()]);

    while let Some(current) = queue.pop_front() {
        // outgoing_edges is already sorted by (kind, target)
        let mut targets: Vec<String> = graph
            .outgoing_edges(&current)
            .into_iter()
            .map(|e| e.target_id)
            .collect();
        targets.sort();
        for next in targets {
            if !visited.insert(next.clone()) {
                continue;
            }
            parent.insert(next.clone(), current.clone());
            if next == target_id {
                let mut path = vec![next.clone()];
                let mut cursor = next;
                while let Some(prev) = parent.get(&cursor) {
                    path.push(prev.clone());
                    cursor = prev.clone();
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

/// Files transitively affected by a change to `file_path`, via BFS over
/// reverse file dependencies up to `max_depth`. With `name` given, the
/// seed set is restricted to files referencing that bare name in the
/// changed file.
pub fn impact(
    graph: &CodeGraph,
    file_path: &str,
    name: Option<&str>,
    max_depth: usize,
) -> Vec<String> {
    let seeds: Vec<String> = match name {
        Some(name) => {
            let mut seeds = BTreeSet::new();
            for node in graph.nodes_in_file(file_path) {
                if lattice_core::bare_name(&node.entity.name) != name {
                    continue;
                }
                for edge in graph.incoming_edges(&node.id) {
                    if edge.source_file != file_path {
                        seeds.insert(edge.source_file.clone());
                    }
                }
            }
            seeds.into_iter().collect()
        }
        None => graph.reverse_file_deps(file_path),
    };

    let mut affected: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    for seed in seeds {
        affected.insert(seed.clone());
        queue.push_back((seed, 1));
    }

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for dependent in graph.reverse_file_deps(&current) {
            if dependent != file_path && affected.insert(dependent.clone()) {
                queue.push_back((dependent, depth + 1));
            }
        }
    }
    affected.into_iter().collect()
}

/// Function/class nodes with zero incoming edges, excluding exported
/// names, entry points, dunders, test files, and framework-invoked
/// patterns.
pub fn dead_nodes<'a>(
    graph: &'a CodeGraph,
    exports: &HashMap<String, Vec<String>>,
    entry_patterns: &[Regex],
) -> Vec<&'a CodeNode> {
    let mut dead: Vec<&CodeNode> = Vec::new();
    for node in graph.all_nodes() {
        if !matches!(node.entity.kind, EntityKind::Function | EntityKind::Class) {
            continue;
        }
        let bare = lattice_core::bare_name(&node.entity.name);
        if bare.starts_with("__") && bare.ends_with("__") {
            continue;
        }
        if is_test_file(&node.entity.file_path) {
            continue;
        }
        if FRAMEWORK_PREFIXES.iter().any(|p| bare.starts_with(p)) {
            continue;
        }
        if entry_patterns.iter().any(|re| re.is_match(bare)) {
            continue;
        }
        if exports
            .get(&node.entity.file_path)
            .is_some_and(|names| names.iter().any(|n| n == bare || n == &node.entity.name))
        {
            continue;
        }
        if graph.incoming_edges(&node.id).is_empty() {
            dead.push(node);
        }
    }
    dead.sort_by(|a, b| {
        (&a.entity.file_path, &a.entity.name).cmp(&(&b.entity.file_path, &b.entity.name))
    });
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use lattice_core::{node_id, EdgeKind};

    fn linked_graph() -> CodeGraph {
        // a.py::fa -> b.py::fb -> c.py::fc
        let mut graph = CodeGraph::new();
        graph.add_node(node(EntityKind::Function, "fa", "a.py"));
        graph.add_node(node(EntityKind::Function, "fb", "b.py"));
        graph.add_node(node(EntityKind::Function, "fc", "c.py"));
        graph.add_edge(edge("a.py", "fa", "b.py", "fb", EdgeKind::Calls));
        graph.add_edge(edge("b.py", "fb", "c.py", "fc", EdgeKind::Calls));
        graph
    }

    #[test]
    fn no_cycles_in_a_chain() {
        let graph = linked_graph();
        assert!(find_cycles(&graph, true).is_empty());
    }

    #[test]
    fn two_file_cycle_detected() {
        let mut graph = linked_graph();
        graph.add_edge(edge("c.py", "fc", "a.py", "fa", EdgeKind::Imports));
        let cycles = find_cycles(&graph, true);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["a.py", "b.py", "c.py"]);
    }

    #[test]
    fn cycles_exclude_test_files() {
        let mut graph = CodeGraph::new();
        graph.add_node(node(EntityKind::Function, "fa", "a.py"));
        graph.add_node(node(EntityKind::Function, "ft", "tests/test_a.py"));
        graph.add_edge(edge("a.py", "fa", "tests/test_a.py", "ft", EdgeKind::Calls));
        graph.add_edge(edge("tests/test_a.py", "ft", "a.py", "fa", EdgeKind::Calls));
        assert!(find_cycles(&graph, true).is_empty());
        assert_eq!(find_cycles(&graph, false).len(), 1);
    }

    #[test]
    fn shortest_path_found_in_order() {
        let graph = linked_graph();
        let path = shortest_path(&graph, &node_id("a.py", "fa"), &node_id("c.py", "fc")).unwrap();
        assert_eq!(
            path,
            vec![
                node_id("a.py", "fa"),
                node_id("b.py", "fb"),
                node_id("c.py", "fc")
            ]
        );
    }

    #[test]
    fn no_path_backwards() {
        let graph = linked_graph();
        assert!(shortest_path(&graph, &node_id("c.py", "fc"), &node_id("a.py", "fa")).is_none());
    }

    #[test]
    fn impact_walks_reverse_deps() {
        // Chain a -> b -> c -> d means editing d impacts c, b, a.
        let mut graph = linked_graph();
        graph.add_node(node(EntityKind::Function, "fd", "d.py"));
        graph.add_edge(edge("c.py", "fc", "d.py", "fd", EdgeKind::Calls));

        let affected = impact(&graph, "d.py", None, 5);
        assert_eq!(affected, vec!["a.py", "b.py", "c.py"]);
        assert!(impact(&graph, "a.py", None, 5).is_empty());
    }

    #[test]
    fn impact_depth_bounded() {
        let mut graph = linked_graph();
        graph.add_node(node(EntityKind::Function, "fd", "d.py"));
        graph.add_edge(edge("c.py", "fc", "d.py", "fd", EdgeKind::Calls));

        let affected = impact(&graph, "d.py", None, 1);
        assert_eq!(affected, vec!["c.py"]);
    }

    #[test]
    fn impact_with_name_restricts_seeds() {
        let mut graph = linked_graph();
        // c.py::other exists but nothing references it
        graph.add_node(node(EntityKind::Function, "other", "c.py"));
        let affected = impact(&graph, "c.py", Some("other"), 5);
        assert!(affected.is_empty());
        let affected = impact(&graph, "c.py", Some("fc"), 5);
        assert_eq!(affected, vec!["a.py", "b.py"]);
    }

    #[test]
    fn dead_nodes_exclude_exports_and_entry_points() {
        let mut graph = CodeGraph::new();
        graph.add_node(node(EntityKind::Function, "orphan", "m.py"));
        graph.add_node(node(EntityKind::Function, "main", "m.py"));
        graph.add_node(node(EntityKind::Function, "published", "m.py"));

        let exports = HashMap::from([("m.py".to_string(), vec!["published".to_string()])]);
        let entry = vec![Regex::new("^(main|run|start|handler|init)$").unwrap()];

        let dead = dead_nodes(&graph, &exports, &entry);
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].entity.name, "orphan");
    }

    #[test]
    fn called_nodes_not_dead() {
        let graph = linked_graph();
        let dead = dead_nodes(&graph, &HashMap::new(), &[]);
        // fa has no incoming edges; fb and fc are called.
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].entity.name, "fa");
    }
}
