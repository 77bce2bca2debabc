//! Mermaid rendering of a file's dependency neighborhood.

use lattice_graph::CodeGraph;

/// Render `graph LR` Mermaid for one file: its forward deps on the
/// right, its dependents on the left.
pub fn mermaid_for_file(graph: &CodeGraph, file_path: &str) -> String {
    let mut lines = vec!["graph LR".to_string()];
    let center = mermaid_id(file_path);
    lines.push(format!("    {center}[\"{file_path}\"]"));

    for dep in graph.file_deps(file_path) {
        lines.push(format!("    {center} --> {}[\"{dep}\"]", mermaid_id(&dep)));
    }
    for rdep in graph.reverse_file_deps(file_path) {
        lines.push(format!("    {}[\"{rdep}\"] --> {center}", mermaid_id(&rdep)));
    }
    lines.join("\n")
}

/// Mermaid node ids must be alphanumeric.
fn mermaid_id(file_path: &str) -> String {
    file_path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::{CodeEdge, CodeNode, Confidence, EdgeKind, Entity, EntityKind};

    fn node(name: &str, file: &str) -> CodeNode {
        CodeNode::new(Entity {
            kind: EntityKind::Function,
            name: name.to_string(),
            file_path: file.to_string(),
            line_start: 1,
            line_end: 1,
            signature_hash: "s".repeat(12),
            structure_hash: "t".repeat(12),
            calls: vec![],
            inherits: vec![],
            type_refs: vec![],
            decorators: vec![],
            imports: vec![],
            params: vec![],
            uses: vec![],
            confidence: Confidence::High,
        })
    }

    #[test]
    fn renders_deps_and_rdeps() {
        let mut graph = CodeGraph::new();
        let a = node("fa", "a.py");
        let b = node("fb", "b.py");
        let c = node("fc", "c.py");
        let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());
        graph.add_node(a);
        graph.add_node(b);
        graph.add_node(c);
        graph.add_edge(CodeEdge {
            source_id: b_id.clone(),
            target_id: a_id.clone(),
            kind: EdgeKind::Calls,
            confidence: Confidence::High,
            source_file: "b.py".to_string(),
        });
        graph.add_edge(CodeEdge {
            source_id: a_id,
            target_id: c_id,
            kind: EdgeKind::Imports,
            confidence: Confidence::High,
            source_file: "a.py".to_string(),
        });

        let mermaid = mermaid_for_file(&graph, "a.py");
        assert!(mermaid.starts_with("graph LR"));
        assert!(mermaid.contains("a_py --> c_py"));
        assert!(mermaid.contains("b_py[\"b.py\"] --> a_py"));
    }

    #[test]
    fn ids_are_sanitized() {
        assert_eq!(mermaid_id("src/a-b.py"), "src_a_b_py");
    }
}
