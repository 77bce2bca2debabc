//! Partial recovery for transiently unparseable Python files.
//!
//! Mid-edit source frequently fails to parse as a whole even though
//! most of the file is intact. This module performs a binary-search
//! reduction over line windows, extracting entities from every maximal
//! window that parses cleanly. Recovered entities carry medium
//! confidence.

use lattice_core::{Confidence, Entity};

use super::python;
use crate::regex_base::dedupe_entities;

/// Depth bound for the window reduction; windows smaller than a line
/// are not worth splitting.
const MAX_SPLIT_DEPTH: u32 = 12;

/// Salvage entities from source that does not parse as a whole.
pub fn recover(source: &str, file_path: &str) -> Vec<Entity> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut entities = Vec::new();
    reduce(&lines, 0, lines.len(), file_path, 0, &mut entities);

    let mut entities = dedupe_entities(entities);
    for entity in &mut entities {
        entity.confidence = Confidence::Medium;
    }
    entities
}

fn reduce(
    lines: &[&str],
    start: usize,
    end: usize,
    file_path: &str,
    depth: u32,
    out: &mut Vec<Entity>,
) {
    if start >= end || depth > MAX_SPLIT_DEPTH {
        return;
    }
    let window = lines[start..end].join("\n");
    if window.trim().is_empty() {
        return;
    }

    if let Some(tree) = python::parse(&window) {
        if !tree.root_node().has_error() {
            let mut found = python::extract_tree(&tree, &window, file_path);
            for entity in &mut found {
                entity.line_start += start as u32;
                entity.line_end += start as u32;
            }
            out.append(&mut found);
            return;
        }
    }

    if end - start <= 1 {
        return;
    }
    let mid = start + (end - start) / 2;
    reduce(lines, start, mid, file_path, depth + 1, out);
    reduce(lines, mid, end, file_path, depth + 1, out);
}
