//! Minimal delta computation between the previous and new entity sets
//! of one file.
//!
//! Entities are bucketed by `(entity_type, name)`; rename pairing runs
//! over the keys present on only one side, matching same-typed entities
//! whose structure hashes agree and whose positions fall within a small
//! line window.

use lattice_core::Entity;

/// A rename detected between two extractions.
#[derive(Debug, Clone)]
pub struct Renamed {
    pub old_name: String,
    pub entity: Entity,
}

/// The four delta buckets of one file update.
#[derive(Debug, Default)]
pub struct Delta {
    pub added: Vec<Entity>,
    pub removed: Vec<Entity>,
    pub modified: Vec<Entity>,
    pub renamed: Vec<Renamed>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.renamed.is_empty()
    }
}

/// Compare old and new entity lists.
///
/// `rename_window` is the maximum line distance between a disappeared
/// and an appeared entity for them to pair as a rename when their
/// structure hashes match.
pub fn diff(old: &[Entity], new: &[Entity], rename_window: u32) -> Delta {
    let mut delta = Delta::default();

    let find_old = |e: &Entity| old.iter().find(|o| o.key() == e.key());
    let find_new = |o: &Entity| new.iter().find(|e| e.key() == o.key());

    // Matching keys: unchanged or modified.
    for entity in new {
        if let Some(previous) = find_old(entity) {
            if previous.signature_hash != entity.signature_hash {
                delta.modified.push(entity.clone());
            }
        }
    }

    let mut only_old: Vec<&Entity> = old.iter().filter(|&o| find_new(o).is_none()).collect();
    let mut only_new: Vec<&Entity> = new
        .iter()
        .filter(|&e| find_old(e).is_none())
        .collect();
    only_old.sort_by(|a, b| a.name.cmp(&b.name));
    only_new.sort_by(|a, b| a.name.cmp(&b.name));

    // Rename pairing over the one-sided keys.
    let mut matched_old: Vec<bool> = vec![false; only_old.len()];
    for &entity in &only_new {
        let mut paired = false;
        for (i, &previous) in only_old.iter().enumerate() {
            if matched_old[i] {
                continue;
            }
            if previous.kind == entity.kind
                && previous.structure_hash == entity.structure_hash
                && positions_close(previous, entity, rename_window)
            {
                delta.renamed.push(Renamed {
                    old_name: previous.name.clone(),
                    entity: entity.clone(),
                });
                matched_old[i] = true;
                paired = true;
                break;
            }
        }
        if !paired {
            delta.added.push(entity.clone());
        }
    }
    for (i, &previous) in only_old.iter().enumerate() {
        if !matched_old[i] {
            delta.removed.push(previous.clone());
        }
    }

    delta
}

/// Line ranges overlap, or the starts are within the window.
fn positions_close(a: &Entity, b: &Entity, window: u32) -> bool {
    let overlap = a.line_start <= b.line_end && b.line_start <= a.line_end;
    overlap || a.line_start.abs_diff(b.line_start) <= window
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::{Confidence, EntityKind};

    fn entity(name: &str, sig: &str, structure: &str, line: u32) -> Entity {
        Entity {
            kind: EntityKind::Function,
            name: name.to_string(),
            file_path: "f.py".to_string(),
            line_start: line,
            line_end: line + 3,
            signature_hash: sig.to_string(),
            structure_hash: structure.to_string(),
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
    fn identical_lists_produce_empty_delta() {
        let entities = vec![entity("a", "s1", "t1", 1), entity("b", "s2", "t2", 10)];
        let delta = diff(&entities, &entities, 10);
        assert!(delta.is_empty());
    }

    #[test]
    fn signature_change_is_modified() {
        let old = vec![entity("a", "s1", "t1", 1)];
        let new = vec![entity("a", "s1-changed", "t1-changed", 1)];
        let delta = diff(&old, &new, 10);
        assert_eq!(delta.modified.len(), 1);
        assert!(delta.added.is_empty());
        assert!(delta.removed.is_empty());
        assert!(delta.renamed.is_empty());
    }

    #[test]
    fn rename_detected_by_structure_hash() {
        let old = vec![entity("foo", "sig-foo", "shared", 5)];
        let new = vec![entity("baz", "sig-baz", "shared", 5)];
        let delta = diff(&old, &new, 10);
        assert_eq!(delta.renamed.len(), 1);
        assert_eq!(delta.renamed[0].old_name, "foo");
        assert_eq!(delta.renamed[0].entity.name, "baz");
        assert!(delta.added.is_empty());
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn rename_outside_window_is_add_plus_remove() {
        let old = vec![entity("foo", "sig-foo", "shared", 5)];
        let new = vec![entity("baz", "sig-baz", "shared", 100)];
        let delta = diff(&old, &new, 10);
        assert!(delta.renamed.is_empty());
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
    }

    #[test]
    fn rename_requires_same_kind() {
        let mut old_entity = entity("foo", "sig-foo", "shared", 5);
        old_entity.kind = EntityKind::Class;
        let new = vec![entity("baz", "sig-baz", "shared", 5)];
        let delta = diff(&[old_entity], &new, 10);
        assert!(delta.renamed.is_empty());
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
    }

    #[test]
    fn rename_with_changed_structure_is_add_plus_remove() {
        let old = vec![entity("foo", "sig-foo", "struct-a", 5)];
        let new = vec![entity("baz", "sig-baz", "struct-b", 5)];
        let delta = diff(&old, &new, 10);
        assert!(delta.renamed.is_empty());
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
    }

    #[test]
    fn added_and_removed_without_pairing() {
        let old = vec![entity("gone", "s1", "t1", 1)];
        let new = vec![entity("fresh", "s2", "t2", 50)];
        let delta = diff(&old, &new, 10);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.added[0].name, "fresh");
        assert_eq!(delta.removed[0].name, "gone");
    }

    #[test]
    fn one_rename_consumes_one_candidate() {
        // Two disappeared entities share a structure hash; only one can
        // pair with the single appeared entity.
        let old = vec![
            entity("first", "s1", "shared", 5),
            entity("second", "s2", "shared", 6),
        ];
        let new = vec![entity("renamed", "s3", "shared", 5)];
        let delta = diff(&old, &new, 10);
        assert_eq!(delta.renamed.len(), 1);
        assert_eq!(delta.removed.len(), 1);
        assert!(delta.added.is_empty());
    }
}
