//! JSON snapshot persistence.
//!
//! The whole store serializes to one JSON document under the user's
//! config root, keyed by a stable project id. Saves are atomic
//! (write-temp-then-rename); loads are defensive — a schema-version or
//! checksum mismatch yields a clean start instead of an error.

use lattice_core::{config_root, CodeEdge, CodeNode, Entity, LatticeError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 3;

/// The on-disk snapshot document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub saved_at: i64,
    pub checksum: String,
    pub nodes: Vec<CodeNode>,
    pub edges: Vec<CodeEdge>,
    /// Per-file entity lists backing delta computation across restarts.
    pub file_snapshots: HashMap<String, Vec<Entity>>,
    /// Per-file exported-symbol sets recorded by the bridge.
    pub exports: HashMap<String, Vec<String>>,
}

impl Snapshot {
    pub fn new(
        nodes: Vec<CodeNode>,
        edges: Vec<CodeEdge>,
        file_snapshots: HashMap<String, Vec<Entity>>,
        exports: HashMap<String, Vec<String>>,
    ) -> Self {
        let checksum = payload_checksum(&nodes, &edges);
        Self {
            schema_version: SCHEMA_VERSION,
            saved_at: chrono::Utc::now().timestamp(),
            checksum,
            nodes,
            edges,
            file_snapshots,
            exports,
        }
    }
}

/// Checksum over the graph payload, verified on load.
fn payload_checksum(nodes: &[CodeNode], edges: &[CodeEdge]) -> String {
    let mut hasher = Sha256::new();
    for node in nodes {
        hasher.update(node.id.as_bytes());
        hasher.update(node.entity.signature_hash.as_bytes());
    }
    for edge in edges {
        hasher.update(edge.source_id.as_bytes());
        hasher.update(edge.target_id.as_bytes());
        hasher.update(edge.kind.to_string().as_bytes());
    }
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(16);
    hex
}

/// Stable project id derived from the absolute project path.
pub fn project_id(project_root: &Path) -> String {
    let absolute = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(absolute.to_string_lossy().as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(12);
    hex
}

/// Owns the snapshot file location and its read/write protocol.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store under the config root, keyed by project path.
    pub fn for_project(project_root: &Path) -> Self {
        let path = config_root().join(format!("graph_{}.json", project_id(project_root)));
        Self { path }
    }

    /// Store at an explicit path (tests, host override).
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Atomic save: serialize to a sibling temp file, then rename.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), LatticeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let payload = serde_json::to_vec(snapshot)?;
        std::fs::write(&tmp, payload)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Defensive load. Returns `None` (clean start) when the file is
    /// missing, unreadable, structurally invalid, from a different
    /// schema version, or fails its checksum.
    pub fn load(&self) -> Option<Snapshot> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!("discarding corrupt snapshot {}: {err}", self.path.display());
                return None;
            }
        };
        if snapshot.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                "discarding snapshot {}: schema v{} != v{SCHEMA_VERSION}",
                self.path.display(),
                snapshot.schema_version
            );
            return None;
        }
        if snapshot.checksum != payload_checksum(&snapshot.nodes, &snapshot.edges) {
            tracing::warn!("discarding snapshot {}: checksum mismatch", self.path.display());
            return None;
        }
        Some(snapshot)
    }

    pub fn delete(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::{Confidence, EdgeKind, EntityKind};

    fn sample_snapshot() -> Snapshot {
        let entity = Entity {
            kind: EntityKind::Function,
            name: "go".to_string(),
            file_path: "a.py".to_string(),
            line_start: 1,
            line_end: 2,
            signature_hash: "a".repeat(12),
            structure_hash: "b".repeat(12),
            calls: vec!["util".to_string()],
            inherits: vec![],
            type_refs: vec![],
            decorators: vec![],
            imports: vec![],
            params: vec!["x".to_string()],
            uses: vec![],
            confidence: Confidence::High,
        };
        let node = CodeNode::new(entity.clone());
        let edge = CodeEdge {
            source_id: node.id.clone(),
            target_id: "unresolved:util".to_string(),
            kind: EdgeKind::Calls,
            confidence: Confidence::Low,
            source_file: "a.py".to_string(),
        };
        Snapshot::new(
            vec![node],
            vec![edge],
            HashMap::from([("a.py".to_string(), vec![entity])]),
            HashMap::from([("a.py".to_string(), vec!["go".to_string()])]),
        )
    }

    fn temp_store(name: &str) -> SnapshotStore {
        let dir = std::env::temp_dir().join("lattice_persistence_test");
        let _ = std::fs::create_dir_all(&dir);
        let store = SnapshotStore::at_path(dir.join(name));
        store.delete();
        store
    }

    #[test]
    fn save_and_load_roundtrip() {
        let store = temp_store("roundtrip.json");
        let snapshot = sample_snapshot();
        store.save(&snapshot).expect("save should succeed");

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
        assert_eq!(loaded.nodes.len(), 1);
        assert_eq!(loaded.edges.len(), 1);
        assert_eq!(loaded.exports["a.py"], vec!["go"]);
        assert_eq!(loaded.file_snapshots["a.py"].len(), 1);
        store.delete();
    }

    #[test]
    fn missing_file_loads_none() {
        let store = temp_store("missing.json");
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_json_discarded() {
        let store = temp_store("corrupt.json");
        std::fs::write(store.path(), b"{not json").unwrap();
        assert!(store.load().is_none());
        store.delete();
    }

    #[test]
    fn schema_mismatch_discarded() {
        let store = temp_store("schema.json");
        let mut snapshot = sample_snapshot();
        snapshot.schema_version = SCHEMA_VERSION + 1;
        store.save(&snapshot).unwrap();
        assert!(store.load().is_none());
        store.delete();
    }

    #[test]
    fn checksum_mismatch_discarded() {
        let store = temp_store("checksum.json");
        let mut snapshot = sample_snapshot();
        snapshot.checksum = "deadbeefdeadbeef".to_string();
        store.save(&snapshot).unwrap();
        assert!(store.load().is_none());
        store.delete();
    }

    #[test]
    fn edge_uses_spec_field_name_on_disk() {
        let store = temp_store("fields.json");
        store.save(&sample_snapshot()).unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("target_id_or_placeholder"));
        assert!(raw.contains("schema_version"));
        assert!(raw.contains("saved_at"));
        store.delete();
    }

    #[test]
    fn project_id_is_stable() {
        let a = project_id(Path::new("/tmp"));
        let b = project_id(Path::new("/tmp"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }
}
