//! lattice-engine: Orchestrates one edit — extract → diff → patch →
//! resolve → propagate — and owns persistence and the query surface.
//!
//! `process_change` is atomic: propagation runs to completion (up to
//! its bound) before the call returns, and no query observes an
//! intermediate state. Errors degrade to warnings on the change report;
//! the engine never aborts a session.

pub mod delta;
pub mod persistence;
pub mod propagator;
pub mod resolver;
pub mod scan;

use lattice_core::{
    bare_name, node_id, ChangeKind, ChangeReport, CodeNode, Entity, EntityKind, LatticeConfig,
    LatticeError, Warning,
};
use lattice_extract::ExtractorRegistry;
use lattice_graph::{algorithms, query::QueryEngine, CodeGraph};
use persistence::{Snapshot, SnapshotStore};
use propagator::BoundedPropagator;
use resolver::{ResolutionStats, ResolverContext};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// The incremental code-graph engine.
pub struct Engine {
    graph: CodeGraph,
    registry: ExtractorRegistry,
    config: LatticeConfig,
    /// Per-file entity lists from the last extraction, backing the differ.
    file_snapshots: HashMap<String, Vec<Entity>>,
    /// Per-file exported-symbol sets (explicit marker or top-level
    /// fallback).
    exports: HashMap<String, Vec<String>>,
    /// Subset of `exports` declared through an explicit marker; only
    /// these shield names from dead-code reports.
    explicit_exports: HashMap<String, Vec<String>>,
    /// Module path (with suffix variants) → defining file.
    module_index: HashMap<String, String>,
    module_collisions: HashSet<String>,
    propagator: BoundedPropagator,
    stats: ResolutionStats,
    store: Option<SnapshotStore>,
    closed: bool,
}

impl Engine {
    /// In-memory engine without persistence.
    pub fn new(config: LatticeConfig) -> Self {
        let propagator = BoundedPropagator::new(config.propagator.clone());
        Self {
            graph: CodeGraph::new(),
            registry: ExtractorRegistry::with_defaults(),
            config,
            file_snapshots: HashMap::new(),
            exports: HashMap::new(),
            explicit_exports: HashMap::new(),
            module_index: HashMap::new(),
            module_collisions: HashSet::new(),
            propagator,
            stats: ResolutionStats::default(),
            store: None,
            closed: false,
        }
    }

    /// Engine backed by a snapshot store: load-or-empty at start, final
    /// snapshot at shutdown.
    pub fn with_store(config: LatticeConfig, store: SnapshotStore) -> Self {
        let mut engine = Self::new(config);
        if let Some(snapshot) = store.load() {
            engine.restore(snapshot);
            tracing::info!(
                "restored graph: {} nodes, {} edges",
                engine.graph.node_count(),
                engine.graph.edge_count()
            );
        }
        engine.store = Some(store);
        engine
    }

    fn restore(&mut self, snapshot: Snapshot) {
        for node in snapshot.nodes {
            self.graph.add_node(node);
        }
        for edge in snapshot.edges {
            self.graph.add_edge(edge);
        }
        self.exports = snapshot.exports;
        for (file, entities) in &snapshot.file_snapshots {
            index_module_path(&mut self.module_index, &mut self.module_collisions, file);
            let (names, explicit) = compute_exports(entities);
            if explicit {
                self.explicit_exports.insert(file.clone(), names);
            }
        }
        self.file_snapshots = snapshot.file_snapshots;
    }

    // ── Engine API ──────────────────────────────────────────────────────

    /// Apply one file event. `new_text` is `None` for deletions (and a
    /// missing file on edit is treated as a delete).
    pub fn process_change(
        &mut self,
        file_path: &str,
        new_text: Option<&str>,
        kind: ChangeKind,
    ) -> Result<ChangeReport, LatticeError> {
        if self.closed {
            return Err(LatticeError::EngineClosed);
        }
        let mut report = ChangeReport::for_file(file_path);

        if kind == ChangeKind::Delete || new_text.is_none() {
            self.remove_file(file_path, &mut report);
            self.checkpoint();
            return Ok(report);
        }
        let Some(extractor) = self.registry.get(file_path) else {
            return Ok(report);
        };

        let text = new_text.unwrap_or_default();
        let new_entities = extractor.extract(text, file_path);
        let previous = self
            .file_snapshots
            .get(file_path)
            .cloned()
            .unwrap_or_default();

        // Total parse failure: keep the previous entities and warn.
        if new_entities.is_empty() && !previous.is_empty() && !text.trim().is_empty() {
            tracing::warn!("parse failure on {file_path}; keeping previous entities");
            report.warnings.push(Warning::ParseFailure {
                file_path: file_path.to_string(),
            });
            return Ok(report);
        }

        let d = delta::diff(&previous, &new_entities, self.config.delta.rename_window);
        if d.is_empty() {
            // Whitespace/comment-only or identical edit: nothing to patch.
            self.file_snapshots
                .insert(file_path.to_string(), new_entities);
            return Ok(report);
        }

        let cycles_before = algorithms::find_cycles(&self.graph, true);
        let had_incoming: HashSet<String> = self
            .graph
            .all_nodes()
            .filter(|n| !self.graph.incoming_edges(&n.id).is_empty())
            .map(|n| n.id.clone())
            .collect();

        // Removals first: demote inbound references, then drop the node.
        for entity in &d.removed {
            let id = node_id(file_path, &entity.name);
            self.graph.demote_incoming(&id);
            self.graph.remove_node(&id);
        }
        // Renames keep node identity alive: the id is rebuilt and
        // incoming edges carry over with rewritten targets.
        for renamed in &d.renamed {
            let old_id = node_id(file_path, &renamed.old_name);
            self.graph
                .rename_node(&old_id, CodeNode::new(renamed.entity.clone()));
        }
        // Upsert every extracted entity: adds create nodes, modified
        // nodes mutate in place, untouched nodes refresh line ranges.
        let now = chrono::Utc::now().timestamp();
        for entity in &new_entities {
            let id = node_id(file_path, &entity.name);
            match self.graph.get_node_mut(&id) {
                Some(node) => {
                    node.entity = entity.clone();
                    node.last_seen = now;
                }
                None => self.graph.add_node(CodeNode::new(entity.clone())),
            }
        }

        index_module_path(&mut self.module_index, &mut self.module_collisions, file_path);

        // Edge rebuild: every edge sourced from this file is recreated.
        self.graph.remove_edges_from_file(file_path);
        let ctx = ResolverContext {
            module_index: &self.module_index,
            exports: &self.exports,
        };
        resolver::resolve_file(&mut self.graph, &ctx, file_path, &mut self.stats);

        // Pass two: promote placeholders matching added/renamed names.
        let mut changed_names: Vec<String> = d
            .added
            .iter()
            .map(|e| e.bare_name().to_string())
            .collect();
        changed_names.extend(d.renamed.iter().map(|r| r.entity.bare_name().to_string()));
        changed_names.sort();
        changed_names.dedup();
        resolver::promote_unresolved(&mut self.graph, &ctx, &changed_names, &mut self.stats);

        // Exported-set maintenance and bounded propagation.
        let (new_exports, explicit) = compute_exports(&new_entities);
        if explicit {
            self.explicit_exports
                .insert(file_path.to_string(), new_exports.clone());
        } else {
            self.explicit_exports.remove(file_path);
        }
        let old_exports = self
            .exports
            .insert(file_path.to_string(), new_exports.clone())
            .unwrap_or_default();
        if new_exports != old_exports {
            let mut delta_names: HashSet<String> = new_exports
                .iter()
                .filter(|n| !old_exports.contains(*n))
                .chain(old_exports.iter().filter(|n| !new_exports.contains(*n)))
                .map(|n| bare_name(n).to_string())
                .collect();
            for renamed in &d.renamed {
                delta_names.insert(bare_name(&renamed.old_name).to_string());
                delta_names.insert(renamed.entity.bare_name().to_string());
            }
            run_propagation(
                &mut self.graph,
                &self.module_index,
                &self.exports,
                &mut self.propagator,
                &mut self.stats,
                file_path,
                &delta_names,
                &mut report,
            );
        }

        report.added = d.added.len();
        report.removed = d.removed.len();
        report.modified = d.modified.len();
        report.renamed = d.renamed.len();

        self.collect_warnings(file_path, &d, &previous, &cycles_before, &had_incoming, &mut report);

        self.file_snapshots
            .insert(file_path.to_string(), new_entities);
        self.checkpoint();
        Ok(report)
    }

    /// Run a read-only query. See the query engine for the command set.
    pub fn query(&self, command: &str, args: &[String]) -> Result<serde_json::Value, LatticeError> {
        if self.closed {
            return Err(LatticeError::EngineClosed);
        }
        let q = QueryEngine::new(
            &self.graph,
            &self.exports,
            &self.explicit_exports,
            &self.config.query,
        );
        let arg = |i: usize| -> Result<&str, LatticeError> {
            args.get(i)
                .map(|s| s.as_str())
                .ok_or_else(|| LatticeError::Query(format!("{command}: missing argument {i}")))
        };

        let value = match command {
            "callers" => serde_json::to_value(q.callers(arg(0)?))?,
            "callees" => serde_json::to_value(q.callees(arg(0)?))?,
            "deps" => serde_json::to_value(q.deps(arg(0)?))?,
            "rdeps" => serde_json::to_value(q.rdeps(arg(0)?))?,
            "file" => serde_json::to_value(q.file(arg(0)?))?,
            "entity" => serde_json::to_value(q.entity(arg(0)?))?,
            "impact" => {
                serde_json::to_value(q.impact(arg(0)?, args.get(1).map(|s| s.as_str())))?
            }
            "dead" => serde_json::to_value(q.dead())?,
            "path" => serde_json::to_value(q.path(arg(0)?, arg(1)?))?,
            "search" => serde_json::to_value(q.search(arg(0)?))?,
            "cycles" => serde_json::to_value(q.cycles())?,
            "exports" => serde_json::to_value(q.exports(arg(0)?))?,
            "summary" => serde_json::to_value(q.summary())?,
            "stats" => serde_json::json!({
                "nodes": self.graph.node_count(),
                "edges": self.graph.edge_count(),
                "files": self.graph.files().len(),
                "unresolved_edges": self.graph.unresolved_edges().len(),
                "resolution": serde_json::to_value(&self.stats)?,
            }),
            _ => return Err(LatticeError::Query(format!("unknown command: {command}"))),
        };
        Ok(value)
    }

    /// Flush a final snapshot and refuse further calls.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.checkpoint();
        self.closed = true;
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn remove_file(&mut self, file_path: &str, report: &mut ChangeReport) {
        self.graph.remove_edges_from_file(file_path);
        let ids: Vec<String> = self
            .graph
            .nodes_in_file(file_path)
            .iter()
            .map(|n| n.id.clone())
            .collect();
        for id in &ids {
            self.graph.demote_incoming(id);
            self.graph.remove_node(id);
        }
        report.removed = ids.len();

        self.file_snapshots.remove(file_path);
        self.exports.remove(file_path);
        self.explicit_exports.remove(file_path);
        self.module_index.retain(|key, file| {
            let keep = file != file_path;
            if !keep {
                self.module_collisions.remove(key);
            }
            keep
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_warnings(
        &self,
        file_path: &str,
        d: &delta::Delta,
        previous: &[Entity],
        cycles_before: &[Vec<String>],
        had_incoming: &HashSet<String>,
        report: &mut ChangeReport,
    ) {
        // (a) new file-level cycles introduced by this edit.
        for cycle in algorithms::find_cycles(&self.graph, true) {
            if cycle.iter().any(|f| f == file_path) && !cycles_before.contains(&cycle) {
                report.warnings.push(Warning::CycleIntroduced { files: cycle });
            }
        }

        // (b) nodes that lost their last incoming edge.
        for id in had_incoming {
            let Some(node) = self.graph.get_node(id) else {
                continue;
            };
            if !matches!(node.entity.kind, EntityKind::Function | EntityKind::Class) {
                continue;
            }
            let bare = bare_name(&node.entity.name);
            if bare.starts_with("__") && bare.ends_with("__") {
                continue;
            }
            if self.graph.incoming_edges(id).is_empty() {
                report.warnings.push(Warning::NewlyDead {
                    name: node.entity.name.clone(),
                    file_path: node.entity.file_path.clone(),
                });
            }
        }

        // (c) breaking changes: a modified public entity whose params
        // lost or reordered arguments.
        for entity in &d.modified {
            if entity.bare_name().starts_with('_') {
                continue;
            }
            let Some(old) = previous.iter().find(|p| p.key() == entity.key()) else {
                continue;
            };
            let lost: Vec<String> = old
                .params
                .iter()
                .filter(|p| !entity.params.contains(*p))
                .cloned()
                .collect();
            let common_old: Vec<&String> = old
                .params
                .iter()
                .filter(|p| entity.params.contains(*p))
                .collect();
            let common_new: Vec<&String> = entity
                .params
                .iter()
                .filter(|p| old.params.contains(*p))
                .collect();
            if !lost.is_empty() || common_old != common_new {
                report.warnings.push(Warning::BreakingChange {
                    name: entity.name.clone(),
                    file_path: file_path.to_string(),
                    lost_params: lost,
                });
            }
        }
    }

    fn checkpoint(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = self.snapshot();
        if let Err(err) = store.save(&snapshot) {
            tracing::warn!("snapshot save failed: {err}");
        }
    }

    /// Serializable view of the full engine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.graph.all_nodes().cloned().collect(),
            self.graph.all_edges(),
            self.file_snapshots.clone(),
            self.exports.clone(),
        )
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    pub fn exports_map(&self) -> &HashMap<String, Vec<String>> {
        &self.exports
    }

    pub fn resolution_stats(&self) -> &ResolutionStats {
        &self.stats
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Bounded cascade: seed files referencing the changed names, then
/// re-resolve each (edge-only) closest-first, pulling in dependents of
/// dependents up to the depth bound.
#[allow(clippy::too_many_arguments)]
fn run_propagation(
    graph: &mut CodeGraph,
    module_index: &HashMap<String, String>,
    exports: &HashMap<String, Vec<String>>,
    propagator: &mut BoundedPropagator,
    stats: &mut ResolutionStats,
    origin: &str,
    names: &HashSet<String>,
    report: &mut ChangeReport,
) {
    propagator.reset();

    for name in names {
        for edge in graph.unresolved_edges_for(name) {
            if edge.source_file != origin {
                propagator.enqueue(&edge.source_file, 1);
            }
        }
        for id in graph.ids_with_bare_name(name) {
            let id = id.to_string();
            for edge in graph.incoming_edges(&id) {
                if edge.source_file != origin && edge.confidence < lattice_core::Confidence::High {
                    propagator.enqueue(&edge.source_file, 1);
                }
            }
        }
    }

    let ctx = ResolverContext {
        module_index,
        exports,
    };
    let max_depth = propagator.max_depth();
    while let Some(item) = propagator.pop() {
        // Edge-only re-parse: the file's entities have not changed,
        // only what its names resolve to.
        graph.remove_edges_from_file(&item.file_path);
        resolver::resolve_file(graph, &ctx, &item.file_path, stats);
        report.propagated.push(item.file_path.clone());

        if item.depth < max_depth {
            for dependent in graph.reverse_file_deps(&item.file_path) {
                if dependent != origin {
                    propagator.enqueue(&dependent, item.depth + 1);
                }
            }
        }
    }
    if propagator.dropped() > 0 {
        report.warnings.push(Warning::PropagationBudget {
            dropped: propagator.dropped(),
        });
    }
    report.propagated.sort();
}

/// Exported symbols of a file: the explicit marker's names when
/// present (second element `true`), otherwise every top-level
/// definition.
fn compute_exports(entities: &[Entity]) -> (Vec<String>, bool) {
    if let Some(marker) = entities
        .iter()
        .find(|e| e.kind == EntityKind::Variable && e.name == "__all__")
    {
        if !marker.uses.is_empty() {
            let mut names = marker.uses.clone();
            names.sort();
            names.dedup();
            return (names, true);
        }
    }
    let mut names: Vec<String> = entities
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EntityKind::Function | EntityKind::Class | EntityKind::Variable
            ) && !e.name.contains('.')
                && e.name != "__all__"
        })
        .map(|e| e.name.clone())
        .collect();
    names.sort();
    names.dedup();
    (names, false)
}

/// Register a file under its module path and every suffix variant
/// (`api/auth/service.py` → `service`, `auth.service`,
/// `api.auth.service`). First file wins on ambiguous suffixes.
fn index_module_path(
    index: &mut HashMap<String, String>,
    collisions: &mut HashSet<String>,
    file_path: &str,
) {
    let normalized = file_path.replace('\\', "/");
    let without_ext = match normalized.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => normalized.as_str(),
    };
    let module_path = without_ext.trim_start_matches("./").replace('/', ".");
    let module_path = module_path.trim_start_matches('.');
    if module_path.is_empty() {
        return;
    }
    let parts: Vec<&str> = module_path.split('.').collect();
    for i in 0..parts.len() {
        let suffix = parts[i..].join(".");
        match index.get(&suffix) {
            None => {
                index.insert(suffix, file_path.to_string());
            }
            Some(existing) if existing != file_path => {
                collisions.insert(suffix);
            }
            Some(_) => {}
        }
    }
}

/// Mutex-serialized engine handle for multi-threaded hosts: queries and
/// edits alternate, with edits draining the propagator before the lock
/// releases.
#[derive(Clone)]
pub struct SharedEngine(Arc<Mutex<Engine>>);

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self(Arc::new(Mutex::new(engine)))
    }

    pub fn process_change(
        &self,
        file_path: &str,
        new_text: Option<&str>,
        kind: ChangeKind,
    ) -> Result<ChangeReport, LatticeError> {
        self.0
            .lock()
            .map_err(|e| LatticeError::LockPoisoned(e.to_string()))?
            .process_change(file_path, new_text, kind)
    }

    pub fn query(&self, command: &str, args: &[String]) -> Result<serde_json::Value, LatticeError> {
        self.0
            .lock()
            .map_err(|e| LatticeError::LockPoisoned(e.to_string()))?
            .query(command, args)
    }

    pub fn shutdown(&self) -> Result<(), LatticeError> {
        self.0
            .lock()
            .map_err(|e| LatticeError::LockPoisoned(e.to_string()))?
            .shutdown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_exports_prefers_explicit_marker() {
        let mut all_var = test_entity(EntityKind::Variable, "__all__");
        all_var.uses = vec!["beta".to_string(), "alpha".to_string()];
        let entities = vec![
            all_var,
            test_entity(EntityKind::Function, "alpha"),
            test_entity(EntityKind::Function, "hidden"),
        ];
        let (names, explicit) = compute_exports(&entities);
        assert_eq!(names, vec!["alpha", "beta"]);
        assert!(explicit);
    }

    #[test]
    fn compute_exports_falls_back_to_top_level() {
        let entities = vec![
            test_entity(EntityKind::Function, "alpha"),
            test_entity(EntityKind::Function, "Svc.method"),
            test_entity(EntityKind::Class, "Svc"),
            test_entity(EntityKind::Import, "os"),
        ];
        let (names, explicit) = compute_exports(&entities);
        assert_eq!(names, vec!["Svc", "alpha"]);
        assert!(!explicit);
    }

    #[test]
    fn module_index_registers_suffix_variants() {
        let mut index = HashMap::new();
        let mut collisions = HashSet::new();
        index_module_path(&mut index, &mut collisions, "api/auth/service.py");

        assert_eq!(index["service"], "api/auth/service.py");
        assert_eq!(index["auth.service"], "api/auth/service.py");
        assert_eq!(index["api.auth.service"], "api/auth/service.py");
    }

    #[test]
    fn module_index_first_file_wins() {
        let mut index = HashMap::new();
        let mut collisions = HashSet::new();
        index_module_path(&mut index, &mut collisions, "a/service.py");
        index_module_path(&mut index, &mut collisions, "b/service.py");

        assert_eq!(index["service"], "a/service.py");
        assert!(collisions.contains("service"));
        assert_eq!(index["b.service"], "b/service.py");
    }

    fn test_entity(kind: EntityKind, name: &str) -> Entity {
        Entity {
            kind,
            name: name.to_string(),
            file_path: "m.py".to_string(),
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
            confidence: lattice_core::Confidence::High,
        }
    }
}
