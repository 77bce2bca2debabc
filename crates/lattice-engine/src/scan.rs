//! Cold-start project scan.
//!
//! Walks the project root (honoring `.gitignore`), feeding supported
//! files through `process_change` until either the file-count or the
//! wall-clock ceiling is hit. Files not scanned stay outside the graph
//! until edited.

use crate::Engine;
use ignore::WalkBuilder;
use lattice_core::{ChangeKind, LatticeError};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Outcome of an initial scan.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    /// Supported files encountered.
    pub files_seen: usize,
    /// Files actually fed through the pipeline.
    pub files_indexed: usize,
    /// Files that failed to read.
    pub files_unreadable: usize,
    /// Whether a ceiling cut the scan short.
    pub truncated: bool,
}

impl Engine {
    /// Index a project directory, bounded by the configured file-count
    /// and wall-clock ceilings.
    pub fn scan_project(&mut self, root: &Path) -> Result<ScanReport, LatticeError> {
        let max_files = self.config().scan.max_files;
        let deadline = std::time::Duration::from_secs(self.config().scan.max_seconds);
        let started = Instant::now();
        let mut report = ScanReport::default();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("walk error: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.path();
            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            if !self.registry().supports(&relative) {
                continue;
            }
            report.files_seen += 1;

            if report.files_indexed >= max_files || started.elapsed() >= deadline {
                report.truncated = true;
                break;
            }

            let text = match std::fs::read_to_string(path) {
                Ok(t) => t,
                Err(err) => {
                    tracing::warn!("failed to read {}: {err}", path.display());
                    report.files_unreadable += 1;
                    continue;
                }
            };
            self.process_change(&relative, Some(&text), ChangeKind::Create)?;
            report.files_indexed += 1;
        }

        tracing::info!(
            "scanned {}: {} seen, {} indexed, truncated={}",
            root.display(),
            report.files_seen,
            report.files_indexed,
            report.truncated
        );
        Ok(report)
    }
}
