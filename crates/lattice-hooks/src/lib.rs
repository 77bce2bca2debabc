//! lattice-hooks: JSON payloads for the four host callbacks and their
//! mapping onto the engine API.
//!
//! The host assistant invokes the engine through post-edit, pre-read,
//! pre-explore, and session-stop hooks. Payloads arrive as JSON on
//! stdin; responses go back as JSON. The hook layer never fails a host
//! session: malformed payloads produce an error response, not a crash.

use lattice_core::{ChangeKind, ChangeReport, LatticeError};
use lattice_engine::Engine;
use serde::{Deserialize, Serialize};

/// Maximum file size accepted from a hook payload (1 MiB).
const MAX_CONTENT_SIZE: usize = 1024 * 1024;

/// A hook invocation from the host.
#[derive(Debug, Deserialize)]
#[serde(tag = "hook", rename_all = "snake_case")]
pub enum HookPayload {
    /// A file was edited, created, or deleted.
    PostEdit {
        file_path: String,
        /// Full new content; absent for deletions.
        content: Option<String>,
        #[serde(default)]
        change: Option<ChangeKind>,
    },
    /// The host is about to read a file and wants structural context.
    PreRead { file_path: String },
    /// The host is about to explore and wants an architecture sketch.
    PreExplore {
        #[serde(default)]
        focus: Option<String>,
    },
    /// The session is ending; flush state.
    SessionStop,
}

/// What a hook invocation returned to the host.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HookResponse {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        report: Option<ChangeReport>,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
    },
    Error {
        message: String,
    },
}

impl HookResponse {
    fn ok() -> Self {
        Self::Ok {
            report: None,
            context: None,
        }
    }

    fn with_report(report: ChangeReport) -> Self {
        Self::Ok {
            report: Some(report),
            context: None,
        }
    }

    fn with_context(context: serde_json::Value) -> Self {
        Self::Ok {
            report: None,
            context: Some(context),
        }
    }
}

/// Parse a hook payload from its JSON string.
pub fn parse_payload(json: &str) -> Result<HookPayload, LatticeError> {
    serde_json::from_str(json).map_err(|e| LatticeError::Hook(format!("bad payload: {e}")))
}

/// Dispatch one hook invocation against the engine.
pub fn dispatch(engine: &mut Engine, payload: HookPayload) -> HookResponse {
    match payload {
        HookPayload::PostEdit {
            file_path,
            content,
            change,
        } => {
            if content.as_ref().is_some_and(|c| c.len() > MAX_CONTENT_SIZE) {
                tracing::debug!("skipping oversized hook content for {file_path}");
                return HookResponse::ok();
            }
            let kind = change.unwrap_or(match content {
                Some(_) => ChangeKind::Edit,
                None => ChangeKind::Delete,
            });
            match engine.process_change(&file_path, content.as_deref(), kind) {
                Ok(report) => HookResponse::with_report(report),
                Err(err) => HookResponse::Error {
                    message: err.to_string(),
                },
            }
        }
        HookPayload::PreRead { file_path } => match read_context(engine, &file_path) {
            Ok(context) => HookResponse::with_context(context),
            Err(err) => HookResponse::Error {
                message: err.to_string(),
            },
        },
        HookPayload::PreExplore { focus } => {
            let command = match &focus {
                Some(name) => ("entity", vec![name.clone()]),
                None => ("summary", vec![]),
            };
            match engine.query(command.0, &command.1) {
                Ok(context) => HookResponse::with_context(context),
                Err(err) => HookResponse::Error {
                    message: err.to_string(),
                },
            }
        }
        HookPayload::SessionStop => {
            engine.shutdown();
            HookResponse::ok()
        }
    }
}

/// Compact structural context for one file: its entities, dependencies,
/// and dependents.
fn read_context(engine: &Engine, file_path: &str) -> Result<serde_json::Value, LatticeError> {
    let entities = engine.query("file", &[file_path.to_string()])?;
    let deps = engine.query("deps", &[file_path.to_string()])?;
    let rdeps = engine.query("rdeps", &[file_path.to_string()])?;
    Ok(serde_json::json!({
        "file_path": file_path,
        "entities": entities,
        "deps": deps,
        "rdeps": rdeps,
    }))
}
