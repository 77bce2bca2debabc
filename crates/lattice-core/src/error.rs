/// Unified error type for Lattice.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("Extraction error: {0}")]
    Extract(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Hook error: {0}")]
    Hook(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Engine is shut down")]
    EngineClosed,

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
