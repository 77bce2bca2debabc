//! lattice-core: Shared types, errors, and configuration for the Lattice
//! code-graph engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
