//! dsync core library
//!
//! Design token synchronization: token model and resolution, diffing,
//! semantic versioning, component bindings, validation of builder trees
//! and the sync orchestrator that ties them together.

pub mod binding;
pub mod config;
pub mod design;
pub mod diff;
pub mod error;
pub mod node;
pub mod sync;
pub mod tokens;
pub mod validation;
pub mod versioning;

pub use error::{DsyncError, DsyncResult};
pub use sync::SyncOrchestrator;
