//! # docflow-core
//!
//! Core types, traits, and the document workflow engine for docflow.
//!
//! Storage backends implement the repository traits in [`traits`]; the
//! [`WorkflowEngine`] and [`DirectoryService`] hold the business rules and
//! never touch SQL directly.

pub mod directory;
pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod password;
pub mod state_machine;
pub mod traits;
pub mod workflow;

// Re-export commonly used types at crate root
pub use directory::DirectoryService;
pub use error::{Error, Result};
pub use models::*;
pub use state_machine::{check_transition, is_valid_transition, valid_transitions};
pub use traits::*;
pub use workflow::{
    CreateDocumentRequest, ForwardRequest, RespondRequest, Scope, StatusUpdate, WorkflowEngine,
};
