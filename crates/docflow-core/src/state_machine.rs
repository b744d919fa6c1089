//! Document status transition table.
//!
//! Every status write consults this table before touching storage.
//!
//! ```text
//! Pending  -> Approved | Revision | Received | Archived
//! Approved -> Released | Received | Archived
//! Revision -> Pending  | Received | Archived
//! Released -> Received | Archived
//! Received -> Received | Archived
//! Archived -> (terminal)
//! ```

use crate::error::{Error, Result};
use crate::models::DocumentStatus;

/// Statuses reachable from `from` in a single write.
pub fn valid_transitions(from: DocumentStatus) -> &'static [DocumentStatus] {
    use DocumentStatus::*;

    match from {
        Pending => &[Approved, Revision, Received, Archived],
        Approved => &[Released, Received, Archived],
        Revision => &[Pending, Received, Archived],
        Released => &[Received, Archived],
        // Re-forwarding moves custody to another department.
        Received => &[Received, Archived],
        Archived => &[],
    }
}

/// Whether the table allows `from -> to`.
pub fn is_valid_transition(from: DocumentStatus, to: DocumentStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Fail with `InvalidTransition` unless the table allows `from -> to`.
pub fn check_transition(from: DocumentStatus, to: DocumentStatus) -> Result<()> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition { from, to })
    }
}
