//! HTTP handlers for docflow-api.

pub mod auth;
pub mod directory;
pub mod documents;
pub mod stats;
pub mod users;
pub mod workflow;

use docflow_core::{DocumentStatus, Scope, UserRole};

use crate::ApiError;

/// Build a listing scope from raw query values. Role names are matched
/// case-insensitively.
pub(crate) fn parse_scope(
    user_id: Option<i64>,
    role: Option<&str>,
    department: Option<String>,
) -> Result<Scope, ApiError> {
    let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => Some(r.parse::<UserRole>().map_err(ApiError::BadRequest)?),
        None => None,
    };
    Ok(Scope {
        user_id,
        role,
        department,
    })
}

/// Parse an optional status filter from a query string, any casing.
pub(crate) fn parse_status(status: Option<&str>) -> Result<Option<DocumentStatus>, ApiError> {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map(Some).map_err(ApiError::BadRequest),
        None => Ok(None),
    }
}
