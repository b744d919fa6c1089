//! Core traits for docflow persistence.
//!
//! The workflow engine and directory service talk to storage only through
//! these traits, so PostgreSQL and in-memory backends are interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

/// Row values for a newly submitted document. Status is always Pending.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub doc_type: String,
    pub user_id: i64,
    pub priority: Priority,
    pub payload: Option<Vec<u8>>,
    pub description: Option<String>,
    /// Initial custodian, the owner's department
    pub department: Option<String>,
}

/// How a write treats the `comments` column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommentUpdate {
    #[default]
    Keep,
    /// Overwrite, `None` clears the column
    Replace(Option<String>),
}

/// Custody change recorded by a forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Custody {
    /// New custodian department
    pub department: String,
    pub forwarded_from: Option<String>,
    pub forwarded_by_admin: Option<String>,
}

/// A single status write.
///
/// Applied only while the stored status still equals `from`, and, when
/// `expected_version` is set, while the stored version matches.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub from: DocumentStatus,
    pub to: DocumentStatus,
    pub comments: CommentUpdate,
    pub updated_by: Option<String>,
    pub custody: Option<Custody>,
    pub expected_version: Option<i32>,
}

/// Listing filter after role scoping has been resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Matches custodian or forwarding department, case-insensitive
    pub department: Option<String>,
    pub status: Option<DocumentStatus>,
    /// Restrict to documents owned by this user
    pub owner_id: Option<i64>,
}

/// Filter for documents awaiting or past release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseQuery {
    /// Owner's department
    pub department: Option<String>,
    /// Owner's division
    pub division: Option<String>,
    pub owner_id: Option<i64>,
}

/// Repository for document persistence.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new Pending document and return the stored row.
    async fn insert(&self, doc: NewDocument) -> Result<Document>;

    /// Fetch a document by id.
    async fn fetch(&self, id: i64) -> Result<Option<Document>>;

    /// Apply a status write atomically.
    ///
    /// Returns `DocumentNotFound` if the row is gone and `Conflict` if the
    /// status or version guard no longer holds.
    async fn apply(&self, id: i64, change: DocumentChange) -> Result<Document>;

    /// Delete a document. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List documents, newest first.
    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>>;

    /// List Approved and Released documents by owner affiliation.
    async fn list_releases(&self, query: &ReleaseQuery) -> Result<Vec<Document>>;

    /// Archived forwarded documents whose `forwarded_from` is `department`.
    async fn list_responded(&self, department: &str) -> Result<Vec<Document>>;

    /// Per-status counts; `query.status` is ignored.
    async fn stats(&self, query: &DocumentQuery) -> Result<DocumentStats>;

    /// Documents created per month of `year`, as `(month, count)` pairs.
    async fn monthly_counts(&self, year: i32, query: &DocumentQuery) -> Result<Vec<(u32, i64)>>;
}

// =============================================================================
// DIRECTORY REPOSITORY
// =============================================================================

/// Repository for departments, divisions, and user lookup.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// All department names, alphabetically.
    async fn list_departments(&self) -> Result<Vec<String>>;

    /// Create a department. `Conflict` if the name exists.
    async fn create_department(&self, name: &str) -> Result<Department>;

    /// Whether a department with this name exists (case-insensitive).
    async fn department_exists(&self, name: &str) -> Result<bool>;

    /// Division names of a department, alphabetically.
    async fn list_divisions(&self, department: &str) -> Result<Vec<String>>;

    /// Create a division. `Conflict` if the department already has it.
    async fn create_division(&self, name: &str, department: &str) -> Result<Division>;

    /// Resolve a user by id.
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
}

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Request for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub sub_role: Option<SubRole>,
}

/// Request for updating a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub sub_role: Option<SubRole>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Repository for user accounts and credentials.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Verify credentials of an active user.
    ///
    /// Unknown users, inactive users, and wrong passwords all fail with the
    /// same `Unauthorized("Invalid credentials")`.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User>;

    /// List users, optionally restricted to a department.
    async fn list(&self, department: Option<&str>) -> Result<Vec<User>>;

    /// Insert a user with an already hashed password.
    async fn insert(&self, req: CreateUserRequest, password_hash: String) -> Result<User>;

    /// Update a user; `password_hash` replaces the stored hash when set.
    async fn update(
        &self,
        id: i64,
        req: UpdateUserRequest,
        password_hash: Option<String>,
    ) -> Result<User>;
}
