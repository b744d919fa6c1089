//! In-memory repositories for deterministic testing.
//!
//! `MemoryStore` implements every repository trait over a single mutex, with
//! the same matching rules as the PostgreSQL queries (case-insensitive
//! department names, newest-first ordering, status/version guarded writes).
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use docflow_core::memory::MemoryStore;
//! use docflow_core::{UserRole, WorkflowEngine};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.seed_department("HR");
//! let owner = store.seed_user("jdoe", "secret-pass", UserRole::Employee, Some("HR"));
//! let engine = WorkflowEngine::new(store.clone(), store.clone());
//! # let _ = (owner, engine);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Datelike, Utc};

use crate::error::{Error, Result};
use crate::models::*;
use crate::password::{hash_password, verify_password};
use crate::traits::*;

fn same_name(stored: Option<&str>, wanted: &str) -> bool {
    stored.is_some_and(|s| s.eq_ignore_ascii_case(wanted))
}

#[derive(Default)]
struct State {
    documents: BTreeMap<i64, Document>,
    departments: Vec<Department>,
    divisions: Vec<Division>,
    /// User plus stored password hash
    users: BTreeMap<i64, (User, String)>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn matches(doc: &Document, query: &DocumentQuery) -> bool {
        if let Some(dept) = &query.department {
            if !same_name(doc.department.as_deref(), dept)
                && !same_name(doc.forwarded_from.as_deref(), dept)
            {
                return false;
            }
        }
        if let Some(status) = query.status {
            if doc.status != status {
                return false;
            }
        }
        if let Some(owner) = query.owner_id {
            if doc.user_id != owner {
                return false;
            }
        }
        true
    }

    fn newest_first(mut docs: Vec<Document>) -> Vec<Document> {
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        docs
    }
}

/// Shared in-memory document store, directory, and user table.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a department without validation.
    pub fn seed_department(&self, name: &str) -> Department {
        let mut state = self.lock();
        let department = Department {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.departments.push(department.clone());
        department
    }

    /// Add a division without validation.
    pub fn seed_division(&self, name: &str, department: &str) -> Division {
        let mut state = self.lock();
        let division = Division {
            id: state.next_id(),
            name: name.to_string(),
            department: department.to_string(),
        };
        state.divisions.push(division.clone());
        division
    }

    /// Add an active user with a freshly hashed password.
    pub fn seed_user(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
        department: Option<&str>,
    ) -> User {
        let hash = hash_password(password).unwrap_or_default();
        let mut state = self.lock();
        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            full_name: None,
            role,
            department: department.map(str::to_string),
            division: None,
            status: UserStatus::Active,
            sub_role: None,
        };
        state.users.insert(user.id, (user.clone(), hash));
        user
    }

    /// Replace a seeded user's record (keeps the password hash).
    pub fn put_user(&self, user: User) {
        let mut state = self.lock();
        let hash = state
            .users
            .get(&user.id)
            .map(|(_, h)| h.clone())
            .unwrap_or_default();
        state.users.insert(user.id, (user, hash));
    }

    /// Overwrite a stored document, bypassing the workflow rules.
    pub fn put_document(&self, doc: Document) {
        self.lock().documents.insert(doc.id, doc);
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn insert(&self, new: NewDocument) -> Result<Document> {
        let mut state = self.lock();
        let now = Utc::now();
        let doc = Document {
            id: state.next_id(),
            doc_type: new.doc_type,
            user_id: new.user_id,
            priority: new.priority,
            status: DocumentStatus::Pending,
            payload: new.payload,
            description: new.description,
            department: new.department,
            forwarded_from: None,
            forwarded_by_admin: None,
            is_forwarded_request: false,
            comments: None,
            created_at: now,
            updated_at: now,
            updated_by: None,
            version: 1,
        };
        state.documents.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn fetch(&self, id: i64) -> Result<Option<Document>> {
        Ok(self.lock().documents.get(&id).cloned())
    }

    async fn apply(&self, id: i64, change: DocumentChange) -> Result<Document> {
        let mut state = self.lock();
        let doc = state
            .documents
            .get_mut(&id)
            .ok_or(Error::DocumentNotFound(id))?;

        if doc.status != change.from {
            return Err(Error::Conflict(format!(
                "Document {} was modified concurrently",
                id
            )));
        }
        if let Some(expected) = change.expected_version {
            if doc.version != expected {
                return Err(Error::Conflict(format!(
                    "Document {} is at version {}, expected {}",
                    id, doc.version, expected
                )));
            }
        }

        doc.status = change.to;
        if let CommentUpdate::Replace(comments) = change.comments {
            doc.comments = comments;
        }
        if let Some(custody) = change.custody {
            doc.department = Some(custody.department);
            doc.forwarded_from = custody.forwarded_from;
            doc.forwarded_by_admin = custody.forwarded_by_admin;
            doc.is_forwarded_request = true;
        }
        doc.updated_by = change.updated_by;
        doc.updated_at = Utc::now();
        doc.version += 1;
        Ok(doc.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.lock().documents.remove(&id).is_some())
    }

    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
        let state = self.lock();
        let docs = state
            .documents
            .values()
            .filter(|d| State::matches(d, query))
            .cloned()
            .collect();
        Ok(State::newest_first(docs))
    }

    async fn list_releases(&self, query: &ReleaseQuery) -> Result<Vec<Document>> {
        let state = self.lock();
        let docs = state
            .documents
            .values()
            .filter(|d| matches!(d.status, DocumentStatus::Approved | DocumentStatus::Released))
            .filter(|d| query.owner_id.map_or(true, |owner| d.user_id == owner))
            .filter(|d| {
                let owner = state.users.get(&d.user_id).map(|(u, _)| u);
                let dept_ok = query.department.as_deref().map_or(true, |dept| {
                    owner.is_some_and(|u| same_name(u.department.as_deref(), dept))
                });
                let div_ok = query.division.as_deref().map_or(true, |div| {
                    owner.is_some_and(|u| same_name(u.division.as_deref(), div))
                });
                dept_ok && div_ok
            })
            .cloned()
            .collect();
        Ok(State::newest_first(docs))
    }

    async fn list_responded(&self, department: &str) -> Result<Vec<Document>> {
        let state = self.lock();
        let docs = state
            .documents
            .values()
            .filter(|d| {
                d.status == DocumentStatus::Archived
                    && d.is_forwarded_request
                    && same_name(d.forwarded_from.as_deref(), department)
            })
            .cloned()
            .collect();
        Ok(State::newest_first(docs))
    }

    async fn stats(&self, query: &DocumentQuery) -> Result<DocumentStats> {
        let state = self.lock();
        let query = DocumentQuery {
            status: None,
            ..query.clone()
        };
        let mut stats = DocumentStats::default();
        for doc in state.documents.values().filter(|d| State::matches(d, &query)) {
            stats.record(doc.status, 1);
        }
        Ok(stats)
    }

    async fn monthly_counts(&self, year: i32, query: &DocumentQuery) -> Result<Vec<(u32, i64)>> {
        let state = self.lock();
        let query = DocumentQuery {
            status: None,
            ..query.clone()
        };
        let mut counts: BTreeMap<u32, i64> = BTreeMap::new();
        for doc in state
            .documents
            .values()
            .filter(|d| d.created_at.year() == year && State::matches(d, &query))
        {
            *counts.entry(doc.created_at.month()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl DirectoryRepository for MemoryStore {
    async fn list_departments(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .lock()
            .departments
            .iter()
            .map(|d| d.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_department(&self, name: &str) -> Result<Department> {
        let mut state = self.lock();
        if state
            .departments
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(name))
        {
            return Err(Error::Conflict(format!(
                "Department '{}' already exists",
                name
            )));
        }
        let department = Department {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.departments.push(department.clone());
        Ok(department)
    }

    async fn department_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .lock()
            .departments
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(name)))
    }

    async fn list_divisions(&self, department: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .lock()
            .divisions
            .iter()
            .filter(|d| d.department.eq_ignore_ascii_case(department))
            .map(|d| d.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_division(&self, name: &str, department: &str) -> Result<Division> {
        let mut state = self.lock();
        let Some(dept) = state
            .departments
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(department))
            .map(|d| d.name.clone())
        else {
            return Err(Error::InvalidInput(format!(
                "Unknown department: {}",
                department
            )));
        };
        if state.divisions.iter().any(|d| {
            d.department.eq_ignore_ascii_case(&dept) && d.name.eq_ignore_ascii_case(name)
        }) {
            return Err(Error::Conflict(format!(
                "Division '{}' already exists in {}",
                name, dept
            )));
        }
        let division = Division {
            id: state.next_id(),
            name: name.to_string(),
            department: dept,
        };
        state.divisions.push(division.clone());
        Ok(division)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).map(|(u, _)| u.clone()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let candidate = self
            .lock()
            .users
            .values()
            .find(|(u, _)| u.username == username && u.is_active())
            .cloned();
        let Some((user, hash)) = candidate else {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        };
        if verify_password(password, &hash)? {
            Ok(user)
        } else {
            Err(Error::Unauthorized("Invalid credentials".to_string()))
        }
    }

    async fn list(&self, department: Option<&str>) -> Result<Vec<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .filter(|(u, _)| department.map_or(true, |d| same_name(u.department.as_deref(), d)))
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn insert(&self, req: CreateUserRequest, password_hash: String) -> Result<User> {
        let mut state = self.lock();
        if state.users.values().any(|(u, _)| u.username == req.username) {
            return Err(Error::Conflict(format!(
                "Username '{}' is already taken",
                req.username
            )));
        }
        let user = User {
            id: state.next_id(),
            username: req.username,
            full_name: req.full_name,
            role: req.role,
            department: req.department,
            division: req.division,
            status: UserStatus::Active,
            sub_role: req.sub_role,
        };
        state.users.insert(user.id, (user.clone(), password_hash));
        Ok(user)
    }

    async fn update(
        &self,
        id: i64,
        req: UpdateUserRequest,
        password_hash: Option<String>,
    ) -> Result<User> {
        let mut state = self.lock();
        let (user, hash) = state
            .users
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))?;
        if let Some(full_name) = req.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        if let Some(department) = req.department {
            user.department = Some(department);
        }
        if let Some(division) = req.division {
            user.division = Some(division);
        }
        if let Some(status) = req.status {
            user.status = status;
        }
        if let Some(sub_role) = req.sub_role {
            user.sub_role = Some(sub_role);
        }
        if let Some(new_hash) = password_hash {
            *hash = new_hash;
        }
        Ok(user.clone())
    }
}
