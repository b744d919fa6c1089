//! Directory service: departments, divisions, users, and login.
//!
//! Validates names and affiliations before delegating to the directory and
//! user repositories. Department and division names are opaque strings; the
//! only check made on them is existence.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::logging;
use crate::models::*;
use crate::password::{check_password_policy, hash_password};
use crate::traits::{CreateUserRequest, DirectoryRepository, UpdateUserRequest, UserRepository};

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Directory service over injected repositories.
#[derive(Clone)]
pub struct DirectoryService {
    directory: Arc<dyn DirectoryRepository>,
    users: Arc<dyn UserRepository>,
}

impl DirectoryService {
    pub fn new(directory: Arc<dyn DirectoryRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { directory, users }
    }

    /// Verify credentials and return the user record.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::InvalidInput(
                "username and password are required".to_string(),
            ));
        }
        match self.users.authenticate(username.trim(), password).await {
            Ok(user) => {
                info!(
                    subsystem = logging::SUBSYSTEM_WORKFLOW,
                    component = logging::COMPONENT_AUTH,
                    op = "authenticate",
                    user_id = user.id,
                    "Login succeeded"
                );
                Ok(user)
            }
            Err(e) => {
                warn!(
                    subsystem = logging::SUBSYSTEM_WORKFLOW,
                    component = logging::COMPONENT_AUTH,
                    op = "authenticate",
                    error = %e,
                    "Login failed"
                );
                Err(e)
            }
        }
    }

    pub async fn departments(&self) -> Result<Vec<String>> {
        self.directory.list_departments().await
    }

    pub async fn create_department(&self, name: &str) -> Result<Department> {
        let name = required(name, "Department")?;
        let department = self.directory.create_department(&name).await?;
        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_DIRECTORY,
            op = "create_department",
            department = %department.name,
            "Department created"
        );
        Ok(department)
    }

    pub async fn divisions(&self, department: &str) -> Result<Vec<String>> {
        let department = required(department, "department")?;
        self.directory.list_divisions(&department).await
    }

    /// Create a division. The department must exist; names are unique per
    /// department.
    pub async fn create_division(&self, name: &str, department: &str) -> Result<Division> {
        let name = required(name, "Division")?;
        let department = required(department, "Department")?;
        self.ensure_department(&department).await?;

        let division = self.directory.create_division(&name, &department).await?;
        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_DIRECTORY,
            op = "create_division",
            department = %division.department,
            division = %division.name,
            "Division created"
        );
        Ok(division)
    }

    /// Resolve a user by id.
    pub async fn user(&self, id: i64) -> Result<User> {
        self.directory
            .get_user(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }

    pub async fn users(&self, department: Option<&str>) -> Result<Vec<User>> {
        let department = department.map(str::trim).filter(|d| !d.is_empty());
        self.users.list(department).await
    }

    pub async fn create_user(&self, mut req: CreateUserRequest) -> Result<User> {
        req.username = required(&req.username, "username")?;
        check_password_policy(&req.password)?;
        self.check_affiliation(req.department.as_deref(), req.division.as_deref())
            .await?;

        let hash = hash_password(&req.password)?;
        let user = self.users.insert(req, hash).await?;
        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_DIRECTORY,
            op = "create_user",
            user_id = user.id,
            role = %user.role,
            "User created"
        );
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, req: UpdateUserRequest) -> Result<User> {
        let existing = self.user(id).await?;
        let department = req.department.as_deref().or(existing.department.as_deref());
        if req.department.is_some() || req.division.is_some() {
            self.check_affiliation(department, req.division.as_deref())
                .await?;
        }

        let hash = match req.password.as_deref() {
            Some(password) => {
                check_password_policy(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };
        let user = self.users.update(id, req, hash).await?;
        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_DIRECTORY,
            op = "update_user",
            user_id = user.id,
            status = user.status.as_str(),
            "User updated"
        );
        Ok(user)
    }

    async fn ensure_department(&self, department: &str) -> Result<()> {
        if !self.directory.department_exists(department).await? {
            return Err(Error::InvalidInput(format!(
                "Unknown department: {}",
                department
            )));
        }
        Ok(())
    }

    async fn check_affiliation(&self, department: Option<&str>, division: Option<&str>) -> Result<()> {
        match (department, division) {
            (Some(dept), division) => {
                self.ensure_department(dept).await?;
                if let Some(div) = division {
                    let known = self.directory.list_divisions(dept).await?;
                    if !known.iter().any(|d| d.eq_ignore_ascii_case(div)) {
                        return Err(Error::InvalidInput(format!(
                            "Unknown division {} in {}",
                            div, dept
                        )));
                    }
                }
                Ok(())
            }
            (None, Some(_)) => Err(Error::InvalidInput(
                "a division requires a department".to_string(),
            )),
            (None, None) => Ok(()),
        }
    }
}
