//! PostgreSQL implementation of DirectoryRepository.

use async_trait::async_trait;
use docflow_core::{Department, DirectoryRepository, Division, Error, Result, User};
use sqlx::{Pool, Postgres, Row};

use crate::conflict_on_duplicate;
use crate::users::{row_to_user, USER_COLUMNS};

#[derive(Clone)]
pub struct PgDirectoryRepository {
    pool: Pool<Postgres>,
}

impl PgDirectoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Resolve a department name case-insensitively to its id and stored name.
    async fn find_department(&self, name: &str) -> Result<Option<(i64, String)>> {
        let row = sqlx::query(
            "SELECT department_id, name FROM department WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| (r.get("department_id"), r.get("name"))))
    }
}

#[async_trait]
impl DirectoryRepository for PgDirectoryRepository {
    async fn list_departments(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM department ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn create_department(&self, name: &str) -> Result<Department> {
        let row = sqlx::query(
            "INSERT INTO department (name) VALUES ($1) RETURNING department_id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, || format!("Department '{}' already exists", name)))?;

        Ok(Department {
            id: row.get("department_id"),
            name: row.get("name"),
        })
    }

    async fn department_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_department(name).await?.is_some())
    }

    async fn list_divisions(&self, department: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT v.name FROM division v
            JOIN department d ON d.department_id = v.department_id
            WHERE LOWER(d.name) = LOWER($1)
            ORDER BY v.name
            "#,
        )
        .bind(department)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn create_division(&self, name: &str, department: &str) -> Result<Division> {
        let (department_id, department_name) = self
            .find_department(department)
            .await?
            .ok_or_else(|| Error::InvalidInput(format!("Unknown department: {}", department)))?;

        let row = sqlx::query(
            "INSERT INTO division (department_id, name) VALUES ($1, $2) RETURNING division_id, name",
        )
        .bind(department_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_duplicate(e, || {
                format!("Division '{}' already exists in {}", name, department_name)
            })
        })?;

        Ok(Division {
            id: row.get("division_id"),
            name: row.get("name"),
            department: department_name,
        })
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(row_to_user).transpose()
    }
}
