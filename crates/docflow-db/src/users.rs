//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use docflow_core::password::verify_password;
use docflow_core::{
    CreateUserRequest, Error, Result, UpdateUserRequest, User, UserRepository, UserStatus,
};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use crate::{conflict_on_duplicate, parse_column};

pub(crate) const USER_COLUMNS: &str =
    "user_id, username, full_name, role, department, division, status, sub_role";

pub(crate) fn row_to_user(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.get("user_id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        role: parse_column("role", row.get("role"))?,
        department: row.get("department"),
        division: row.get("division"),
        status: parse_column("status", row.get("status"))?,
        sub_role: row
            .get::<Option<&str>, _>("sub_role")
            .map(|s| parse_column("sub_role", s))
            .transpose()?,
    })
}

fn invalid_credentials() -> Error {
    Error::Unauthorized("Invalid credentials".to_string())
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1 AND status = $2"
        ))
        .bind(username)
        .bind(UserStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(invalid_credentials)?;

        let hash: String = row.get("password_hash");
        if !verify_password(password, &hash)? {
            return Err(invalid_credentials());
        }
        row_to_user(&row)
    }

    async fn list(&self, department: Option<&str>) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::TEXT IS NULL OR LOWER(department) = LOWER($1))
            ORDER BY username
            "#
        ))
        .bind(department)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(row_to_user).collect()
    }

    async fn insert(&self, req: CreateUserRequest, password_hash: String) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, password_hash, full_name, role, department, division, sub_role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&req.username)
        .bind(password_hash)
        .bind(req.full_name.as_deref())
        .bind(req.role.as_str())
        .bind(req.department.as_deref())
        .bind(req.division.as_deref())
        .bind(req.sub_role.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_duplicate(e, || {
                format!("Username '{}' is already taken", req.username)
            })
        })?;

        row_to_user(&row)
    }

    async fn update(
        &self,
        id: i64,
        req: UpdateUserRequest,
        password_hash: Option<String>,
    ) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                role = COALESCE($3, role),
                department = COALESCE($4, department),
                division = COALESCE($5, division),
                status = COALESCE($6, status),
                sub_role = COALESCE($7, sub_role),
                password_hash = COALESCE($8, password_hash)
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.full_name.as_deref())
        .bind(req.role.map(|r| r.as_str()))
        .bind(req.department.as_deref())
        .bind(req.division.as_deref())
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.sub_role.map(|s| s.as_str()))
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("User {}", id)))?;

        row_to_user(&row)
    }
}
