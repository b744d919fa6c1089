//! PostgreSQL implementation of DocumentRepository.

use async_trait::async_trait;
use docflow_core::{
    CommentUpdate, Document, DocumentChange, DocumentQuery, DocumentRepository, DocumentStats,
    DocumentStatus, Error, NewDocument, ReleaseQuery, Result,
};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use crate::parse_column;

const DOCUMENT_COLUMNS: &str = "document_id, doc_type, user_id, priority, status, payload, \
     description, department, forwarded_from, forwarded_by_admin, is_forwarded_request, \
     comments, created_at, updated_at, updated_by, version";

/// Role scope over `$1` department, `$2` status, `$3` owner.
const SCOPE_FILTER: &str = "($1::TEXT IS NULL \
         OR LOWER(department) = LOWER($1) \
         OR LOWER(forwarded_from) = LOWER($1)) \
     AND ($2::TEXT IS NULL OR status = $2) \
     AND ($3::BIGINT IS NULL OR user_id = $3)";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, document_id DESC";

#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_document(row: &PgRow) -> Result<Document> {
        Ok(Document {
            id: row.get("document_id"),
            doc_type: row.get("doc_type"),
            user_id: row.get("user_id"),
            priority: parse_column("priority", row.get("priority"))?,
            status: parse_column("status", row.get("status"))?,
            payload: row.get("payload"),
            description: row.get("description"),
            department: row.get("department"),
            forwarded_from: row.get("forwarded_from"),
            forwarded_by_admin: row.get("forwarded_by_admin"),
            is_forwarded_request: row.get("is_forwarded_request"),
            comments: row.get("comments"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            updated_by: row.get("updated_by"),
            version: row.get("version"),
        })
    }

    fn rows_to_documents(rows: Vec<PgRow>) -> Result<Vec<Document>> {
        rows.iter().map(Self::row_to_document).collect()
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, doc: NewDocument) -> Result<Document> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO document (doc_type, user_id, priority, status, payload, description, department)
            VALUES ($1, $2, $3, 'Pending', $4, $5, $6)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(&doc.doc_type)
        .bind(doc.user_id)
        .bind(doc.priority.as_str())
        .bind(doc.payload.as_deref())
        .bind(doc.description.as_deref())
        .bind(doc.department.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::row_to_document(&row)
    }

    async fn fetch(&self, id: i64) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM document WHERE document_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn apply(&self, id: i64, change: DocumentChange) -> Result<Document> {
        let (replace_comments, comments) = match change.comments {
            CommentUpdate::Keep => (false, None),
            CommentUpdate::Replace(comments) => (true, comments),
        };
        let (custody, department, forwarded_from, forwarded_by_admin) = match change.custody {
            Some(c) => (true, Some(c.department), c.forwarded_from, c.forwarded_by_admin),
            None => (false, None, None, None),
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE document SET
                status = $2,
                comments = CASE WHEN $3 THEN $4 ELSE comments END,
                department = CASE WHEN $5 THEN $6 ELSE department END,
                forwarded_from = CASE WHEN $5 THEN $7 ELSE forwarded_from END,
                forwarded_by_admin = CASE WHEN $5 THEN $8 ELSE forwarded_by_admin END,
                is_forwarded_request = is_forwarded_request OR $5,
                updated_by = $9,
                updated_at = NOW(),
                version = version + 1
            WHERE document_id = $1
              AND status = $10
              AND ($11::INTEGER IS NULL OR version = $11)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(change.to.as_str())
        .bind(replace_comments)
        .bind(comments)
        .bind(custody)
        .bind(department)
        .bind(forwarded_from)
        .bind(forwarded_by_admin)
        .bind(change.updated_by)
        .bind(change.from.as_str())
        .bind(change.expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Self::row_to_document(&row),
            // Guard failed: tell a vanished row apart from a lost race
            None => match self.fetch(id).await? {
                None => Err(Error::DocumentNotFound(id)),
                Some(current) => Err(Error::Conflict(format!(
                    "Document {} is {} at version {}; expected {}{}",
                    id,
                    current.status,
                    current.version,
                    change.from,
                    change
                        .expected_version
                        .map(|v| format!(" at version {}", v))
                        .unwrap_or_default()
                ))),
            },
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM document WHERE document_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM document WHERE {SCOPE_FILTER} {NEWEST_FIRST}"
        ))
        .bind(query.department.as_deref())
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::rows_to_documents(rows)
    }

    async fn list_releases(&self, query: &ReleaseQuery) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM document
            WHERE status IN ('Approved', 'Released')
              AND ($3::BIGINT IS NULL OR user_id = $3)
              AND user_id IN (
                  SELECT user_id FROM users
                  WHERE ($1::TEXT IS NULL OR LOWER(department) = LOWER($1))
                    AND ($2::TEXT IS NULL OR LOWER(division) = LOWER($2))
              )
            {NEWEST_FIRST}
            "#
        ))
        .bind(query.department.as_deref())
        .bind(query.division.as_deref())
        .bind(query.owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::rows_to_documents(rows)
    }

    async fn list_responded(&self, department: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM document
            WHERE status = 'Archived'
              AND is_forwarded_request
              AND LOWER(forwarded_from) = LOWER($1)
            {NEWEST_FIRST}
            "#
        ))
        .bind(department)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::rows_to_documents(rows)
    }

    async fn stats(&self, query: &DocumentQuery) -> Result<DocumentStats> {
        let rows = sqlx::query(&format!(
            "SELECT status, COUNT(*) AS count FROM document WHERE {SCOPE_FILTER} GROUP BY status"
        ))
        .bind(query.department.as_deref())
        .bind(None::<&str>)
        .bind(query.owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut stats = DocumentStats::default();
        for row in rows {
            let status: DocumentStatus = parse_column("status", row.get("status"))?;
            stats.record(status, row.get("count"));
        }
        Ok(stats)
    }

    async fn monthly_counts(&self, year: i32, query: &DocumentQuery) -> Result<Vec<(u32, i64)>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::INTEGER AS month,
                   COUNT(*) AS count
            FROM document
            WHERE {SCOPE_FILTER}
              AND EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INTEGER = $4
            GROUP BY 1
            ORDER BY 1
            "#
        ))
        .bind(query.department.as_deref())
        .bind(None::<&str>)
        .bind(query.owner_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let month: i32 = row.get("month");
                (month as u32, row.get::<i64, _>("count"))
            })
            .collect())
    }
}
