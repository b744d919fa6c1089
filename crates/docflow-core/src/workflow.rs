//! Document workflow engine.
//!
//! Owns the lifecycle rules: which status writes are legal, what provenance a
//! forward records, how a response archives a document, and how listings are
//! scoped by role. Storage is reached only through the repository traits.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::logging;
use crate::models::*;
use crate::state_machine::check_transition;
use crate::traits::{
    CommentUpdate, Custody, DirectoryRepository, DocumentChange, DocumentQuery,
    DocumentRepository, NewDocument, ReleaseQuery,
};

/// Request for submitting a document.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub doc_type: String,
    pub user_id: i64,
    pub priority: Priority,
    pub payload: Option<Vec<u8>>,
    pub description: Option<String>,
}

/// Request for a plain status write.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    /// New status; `None` keeps the current one and only touches comments
    pub status: Option<DocumentStatus>,
    /// Replaces the stored comments when set
    pub comments: Option<String>,
    /// Name of the admin performing the write
    pub actor: Option<String>,
    /// Reject the write unless the stored version matches
    pub expected_version: Option<i32>,
}

/// Request for forwarding a document into another department's custody.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub document_id: i64,
    pub target_department: String,
    pub notes: Option<String>,
    pub forwarder_department: Option<String>,
    pub forwarder_name: Option<String>,
}

/// Request for answering a forwarded document.
#[derive(Debug, Clone)]
pub struct RespondRequest {
    pub document_id: i64,
    pub responder_department: Option<String>,
    pub responder_name: Option<String>,
    pub message: String,
}

/// Caller identity used to scope listings and statistics.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub user_id: Option<i64>,
    pub role: Option<UserRole>,
    pub department: Option<String>,
}

/// Trim and drop empty strings.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Workflow engine over injected repositories.
#[derive(Clone)]
pub struct WorkflowEngine {
    documents: Arc<dyn DocumentRepository>,
    directory: Arc<dyn DirectoryRepository>,
}

impl WorkflowEngine {
    /// Create an engine over the given document store and directory.
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        directory: Arc<dyn DirectoryRepository>,
    ) -> Self {
        Self {
            documents,
            directory,
        }
    }

    /// Submit a new document. The owner's department takes first custody.
    pub async fn create(&self, req: CreateDocumentRequest) -> Result<Document> {
        let doc_type = req.doc_type.trim().to_string();
        if doc_type.is_empty() {
            return Err(Error::InvalidInput("Type is required".to_string()));
        }

        let owner = self
            .directory
            .get_user(req.user_id)
            .await?
            .ok_or_else(|| Error::InvalidInput(format!("User {} does not exist", req.user_id)))?;

        let doc = self
            .documents
            .insert(NewDocument {
                doc_type,
                user_id: owner.id,
                priority: req.priority,
                payload: req.payload,
                description: non_blank(req.description),
                department: owner.department.clone(),
            })
            .await?;

        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_ENGINE,
            op = "create",
            document_id = doc.id,
            user_id = owner.id,
            department = doc.department.as_deref().unwrap_or(""),
            "Document submitted"
        );
        Ok(doc)
    }

    /// Fetch a document or fail with `DocumentNotFound`.
    pub async fn get(&self, id: i64) -> Result<Document> {
        self.documents
            .fetch(id)
            .await?
            .ok_or(Error::DocumentNotFound(id))
    }

    /// Change status and/or comments, subject to the transition table.
    ///
    /// Entering Received is reserved for [`WorkflowEngine::forward`], which
    /// records the custody change.
    pub async fn update_status(&self, id: i64, update: StatusUpdate) -> Result<Document> {
        let current = self.get(id).await?;
        let to = update.status.unwrap_or(current.status);

        if to != current.status {
            if to == DocumentStatus::Received {
                return Err(Error::InvalidInput(
                    "documents enter Received only by being forwarded".to_string(),
                ));
            }
            self.guard(&current, to, "update_status")?;
        } else if update.comments.is_none() {
            debug!(
                subsystem = logging::SUBSYSTEM_WORKFLOW,
                component = logging::COMPONENT_ENGINE,
                op = "update_status",
                document_id = id,
                "Nothing to update"
            );
            return Ok(current);
        }

        let updated = self
            .documents
            .apply(
                id,
                DocumentChange {
                    from: current.status,
                    to,
                    comments: match update.comments {
                        Some(c) => CommentUpdate::Replace(Some(c)),
                        None => CommentUpdate::Keep,
                    },
                    updated_by: non_blank(update.actor),
                    custody: None,
                    expected_version: update.expected_version,
                },
            )
            .await?;

        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_ENGINE,
            op = "update_status",
            document_id = id,
            from_status = %current.status,
            to_status = %updated.status,
            actor = updated.updated_by.as_deref().unwrap_or(""),
            "Document status updated"
        );
        Ok(updated)
    }

    /// Forward a document to another department.
    ///
    /// `forwarded_from` records the department that held custody before the
    /// forward; the forwarder's own department is used only when the
    /// document had no custodian.
    pub async fn forward(&self, req: ForwardRequest) -> Result<Document> {
        let current = self.get(req.document_id).await?;

        let target = req.target_department.trim().to_string();
        if target.is_empty() {
            return Err(Error::InvalidInput(
                "targetDepartment is required".to_string(),
            ));
        }
        if !self.directory.department_exists(&target).await? {
            return Err(Error::InvalidInput(format!(
                "Unknown department: {}",
                target
            )));
        }

        self.guard(&current, DocumentStatus::Received, "forward")?;

        let forwarder_name = non_blank(req.forwarder_name);
        let forwarded_from = non_blank(current.department.clone())
            .or_else(|| non_blank(req.forwarder_department));

        let updated = self
            .documents
            .apply(
                current.id,
                DocumentChange {
                    from: current.status,
                    to: DocumentStatus::Received,
                    comments: CommentUpdate::Replace(non_blank(req.notes)),
                    updated_by: forwarder_name.clone(),
                    custody: Some(Custody {
                        department: target.clone(),
                        forwarded_from,
                        forwarded_by_admin: forwarder_name,
                    }),
                    expected_version: None,
                },
            )
            .await?;

        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_ENGINE,
            op = "forward",
            document_id = updated.id,
            from_status = %current.status,
            department = %target,
            forwarded_from = updated.forwarded_from.as_deref().unwrap_or(""),
            "Document forwarded"
        );
        Ok(updated)
    }

    /// Answer a forwarded document, archiving it.
    ///
    /// Only the latest response survives: it lives in `comments`, so answering
    /// an already answered document replaces the earlier message and leaves
    /// the status Archived.
    pub async fn respond(&self, req: RespondRequest) -> Result<DocumentResponse> {
        let message = req.message.trim().to_string();
        if message.is_empty() {
            return Err(Error::InvalidInput("message is required".to_string()));
        }

        let current = self.get(req.document_id).await?;
        let answerable = match current.status {
            DocumentStatus::Received => true,
            DocumentStatus::Archived => current.is_forwarded_request,
            _ => false,
        };
        if !answerable {
            warn!(
                subsystem = logging::SUBSYSTEM_WORKFLOW,
                component = logging::COMPONENT_ENGINE,
                op = "respond",
                document_id = current.id,
                from_status = %current.status,
                "Response rejected: document was not forwarded"
            );
            return Err(Error::Conflict(format!(
                "Document {} is {}; only forwarded documents can be answered",
                current.id, current.status
            )));
        }

        let responder_name = non_blank(req.responder_name);
        let updated = self
            .documents
            .apply(
                current.id,
                DocumentChange {
                    from: current.status,
                    to: DocumentStatus::Archived,
                    comments: CommentUpdate::Replace(Some(message.clone())),
                    updated_by: responder_name.clone(),
                    custody: None,
                    expected_version: None,
                },
            )
            .await?;

        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_ENGINE,
            op = "respond",
            document_id = updated.id,
            from_status = %current.status,
            "Document answered and archived"
        );

        Ok(DocumentResponse {
            document_id: updated.id,
            responder_department: non_blank(req.responder_department)
                .or_else(|| updated.department.clone()),
            responder_name,
            message,
            response_date: Utc::now(),
        })
    }

    /// Archive a document. Archiving an archived document is a no-op.
    pub async fn archive(&self, id: i64, actor: Option<String>) -> Result<Document> {
        let current = self.get(id).await?;
        if current.status == DocumentStatus::Archived {
            return Ok(current);
        }
        self.transition(current, DocumentStatus::Archived, None, actor, "archive")
            .await
    }

    /// Release an approved document.
    pub async fn release(&self, id: i64, actor: Option<String>) -> Result<Document> {
        let current = self.get(id).await?;
        self.transition(current, DocumentStatus::Released, None, actor, "release")
            .await
    }

    /// Resubmit a document that was sent back for revision.
    pub async fn resubmit(&self, id: i64, comments: Option<String>) -> Result<Document> {
        let current = self.get(id).await?;
        self.transition(current, DocumentStatus::Pending, comments, None, "resubmit")
            .await
    }

    /// Delete a document.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.documents.delete(id).await? {
            return Err(Error::DocumentNotFound(id));
        }
        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_ENGINE,
            op = "delete",
            document_id = id,
            "Document deleted"
        );
        Ok(())
    }

    /// List documents by department and status, scoped by role.
    pub async fn list(&self, scope: Scope, status: Option<DocumentStatus>) -> Result<Vec<Document>> {
        let start = Instant::now();
        let mut query = self.resolve_scope(scope)?;
        query.status = status;

        let docs = self.documents.list(&query).await?;
        debug!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_ENGINE,
            op = "list",
            department = query.department.as_deref().unwrap_or("*"),
            result_count = docs.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed documents"
        );
        Ok(docs)
    }

    /// Approved and Released documents for a releaser's department/division.
    pub async fn list_releases(&self, query: ReleaseQuery) -> Result<Vec<Document>> {
        let query = ReleaseQuery {
            department: non_blank(query.department),
            division: non_blank(query.division),
            owner_id: query.owner_id,
        };
        self.documents.list_releases(&query).await
    }

    /// Latest responses received by a forwarding department.
    pub async fn list_responses(&self, department: &str) -> Result<Vec<DocumentResponse>> {
        let department = department.trim();
        if department.is_empty() {
            return Err(Error::InvalidInput("department is required".to_string()));
        }
        let docs = self.documents.list_responded(department).await?;
        Ok(docs.iter().filter_map(DocumentResponse::from_archived).collect())
    }

    /// Per-status counts visible to the caller.
    pub async fn stats(&self, scope: Scope) -> Result<DocumentStats> {
        let query = self.resolve_scope(scope)?;
        self.documents.stats(&query).await
    }

    /// Documents created per month of `year`, always twelve entries.
    pub async fn monthly_stats(&self, year: i32, scope: Scope) -> Result<Vec<MonthlyCount>> {
        if !(1970..=9999).contains(&year) {
            return Err(Error::InvalidInput(format!("Invalid year: {}", year)));
        }
        let query = self.resolve_scope(scope)?;
        let counts = self.documents.monthly_counts(year, &query).await?;
        Ok(fill_months(counts))
    }

    /// Everyone sees the requested department, or everything when none is
    /// given; Employees are additionally restricted to their own documents.
    fn resolve_scope(&self, scope: Scope) -> Result<DocumentQuery> {
        match scope.role {
            Some(UserRole::Employee) => {
                let owner_id = scope.user_id.ok_or_else(|| {
                    Error::InvalidInput("userId is required for the Employee role".to_string())
                })?;
                Ok(DocumentQuery {
                    department: non_blank(scope.department),
                    status: None,
                    owner_id: Some(owner_id),
                })
            }
            _ => Ok(DocumentQuery {
                department: non_blank(scope.department),
                status: None,
                owner_id: None,
            }),
        }
    }

    fn guard(&self, current: &Document, to: DocumentStatus, op: &'static str) -> Result<()> {
        check_transition(current.status, to).inspect_err(|_| {
            warn!(
                subsystem = logging::SUBSYSTEM_WORKFLOW,
                component = logging::COMPONENT_ENGINE,
                op,
                document_id = current.id,
                from_status = %current.status,
                to_status = %to,
                "Transition rejected"
            );
        })
    }

    async fn transition(
        &self,
        current: Document,
        to: DocumentStatus,
        comments: Option<String>,
        actor: Option<String>,
        op: &'static str,
    ) -> Result<Document> {
        self.guard(&current, to, op)?;
        let updated = self
            .documents
            .apply(
                current.id,
                DocumentChange {
                    from: current.status,
                    to,
                    comments: match non_blank(comments) {
                        Some(c) => CommentUpdate::Replace(Some(c)),
                        None => CommentUpdate::Keep,
                    },
                    updated_by: non_blank(actor),
                    custody: None,
                    expected_version: None,
                },
            )
            .await?;
        info!(
            subsystem = logging::SUBSYSTEM_WORKFLOW,
            component = logging::COMPONENT_ENGINE,
            op,
            document_id = updated.id,
            from_status = %current.status,
            to_status = %to,
            "Document status updated"
        );
        Ok(updated)
    }
}
