//! Document CRUD and single-step status handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{parse_scope, parse_status};
use crate::{ApiError, ApiJson, ApiJsonOrDefault, ApiPath, ApiQuery, AppState};
use docflow_core::{CreateDocumentRequest, Document, DocumentStatus, Priority, StatusUpdate};

/// Query parameters for listing documents.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListDocumentsQuery {
    /// Caller's user id; required for the Employee role
    pub user_id: Option<i64>,
    /// Caller's role, any casing
    pub role: Option<String>,
    pub department: Option<String>,
    /// Status filter, any casing
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDocumentBody {
    #[serde(rename = "Type")]
    pub doc_type: String,
    #[serde(rename = "User_Id")]
    pub user_id: i64,
    #[serde(rename = "Priority", default)]
    pub priority: Priority,
    /// Base64 file content
    #[serde(rename = "Document", default, with = "docflow_core::base64_bytes")]
    #[schema(value_type = Option<String>, format = Byte)]
    pub payload: Option<Vec<u8>>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDocumentBody {
    #[serde(rename = "Document_Id")]
    pub id: i64,
    #[serde(rename = "Status", default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub comments: Option<String>,
    /// Name of the admin making the change
    #[serde(default)]
    pub admin: Option<String>,
    /// Reject the write unless the stored version matches
    #[serde(default)]
    pub version: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ActorBody {
    #[serde(default)]
    pub admin: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ResubmitBody {
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

/// List documents visible to the caller.
///
/// Employees see only their own documents; other roles see the given
/// department (custodian or forwarder), or everything without one.
///
/// # Returns
/// - 200 OK with documents, newest first
/// - 400 Bad Request for an unknown role/status or an Employee without userId
#[utoipa::path(
    get,
    path = "/documents",
    tag = "Documents",
    params(ListDocumentsQuery),
    responses((status = 200, description = "Documents", body = Vec<Document>))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let status = parse_status(query.status.as_deref())?;
    let scope = parse_scope(query.user_id, query.role.as_deref(), query.department)?;
    Ok(Json(state.engine.list(scope, status).await?))
}

/// Submit a document. It starts Pending in the owner's department.
///
/// # Returns
/// - 201 Created with the stored document
/// - 400 Bad Request if `Type` is blank or the owner does not exist
#[utoipa::path(
    post,
    path = "/documents",
    tag = "Documents",
    request_body = CreateDocumentBody,
    responses(
        (status = 201, description = "Created", body = Document),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_document(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateDocumentBody>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let doc = state
        .engine
        .create(CreateDocumentRequest {
            doc_type: body.doc_type,
            user_id: body.user_id,
            priority: body.priority,
            payload: body.payload,
            description: body.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// Change a document's status and/or comments.
///
/// # Returns
/// - 200 OK with the updated document
/// - 400 Bad Request when asked to set Received (use `/forward`)
/// - 404 Not Found if the document doesn't exist
/// - 409 Conflict for a forbidden transition or a stale `version`
#[utoipa::path(
    put,
    path = "/documents",
    tag = "Documents",
    request_body = UpdateDocumentBody,
    responses(
        (status = 200, description = "Updated", body = Document),
        (status = 404, description = "Not found"),
        (status = 409, description = "Forbidden transition or stale version")
    )
)]
pub async fn update_document(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateDocumentBody>,
) -> Result<Json<Document>, ApiError> {
    let doc = state
        .engine
        .update_status(
            body.id,
            StatusUpdate {
                status: body.status,
                comments: body.comments,
                actor: body.admin,
                expected_version: body.version,
            },
        )
        .await?;
    Ok(Json(doc))
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.engine.get(id).await?))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Deleted", body = DeleteResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.engine.delete(id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// Archive a document. Archiving twice is a no-op. The body may be omitted.
#[utoipa::path(
    post,
    path = "/documents/{id}/archive",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    request_body = ActorBody,
    responses((status = 200, description = "Archived", body = Document))
)]
pub async fn archive_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJsonOrDefault(body): ApiJsonOrDefault<ActorBody>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.engine.archive(id, body.admin).await?))
}

/// Release an Approved document. The body may be omitted.
///
/// # Returns
/// - 200 OK with the released document
/// - 409 Conflict unless the document is Approved
#[utoipa::path(
    post,
    path = "/documents/{id}/release",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    request_body = ActorBody,
    responses((status = 200, description = "Released", body = Document))
)]
pub async fn release_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJsonOrDefault(body): ApiJsonOrDefault<ActorBody>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.engine.release(id, body.admin).await?))
}

/// Send a document in Revision back to Pending. The body may be omitted.
#[utoipa::path(
    post,
    path = "/documents/{id}/resubmit",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    request_body = ResubmitBody,
    responses((status = 200, description = "Resubmitted", body = Document))
)]
pub async fn resubmit_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJsonOrDefault(body): ApiJsonOrDefault<ResubmitBody>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.engine.resubmit(id, body.comments).await?))
}
