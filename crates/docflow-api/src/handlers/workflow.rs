//! Forwarding, responses, and release queues.

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{ApiError, ApiJson, ApiQuery, AppState};
use docflow_core::{Document, DocumentResponse, ForwardRequest, ReleaseQuery, RespondRequest};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForwardBody {
    pub document_id: i64,
    pub target_department: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub forwarder_department: Option<String>,
    #[serde(default)]
    pub forwarder_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RespondBody {
    pub document_id: i64,
    #[serde(default)]
    pub responder_department: Option<String>,
    #[serde(default)]
    pub responder_name: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReleasesQuery {
    /// Owner's department
    pub department: Option<String>,
    /// Owner's division
    pub division: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResponsesQuery {
    /// Department that forwarded the documents
    pub department: String,
}

/// Forward a document into another department's custody.
///
/// # Returns
/// - 200 OK with the document, now Received
/// - 400 Bad Request if the target department is blank or unknown
/// - 404 Not Found if the document doesn't exist
/// - 409 Conflict if the document is Archived
#[utoipa::path(
    post,
    path = "/forward",
    tag = "Workflow",
    request_body = ForwardBody,
    responses(
        (status = 200, description = "Forwarded", body = Document),
        (status = 400, description = "Invalid target department"),
        (status = 409, description = "Document is archived")
    )
)]
pub async fn forward_document(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForwardBody>,
) -> Result<Json<Document>, ApiError> {
    let doc = state
        .engine
        .forward(ForwardRequest {
            document_id: body.document_id,
            target_department: body.target_department,
            notes: body.notes,
            forwarder_department: body.forwarder_department,
            forwarder_name: body.forwarder_name,
        })
        .await?;
    Ok(Json(doc))
}

/// Answer a forwarded document; it is archived with the message. Answering
/// again replaces the earlier message.
///
/// # Returns
/// - 200 OK with the response
/// - 400 Bad Request if the message is blank
/// - 404 Not Found if the document doesn't exist
/// - 409 Conflict unless the document was forwarded (Received, or Archived after a forward)
#[utoipa::path(
    post,
    path = "/respond",
    tag = "Workflow",
    request_body = RespondBody,
    responses(
        (status = 200, description = "Answered", body = DocumentResponse),
        (status = 409, description = "Document was not forwarded")
    )
)]
pub async fn respond_document(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RespondBody>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let response = state
        .engine
        .respond(RespondRequest {
            document_id: body.document_id,
            responder_department: body.responder_department,
            responder_name: body.responder_name,
            message: body.message,
        })
        .await?;
    Ok(Json(response))
}

/// Approved and Released documents by owner department and division.
#[utoipa::path(
    get,
    path = "/documents/releases",
    tag = "Workflow",
    params(ReleasesQuery),
    responses((status = 200, description = "Documents", body = Vec<Document>))
)]
pub async fn list_releases(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReleasesQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let docs = state
        .engine
        .list_releases(ReleaseQuery {
            department: query.department,
            division: query.division,
            owner_id: query.user_id,
        })
        .await?;
    Ok(Json(docs))
}

/// Latest responses to documents a department forwarded.
#[utoipa::path(
    get,
    path = "/documents/responses",
    tag = "Workflow",
    params(ResponsesQuery),
    responses((status = 200, description = "Responses", body = Vec<DocumentResponse>))
)]
pub async fn list_responses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ResponsesQuery>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    Ok(Json(state.engine.list_responses(&query.department).await?))
}
