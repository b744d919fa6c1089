//! Department and division handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{ApiError, ApiJson, ApiQuery, AppState};
use docflow_core::{Department, Division};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DepartmentBody {
    #[serde(rename = "Department")]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DivisionBody {
    #[serde(rename = "Division")]
    pub name: String,
    #[serde(rename = "Department")]
    pub department: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DivisionsQuery {
    pub department: String,
}

#[utoipa::path(
    get,
    path = "/departments",
    tag = "Directory",
    responses((status = 200, description = "Department names", body = Vec<String>))
)]
pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.directory.departments().await?))
}

/// Create a department.
///
/// # Returns
/// - 201 Created
/// - 409 Conflict if the name exists (case-insensitive)
#[utoipa::path(
    post,
    path = "/departments",
    tag = "Directory",
    request_body = DepartmentBody,
    responses(
        (status = 201, description = "Created", body = Department),
        (status = 409, description = "Duplicate department")
    )
)]
pub async fn create_department(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DepartmentBody>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    let department = state.directory.create_department(&body.name).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    get,
    path = "/divisions",
    tag = "Directory",
    params(DivisionsQuery),
    responses((status = 200, description = "Division names", body = Vec<String>))
)]
pub async fn list_divisions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DivisionsQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.directory.divisions(&query.department).await?))
}

/// Create a division inside an existing department.
///
/// # Returns
/// - 201 Created with `{Division_Id, Division, Department}`
/// - 400 Bad Request if the department does not exist
/// - 409 Conflict if the department already has this division
#[utoipa::path(
    post,
    path = "/divisions",
    tag = "Directory",
    request_body = DivisionBody,
    responses(
        (status = 201, description = "Created", body = Division),
        (status = 409, description = "Duplicate division")
    )
)]
pub async fn create_division(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DivisionBody>,
) -> Result<(StatusCode, Json<Division>), ApiError> {
    let division = state
        .directory
        .create_division(&body.name, &body.department)
        .await?;
    Ok((StatusCode::CREATED, Json(division)))
}
