//! User administration.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{ApiError, ApiJson, ApiPath, ApiQuery, AppState};
use docflow_core::{CreateUserRequest, UpdateUserRequest, User};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsersQuery {
    pub department: Option<String>,
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(UsersQuery),
    responses((status = 200, description = "Users", body = Vec<User>))
)]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.directory.users(query.department.as_deref()).await?))
}

/// Create a user account.
///
/// # Returns
/// - 201 Created with the user (never the password hash)
/// - 400 Bad Request for a weak password or unknown department/division
/// - 409 Conflict if the username is taken
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 409, description = "Username taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.directory.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update role, status, affiliation, or password. Absent fields are kept.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.directory.update_user(id, body).await?))
}
