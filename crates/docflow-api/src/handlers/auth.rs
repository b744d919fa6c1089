//! Login.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{ApiError, ApiJson, AppState};
use docflow_core::User;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// User record plus the landing page for the user's role.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub route: String,
}

/// Verify credentials.
///
/// # Returns
/// - 200 OK with the user record
/// - 400 Bad Request if a field is blank
/// - 401 Unauthorized with `{"error": "Invalid credentials"}`
/// - 500 Internal Server Error if the stored hash is unusable
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.directory.login(&body.username, &body.password).await?;
    let route = user.default_route().to_string();
    Ok(Json(LoginResponse { user, route }))
}
