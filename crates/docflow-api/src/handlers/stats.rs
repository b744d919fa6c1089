//! Dashboard statistics.

use axum::{extract::State, Json};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use super::parse_scope;
use crate::{ApiError, ApiQuery, AppState};
use docflow_core::{DocumentStats, MonthlyCount};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    pub user_id: Option<i64>,
    pub role: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MonthlyStatsQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    pub user_id: Option<i64>,
    pub role: Option<String>,
    pub department: Option<String>,
}

/// Per-status counts scoped like the document listing.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Stats",
    params(StatsQuery),
    responses((status = 200, description = "Counts", body = DocumentStats))
)]
pub async fn get_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<DocumentStats>, ApiError> {
    let scope = parse_scope(query.user_id, query.role.as_deref(), query.department)?;
    Ok(Json(state.engine.stats(scope).await?))
}

/// Documents created per month; always twelve entries.
#[utoipa::path(
    get,
    path = "/stats/monthly",
    tag = "Stats",
    params(MonthlyStatsQuery),
    responses((status = 200, description = "Monthly counts", body = Vec<MonthlyCount>))
)]
pub async fn get_monthly_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MonthlyStatsQuery>,
) -> Result<Json<Vec<MonthlyCount>>, ApiError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let scope = parse_scope(query.user_id, query.role.as_deref(), query.department)?;
    Ok(Json(state.engine.monthly_stats(year, scope).await?))
}
