//! docflow-api - HTTP API for the docflow document workflow.
//!
//! The router is built here so integration tests can drive it with
//! `tower::ServiceExt::oneshot` over the in-memory store; `main.rs` only
//! wires configuration, logging, and PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use uuid::Uuid;

use docflow_core::{
    logging, DirectoryRepository, DirectoryService, DocumentRepository, UserRepository,
    WorkflowEngine,
};
use docflow_db::Database;

pub use config::ServerConfig;
pub use error::{ApiError, ApiJson, ApiJsonOrDefault, ApiPath, ApiQuery};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Global rate limiter type (direct quota, no per-client buckets).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
    pub directory: DirectoryService,
    /// None if rate limiting is disabled.
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        directory: Arc<dyn DirectoryRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            engine: WorkflowEngine::new(documents, directory.clone()),
            directory: DirectoryService::new(directory, users),
            rate_limiter: None,
        }
    }

    /// State backed by PostgreSQL repositories.
    pub fn from_database(db: &Database) -> Self {
        Self::new(
            Arc::new(db.documents.clone()),
            Arc::new(db.directory.clone()),
            Arc::new(db.users.clone()),
        )
    }

    /// Allow `requests` per `period_secs`, shared by all clients.
    pub fn with_rate_limit(mut self, requests: u32, period_secs: u64) -> Self {
        let quota = rate_limit_quota(requests, period_secs);
        self.rate_limiter = Some(Arc::new(RateLimiter::direct(quota)));
        self
    }
}

/// `requests` may arrive at once; after that one slot refills every
/// `period / requests`, so a full period restores the whole allowance.
pub fn rate_limit_quota(requests: u32, period_secs: u64) -> Quota {
    let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
    let period = Duration::from_secs(period_secs.max(1));
    Quota::with_period(period / burst.get())
        .map(|q| q.allow_burst(burst))
        .unwrap_or_else(|| Quota::per_second(burst))
}

// =============================================================================
// OPENAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docflow API",
        description = "Document submission, approval, forwarding, and release workflow"
    ),
    paths(
        handlers::auth::login,
        handlers::documents::list_documents,
        handlers::documents::create_document,
        handlers::documents::update_document,
        handlers::documents::get_document,
        handlers::documents::delete_document,
        handlers::documents::archive_document,
        handlers::documents::release_document,
        handlers::documents::resubmit_document,
        handlers::workflow::forward_document,
        handlers::workflow::respond_document,
        handlers::workflow::list_releases,
        handlers::workflow::list_responses,
        handlers::directory::list_departments,
        handlers::directory::create_department,
        handlers::directory::list_divisions,
        handlers::directory::create_division,
        handlers::stats::get_stats,
        handlers::stats::get_monthly_stats,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
    ),
    components(schemas(
        docflow_core::Document,
        docflow_core::DocumentStatus,
        docflow_core::Priority,
        docflow_core::DocumentResponse,
        docflow_core::DocumentStats,
        docflow_core::MonthlyCount,
        docflow_core::User,
        docflow_core::UserRole,
        docflow_core::UserStatus,
        docflow_core::SubRole,
        docflow_core::Department,
        docflow_core::Division,
        docflow_core::CreateUserRequest,
        docflow_core::UpdateUserRequest,
        handlers::auth::LoginBody,
        handlers::auth::LoginResponse,
        handlers::documents::CreateDocumentBody,
        handlers::documents::UpdateDocumentBody,
        handlers::documents::ActorBody,
        handlers::documents::ResubmitBody,
        handlers::documents::DeleteResponse,
        handlers::workflow::ForwardBody,
        handlers::workflow::RespondBody,
        handlers::directory::DepartmentBody,
        handlers::directory::DivisionBody,
    )),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Documents", description = "Document CRUD and status changes"),
        (name = "Workflow", description = "Forwarding, responses, and releases"),
        (name = "Directory", description = "Departments and divisions"),
        (name = "Stats", description = "Dashboard counts"),
        (name = "Users", description = "User administration"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = logging::SUBSYSTEM_API, component = logging::COMPONENT_RATE_LIMIT, "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with all middleware layers.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    use handlers::{auth, directory, documents, stats, users, workflow};

    Router::new()
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json))
        .route("/login", post(auth::login))
        .route(
            "/documents",
            get(documents::list_documents)
                .post(documents::create_document)
                .put(documents::update_document),
        )
        .route("/documents/releases", get(workflow::list_releases))
        .route("/documents/responses", get(workflow::list_responses))
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/:id/archive", post(documents::archive_document))
        .route("/documents/:id/release", post(documents::release_document))
        .route("/documents/:id/resubmit", post(documents::resubmit_document))
        .route("/forward", post(workflow::forward_document))
        .route("/respond", post(workflow::respond_document))
        .route(
            "/departments",
            get(directory::list_departments).post(directory::create_department),
        )
        .route(
            "/divisions",
            get(directory::list_divisions).post(directory::create_division),
        )
        .route("/stats", get(stats::get_stats))
        .route("/stats/monthly", get(stats::get_monthly_stats))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", put(users::update_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state)
}
