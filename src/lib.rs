use axum::{
    Json, Router,
    extract::{FromRef, Request},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod validation;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use error::ApiError;
use models::Role;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application by aggregating every handler decorated with `#[utoipa::path]`
/// and every schema deriving `ToSchema`. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::signup, handlers::login, handlers::get_profile,
        handlers::update_profile, handlers::change_password,
        handlers::get_courses, handlers::get_course, handlers::create_course,
        handlers::enroll, handlers::list_assignments, handlers::create_assignment,
        handlers::submit_assignment, handlers::grade_submission,
        handlers::list_users, handlers::get_user_by_id, handlers::update_user,
        handlers::delete_user,
    ),
    components(
        schemas(
            models::User, models::Role, models::Course, models::CourseDetail,
            models::TeacherSummary, models::EnrolledStudent, models::EnrollmentInfo,
            models::Assignment, models::Submission, models::Semester,
            models::EnrollmentStatus, models::AssignmentType, models::SubmissionStatus,
            models::SignupRequest, models::LoginRequest, models::UpdateProfileRequest,
            models::ChangePasswordRequest, models::CreateCourseRequest,
            models::CreateAssignmentRequest, models::CreateSubmissionRequest,
            models::GradeSubmissionRequest, models::UpdateUserRequest,
            models::AuthResponse, models::MessageResponse, models::UserResponse,
            models::UserWithMessageResponse, models::CoursesResponse,
            models::CourseDetailResponse, models::CourseWithMessageResponse,
            models::AssignmentsResponse, models::AssignmentResponse,
            models::SubmissionResponse, models::UserListResponse,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "college-lms", description = "College Learning Management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Allow handlers and the AuthUser extractor to selectively pull components
// from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes`.
///
/// *Mechanism*: attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, any authentication failure (JWT
/// validation, DB lookup, deactivated account) rejects the request with a
/// 401 before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Enforces the admin role for the admin router: authentication first (via
/// the same extractor), then a role check that rejects any non-admin
/// identity with a 403 before a handler runs.
async fn admin_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if auth_user.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state. The whole API
/// surface lives under the `/api` prefix; Swagger UI sits beside it.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. API Router Assembly
    let api_router = public::public_routes()
        // Authenticated routes: protected by the `auth_middleware` layer.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: nested under '/users', with authentication AND the
        // admin role check applied before any handler.
        .nest(
            "/users",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        );

    // 3. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router)
        // Unknown paths get the same JSON envelope as every other error.
        .fallback(fallback_handler)
        .with_state(state);

    // 4. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID generation: a unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request tracing: wraps the request/response lifecycle in
                // a span carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer
        .layer(cors)
}

/// fallback_handler
///
/// 404 for any path outside the routing table, in the standard error shape.
async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(error::ErrorBody {
            message: "Route not found".to_string(),
            errors: None,
        }),
    )
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: extracts the
/// `x-request-id` header and includes it in the structured logging metadata
/// alongside the HTTP method and URI, so every log line for a single request
/// is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
