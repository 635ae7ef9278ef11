use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
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

pub mod aggregation;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod payment;
pub mod repository;

// Routers segregated by access level (public, authenticated, moderator, admin).
pub mod routes;
use auth::AuthUser;
use errors::AppError;
use models::Role;
use routes::{admin, authenticated, moderator, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use payment::{MockPaymentGateway, PaymentState, StripeGateway};
pub use repository::{MemoryRepository, MongoRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::issue_token, handlers::users::upsert_user,
        handlers::users::get_user_role, handlers::users::list_users,
        handlers::users::update_user_role, handlers::users::delete_user,
        handlers::scholarships::top_scholarships, handlers::scholarships::all_scholarships,
        handlers::scholarships::create_scholarship, handlers::scholarships::list_scholarships,
        handlers::scholarships::get_scholarship, handlers::scholarships::edit_scholarship,
        handlers::scholarships::delete_scholarship,
        handlers::applications::apply, handlers::applications::applications_by_student,
        handlers::applications::get_application, handlers::applications::delete_application,
        handlers::applications::edit_application, handlers::applications::list_applications,
        handlers::applications::cancel_application, handlers::applications::update_status,
        handlers::applications::add_feedback,
        handlers::reviews::add_review, handlers::reviews::reviews_for_scholarship,
        handlers::reviews::reviews_by_user, handlers::reviews::all_reviews,
        handlers::reviews::delete_review,
        handlers::stats::admin_stats, handlers::payments::create_payment_intent,
    ),
    components(
        schemas(
            models::User, models::Role, models::UserStatus, models::Scholarship,
            models::ScholarshipInput, models::RatedScholarship, models::Application,
            models::ApplicationStatus, models::ApplicationRequest, models::ApplicationEdit,
            models::StudentInfo, models::StudentAddress, models::Review, models::ReviewRequest,
            models::TokenRequest, models::TokenResponse, models::UserUpsertRequest,
            models::UpdateRoleRequest, models::RoleResponse, models::StatusUpdateRequest,
            models::FeedbackRequest, models::PaymentIntentRequest, models::PaymentIntentResponse,
            models::InsertResponse, models::MessageResponse, models::AdminStats,
            errors::ErrorBody,
        )
    ),
    tags(
        (name = "scholarship-portal", description = "Scholarship Application Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single container of shared services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (MongoDB in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Payment processor client.
    pub payments: PaymentState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for PaymentState {
    fn from_ref(app_state: &AppState) -> PaymentState {
        app_state.payments.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless `AuthUser` resolves, then stores the
/// identity in the request extensions for the role checks and handlers below.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// moderator_middleware
///
/// Second stage for the moderator routes: the stored role must be moderator
/// or admin.
async fn moderator_middleware(
    State(repo): State<RepositoryState>,
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    auth::authorize(&repo, &auth_user, &[Role::Moderator, Role::Admin]).await?;
    Ok(next.run(request).await)
}

/// admin_middleware
async fn admin_middleware(
    State(repo): State<RepositoryState>,
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    auth::authorize(&repo, &auth_user, &[Role::Admin]).await?;
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing structure, applies the scoped access middleware and
/// the global observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Route layers run bottom-up: the last one added runs first, so the
    // token check always precedes the role check.
    let moderator_routes = moderator::moderator_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            moderator_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = admin::admin_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(moderator_routes)
        .merge(admin_routes)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line carries the request id.
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
