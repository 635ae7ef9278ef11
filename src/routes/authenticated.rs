use crate::{
    AppState,
    handlers::{applications, reviews},
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Authenticated Router Module
///
/// Student-facing routes. The `auth_middleware` layer above this router
/// verifies the token and stores the caller's `AuthUser` in the request
/// extensions.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /apply-scholarship
        // Stores a new application in `pending`.
        .route("/apply-scholarship", post(applications::apply))
        // GET /apply-scholarship/{email}
        // Shares its parameter name with /apply-scholarship/{id}/feedback;
        // the segment holds the student's email here.
        .route(
            "/apply-scholarship/{id}",
            get(applications::applications_by_student),
        )
        .route(
            "/my-application/{id}",
            delete(applications::delete_application),
        )
        .route(
            "/edit-my-application/{id}",
            get(applications::get_application),
        )
        // --- Reviews ---
        .route("/add-review", post(reviews::add_review))
        .route("/reviews", get(reviews::reviews_by_user))
}
