use crate::{
    AppState,
    handlers::{reviews, scholarships},
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Moderator Router Module
///
/// Scholarship management and review oversight. Wrapped in `auth_middleware`
/// and then `moderator_middleware`, which loads the caller's stored user and
/// requires the moderator or admin role (403 otherwise).
pub fn moderator_routes() -> Router<AppState> {
    Router::new()
        .route("/scholarships", post(scholarships::create_scholarship))
        // PUT /edit-manage-scholarship/{id}
        // Full-field replacement.
        .route(
            "/edit-manage-scholarship/{id}",
            put(scholarships::edit_scholarship),
        )
        .route("/scholarship/{id}", delete(scholarships::delete_scholarship))
        .route("/all-reviews", get(reviews::all_reviews))
}
