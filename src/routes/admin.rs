use crate::{AppState, handlers::users};
use axum::{
    Router,
    routing::{delete, get, patch},
};

/// Admin Router Module
///
/// User management, restricted to the admin role by `admin_middleware`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /all-users/{email}
        // Every user except the one in the path.
        .route("/all-users/{email}", get(users::list_users))
        .route("/user/role/{email}", patch(users::update_user_role))
        .route("/user/{id}", delete(users::delete_user))
}
