use crate::{
    AppState,
    handlers::{applications, payments, reviews, scholarships, stats, users},
};
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: sign-in plumbing, read-only listings,
/// the moderation actions the dashboard calls directly and payment intents.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness banner.
        .route("/", get(|| async { "Scholarship portal server is running" }))
        // GET /health
        // Used by load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // --- Identity ---
        .route("/jwt", post(users::issue_token))
        .route("/users/{email}", post(users::upsert_user))
        .route("/users/role/{email}", get(users::get_user_role))
        // --- Scholarships ---
        .route("/top-scholarships", get(scholarships::top_scholarships))
        .route("/all-scholarships", get(scholarships::all_scholarships))
        .route("/scholarships", get(scholarships::list_scholarships))
        .route("/scholarships/{id}", get(scholarships::get_scholarship))
        // --- Applications ---
        // PATCH /edit-my-application/{id}
        // Rejected with 409 while the application is processing.
        .route(
            "/edit-my-application/{id}",
            patch(applications::edit_application),
        )
        .route("/apply-scholarships", get(applications::list_applications))
        .route(
            "/apply-scholarship/cancel/{id}",
            patch(applications::cancel_application),
        )
        .route("/update-status/{id}", patch(applications::update_status))
        .route(
            "/apply-scholarship/{id}/feedback",
            patch(applications::add_feedback),
        )
        // --- Reviews ---
        .route(
            "/reviews/{scholarship_id}",
            get(reviews::reviews_for_scholarship),
        )
        .route("/all-reviews/{id}", delete(reviews::delete_review))
        // --- Dashboard & Payments ---
        .route("/admin-stats", get(stats::admin_stats))
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        )
}
