use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use mongodb::bson::oid::ObjectId;
use scholarship_portal::{
    AppState, MemoryRepository, MockPaymentGateway,
    auth::AuthUser,
    config::AppConfig,
    errors::{AppError, ErrorBody},
    handlers::{AppJson, AppQuery, applications, payments, reviews, scholarships, stats},
    handlers::applications::ApplicationFilter,
    models::{
        Application, ApplicationEdit, ApplicationStatus, FeedbackRequest, PaymentIntentRequest,
        ReviewRequest, ScholarshipInput, StatusUpdateRequest, StudentInfo,
    },
};
use std::sync::Arc;
use tokio::test;

// --- Test State ---

fn create_test_state(gateway: Arc<MockPaymentGateway>) -> AppState {
    AppState {
        repo: Arc::new(MemoryRepository::new()),
        payments: gateway,
        config: AppConfig::default(),
    }
}

fn default_state() -> AppState {
    create_test_state(Arc::new(MockPaymentGateway::new()))
}

fn student_user() -> AuthUser {
    AuthUser {
        email: "student@example.com".to_string(),
    }
}

async fn seed_application(state: &AppState, status: ApplicationStatus) -> ObjectId {
    state
        .repo
        .create_application(Application {
            scholarship_id: ObjectId::new().to_hex(),
            student: StudentInfo {
                user_email: "student@example.com".to_string(),
                ..StudentInfo::default()
            },
            phone: Some("0100".to_string()),
            status,
            ..Application::default()
        })
        .await
        .unwrap()
}

async fn stored_application(state: &AppState, id: ObjectId) -> Application {
    state.repo.get_application(id).await.unwrap().unwrap()
}

async fn error_body(err: AppError) -> (StatusCode, String) {
    let (parts, body) = err.into_response().into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    (parts.status, body.message)
}

fn review_request(scholarship_id: &str, rating: f64) -> ReviewRequest {
    ReviewRequest {
        scholarship_id: scholarship_id.to_string(),
        rating,
        comment: Some("Great program".to_string()),
        ..ReviewRequest::default()
    }
}

// --- Application Status Workflow ---

#[test]
async fn test_update_status_rejects_unknown_value() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Pending).await;

    let result = applications::update_status(
        State(state.clone()),
        Path(id.to_hex()),
        AppJson(StatusUpdateRequest {
            status: "approved".to_string(),
        }),
    )
    .await;

    let (status, message) = error_body(result.unwrap_err()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Invalid status value");
    assert_eq!(
        stored_application(&state, id).await.status,
        ApplicationStatus::Pending
    );
}

#[test]
async fn test_update_status_rejects_cancel_state() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Processing).await;

    let result = applications::update_status(
        State(state.clone()),
        Path(id.to_hex()),
        AppJson(StatusUpdateRequest {
            status: "rejected".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(
        stored_application(&state, id).await.status,
        ApplicationStatus::Processing
    );
}

#[test]
async fn test_update_status_success() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Pending).await;

    let result = applications::update_status(
        State(state.clone()),
        Path(id.to_hex()),
        AppJson(StatusUpdateRequest {
            status: "processing".to_string(),
        }),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        stored_application(&state, id).await.status,
        ApplicationStatus::Processing
    );
}

#[test]
async fn test_list_applications_empty_status_is_no_filter() {
    let state = default_state();
    seed_application(&state, ApplicationStatus::Pending).await;
    seed_application(&state, ApplicationStatus::Completed).await;

    let Json(all) = applications::list_applications(
        State(state.clone()),
        AppQuery(ApplicationFilter {
            status: Some(String::new()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 2);

    let Json(completed) = applications::list_applications(
        State(state),
        AppQuery(ApplicationFilter {
            status: Some("completed".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(completed.len(), 1);
}

#[test]
async fn test_list_applications_unknown_status_matches_nothing() {
    let state = default_state();
    seed_application(&state, ApplicationStatus::Pending).await;

    let Json(found) = applications::list_applications(
        State(state),
        AppQuery(ApplicationFilter {
            status: Some("bogus".to_string()),
        }),
    )
    .await
    .unwrap();

    assert!(found.is_empty());
}

#[test]
async fn test_cancel_moves_to_rejected() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Processing).await;

    let result = applications::cancel_application(State(state.clone()), Path(id.to_hex())).await;

    assert!(result.is_ok());
    assert_eq!(
        stored_application(&state, id).await.status,
        ApplicationStatus::Rejected
    );
}

#[test]
async fn test_edit_blocked_while_processing() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Processing).await;
    let before = stored_application(&state, id).await;

    let result = applications::edit_application(
        State(state.clone()),
        Path(id.to_hex()),
        AppJson(ApplicationEdit {
            phone: Some("0999".to_string()),
            ..ApplicationEdit::default()
        }),
    )
    .await;

    let (status, _) = error_body(result.unwrap_err()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(stored_application(&state, id).await, before);
}

#[test]
async fn test_edit_pending_application() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Pending).await;

    let Json(response) = applications::edit_application(
        State(state.clone()),
        Path(id.to_hex()),
        AppJson(ApplicationEdit {
            degree: Some("Masters".to_string()),
            ..ApplicationEdit::default()
        }),
    )
    .await
    .unwrap();

    assert!(response.success);
    let stored = stored_application(&state, id).await;
    assert_eq!(stored.degree.as_deref(), Some("Masters"));
    // Fields absent from the edit keep their value.
    assert_eq!(stored.phone.as_deref(), Some("0100"));
}

#[test]
async fn test_edit_missing_application_not_found() {
    let state = default_state();

    let result = applications::edit_application(
        State(state),
        Path(ObjectId::new().to_hex()),
        AppJson(ApplicationEdit::default()),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
async fn test_feedback_required() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Pending).await;

    let result = applications::add_feedback(
        State(state.clone()),
        Path(id.to_hex()),
        AppJson(FeedbackRequest {
            feedback: Some("   ".to_string()),
        }),
    )
    .await;

    let (status, message) = error_body(result.unwrap_err()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Feedback is required");
    assert_eq!(stored_application(&state, id).await.feedback, None);
}

#[test]
async fn test_feedback_overwrites_previous() {
    let state = default_state();
    let id = seed_application(&state, ApplicationStatus::Completed).await;

    for text in ["first", "second"] {
        applications::add_feedback(
            State(state.clone()),
            Path(id.to_hex()),
            AppJson(FeedbackRequest {
                feedback: Some(text.to_string()),
            }),
        )
        .await
        .unwrap();
    }

    assert_eq!(
        stored_application(&state, id).await.feedback.as_deref(),
        Some("second")
    );
}

// --- Reviews ---

#[test]
async fn test_duplicate_review_rejected() {
    let state = default_state();
    let scholarship_id = ObjectId::new().to_hex();

    let first = reviews::add_review(
        student_user(),
        State(state.clone()),
        AppJson(review_request(&scholarship_id, 4.0)),
    )
    .await
    .unwrap();
    assert_eq!(first.0, StatusCode::CREATED);

    let second = reviews::add_review(
        student_user(),
        State(state.clone()),
        AppJson(review_request(&scholarship_id, 2.0)),
    )
    .await;

    let (status, message) = error_body(second.unwrap_err()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        message,
        "You have already submitted a review for this scholarship."
    );
    let stored = state
        .repo
        .reviews_for_scholarship(&scholarship_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].rating, 4.0);
}

#[test]
async fn test_review_author_is_caller() {
    let state = default_state();
    let scholarship_id = ObjectId::new().to_hex();
    let mut request = review_request(&scholarship_id, 5.0);
    request.user_email = "someone-else@example.com".to_string();

    reviews::add_review(student_user(), State(state.clone()), AppJson(request))
        .await
        .unwrap();

    let mine = state
        .repo
        .reviews_by_user("student@example.com")
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert!(
        state
            .repo
            .reviews_by_user("someone-else@example.com")
            .await
            .unwrap()
            .is_empty()
    );

    let again = reviews::add_review(
        student_user(),
        State(state.clone()),
        AppJson(review_request(&scholarship_id, 1.0)),
    )
    .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
}

#[test]
async fn test_delete_missing_review_not_found() {
    let state = default_state();

    let result = reviews::delete_review(State(state), Path(ObjectId::new().to_hex())).await;

    let (status, _) = error_body(result.unwrap_err()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Scholarships ---

#[test]
async fn test_delete_missing_scholarship_not_found() {
    let state = default_state();

    let result =
        scholarships::delete_scholarship(State(state), Path(ObjectId::new().to_hex())).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
async fn test_malformed_id_is_bad_request() {
    let state = default_state();

    let result = scholarships::get_scholarship(State(state), Path("not-an-id".to_string())).await;

    let (status, _) = error_body(result.unwrap_err()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
async fn test_create_scholarship_records_poster() {
    let state = default_state();
    let input = ScholarshipInput {
        scholarship_name: "Global Excellence".to_string(),
        university_name: "Oxford".to_string(),
        application_fees: 50.0,
        ..ScholarshipInput::default()
    };

    let Json(inserted) = scholarships::create_scholarship(
        AuthUser {
            email: "mod@example.com".to_string(),
        },
        State(state.clone()),
        AppJson(input),
    )
    .await
    .unwrap();

    assert!(inserted.acknowledged);
    let id = ObjectId::parse_str(&inserted.inserted_id).unwrap();
    let stored = state.repo.get_scholarship(id).await.unwrap().unwrap();
    assert_eq!(stored.posted_user_email.as_deref(), Some("mod@example.com"));
}

#[test]
async fn test_create_scholarship_requires_name() {
    let state = default_state();

    let result = scholarships::create_scholarship(
        student_user(),
        State(state),
        AppJson(ScholarshipInput::default()),
    )
    .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[test]
async fn test_edit_scholarship_reports_unchanged() {
    let state = default_state();
    let input = ScholarshipInput {
        scholarship_name: "Global Excellence".to_string(),
        university_name: "Oxford".to_string(),
        ..ScholarshipInput::default()
    };
    let id = state
        .repo
        .create_scholarship(input.clone().into_scholarship())
        .await
        .unwrap();

    let Json(response) =
        scholarships::edit_scholarship(State(state.clone()), Path(id.to_hex()), AppJson(input))
            .await
            .unwrap();

    assert_eq!(response.message, "No changes were made");
}

// --- Stats ---

#[test]
async fn test_admin_stats_counts_categories() {
    let state = default_state();
    for category in [Some("Engineering"), Some("Engineering"), Some("Doctor"), None] {
        state
            .repo
            .create_scholarship(
                ScholarshipInput {
                    scholarship_name: "S".to_string(),
                    university_name: "U".to_string(),
                    subject_category: category.map(str::to_string),
                    ..ScholarshipInput::default()
                }
                .into_scholarship(),
            )
            .await
            .unwrap();
    }

    let Json(stats) = stats::admin_stats(State(state)).await.unwrap();

    assert_eq!(stats.scholarships, 4);
    assert_eq!(stats.users, 0);
    assert_eq!(stats.subject_categories.get("Engineering"), Some(&2));
    assert_eq!(stats.subject_categories.get("Doctor"), Some(&1));
    assert_eq!(stats.subject_categories.len(), 2);
}

// --- Payments ---

#[test]
async fn test_payment_intent_uses_minor_units() {
    let gateway = Arc::new(MockPaymentGateway::new());
    let state = create_test_state(gateway.clone());

    let Json(response) = payments::create_payment_intent(
        State(state),
        AppJson(PaymentIntentRequest {
            application_fees: 19.99,
        }),
    )
    .await
    .unwrap();

    assert_eq!(gateway.requests(), vec![(1999, "usd".to_string())]);
    assert_eq!(response.client_secret, "pi_mock_1999_secret_usd");
}

#[test]
async fn test_payment_intent_rejects_negative_amount() {
    let gateway = Arc::new(MockPaymentGateway::new());
    let state = create_test_state(gateway.clone());

    let result = payments::create_payment_intent(
        State(state),
        AppJson(PaymentIntentRequest {
            application_fees: -5.0,
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(gateway.requests().is_empty());
}

#[test]
async fn test_payment_gateway_failure_is_internal_error() {
    let state = create_test_state(Arc::new(MockPaymentGateway::new_failing()));

    let result = payments::create_payment_intent(
        State(state),
        AppJson(PaymentIntentRequest {
            application_fees: 10.0,
        }),
    )
    .await;

    let (status, message) = error_body(result.unwrap_err()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "internal server error");
}
