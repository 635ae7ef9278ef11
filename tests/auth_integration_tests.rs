use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use scholarship_portal::{
    AppState, MemoryRepository, MockPaymentGateway,
    auth::{self, AuthUser, Claims},
    config::{AppConfig, Env},
    errors::AppError,
    models::{Role, User},
    repository::RepositoryState,
};
use std::{sync::Arc, time::SystemTime};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_EMAIL: &str = "student@example.com";

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(email: &str, iat: u64, exp: u64, secret: &str) -> String {
    let claims = Claims {
        email: email.to_string(),
        iat,
        exp,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env, repo: MemoryRepository) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        repo: Arc::new(repo),
        payments: Arc::new(MockPaymentGateway::new()),
        config,
    }
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
}

async fn seed_user(repo: &RepositoryState, email: &str, role: Role) {
    repo.upsert_user(User {
        email: email.to_string(),
        role,
        ..User::default()
    })
    .await
    .unwrap();
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let now = now_secs();
    let token = create_token(TEST_EMAIL, now, now + 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production, MemoryRepository::new());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    assert_eq!(auth_user.unwrap().email, TEST_EMAIL);
}

#[tokio::test]
async fn test_issued_token_is_accepted() {
    let app_state = create_app_state(Env::Production, MemoryRepository::new());
    let token = auth::issue_token(&app_state.config, TEST_EMAIL).unwrap();

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap().email, TEST_EMAIL);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(Env::Production, MemoryRepository::new());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_wrong_signature() {
    let now = now_secs();
    let token = create_token(TEST_EMAIL, now, now + 3600, "some-other-secret");
    let app_state = create_app_state(Env::Production, MemoryRepository::new());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    // Well past the default 60 second leeway.
    let now = now_secs();
    let token = create_token(TEST_EMAIL, now - 7200, now - 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production, MemoryRepository::new());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_without_bearer_prefix() {
    let now = now_secs();
    let token = create_token(TEST_EMAIL, now, now + 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production, MemoryRepository::new());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&token).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_local_bypass_success() {
    let app_state = create_app_state(Env::Local, MemoryRepository::new());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(auth::LOCAL_IDENTITY_HEADER),
        header::HeaderValue::from_static("local@dev.com"),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap().email, "local@dev.com");
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let app_state = create_app_state(Env::Production, MemoryRepository::new());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // Provide ONLY the local bypass header
    parts.headers.insert(
        header::HeaderName::from_static(auth::LOCAL_IDENTITY_HEADER),
        header::HeaderValue::from_static("local@dev.com"),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(AppError::Unauthorized)));
}

// --- Role Checks ---

#[tokio::test]
async fn test_authorize_accepts_allowed_role() {
    let app_state = create_app_state(Env::Production, MemoryRepository::new());
    seed_user(&app_state.repo, "mod@example.com", Role::Moderator).await;
    let caller = AuthUser {
        email: "mod@example.com".to_string(),
    };

    let user = auth::authorize(&app_state.repo, &caller, &[Role::Moderator, Role::Admin])
        .await
        .unwrap();

    assert_eq!(user.role, Role::Moderator);
}

#[tokio::test]
async fn test_authorize_rejects_student_on_admin_route() {
    let app_state = create_app_state(Env::Production, MemoryRepository::new());
    seed_user(&app_state.repo, TEST_EMAIL, Role::Student).await;
    let caller = AuthUser {
        email: TEST_EMAIL.to_string(),
    };

    let result = auth::authorize(&app_state.repo, &caller, &[Role::Admin]).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_authorize_rejects_unknown_user() {
    let app_state = create_app_state(Env::Production, MemoryRepository::new());
    let caller = AuthUser {
        email: "ghost@example.com".to_string(),
    };

    let result = auth::authorize(&app_state.repo, &caller, &[Role::Admin]).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
