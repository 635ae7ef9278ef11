use axum::{
    Json,
    extract::{Path, State},
};

use super::{AppJson, parse_object_id};
use crate::{
    AppState,
    auth,
    errors::AppError,
    models::{
        MessageResponse, Role, RoleResponse, TokenRequest, TokenResponse, UpdateRoleRequest, User,
        UserStatus, UserUpsertRequest,
    },
    repository::UpdateOutcome,
};

/// issue_token
///
/// [Public Route] Signs an access token for the posted email. The frontend
/// calls this right after its identity provider signs the user in.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Signed token", body = TokenResponse),
        (status = 400, description = "Missing email", body = crate::errors::ErrorBody)
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }
    let token = auth::issue_token(&state.config, email)?;
    Ok(Json(TokenResponse { token }))
}

/// upsert_user
///
/// [Public Route] Creates the user on first sign-in with role `student`. An
/// existing user is returned untouched.
#[utoipa::path(
    post,
    path = "/users/{email}",
    params(("email" = String, Path, description = "User email")),
    request_body = UserUpsertRequest,
    responses((status = 200, description = "Stored user", body = User))
)]
pub async fn upsert_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    AppJson(payload): AppJson<UserUpsertRequest>,
) -> Result<Json<User>, AppError> {
    let user = User {
        id: None,
        email,
        name: payload.name,
        image: payload.image,
        role: Role::Student,
        status: UserStatus::None,
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    let stored = state.repo.upsert_user(user).await?;
    Ok(Json(stored))
}

/// get_user_role
///
/// [Public Route] Returns `{ "role": null }` for an unknown email.
#[utoipa::path(
    get,
    path = "/users/role/{email}",
    params(("email" = String, Path, description = "User email")),
    responses((status = 200, description = "Stored role", body = RoleResponse))
)]
pub async fn get_user_role(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>, AppError> {
    let user = state.repo.find_user_by_email(&email).await?;
    Ok(Json(RoleResponse {
        role: user.map(|u| u.role),
    }))
}

/// list_users
///
/// [Admin Route] Every user except the one named in the path (the caller's
/// own row is hidden from the management table).
#[utoipa::path(
    get,
    path = "/all-users/{email}",
    params(("email" = String, Path, description = "Email to exclude")),
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 403, description = "Not an admin", body = crate::errors::ErrorBody)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.repo.list_users_except(&email).await?))
}

/// update_user_role
///
/// [Admin Route] Sets the role, and the request status when one is given.
#[utoipa::path(
    patch,
    path = "/user/role/{email}",
    params(("email" = String, Path, description = "User email")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 404, description = "No such user", body = crate::errors::ErrorBody)
    )
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(email): Path<String>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    match state
        .repo
        .update_user_role(&email, payload.role, payload.status)
        .await?
    {
        UpdateOutcome::NotFound => Err(AppError::not_found("user")),
        UpdateOutcome::Unchanged => Ok(Json(MessageResponse::ok("No changes were made"))),
        _ => {
            tracing::info!(%email, role = payload.role.as_str(), "user role updated");
            Ok(Json(MessageResponse::ok("user role updated successfully")))
        }
    }
}

/// delete_user
///
/// [Admin Route]
#[utoipa::path(
    delete,
    path = "/user/{id}",
    params(("id" = String, Path, description = "User ObjectId (hex)")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "No such user", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    if state.repo.delete_user(id).await? {
        Ok(Json(MessageResponse::ok("user deleted successfully")))
    } else {
        Err(AppError::not_found("user"))
    }
}
