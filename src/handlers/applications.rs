use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use super::{AppJson, AppQuery, parse_object_id};
use crate::{
    AppState,
    errors::AppError,
    models::{
        Application, ApplicationEdit, ApplicationRequest, ApplicationStatus, FeedbackRequest,
        InsertResponse, MessageResponse, StatusUpdateRequest,
    },
    repository::UpdateOutcome,
};

/// ApplicationFilter
///
/// Query parameters of GET /apply-scholarships.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ApplicationFilter {
    /// Only return applications in this status. Empty means no filter; an
    /// unknown status matches nothing.
    pub status: Option<String>,
}

/// apply
///
/// [Authenticated Route] Stores a new application with status `pending`.
#[utoipa::path(
    post,
    path = "/apply-scholarship",
    request_body = ApplicationRequest,
    responses(
        (status = 200, description = "Submitted", body = InsertResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody)
    )
)]
pub async fn apply(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ApplicationRequest>,
) -> Result<Json<InsertResponse>, AppError> {
    payload.validate().map_err(AppError::BadRequest)?;
    let id = state
        .repo
        .create_application(payload.into_application())
        .await?;
    tracing::info!(application_id = %id, "application submitted");
    Ok(Json(InsertResponse::new(id)))
}

/// applications_by_student
///
/// [Authenticated Route] The path segment is the student's email.
#[utoipa::path(
    get,
    path = "/apply-scholarship/{email}",
    params(("email" = String, Path, description = "Student email")),
    responses((status = 200, description = "Applications", body = [Application]))
)]
pub async fn applications_by_student(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.repo.applications_by_student(&email).await?))
}

/// get_application
///
/// [Authenticated Route] Loads one application to pre-fill the edit form.
#[utoipa::path(
    get,
    path = "/edit-my-application/{id}",
    params(("id" = String, Path, description = "Application ObjectId (hex)")),
    responses(
        (status = 200, description = "Found", body = Application),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Application>, AppError> {
    let id = parse_object_id(&id)?;
    state
        .repo
        .get_application(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("application"))
}

/// delete_application
///
/// [Authenticated Route] A student withdrawing an application removes it.
#[utoipa::path(
    delete,
    path = "/my-application/{id}",
    params(("id" = String, Path, description = "Application ObjectId (hex)")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    if state.repo.delete_application(id).await? {
        Ok(Json(MessageResponse::ok("application deleted successfully")))
    } else {
        Err(AppError::not_found("application"))
    }
}

/// edit_application
///
/// [Public Route] Applies the student's profile edits. Refused with 409
/// while a moderator has the application in `processing`.
#[utoipa::path(
    patch,
    path = "/edit-my-application/{id}",
    params(("id" = String, Path, description = "Application ObjectId (hex)")),
    request_body = ApplicationEdit,
    responses(
        (status = 200, description = "Updated or unchanged", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody),
        (status = 409, description = "Application is processing", body = crate::errors::ErrorBody)
    )
)]
pub async fn edit_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ApplicationEdit>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    match state.repo.edit_application(id, payload).await? {
        UpdateOutcome::NotFound => Err(AppError::not_found("application")),
        UpdateOutcome::Locked => Err(AppError::Conflict(
            "cannot update once the application is processing".to_string(),
        )),
        UpdateOutcome::Unchanged => Ok(Json(MessageResponse::ok("No changes were made"))),
        UpdateOutcome::Updated => Ok(Json(MessageResponse::ok(
            "application updated successfully",
        ))),
    }
}

/// list_applications
///
/// [Public Route] All applications, optionally filtered by `?status=`.
#[utoipa::path(
    get,
    path = "/apply-scholarships",
    params(ApplicationFilter),
    responses((status = 200, description = "Applications", body = [Application]))
)]
pub async fn list_applications(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ApplicationFilter>,
) -> Result<Json<Vec<Application>>, AppError> {
    let status = match filter.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match ApplicationStatus::parse(raw) {
            Some(status) => Some(status),
            None => return Ok(Json(Vec::new())),
        },
    };
    Ok(Json(state.repo.list_applications(status).await?))
}

/// cancel_application
///
/// [Public Route] Student cancellation: moves any state to `rejected`.
#[utoipa::path(
    patch,
    path = "/apply-scholarship/cancel/{id}",
    params(("id" = String, Path, description = "Application ObjectId (hex)")),
    responses(
        (status = 200, description = "Cancelled", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn cancel_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    match state
        .repo
        .set_application_status(id, ApplicationStatus::Rejected)
        .await?
    {
        UpdateOutcome::NotFound => Err(AppError::not_found("application")),
        _ => Ok(Json(MessageResponse::ok("application cancelled"))),
    }
}

/// update_status
///
/// [Public Route] Moderator decision. Only pending, processing, completed and
/// reject are accepted; anything else is a 400 and nothing is written.
#[utoipa::path(
    patch,
    path = "/update-status/{id}",
    params(("id" = String, Path, description = "Application ObjectId (hex)")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status set", body = MessageResponse),
        (status = 400, description = "Invalid status value", body = crate::errors::ErrorBody),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<StatusUpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    let status = ApplicationStatus::from_review_decision(payload.status.trim())
        .ok_or_else(|| AppError::BadRequest("Invalid status value".to_string()))?;

    match state.repo.set_application_status(id, status).await? {
        UpdateOutcome::NotFound => Err(AppError::not_found("application")),
        _ => {
            tracing::info!(application_id = %id, status = status.as_str(), "application status set");
            Ok(Json(MessageResponse::ok(format!(
                "application status set to {}",
                status.as_str()
            ))))
        }
    }
}

/// add_feedback
///
/// [Public Route] Replaces any earlier feedback.
#[utoipa::path(
    patch,
    path = "/apply-scholarship/{id}/feedback",
    params(("id" = String, Path, description = "Application ObjectId (hex)")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback stored", body = MessageResponse),
        (status = 400, description = "Feedback is required", body = crate::errors::ErrorBody),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn add_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<FeedbackRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    let feedback = payload
        .feedback
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Feedback is required".to_string()))?;

    match state.repo.set_application_feedback(id, feedback).await? {
        UpdateOutcome::NotFound => Err(AppError::not_found("application")),
        _ => Ok(Json(MessageResponse::ok("Feedback submitted successfully"))),
    }
}
