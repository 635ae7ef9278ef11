//! Request handlers, one module per resource. Every handler returns
//! `Result<_, AppError>` and performs a single repository operation or a short
//! aggregation.

use axum::extract::{FromRequest, FromRequestParts};
use mongodb::bson::oid::ObjectId;

use crate::errors::AppError;

pub mod applications;
pub mod payments;
pub mod reviews;
pub mod scholarships;
pub mod stats;
pub mod users;

/// Parses a 24-character hex path segment. Malformed ids are a client error.
pub(crate) fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::BadRequest(format!("invalid id: {raw}")))
}

/// JSON body extractor whose rejections render as `AppError` (400 with a
/// `{ "message" }` body) instead of axum's plain-text 415/422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string extractor with the same rejection mapping as [`AppJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
