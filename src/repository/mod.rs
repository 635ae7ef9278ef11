use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{
    AdminStats, Application, ApplicationEdit, ApplicationStatus, RatedScholarship, Review, Role,
    Scholarship, ScholarshipInput, User, UserStatus,
};

mod memory;
mod mongo;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;

/// RepositoryError
///
/// Failures surfaced by a repository implementation. Missing documents are not
/// errors; they are reported through `Option`, `bool` or [`UpdateOutcome`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate document")]
    Duplicate,
    #[error("database error: {0}")]
    Database(String),
    #[error("document mapping error: {0}")]
    Serialization(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// UpdateOutcome
///
/// Result of a single-document update, mirroring the matched/modified counts
/// the store reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No document has the given id.
    NotFound,
    /// The document exists but its state forbids the write. Only produced by
    /// [`Repository::edit_application`] while the application is processing.
    Locked,
    /// The document matched but already held the written values.
    Unchanged,
    Updated,
}

/// Repository Trait
///
/// Persistence contract over the four collections (users, scholarships,
/// applications, reviews) plus the aggregation views. Handlers only see
/// `Arc<dyn Repository>`, so the MongoDB store and the in-memory store are
/// interchangeable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    /// Inserts the user (role student) unless one with the same email exists,
    /// and returns the stored document either way.
    async fn upsert_user(&self, user: User) -> RepoResult<User>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn list_users_except(&self, email: &str) -> RepoResult<Vec<User>>;
    async fn update_user_role(
        &self,
        email: &str,
        role: Role,
        status: Option<UserStatus>,
    ) -> RepoResult<UpdateOutcome>;
    async fn delete_user(&self, id: ObjectId) -> RepoResult<bool>;

    // --- Scholarships ---
    async fn create_scholarship(&self, scholarship: Scholarship) -> RepoResult<ObjectId>;
    async fn list_scholarships(&self, limit: i64) -> RepoResult<Vec<Scholarship>>;
    async fn get_scholarship(&self, id: ObjectId) -> RepoResult<Option<Scholarship>>;
    /// Full-field replacement of every editable field.
    async fn update_scholarship(
        &self,
        id: ObjectId,
        input: ScholarshipInput,
    ) -> RepoResult<UpdateOutcome>;
    async fn delete_scholarship(&self, id: ObjectId) -> RepoResult<bool>;
    async fn top_scholarships(&self, limit: usize) -> RepoResult<Vec<RatedScholarship>>;
    async fn rated_scholarships(&self) -> RepoResult<Vec<RatedScholarship>>;

    // --- Applications ---
    async fn create_application(&self, application: Application) -> RepoResult<ObjectId>;
    async fn applications_by_student(&self, email: &str) -> RepoResult<Vec<Application>>;
    async fn get_application(&self, id: ObjectId) -> RepoResult<Option<Application>>;
    async fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> RepoResult<Vec<Application>>;
    async fn delete_application(&self, id: ObjectId) -> RepoResult<bool>;
    /// Applies a student profile edit unless the application is processing.
    /// The status check and the write are a single conditional update.
    async fn edit_application(
        &self,
        id: ObjectId,
        edit: ApplicationEdit,
    ) -> RepoResult<UpdateOutcome>;
    async fn set_application_status(
        &self,
        id: ObjectId,
        status: ApplicationStatus,
    ) -> RepoResult<UpdateOutcome>;
    async fn set_application_feedback(
        &self,
        id: ObjectId,
        feedback: String,
    ) -> RepoResult<UpdateOutcome>;

    // --- Reviews ---
    async fn find_review(&self, user_email: &str, scholarship_id: &str)
    -> RepoResult<Option<Review>>;
    /// Fails with [`RepositoryError::Duplicate`] when the (author, scholarship)
    /// pair already has a review.
    async fn insert_review(&self, review: Review) -> RepoResult<ObjectId>;
    async fn reviews_for_scholarship(&self, scholarship_id: &str) -> RepoResult<Vec<Review>>;
    async fn reviews_by_user(&self, email: &str) -> RepoResult<Vec<Review>>;
    async fn all_reviews(&self) -> RepoResult<Vec<Review>>;
    async fn delete_review(&self, id: ObjectId) -> RepoResult<bool>;

    // --- Statistics ---
    async fn admin_stats(&self) -> RepoResult<AdminStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
