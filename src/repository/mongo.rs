use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc, oid::ObjectId},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    results::UpdateResult,
};
use serde::de::DeserializeOwned;

use super::{RepoResult, Repository, RepositoryError, UpdateOutcome};
use crate::aggregation;
use crate::models::{
    AdminStats, Application, ApplicationEdit, ApplicationStatus, RatedScholarship, Review, Role,
    Scholarship, ScholarshipInput, User, UserStatus,
};

const DUPLICATE_KEY: i32 = 11000;

impl From<MongoError> for RepositoryError {
    fn from(err: MongoError) -> Self {
        // Inserts report the violation as a write error, upserts as a command error.
        let code = match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
            ErrorKind::Command(command_error) => Some(command_error.code),
            _ => None,
        };
        if code == Some(DUPLICATE_KEY) {
            return RepositoryError::Duplicate;
        }
        RepositoryError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for RepositoryError {
    fn from(err: bson::ser::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for RepositoryError {
    fn from(err: bson::de::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

fn outcome(result: &UpdateResult) -> UpdateOutcome {
    if result.matched_count == 0 {
        UpdateOutcome::NotFound
    } else if result.modified_count == 0 {
        UpdateOutcome::Unchanged
    } else {
        UpdateOutcome::Updated
    }
}

fn inserted_object_id(id: Bson) -> RepoResult<ObjectId> {
    id.as_object_id()
        .ok_or_else(|| RepositoryError::Serialization(format!("unexpected inserted id {id}")))
}

fn count_value(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        _ => 0,
    }
}

/// MongoRepository
///
/// The concrete implementation of the `Repository` trait, backed by MongoDB.
/// Collection names match the documents the frontend already reads.
pub struct MongoRepository {
    users: Collection<User>,
    scholarships: Collection<Scholarship>,
    applications: Collection<Application>,
    reviews: Collection<Review>,
}

impl MongoRepository {
    /// Binds the typed collections of an already connected database.
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
            scholarships: db.collection("scholarships"),
            applications: db.collection("applyScholarships"),
            reviews: db.collection("reviews"),
        }
    }

    /// ensure_indexes
    ///
    /// Creates the unique (userEmail, scholarshipId) index that backs review
    /// de-duplication, and the unique email index on users. Index creation is
    /// idempotent, so this runs on every startup.
    pub async fn ensure_indexes(&self) -> RepoResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.reviews
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userEmail": 1, "scholarshipId": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        Ok(())
    }

    async fn aggregate_into<T: DeserializeOwned>(
        &self,
        pipeline: Vec<Document>,
    ) -> RepoResult<Vec<T>> {
        let documents: Vec<Document> = self
            .scholarships
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;
        documents
            .into_iter()
            .map(|document| bson::from_document(document).map_err(RepositoryError::from))
            .collect()
    }
}

#[async_trait]
impl Repository for MongoRepository {
    /// upsert_user
    ///
    /// One `find_one_and_update` with `$setOnInsert`, so two concurrent
    /// first sign-ins cannot create two documents for the same email.
    async fn upsert_user(&self, user: User) -> RepoResult<User> {
        let mut on_insert = bson::to_document(&user)?;
        on_insert.remove("email");

        self.users
            .find_one_and_update(
                doc! { "email": user.email.as_str() },
                doc! { "$setOnInsert": on_insert },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| RepositoryError::Database("upsert returned no document".to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn list_users_except(&self, email: &str) -> RepoResult<Vec<User>> {
        let users = self
            .users
            .find(doc! { "email": { "$ne": email } })
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    async fn update_user_role(
        &self,
        email: &str,
        role: Role,
        status: Option<UserStatus>,
    ) -> RepoResult<UpdateOutcome> {
        let mut set = doc! { "role": role.as_str() };
        if let Some(status) = status {
            set.insert("status", status.as_str());
        }
        let result = self
            .users
            .update_one(doc! { "email": email }, doc! { "$set": set })
            .await?;
        Ok(outcome(&result))
    }

    async fn delete_user(&self, id: ObjectId) -> RepoResult<bool> {
        let result = self.users.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn create_scholarship(&self, scholarship: Scholarship) -> RepoResult<ObjectId> {
        let result = self.scholarships.insert_one(scholarship).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn list_scholarships(&self, limit: i64) -> RepoResult<Vec<Scholarship>> {
        let scholarships = self
            .scholarships
            .find(doc! {})
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(scholarships)
    }

    async fn get_scholarship(&self, id: ObjectId) -> RepoResult<Option<Scholarship>> {
        Ok(self.scholarships.find_one(doc! { "_id": id }).await?)
    }

    async fn update_scholarship(
        &self,
        id: ObjectId,
        input: ScholarshipInput,
    ) -> RepoResult<UpdateOutcome> {
        let set = bson::to_document(&input)?;
        let result = self
            .scholarships
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(outcome(&result))
    }

    async fn delete_scholarship(&self, id: ObjectId) -> RepoResult<bool> {
        let result = self.scholarships.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn top_scholarships(&self, limit: usize) -> RepoResult<Vec<RatedScholarship>> {
        self.aggregate_into(aggregation::top_scholarships_pipeline(limit))
            .await
    }

    async fn rated_scholarships(&self) -> RepoResult<Vec<RatedScholarship>> {
        self.aggregate_into(aggregation::rated_scholarships_pipeline())
            .await
    }

    async fn create_application(&self, application: Application) -> RepoResult<ObjectId> {
        let result = self.applications.insert_one(application).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn applications_by_student(&self, email: &str) -> RepoResult<Vec<Application>> {
        let applications = self
            .applications
            .find(doc! { "student.userEmail": email })
            .await?
            .try_collect()
            .await?;
        Ok(applications)
    }

    async fn get_application(&self, id: ObjectId) -> RepoResult<Option<Application>> {
        Ok(self.applications.find_one(doc! { "_id": id }).await?)
    }

    async fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> RepoResult<Vec<Application>> {
        let filter = match status {
            Some(status) => doc! { "status": status.as_str() },
            None => doc! {},
        };
        let applications = self
            .applications
            .find(filter)
            .await?
            .try_collect()
            .await?;
        Ok(applications)
    }

    async fn delete_application(&self, id: ObjectId) -> RepoResult<bool> {
        let result = self.applications.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// edit_application
    ///
    /// The filter carries the status guard, so the write never lands on a
    /// processing application. When nothing matches, a follow-up read tells
    /// a missing document apart from a locked one.
    async fn edit_application(
        &self,
        id: ObjectId,
        edit: ApplicationEdit,
    ) -> RepoResult<UpdateOutcome> {
        let set = bson::to_document(&edit)?;

        if !set.is_empty() {
            let guarded = doc! {
                "_id": id,
                "status": { "$ne": ApplicationStatus::Processing.as_str() },
            };
            let result = self
                .applications
                .update_one(guarded, doc! { "$set": set })
                .await?;
            if result.matched_count > 0 {
                return Ok(outcome(&result));
            }
        }

        Ok(match self.get_application(id).await? {
            None => UpdateOutcome::NotFound,
            Some(current) if !current.status.allows_student_edits() => UpdateOutcome::Locked,
            Some(_) => UpdateOutcome::Unchanged,
        })
    }

    async fn set_application_status(
        &self,
        id: ObjectId,
        status: ApplicationStatus,
    ) -> RepoResult<UpdateOutcome> {
        let result = self
            .applications
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .await?;
        Ok(outcome(&result))
    }

    async fn set_application_feedback(
        &self,
        id: ObjectId,
        feedback: String,
    ) -> RepoResult<UpdateOutcome> {
        let result = self
            .applications
            .update_one(doc! { "_id": id }, doc! { "$set": { "feedback": feedback } })
            .await?;
        Ok(outcome(&result))
    }

    async fn find_review(
        &self,
        user_email: &str,
        scholarship_id: &str,
    ) -> RepoResult<Option<Review>> {
        Ok(self
            .reviews
            .find_one(doc! { "userEmail": user_email, "scholarshipId": scholarship_id })
            .await?)
    }

    async fn insert_review(&self, review: Review) -> RepoResult<ObjectId> {
        let result = self.reviews.insert_one(review).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn reviews_for_scholarship(&self, scholarship_id: &str) -> RepoResult<Vec<Review>> {
        let reviews = self
            .reviews
            .find(doc! { "scholarshipId": scholarship_id })
            .await?
            .try_collect()
            .await?;
        Ok(reviews)
    }

    async fn reviews_by_user(&self, email: &str) -> RepoResult<Vec<Review>> {
        let reviews = self
            .reviews
            .find(doc! { "userEmail": email })
            .await?
            .try_collect()
            .await?;
        Ok(reviews)
    }

    async fn all_reviews(&self) -> RepoResult<Vec<Review>> {
        let reviews = self.reviews.find(doc! {}).await?.try_collect().await?;
        Ok(reviews)
    }

    async fn delete_review(&self, id: ObjectId) -> RepoResult<bool> {
        let result = self.reviews.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// admin_stats
    ///
    /// Collection totals use the metadata-based estimated count; the category
    /// breakdown is a `$group` over non-null `subjectCategory` values.
    async fn admin_stats(&self) -> RepoResult<AdminStats> {
        let users = self.users.estimated_document_count().await?;
        let applications = self.applications.estimated_document_count().await?;
        let scholarships = self.scholarships.estimated_document_count().await?;
        let reviews = self.reviews.estimated_document_count().await?;

        let rows: Vec<Document> = self
            .scholarships
            .aggregate(aggregation::subject_category_pipeline())
            .await?
            .try_collect()
            .await?;

        let subject_categories = rows
            .iter()
            .filter_map(|row| {
                let category = row.get_str("subjectCategory").ok()?;
                Some((category.to_string(), count_value(row.get("count"))))
            })
            .collect();

        Ok(AdminStats {
            users,
            applications,
            scholarships,
            reviews,
            subject_categories,
        })
    }
}
