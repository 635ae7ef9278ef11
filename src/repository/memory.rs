use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{RepoResult, Repository, RepositoryError, UpdateOutcome};
use crate::aggregation;
use crate::models::{
    AdminStats, Application, ApplicationEdit, ApplicationStatus, RatedScholarship, Review, Role,
    Scholarship, ScholarshipInput, User, UserStatus,
};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    scholarships: Vec<Scholarship>,
    applications: Vec<Application>,
    reviews: Vec<Review>,
}

/// MemoryRepository
///
/// An in-process implementation of `Repository` used by the integration tests
/// and for running the API without a database. Each operation holds the lock
/// for its whole read-check-write, so the conditional writes are atomic here
/// just as they are in MongoDB.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Collections>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: ObjectId, id_of: impl Fn(&T) -> Option<ObjectId>) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != Some(id));
    items.len() != before
}

/// Applies `change` to the document with `id` and reports what happened.
fn update_by_id<T: Clone + PartialEq>(
    items: &mut [T],
    id: ObjectId,
    id_of: impl Fn(&T) -> Option<ObjectId>,
    change: impl FnOnce(&mut T),
) -> UpdateOutcome {
    match items.iter_mut().find(|item| id_of(item) == Some(id)) {
        None => UpdateOutcome::NotFound,
        Some(item) => {
            let before = item.clone();
            change(item);
            if *item == before {
                UpdateOutcome::Unchanged
            } else {
                UpdateOutcome::Updated
            }
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn upsert_user(&self, mut user: User) -> RepoResult<User> {
        let mut db = self.inner.write().await;
        if let Some(existing) = db.users.iter().find(|u| u.email == user.email) {
            return Ok(existing.clone());
        }
        user.id = Some(ObjectId::new());
        db.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users_except(&self, email: &str) -> RepoResult<Vec<User>> {
        let db = self.inner.read().await;
        Ok(db.users.iter().filter(|u| u.email != email).cloned().collect())
    }

    async fn update_user_role(
        &self,
        email: &str,
        role: Role,
        status: Option<UserStatus>,
    ) -> RepoResult<UpdateOutcome> {
        let mut db = self.inner.write().await;
        let Some(user) = db.users.iter_mut().find(|u| u.email == email) else {
            return Ok(UpdateOutcome::NotFound);
        };
        let before = user.clone();
        user.role = role;
        if let Some(status) = status {
            user.status = status;
        }
        Ok(if *user == before {
            UpdateOutcome::Unchanged
        } else {
            UpdateOutcome::Updated
        })
    }

    async fn delete_user(&self, id: ObjectId) -> RepoResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_by_id(&mut db.users, id, |u| u.id))
    }

    async fn create_scholarship(&self, mut scholarship: Scholarship) -> RepoResult<ObjectId> {
        let id = ObjectId::new();
        scholarship.id = Some(id);
        self.inner.write().await.scholarships.push(scholarship);
        Ok(id)
    }

    async fn list_scholarships(&self, limit: i64) -> RepoResult<Vec<Scholarship>> {
        let db = self.inner.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(db.scholarships.iter().take(limit).cloned().collect())
    }

    async fn get_scholarship(&self, id: ObjectId) -> RepoResult<Option<Scholarship>> {
        let db = self.inner.read().await;
        Ok(db.scholarships.iter().find(|s| s.id == Some(id)).cloned())
    }

    async fn update_scholarship(
        &self,
        id: ObjectId,
        input: ScholarshipInput,
    ) -> RepoResult<UpdateOutcome> {
        let mut db = self.inner.write().await;
        Ok(update_by_id(&mut db.scholarships, id, |s| s.id, |s| s.apply(input)))
    }

    async fn delete_scholarship(&self, id: ObjectId) -> RepoResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_by_id(&mut db.scholarships, id, |s| s.id))
    }

    async fn top_scholarships(&self, limit: usize) -> RepoResult<Vec<RatedScholarship>> {
        let db = self.inner.read().await;
        Ok(aggregation::top_scholarships(
            db.scholarships.clone(),
            &db.reviews,
            limit,
        ))
    }

    async fn rated_scholarships(&self) -> RepoResult<Vec<RatedScholarship>> {
        let db = self.inner.read().await;
        Ok(aggregation::rated_scholarships(
            db.scholarships.clone(),
            &db.reviews,
        ))
    }

    async fn create_application(&self, mut application: Application) -> RepoResult<ObjectId> {
        let id = ObjectId::new();
        application.id = Some(id);
        self.inner.write().await.applications.push(application);
        Ok(id)
    }

    async fn applications_by_student(&self, email: &str) -> RepoResult<Vec<Application>> {
        let db = self.inner.read().await;
        Ok(db
            .applications
            .iter()
            .filter(|a| a.student.user_email == email)
            .cloned()
            .collect())
    }

    async fn get_application(&self, id: ObjectId) -> RepoResult<Option<Application>> {
        let db = self.inner.read().await;
        Ok(db.applications.iter().find(|a| a.id == Some(id)).cloned())
    }

    async fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> RepoResult<Vec<Application>> {
        let db = self.inner.read().await;
        Ok(db
            .applications
            .iter()
            .filter(|a| status.is_none_or(|wanted| a.status == wanted))
            .cloned()
            .collect())
    }

    async fn delete_application(&self, id: ObjectId) -> RepoResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_by_id(&mut db.applications, id, |a| a.id))
    }

    async fn edit_application(
        &self,
        id: ObjectId,
        edit: ApplicationEdit,
    ) -> RepoResult<UpdateOutcome> {
        let mut db = self.inner.write().await;
        let locked = db
            .applications
            .iter()
            .any(|a| a.id == Some(id) && !a.status.allows_student_edits());
        if locked {
            return Ok(UpdateOutcome::Locked);
        }
        Ok(update_by_id(&mut db.applications, id, |a| a.id, |a| a.apply(edit)))
    }

    async fn set_application_status(
        &self,
        id: ObjectId,
        status: ApplicationStatus,
    ) -> RepoResult<UpdateOutcome> {
        let mut db = self.inner.write().await;
        Ok(update_by_id(&mut db.applications, id, |a| a.id, |a| a.status = status))
    }

    async fn set_application_feedback(
        &self,
        id: ObjectId,
        feedback: String,
    ) -> RepoResult<UpdateOutcome> {
        let mut db = self.inner.write().await;
        Ok(update_by_id(&mut db.applications, id, |a| a.id, |a| {
            a.feedback = Some(feedback)
        }))
    }

    async fn find_review(
        &self,
        user_email: &str,
        scholarship_id: &str,
    ) -> RepoResult<Option<Review>> {
        let db = self.inner.read().await;
        Ok(db
            .reviews
            .iter()
            .find(|r| r.user_email == user_email && r.scholarship_id == scholarship_id)
            .cloned())
    }

    /// Enforces the same (userEmail, scholarshipId) uniqueness as the MongoDB index.
    async fn insert_review(&self, mut review: Review) -> RepoResult<ObjectId> {
        let mut db = self.inner.write().await;
        let taken = db.reviews.iter().any(|r| {
            r.user_email == review.user_email && r.scholarship_id == review.scholarship_id
        });
        if taken {
            return Err(RepositoryError::Duplicate);
        }
        let id = ObjectId::new();
        review.id = Some(id);
        db.reviews.push(review);
        Ok(id)
    }

    async fn reviews_for_scholarship(&self, scholarship_id: &str) -> RepoResult<Vec<Review>> {
        let db = self.inner.read().await;
        Ok(db
            .reviews
            .iter()
            .filter(|r| r.scholarship_id == scholarship_id)
            .cloned()
            .collect())
    }

    async fn reviews_by_user(&self, email: &str) -> RepoResult<Vec<Review>> {
        let db = self.inner.read().await;
        Ok(db
            .reviews
            .iter()
            .filter(|r| r.user_email == email)
            .cloned()
            .collect())
    }

    async fn all_reviews(&self) -> RepoResult<Vec<Review>> {
        Ok(self.inner.read().await.reviews.clone())
    }

    async fn delete_review(&self, id: ObjectId) -> RepoResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_by_id(&mut db.reviews, id, |r| r.id))
    }

    async fn admin_stats(&self) -> RepoResult<AdminStats> {
        let db = self.inner.read().await;
        Ok(AdminStats {
            users: db.users.len() as u64,
            applications: db.applications.len() as u64,
            scholarships: db.scholarships.len() as u64,
            reviews: db.reviews.len() as u64,
            subject_categories: aggregation::subject_category_counts(&db.scholarships),
        })
    }
}
