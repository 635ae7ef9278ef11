use std::collections::BTreeMap;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Serde Helpers ---

/// serialize_object_id
///
/// Documents are keyed by a store-generated ObjectId. Clients only ever see the
/// 24-character hex form, so the id is written as a plain string. Ids are never
/// serialized back into the store (inserts skip `None`, updates use `$set`).
fn serialize_object_id<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(oid) => serializer.serialize_str(&oid.to_hex()),
        None => serializer.serialize_none(),
    }
}

/// Accepts either a JSON/BSON number or a numeric string ("4", " 19.99").
/// Form inputs on the frontend submit numbers as text.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    fn parse<E: Error>(value: NumberOrText) -> Result<f64, E> {
        match value {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("expected a number, got {text:?}"))),
        }
    }

    pub fn f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(NumberOrText::deserialize(deserializer)?)
    }

    pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<NumberOrText>::deserialize(deserializer)?
            .map(parse)
            .transpose()
    }
}

// --- Users ---

/// Role
///
/// The RBAC field stored on every user document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

/// UserStatus
///
/// `Requested` marks a student who asked to be promoted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[ts(export)]
pub enum UserStatus {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "Requested")]
    Requested,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::None => "none",
            UserStatus::Requested => "Requested",
        }
    }
}

/// User
///
/// Canonical identity record in the `users` collection. Email is the identity key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_object_id"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    /// Creation time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,
}

// --- Scholarships ---

/// ScholarshipInput
///
/// Body of both the create (POST /scholarships) and the full-field edit
/// (PUT /edit-manage-scholarship/{id}) endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScholarshipInput {
    pub scholarship_name: String,
    pub university_name: String,
    #[serde(default)]
    pub university_country: Option<String>,
    #[serde(default)]
    pub university_city: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub university_rank: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub tuition_fees: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub application_fees: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub service_charge: f64,
    #[serde(default)]
    pub subject_category: Option<String>,
    #[serde(default)]
    pub scholarship_category: Option<String>,
    #[serde(default)]
    pub degree_category: Option<String>,
    /// ISO date (YYYY-MM-DD); ordering relies on lexicographic comparison.
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub posted_user_email: Option<String>,
}

impl ScholarshipInput {
    /// Rejects payloads missing the fields every listing displays.
    pub fn validate(&self) -> Result<(), String> {
        if self.scholarship_name.trim().is_empty() {
            return Err("scholarshipName is required".to_string());
        }
        if self.university_name.trim().is_empty() {
            return Err("universityName is required".to_string());
        }
        if !self.application_fees.is_finite() || self.application_fees < 0.0 {
            return Err("applicationFees must be a non-negative number".to_string());
        }
        Ok(())
    }

    pub fn into_scholarship(self) -> Scholarship {
        Scholarship {
            id: None,
            scholarship_name: self.scholarship_name,
            university_name: self.university_name,
            university_country: self.university_country,
            university_city: self.university_city,
            university_rank: self.university_rank,
            tuition_fees: self.tuition_fees,
            application_fees: self.application_fees,
            service_charge: self.service_charge,
            subject_category: self.subject_category,
            scholarship_category: self.scholarship_category,
            degree_category: self.degree_category,
            post_date: self.post_date,
            application_deadline: self.application_deadline,
            image: self.image,
            posted_user_email: self.posted_user_email,
        }
    }
}

/// Scholarship
///
/// A document in the `scholarships` collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Scholarship {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_object_id"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub scholarship_name: String,
    #[serde(default)]
    pub university_name: String,
    #[serde(default)]
    pub university_country: Option<String>,
    #[serde(default)]
    pub university_city: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub university_rank: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub tuition_fees: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub application_fees: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub service_charge: f64,
    #[serde(default)]
    pub subject_category: Option<String>,
    #[serde(default)]
    pub scholarship_category: Option<String>,
    #[serde(default)]
    pub degree_category: Option<String>,
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub posted_user_email: Option<String>,
}

impl Scholarship {
    /// Overwrites every editable field, keeping the id.
    pub fn apply(&mut self, input: ScholarshipInput) {
        let id = self.id;
        *self = input.into_scholarship();
        self.id = id;
    }
}

/// RatedScholarship
///
/// Listing projection joined with the average rating of its reviews.
/// `average_rating` is `null` for scholarships nobody has reviewed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RatedScholarship {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_object_id"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub scholarship_name: String,
    #[serde(default)]
    pub university_name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub university_country: Option<String>,
    #[serde(default)]
    pub university_city: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub university_rank: Option<f64>,
    #[serde(default)]
    pub subject_category: Option<String>,
    #[serde(default)]
    pub scholarship_category: Option<String>,
    #[serde(default)]
    pub degree_category: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub tuition_fees: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub application_fees: f64,
    #[serde(default)]
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

// --- Applications ---

/// ApplicationStatus
///
/// Workflow: pending -> processing -> completed | reject. A student cancel
/// moves any state to `rejected`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Reject,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Processing => "processing",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Reject => "reject",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Any stored status, by its wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rejected" => Some(ApplicationStatus::Rejected),
            other => Self::from_review_decision(other),
        }
    }

    /// Statuses a moderator may set through PATCH /update-status/{id}.
    /// `rejected` is reserved for the student cancel path.
    pub fn from_review_decision(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "processing" => Some(ApplicationStatus::Processing),
            "completed" => Some(ApplicationStatus::Completed),
            "reject" => Some(ApplicationStatus::Reject),
            _ => None,
        }
    }

    /// Profile edits are frozen while a moderator is working on the application.
    pub fn allows_student_edits(&self) -> bool {
        *self != ApplicationStatus::Processing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudentInfo {
    #[serde(default)]
    pub user_name: Option<String>,
    pub user_email: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudentAddress {
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Application
///
/// A document in the `applyScholarships` collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Application {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_object_id"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string")]
    pub id: Option<ObjectId>,
    /// Hex id of the scholarship applied to.
    pub scholarship_id: String,
    pub student: StudentInfo,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub student_address: Option<StudentAddress>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub ssc_result: Option<String>,
    #[serde(default)]
    pub hsc_result: Option<String>,
    #[serde(default)]
    pub study_gap: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
    #[serde(default)]
    pub scholarship_category: Option<String>,
    #[serde(default)]
    pub subject_category: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub application_fees: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub service_charge: Option<f64>,
    #[serde(default)]
    pub applied_date: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl Application {
    /// Copies the provided profile fields over the stored ones.
    pub fn apply(&mut self, edit: ApplicationEdit) {
        let ApplicationEdit {
            phone,
            photo,
            student_address,
            gender,
            degree,
            ssc_result,
            hsc_result,
            study_gap,
        } = edit;
        if phone.is_some() {
            self.phone = phone;
        }
        if photo.is_some() {
            self.photo = photo;
        }
        if student_address.is_some() {
            self.student_address = student_address;
        }
        if gender.is_some() {
            self.gender = gender;
        }
        if degree.is_some() {
            self.degree = degree;
        }
        if ssc_result.is_some() {
            self.ssc_result = ssc_result;
        }
        if hsc_result.is_some() {
            self.hsc_result = hsc_result;
        }
        if study_gap.is_some() {
            self.study_gap = study_gap;
        }
    }
}

/// ApplicationRequest
///
/// Body of POST /apply-scholarship. Status and feedback are server-controlled.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApplicationRequest {
    pub scholarship_id: String,
    pub student: StudentInfo,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub student_address: Option<StudentAddress>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub ssc_result: Option<String>,
    #[serde(default)]
    pub hsc_result: Option<String>,
    #[serde(default)]
    pub study_gap: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
    #[serde(default)]
    pub scholarship_category: Option<String>,
    #[serde(default)]
    pub subject_category: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub application_fees: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub service_charge: Option<f64>,
    #[serde(default)]
    pub applied_date: Option<String>,
}

impl ApplicationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.scholarship_id.trim().is_empty() {
            return Err("scholarshipId is required".to_string());
        }
        if self.student.user_email.trim().is_empty() {
            return Err("student.userEmail is required".to_string());
        }
        Ok(())
    }

    pub fn into_application(self) -> Application {
        Application {
            id: None,
            scholarship_id: self.scholarship_id,
            student: self.student,
            phone: self.phone,
            photo: self.photo,
            student_address: self.student_address,
            gender: self.gender,
            degree: self.degree,
            ssc_result: self.ssc_result,
            hsc_result: self.hsc_result,
            study_gap: self.study_gap,
            university_name: self.university_name,
            scholarship_category: self.scholarship_category,
            subject_category: self.subject_category,
            application_fees: self.application_fees,
            service_charge: self.service_charge,
            applied_date: self.applied_date,
            status: ApplicationStatus::Pending,
            feedback: None,
        }
    }
}

/// ApplicationEdit
///
/// Partial update payload for PATCH /edit-my-application/{id}. Only the
/// fields present in the request are written.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApplicationEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_address: Option<StudentAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssc_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsc_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_gap: Option<String>,
}

// --- Reviews ---

/// Review
///
/// A document in the `reviews` collection. `scholarship_id` is the hex id of
/// the reviewed scholarship, kept as a string for wire compatibility.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Review {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_object_id"
    )]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string")]
    pub id: Option<ObjectId>,
    pub scholarship_id: String,
    pub user_email: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    #[serde(deserialize_with = "lenient::f64")]
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub review_date: Option<String>,
    #[serde(default)]
    pub scholarship_name: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
}

/// ReviewRequest
///
/// Body of POST /add-review.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReviewRequest {
    pub scholarship_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    #[serde(deserialize_with = "lenient::f64")]
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub review_date: Option<String>,
    #[serde(default)]
    pub scholarship_name: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
}

impl ReviewRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.scholarship_id.trim().is_empty() {
            return Err("scholarshipId is required".to_string());
        }
        if self.user_email.trim().is_empty() {
            return Err("userEmail is required".to_string());
        }
        if !self.rating.is_finite() {
            return Err("rating must be a number".to_string());
        }
        Ok(())
    }

    pub fn into_review(self) -> Review {
        Review {
            id: None,
            scholarship_id: self.scholarship_id,
            user_email: self.user_email,
            user_name: self.user_name,
            user_image: self.user_image,
            rating: self.rating,
            comment: self.comment,
            review_date: self.review_date,
            scholarship_name: self.scholarship_name,
            university_name: self.university_name,
        }
    }
}

// --- Request Payloads ---

/// TokenRequest
///
/// Body of POST /jwt. The email becomes the single identity claim.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenRequest {
    pub email: String,
}

/// UserUpsertRequest
///
/// Profile data sent on first sign-in (POST /users/{email}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserUpsertRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// UpdateRoleRequest
///
/// Body of PATCH /user/role/{email}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

/// StatusUpdateRequest
///
/// The status arrives as free text and is checked against the review-decision
/// whitelist, so an unknown value yields a 400 with a message instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentIntentRequest {
    #[serde(deserialize_with = "lenient::f64")]
    pub application_fees: f64,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleResponse {
    pub role: Option<Role>,
}

/// InsertResponse
///
/// Acknowledgement returned by every create endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResponse {
    pub fn new(id: ObjectId) -> Self {
        Self {
            acknowledged: true,
            inserted_id: id.to_hex(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// AdminStats
///
/// Output of GET /admin-stats. `subject_categories` maps a category name to
/// the number of scholarships in it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminStats {
    pub users: u64,
    pub applications: u64,
    pub scholarships: u64,
    pub reviews: u64,
    pub subject_categories: BTreeMap<String, u64>,
}
