use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Closed Enumerations (Mapped to Postgres Enum Types) ---

/// Role
///
/// The closed set of capabilities an identity may hold. Stored as the
/// Postgres enum `user_role`; never compared as a raw string anywhere in the
/// handlers — the Access Policy Gate consults this type alone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// True when this role may own a course (teachers and admins).
    pub fn can_teach(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

/// Semester
///
/// Accepted term names for a course offering. Serialized capitalized
/// ("Fall", "Spring", "Summer"); unknown strings are rejected at
/// deserialization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "semester")]
#[ts(export)]
pub enum Semester {
    #[default]
    Fall,
    Spring,
    Summer,
}

/// EnrollmentStatus
///
/// `enrolled` is the only non-terminal state: a record moves to `completed`
/// or `dropped` and never back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "enrollment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EnrollmentStatus {
    #[default]
    Enrolled,
    Completed,
    Dropped,
}

/// AssignmentType
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "assignment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AssignmentType {
    #[default]
    Homework,
    Quiz,
    Exam,
    Project,
}

/// SubmissionStatus
///
/// Decided at creation time: a submission lands as `late` when it arrives
/// after the assignment due date, otherwise `submitted`. Grading moves either
/// state to the terminal `graded`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    Graded,
    Late,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The public user record. The password hash lives only in the `users` table
/// and in repository-internal row types; this struct cannot leak it because
/// it never carries it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Registrar identifier, unique when present. Only meaningful for students.
    pub student_id: Option<String>,
    pub phone: Option<String>,
    /// Soft deactivation flag. Inactive users fail authentication immediately.
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// TeacherSummary
///
/// The abbreviated teacher identity embedded in course responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeacherSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Course
///
/// A catalog entry joined with its owning teacher's summary. This is the
/// shape every course read returns; the bare table row is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub course_code: String,
    pub credits: i32,
    pub semester: Semester,
    pub year: i32,
    pub teacher_id: Uuid,
    pub max_students: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub teacher: TeacherSummary,
}

/// EnrollmentInfo
///
/// Enrollment metadata attached to each roster entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EnrollmentInfo {
    #[ts(type = "string")]
    pub enrollment_date: DateTime<Utc>,
    pub grade: Option<String>,
    pub status: EnrollmentStatus,
}

/// EnrolledStudent
///
/// One roster entry in the course detail view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EnrolledStudent {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub student_id: Option<String>,
    pub enrollment: EnrollmentInfo,
}

/// CourseDetail
///
/// Full course view: the course with teacher summary plus the enrolled
/// student roster.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub students: Vec<EnrolledStudent>,
}

/// Assignment
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub due_date: DateTime<Utc>,
    pub max_points: i32,
    pub kind: AssignmentType,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Submission
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub content: Option<String>,
    /// Path reference only; no upload pipeline is involved.
    pub attachment_path: Option<String>,
    #[ts(type = "string")]
    pub submitted_at: DateTime<Utc>,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
    pub status: SubmissionStatus,
}

// --- Request Payloads (Input Schemas) ---

/// SignupRequest
///
/// Input payload for POST /api/auth/signup. The plaintext password is hashed
/// immediately and never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub student_id: Option<String>,
    pub phone: Option<String>,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UpdateProfileRequest
///
/// Partial self-service profile update; only provided fields change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// ChangePasswordRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// CreateCourseRequest
///
/// `teacherId` is honored only for admin callers; for teachers it is ignored
/// and replaced with the acting identity to prevent impersonation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub course_code: String,
    #[serde(default = "default_credits")]
    pub credits: i32,
    pub semester: Semester,
    pub year: i32,
    pub teacher_id: Option<Uuid>,
    #[serde(default = "default_max_students")]
    pub max_students: i32,
}

fn default_credits() -> i32 {
    3
}

fn default_max_students() -> i32 {
    30
}

/// CreateAssignmentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub due_date: DateTime<Utc>,
    #[serde(default = "default_max_points")]
    pub max_points: i32,
    #[serde(default)]
    pub kind: AssignmentType,
}

fn default_max_points() -> i32 {
    100
}

/// CreateSubmissionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateSubmissionRequest {
    pub content: Option<String>,
    pub attachment_path: Option<String>,
}

/// GradeSubmissionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GradeSubmissionRequest {
    pub grade: i32,
    pub feedback: Option<String>,
}

/// UpdateUserRequest
///
/// Admin-only partial update. `isActive: false` performs the soft
/// deactivation that blocks the user's next authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// --- Response Schemas (Output) ---

/// AuthResponse
///
/// Returned by signup and login: the public user record plus a freshly
/// signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
    pub token: String,
}

/// MessageResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// UserResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub user: User,
}

/// UserWithMessageResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserWithMessageResponse {
    pub message: String,
    pub user: User,
}

/// CoursesResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CoursesResponse {
    pub courses: Vec<Course>,
}

/// CourseDetailResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CourseDetailResponse {
    pub course: CourseDetail,
}

/// CourseWithMessageResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CourseWithMessageResponse {
    pub message: String,
    pub course: Course,
}

/// AssignmentsResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssignmentsResponse {
    pub assignments: Vec<Assignment>,
}

/// AssignmentResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssignmentResponse {
    pub message: String,
    pub assignment: Assignment,
}

/// SubmissionResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmissionResponse {
    pub message: String,
    pub submission: Submission,
}

/// UserListResponse
///
/// Paginated admin listing. Field names follow the public API contract
/// (`totalUsers`, `currentPage`, `totalPages`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total_users: i64,
    pub current_page: i64,
    pub total_pages: i64,
}
