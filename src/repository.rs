use crate::error::ApiError;
use crate::models::{
    Assignment, Course, CourseDetail, CreateAssignmentRequest, CreateCourseRequest,
    CreateSubmissionRequest, EnrolledStudent, EnrollmentInfo, EnrollmentStatus, Role, Semester,
    SignupRequest, Submission, SubmissionStatus, TeacherSummary, UpdateProfileRequest,
    UpdateUserRequest, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers interact
/// with the data layer only through this trait, which keeps the HTTP layer
/// testable against an in-memory mock and the Postgres implementation
/// swappable.
///
/// Every method returns `Result<_, ApiError>`: uniqueness races are settled
/// by the database's unique indexes and translated to the matching domain
/// error here, never re-checked with a read-then-write in the handlers.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users & Credentials ---
    /// Inserts a new user with an already-hashed password. Unique violations
    /// map to `DuplicateEmail` / `DuplicateStudentId`.
    async fn create_user(
        &self,
        req: SignupRequest,
        password_hash: String,
    ) -> Result<User, ApiError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    /// Login lookup: the public record plus the stored password hash.
    async fn find_user_for_login(&self, email: &str) -> Result<Option<(User, String)>, ApiError>;
    async fn get_password_hash(&self, id: Uuid) -> Result<Option<String>, ApiError>;
    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, ApiError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), ApiError>;

    // --- Administrative User Operations ---
    /// Paginated listing with optional role filter and case-insensitive
    /// name/email substring search. Returns the page plus the total count.
    async fn list_users(
        &self,
        page: i64,
        limit: i64,
        role: Option<Role>,
        search: Option<String>,
    ) -> Result<(Vec<User>, i64), ApiError>;
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest)
    -> Result<Option<User>, ApiError>;
    /// Hard delete. Fails with a validation error while the user still owns
    /// courses (FK restrict); a student's enrollments and submissions cascade.
    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Catalog & Enrollment ---
    /// Inserts a course owned by `teacher_id` (already resolved by the
    /// handler's anti-impersonation rule) and returns it with the teacher
    /// summary joined in. Duplicate course codes map to `DuplicateCourseCode`.
    async fn create_course(
        &self,
        req: CreateCourseRequest,
        teacher_id: Uuid,
    ) -> Result<Course, ApiError>;
    /// Active courses only, newest first.
    async fn get_courses(&self) -> Result<Vec<Course>, ApiError>;
    /// Course detail with roster, found whether active or inactive.
    async fn get_course(&self, id: Uuid) -> Result<Option<CourseDetail>, ApiError>;
    async fn course_exists(&self, id: Uuid) -> Result<bool, ApiError>;
    async fn course_owner(&self, id: Uuid) -> Result<Option<Uuid>, ApiError>;
    /// Atomic enrollment: `ON CONFLICT DO NOTHING` on the unique
    /// (student_id, course_id) pair; zero rows affected means the pair
    /// already exists, regardless of how the concurrent race interleaved.
    async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> Result<(), ApiError>;

    // --- Assignments & Submissions ---
    async fn create_assignment(
        &self,
        course_id: Uuid,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment, ApiError>;
    async fn list_assignments(&self, course_id: Uuid) -> Result<Vec<Assignment>, ApiError>;
    /// Inserts a submission, deciding `late` vs `submitted` against the
    /// assignment due date at creation time.
    async fn create_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        req: CreateSubmissionRequest,
    ) -> Result<Submission, ApiError>;
    /// Grading context: the owning course's teacher and the assignment's
    /// point ceiling, for the handler's ownership and range checks.
    async fn submission_context(&self, submission_id: Uuid)
    -> Result<Option<(Uuid, i32)>, ApiError>;
    /// Moves a submission to the terminal `graded` state. Returns None when
    /// the submission does not exist or is already graded.
    async fn grade_submission(
        &self,
        id: Uuid,
        grade: i32,
        feedback: Option<String>,
    ) -> Result<Option<Submission>, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of `Repository`, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance over an initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Re-reads a course joined with its teacher summary.
    async fn fetch_course(&self, id: Uuid) -> Result<Option<Course>, ApiError> {
        let row = sqlx::query_as::<_, CourseTeacherRow>(&format!(
            "{COURSE_SELECT} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CourseTeacherRow::into_course))
    }
}

// Shared SELECT for the course + teacher join; every course read returns
// this shape.
const COURSE_SELECT: &str = "SELECT c.id, c.title, c.description, c.course_code, c.credits, \
     c.semester, c.year, c.teacher_id, c.max_students, c.is_active, \
     c.created_at, c.updated_at, t.name AS teacher_name, t.email AS teacher_email \
     FROM courses c JOIN users t ON c.teacher_id = t.id";

const USER_COLUMNS: &str =
    "id, name, email, role, student_id, phone, is_active, created_at, updated_at";

/// Flat join row mapped into the nested `Course` response shape.
#[derive(FromRow)]
struct CourseTeacherRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    course_code: String,
    credits: i32,
    semester: Semester,
    year: i32,
    teacher_id: Uuid,
    max_students: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    teacher_name: String,
    teacher_email: String,
}

impl CourseTeacherRow {
    fn into_course(self) -> Course {
        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            course_code: self.course_code,
            credits: self.credits,
            semester: self.semester,
            year: self.year,
            teacher_id: self.teacher_id,
            max_students: self.max_students,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            teacher: TeacherSummary {
                id: self.teacher_id,
                name: self.teacher_name,
                email: self.teacher_email,
            },
        }
    }
}

/// Roster join row for the course detail view.
#[derive(FromRow)]
struct RosterRow {
    id: Uuid,
    name: String,
    email: String,
    student_id: Option<String>,
    enrollment_date: DateTime<Utc>,
    grade: Option<String>,
    status: EnrollmentStatus,
}

/// Login row: the public user columns plus the credential hash.
#[derive(FromRow)]
struct LoginRow {
    id: Uuid,
    name: String,
    email: String,
    role: Role,
    student_id: Option<String>,
    phone: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    password_hash: String,
}

impl LoginRow {
    fn into_parts(self) -> (User, String) {
        (
            User {
                id: self.id,
                name: self.name,
                email: self.email,
                role: self.role,
                student_id: self.student_id,
                phone: self.phone,
                is_active: self.is_active,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.password_hash,
        )
    }
}

/// Translates a storage error into the domain taxonomy: unique violations
/// are matched by constraint name (the migration names every uniqueness
/// invariant); anything else stays a 500-class storage fault.
fn translate_db_error(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("users_email_key") => return ApiError::DuplicateEmail,
                Some("users_student_id_key") => return ApiError::DuplicateStudentId,
                Some("courses_course_code_key") => return ApiError::DuplicateCourseCode,
                Some("enrollments_student_course_key") => return ApiError::AlreadyEnrolled,
                Some("submissions_assignment_student_key") => return ApiError::AlreadySubmitted,
                _ => {}
            }
        }
    }
    ApiError::Storage(e)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(
        &self,
        req: SignupRequest,
        password_hash: String,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash, role, student_id, phone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(req.email.to_lowercase())
        .bind(password_hash)
        .bind(req.role)
        .bind(req.student_id)
        .bind(req.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_db_error)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_for_login(&self, email: &str) -> Result<Option<(User, String)>, ApiError> {
        let row = sqlx::query_as::<_, LoginRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LoginRow::into_parts))
    }

    async fn get_password_hash(&self, id: Uuid) -> Result<Option<String>, ApiError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(hash)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = COALESCE($2, name), phone = COALESCE($3, phone), \
             updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Implements the filtered listing with QueryBuilder for safe
    /// parameterization; the count query repeats the same conditions so the
    /// pagination totals match the filter.
    async fn list_users(
        &self,
        page: i64,
        limit: i64,
        role: Option<Role>,
        search: Option<String>,
    ) -> Result<(Vec<User>, i64), ApiError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE TRUE"
        ));
        let mut count_builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");

        if let Some(role) = role {
            builder.push(" AND role = ");
            builder.push_bind(role);
            count_builder.push(" AND role = ");
            count_builder.push_bind(role);
        }

        if let Some(s) = search {
            let pattern = format!("%{}%", s);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(")");
            count_builder.push(" AND (name ILIKE ");
            count_builder.push_bind(pattern.clone());
            count_builder.push(" OR email ILIKE ");
            count_builder.push_bind(pattern);
            count_builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             role = COALESCE($4, role), phone = COALESCE($5, phone), \
             is_active = COALESCE($6, is_active), updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.email.map(|e| e.to_lowercase()))
        .bind(req.role)
        .bind(req.phone)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(translate_db_error)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(ApiError::Validation(vec![
                    "Cannot delete a user who still owns courses; reassign or delete their courses first"
                        .to_string(),
                ]))
            }
            Err(e) => Err(ApiError::Storage(e)),
        }
    }

    async fn create_course(
        &self,
        req: CreateCourseRequest,
        teacher_id: Uuid,
    ) -> Result<Course, ApiError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO courses (id, title, description, course_code, credits, semester, \
             year, teacher_id, max_students) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(req.title.trim())
        .bind(req.description)
        .bind(req.course_code.trim())
        .bind(req.credits)
        .bind(req.semester)
        .bind(req.year)
        .bind(teacher_id)
        .bind(req.max_students)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_db_error)?;

        self.fetch_course(id)
            .await?
            .ok_or_else(|| ApiError::Internal("created course vanished".to_string()))
    }

    async fn get_courses(&self) -> Result<Vec<Course>, ApiError> {
        let rows = sqlx::query_as::<_, CourseTeacherRow>(&format!(
            "{COURSE_SELECT} WHERE c.is_active = TRUE ORDER BY c.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CourseTeacherRow::into_course).collect())
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<CourseDetail>, ApiError> {
        let Some(course) = self.fetch_course(id).await? else {
            return Ok(None);
        };

        let roster = sqlx::query_as::<_, RosterRow>(
            "SELECT u.id, u.name, u.email, u.student_id, \
             e.enrollment_date, e.grade, e.status \
             FROM enrollments e JOIN users u ON e.student_id = u.id \
             WHERE e.course_id = $1 ORDER BY e.enrollment_date ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let students = roster
            .into_iter()
            .map(|r| EnrolledStudent {
                id: r.id,
                name: r.name,
                email: r.email,
                student_id: r.student_id,
                enrollment: EnrollmentInfo {
                    enrollment_date: r.enrollment_date,
                    grade: r.grade,
                    status: r.status,
                },
            })
            .collect();

        Ok(Some(CourseDetail { course, students }))
    }

    async fn course_exists(&self, id: Uuid) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn course_owner(&self, id: Uuid) -> Result<Option<Uuid>, ApiError> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT teacher_id FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> Result<(), ApiError> {
        // The unique index is the arbiter under concurrency: two racing
        // enrollments for the same pair both reach this insert, exactly one
        // affects a row.
        let result = sqlx::query(
            "INSERT INTO enrollments (id, student_id, course_id) VALUES ($1, $2, $3) \
             ON CONFLICT (student_id, course_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::AlreadyEnrolled);
        }
        Ok(())
    }

    async fn create_assignment(
        &self,
        course_id: Uuid,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment, ApiError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            "INSERT INTO assignments (id, course_id, title, description, due_date, max_points, kind) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, course_id, title, description, due_date, max_points, kind, is_active, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(req.title.trim())
        .bind(req.description)
        .bind(req.due_date)
        .bind(req.max_points)
        .bind(req.kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(assignment)
    }

    async fn list_assignments(&self, course_id: Uuid) -> Result<Vec<Assignment>, ApiError> {
        let assignments = sqlx::query_as::<_, Assignment>(
            "SELECT id, course_id, title, description, due_date, max_points, kind, is_active, created_at \
             FROM assignments WHERE course_id = $1 AND is_active = TRUE ORDER BY due_date ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assignments)
    }

    async fn create_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        req: CreateSubmissionRequest,
    ) -> Result<Submission, ApiError> {
        let due_date: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT due_date FROM assignments WHERE id = $1 AND is_active = TRUE",
        )
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await?;

        let due_date = due_date.ok_or(ApiError::NotFound("Assignment"))?;

        // Late-vs-submitted is decided here, at creation time, against the
        // assignment due date.
        let now = Utc::now();
        let status = if now > due_date {
            SubmissionStatus::Late
        } else {
            SubmissionStatus::Submitted
        };

        sqlx::query_as::<_, Submission>(
            "INSERT INTO submissions (id, assignment_id, student_id, content, attachment_path, \
             submitted_at, status) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, assignment_id, student_id, content, attachment_path, submitted_at, \
             grade, feedback, status",
        )
        .bind(Uuid::new_v4())
        .bind(assignment_id)
        .bind(student_id)
        .bind(req.content)
        .bind(req.attachment_path)
        .bind(now)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_db_error)
    }

    async fn submission_context(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<(Uuid, i32)>, ApiError> {
        let row: Option<(Uuid, i32)> = sqlx::query_as(
            "SELECT c.teacher_id, a.max_points \
             FROM submissions s \
             JOIN assignments a ON s.assignment_id = a.id \
             JOIN courses c ON a.course_id = c.id \
             WHERE s.id = $1",
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn grade_submission(
        &self,
        id: Uuid,
        grade: i32,
        feedback: Option<String>,
    ) -> Result<Option<Submission>, ApiError> {
        // `graded` is terminal; the WHERE clause refuses to regrade.
        let submission = sqlx::query_as::<_, Submission>(
            "UPDATE submissions SET grade = $2, feedback = $3, status = 'graded' \
             WHERE id = $1 AND status <> 'graded' \
             RETURNING id, assignment_id, student_id, content, attachment_path, submitted_at, \
             grade, feedback, status",
        )
        .bind(id)
        .bind(grade)
        .bind(feedback)
        .fetch_optional(&self.pool)
        .await?;
        Ok(submission)
    }
}
