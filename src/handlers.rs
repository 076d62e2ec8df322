use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{
        AssignmentResponse, AssignmentsResponse, AuthResponse, ChangePasswordRequest,
        CourseDetailResponse, CourseWithMessageResponse, CoursesResponse,
        CreateAssignmentRequest, CreateCourseRequest, CreateSubmissionRequest,
        GradeSubmissionRequest, LoginRequest, MessageResponse, Role, SignupRequest,
        SubmissionResponse, UpdateProfileRequest, UpdateUserRequest, UserListResponse,
        UserResponse, UserWithMessageResponse,
    },
    validation,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// UserFilter
///
/// Accepted query parameters for the admin user listing endpoint
/// (GET /users). Bound via Axum's Query extractor; unknown roles are
/// rejected at deserialization rather than silently ignored.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserFilter {
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 10, capped at 100.
    pub limit: Option<i64>,
    /// Optional exact role filter.
    pub role: Option<Role>,
    /// Optional case-insensitive substring match on name or email.
    pub search: Option<String>,
}

// --- Liveness ---

/// health
///
/// [Public Route] Liveness probe for monitoring and load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = MessageResponse))
)]
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "College LMS Backend is running!".to_string(),
    })
}

// --- Identity & Session Handlers ---

/// signup
///
/// [Public Route] Registers a new account. The plaintext password is hashed
/// with argon2id before the insert; email and studentId uniqueness are
/// settled by the database's unique indexes, so a race between two identical
/// signups resolves to exactly one account and one 400.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error or duplicate email/studentId", body = crate::error::ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = validation::validate_signup(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let password_hash = auth::hash_password(&payload.password).await?;
    let user = state.repo.create_user(payload, password_hash).await?;
    let token = auth::issue_token(user.id, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user,
            token,
        }),
    ))
}

/// login
///
/// [Public Route] Verifies credentials and issues a fresh session token.
///
/// *Security*: unknown email and wrong password return the identical 401
/// body, so the endpoint cannot be used to enumerate accounts. Deactivation
/// is checked before password verification and reported distinctly, since a
/// deactivated user already proved the account exists when they registered.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or deactivated account", body = crate::error::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = validation::validate_login(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let (user, stored_hash) = state
        .repo
        .find_user_for_login(&payload.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !user.is_active {
        return Err(ApiError::AccountDeactivated);
    }

    if !auth::verify_password(&payload.password, &stored_hash).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::issue_token(user.id, &state.config)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user,
        token,
    }))
}

/// get_profile
///
/// [Authenticated Route] Returns the requesting user's own record, freshly
/// read so an admin edit made after login is visible immediately.
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody)
    )
)]
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .repo
        .get_user(auth_user.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(UserResponse { user }))
}

/// update_profile
///
/// [Authenticated Route] Self-service partial update of name and phone.
/// Role, email, and isActive are deliberately not reachable from here; those
/// belong to the admin surface.
#[utoipa::path(
    put,
    path = "/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserWithMessageResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody)
    )
)]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserWithMessageResponse>, ApiError> {
    let errors = validation::validate_profile_update(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = state
        .repo
        .update_profile(auth_user.id, payload)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(UserWithMessageResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}

/// change_password
///
/// [Authenticated Route] Re-verifies the current password before accepting
/// the new one; possession of a valid token alone is not enough to rotate
/// the credential.
#[utoipa::path(
    put,
    path = "/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Weak new password or wrong current password", body = crate::error::ErrorBody)
    )
)]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let errors = validation::validate_new_password(&payload.new_password);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let stored_hash = state
        .repo
        .get_password_hash(auth_user.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    if !auth::verify_password(&payload.current_password, &stored_hash).await? {
        return Err(ApiError::IncorrectCurrentPassword);
    }

    let new_hash = auth::hash_password(&payload.new_password).await?;
    state.repo.update_password(auth_user.id, &new_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

// --- Catalog & Enrollment Handlers ---

/// get_courses
///
/// [Authenticated Route] Lists active courses, newest first, each with its
/// teacher summary joined in. Visible to every role.
#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "Active courses", body = CoursesResponse))
)]
pub async fn get_courses(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CoursesResponse>, ApiError> {
    let courses = state.repo.get_courses().await?;
    Ok(Json(CoursesResponse { courses }))
}

/// get_course
///
/// [Authenticated Route] Detailed view of one course, including the enrolled
/// student roster. Inactive courses remain reachable by id so existing
/// enrollees keep access to their materials.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    responses(
        (status = 200, description = "Course detail with roster", body = CourseDetailResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_course(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let course = state
        .repo
        .get_course(course_id)
        .await?
        .ok_or(ApiError::NotFound("Course"))?;

    Ok(Json(CourseDetailResponse { course }))
}

/// create_course
///
/// [Authenticated Route: teacher, admin] Creates a catalog entry.
///
/// *Ownership resolution (anti-impersonation)*: a teacher always becomes the
/// owner of the course they create; any `teacherId` in their payload is
/// ignored. An admin must name the owning teacher explicitly, and the target
/// must hold a role that can own courses.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseWithMessageResponse),
        (status = 400, description = "Validation error or duplicate course code", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is a student", body = crate::error::ErrorBody)
    )
)]
pub async fn create_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth_user.authorize(&[Role::Teacher, Role::Admin])?;

    let errors = validation::validate_course(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let teacher_id = match auth_user.role {
        Role::Admin => {
            let target_id = payload.teacher_id.ok_or_else(|| {
                ApiError::Validation(vec![
                    "teacherId is required when an admin creates a course".to_string(),
                ])
            })?;
            let target = state
                .repo
                .get_user(target_id)
                .await?
                .ok_or(ApiError::NotFound("Teacher"))?;
            if !target.role.can_teach() {
                return Err(ApiError::Validation(vec![
                    "teacherId must reference a teacher".to_string(),
                ]));
            }
            target_id
        }
        // Teachers own what they create, whatever the payload says.
        _ => auth_user.id,
    };

    let course = state.repo.create_course(payload, teacher_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CourseWithMessageResponse {
            message: "Course created successfully".to_string(),
            course,
        }),
    ))
}

/// enroll
///
/// [Authenticated Route: student] Enrolls the requesting student in a
/// course. The acting identity is always the enrollee; there is no way to
/// enroll someone else.
///
/// *Concurrency*: double enrollment is prevented by the unique
/// (student, course) index, not by a read-then-write check, so two
/// simultaneous requests yield exactly one enrollment and one 400.
#[utoipa::path(
    post,
    path = "/courses/{id}/enroll",
    responses(
        (status = 200, description = "Enrolled", body = MessageResponse),
        (status = 400, description = "Already enrolled", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a student", body = crate::error::ErrorBody),
        (status = 404, description = "Course not found", body = crate::error::ErrorBody)
    )
)]
pub async fn enroll(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if auth_user.role != Role::Student {
        return Err(ApiError::OnlyStudentsMayEnroll);
    }

    if !state.repo.course_exists(course_id).await? {
        return Err(ApiError::NotFound("Course"));
    }

    state.repo.enroll(auth_user.id, course_id).await?;

    Ok(Json(MessageResponse {
        message: "Successfully enrolled in course".to_string(),
    }))
}

// --- Assignment & Submission Handlers ---

/// list_assignments
///
/// [Authenticated Route] Lists the active assignments of a course ordered by
/// due date.
#[utoipa::path(
    get,
    path = "/courses/{id}/assignments",
    responses(
        (status = 200, description = "Assignments", body = AssignmentsResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorBody)
    )
)]
pub async fn list_assignments(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<AssignmentsResponse>, ApiError> {
    if !state.repo.course_exists(course_id).await? {
        return Err(ApiError::NotFound("Course"));
    }

    let assignments = state.repo.list_assignments(course_id).await?;
    Ok(Json(AssignmentsResponse { assignments }))
}

/// create_assignment
///
/// [Authenticated Route: teacher, admin] Adds an assignment to a course.
/// A teacher may only post into a course they own; an admin may post into
/// any course.
#[utoipa::path(
    post,
    path = "/courses/{id}/assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 403, description = "Not the owning teacher", body = crate::error::ErrorBody),
        (status = 404, description = "Course not found", body = crate::error::ErrorBody)
    )
)]
pub async fn create_assignment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth_user.authorize(&[Role::Teacher, Role::Admin])?;

    let errors = validation::validate_assignment(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let owner = state
        .repo
        .course_owner(course_id)
        .await?
        .ok_or(ApiError::NotFound("Course"))?;

    if auth_user.role != Role::Admin && owner != auth_user.id {
        return Err(ApiError::NotOwner);
    }

    let assignment = state.repo.create_assignment(course_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse {
            message: "Assignment created successfully".to_string(),
            assignment,
        }),
    ))
}

/// submit_assignment
///
/// [Authenticated Route: student] Hands in work for an assignment. The
/// submission lands as `late` when it arrives after the due date, otherwise
/// `submitted`; one submission per (assignment, student), enforced by the
/// unique index.
#[utoipa::path(
    post,
    path = "/assignments/{id}/submissions",
    request_body = CreateSubmissionRequest,
    responses(
        (status = 201, description = "Submission recorded", body = SubmissionResponse),
        (status = 400, description = "Already submitted", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a student", body = crate::error::ErrorBody),
        (status = 404, description = "Assignment not found", body = crate::error::ErrorBody)
    )
)]
pub async fn submit_assignment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth_user.authorize(&[Role::Student])?;

    let submission = state
        .repo
        .create_submission(assignment_id, auth_user.id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            message: "Assignment submitted successfully".to_string(),
            submission,
        }),
    ))
}

/// grade_submission
///
/// [Authenticated Route: teacher, admin] Records a grade and optional
/// feedback, moving the submission to its terminal `graded` state.
///
/// *Authorization*: the grader must own the course the submission belongs to,
/// unless they are an admin. *Range*: the grade is checked against the
/// assignment's own maxPoints, not a global constant. A graded submission is
/// never regraded.
#[utoipa::path(
    put,
    path = "/submissions/{id}/grade",
    request_body = GradeSubmissionRequest,
    responses(
        (status = 200, description = "Submission graded", body = SubmissionResponse),
        (status = 400, description = "Grade out of range or already graded", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owning teacher", body = crate::error::ErrorBody),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody)
    )
)]
pub async fn grade_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    Json(payload): Json<GradeSubmissionRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    auth_user.authorize(&[Role::Teacher, Role::Admin])?;

    let (course_owner, max_points) = state
        .repo
        .submission_context(submission_id)
        .await?
        .ok_or(ApiError::NotFound("Submission"))?;

    if auth_user.role != Role::Admin && course_owner != auth_user.id {
        return Err(ApiError::NotOwner);
    }

    if !(0..=max_points).contains(&payload.grade) {
        return Err(ApiError::Validation(vec![format!(
            "grade must be between 0 and {max_points}"
        )]));
    }

    let submission = state
        .repo
        .grade_submission(submission_id, payload.grade, payload.feedback)
        .await?
        .ok_or(ApiError::Validation(vec![
            "Submission has already been graded".to_string(),
        ]))?;

    Ok(Json(SubmissionResponse {
        message: "Submission graded successfully".to_string(),
        submission,
    }))
}

// --- Admin Handlers ---

/// list_users
///
/// [Admin Route] Paginated user directory with optional role filter and
/// name/email search. Password hashes never appear in the row type, so they
/// cannot leak from here.
#[utoipa::path(
    get,
    path = "/users",
    params(UserFilter),
    responses(
        (status = 200, description = "User page", body = UserListResponse),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<UserListResponse>, ApiError> {
    let page = filter.page.unwrap_or(1).max(1);
    let limit = filter.limit.unwrap_or(10).clamp(1, 100);

    let (users, total_users) = state
        .repo
        .list_users(page, limit, filter.role, filter.search)
        .await?;

    let total_pages = (total_users + limit - 1) / limit;

    Ok(Json(UserListResponse {
        users,
        total_users,
        current_page: page,
        total_pages,
    }))
}

/// get_user_by_id
///
/// [Admin Route] Fetches any single user record.
#[utoipa::path(
    get,
    path = "/users/{id}",
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .repo
        .get_user(user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(UserResponse { user }))
}

/// update_user
///
/// [Admin Route] Partial update of any user, including role changes and the
/// soft deactivation switch. Setting `isActive: false` takes effect on the
/// target's very next authenticated request, because the auth extractor
/// re-reads the row instead of trusting the token.
#[utoipa::path(
    put,
    path = "/users/{id}",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserWithMessageResponse),
        (status = 400, description = "Duplicate email", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserWithMessageResponse>, ApiError> {
    if let Some(email) = &payload.email {
        if !validation::is_valid_email(email) {
            return Err(ApiError::Validation(vec![
                "email must be a valid email address".to_string(),
            ]));
        }
    }

    let user = state
        .repo
        .update_user(user_id, payload)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(UserWithMessageResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// delete_user
///
/// [Admin Route] Hard delete. A student's enrollments and submissions go
/// with them (cascade); a teacher who still owns courses cannot be deleted
/// until those courses are reassigned or removed (restrict).
#[utoipa::path(
    delete,
    path = "/users/{id}",
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "User still owns courses", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.delete_user(user_id).await? {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
