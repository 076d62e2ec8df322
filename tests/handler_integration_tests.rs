use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use college_lms::{
    AppState, auth,
    auth::AuthUser,
    config::AppConfig,
    error::ApiError,
    handlers,
    models::{
        Assignment, Course, CourseDetail, CreateAssignmentRequest, CreateCourseRequest,
        CreateSubmissionRequest, ChangePasswordRequest, GradeSubmissionRequest, LoginRequest,
        Role, Semester, SignupRequest, Submission, UpdateProfileRequest, UpdateUserRequest, User,
    },
    repository::Repository,
};
use std::sync::{Arc, Mutex};
use tokio::test;
use uuid::Uuid;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// Central control point for testing handler logic: pre-canned outputs for
// the methods a test exercises, plus captured inputs so a test can verify
// what the handler actually passed down.
pub struct MockRepoControl {
    // Pre-canned outputs
    pub user_to_return: Option<User>,
    pub login_row: Option<(User, String)>,
    pub password_hash_to_return: Option<String>,
    pub course_exists_result: bool,
    pub course_owner_result: Option<Uuid>,
    pub enroll_conflict: bool,
    pub submission_context_result: Option<(Uuid, i32)>,
    pub grade_result: Option<Submission>,
    pub users_page: (Vec<User>, i64),

    // Captured inputs
    pub captured_course_owner: Mutex<Option<Uuid>>,
    pub captured_enrollee: Mutex<Option<Uuid>>,
    pub captured_new_password_hash: Mutex<Option<String>>,
}

impl Default for MockRepoControl {
    fn default() -> Self {
        MockRepoControl {
            user_to_return: None,
            login_row: None,
            password_hash_to_return: None,
            course_exists_result: true,
            course_owner_result: None,
            enroll_conflict: false,
            submission_context_result: None,
            grade_result: Some(Submission::default()),
            users_page: (vec![], 0),
            captured_course_owner: Mutex::new(None),
            captured_enrollee: Mutex::new(None),
            captured_new_password_hash: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn get_user(&self, _id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.user_to_return.clone())
    }
    async fn find_user_for_login(
        &self,
        _email: &str,
    ) -> Result<Option<(User, String)>, ApiError> {
        Ok(self.login_row.clone())
    }
    async fn get_password_hash(&self, _id: Uuid) -> Result<Option<String>, ApiError> {
        Ok(self.password_hash_to_return.clone())
    }
    async fn update_password(&self, _id: Uuid, password_hash: &str) -> Result<(), ApiError> {
        *self.captured_new_password_hash.lock().unwrap() = Some(password_hash.to_string());
        Ok(())
    }
    async fn create_course(
        &self,
        _req: CreateCourseRequest,
        teacher_id: Uuid,
    ) -> Result<Course, ApiError> {
        *self.captured_course_owner.lock().unwrap() = Some(teacher_id);
        Ok(Course::default())
    }
    async fn course_exists(&self, _id: Uuid) -> Result<bool, ApiError> {
        Ok(self.course_exists_result)
    }
    async fn course_owner(&self, _id: Uuid) -> Result<Option<Uuid>, ApiError> {
        Ok(self.course_owner_result)
    }
    async fn enroll(&self, student_id: Uuid, _course_id: Uuid) -> Result<(), ApiError> {
        if self.enroll_conflict {
            return Err(ApiError::AlreadyEnrolled);
        }
        *self.captured_enrollee.lock().unwrap() = Some(student_id);
        Ok(())
    }
    async fn submission_context(
        &self,
        _submission_id: Uuid,
    ) -> Result<Option<(Uuid, i32)>, ApiError> {
        Ok(self.submission_context_result)
    }
    async fn grade_submission(
        &self,
        _id: Uuid,
        _grade: i32,
        _feedback: Option<String>,
    ) -> Result<Option<Submission>, ApiError> {
        Ok(self.grade_result.clone())
    }
    async fn list_users(
        &self,
        _page: i64,
        _limit: i64,
        _role: Option<Role>,
        _search: Option<String>,
    ) -> Result<(Vec<User>, i64), ApiError> {
        Ok(self.users_page.clone())
    }

    // Minimal mocks for compilation
    async fn create_user(
        &self,
        _req: SignupRequest,
        _password_hash: String,
    ) -> Result<User, ApiError> {
        Ok(User::default())
    }
    async fn update_profile(
        &self,
        _id: Uuid,
        _req: UpdateProfileRequest,
    ) -> Result<Option<User>, ApiError> {
        Ok(self.user_to_return.clone())
    }
    async fn update_user(
        &self,
        _id: Uuid,
        _req: UpdateUserRequest,
    ) -> Result<Option<User>, ApiError> {
        Ok(self.user_to_return.clone())
    }
    async fn delete_user(&self, _id: Uuid) -> Result<bool, ApiError> {
        Ok(false)
    }
    async fn get_courses(&self) -> Result<Vec<Course>, ApiError> {
        Ok(vec![])
    }
    async fn get_course(&self, _id: Uuid) -> Result<Option<CourseDetail>, ApiError> {
        Ok(None)
    }
    async fn create_assignment(
        &self,
        _course_id: Uuid,
        _req: CreateAssignmentRequest,
    ) -> Result<Assignment, ApiError> {
        Ok(Assignment::default())
    }
    async fn list_assignments(&self, _course_id: Uuid) -> Result<Vec<Assignment>, ApiError> {
        Ok(vec![])
    }
    async fn create_submission(
        &self,
        _assignment_id: Uuid,
        _student_id: Uuid,
        _req: CreateSubmissionRequest,
    ) -> Result<Submission, ApiError> {
        Ok(Submission::default())
    }
}

// --- Helpers ---

fn make_state(mock: Arc<MockRepoControl>) -> AppState {
    AppState {
        repo: mock,
        config: AppConfig::default(),
    }
}

fn actor(role: Role) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        role,
    }
}

fn course_payload(teacher_id: Option<Uuid>) -> CreateCourseRequest {
    CreateCourseRequest {
        title: "Introduction to Computer Science".to_string(),
        description: None,
        course_code: "CS101".to_string(),
        credits: 4,
        semester: Semester::Fall,
        year: 2024,
        teacher_id,
        max_students: 30,
    }
}

// --- Course Creation: Ownership Resolution ---

#[test]
async fn teacher_created_course_ignores_spoofed_teacher_id() {
    let mock = Arc::new(MockRepoControl::default());
    let state = make_state(mock.clone());
    let teacher = actor(Role::Teacher);
    let someone_else = Uuid::new_v4();

    let result = handlers::create_course(
        teacher.clone(),
        State(state),
        Json(course_payload(Some(someone_else))),
    )
    .await;

    assert!(result.is_ok());
    // The spoofed id never reaches the repository.
    assert_eq!(
        *mock.captured_course_owner.lock().unwrap(),
        Some(teacher.id)
    );
}

#[test]
async fn admin_must_name_the_owning_teacher() {
    let state = make_state(Arc::new(MockRepoControl::default()));

    let err = handlers::create_course(
        actor(Role::Admin),
        State(state),
        Json(course_payload(None)),
    )
    .await
    .err()
    .expect("missing teacherId must fail");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn admin_cannot_assign_a_course_to_a_student() {
    let student_row = User {
        id: Uuid::new_v4(),
        role: Role::Student,
        is_active: true,
        ..User::default()
    };
    let target_id = student_row.id;
    let mock = Arc::new(MockRepoControl {
        user_to_return: Some(student_row),
        ..MockRepoControl::default()
    });
    let state = make_state(mock);

    let err = handlers::create_course(
        actor(Role::Admin),
        State(state),
        Json(course_payload(Some(target_id))),
    )
    .await
    .err()
    .expect("student owner must fail");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn student_cannot_create_a_course() {
    let state = make_state(Arc::new(MockRepoControl::default()));

    let err = handlers::create_course(
        actor(Role::Student),
        State(state),
        Json(course_payload(None)),
    )
    .await
    .err()
    .expect("student must be forbidden");

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

// --- Enrollment ---

#[test]
async fn only_students_can_enroll() {
    let state = make_state(Arc::new(MockRepoControl::default()));

    let err = handlers::enroll(actor(Role::Teacher), State(state), Path(Uuid::new_v4()))
        .await
        .err()
        .expect("teacher enrollment must fail");

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[test]
async fn enrolling_in_a_missing_course_is_404() {
    let mock = Arc::new(MockRepoControl {
        course_exists_result: false,
        ..MockRepoControl::default()
    });
    let state = make_state(mock);

    let err = handlers::enroll(actor(Role::Student), State(state), Path(Uuid::new_v4()))
        .await
        .err()
        .expect("missing course must fail");

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[test]
async fn double_enrollment_is_a_client_error() {
    let mock = Arc::new(MockRepoControl {
        enroll_conflict: true,
        ..MockRepoControl::default()
    });
    let state = make_state(mock);

    let err = handlers::enroll(actor(Role::Student), State(state), Path(Uuid::new_v4()))
        .await
        .err()
        .expect("duplicate enrollment must fail");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn enrollment_always_targets_the_acting_student() {
    let mock = Arc::new(MockRepoControl::default());
    let state = make_state(mock.clone());
    let student = actor(Role::Student);

    let result = handlers::enroll(student.clone(), State(state), Path(Uuid::new_v4())).await;

    assert!(result.is_ok());
    assert_eq!(*mock.captured_enrollee.lock().unwrap(), Some(student.id));
}

// --- Login Failure Indistinguishability ---

#[test]
async fn unknown_email_and_wrong_password_are_indistinguishable() {
    let hash = auth::hash_password("correct horse").await.unwrap();
    let known = User {
        id: Uuid::new_v4(),
        email: "known@college.edu".to_string(),
        is_active: true,
        ..User::default()
    };

    // Case 1: unknown email.
    let state = make_state(Arc::new(MockRepoControl::default()));
    let unknown_err = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "nobody@college.edu".to_string(),
            password: "whatever1".to_string(),
        }),
    )
    .await
    .err()
    .expect("unknown email must fail");

    // Case 2: known email, wrong password.
    let state = make_state(Arc::new(MockRepoControl {
        login_row: Some((known, hash)),
        ..MockRepoControl::default()
    }));
    let wrong_err = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "known@college.edu".to_string(),
            password: "wrong password".to_string(),
        }),
    )
    .await
    .err()
    .expect("wrong password must fail");

    assert_eq!(unknown_err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_err.to_string(), wrong_err.to_string());
}

#[test]
async fn deactivated_account_cannot_login_even_with_correct_password() {
    let hash = auth::hash_password("password123").await.unwrap();
    let user = User {
        id: Uuid::new_v4(),
        email: "gone@college.edu".to_string(),
        is_active: false,
        ..User::default()
    };
    let state = make_state(Arc::new(MockRepoControl {
        login_row: Some((user, hash)),
        ..MockRepoControl::default()
    }));

    let err = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "gone@college.edu".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await
    .err()
    .expect("deactivated login must fail");

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert!(err.to_string().contains("deactivated"));
}

// --- Password Change ---

#[test]
async fn change_password_requires_the_current_password() {
    let hash = auth::hash_password("the-real-one").await.unwrap();
    let mock = Arc::new(MockRepoControl {
        password_hash_to_return: Some(hash),
        ..MockRepoControl::default()
    });
    let state = make_state(mock.clone());

    let err = handlers::change_password(
        actor(Role::Student),
        State(state),
        Json(ChangePasswordRequest {
            current_password: "not-the-real-one".to_string(),
            new_password: "new-password".to_string(),
        }),
    )
    .await
    .err()
    .expect("wrong current password must fail");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    // And nothing was written.
    assert!(mock.captured_new_password_hash.lock().unwrap().is_none());
}

#[test]
async fn change_password_stores_a_hash_not_the_plaintext() {
    let hash = auth::hash_password("the-real-one").await.unwrap();
    let mock = Arc::new(MockRepoControl {
        password_hash_to_return: Some(hash),
        ..MockRepoControl::default()
    });
    let state = make_state(mock.clone());

    let result = handlers::change_password(
        actor(Role::Student),
        State(state),
        Json(ChangePasswordRequest {
            current_password: "the-real-one".to_string(),
            new_password: "brand-new-secret".to_string(),
        }),
    )
    .await;

    assert!(result.is_ok());
    let stored = mock
        .captured_new_password_hash
        .lock()
        .unwrap()
        .clone()
        .expect("a new hash must be stored");
    assert_ne!(stored, "brand-new-secret");
    assert!(stored.starts_with("$argon2"));
}

// --- Grading ---

#[test]
async fn grading_rejects_a_teacher_who_does_not_own_the_course() {
    let owner = Uuid::new_v4();
    let mock = Arc::new(MockRepoControl {
        submission_context_result: Some((owner, 100)),
        ..MockRepoControl::default()
    });
    let state = make_state(mock);

    let err = handlers::grade_submission(
        actor(Role::Teacher), // a different teacher
        State(state),
        Path(Uuid::new_v4()),
        Json(GradeSubmissionRequest {
            grade: 80,
            feedback: None,
        }),
    )
    .await
    .err()
    .expect("non-owner grading must fail");

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[test]
async fn grade_must_stay_within_the_assignment_point_ceiling() {
    let grader = actor(Role::Teacher);
    let mock = Arc::new(MockRepoControl {
        submission_context_result: Some((grader.id, 50)),
        ..MockRepoControl::default()
    });
    let state = make_state(mock);

    let err = handlers::grade_submission(
        grader,
        State(state),
        Path(Uuid::new_v4()),
        Json(GradeSubmissionRequest {
            grade: 51,
            feedback: None,
        }),
    )
    .await
    .err()
    .expect("over-ceiling grade must fail");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn a_graded_submission_is_never_regraded() {
    let grader = actor(Role::Admin);
    let mock = Arc::new(MockRepoControl {
        submission_context_result: Some((Uuid::new_v4(), 100)),
        grade_result: None, // repository reports the terminal state
        ..MockRepoControl::default()
    });
    let state = make_state(mock);

    let err = handlers::grade_submission(
        grader,
        State(state),
        Path(Uuid::new_v4()),
        Json(GradeSubmissionRequest {
            grade: 90,
            feedback: Some("good".to_string()),
        }),
    )
    .await
    .err()
    .expect("regrade must fail");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn students_cannot_grade() {
    let state = make_state(Arc::new(MockRepoControl::default()));

    let err = handlers::grade_submission(
        actor(Role::Student),
        State(state),
        Path(Uuid::new_v4()),
        Json(GradeSubmissionRequest {
            grade: 100,
            feedback: None,
        }),
    )
    .await
    .err()
    .expect("student grading must fail");

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

// --- Submissions ---

#[test]
async fn teachers_cannot_submit_assignments() {
    let state = make_state(Arc::new(MockRepoControl::default()));

    let result = handlers::submit_assignment(
        actor(Role::Teacher),
        State(state),
        Path(Uuid::new_v4()),
        Json(CreateSubmissionRequest::default()),
    )
    .await;

    assert_eq!(result.err().unwrap().status(), StatusCode::FORBIDDEN);
}

// --- Admin Listing ---

#[test]
async fn user_listing_computes_total_pages_from_the_filtered_count() {
    let mock = Arc::new(MockRepoControl {
        users_page: (vec![User::default(); 10], 25),
        ..MockRepoControl::default()
    });
    let state = make_state(mock);

    let Json(body) = handlers::list_users(
        State(state),
        Query(handlers::UserFilter {
            page: Some(1),
            limit: Some(10),
            role: None,
            search: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(body.total_users, 25);
    assert_eq!(body.current_page, 1);
    assert_eq!(body.total_pages, 3);
}

// --- Response Status Shapes ---

#[test]
async fn successful_enrollment_returns_200_with_a_message() {
    let state = make_state(Arc::new(MockRepoControl::default()));

    let response = handlers::enroll(actor(Role::Student), State(state), Path(Uuid::new_v4()))
        .await
        .unwrap()
        .into_response();

    assert_eq!(response.status(), StatusCode::OK);
}
