use college_lms::models::{
    AuthResponse, CreateCourseRequest, Role, Semester, SignupRequest, SubmissionStatus, User,
};
use serde_json::json;

// --- Wire Format Contract ---

#[test]
fn user_serializes_with_camel_case_keys() {
    let user = User {
        student_id: Some("STU001".to_string()),
        is_active: true,
        ..User::default()
    };

    let value = serde_json::to_value(&user).unwrap();

    assert!(value.get("studentId").is_some());
    assert!(value.get("isActive").is_some());
    assert!(value.get("createdAt").is_some());
    // snake_case must not leak onto the wire.
    assert!(value.get("student_id").is_none());
    assert!(value.get("is_active").is_none());
}

#[test]
fn auth_response_never_contains_password_material() {
    let response = AuthResponse {
        message: "Login successful".to_string(),
        user: User::default(),
        token: "jwt-goes-here".to_string(),
    };

    let text = serde_json::to_string(&response).unwrap();

    assert!(!text.contains("password"));
    assert!(!text.contains("passwordHash"));
    assert!(!text.contains("hash"));
}

#[test]
fn roles_serialize_lowercase_and_reject_unknown_values() {
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
    assert_eq!(
        serde_json::from_value::<Role>(json!("teacher")).unwrap(),
        Role::Teacher
    );
    assert!(serde_json::from_value::<Role>(json!("superuser")).is_err());
}

#[test]
fn semester_keeps_capitalized_spelling_and_is_a_closed_set() {
    assert_eq!(
        serde_json::to_value(Semester::Spring).unwrap(),
        json!("Spring")
    );
    assert!(serde_json::from_value::<Semester>(json!("Winter")).is_err());
    // Lowercase is a different string, not an alias.
    assert!(serde_json::from_value::<Semester>(json!("fall")).is_err());
}

#[test]
fn submission_status_defaults_to_submitted() {
    assert_eq!(SubmissionStatus::default(), SubmissionStatus::Submitted);
}

// --- Request Payload Defaults ---

#[test]
fn signup_role_defaults_to_student() {
    let req: SignupRequest = serde_json::from_value(json!({
        "name": "Alice Carter",
        "email": "alice@college.edu",
        "password": "password123"
    }))
    .unwrap();

    assert_eq!(req.role, Role::Student);
    assert!(req.student_id.is_none());
}

#[test]
fn course_payload_fills_credits_and_capacity_defaults() {
    let req: CreateCourseRequest = serde_json::from_value(json!({
        "title": "Database Systems",
        "courseCode": "CS301",
        "semester": "Fall",
        "year": 2024
    }))
    .unwrap();

    assert_eq!(req.credits, 3);
    assert_eq!(req.max_students, 30);
    assert_eq!(req.semester, Semester::Fall);
}

#[test]
fn validation_failures_and_uniqueness_conflicts_are_bad_requests() {
    use college_lms::error::ApiError;
    use axum::http::StatusCode;

    assert_eq!(
        ApiError::Validation(vec!["x".to_string()]).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::AlreadyEnrolled.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::NotOwner.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        ApiError::NotFound("Course").status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ApiError::NotFound("Course").to_string(),
        "Course not found"
    );
}
