//! Input validation, rejected before any storage mutation.
//!
//! Each function returns the full list of human-readable problems so a
//! client sees every violation at once; an empty list means the payload is
//! acceptable. Range constraints mirror the storage CHECK constraints.

use crate::models::{
    CreateAssignmentRequest, CreateCourseRequest, LoginRequest, SignupRequest,
    UpdateProfileRequest,
};

/// Minimal structural email check: non-empty local part and a domain
/// containing a dot. Deliverability is not this layer's problem.
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn validate_signup(req: &SignupRequest) -> Vec<String> {
    let mut errors = Vec::new();

    let name_len = req.name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
        errors.push("name must be between 2 and 100 characters".to_string());
    }
    if !is_valid_email(&req.email) {
        errors.push("email must be a valid email address".to_string());
    }
    if req.password.chars().count() < 6 {
        errors.push("password must be at least 6 characters long".to_string());
    }
    if let Some(student_id) = &req.student_id {
        if student_id.trim().is_empty() {
            errors.push("studentId must not be empty when provided".to_string());
        }
    }

    errors
}

pub fn validate_profile_update(req: &UpdateProfileRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(name) = &req.name {
        let name_len = name.trim().chars().count();
        if !(2..=100).contains(&name_len) {
            errors.push("name must be between 2 and 100 characters".to_string());
        }
    }

    errors
}

pub fn validate_login(req: &LoginRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if !is_valid_email(&req.email) {
        errors.push("email must be a valid email address".to_string());
    }
    if req.password.is_empty() {
        errors.push("password is required".to_string());
    }

    errors
}

pub fn validate_course(req: &CreateCourseRequest) -> Vec<String> {
    let mut errors = Vec::new();

    let title_len = req.title.trim().chars().count();
    if !(3..=200).contains(&title_len) {
        errors.push("title must be between 3 and 200 characters".to_string());
    }
    let code_len = req.course_code.trim().chars().count();
    if !(3..=20).contains(&code_len) {
        errors.push("courseCode must be between 3 and 20 characters".to_string());
    }
    if !(1..=6).contains(&req.credits) {
        errors.push("credits must be between 1 and 6".to_string());
    }
    if !(2020..=2030).contains(&req.year) {
        errors.push("year must be between 2020 and 2030".to_string());
    }
    if req.max_students < 1 {
        errors.push("maxStudents must be at least 1".to_string());
    }

    errors
}

pub fn validate_assignment(req: &CreateAssignmentRequest) -> Vec<String> {
    let mut errors = Vec::new();

    let title_len = req.title.trim().chars().count();
    if !(3..=200).contains(&title_len) {
        errors.push("title must be between 3 and 200 characters".to_string());
    }
    if req.max_points < 1 {
        errors.push("maxPoints must be at least 1".to_string());
    }

    errors
}

/// Change-password rule shared by the handler and tests.
pub fn validate_new_password(new_password: &str) -> Vec<String> {
    if new_password.chars().count() < 6 {
        vec!["new password must be at least 6 characters long".to_string()]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Semester};

    fn signup_fixture() -> SignupRequest {
        SignupRequest {
            name: "John Smith".to_string(),
            email: "student@college.edu".to_string(),
            password: "password123".to_string(),
            role: Role::Student,
            student_id: Some("STU001".to_string()),
            phone: None,
        }
    }

    #[test]
    fn accepts_well_formed_signup() {
        assert!(validate_signup(&signup_fixture()).is_empty());
    }

    #[test]
    fn rejects_short_password_and_bad_email_together() {
        let mut req = signup_fixture();
        req.password = "12345".to_string();
        req.email = "not-an-email".to_string();

        let errors = validate_signup(&req);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn email_structure_checks() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a@b.co.")); // trailing dot domain
        assert!(!is_valid_email("plainaddress"));
    }

    #[test]
    fn profile_update_name_bounds() {
        let ok = UpdateProfileRequest {
            name: Some("Jo Smith".to_string()),
            phone: None,
        };
        assert!(validate_profile_update(&ok).is_empty());

        let too_short = UpdateProfileRequest {
            name: Some("J".to_string()),
            phone: None,
        };
        assert_eq!(validate_profile_update(&too_short).len(), 1);

        // Absent name means nothing to check.
        let untouched = UpdateProfileRequest {
            name: None,
            phone: Some("555-0100".to_string()),
        };
        assert!(validate_profile_update(&untouched).is_empty());
    }

    #[test]
    fn course_range_constraints() {
        let req = CreateCourseRequest {
            title: "Intro CS".to_string(),
            description: None,
            course_code: "CS101".to_string(),
            credits: 7,
            semester: Semester::Fall,
            year: 2019,
            teacher_id: None,
            max_students: 0,
        };

        let errors = validate_course(&req);
        assert!(errors.iter().any(|e| e.contains("credits")));
        assert!(errors.iter().any(|e| e.contains("year")));
        assert!(errors.iter().any(|e| e.contains("maxStudents")));
    }
}
