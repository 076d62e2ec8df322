use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user with a validated session. This
/// module carries the whole teaching surface: self-service account
/// management, the course catalog, enrollment, assignments, and grading.
///
/// Access Control Strategy:
/// Every handler here relies on the `AuthUser` extractor middleware being
/// present on the router layer above this module, guaranteeing a resolved
/// identity. Role and ownership checks (teacher-owns-course, student-only
/// enrollment) are then enforced inside the individual handlers, because
/// they depend on the specific resource being touched.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Self-Service Account ---
        // GET /auth/profile
        // The requesting user's own record, freshly read from storage.
        // PUT /auth/profile
        // Partial update of name and phone only; role and activation are
        // admin-surface concerns.
        .route(
            "/auth/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        // PUT /auth/change-password
        // Re-verifies the current password before accepting the new one.
        .route("/auth/change-password", put(handlers::change_password))
        // --- Course Catalog ---
        // GET /courses — active catalog, newest first, visible to all roles.
        // POST /courses — teacher/admin only; a teacher always becomes the
        // owner of what they create (anti-impersonation).
        .route(
            "/courses",
            get(handlers::get_courses).post(handlers::create_course),
        )
        // GET /courses/{id}
        // Detail view with the enrolled-student roster.
        .route("/courses/{id}", get(handlers::get_course))
        // POST /courses/{id}/enroll
        // Student-only self-enrollment. Idempotency against double clicks
        // and races is settled by the unique (student, course) index.
        .route("/courses/{id}/enroll", post(handlers::enroll))
        // --- Assignments ---
        // GET lists active assignments by due date; POST is restricted to
        // the owning teacher (or an admin).
        .route(
            "/courses/{id}/assignments",
            get(handlers::list_assignments).post(handlers::create_assignment),
        )
        // POST /assignments/{id}/submissions
        // Student hand-in. Late arrival is stamped at creation time.
        .route(
            "/assignments/{id}/submissions",
            post(handlers::submit_assignment),
        )
        // PUT /submissions/{id}/grade
        // Owning teacher or admin records a grade; `graded` is terminal.
        .route("/submissions/{id}/grade", put(handlers::grade_submission))
}
