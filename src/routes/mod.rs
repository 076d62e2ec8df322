/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// so access control is applied explicitly at the module level (via Axum
/// layers) rather than remembered per handler.
///
/// The three modules map directly to the access stages: anonymous,
/// authenticated, and admin-only.

/// Routes accessible without a session: health probe and the two identity
/// gateway endpoints (signup, login).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session; per-role checks happen inside the handlers.
pub mod authenticated;

/// Routes restricted exclusively to users with the 'admin' role,
/// enforced by a dedicated middleware layer.
pub mod admin;
