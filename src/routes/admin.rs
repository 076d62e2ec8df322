use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Admin Router Module
///
/// Defines the user-management routes exclusively accessible to the 'admin'
/// role: the paginated directory, single-record reads, partial updates
/// (including role changes and soft deactivation), and hard deletes.
///
/// Access Control:
/// This entire router is wrapped (in `create_router`) in a middleware layer
/// that first authenticates the request and then rejects any non-admin
/// identity with a 403 before a handler runs. The handlers themselves can
/// therefore assume an admin caller.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /users?page=&limit=&role=&search=
        // Paginated directory with role filter and name/email search.
        .route("/", get(handlers::list_users))
        // GET/PUT/DELETE /users/{id}
        // Single-record administration. PUT carries the soft-deactivation
        // switch; DELETE is refused while the target still owns courses.
        .route(
            "/{id}",
            get(handlers::get_user_by_id)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
