use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines the endpoints reachable **without a session**: the health probe
/// and the identity gateway. Everything else in the API, including the
/// course catalog, requires authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(handlers::health))
        // POST /auth/signup
        // Creates an account and returns it with a freshly signed token, so
        // a new user is logged in from the moment they register.
        .route("/auth/signup", post(handlers::signup))
        // POST /auth/login
        // Credential verification. Unknown email and wrong password produce
        // the same response; deactivated accounts are told so explicitly.
        .route("/auth/login", post(handlers::login))
}
