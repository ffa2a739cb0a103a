pub mod health;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::review::{handlers, MAX_UPLOAD_BYTES};
use crate::state::AppState;

/// Multipart overhead allowed on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Store
        .route("/api/v1/state", get(session::handle_state))
        .route("/api/v1/state/error", delete(session::handle_clear_error))
        // Auth
        .route("/api/v1/auth/status", get(session::handle_auth_status))
        .route("/api/v1/auth/sign-in", post(session::handle_sign_in))
        .route("/api/v1/auth/sign-out", post(session::handle_sign_out))
        .route("/api/v1/auth/refresh", post(session::handle_refresh))
        // Resumes
        .route(
            "/api/v1/resumes",
            post(handlers::handle_analyze)
                .get(handlers::handle_list)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get).delete(handlers::handle_delete),
        )
        .with_state(state)
}
