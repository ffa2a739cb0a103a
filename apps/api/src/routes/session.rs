use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::gateway::User;
use crate::store::{Session, StoreState};
use crate::state::AppState;

/// GET /api/v1/state
pub async fn handle_state(State(state): State<AppState>) -> Json<StoreState> {
    Json(state.platform.state())
}

/// DELETE /api/v1/state/error
pub async fn handle_clear_error(State(state): State<AppState>) -> StatusCode {
    state.platform.clear_error();
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/status
pub async fn handle_auth_status(State(state): State<AppState>) -> Json<Session> {
    state.platform.auth.check_status().await;
    Json(state.platform.state().session)
}

/// POST /api/v1/auth/sign-in
pub async fn handle_sign_in(State(state): State<AppState>) -> Result<Json<Session>, AppError> {
    state.platform.auth.sign_in().await?;
    Ok(Json(state.platform.state().session))
}

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.platform.auth.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/refresh
pub async fn handle_refresh(State(state): State<AppState>) -> Result<Json<User>, AppError> {
    Ok(Json(state.platform.auth.refresh().await?))
}
