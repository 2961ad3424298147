//! `/password-resets` handlers.
//!
//! Delivering the reset identifier to the account owner happens out of
//! band; the request endpoint answers identically for every email.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use portcullis_core::error::PortcullisError;
use serde::{Deserialize, Serialize};
use surrealdb::Connection;
use uuid::Uuid;

use super::users::{UserResponse, render};
use crate::error::{ApiResult, Detail};
use crate::state::AppState;

const REQUESTED: &str = "If the email is registered, a password reset has been issued";

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetConfirmation {
    pub password: String,
}

/// Public view of a reset; omits the owning user.
#[derive(Debug, Serialize)]
pub struct ResetStatus {
    pub id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// POST /password-resets
pub async fn request<C: Connection>(
    State(state): State<AppState<C>>,
    Json(input): Json<ResetRequest>,
) -> ApiResult<(StatusCode, Json<Detail>)> {
    state.auth.request_password_reset(&input.email).await?;
    Ok((StatusCode::ACCEPTED, Json(Detail::new(REQUESTED))))
}

/// GET /password-resets/{id}
pub async fn status<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ResetStatus>> {
    let reset = state
        .auth
        .get_password_reset(id)
        .await?
        .ok_or_else(|| PortcullisError::not_found("PasswordReset", id.to_string()))?;

    Ok(Json(ResetStatus {
        id: reset.id,
        expires_at: reset.expires_at,
        used: reset.used,
    }))
}

/// POST /password-resets/{id}
pub async fn confirm<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
    Json(input): Json<ResetConfirmation>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth.confirm_password_reset(id, input.password).await?;
    Ok(Json(render(&state, user).await?))
}
