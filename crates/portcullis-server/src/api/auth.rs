//! `POST /login`.

use axum::{Json, extract::State};
use serde::Deserialize;
use surrealdb::Connection;

use super::users::{UserResponse, render};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /login
///
/// Answers 400 with the same message whether the email is unknown or
/// the password is wrong.
pub async fn login<C: Connection>(
    State(state): State<AppState<C>>,
    Json(input): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth.authenticate(&input.email, &input.password).await?;
    Ok(Json(render(&state, user).await?))
}
