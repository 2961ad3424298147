//! `/users` handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use portcullis_core::error::PortcullisError;
use portcullis_core::models::user::{CreateUser, User};
use portcullis_core::repository::{RoleRepository, UserRepository};
use serde::Serialize;
use surrealdb::Connection;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// A user with the names of the roles granted to it. The password hash
/// is never serialized.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

pub(crate) async fn render<C: Connection>(
    state: &AppState<C>,
    user: User,
) -> ApiResult<UserResponse> {
    let roles = state
        .roles
        .get_user_roles(user.id)
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    Ok(UserResponse { user, roles })
}

/// POST /users
pub async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    Json(input): Json<CreateUser>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state.users.create(input).await?;
    Ok((StatusCode::CREATED, Json(render(&state, user).await?)))
}

/// GET /users/{id}
pub async fn detail<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| PortcullisError::not_found("User", id.to_string()))?;
    Ok(Json(render(&state, user).await?))
}

/// PUT /users/{id}/roles/{name}
pub async fn grant_role<C: Connection>(
    State(state): State<AppState<C>>,
    Path((id, role_name)): Path<(Uuid, String)>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| PortcullisError::not_found("User", id.to_string()))?;
    let role = state
        .roles
        .get_by_name(&role_name)
        .await?
        .ok_or_else(|| PortcullisError::not_found("Role", role_name.as_str()))?;

    state.users.grant_role(user.id, role.id).await?;
    Ok(Json(render(&state, user).await?))
}
