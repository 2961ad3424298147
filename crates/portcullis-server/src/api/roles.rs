//! `/roles` handlers.
//!
//! A role is rendered together with the names of its permissions.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use portcullis_core::error::PortcullisError;
use portcullis_core::models::role::{CreateRole, Role, UpdateRole};
use portcullis_core::repository::{PermissionRepository, RoleRepository};
use serde::Serialize;
use surrealdb::Connection;

use crate::error::{ApiResult, Detail};
use crate::state::AppState;

const ENTITY: &str = "Role";

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<String>,
    /// Requested permission names that matched nothing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_permissions: Vec<String>,
}

async fn render<C: Connection>(
    state: &AppState<C>,
    role: Role,
    unresolved_permissions: Vec<String>,
) -> ApiResult<RoleResponse> {
    let permissions = state
        .permissions
        .get_role_permissions(role.id)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    Ok(RoleResponse {
        role,
        permissions,
        unresolved_permissions,
    })
}

async fn find<C: Connection>(state: &AppState<C>, name: &str) -> ApiResult<Role> {
    Ok(state
        .roles
        .get_by_name(name)
        .await?
        .ok_or_else(|| PortcullisError::not_found(ENTITY, name))?)
}

/// POST /roles
pub async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    Json(input): Json<CreateRole>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state.roles.create(input).await?;
    Ok((StatusCode::CREATED, Json(render(&state, role, Vec::new()).await?)))
}

/// GET /roles
pub async fn list<C: Connection>(
    State(state): State<AppState<C>>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let mut out = Vec::new();
    for role in state.roles.list().await? {
        out.push(render(&state, role, Vec::new()).await?);
    }
    Ok(Json(out))
}

/// GET /roles/{name}
pub async fn detail<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = find(&state, &name).await?;
    Ok(Json(render(&state, role, Vec::new()).await?))
}

/// PUT /roles/{name}
///
/// `permissions` is merged into the role's set; unknown names are
/// skipped and echoed back in `unresolved_permissions`.
pub async fn update<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
    Json(input): Json<UpdateRole>,
) -> ApiResult<Json<RoleResponse>> {
    let existing = find(&state, &name).await?;
    if input.is_empty() {
        return Err(PortcullisError::bad_request("No updatable fields supplied").into());
    }

    let outcome = state.roles.update(existing.id, input).await?;
    Ok(Json(
        render(&state, outcome.role, outcome.unresolved_permissions).await?,
    ))
}

/// DELETE /roles/{name}
pub async fn delete<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Detail>> {
    let existing = find(&state, &name).await?;
    state.roles.delete(existing.id).await?;
    Ok(Json(Detail::new(format!("Role {name} deleted"))))
}
