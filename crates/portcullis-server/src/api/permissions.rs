//! `/permissions` handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use portcullis_core::error::PortcullisError;
use portcullis_core::models::permission::{CreatePermission, Permission, UpdatePermission};
use portcullis_core::repository::PermissionRepository;
use surrealdb::Connection;

use crate::error::{ApiResult, Detail};
use crate::state::AppState;

const ENTITY: &str = "Permission";

async fn find<C: Connection>(state: &AppState<C>, name: &str) -> ApiResult<Permission> {
    Ok(state
        .permissions
        .get_by_name(name)
        .await?
        .ok_or_else(|| PortcullisError::not_found(ENTITY, name))?)
}

/// POST /permissions
pub async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    Json(input): Json<CreatePermission>,
) -> ApiResult<(StatusCode, Json<Permission>)> {
    let permission = state.permissions.create(input).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

/// GET /permissions
pub async fn list<C: Connection>(
    State(state): State<AppState<C>>,
) -> ApiResult<Json<Vec<Permission>>> {
    Ok(Json(state.permissions.list().await?))
}

/// GET /permissions/{name}
pub async fn detail<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Permission>> {
    Ok(Json(find(&state, &name).await?))
}

/// PUT /permissions/{name}
pub async fn update<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
    Json(input): Json<UpdatePermission>,
) -> ApiResult<Json<Permission>> {
    let existing = find(&state, &name).await?;
    if input.is_empty() {
        return Err(PortcullisError::bad_request("No updatable fields supplied").into());
    }

    let permission = state.permissions.update(existing.id, input).await?;
    Ok(Json(permission))
}

/// DELETE /permissions/{name}
pub async fn delete<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Detail>> {
    let existing = find(&state, &name).await?;
    state.permissions.delete(existing.id).await?;
    Ok(Json(Detail::new(format!("Permission {name} deleted"))))
}
