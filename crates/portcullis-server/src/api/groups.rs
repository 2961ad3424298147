//! `/groups` handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use portcullis_core::error::PortcullisError;
use portcullis_core::models::group::{CreateGroup, Group, UpdateGroup};
use portcullis_core::repository::{GroupRepository, RoleRepository};
use serde::Serialize;
use surrealdb::Connection;

use crate::error::{ApiResult, Detail};
use crate::state::AppState;

const ENTITY: &str = "Group";

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    #[serde(flatten)]
    pub group: Group,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_roles: Vec<String>,
}

async fn render<C: Connection>(
    state: &AppState<C>,
    group: Group,
    unresolved_roles: Vec<String>,
) -> ApiResult<GroupResponse> {
    let roles = state
        .roles
        .get_group_roles(group.id)
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();

    Ok(GroupResponse {
        group,
        roles,
        unresolved_roles,
    })
}

async fn find<C: Connection>(state: &AppState<C>, name: &str) -> ApiResult<Group> {
    Ok(state
        .groups
        .get_by_name(name)
        .await?
        .ok_or_else(|| PortcullisError::not_found(ENTITY, name))?)
}

/// POST /groups
pub async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    Json(input): Json<CreateGroup>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    let group = state.groups.create(input).await?;
    Ok((StatusCode::CREATED, Json(render(&state, group, Vec::new()).await?)))
}

/// GET /groups
pub async fn list<C: Connection>(
    State(state): State<AppState<C>>,
) -> ApiResult<Json<Vec<GroupResponse>>> {
    let mut out = Vec::new();
    for group in state.groups.list().await? {
        out.push(render(&state, group, Vec::new()).await?);
    }
    Ok(Json(out))
}

/// GET /groups/{name}
pub async fn detail<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> ApiResult<Json<GroupResponse>> {
    let group = find(&state, &name).await?;
    Ok(Json(render(&state, group, Vec::new()).await?))
}

/// PUT /groups/{name}
pub async fn update<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
    Json(input): Json<UpdateGroup>,
) -> ApiResult<Json<GroupResponse>> {
    let existing = find(&state, &name).await?;
    if input.is_empty() {
        return Err(PortcullisError::bad_request("No updatable fields supplied").into());
    }

    let outcome = state.groups.update(existing.id, input).await?;
    Ok(Json(
        render(&state, outcome.group, outcome.unresolved_roles).await?,
    ))
}

/// DELETE /groups/{name}
pub async fn delete<C: Connection>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Detail>> {
    let existing = find(&state, &name).await?;
    state.groups.delete(existing.id).await?;
    Ok(Json(Detail::new(format!("Group {name} deleted"))))
}
