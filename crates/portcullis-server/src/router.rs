//! Route table.

use axum::{
    Router,
    routing::{get, post, put},
};
use surrealdb::Connection;
use tower_http::trace::TraceLayer;

use crate::api::{auth, groups, health, password_resets, permissions, roles, users};
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn create_router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/permissions",
            post(permissions::create::<C>).get(permissions::list::<C>),
        )
        .route(
            "/permissions/{name}",
            get(permissions::detail::<C>)
                .put(permissions::update::<C>)
                .delete(permissions::delete::<C>),
        )
        .route("/roles", post(roles::create::<C>).get(roles::list::<C>))
        .route(
            "/roles/{name}",
            get(roles::detail::<C>)
                .put(roles::update::<C>)
                .delete(roles::delete::<C>),
        )
        .route("/groups", post(groups::create::<C>).get(groups::list::<C>))
        .route(
            "/groups/{name}",
            get(groups::detail::<C>)
                .put(groups::update::<C>)
                .delete(groups::delete::<C>),
        )
        .route("/users", post(users::create::<C>))
        .route("/users/{id}", get(users::detail::<C>))
        .route("/users/{id}/roles/{name}", put(users::grant_role::<C>))
        .route("/login", post(auth::login::<C>))
        .route("/password-resets", post(password_resets::request::<C>))
        .route(
            "/password-resets/{id}",
            get(password_resets::status::<C>).post(password_resets::confirm::<C>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
