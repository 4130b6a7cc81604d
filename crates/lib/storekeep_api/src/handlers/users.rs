//! User management handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use storekeep_core::models::auth::User;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{SetActiveRequest, UpdateUserRequest};

/// `GET /users`
pub async fn list_users_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

/// `GET /users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(id).await?))
}

/// `PUT /users/{id}`: self or admin.
pub async fn update_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update(&user.0, id, body.into()).await?))
}

/// `DELETE /users/{id}`: self or admin.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    state.users.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /users/{id}/active`: admin only.
pub async fn set_active_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<SetActiveRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.set_active(&user.0, id, body.active).await?))
}
