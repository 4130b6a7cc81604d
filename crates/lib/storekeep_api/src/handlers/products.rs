//! Product catalog handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use storekeep_core::models::product::{Product, ProductDraft};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthenticatedUser;

/// `GET /products`
pub async fn list_products_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.products.list().await?))
}

/// `GET /products/{id}`
pub async fn get_product_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.products.get(id).await?))
}

/// `POST /products`
pub async fn create_product_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = state.products.create(draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /products/{id}`: absent fields keep their stored value.
pub async fn update_product_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.products.update(id, draft).await?))
}

/// `DELETE /products/{id}`
pub async fn delete_product_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    state.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
