//! # storekeep_api
//!
//! HTTP API library for Storekeep.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use sqlx::PgPool;
use storekeep_core::auth::AuthError;
use storekeep_core::auth::jwt::TokenCodec;
use storekeep_core::auth::session::SessionService;
use storekeep_core::products::ProductService;
use storekeep_core::store::{ProductStore, UserStore};
use storekeep_core::users::UserService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, ping, products, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub users: UserService,
    pub products: ProductService,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire services over the given stores. Fails when the signing secret is
    /// unusable.
    pub fn new(
        config: ApiConfig,
        user_store: Arc<dyn UserStore>,
        product_store: Arc<dyn ProductStore>,
    ) -> Result<Self, AuthError> {
        let codec = TokenCodec::new(&config.jwt_secret)?;
        let sessions = SessionService::new(user_store.clone(), codec, config.tokens)
            .with_store_timeout(config.store_timeout);
        let users = UserService::new(user_store).with_store_timeout(config.store_timeout);
        let products =
            ProductService::new(product_store).with_store_timeout(config.store_timeout);
        Ok(Self {
            sessions,
            users,
            products,
            config,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `storekeep_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    storekeep_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_PING, get(ping::ping))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_CREATE, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(routes::PUT_AUTH_PASSWORD, put(auth::change_password_handler))
        .route(routes::USERS, get(users::list_users_handler))
        .route(
            routes::USERS_ID,
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(routes::PUT_USERS_ID_ACTIVE, put(users::set_active_handler))
        .route(
            routes::PRODUCTS,
            get(products::list_products_handler).post(products::create_product_handler),
        )
        .route(
            routes::PRODUCTS_ID,
            get(products::get_product_handler)
                .put(products::update_product_handler)
                .delete(products::delete_product_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
