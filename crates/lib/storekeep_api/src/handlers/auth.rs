//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use storekeep_core::models::auth::User;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, RegisterResponse,
    TokenResponse,
};
use crate::services::cookies::{REFRESH_COOKIE, clear_refresh_cookie, refresh_cookie};

fn token_response(state: &AppState, access_token: String, user: Option<User>) -> TokenResponse {
    TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.sessions.settings().access_ttl.num_seconds(),
        user,
    }
}

/// `POST /auth/login`: authenticate with username (or email) + password.
///
/// The refresh token goes out only as an httpOnly cookie; `remember` makes it
/// outlive the browser session.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let outcome = state.sessions.login(&body.username, &body.password).await?;

    let max_age = body.remember.unwrap_or(false).then(|| {
        time::Duration::seconds(state.sessions.settings().refresh_ttl.num_seconds())
    });
    let cookie = refresh_cookie(&outcome.refresh_token, max_age, state.config.secure_cookies);

    let resp = token_response(&state, outcome.access_token, Some(outcome.user));
    Ok((jar.add(cookie), Json(resp)))
}

/// `POST /auth/refresh`: mint a new access token from the refresh cookie.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<TokenResponse>> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            debug!("refresh rejected: no refresh cookie");
            AppError::unauthorized("missing_refresh_token", "Refresh token cookie is missing")
        })?;

    let access_token = state.sessions.refresh(&token).await?;
    Ok(Json(token_response(&state, access_token, None)))
}

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.sessions.register(body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created".to_string(),
            user,
        }),
    ))
}

/// `POST /auth/logout`: clear the refresh cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(clear_refresh_cookie(state.config.secure_cookies));
    (
        jar,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// `GET /auth/me`: the caller's current user record.
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(user.user_id()).await?))
}

/// `PUT /auth/password`: change the caller's own password.
pub async fn change_password_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.users.change_password(&user.0, body.into()).await?;
    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}
