//! Registration, token and Telegram link endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        notification::NotificationTarget,
        user::{LinkTelegram, LoginRequest, RegisterUser, TokenResponse, User},
    },
};

use super::AuthenticatedUser;

/// Register a new user
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<User>)> {
    let Json(request) = payload?;
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Obtain a bearer token
#[utoipa::path(
    post,
    path = "/users/token",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn token(
    State(state): State<crate::AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(request) = payload?;
    let token = state.services.users.login(request).await?;
    Ok(Json(token))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;
    Ok(Json(user))
}

/// Link the caller to a Telegram chat
#[utoipa::path(
    put,
    path = "/users/me/telegram",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = LinkTelegram,
    responses(
        (status = 200, description = "Chat linked", body = NotificationTarget),
        (status = 409, description = "Chat linked to another user")
    )
)]
pub async fn link_telegram(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: Result<Json<LinkTelegram>, JsonRejection>,
) -> AppResult<Json<NotificationTarget>> {
    let Json(request) = payload?;
    let target = state
        .services
        .notifications
        .link_chat(claims.user_id, request.chat_id)
        .await?;
    Ok(Json(target))
}

/// Unlink the caller's Telegram chat
#[utoipa::path(
    delete,
    path = "/users/me/telegram",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Chat unlinked"),
        (status = 404, description = "No chat linked")
    )
)]
pub async fn unlink_telegram(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<StatusCode> {
    state.services.notifications.unlink_chat(claims.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
