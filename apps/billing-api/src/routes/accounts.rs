//! Login, logout and account creation routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use dine_core::account::Credentials;
use dine_core::User;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::LoginResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/admin/setup", post(setup_admin))
        .route("/api/auth/admin/create", post(create_admin))
        .route("/api/auth/users", post(create_staff))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AccountCreated {
    message: &'static str,
    user: User,
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(credentials) = body?;
    Ok(Json(state.accounts().login(credentials).await?))
}

async fn logout(State(state): State<AppState>, user: AuthUser) -> Json<LogoutResponse> {
    state.accounts().logout(&user);
    Json(LogoutResponse {
        message: "Logged out successfully",
    })
}

async fn setup_admin(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccountCreated>)> {
    let Json(credentials) = body?;
    let user = state.accounts().setup_admin(credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            message: "Initial admin user created successfully",
            user,
        }),
    ))
}

/// Open until the first admin exists. An invalid token counts as no token.
async fn create_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccountCreated>)> {
    let caller = AuthUser::from_headers_optional(&headers, &state.jwt);
    let Json(credentials) = body?;
    let user = state.accounts().create_admin(credentials, caller.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            message: "Admin user created successfully",
            user,
        }),
    ))
}

async fn create_staff(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccountCreated>)> {
    user.require_admin()?;
    let Json(credentials) = body?;
    let created = state.accounts().create_staff(credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            message: "User created successfully",
            user: created,
        }),
    ))
}
