//! Menu and category routes. Reads are public; writes need an admin.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;

use dine_core::catalog::{CategoryInput, MenuItemInput};
use dine_core::{Category, MenuItem};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/menu", get(list_menu).post(create_menu_item))
        .route("/api/menu/{id}", put(update_menu_item).delete(delete_menu_item))
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/admin", get(list_all_categories))
        .route("/api/categories/{id}", put(update_category).delete(delete_category))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

async fn list_menu(State(state): State<AppState>) -> ApiResult<Json<Vec<MenuItem>>> {
    Ok(Json(state.catalog().list_menu().await?))
}

async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<MenuItemInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MenuItem>)> {
    user.require_admin()?;
    let Json(input) = body?;
    let item = state.catalog().create_menu_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<MenuItemInput>, JsonRejection>,
) -> ApiResult<Json<MenuItem>> {
    user.require_admin()?;
    let Path(id) = id?;
    let Json(input) = body?;
    Ok(Json(state.catalog().update_menu_item(&id, input).await?))
}

async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    user.require_admin()?;
    let Path(id) = id?;
    state.catalog().delete_menu_item(&id).await?;
    Ok(Json(MessageResponse {
        message: "Item deleted successfully",
    }))
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.catalog().list_categories(false).await?))
}

async fn list_all_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Category>>> {
    user.require_admin()?;
    Ok(Json(state.catalog().list_categories(true).await?))
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CategoryInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    user.require_admin()?;
    let Json(input) = body?;
    let category = state.catalog().create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<CategoryInput>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    user.require_admin()?;
    let Path(id) = id?;
    let Json(input) = body?;
    Ok(Json(state.catalog().update_category(&id, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    user.require_admin()?;
    let Path(id) = id?;
    state.catalog().delete_category(&id).await?;
    Ok(Json(MessageResponse {
        message: "Category deleted successfully",
    }))
}
