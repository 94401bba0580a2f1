//! Order and bill routes.
//!
//! Handlers only unpack the request and pick the status code; the workflow
//! lives in [`OrderService`](crate::services::OrderService).

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use dine_core::order::{BillInput, SaveOrderInput, SettleInput};
use dine_core::{BillPage, Order};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::ListBillsQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bills", get(list_bills))
        .route("/api/bills/open", get(list_open))
        .route("/api/bills/active/{table}", get(active_for_table))
        .route("/api/bills/save", post(save))
        .route("/api/bills/generate/{id}", post(generate_bill))
        .route("/api/bills/settle/{id}", post(settle))
        .route("/api/bills/cancel/{id}", post(cancel))
        .route("/api/bills/{id}", get(get_order).delete(delete_bill))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    message: &'static str,
    id: String,
}

async fn active_for_table(
    State(state): State<AppState>,
    table: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Option<Order>>> {
    let Path(table) = table?;
    Ok(Json(state.orders().active_for_table(&table).await?))
}

async fn list_open(State(state): State<AppState>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders().list_open().await?))
}

async fn save(
    State(state): State<AppState>,
    body: Result<Json<SaveOrderInput>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let Json(input) = body?;
    Ok(Json(state.orders().save(input).await?))
}

async fn generate_bill(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<BillInput>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let Path(id) = id?;
    let Json(input) = body?;
    Ok(Json(state.orders().generate_bill(&id, input).await?))
}

async fn settle(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<SettleInput>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let Path(id) = id?;
    let Json(input) = body?;
    Ok(Json(state.orders().settle(&id, input).await?))
}

async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Order>> {
    user.require_admin()?;
    let Path(id) = id?;
    tracing::info!(user_id = %user.id, order_id = %id, "Cancel requested");
    Ok(Json(state.orders().cancel(&id).await?))
}

async fn list_bills(
    State(state): State<AppState>,
    query: Result<Query<ListBillsQuery>, QueryRejection>,
) -> ApiResult<Json<BillPage>> {
    let Query(query) = query?;
    Ok(Json(state.orders().list_bills(&query).await?))
}

async fn get_order(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Order>> {
    let Path(id) = id?;
    Ok(Json(state.orders().get(&id).await?))
}

async fn delete_bill(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    user.require_admin()?;
    let Path(id) = id?;
    tracing::info!(user_id = %user.id, order_id = %id, "Delete requested");
    state.orders().delete(&id).await?;

    Ok(Json(DeleteResponse {
        message: "Bill deleted successfully",
        id,
    }))
}
