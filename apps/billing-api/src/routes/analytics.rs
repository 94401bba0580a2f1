//! Sales analytics route.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use dine_core::analytics::SalesReport;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::AnalyticsQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/analytics", get(analytics))
}

async fn analytics(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<SalesReport>> {
    let Query(query) = query?;
    tracing::debug!(user_id = %user.id, ?query, "Analytics requested");
    Ok(Json(state.reports().analytics(&query).await?))
}
