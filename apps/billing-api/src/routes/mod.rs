//! HTTP routes.
//!
//! ```text
//! GET    /health                     public
//! GET    /api/bills/active/{table}   public
//! GET    /api/bills/open             public
//! POST   /api/bills/save             public
//! POST   /api/bills/generate/{id}    public
//! POST   /api/bills/settle/{id}      public
//! POST   /api/bills/cancel/{id}      admin
//! GET    /api/bills                  public
//! GET    /api/bills/{id}             public
//! DELETE /api/bills/{id}             admin
//! GET    /api/analytics              authenticated
//! GET    /api/menu                   public
//! POST   /api/menu                   admin
//! PUT    /api/menu/{id}              admin
//! DELETE /api/menu/{id}              admin
//! GET    /api/categories             public (active only)
//! GET    /api/categories/admin       admin
//! POST   /api/categories             admin
//! PUT    /api/categories/{id}        admin
//! DELETE /api/categories/{id}        admin
//! POST   /api/auth/login             public
//! POST   /api/auth/logout            authenticated
//! POST   /api/auth/admin/setup       public, until an admin exists
//! POST   /api/auth/admin/create      public until an admin exists, then admin
//! POST   /api/auth/users             admin
//! ```

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod accounts;
pub mod analytics;
pub mod bills;
pub mod catalog;
pub mod health;

/// Builds the application with middleware and state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(bills::router())
        .merge(analytics::router())
        .merge(catalog::router())
        .merge(accounts::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
