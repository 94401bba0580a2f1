//! Shared application state.

use std::sync::Arc;

use dine_db::Database;

use crate::auth::JwtManager;
use crate::cache::{MemoryCache, ReadCache};
use crate::config::ApiConfig;
use crate::services::{AccountService, CatalogService, OrderService, ReportService};
use crate::sessions::SessionRegistry;

/// State handed to every handler. Clones share the same pool, cache, keys
/// and session registry.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: Arc<dyn ReadCache>,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// State with a fresh [`MemoryCache`].
    pub fn new(db: Database, config: ApiConfig) -> Self {
        Self::with_cache(db, config, Arc::new(MemoryCache::new()))
    }

    pub fn with_cache(db: Database, config: ApiConfig, cache: Arc<dyn ReadCache>) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.token_lifetime_secs);
        AppState {
            db,
            cache,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.clone(), self.cache.clone(), self.config.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone(), self.cache.clone(), self.config.clone())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.db.clone(), self.cache.clone(), self.config.clone())
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(
            self.db.clone(),
            self.jwt.clone(),
            self.sessions.clone(),
            self.config.clone(),
        )
    }
}
