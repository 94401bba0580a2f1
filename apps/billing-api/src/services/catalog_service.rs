//! Menu and category management.
//!
//! Listings are read on every ordering screen load and change rarely, so
//! they are cached under [`CATALOG_CACHE_PREFIX`] and every write clears the
//! whole prefix.

use std::sync::Arc;

use tracing::{debug, info};

use dine_core::catalog::{CategoryInput, MenuItemInput};
use dine_core::{Category, MenuItem, ValidationError, CATALOG_CACHE_PREFIX};
use dine_db::{Database, DbError};

use crate::cache::{get_json, set_json, ReadCache};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
    cache: Arc<dyn ReadCache>,
    config: Arc<ApiConfig>,
}

impl CatalogService {
    pub fn new(db: Database, cache: Arc<dyn ReadCache>, config: Arc<ApiConfig>) -> Self {
        CatalogService { db, cache, config }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Categories in display order; inactive ones only when `include_inactive`.
    pub async fn list_categories(&self, include_inactive: bool) -> ApiResult<Vec<Category>> {
        let key = if include_inactive {
            format!("{}:categories:all", CATALOG_CACHE_PREFIX)
        } else {
            format!("{}:categories:active", CATALOG_CACHE_PREFIX)
        };

        if let Some(categories) = get_json::<Vec<Category>>(self.cache.as_ref(), &key) {
            debug!(key = %key, "Categories served from cache");
            return Ok(categories);
        }

        let categories = self.db.categories().list(!include_inactive).await?;
        set_json(self.cache.as_ref(), &key, &categories, self.config.catalog_ttl());
        Ok(categories)
    }

    pub async fn create_category(&self, input: CategoryInput) -> ApiResult<Category> {
        let new = input.validate_new()?;
        let category = self.db.categories().insert(&new).await?;

        info!(category_id = %category.id, name = %category.name, "Created category");
        self.invalidate();
        Ok(category)
    }

    pub async fn update_category(&self, id: &str, input: CategoryInput) -> ApiResult<Category> {
        let patch = input.validate_patch()?;
        let category = self
            .db
            .categories()
            .update(id, &patch)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;

        info!(category_id = %category.id, "Updated category");
        self.invalidate();
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> ApiResult<()> {
        if !self.db.categories().delete(id).await? {
            return Err(ApiError::not_found("Category not found"));
        }

        info!(category_id = %id, "Deleted category");
        self.invalidate();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Menu items
    // -------------------------------------------------------------------------

    pub async fn list_menu(&self) -> ApiResult<Vec<MenuItem>> {
        let key = format!("{}:menu", CATALOG_CACHE_PREFIX);

        if let Some(items) = get_json::<Vec<MenuItem>>(self.cache.as_ref(), &key) {
            debug!(count = items.len(), "Menu served from cache");
            return Ok(items);
        }

        let items = self.db.menu().list().await?;
        set_json(self.cache.as_ref(), &key, &items, self.config.catalog_ttl());
        Ok(items)
    }

    pub async fn create_menu_item(&self, input: MenuItemInput) -> ApiResult<MenuItem> {
        let new = input.validate_new()?;
        self.ensure_category(new.category_id.as_deref()).await?;

        let item = self.db.menu().insert(&new).await.map_err(unknown_category)?;

        info!(item_id = %item.id, name = %item.name, price = %item.price, "Created menu item");
        self.invalidate();
        Ok(item)
    }

    pub async fn update_menu_item(&self, id: &str, input: MenuItemInput) -> ApiResult<MenuItem> {
        let patch = input.validate_patch()?;
        self.ensure_category(patch.category_id.as_deref()).await?;

        let item = self
            .db
            .menu()
            .update(id, &patch)
            .await
            .map_err(unknown_category)?
            .ok_or_else(|| ApiError::not_found("Menu item not found"))?;

        info!(item_id = %item.id, "Updated menu item");
        self.invalidate();
        Ok(item)
    }

    pub async fn delete_menu_item(&self, id: &str) -> ApiResult<()> {
        if !self.db.menu().delete(id).await? {
            return Err(ApiError::not_found("Menu item not found"));
        }

        info!(item_id = %id, "Deleted menu item");
        self.invalidate();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn ensure_category(&self, category_id: Option<&str>) -> ApiResult<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };

        if self.db.categories().get_by_id(category_id).await?.is_none() {
            return Err(no_such_category().into());
        }
        Ok(())
    }

    fn invalidate(&self) {
        self.cache.clear(CATALOG_CACHE_PREFIX);
    }
}

fn no_such_category() -> ValidationError {
    ValidationError::InvalidFormat {
        field: "category".to_string(),
        reason: "no such category".to_string(),
    }
}

/// The category was deleted between the existence check and the write.
fn unknown_category(error: DbError) -> ApiError {
    match error {
        DbError::ConstraintViolation(_) => no_such_category().into(),
        other => other.into(),
    }
}
