//! # Catalog Repository
//!
//! Categories and menu items. Updates take a patch whose `None` fields keep
//! the stored value (`COALESCE(?, column)`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dine_core::catalog::{CategoryPatch, MenuItemPatch, NewCategory, NewMenuItem};
use dine_core::{Category, MenuItem, MenuItemKind, Money};

const CATEGORY_COLUMNS: &str = "id, name, description, sort_order, is_active, created_at, updated_at";

const MENU_ITEM_SELECT: &str = r#"
    SELECT m.id, m.name, m.price, m.category_id, c.name AS category_name, m.kind,
           m.description, m.is_available, m.tax_rate_bps, m.created_at, m.updated_at
    FROM menu_items m
    LEFT JOIN categories c ON c.id = m.category_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    description: Option<String>,
    sort_order: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: String,
    name: String,
    price: i64,
    category_id: Option<String>,
    category_name: Option<String>,
    kind: MenuItemKind,
    description: Option<String>,
    is_available: bool,
    tax_rate_bps: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MenuItemRow> for MenuItem {
    type Error = DbError;

    fn try_from(row: MenuItemRow) -> DbResult<Self> {
        let tax_rate_bps = u32::try_from(row.tax_rate_bps)
            .map_err(|_| DbError::Corrupt(format!("menu item {}: tax_rate_bps out of range", row.id)))?;

        Ok(MenuItem {
            id: row.id,
            name: row.name,
            price: Money::from_units(row.price),
            category_id: row.category_id,
            category_name: row.category_name,
            kind: row.kind,
            description: row.description,
            is_available: row.is_available,
            tax_rate_bps,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Categories in display order. `active_only` hides inactive ones.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE (?1 = 0 OR is_active = 1) ORDER BY sort_order, name",
            CATEGORY_COLUMNS
        );

        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS);

        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Category::from))
    }

    pub async fn insert(&self, new: &NewCategory) -> DbResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            description: new.description.clone(),
            sort_order: new.sort_order,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, sort_order, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.sort_order)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(category_id = %category.id, name = %category.name, "Inserted category");
        Ok(category)
    }

    /// Applies `patch` and returns the stored result, or `None` if the
    /// category does not exist.
    pub async fn update(&self, id: &str, patch: &CategoryPatch) -> DbResult<Option<Category>> {
        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = COALESCE(?2, name),
                description = CASE WHEN ?3 IS NULL THEN description ELSE NULLIF(?3, '') END,
                sort_order = COALESCE(?4, sort_order),
                is_active = COALESCE(?5, is_active),
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.sort_order)
        .bind(patch.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Items in a deleted category keep existing with no category.
    ///
    /// ## Returns
    /// `false` when no category had this id.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Menu Items
// =============================================================================

#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Every item, grouped by category display order.
    pub async fn list(&self) -> DbResult<Vec<MenuItem>> {
        let sql = format!(
            "{} ORDER BY COALESCE(c.sort_order, 0), c.name, m.name, m.id",
            MENU_ITEM_SELECT
        );

        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MenuItem::try_from).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let sql = format!("{} WHERE m.id = ?1", MENU_ITEM_SELECT);

        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MenuItem::try_from).transpose()
    }

    /// ## Errors
    /// * `ConstraintViolation` - `category_id` names no category
    pub async fn insert(&self, new: &NewMenuItem) -> DbResult<MenuItem> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, name, price, category_id, kind, description, is_available,
                tax_rate_bps, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&id)
        .bind(&new.name)
        .bind(new.price.units())
        .bind(&new.category_id)
        .bind(new.kind)
        .bind(&new.description)
        .bind(new.is_available)
        .bind(i64::from(new.tax_rate.bps()))
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(item_id = %id, name = %new.name, "Inserted menu item");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("MenuItem", id))
    }

    /// Applies `patch` and returns the stored result, or `None` if the item
    /// does not exist.
    pub async fn update(&self, id: &str, patch: &MenuItemPatch) -> DbResult<Option<MenuItem>> {
        let result = sqlx::query(
            r#"
            UPDATE menu_items SET
                name = COALESCE(?2, name),
                price = COALESCE(?3, price),
                category_id = COALESCE(?4, category_id),
                kind = COALESCE(?5, kind),
                description = CASE WHEN ?6 IS NULL THEN description ELSE NULLIF(?6, '') END,
                is_available = COALESCE(?7, is_available),
                tax_rate_bps = COALESCE(?8, tax_rate_bps),
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.price.map(|p| p.units()))
        .bind(&patch.category_id)
        .bind(patch.kind)
        .bind(&patch.description)
        .bind(patch.is_available)
        .bind(patch.tax_rate.map(|t| i64::from(t.bps())))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// ## Returns
    /// `false` when no item had this id.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
