//! # Menu Catalog
//!
//! Categories and menu items shown on the ordering screen.
//!
//! ```text
//! Category ◄──── MenuItem.category_id   (NULL once the category is deleted)
//!
//! CategoryInput ──validate_new()──►   NewCategory
//!               ──validate_patch()──► CategoryPatch
//! MenuItemInput ──validate_new()──►   NewMenuItem
//!               ──validate_patch()──► MenuItemPatch
//! ```
//!
//! Orders copy name and price onto their lines, so editing the catalog never
//! changes an order that already exists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::TaxRate;
use crate::validation::{
    validate_optional_text, validate_price, validate_tax_percent, LooseNumber, ValidationResult,
};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Ascending; ties break on name.
    pub sort_order: i64,
    /// Inactive categories are hidden from the ordering screen.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Dietary marker printed next to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
pub enum MenuItemKind {
    #[default]
    #[serde(rename = "veg")]
    Veg,
    #[serde(rename = "non-veg")]
    NonVeg,
}

impl fmt::Display for MenuItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItemKind::Veg => write!(f, "veg"),
            MenuItemKind::NonVeg => write!(f, "non-veg"),
        }
    }
}

impl FromStr for MenuItemKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "veg" => Ok(MenuItemKind::Veg),
            "nonveg" => Ok(MenuItemKind::NonVeg),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: vec!["veg".to_string(), "non-veg".to_string()],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub category_id: Option<String>,
    /// Joined from the category for display.
    pub category_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: MenuItemKind,
    pub description: Option<String>,
    pub is_available: bool,
    /// Suggested tax rate in basis points.
    pub tax_rate_bps: u32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Category Input
// =============================================================================

/// Category fields as the admin screen sends them. Every field is optional
/// so the same shape serves create and partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: Option<LooseNumber>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

/// `None` keeps the stored value. A blank description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

impl CategoryInput {
    pub fn named(name: &str) -> Self {
        CategoryInput {
            name: Some(name.to_string()),
            ..CategoryInput::default()
        }
    }

    pub fn validate_new(&self) -> ValidationResult<NewCategory> {
        let patch = self.validate_patch()?;
        let name = patch.name.ok_or_else(|| ValidationError::Required {
            field: "name".to_string(),
        })?;

        Ok(NewCategory {
            name,
            description: patch.description.filter(|d| !d.is_empty()),
            sort_order: patch.sort_order.unwrap_or(0),
            is_active: patch.is_active.unwrap_or(true),
        })
    }

    pub fn validate_patch(&self) -> ValidationResult<CategoryPatch> {
        Ok(CategoryPatch {
            name: self.name.as_deref().map(validate_catalog_name).transpose()?,
            description: validate_optional_text(
                self.description.as_deref(),
                "description",
                MAX_DESCRIPTION_LEN,
            )?,
            sort_order: self
                .sort_order
                .as_ref()
                .map(|n| n.to_whole("sortOrder"))
                .transpose()?,
            is_active: self.is_active,
        })
    }
}

// =============================================================================
// Menu Item Input
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<LooseNumber>,
    /// Category id.
    #[serde(default, alias = "categoryId")]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    /// Percentage, e.g. `5` for 5%.
    #[serde(default)]
    pub tax_rate: Option<LooseNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenuItem {
    pub name: String,
    pub price: Money,
    pub category_id: Option<String>,
    pub kind: MenuItemKind,
    pub description: Option<String>,
    pub is_available: bool,
    pub tax_rate: TaxRate,
}

/// `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub category_id: Option<String>,
    pub kind: Option<MenuItemKind>,
    pub description: Option<String>,
    pub is_available: Option<bool>,
    pub tax_rate: Option<TaxRate>,
}

impl MenuItemInput {
    pub fn new(name: &str, price: i64, category_id: Option<&str>) -> Self {
        MenuItemInput {
            name: Some(name.to_string()),
            price: Some(LooseNumber::Int(price)),
            category: category_id.map(str::to_string),
            ..MenuItemInput::default()
        }
    }

    pub fn validate_new(&self) -> ValidationResult<NewMenuItem> {
        let patch = self.validate_patch()?;
        let name = patch.name.ok_or_else(|| ValidationError::Required {
            field: "name".to_string(),
        })?;
        let price = patch.price.ok_or_else(|| ValidationError::Required {
            field: "price".to_string(),
        })?;

        Ok(NewMenuItem {
            name,
            price,
            category_id: patch.category_id,
            kind: patch.kind.unwrap_or_default(),
            description: patch.description.filter(|d| !d.is_empty()),
            is_available: patch.is_available.unwrap_or(true),
            tax_rate: patch.tax_rate.unwrap_or_default(),
        })
    }

    pub fn validate_patch(&self) -> ValidationResult<MenuItemPatch> {
        let price = match &self.price {
            Some(price) => {
                let units = price.to_whole("price")?;
                validate_price(units).map_err(|_| ValidationError::OutOfRange {
                    field: "price".to_string(),
                    min: 0,
                    max: crate::MAX_UNIT_PRICE,
                })?;
                Some(Money::from_units(units))
            }
            None => None,
        };

        let category_id = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(MenuItemPatch {
            name: self.name.as_deref().map(validate_catalog_name).transpose()?,
            price,
            category_id,
            kind: self.kind.as_deref().map(str::parse).transpose()?,
            description: validate_optional_text(
                self.description.as_deref(),
                "description",
                MAX_DESCRIPTION_LEN,
            )?,
            is_available: self.is_available,
            tax_rate: self
                .tax_rate
                .as_ref()
                .map(|pct| pct.to_f64("taxRate").and_then(validate_tax_percent))
                .transpose()?,
        })
    }
}

fn validate_catalog_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category_defaults() {
        let category = CategoryInput::named("  Starters ").validate_new().unwrap();
        assert_eq!(category.name, "Starters");
        assert_eq!(category.sort_order, 0);
        assert!(category.is_active);
        assert_eq!(category.description, None);
    }

    #[test]
    fn test_category_requires_name() {
        assert!(matches!(
            CategoryInput::default().validate_new(),
            Err(ValidationError::Required { field }) if field == "name"
        ));
        assert!(CategoryInput::named("   ").validate_new().is_err());
        assert!(CategoryInput::named(&"x".repeat(101)).validate_new().is_err());
    }

    #[test]
    fn test_category_patch_keeps_missing_fields() {
        let input = CategoryInput {
            sort_order: Some(LooseNumber::Text("3".to_string())),
            description: Some("  ".to_string()),
            ..CategoryInput::default()
        };
        let patch = input.validate_patch().unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.sort_order, Some(3));
        assert_eq!(patch.description.as_deref(), Some(""));
        assert_eq!(patch.is_active, None);
    }

    #[test]
    fn test_new_menu_item_defaults() {
        let item = MenuItemInput::new("Paneer Tikka", 220, Some("cat-1"))
            .validate_new()
            .unwrap();
        assert_eq!(item.price, Money::from_units(220));
        assert_eq!(item.kind, MenuItemKind::Veg);
        assert!(item.is_available);
        assert_eq!(item.tax_rate, TaxRate::zero());
        assert_eq!(item.category_id.as_deref(), Some("cat-1"));
    }

    #[test]
    fn test_menu_item_price_rules() {
        assert!(matches!(
            MenuItemInput::new("Water", -1, None).validate_new(),
            Err(ValidationError::OutOfRange { field, .. }) if field == "price"
        ));

        let missing = MenuItemInput {
            name: Some("Water".to_string()),
            ..MenuItemInput::default()
        };
        assert!(matches!(
            missing.validate_new(),
            Err(ValidationError::Required { field }) if field == "price"
        ));

        let text = MenuItemInput {
            price: Some(LooseNumber::Text("45".to_string())),
            ..MenuItemInput::new("Lassi", 0, None)
        };
        assert_eq!(text.validate_new().unwrap().price, Money::from_units(45));
    }

    #[test]
    fn test_menu_item_kind_and_tax() {
        let input = MenuItemInput {
            kind: Some("Non-Veg".to_string()),
            tax_rate: Some(LooseNumber::Float(5.0)),
            ..MenuItemInput::new("Chicken Curry", 300, None)
        };
        let item = input.validate_new().unwrap();
        assert_eq!(item.kind, MenuItemKind::NonVeg);
        assert_eq!(item.tax_rate, TaxRate::from_bps(500));

        let bad = MenuItemInput {
            kind: Some("vegan".to_string()),
            ..MenuItemInput::new("Salad", 90, None)
        };
        assert!(matches!(bad.validate_new(), Err(ValidationError::NotAllowed { .. })));
    }

    #[test]
    fn test_menu_item_kind_serializes_hyphenated() {
        assert_eq!(serde_json::to_value(MenuItemKind::NonVeg).unwrap(), "non-veg");
        assert_eq!(MenuItemKind::NonVeg.to_string(), "non-veg");
    }
}
