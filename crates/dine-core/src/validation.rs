//! # Validation Module
//!
//! Input validation utilities for Dine POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web client                                                   │
//! │  └── Basic form checks, immediate feedback                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── JSON deserialization (numbers may arrive as strings)             │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE bill_number, one active order per table                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::TaxRate;
use crate::{
    DEFAULT_PAGE_SIZE, MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS, MAX_ORDER_SUBTOTAL, MAX_PAGE_SIZE,
    MAX_UNIT_PRICE,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Loose Numbers
// =============================================================================

/// A number as the web client sends it: JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    /// Coerces to a finite `f64`.
    pub fn to_f64(&self, field: &str) -> ValidationResult<f64> {
        let value = match self {
            LooseNumber::Int(v) => *v as f64,
            LooseNumber::Float(v) => *v,
            LooseNumber::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Err(ValidationError::Required {
                        field: field.to_string(),
                    });
                }
                s.parse::<f64>().map_err(|_| ValidationError::InvalidFormat {
                    field: field.to_string(),
                    reason: format!("'{}' is not a number", s),
                })?
            }
        };

        if !value.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        Ok(value)
    }

    /// Coerces to a whole number, rejecting fractional values and anything
    /// outside the `i64` range.
    pub fn to_whole(&self, field: &str) -> ValidationResult<i64> {
        if let LooseNumber::Int(v) = self {
            return Ok(*v);
        }

        let value = self.to_f64(field)?;
        if value.fract() != 0.0 {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must be a whole number".to_string(),
            });
        }

        // 2^63 is exactly representable; everything below it converts losslessly
        if value < i64::MIN as f64 || value >= i64::MAX as f64 {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "is too large".to_string(),
            });
        }

        Ok(value as i64)
    }
}

/// Unwraps an optional loose number into a whole number.
pub fn require_whole(value: Option<&LooseNumber>, field: &str) -> ValidationResult<i64> {
    value
        .ok_or_else(|| ValidationError::Required {
            field: field.to_string(),
        })?
        .to_whole(field)
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a table identifier and returns it trimmed.
///
/// ## Example
/// ```rust
/// use dine_core::validation::validate_table_no;
///
/// assert_eq!(validate_table_no(" T1 ").unwrap(), "T1");
/// assert!(validate_table_no("").is_err());
/// ```
pub fn validate_table_no(table_no: &str) -> ValidationResult<String> {
    let table_no = table_no.trim();

    if table_no.is_empty() {
        return Err(ValidationError::Required {
            field: "tableNo".to_string(),
        });
    }

    if table_no.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "tableNo".to_string(),
            max: 50,
        });
    }

    Ok(table_no.to_string())
}

/// Validates a menu item name on an order line.
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "items.name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "items.name".to_string(),
            max: 200,
        });
    }

    Ok(name.to_string())
}

/// Validates a free-text field such as customer name or kitchen notes.
///
/// `None` means not supplied. A blank string is kept so a save can clear
/// the stored value.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max: usize,
) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim) else {
        return Ok(None);
    };

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(Some(value.to_string()))
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filtering)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query, or `None` if empty.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let query = query.map(str::trim).unwrap_or_default();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "items.quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "items.quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary items)
/// - At most MAX_UNIT_PRICE
///
/// ## Example
/// ```rust
/// use dine_core::validation::validate_price;
///
/// assert!(validate_price(100).is_ok());
/// assert!(validate_price(0).is_ok());
/// assert!(validate_price(-1).is_err());
/// assert!(validate_price(i64::MAX / 2).is_err());
/// ```
pub fn validate_price(units: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE).contains(&units) {
        return Err(ValidationError::OutOfRange {
            field: "items.price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

/// Sums line totals, refusing orders above MAX_ORDER_SUBTOTAL.
pub fn validate_subtotal(line_totals: impl IntoIterator<Item = Money>) -> ValidationResult<Money> {
    let out_of_range = || ValidationError::OutOfRange {
        field: "subtotal".to_string(),
        min: 0,
        max: MAX_ORDER_SUBTOTAL,
    };

    let subtotal = line_totals
        .into_iter()
        .try_fold(Money::zero(), |acc, total| acc.checked_add(total))
        .ok_or_else(out_of_range)?;

    if subtotal.units() > MAX_ORDER_SUBTOTAL {
        return Err(out_of_range());
    }

    Ok(subtotal)
}

/// Validates the number of lines on an order.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates an absolute discount against the order subtotal.
///
/// ## Rules
/// - `0 <= discount <= subtotal`
pub fn validate_discount(discount: Money, subtotal: Money) -> ValidationResult<()> {
    if discount.is_negative() || discount > subtotal {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: subtotal.units(),
        });
    }

    Ok(())
}

/// Validates a tax percentage and converts it to a [`TaxRate`].
///
/// ## Rules
/// - Must be between 0 and 100 percent
pub fn validate_tax_percent(pct: f64) -> ValidationResult<TaxRate> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "taxPercent".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(TaxRate::from_percentage(pct))
}

/// Normalizes paging input: page defaults to 1, limit to DEFAULT_PAGE_SIZE.
///
/// ## Rules
/// - `page >= 1`
/// - `1 <= limit <= MAX_PAGE_SIZE`
pub fn validate_paging(page: Option<u32>, limit: Option<u32>) -> ValidationResult<(u32, u32)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }

    Ok((page, limit))
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates an order id (UUID format).
///
/// ## Example
/// ```rust
/// use dine_core::validation::validate_order_id;
///
/// assert!(validate_order_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_order_id("not-a-uuid").is_err());
/// ```
pub fn validate_order_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
