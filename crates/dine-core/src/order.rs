//! # Order Input
//!
//! Request shapes for the order lifecycle and their conversion into
//! validated, typed values.
//!
//! ```text
//! SaveOrderInput ──validate()──► OrderDraft      (items priced, subtotal summed)
//! BillInput      ──validate()──► BillTerms       (discount checked against subtotal)
//! SettleInput    ──validate()──► PaymentMethod
//! ```
//!
//! Inputs are deliberately loose (numbers may arrive as strings, fields may be
//! missing) because they come straight from the web client's JSON.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BillCategory, LineItem, OrderMetadata, PaymentMethod, TaxRate};
use crate::validation::{
    require_whole, validate_discount, validate_item_count, validate_item_name,
    validate_optional_text, validate_price, validate_quantity, validate_subtotal,
    validate_table_no, validate_tax_percent, LooseNumber, ValidationResult,
};

// =============================================================================
// Save Order
// =============================================================================

/// One line as submitted by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "unitPrice")]
    pub price: Option<LooseNumber>,
    #[serde(default)]
    pub quantity: Option<LooseNumber>,
}

impl LineItemInput {
    pub fn new(name: &str, price: i64, quantity: i64) -> Self {
        LineItemInput {
            name: Some(name.to_string()),
            price: Some(LooseNumber::Int(price)),
            quantity: Some(LooseNumber::Int(quantity)),
        }
    }

    /// Coerces and validates the line, computing its total.
    pub fn validate(&self) -> ValidationResult<LineItem> {
        let name = validate_item_name(self.name.as_deref().unwrap_or_default())?;

        let price = require_whole(self.price.as_ref(), "items.price")?;
        validate_price(price)?;

        let quantity = require_whole(self.quantity.as_ref(), "items.quantity")?;
        validate_quantity(quantity)?;

        Ok(LineItem::new(name, Money::from_units(price), quantity))
    }
}

/// Body of a save-order request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOrderInput {
    #[serde(default)]
    pub table_no: String,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    #[serde(default, alias = "billType")]
    pub bill_category: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub kitchen_notes: Option<String>,
}

/// A validated save-order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub table_no: String,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub metadata: OrderMetadata,
}

impl SaveOrderInput {
    pub fn validate(&self) -> ValidationResult<OrderDraft> {
        let table_no = validate_table_no(&self.table_no)?;

        validate_item_count(self.items.len())?;
        let items = self
            .items
            .iter()
            .map(LineItemInput::validate)
            .collect::<ValidationResult<Vec<_>>>()?;

        let bill_category = match self.bill_category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<BillCategory>()?),
        };

        let metadata = OrderMetadata {
            bill_category,
            customer_name: validate_optional_text(self.customer_name.as_deref(), "customerName", 100)?,
            customer_phone: validate_optional_text(self.customer_phone.as_deref(), "customerPhone", 20)?,
            kitchen_notes: validate_optional_text(self.kitchen_notes.as_deref(), "kitchenNotes", 500)?,
        };

        Ok(OrderDraft {
            table_no,
            subtotal: validate_subtotal(items.iter().map(|item| item.total))?,
            items,
            metadata,
        })
    }
}

// =============================================================================
// Generate Bill
// =============================================================================

/// Body of a generate-bill request. Both fields default to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillInput {
    #[serde(default)]
    pub discount: Option<LooseNumber>,
    #[serde(default, alias = "tax")]
    pub tax_percent: Option<LooseNumber>,
}

/// Validated discount and tax for a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillTerms {
    pub discount: Money,
    pub tax_rate: TaxRate,
}

impl BillInput {
    pub fn new(discount: i64, tax_percent: f64) -> Self {
        BillInput {
            discount: Some(LooseNumber::Int(discount)),
            tax_percent: Some(LooseNumber::Float(tax_percent)),
        }
    }

    /// Validates against the subtotal of the order being billed.
    pub fn validate(&self, subtotal: Money) -> ValidationResult<BillTerms> {
        let discount = match &self.discount {
            Some(n) if !is_blank(n) => Money::from_units(n.to_whole("discount")?),
            _ => Money::zero(),
        };
        validate_discount(discount, subtotal)?;

        let tax_rate = match &self.tax_percent {
            Some(n) if !is_blank(n) => validate_tax_percent(n.to_f64("taxPercent")?)?,
            _ => TaxRate::zero(),
        };

        Ok(BillTerms { discount, tax_rate })
    }
}

fn is_blank(n: &LooseNumber) -> bool {
    matches!(n, LooseNumber::Text(s) if s.trim().is_empty())
}

// =============================================================================
// Settle Bill
// =============================================================================

/// Body of a settle request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleInput {
    #[serde(default, alias = "paymentMode")]
    pub payment_method: Option<String>,
}

impl SettleInput {
    pub fn validate(&self) -> ValidationResult<PaymentMethod> {
        self.payment_method
            .as_deref()
            .ok_or_else(|| ValidationError::Required {
                field: "paymentMethod".to_string(),
            })?
            .parse()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
