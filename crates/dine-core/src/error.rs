//! Domain errors.
//!
//! [`ValidationError`] rejects a request before anything is read;
//! [`CoreError`] covers lifecycle rules that depend on stored state. The
//! storage layer has its own `DbError`, and billing-api folds all three into
//! the `{code, message}` body the web client reads.

use thiserror::Error;

use crate::types::OrderStatus;

/// Refusals that depend on an order's stored state.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The order moved on, usually on another terminal. The web client
    /// re-reads it and resumes from `current_status`.
    #[error("Order {order_id} is {current_status}, cannot {operation}")]
    InvalidOrderStatus {
        order_id: String,
        current_status: OrderStatus,
        operation: &'static str,
    },

    /// Saved again between reading it for billing and writing the bill.
    #[error("Order {order_id} changed while billing, re-read it and try again")]
    OrderChanged { order_id: String },

    #[error("Table {table_no} has a billed order awaiting settlement")]
    TableHasBilledOrder { table_no: String },

    /// Every proposed bill number collided with an existing one.
    #[error("Failed to allocate a unique bill number after {attempts} attempts")]
    BillNumberExhausted { attempts: u32 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Malformed request input. Messages name the offending field.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, empty, or whitespace only.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Non-numeric price, fractional quantity, bad UUID and the like.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;
