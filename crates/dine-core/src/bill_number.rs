//! # Bill Numbers
//!
//! Formatting and parsing of the human-readable identifier an order gets
//! when it is billed.
//!
//! ## Allocation Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Read the highest existing bill number          BILL-0041            │
//! │  2. Propose next = max + 1                         BILL-0042            │
//! │  3. Conditional write  (status = 'open')                                │
//! │       ├── ok                 → done                                     │
//! │       ├── unique violation   → next + 1, back to 3 (max 5 attempts)    │
//! │       └── no row updated     → order moved on, report its status        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module holds only the pure parts (candidate generation); the retry
//! loop lives with the database access in the API service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Prefix shared by every bill number.
pub const BILL_PREFIX: &str = "BILL-";

/// Zero-padding width for sequential numbers.
pub const SEQUENCE_WIDTH: usize = 4;

/// Attempts made before allocation gives up.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

/// How new bill numbers are proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingStrategy {
    /// `BILL-0001`, `BILL-0002`, ... derived from the current maximum.
    #[default]
    Sequential,
    /// `BILL-<unix millis>`. Unique per instance only; two servers or a clock
    /// step backwards can propose the same value, which the retry absorbs.
    Timestamp,
}

impl NumberingStrategy {
    /// First number to try.
    ///
    /// `highest` is the suffix of the largest bill number already stored,
    /// `now_millis` the current wall clock.
    pub fn first_candidate(&self, highest: Option<u64>, now_millis: i64) -> u64 {
        match self {
            NumberingStrategy::Sequential => highest.unwrap_or(0) + 1,
            NumberingStrategy::Timestamp => {
                let now = now_millis.max(0) as u64;
                // Never go below an existing number, even if the clock did.
                match highest {
                    Some(h) if h >= now => h + 1,
                    _ => now,
                }
            }
        }
    }

    /// Renders a candidate as a bill number.
    pub fn format(&self, n: u64) -> String {
        match self {
            NumberingStrategy::Sequential => format_sequential(n),
            NumberingStrategy::Timestamp => format!("{}{}", BILL_PREFIX, n),
        }
    }
}

impl fmt::Display for NumberingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberingStrategy::Sequential => f.write_str("sequential"),
            NumberingStrategy::Timestamp => f.write_str("timestamp"),
        }
    }
}

impl FromStr for NumberingStrategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(NumberingStrategy::Sequential),
            "timestamp" => Ok(NumberingStrategy::Timestamp),
            _ => Err(ValidationError::NotAllowed {
                field: "BILL_NUMBERING".to_string(),
                allowed: vec!["sequential".to_string(), "timestamp".to_string()],
            }),
        }
    }
}

/// Formats `n` as `BILL-` plus a zero-padded suffix.
///
/// Numbers wider than the padding are written in full.
///
/// ```rust
/// use dine_core::bill_number::format_sequential;
///
/// assert_eq!(format_sequential(1), "BILL-0001");
/// assert_eq!(format_sequential(12345), "BILL-12345");
/// ```
pub fn format_sequential(n: u64) -> String {
    format!("{}{:0width$}", BILL_PREFIX, n, width = SEQUENCE_WIDTH)
}

/// Extracts the numeric suffix of a bill number.
///
/// Returns `None` for anything not shaped like `BILL-<digits>`.
pub fn parse_suffix(bill_number: &str) -> Option<u64> {
    let digits = bill_number.strip_prefix(BILL_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
