//! Visit domain model and row types.
//!
//! # Responsibility
//! - Define row types for the stores/products/receipts/purchases tables.
//! - Define the `Visit` import aggregate and its validation rules.
//! - Own name normalization used for dimension-table lookups.
//!
//! # Invariants
//! - `Receipt.uuid` is stable and never reused for another visit.
//! - Store and product names are normalized (trimmed, inner whitespace
//!   collapsed) before any lookup or insert.
//! - Money fields are integer cents; quantities are positive and finite.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Row id for the `stores` table.
pub type StoreId = i64;
/// Row id for the `products` table.
pub type ProductId = i64;
/// Row id for the `receipts` table.
pub type ReceiptId = i64;
/// Row id for the `purchases` table.
pub type PurchaseId = i64;
/// Stable external identity of an imported visit.
pub type VisitUuid = Uuid;

/// One row of the `stores` dimension table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    /// Normalized display name, unique case-insensitively.
    pub name: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

/// One row of the `products` dimension table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Normalized display name, unique case-insensitively.
    pub name: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

/// One row of the `receipts` fact table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    /// External identity of the imported visit; unique across receipts.
    pub uuid: VisitUuid,
    pub store_id: StoreId,
    /// When the purchase happened, epoch milliseconds.
    pub purchased_at: i64,
    /// When the row was written, epoch milliseconds.
    pub imported_at: i64,
}

/// One row of the `purchases` fact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub receipt_id: ReceiptId,
    pub product_id: ProductId,
    /// Count or weight; positive and finite.
    pub quantity: f64,
    /// Per-unit price in cents when the receipt states one.
    pub unit_price_cents: Option<i64>,
    /// Line total in cents.
    pub total_price_cents: i64,
}

/// One purchased line of a visit, keyed by product name rather than id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitLine {
    pub product_name: String,
    pub quantity: f64,
    pub unit_price_cents: Option<i64>,
    pub total_price_cents: i64,
}

/// One imported receipt event: a store, a timestamp, and purchased lines.
///
/// This is the write model handed to the visit repository; row ids are
/// assigned by storage during `record_visit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Stable external identity; re-imports with the same uuid are rejected.
    pub uuid: VisitUuid,
    pub store_name: String,
    /// When the purchase happened, epoch milliseconds.
    pub purchased_at: i64,
    pub lines: Vec<VisitLine>,
}

/// Validation failure raised before any SQL runs on a write path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitValidationError {
    EmptyStoreName,
    EmptyProductName { line: usize },
    InvalidQuantity { line: usize },
    NegativeUnitPrice { line: usize },
    NegativeTotalPrice { line: usize },
}

impl Display for VisitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStoreName => write!(f, "visit store name is empty"),
            Self::EmptyProductName { line } => {
                write!(f, "visit line {line} has an empty product name")
            }
            Self::InvalidQuantity { line } => {
                write!(f, "visit line {line} quantity must be positive and finite")
            }
            Self::NegativeUnitPrice { line } => {
                write!(f, "visit line {line} unit price must not be negative")
            }
            Self::NegativeTotalPrice { line } => {
                write!(f, "visit line {line} total price must not be negative")
            }
        }
    }
}

impl Error for VisitValidationError {}

impl Visit {
    /// Creates a visit with a generated stable uuid and no lines yet.
    pub fn new(store_name: impl Into<String>, purchased_at: i64) -> Self {
        Self::with_uuid(Uuid::new_v4(), store_name, purchased_at)
    }

    /// Creates a visit with a caller-provided uuid.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_uuid(uuid: VisitUuid, store_name: impl Into<String>, purchased_at: i64) -> Self {
        Self {
            uuid,
            store_name: store_name.into(),
            purchased_at,
            lines: Vec::new(),
        }
    }

    /// Appends one purchased line and returns `self` for chaining.
    pub fn with_line(mut self, line: VisitLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Checks the visit against write-path invariants.
    ///
    /// # Contract
    /// - Store and product names must be non-empty after normalization.
    /// - Quantities must be positive and finite.
    /// - Prices must not be negative.
    /// - A visit with zero lines is valid; receipts without purchases exist.
    pub fn validate(&self) -> Result<(), VisitValidationError> {
        if normalize_name(&self.store_name).is_none() {
            return Err(VisitValidationError::EmptyStoreName);
        }

        for (line, item) in self.lines.iter().enumerate() {
            if normalize_name(&item.product_name).is_none() {
                return Err(VisitValidationError::EmptyProductName { line });
            }
            if !item.quantity.is_finite() || item.quantity <= 0.0 {
                return Err(VisitValidationError::InvalidQuantity { line });
            }
            if matches!(item.unit_price_cents, Some(price) if price < 0) {
                return Err(VisitValidationError::NegativeUnitPrice { line });
            }
            if item.total_price_cents < 0 {
                return Err(VisitValidationError::NegativeTotalPrice { line });
            }
        }

        Ok(())
    }

    /// Sum of line totals in cents.
    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(|line| line.total_price_cents).sum()
    }
}

static INNER_WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").unwrap_or_else(|err| unreachable!("static regex must compile: {err}"))
});

/// Normalizes a store/product name for dimension-table lookup.
///
/// Trims the value and collapses inner whitespace runs to single spaces.
/// Returns `None` when nothing remains, so callers treat blank names as
/// missing rather than creating empty dimension rows.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(INNER_WHITESPACE.replace_all(trimmed, " ").into_owned())
}
