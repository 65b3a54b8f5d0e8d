//! Purchase fact repository.
//!
//! # Responsibility
//! - Provide insert/fetch access to the `purchases` table.
//!
//! # Invariants
//! - Rows reference existing receipts and products; FK violations
//!   propagate from the engine unchanged.
//! - `list_for_receipt` preserves insertion order, matching the printed
//!   receipt.

use crate::model::visit::{ProductId, Purchase, ReceiptId};
use crate::repo::{ensure_connection_ready, RepoResult};
use rusqlite::{params, Connection, Row};

const PURCHASE_SELECT_SQL: &str = "SELECT
    id,
    receipt_id,
    product_id,
    quantity,
    unit_price_cents,
    total_price_cents
FROM purchases";

/// Insert payload for one purchase row; the id is storage-assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub receipt_id: ReceiptId,
    pub product_id: ProductId,
    pub quantity: f64,
    pub unit_price_cents: Option<i64>,
    pub total_price_cents: i64,
}

/// Repository interface for purchase fact rows.
pub trait PurchaseRepository {
    /// Inserts one purchase line and returns the stored row.
    fn insert(&self, purchase: &NewPurchase) -> RepoResult<Purchase>;
    /// Lists purchases for one receipt in insertion order.
    fn list_for_receipt(&self, receipt_id: ReceiptId) -> RepoResult<Vec<Purchase>>;
}

/// SQLite-backed purchase repository.
pub struct SqlitePurchaseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePurchaseRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "purchases",
                &[
                    "id",
                    "receipt_id",
                    "product_id",
                    "quantity",
                    "unit_price_cents",
                    "total_price_cents",
                ],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl PurchaseRepository for SqlitePurchaseRepository<'_> {
    fn insert(&self, purchase: &NewPurchase) -> RepoResult<Purchase> {
        self.conn.execute(
            "INSERT INTO purchases (
                receipt_id,
                product_id,
                quantity,
                unit_price_cents,
                total_price_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                purchase.receipt_id,
                purchase.product_id,
                purchase.quantity,
                purchase.unit_price_cents,
                purchase.total_price_cents,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        let stored = self.conn.query_row(
            &format!("{PURCHASE_SELECT_SQL} WHERE id = ?1;"),
            params![id],
            parse_purchase_row,
        )?;
        Ok(stored)
    }

    fn list_for_receipt(&self, receipt_id: ReceiptId) -> RepoResult<Vec<Purchase>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PURCHASE_SELECT_SQL} WHERE receipt_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query(params![receipt_id])?;
        let mut purchases = Vec::new();
        while let Some(row) = rows.next()? {
            purchases.push(parse_purchase_row(row)?);
        }
        Ok(purchases)
    }
}

fn parse_purchase_row(row: &Row<'_>) -> Result<Purchase, rusqlite::Error> {
    Ok(Purchase {
        id: row.get("id")?,
        receipt_id: row.get("receipt_id")?,
        product_id: row.get("product_id")?,
        quantity: row.get("quantity")?,
        unit_price_cents: row.get("unit_price_cents")?,
        total_price_cents: row.get("total_price_cents")?,
    })
}
