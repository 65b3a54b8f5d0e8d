//! Visit aggregate repository.
//!
//! # Responsibility
//! - Persist one whole visit (store + receipt + purchases) atomically.
//! - Reassemble stored visits into a read model with product names.
//!
//! # Invariants
//! - `record_visit` runs inside a single immediate transaction; a failed
//!   line insert leaves no partial receipt behind.
//! - Visit uuids are checked before insert; re-imports fail with
//!   `DuplicateVisit`.
//! - `Visit::validate()` runs before any SQL.

use crate::model::visit::{Purchase, Receipt, ReceiptId, Store, Visit};
use crate::repo::product_repo::{ProductRepository, SqliteProductRepository};
use crate::repo::purchase_repo::{NewPurchase, PurchaseRepository, SqlitePurchaseRepository};
use crate::repo::receipt_repo::{ReceiptRepository, SqliteReceiptRepository};
use crate::repo::store_repo::{SqliteStoreRepository, StoreRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, Row, TransactionBehavior};

/// One stored purchase line joined with its product name.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub purchase: Purchase,
    pub product_name: String,
}

/// Read model for one stored visit.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    pub receipt: Receipt,
    pub store: Store,
    pub lines: Vec<PurchaseRecord>,
}

/// Repository interface for whole-visit operations.
pub trait VisitRepository {
    /// Persists one visit atomically and returns the new receipt id.
    fn record_visit(&mut self, visit: &Visit) -> RepoResult<ReceiptId>;
    /// Fetches one stored visit by receipt id.
    fn fetch_visit(&self, receipt_id: ReceiptId) -> RepoResult<Option<VisitRecord>>;
    /// Deletes one stored visit; purchases go with the receipt.
    fn delete_visit(&mut self, receipt_id: ReceiptId) -> RepoResult<()>;
}

/// SQLite-backed visit repository.
pub struct SqliteVisitRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteVisitRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        let _ = SqliteStoreRepository::try_new(&*conn)?;
        let _ = SqliteProductRepository::try_new(&*conn)?;
        let _ = SqliteReceiptRepository::try_new(&*conn)?;
        let _ = SqlitePurchaseRepository::try_new(&*conn)?;
        Ok(Self { conn })
    }
}

impl VisitRepository for SqliteVisitRepository<'_> {
    fn record_visit(&mut self, visit: &Visit) -> RepoResult<ReceiptId> {
        visit.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let receipt_id = {
            let stores = SqliteStoreRepository::try_new(&tx)?;
            let products = SqliteProductRepository::try_new(&tx)?;
            let receipts = SqliteReceiptRepository::try_new(&tx)?;
            let purchases = SqlitePurchaseRepository::try_new(&tx)?;

            let store = stores.get_or_create(&visit.store_name)?;
            let receipt = receipts.insert(store.id, visit.uuid, visit.purchased_at)?;

            for line in &visit.lines {
                let product = products.get_or_create(&line.product_name)?;
                purchases.insert(&NewPurchase {
                    receipt_id: receipt.id,
                    product_id: product.id,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    total_price_cents: line.total_price_cents,
                })?;
            }

            receipt.id
        };

        tx.commit()?;
        info!(
            "event=visit_record module=repo status=ok receipt_id={} uuid={} lines={}",
            receipt_id,
            visit.uuid,
            visit.lines.len()
        );
        Ok(receipt_id)
    }

    fn fetch_visit(&self, receipt_id: ReceiptId) -> RepoResult<Option<VisitRecord>> {
        let conn = &*self.conn;
        let receipts = SqliteReceiptRepository::try_new(conn)?;
        let Some(receipt) = receipts.get(receipt_id)? else {
            return Ok(None);
        };

        let stores = SqliteStoreRepository::try_new(conn)?;
        let store = stores.get(receipt.store_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "receipt {receipt_id} references missing store {}",
                receipt.store_id
            ))
        })?;

        let lines = load_purchase_records(conn, receipt_id)?;

        Ok(Some(VisitRecord {
            receipt,
            store,
            lines,
        }))
    }

    fn delete_visit(&mut self, receipt_id: ReceiptId) -> RepoResult<()> {
        let receipts = SqliteReceiptRepository::try_new(&*self.conn)?;
        receipts.delete(receipt_id)?;
        info!(
            "event=visit_delete module=repo status=ok receipt_id={}",
            receipt_id
        );
        Ok(())
    }
}

fn load_purchase_records(conn: &Connection, receipt_id: ReceiptId) -> RepoResult<Vec<PurchaseRecord>> {
    let mut stmt = conn.prepare(
        "SELECT
            p.id,
            p.receipt_id,
            p.product_id,
            p.quantity,
            p.unit_price_cents,
            p.total_price_cents,
            pr.name AS product_name
         FROM purchases p
         INNER JOIN products pr ON pr.id = p.product_id
         WHERE p.receipt_id = ?1
         ORDER BY p.id ASC;",
    )?;

    let mut rows = stmt.query(params![receipt_id])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_purchase_record_row(row)?);
    }
    Ok(records)
}

fn parse_purchase_record_row(row: &Row<'_>) -> Result<PurchaseRecord, rusqlite::Error> {
    Ok(PurchaseRecord {
        purchase: Purchase {
            id: row.get("id")?,
            receipt_id: row.get("receipt_id")?,
            product_id: row.get("product_id")?,
            quantity: row.get("quantity")?,
            unit_price_cents: row.get("unit_price_cents")?,
            total_price_cents: row.get("total_price_cents")?,
        },
        product_name: row.get("product_name")?,
    })
}
