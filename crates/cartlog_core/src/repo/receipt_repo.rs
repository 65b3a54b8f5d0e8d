//! Receipt fact repository.
//!
//! # Responsibility
//! - Provide insert/fetch/delete access to the `receipts` table.
//! - Surface duplicate visit uuids as a semantic error.
//!
//! # Invariants
//! - `uuid` is unique across receipts; a second insert with the same uuid
//!   fails with `DuplicateVisit` before SQL runs.
//! - Deleting a receipt removes its purchases through the FK cascade.

use crate::model::visit::{Receipt, ReceiptId, StoreId, VisitUuid};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const RECEIPT_SELECT_SQL: &str =
    "SELECT id, uuid, store_id, purchased_at, imported_at FROM receipts";

/// Repository interface for receipt fact rows.
pub trait ReceiptRepository {
    /// Inserts one receipt and returns the stored row.
    fn insert(&self, store_id: StoreId, uuid: VisitUuid, purchased_at: i64) -> RepoResult<Receipt>;
    /// Gets one receipt by row id.
    fn get(&self, id: ReceiptId) -> RepoResult<Option<Receipt>>;
    /// Finds one receipt by its stable visit uuid.
    fn find_by_uuid(&self, uuid: VisitUuid) -> RepoResult<Option<Receipt>>;
    /// Lists receipts for one store, newest purchase first.
    fn list_for_store(&self, store_id: StoreId) -> RepoResult<Vec<Receipt>>;
    /// Lists all receipts, newest purchase first.
    fn list_all(&self) -> RepoResult<Vec<Receipt>>;
    /// Deletes one receipt and its purchases.
    fn delete(&self, id: ReceiptId) -> RepoResult<()>;
}

/// SQLite-backed receipt repository.
pub struct SqliteReceiptRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReceiptRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "receipts",
                &["id", "uuid", "store_id", "purchased_at", "imported_at"],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl ReceiptRepository for SqliteReceiptRepository<'_> {
    fn insert(&self, store_id: StoreId, uuid: VisitUuid, purchased_at: i64) -> RepoResult<Receipt> {
        if self.find_by_uuid(uuid)?.is_some() {
            return Err(RepoError::DuplicateVisit(uuid));
        }

        self.conn.execute(
            "INSERT INTO receipts (uuid, store_id, purchased_at, imported_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000));",
            params![uuid.to_string(), store_id, purchased_at],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("receipt {id} missing after insert")))
    }

    fn get(&self, id: ReceiptId) -> RepoResult<Option<Receipt>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECEIPT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_receipt_row(row)?));
        }
        Ok(None)
    }

    fn find_by_uuid(&self, uuid: VisitUuid) -> RepoResult<Option<Receipt>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECEIPT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_receipt_row(row)?));
        }
        Ok(None)
    }

    fn list_for_store(&self, store_id: StoreId) -> RepoResult<Vec<Receipt>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECEIPT_SELECT_SQL}
             WHERE store_id = ?1
             ORDER BY purchased_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![store_id])?;
        let mut receipts = Vec::new();
        while let Some(row) = rows.next()? {
            receipts.push(parse_receipt_row(row)?);
        }
        Ok(receipts)
    }

    fn list_all(&self) -> RepoResult<Vec<Receipt>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECEIPT_SELECT_SQL} ORDER BY purchased_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut receipts = Vec::new();
        while let Some(row) = rows.next()? {
            receipts.push(parse_receipt_row(row)?);
        }
        Ok(receipts)
    }

    fn delete(&self, id: ReceiptId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM receipts WHERE id = ?1;", params![id])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "receipts",
                id,
            });
        }

        Ok(())
    }
}

fn parse_receipt_row(row: &Row<'_>) -> RepoResult<Receipt> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in receipts.uuid"))
    })?;

    Ok(Receipt {
        id: row.get("id")?,
        uuid,
        store_id: row.get("store_id")?,
        purchased_at: row.get("purchased_at")?,
        imported_at: row.get("imported_at")?,
    })
}
