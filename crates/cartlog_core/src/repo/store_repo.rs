//! Store dimension repository.
//!
//! # Responsibility
//! - Provide lookup-or-create access to the `stores` table.
//! - Keep store SQL inside the persistence boundary.
//!
//! # Invariants
//! - Names are normalized before every lookup or insert.
//! - `name` is unique case-insensitively; `get_or_create` never creates
//!   a second row for an existing name.

use crate::model::visit::{normalize_name, Store, StoreId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const STORE_SELECT_SQL: &str = "SELECT id, name, created_at FROM stores";

/// Repository interface for store dimension rows.
pub trait StoreRepository {
    /// Returns the store with this name, creating it when missing.
    fn get_or_create(&self, name: &str) -> RepoResult<Store>;
    /// Gets one store by row id.
    fn get(&self, id: StoreId) -> RepoResult<Option<Store>>;
    /// Finds one store by normalized name, case-insensitively.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Store>>;
    /// Lists all stores ordered by name.
    fn list(&self) -> RepoResult<Vec<Store>>;
}

/// SQLite-backed store repository.
pub struct SqliteStoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoreRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("stores", &["id", "name", "created_at"])])?;
        Ok(Self { conn })
    }
}

impl StoreRepository for SqliteStoreRepository<'_> {
    fn get_or_create(&self, name: &str) -> RepoResult<Store> {
        let name = normalize_name(name).ok_or(RepoError::BlankName { table: "stores" })?;

        if let Some(store) = select_by_name(self.conn, &name)? {
            return Ok(store);
        }

        // Race-safe against a concurrent writer creating the same name.
        self.conn.execute(
            "INSERT OR IGNORE INTO stores (name, created_at)
             VALUES (?1, (strftime('%s', 'now') * 1000));",
            [name.as_str()],
        )?;

        select_by_name(self.conn, &name)?.ok_or_else(|| {
            RepoError::InvalidData(format!("store `{name}` missing after insert"))
        })
    }

    fn get(&self, id: StoreId) -> RepoResult<Option<Store>> {
        let store = self
            .conn
            .query_row(
                &format!("{STORE_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                parse_store_row,
            )
            .optional()?;
        Ok(store)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Store>> {
        match normalize_name(name) {
            Some(name) => select_by_name(self.conn, &name),
            None => Ok(None),
        }
    }

    fn list(&self) -> RepoResult<Vec<Store>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STORE_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut stores = Vec::new();
        while let Some(row) = rows.next()? {
            stores.push(parse_store_row(row)?);
        }
        Ok(stores)
    }
}

fn select_by_name(conn: &Connection, name: &str) -> RepoResult<Option<Store>> {
    let store = conn
        .query_row(
            &format!("{STORE_SELECT_SQL} WHERE name = ?1 COLLATE NOCASE;"),
            [name],
            parse_store_row,
        )
        .optional()?;
    Ok(store)
}

fn parse_store_row(row: &Row<'_>) -> Result<Store, rusqlite::Error> {
    Ok(Store {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
