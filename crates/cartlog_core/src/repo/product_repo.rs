//! Product dimension repository.
//!
//! # Responsibility
//! - Provide lookup-or-create access to the `products` table.
//! - Keep product SQL inside the persistence boundary.
//!
//! # Invariants
//! - Names are normalized before every lookup or insert.
//! - `name` is unique case-insensitively; `get_or_create` never creates
//!   a second row for an existing name.

use crate::model::visit::{normalize_name, Product, ProductId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PRODUCT_SELECT_SQL: &str = "SELECT id, name, created_at FROM products";

/// Repository interface for product dimension rows.
pub trait ProductRepository {
    /// Returns the product with this name, creating it when missing.
    fn get_or_create(&self, name: &str) -> RepoResult<Product>;
    /// Gets one product by row id.
    fn get(&self, id: ProductId) -> RepoResult<Option<Product>>;
    /// Finds one product by normalized name, case-insensitively.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Product>>;
    /// Lists all products ordered by name.
    fn list(&self) -> RepoResult<Vec<Product>>;
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("products", &["id", "name", "created_at"])])?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn get_or_create(&self, name: &str) -> RepoResult<Product> {
        let name = normalize_name(name).ok_or(RepoError::BlankName { table: "products" })?;

        if let Some(product) = select_by_name(self.conn, &name)? {
            return Ok(product);
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO products (name, created_at)
             VALUES (?1, (strftime('%s', 'now') * 1000));",
            [name.as_str()],
        )?;

        select_by_name(self.conn, &name)?.ok_or_else(|| {
            RepoError::InvalidData(format!("product `{name}` missing after insert"))
        })
    }

    fn get(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!("{PRODUCT_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                parse_product_row,
            )
            .optional()?;
        Ok(product)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Product>> {
        match normalize_name(name) {
            Some(name) => select_by_name(self.conn, &name),
            None => Ok(None),
        }
    }

    fn list(&self) -> RepoResult<Vec<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PRODUCT_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row)?);
        }
        Ok(products)
    }
}

fn select_by_name(conn: &Connection, name: &str) -> RepoResult<Option<Product>> {
    let product = conn
        .query_row(
            &format!("{PRODUCT_SELECT_SQL} WHERE name = ?1 COLLATE NOCASE;"),
            [name],
            parse_product_row,
        )
        .optional()?;
    Ok(product)
}

fn parse_product_row(row: &Row<'_>) -> Result<Product, rusqlite::Error> {
    Ok(Product {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
