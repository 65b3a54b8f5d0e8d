//! Repository layer contracts and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per table.
//! - Isolate SQL details from service/business orchestration.
//! - Verify connection readiness before repositories are handed out.
//!
//! # Invariants
//! - Write paths must call `Visit::validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateVisit`)
//!   in addition to DB transport errors.
//! - Database errors propagate unchanged; no retry or backoff exists.

use crate::db::{migrations::latest_version, DbError};
use crate::model::visit::{VisitUuid, VisitValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod product_repo;
pub mod purchase_repo;
pub mod receipt_repo;
pub mod store_repo;
pub mod visit_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for visit persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(VisitValidationError),
    Db(DbError),
    /// No row with the given id in the named table.
    NotFound {
        table: &'static str,
        id: i64,
    },
    /// A visit with this uuid was already imported.
    DuplicateVisit(VisitUuid),
    /// Dimension lookup called with a name that normalizes to nothing.
    BlankName {
        table: &'static str,
    },
    /// Persisted state that should be impossible under the schema.
    InvalidData(String),
    /// Connection has not been migrated to the supported schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "no row with id {id} in {table}"),
            Self::DuplicateVisit(uuid) => write!(f, "visit {uuid} was already imported"),
            Self::BlankName { table } => {
                write!(f, "cannot look up a blank name in {table}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{column}` is missing from `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VisitValidationError> for RepoError {
    fn from(value: VisitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies that a connection is migrated and carries the given tables.
///
/// Called from each repository's `try_new` so SQL never runs against an
/// unmigrated or foreign database file.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
