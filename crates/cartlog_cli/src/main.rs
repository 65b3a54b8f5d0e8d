//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cartlog_core` linkage.
//! - Print schema and row-count facts for a database file.

use cartlog_core::db::{migrations::latest_version, open_db};
use rusqlite::Connection;
use std::process::ExitCode;

fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "cartlog.db".to_string());

    let conn = match open_db(&path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("cartlog: failed to open `{path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("cartlog_core version={}", cartlog_core::core_version());
    println!("db path={path} schema_version={}", latest_version());
    for table in ["stores", "products", "receipts", "purchases"] {
        match count_rows(&conn, table) {
            Ok(count) => println!("table={table} rows={count}"),
            Err(err) => {
                eprintln!("cartlog: failed to count `{table}`: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
}
