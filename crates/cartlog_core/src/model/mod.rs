//! Domain model for grocery-receipt persistence.
//!
//! # Responsibility
//! - Define the four canonical row types mapped 1:1 to storage tables.
//! - Define the `Visit` input aggregate used by import paths.
//!
//! # Invariants
//! - Dimension rows (stores, products) are identified by normalized name.
//! - Fact rows (receipts, purchases) are inserted and fetched, never
//!   upserted.

pub mod visit;
