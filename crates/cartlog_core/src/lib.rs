//! Core persistence logic for cartlog grocery-receipt visits.
//! This crate is the single source of truth for visit storage invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::visit::{
    normalize_name, Product, ProductId, Purchase, PurchaseId, Receipt, ReceiptId, Store, StoreId,
    Visit, VisitLine, VisitUuid, VisitValidationError,
};
pub use repo::product_repo::{ProductRepository, SqliteProductRepository};
pub use repo::purchase_repo::{NewPurchase, PurchaseRepository, SqlitePurchaseRepository};
pub use repo::receipt_repo::{ReceiptRepository, SqliteReceiptRepository};
pub use repo::store_repo::{SqliteStoreRepository, StoreRepository};
pub use repo::visit_repo::{PurchaseRecord, SqliteVisitRepository, VisitRecord, VisitRepository};
pub use repo::{RepoError, RepoResult};
pub use service::visit_service::VisitService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
