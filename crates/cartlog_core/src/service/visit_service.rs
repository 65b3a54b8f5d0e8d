//! Visit use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for importing and reading visits.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::visit::{ReceiptId, Visit};
use crate::repo::visit_repo::{VisitRecord, VisitRepository};
use crate::repo::{RepoError, RepoResult};

/// Use-case service wrapper for visit operations.
pub struct VisitService<R: VisitRepository> {
    repo: R,
}

impl<R: VisitRepository> VisitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records one visit and returns its receipt id.
    pub fn record_visit(&mut self, visit: &Visit) -> RepoResult<ReceiptId> {
        self.repo.record_visit(visit)
    }

    /// Parses one visit from a JSON export and records it.
    ///
    /// # Contract
    /// - The payload is a single serialized `Visit`.
    /// - Malformed JSON fails before any SQL runs.
    pub fn import_visit_json(&mut self, payload: &str) -> RepoResult<ReceiptId> {
        let visit: Visit = serde_json::from_str(payload)
            .map_err(|err| RepoError::InvalidData(format!("invalid visit json: {err}")))?;
        self.repo.record_visit(&visit)
    }

    /// Fetches one stored visit by receipt id.
    pub fn fetch_visit(&self, receipt_id: ReceiptId) -> RepoResult<Option<VisitRecord>> {
        self.repo.fetch_visit(receipt_id)
    }

    /// Deletes one stored visit by receipt id.
    pub fn delete_visit(&mut self, receipt_id: ReceiptId) -> RepoResult<()> {
        self.repo.delete_visit(receipt_id)
    }
}
