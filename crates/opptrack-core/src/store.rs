//! The `OpportunityStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `opptrack-store-sqlite`). Higher layers (`opptrack-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  ledger::{ForecastChange, RevisionEntry},
  opportunity::{NewOpportunity, Opportunity, UpdatePatch},
};

/// Abstraction over an opportunity store backend.
///
/// Every mutation of a record and its two ledgers happens inside a single
/// backend transaction; a failed operation leaves no partial effect.
/// Missing records are expressed as `None` (or `false` for delete) rather
/// than as errors, so the associated `Error` covers backend failures only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait OpportunityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// Create a record with a fresh server-assigned uid, writing the initial
  /// revision-ledger row atomically with the insert. The initial revision
  /// number is taken from the payload's `revision` value, default 0.
  fn create_opportunity(
    &self,
    input: NewOpportunity,
    created_by: Option<String>,
  ) -> impl Future<Output = Result<Opportunity, Self::Error>> + Send + '_;

  /// Retrieve a record by uid. Returns `None` if not found.
  fn get_opportunity(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<Option<Opportunity>, Self::Error>> + Send + '_;

  /// List all records.
  fn list_opportunities(
    &self,
  ) -> impl Future<Output = Result<Vec<Opportunity>, Self::Error>> + Send + '_;

  /// Apply a partial update through the revision-tracking protocol and
  /// return the updated record. Returns `None`, with no side effects, if
  /// the uid does not exist.
  fn update_opportunity(
    &self,
    uid: Uuid,
    patch: UpdatePatch,
    changed_by: Option<String>,
  ) -> impl Future<Output = Result<Option<Opportunity>, Self::Error>> + Send + '_;

  /// Delete a record and all of its ledger rows in one transaction.
  /// Returns `false`, with no side effects, if the uid does not exist.
  fn delete_opportunity(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Ledger reads ──────────────────────────────────────────────────────

  /// All revision-ledger rows for a record, ordered by
  /// `(revision_number ascending, changed_at ascending)`.
  fn list_revisions(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<Vec<RevisionEntry>, Self::Error>> + Send + '_;

  /// All forecast-change rows for a record, ordered by
  /// `(changed_at ascending, id ascending)`.
  fn list_forecast_changes(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<Vec<ForecastChange>, Self::Error>> + Send + '_;
}
