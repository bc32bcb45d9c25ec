//! [`SqliteStore`] — the SQLite implementation of [`OpportunityStore`].
//!
//! The revision-tracking update protocol lives in
//! [`update_opportunity`](OpportunityStore::update_opportunity): one
//! immediate transaction per call, forecast log written before the field
//! update so its old value is the true pre-image, outgoing revisions
//! sealed with `DO NOTHING`, the current revision upserted with
//! `DO UPDATE`.

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior, params_from_iter};
use serde_json::{Map, Value};
use uuid::Uuid;

use opptrack_core::{
  fields,
  ledger::{ForecastChange, RevisionEntry},
  opportunity::{NewOpportunity, Opportunity, UpdatePatch, parse_revision},
  snapshot::build_snapshot,
  store::OpportunityStore,
};

use crate::{
  Error, Result,
  encode::{
    RawForecastChange, RawOpportunity, RawRevision, encode_dt, encode_uuid,
    read_fields, to_sql_value,
  },
  schema::SCHEMA,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn opportunity_select() -> String {
  format!(
    "SELECT uid, created_at, {} FROM opportunities",
    fields::COLUMNS.join(", ")
  )
}

/// Read one record's `created_at` and field map inside a transaction.
fn select_one(
  tx: &rusqlite::Transaction<'_>,
  uid: &str,
) -> rusqlite::Result<Option<(String, Map<String, Value>)>> {
  let sql = format!(
    "SELECT created_at, {} FROM opportunities WHERE uid = ?1",
    fields::COLUMNS.join(", ")
  );
  tx.query_row(&sql, rusqlite::params![uid], |row| {
    Ok((row.get(0)?, read_fields(row, 1)?))
  })
  .optional()
}

/// The comparable text form of a forecast-date value. Null and empty
/// strings read as "no forecast"; a non-string value degrades to its JSON
/// text so it still compares stably.
fn forecast_repr(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) if s.trim().is_empty() => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An opportunity store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// statements for one logical operation run on the connection's worker
/// thread inside one transaction, which also serializes concurrent
/// mutations of the same record.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── OpportunityStore impl ───────────────────────────────────────────────────

impl OpportunityStore for SqliteStore {
  type Error = Error;

  // ── Records ───────────────────────────────────────────────────────────────

  async fn create_opportunity(
    &self,
    input: NewOpportunity,
    created_by: Option<String>,
  ) -> Result<Opportunity> {
    let uid = Uuid::new_v4();
    let created_at = Utc::now();
    let uid_str = encode_uuid(uid);
    let at_str = encode_dt(created_at);

    // Materialise every registry column so the stored record, the returned
    // record, and the initial snapshot all agree.
    let mut supplied = input.into_fields();
    let mut stored = Map::new();
    for &col in fields::COLUMNS {
      stored.insert(col.to_owned(), supplied.remove(col).unwrap_or(Value::Null));
    }

    let revision_number = parse_revision(stored.get("revision")).unwrap_or(0);
    let snapshot_json = Value::Object(build_snapshot(&stored)).to_string();

    let insert_sql = format!(
      "INSERT INTO opportunities (uid, created_at, {}) VALUES ({})",
      fields::COLUMNS.join(", "),
      (1..=fields::COLUMNS.len() + 2)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
    );
    let mut insert_params: Vec<rusqlite::types::Value> =
      Vec::with_capacity(fields::COLUMNS.len() + 2);
    insert_params.push(rusqlite::types::Value::Text(uid_str.clone()));
    insert_params.push(rusqlite::types::Value::Text(at_str.clone()));
    for &col in fields::COLUMNS {
      insert_params
        .push(stored.get(col).map_or(rusqlite::types::Value::Null, to_sql_value));
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(&insert_sql, params_from_iter(insert_params))?;

        // Exactly one ledger row accompanies a creation; a fresh record
        // has no prior revision to seal.
        tx.execute(
          "INSERT INTO opportunity_revisions
             (opportunity_uid, revision_number, changed_by, changed_at, snapshot)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![uid_str, revision_number, created_by, at_str, snapshot_json],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(Opportunity { uid, created_at, fields: stored })
  }

  async fn get_opportunity(&self, uid: Uuid) -> Result<Option<Opportunity>> {
    let uid_str = encode_uuid(uid);

    let raw: Option<RawOpportunity> = self
      .conn
      .call(move |conn| {
        let sql = format!("{} WHERE uid = ?1", opportunity_select());
        Ok(
          conn
            .query_row(&sql, rusqlite::params![uid_str], |row| {
              Ok(RawOpportunity {
                uid:        row.get(0)?,
                created_at: row.get(1)?,
                fields:     read_fields(row, 2)?,
              })
            })
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOpportunity::into_opportunity).transpose()
  }

  async fn list_opportunities(&self) -> Result<Vec<Opportunity>> {
    let raws: Vec<RawOpportunity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&opportunity_select())?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawOpportunity {
              uid:        row.get(0)?,
              created_at: row.get(1)?,
              fields:     read_fields(row, 2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOpportunity::into_opportunity).collect()
  }

  async fn update_opportunity(
    &self,
    uid: Uuid,
    patch: UpdatePatch,
    changed_by: Option<String>,
  ) -> Result<Option<Opportunity>> {
    let uid_str = encode_uuid(uid);
    let now_str = encode_dt(Utc::now());
    let patch_fields = patch.into_fields();

    let raw: Option<RawOpportunity> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // 1. Current state. A missing uid aborts before anything is
        // written; dropping the transaction rolls it back.
        let (created_at, current_fields) = match select_one(&tx, &uid_str)? {
          Some(row) => row,
          None => return Ok(None),
        };

        // 2. Forecast log, before the field update, so the recorded old
        // value is guaranteed to be the pre-update one.
        if let Some(new_value) = patch_fields.get("forecast_date") {
          let old_repr =
            current_fields.get("forecast_date").and_then(forecast_repr);
          if let Some(new_repr) = forecast_repr(new_value) {
            if old_repr.as_deref() != Some(new_repr.as_str()) {
              tx.execute(
                "INSERT INTO forecast_revisions
                   (opportunity_uid, old_forecast_date, new_forecast_date,
                    changed_by, changed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![uid_str, old_repr, new_repr, changed_by, now_str],
              )?;
            }
          }
        }

        // 3. Reconcile the revision the caller now claims against the one
        // last recorded. An absent or malformed counter stays on the old
        // revision.
        let old_rev = parse_revision(current_fields.get("revision")).unwrap_or(0);
        let new_rev =
          parse_revision(patch_fields.get("revision")).unwrap_or(old_rev);

        // 4. Snapshot of the state before the update.
        let previous_snapshot =
          Value::Object(build_snapshot(&current_fields)).to_string();

        // 5. Apply exactly the supplied keys.
        let set_clause = patch_fields
          .keys()
          .enumerate()
          .map(|(i, col)| format!("{col} = ?{}", i + 1))
          .collect::<Vec<_>>()
          .join(", ");
        let mut update_params: Vec<rusqlite::types::Value> =
          patch_fields.values().map(to_sql_value).collect();
        update_params.push(rusqlite::types::Value::Text(uid_str.clone()));
        tx.execute(
          &format!(
            "UPDATE opportunities SET {set_clause} WHERE uid = ?{}",
            update_params.len()
          ),
          params_from_iter(update_params),
        )?;

        // 6. Snapshot of the state after the update.
        let (_, updated_fields) = select_one(&tx, &uid_str)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let updated_snapshot =
          Value::Object(build_snapshot(&updated_fields)).to_string();

        // 7. Crossing a revision boundary seals the outgoing revision.
        // Insert-if-absent: a snapshot another write already sealed for
        // this number must never be clobbered.
        if new_rev != old_rev {
          tx.execute(
            "INSERT INTO opportunity_revisions
               (opportunity_uid, revision_number, changed_by, changed_at, snapshot)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (opportunity_uid, revision_number) DO NOTHING",
            rusqlite::params![uid_str, old_rev, changed_by, now_str, previous_snapshot],
          )?;
        }

        // 8. The current revision's row always reflects the latest state
        // within that revision.
        tx.execute(
          "INSERT INTO opportunity_revisions
             (opportunity_uid, revision_number, changed_by, changed_at, snapshot)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (opportunity_uid, revision_number) DO UPDATE SET
             changed_by = excluded.changed_by,
             changed_at = excluded.changed_at,
             snapshot   = excluded.snapshot",
          rusqlite::params![uid_str, new_rev, changed_by, now_str, updated_snapshot],
        )?;

        tx.commit()?;
        Ok(Some(RawOpportunity {
          uid: uid_str,
          created_at,
          fields: updated_fields,
        }))
      })
      .await?;

    raw.map(RawOpportunity::into_opportunity).transpose()
  }

  async fn delete_opportunity(&self, uid: Uuid) -> Result<bool> {
    let uid_str = encode_uuid(uid);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Ledger rows go first; the cascade is enforced here, not by
        // foreign-key actions.
        tx.execute(
          "DELETE FROM opportunity_revisions WHERE opportunity_uid = ?1",
          rusqlite::params![uid_str],
        )?;
        tx.execute(
          "DELETE FROM forecast_revisions WHERE opportunity_uid = ?1",
          rusqlite::params![uid_str],
        )?;
        let n = tx.execute(
          "DELETE FROM opportunities WHERE uid = ?1",
          rusqlite::params![uid_str],
        )?;

        if n == 0 {
          // Unknown uid: drop the transaction so the ledger deletes above
          // are rolled back.
          return Ok(false);
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(deleted)
  }

  // ── Ledger reads ──────────────────────────────────────────────────────────

  async fn list_revisions(&self, uid: Uuid) -> Result<Vec<RevisionEntry>> {
    let uid_str = encode_uuid(uid);

    let raws: Vec<RawRevision> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT opportunity_uid, revision_number, changed_by, changed_at, snapshot
           FROM opportunity_revisions
           WHERE opportunity_uid = ?1
           ORDER BY revision_number ASC, changed_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![uid_str], |row| {
            Ok(RawRevision {
              opportunity_uid: row.get(0)?,
              revision_number: row.get(1)?,
              changed_by:      row.get(2)?,
              changed_at:      row.get(3)?,
              snapshot:        row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRevision::into_entry).collect()
  }

  async fn list_forecast_changes(&self, uid: Uuid) -> Result<Vec<ForecastChange>> {
    let uid_str = encode_uuid(uid);

    let raws: Vec<RawForecastChange> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, opportunity_uid, old_forecast_date, new_forecast_date,
                  changed_by, changed_at, comment
           FROM forecast_revisions
           WHERE opportunity_uid = ?1
           ORDER BY changed_at ASC, id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![uid_str], |row| {
            Ok(RawForecastChange {
              id:                row.get(0)?,
              opportunity_uid:   row.get(1)?,
              old_forecast_date: row.get(2)?,
              new_forecast_date: row.get(3)?,
              changed_by:        row.get(4)?,
              changed_at:        row.get(5)?,
              comment:           row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawForecastChange::into_change).collect()
  }
}
