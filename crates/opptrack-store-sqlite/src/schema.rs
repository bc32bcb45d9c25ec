//! SQL schema for the opptrack SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Business columns carry no declared type on purpose: with BLOB affinity
/// each value keeps the storage class the caller supplied (text, integer,
/// real, or null), matching the dynamically-typed source data.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS opportunities (
    uid               TEXT PRIMARY KEY,
    created_at        TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    project_name,
    client,
    account_mgr,
    solutions,
    opp_status,
    decision,
    revision,                          -- caller-supplied counter
    final_amt,
    margin,
    client_deadline,
    submitted_date,
    date_awarded_lost,
    forecast_date,
    remarks
);

-- One row per (record, revision number). Rows for past revisions are
-- sealed; only the current revision's row is ever rewritten.
CREATE TABLE IF NOT EXISTS opportunity_revisions (
    opportunity_uid TEXT    NOT NULL REFERENCES opportunities(uid),
    revision_number INTEGER NOT NULL,
    changed_by      TEXT,
    changed_at      TEXT    NOT NULL,
    snapshot        TEXT    NOT NULL,  -- JSON projection of audit columns
    PRIMARY KEY (opportunity_uid, revision_number)
);

-- Strictly append-only. No UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS forecast_revisions (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    opportunity_uid   TEXT NOT NULL REFERENCES opportunities(uid),
    old_forecast_date,
    new_forecast_date NOT NULL,
    changed_by        TEXT,
    changed_at        TEXT NOT NULL,
    comment           TEXT
);

CREATE INDEX IF NOT EXISTS forecast_revisions_uid_idx
    ON forecast_revisions(opportunity_uid);

PRAGMA user_version = 1;
";
