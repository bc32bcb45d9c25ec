//! Read-side aggregation for opptrack dashboards.
//!
//! Everything here is a pure function over opportunity records: callers
//! fetch the record set from a store (or already hold it) and re-derive
//! the report. The parsers are deliberately forgiving because the field
//! values come from years of hand-entered spreadsheet data.

pub mod currency;
pub mod dates;
pub mod forecast;
pub mod winloss;
