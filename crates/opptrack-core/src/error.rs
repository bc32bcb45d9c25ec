//! Error types for `opptrack-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An update payload resolved to no usable fields.
  #[error("no fields to update")]
  EmptyUpdate,

  /// A payload key resolved to no known business column.
  #[error("unknown field: {0:?}")]
  UnknownField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
