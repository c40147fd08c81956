//! Error types for `carehub-core`.

use thiserror::Error;

use crate::table::RecordGroup;

/// A boxed, thread-safe error from a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("participant id is required")]
  MissingParticipantId,

  #[error("invalid table: {0}")]
  UnknownGroup(String),

  #[error("invalid request body: expected a JSON object")]
  MalformedBody,

  #[error("invalid payload for {group}: {reason}")]
  MalformedGroup { group: RecordGroup, reason: String },

  #[error("column {column:?} is not a key of {table}")]
  NotAKeyColumn { table: &'static str, column: String },

  #[error("key column {column:?} of {table} must be a string, number or boolean")]
  NonScalarKey { table: &'static str, column: &'static str },

  #[error("missing key column {column:?} for {table}")]
  MissingKey { table: &'static str, column: &'static str },

  #[error("participant {0} does not exist")]
  UnknownParticipant(String),

  #[error("store returned no row for {0}")]
  EmptyWrite(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  /// Wrap a backend error.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  /// Whether the error describes a bad request rather than a failure of the
  /// system.
  pub fn is_validation(&self) -> bool {
    !matches!(
      self,
      Self::UnknownParticipant(_)
        | Self::EmptyWrite(_)
        | Self::Serialization(_)
        | Self::Store(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
