//! Error type for `carehub-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] carehub_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A delete with no conditions would empty the whole table.
  #[error("refusing to delete from {0} without a key filter")]
  UnboundedDelete(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
