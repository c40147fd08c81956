//! Results of a multi-group update, successful or not.
//!
//! [`UpdateReport`] is the accumulator threaded through the update pipeline.
//! On failure it travels inside [`UpdateFailure`] so callers always see which
//! groups were committed before the failing step.

use serde::Serialize;
use thiserror::Error;

use crate::{
  BoxError, Error,
  key::Row,
  participant::ParticipantId,
  table::RecordGroup,
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// Groups written so far, in processing order, with their stored rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateReport {
  /// Stored row per updated group, keyed by group name.
  pub updated_data:   Row,
  pub updated_tables: Vec<RecordGroup>,
  /// `None` only when the request failed before the id was resolved.
  #[serde(rename = "participantid")]
  pub participant_id: Option<ParticipantId>,
}

impl UpdateReport {
  pub fn for_participant(id: ParticipantId) -> Self {
    Self { participant_id: Some(id), ..Self::default() }
  }

  /// Record a successful group write.
  pub fn record(&mut self, group: RecordGroup, row: Row) {
    self.updated_data.insert(group.name().to_owned(), row.into());
    self.updated_tables.push(group);
  }

  /// The stored row for `group`, if it was updated.
  pub fn row(&self, group: RecordGroup) -> Option<&Row> {
    self.updated_data.get(group.name()).and_then(|v| v.as_object())
  }

  /// End the pipeline with `error`, keeping everything accumulated so far.
  pub fn fail(self, error: impl Into<UpdateError>) -> UpdateFailure {
    UpdateFailure { error: error.into(), report: self }
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Classification of an update failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  /// Rejected before any write.
  Validation,
  /// A write failed; earlier writes remain committed.
  StoreWrite,
  Internal,
}

#[derive(Debug, Error)]
pub enum UpdateError {
  #[error(transparent)]
  Validation(#[from] Error),

  #[error("failed to write {table}")]
  StoreWrite {
    table:  &'static str,
    #[source]
    source: BoxError,
  },

  #[error("internal server error")]
  Internal {
    context: &'static str,
    #[source]
    source:  BoxError,
  },
}

impl UpdateError {
  pub fn store_write(
    table: &'static str,
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::StoreWrite { table, source: Box::new(e) }
  }

  pub fn internal(
    context: &'static str,
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Internal { context, source: Box::new(e) }
  }

  pub fn kind(&self) -> FailureKind {
    match self {
      Self::Validation(_) => FailureKind::Validation,
      Self::StoreWrite { .. } => FailureKind::StoreWrite,
      Self::Internal { .. } => FailureKind::Internal,
    }
  }
}

/// A failed update together with the partial report accumulated before the
/// failing step.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct UpdateFailure {
  #[source]
  pub error:  UpdateError,
  pub report: UpdateReport,
}

impl UpdateFailure {
  pub fn kind(&self) -> FailureKind { self.error.kind() }

  /// The response body: the partial report plus `error` and `kind`.
  ///
  /// Internal failures carry a generic message; their detail is only
  /// available through [`std::error::Error::source`].
  pub fn body(&self) -> FailureBody<'_> {
    FailureBody {
      error:  self.error.to_string(),
      kind:   self.kind(),
      report: &self.report,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct FailureBody<'a> {
  pub error:  String,
  pub kind:   FailureKind,
  #[serde(flatten)]
  pub report: &'a UpdateReport,
}
