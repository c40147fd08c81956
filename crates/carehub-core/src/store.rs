//! The `RecordStore` trait: the only collaborator the orchestrator talks to.
//!
//! The trait is implemented by storage backends (e.g. `carehub-store-sqlite`).
//! Every operation is scoped to a single [`Table`](crate::table::Table) from
//! the registry; keys carry their table with them.

use std::future::Future;

use crate::key::{KeyFilter, Row, RowKey};
use crate::table::Table;

/// Abstraction over a relational store holding the participant aggregate and
/// its group tables.
///
/// Rows are JSON objects. Key columns are part of the row; a backend decides
/// how to index them but must treat the table's declared key columns as its
/// conflict target. Key values compare by their text form, so `3` and `"3"`
/// address the same row.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the row addressed by `key`. Returns `None` if it does not exist.
  fn get_by_key<'a>(
    &'a self,
    key: &'a RowKey,
  ) -> impl Future<Output = Result<Option<Row>, Self::Error>> + Send + 'a;

  /// Insert a new row. Fails if a row with the same key already exists.
  fn insert(
    &self,
    table: Table,
    row: Row,
  ) -> impl Future<Output = Result<Row, Self::Error>> + Send + '_;

  /// Insert `row`, or merge it into the existing row with the same key.
  ///
  /// Columns present in `row` overwrite stored values (an explicit `null`
  /// stores `null`); columns absent from `row` keep their stored values.
  /// Returns the full row as stored after the write.
  fn upsert_by_key(
    &self,
    table: Table,
    row: Row,
  ) -> impl Future<Output = Result<Option<Row>, Self::Error>> + Send + '_;

  /// Merge `row` into the existing row with the same key, using the same
  /// column rules as [`upsert_by_key`](Self::upsert_by_key).
  ///
  /// Never inserts: returns `None` and writes nothing if no row has the key.
  fn update_by_key(
    &self,
    table: Table,
    row: Row,
  ) -> impl Future<Output = Result<Option<Row>, Self::Error>> + Send + '_;

  /// Delete every row matching `filter`, returning how many were removed.
  fn delete_by_key<'a>(
    &'a self,
    filter: &'a KeyFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Return every row matching `filter`, in insertion order.
  fn list_by_filter<'a>(
    &'a self,
    filter: &'a KeyFilter,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + 'a;
}
