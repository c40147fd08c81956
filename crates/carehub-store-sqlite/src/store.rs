//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].
//!
//! Table and column names interpolated into SQL come only from the
//! [`Table`] registry; every value is bound as a parameter.

use std::path::Path;

use rusqlite::{OptionalExtension as _, params_from_iter};

use carehub_core::{
  key::{KeyFilter, Row, RowKey},
  store::RecordStore,
  table::Table,
};

use crate::{
  Error, Result,
  encode::{
    decode_row, encode_conditions, encode_row, json_in_call, merge_rows,
    placeholders,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A carehub record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store for tests.
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

/// `INSERT INTO <table> (<keys>, fields) VALUES (...)`, without a conflict
/// clause.
fn insert_sql(table: Table) -> String {
  let columns = table.key_columns().join(", ");
  let values = placeholders(table.key_columns().len() + 1);
  format!("INSERT INTO {} ({columns}, fields) VALUES ({values})", table.name())
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn get_by_key(&self, key: &RowKey) -> Result<Option<Row>> {
    let (conditions, values) = encode_conditions(key.columns());
    let sql = format!("SELECT fields FROM {} WHERE {conditions}", key.table().name());

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, params_from_iter(values), |row| row.get(0))
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode_row).transpose()
  }

  async fn insert(&self, table: Table, row: Row) -> Result<Row> {
    let key = RowKey::from_row(table, &row)?;
    let (_, mut values) = encode_conditions(key.columns());
    values.push(encode_row(&row)?);
    let sql = insert_sql(table);

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params_from_iter(values))?;
        Ok(())
      })
      .await?;

    Ok(row)
  }

  async fn upsert_by_key(&self, table: Table, row: Row) -> Result<Option<Row>> {
    let key = RowKey::from_row(table, &row)?;
    let (conditions, key_values) = encode_conditions(key.columns());
    let select_sql =
      format!("SELECT fields FROM {} WHERE {conditions}", table.name());
    let upsert_sql = format!(
      "{} ON CONFLICT ({}) DO UPDATE SET fields = excluded.fields",
      insert_sql(table),
      table.key_columns().join(", "),
    );

    // Read, merge and write inside one transaction so concurrent upserts on
    // the same key cannot interleave between the read and the write.
    let written: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let stored: Option<String> = tx
          .query_row(&select_sql, params_from_iter(&key_values), |r| r.get(0))
          .optional()?;
        let merged = match stored {
          Some(s) => {
            let stored: Row = serde_json::from_str(&s).map_err(json_in_call)?;
            merge_rows(stored, row)
          }
          None => row,
        };

        let mut values = key_values.clone();
        values.push(serde_json::to_string(&merged).map_err(json_in_call)?);
        tx.execute(&upsert_sql, params_from_iter(values))?;

        let written: Option<String> = tx
          .query_row(&select_sql, params_from_iter(&key_values), |r| r.get(0))
          .optional()?;
        tx.commit()?;
        Ok(written)
      })
      .await?;

    written.as_deref().map(decode_row).transpose()
  }

  async fn update_by_key(&self, table: Table, row: Row) -> Result<Option<Row>> {
    let key = RowKey::from_row(table, &row)?;
    let (conditions, key_values) = encode_conditions(key.columns());
    let select_sql =
      format!("SELECT fields FROM {} WHERE {conditions}", table.name());
    let update_sql = format!(
      "UPDATE {} SET fields = ?{} WHERE {conditions}",
      table.name(),
      key_values.len() + 1,
    );

    let written: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let stored: Option<String> = tx
          .query_row(&select_sql, params_from_iter(&key_values), |r| r.get(0))
          .optional()?;
        let Some(stored) = stored else {
          return Ok(None);
        };
        let stored: Row = serde_json::from_str(&stored).map_err(json_in_call)?;
        let merged =
          serde_json::to_string(&merge_rows(stored, row)).map_err(json_in_call)?;

        let mut values = key_values;
        values.push(merged.clone());
        tx.execute(&update_sql, params_from_iter(values))?;
        tx.commit()?;
        Ok(Some(merged))
      })
      .await?;

    written.as_deref().map(decode_row).transpose()
  }

  async fn delete_by_key(&self, filter: &KeyFilter) -> Result<u64> {
    let table = filter.table().name();
    if filter.is_empty() {
      return Err(Error::UnboundedDelete(table));
    }
    let (conditions, values) = encode_conditions(filter.columns());
    let sql = format!("DELETE FROM {table} WHERE {conditions}");

    let deleted = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, params_from_iter(values))?))
      .await?;

    Ok(deleted as u64)
  }

  async fn list_by_filter(&self, filter: &KeyFilter) -> Result<Vec<Row>> {
    let (conditions, values) = encode_conditions(filter.columns());
    let where_clause = if filter.is_empty() {
      String::new()
    } else {
      format!("WHERE {conditions}")
    };
    let sql = format!(
      "SELECT fields FROM {} {where_clause} ORDER BY rowid",
      filter.table().name()
    );

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(values), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_row(s)).collect()
  }
}
