//! Rows and the table-scoped keys used to address them.

use serde_json::{Map, Value};

use crate::{Error, Result, participant::ParticipantId, table::Table};

/// A stored row: an ordered JSON object of column name to value.
pub type Row = Map<String, Value>;

fn is_scalar(value: &Value) -> bool {
  matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

// ─── KeyFilter ───────────────────────────────────────────────────────────────

/// Equality conditions over a subset of a table's key columns.
///
/// Columns are checked against the registry on insertion, so a filter can
/// only ever name key columns of its own table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFilter {
  table:   Table,
  columns: Vec<(&'static str, Value)>,
}

impl KeyFilter {
  /// A filter matching every row of `table`.
  pub fn new(table: impl Into<Table>) -> Self {
    Self { table: table.into(), columns: Vec::new() }
  }

  /// A filter on the participant column of `table`.
  pub fn participant(table: impl Into<Table>, id: &ParticipantId) -> Self {
    let table = table.into();
    Self {
      table,
      columns: vec![(table.participant_column(), Value::from(id.as_str()))],
    }
  }

  /// Add (or replace) an equality condition on a key column.
  pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Result<Self> {
    let column = self.table.key_column(column)?;
    let value = value.into();
    if !is_scalar(&value) {
      return Err(Error::NonScalarKey { table: self.table.name(), column });
    }
    match self.columns.iter_mut().find(|(c, _)| *c == column) {
      Some(slot) => slot.1 = value,
      None => self.columns.push((column, value)),
    }
    Ok(self)
  }

  pub fn table(&self) -> Table { self.table }

  pub fn columns(&self) -> &[(&'static str, Value)] { &self.columns }

  pub fn is_empty(&self) -> bool { self.columns.is_empty() }

  /// The filter as a JSON object, for echoing back to callers.
  pub fn to_row(&self) -> Row {
    self
      .columns
      .iter()
      .map(|(c, v)| ((*c).to_owned(), v.clone()))
      .collect()
  }
}

// ─── RowKey ──────────────────────────────────────────────────────────────────

/// A complete key: one value for every key column of the table, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey(KeyFilter);

impl RowKey {
  /// The key of the aggregate row for `id`.
  pub fn participant(id: &ParticipantId) -> Self {
    Self(KeyFilter::participant(Table::Participants, id))
  }

  /// Extract the key of `row` in `table`.
  pub fn from_row(table: Table, row: &Row) -> Result<Self> {
    let mut columns = Vec::with_capacity(table.key_columns().len());
    for &column in table.key_columns() {
      let value = row
        .get(column)
        .ok_or(Error::MissingKey { table: table.name(), column })?;
      if !is_scalar(value) {
        return Err(Error::NonScalarKey { table: table.name(), column });
      }
      columns.push((column, value.clone()));
    }
    Ok(Self(KeyFilter { table, columns }))
  }

  /// Promote a filter that binds every key column.
  pub fn from_filter(filter: KeyFilter) -> Result<Self> {
    let mut columns = Vec::with_capacity(filter.table.key_columns().len());
    for &column in filter.table.key_columns() {
      let value = filter
        .columns
        .iter()
        .find(|(c, _)| *c == column)
        .map(|(_, v)| v.clone())
        .ok_or(Error::MissingKey { table: filter.table.name(), column })?;
      columns.push((column, value));
    }
    Ok(Self(KeyFilter { table: filter.table, columns }))
  }

  pub fn table(&self) -> Table { self.0.table }

  pub fn columns(&self) -> &[(&'static str, Value)] { &self.0.columns }

  pub fn as_filter(&self) -> &KeyFilter { &self.0 }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::table::RecordGroup;

  #[test]
  fn filter_rejects_non_key_columns() {
    let err = KeyFilter::new(RecordGroup::Schedule)
      .eq("schedule", "x")
      .unwrap_err();
    assert!(matches!(err, Error::NotAKeyColumn { .. }));
  }

  #[test]
  fn filter_rejects_non_scalar_values() {
    let err = KeyFilter::new(RecordGroup::Care)
      .eq("carepartner_id", json!({ "nested": true }))
      .unwrap_err();
    assert!(matches!(err, Error::NonScalarKey { column: "carepartner_id", .. }));
  }

  #[test]
  fn filter_replaces_repeated_column() {
    let filter = KeyFilter::new(RecordGroup::Schedule)
      .eq("month", 3)
      .unwrap()
      .eq("month", 4)
      .unwrap();
    assert_eq!(filter.columns(), &[("month", json!(4))]);
  }

  #[test]
  fn row_key_follows_declared_column_order() {
    let row: Row = serde_json::from_value(json!({
      "year": 2024,
      "schedule": [],
      "month": 5,
      "participant_id": "p-1",
    }))
    .unwrap();

    let key = RowKey::from_row(Table::Group(RecordGroup::Schedule), &row).unwrap();
    let names: Vec<_> = key.columns().iter().map(|(c, _)| *c).collect();
    assert_eq!(names, ["participant_id", "month", "year"]);
  }

  #[test]
  fn row_key_requires_every_column() {
    let filter = KeyFilter::participant(
      RecordGroup::Care,
      &ParticipantId::new("p-1").unwrap(),
    );
    let err = RowKey::from_filter(filter).unwrap_err();
    assert!(matches!(err, Error::MissingKey { column: "carepartner_id", .. }));
  }
}
