//! Encoding helpers between core rows/keys and the plain-text representations
//! stored in SQLite columns.
//!
//! Key values are stored as TEXT: strings verbatim, numbers and booleans in
//! their JSON spelling. Rows are stored as compact JSON objects.

use carehub_core::key::Row;
use serde_json::Value;

use crate::Result;

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Text form of a scalar key value.
pub fn encode_key_value(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// `a = ?1 AND b = ?2 ...` over `columns`, plus the bound values in order.
pub fn encode_conditions(columns: &[(&'static str, Value)]) -> (String, Vec<String>) {
  let sql = columns
    .iter()
    .enumerate()
    .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
    .collect::<Vec<_>>()
    .join(" AND ");
  let values = columns.iter().map(|(_, v)| encode_key_value(v)).collect();
  (sql, values)
}

/// `?1, ?2, ... ?n`
pub fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

// ─── Rows ────────────────────────────────────────────────────────────────────

pub fn encode_row(row: &Row) -> Result<String> { Ok(serde_json::to_string(row)?) }

pub fn decode_row(s: &str) -> Result<Row> { Ok(serde_json::from_str(s)?) }

/// Overlay `incoming` onto `stored`: provided columns win, omitted columns
/// keep their stored values.
pub fn merge_rows(mut stored: Row, incoming: Row) -> Row {
  stored.extend(incoming);
  stored
}

/// Box a JSON error so it can leave a `tokio_rusqlite` closure.
pub fn json_in_call(e: serde_json::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}
