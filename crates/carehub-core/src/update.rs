//! Multi-group participant updates.
//!
//! A request names a participant and maps group names to field objects. The
//! pipeline is:
//!
//! 1. [`GroupPayload::parse`]: validate every group name and payload shape
//!    against the registry. No I/O; any error rejects the whole request.
//! 2. [`ensure_aggregate`]: create the participant row on first reference.
//! 3. [`apply_groups`]: upsert each group in caller order, stopping at the
//!    first failure.
//! 4. [`touch`]: bump the aggregate's `participant_updated_at`.
//!
//! Writes are not rolled back: a failure in step 3 or 4 leaves earlier group
//! writes committed and reports them in the partial [`UpdateReport`].

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
  Error, Result,
  key::{Row, RowKey},
  participant::{ParticipantAggregate, ParticipantId},
  report::{UpdateError, UpdateFailure, UpdateReport},
  store::RecordStore,
  table::{RecordGroup, Table},
};

// ─── Payload ─────────────────────────────────────────────────────────────────

/// A validated update payload: the groups to write, in caller order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPayload {
  writes:  Vec<(RecordGroup, Row)>,
  skipped: Vec<RecordGroup>,
}

impl GroupPayload {
  /// Validate a request body.
  ///
  /// The body must be a JSON object whose keys are all registered group
  /// names. A group whose value is `null` or `{}` is skipped. Any other value
  /// must be an object; composite-key groups must carry their discriminator
  /// columns as scalars.
  pub fn parse(body: Value) -> Result<Self> {
    let Value::Object(groups) = body else {
      return Err(Error::MalformedBody);
    };

    let mut payload = Self::default();
    for (name, fields) in groups {
      let group = RecordGroup::parse(&name)?;
      match fields {
        Value::Null => payload.skipped.push(group),
        Value::Object(fields) if fields.is_empty() => payload.skipped.push(group),
        Value::Object(fields) => {
          check_discriminators(group, &fields)?;
          payload.writes.push((group, fields));
        }
        other => {
          return Err(Error::MalformedGroup {
            group,
            reason: format!("expected an object, got {}", json_kind(&other)),
          });
        }
      }
    }
    Ok(payload)
  }

  /// Groups to write, in caller order.
  pub fn writes(&self) -> &[(RecordGroup, Row)] { &self.writes }

  /// Groups present in the request with an empty payload.
  pub fn skipped(&self) -> &[RecordGroup] { &self.skipped }

  pub fn is_empty(&self) -> bool { self.writes.is_empty() }
}

fn check_discriminators(group: RecordGroup, fields: &Row) -> Result<()> {
  for &column in group.discriminators() {
    match fields.get(column) {
      Some(Value::String(_) | Value::Number(_) | Value::Bool(_)) => {}
      Some(_) => {
        return Err(Error::NonScalarKey { table: group.table(), column });
      }
      None => return Err(Error::MissingKey { table: group.table(), column }),
    }
  }
  Ok(())
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

// ─── Existence gate ──────────────────────────────────────────────────────────

/// Result of [`ensure_aggregate`].
#[derive(Debug, Clone)]
pub struct GateOutcome {
  /// Whether this call inserted the aggregate row.
  pub created:   bool,
  pub aggregate: ParticipantAggregate,
}

/// Make sure the aggregate row for `id` exists, inserting it if absent.
///
/// Idempotent: a second call finds the row and performs no insert. If an
/// insert loses a race with another request for the same id, the row that
/// request created is returned with `created: false`.
pub async fn ensure_aggregate<S>(
  store: &S,
  id: &ParticipantId,
) -> Result<GateOutcome, UpdateError>
where
  S: RecordStore,
{
  let key = RowKey::participant(id);
  let existing = store
    .get_by_key(&key)
    .await
    .map_err(|e| UpdateError::internal("failed to read participant", e))?;

  if let Some(row) = existing {
    let aggregate = ParticipantAggregate::from_row(row)
      .map_err(|e| UpdateError::internal("stored participant is malformed", e))?;
    return Ok(GateOutcome { created: false, aggregate });
  }

  info!(participant_id = %id, "adding participant");
  let aggregate = ParticipantAggregate::new(id.clone(), Utc::now());
  let row = aggregate
    .to_row()
    .map_err(|e| UpdateError::internal("failed to encode participant", e))?;

  let (row, created) = match store.insert(Table::Participants, row).await {
    Ok(row) => (row, true),
    Err(e) => {
      // A concurrent request may have inserted the same id after our read.
      let winner = store
        .get_by_key(&key)
        .await
        .map_err(|e| UpdateError::internal("failed to read participant", e))?;
      match winner {
        Some(row) => {
          debug!(participant_id = %id, "participant created concurrently");
          (row, false)
        }
        None => {
          return Err(UpdateError::store_write(Table::Participants.name(), e));
        }
      }
    }
  };
  let aggregate = ParticipantAggregate::from_row(row)
    .map_err(|e| UpdateError::internal("stored participant is malformed", e))?;

  Ok(GateOutcome { created, aggregate })
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

/// Upsert one group row for `id` and return the stored row.
///
/// The participant column is always set to `id`, overriding any value the
/// caller supplied.
pub async fn write_group<S>(
  store: &S,
  id: &ParticipantId,
  group: RecordGroup,
  fields: &Row,
) -> Result<Row, UpdateError>
where
  S: RecordStore,
{
  let mut row = fields.clone();
  row.insert(group.participant_column().to_owned(), Value::from(id.as_str()));

  debug!(participant_id = %id, table = group.table(), "updating participant data");
  match store.upsert_by_key(Table::Group(group), row).await {
    Ok(Some(row)) => Ok(row),
    Ok(None) => Err(UpdateError::store_write(
      group.table(),
      Error::EmptyWrite(group.table()),
    )),
    Err(e) => Err(UpdateError::store_write(group.table(), e)),
  }
}

/// Write every group in `payload` in order, folding results into `report`.
///
/// Stops at the first failing group; the returned failure carries the groups
/// written before it.
pub async fn apply_groups<S>(
  store: &S,
  id: &ParticipantId,
  payload: &GroupPayload,
  mut report: UpdateReport,
) -> Result<UpdateReport, UpdateFailure>
where
  S: RecordStore,
{
  for (group, fields) in payload.writes() {
    match write_group(store, id, *group, fields).await {
      Ok(row) => report.record(*group, row),
      Err(error) => {
        warn!(
          participant_id = %id,
          group = %group,
          written = report.updated_tables.len(),
          "group update failed; stopping"
        );
        return Err(report.fail(error));
      }
    }
  }
  Ok(report)
}

// ─── Stamper ─────────────────────────────────────────────────────────────────

/// Set the aggregate's `participant_updated_at` to now.
///
/// Only updates an existing aggregate. If the row is gone (e.g. deleted
/// since the gate ran) nothing is written and the stamp fails.
pub async fn touch<S>(
  store: &S,
  id: &ParticipantId,
) -> Result<ParticipantAggregate, UpdateError>
where
  S: RecordStore,
{
  let mut row = Row::new();
  row.insert("id".into(), Value::from(id.as_str()));
  let now = serde_json::to_value(Utc::now())
    .map_err(|e| UpdateError::internal("failed to encode timestamp", e))?;
  row.insert("participant_updated_at".into(), now);

  debug!(participant_id = %id, "updating participant_updated_at");
  let row = store
    .update_by_key(Table::Participants, row)
    .await
    .map_err(|e| UpdateError::internal("failed to stamp participant", e))?
    .ok_or_else(|| {
      UpdateError::internal(
        "failed to stamp participant",
        Error::UnknownParticipant(id.to_string()),
      )
    })?;

  ParticipantAggregate::from_row(row)
    .map_err(|e| UpdateError::internal("stamped participant is malformed", e))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Apply a multi-group update for the participant `raw_id`.
///
/// On success the report lists every written group in order. On failure the
/// report inside [`UpdateFailure`] holds whatever was written before the
/// failing step; its `participant_id` is `None` only if `raw_id` was empty.
pub async fn apply<S>(
  store: &S,
  raw_id: &str,
  body: Value,
) -> Result<UpdateReport, UpdateFailure>
where
  S: RecordStore,
{
  let report = UpdateReport::default();
  let id = match ParticipantId::new(raw_id) {
    Ok(id) => id,
    Err(e) => return Err(report.fail(e)),
  };
  let report = UpdateReport::for_participant(id.clone());

  let payload = match GroupPayload::parse(body) {
    Ok(payload) => payload,
    Err(e) => return Err(report.fail(e)),
  };

  if let Err(e) = ensure_aggregate(store, &id).await {
    return Err(report.fail(e));
  }

  let report = apply_groups(store, &id, &payload, report).await?;

  if let Err(e) = touch(store, &id).await {
    error!(
      participant_id = %id,
      written = report.updated_tables.len(),
      "group writes committed but participant timestamp is stale"
    );
    return Err(report.fail(e));
  }

  Ok(report)
}
