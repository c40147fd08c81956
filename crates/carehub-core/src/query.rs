//! Reads and deletes over the participant aggregate and its groups.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{
  Error, Result,
  key::{KeyFilter, Row, RowKey},
  participant::{
    CARE_PARTNER_TYPE, CarePartnerLink, CarePartnerSummary, CaredForLink,
    LinkedParticipant, ParticipantAggregate, ParticipantId, ParticipantSummary,
    ParticipantView,
  },
  store::RecordStore,
  table::{RecordGroup, Table},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Text form of a stored key value, matching how stores compare keys.
fn key_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
    _ => None,
  }
}

/// Every `general_info` row, keyed by participant id.
async fn general_info_by_id<S>(store: &S) -> Result<HashMap<String, Row>>
where
  S: RecordStore,
{
  let rows = store
    .list_by_filter(&KeyFilter::new(RecordGroup::GeneralInfo))
    .await
    .map_err(Error::store)?;

  let column = RecordGroup::GeneralInfo.participant_column();
  Ok(
    rows
      .into_iter()
      .filter_map(|row| Some((key_text(row.get(column)?)?, row)))
      .collect(),
  )
}

async fn general_info<S>(store: &S, id: &str) -> Result<Option<Row>>
where
  S: RecordStore,
{
  let filter = KeyFilter::new(RecordGroup::GeneralInfo).eq("id", id)?;
  let rows = store.list_by_filter(&filter).await.map_err(Error::store)?;
  Ok(rows.into_iter().next())
}

/// Every participant with its general info, if recorded.
pub async fn list_participants<S>(store: &S) -> Result<Vec<ParticipantSummary>>
where
  S: RecordStore,
{
  let aggregates = store
    .list_by_filter(&KeyFilter::new(Table::Participants))
    .await
    .map_err(Error::store)?;
  let mut by_id = general_info_by_id(store).await?;

  aggregates
    .into_iter()
    .map(|row| {
      let aggregate = ParticipantAggregate::from_row(row)?;
      let general_info = by_id.remove(aggregate.id.as_str());
      Ok(ParticipantSummary { aggregate, general_info })
    })
    .collect()
}

/// Participants whose general info marks them as a care partner, each with
/// the participants they care for.
pub async fn list_care_partners<S>(store: &S) -> Result<Vec<CarePartnerSummary>>
where
  S: RecordStore,
{
  let aggregates = store
    .list_by_filter(&KeyFilter::new(Table::Participants))
    .await
    .map_err(Error::store)?;
  let general_info = general_info_by_id(store).await?;
  let care_rows = store
    .list_by_filter(&KeyFilter::new(RecordGroup::Care))
    .await
    .map_err(Error::store)?;

  let mut partners = Vec::new();
  for row in aggregates {
    let aggregate = ParticipantAggregate::from_row(row)?;
    let info = general_info.get(aggregate.id.as_str());
    let is_partner = info
      .and_then(|info| info.get("type"))
      .and_then(Value::as_str)
      == Some(CARE_PARTNER_TYPE);
    if !is_partner {
      continue;
    }

    let participants_cared_for = care_rows
      .iter()
      .filter(|care| {
        care.get("carepartner_id").and_then(key_text).as_deref()
          == Some(aggregate.id.as_str())
      })
      .filter_map(|care| {
        let id = key_text(care.get("id")?)?;
        Some(CaredForLink {
          primary:     care.get("primary").cloned().unwrap_or(Value::Null),
          participant: LinkedParticipant {
            general_info: general_info.get(&id).cloned(),
            id,
          },
        })
      })
      .collect();

    partners.push(CarePartnerSummary {
      general_info: info.cloned(),
      id: aggregate.id,
      participants_cared_for,
    });
  }
  Ok(partners)
}

/// The aggregate and every group's rows for `id`, plus care links in both
/// directions. Returns `None` if the participant does not exist.
pub async fn load_participant<S>(
  store: &S,
  id: &ParticipantId,
) -> Result<Option<ParticipantView>>
where
  S: RecordStore,
{
  let Some(row) = store
    .get_by_key(&RowKey::participant(id))
    .await
    .map_err(Error::store)?
  else {
    return Ok(None);
  };
  let aggregate = ParticipantAggregate::from_row(row)?;

  let mut groups = Row::new();
  let mut care_rows = Vec::new();
  for group in RecordGroup::all() {
    let rows = store
      .list_by_filter(&KeyFilter::participant(group, id))
      .await
      .map_err(Error::store)?;
    if group == RecordGroup::Care {
      care_rows = rows.clone();
    }
    groups.insert(
      group.name().to_owned(),
      Value::Array(rows.into_iter().map(Value::Object).collect()),
    );
  }

  let mut carepartners = Vec::with_capacity(care_rows.len());
  for care in care_rows {
    let Some(partner) = care.get("carepartner_id").and_then(key_text) else {
      continue;
    };
    carepartners.push(CarePartnerLink {
      primary:     care.get("primary").cloned().unwrap_or(Value::Null),
      carepartner: LinkedParticipant {
        general_info: general_info(store, &partner).await?,
        id:           partner,
      },
    });
  }

  let cared_for_rows = store
    .list_by_filter(&KeyFilter::new(RecordGroup::Care).eq("carepartner_id", id.as_str())?)
    .await
    .map_err(Error::store)?;
  let mut participants_cared_for = Vec::with_capacity(cared_for_rows.len());
  for care in cared_for_rows {
    let Some(cared) = care.get("id").and_then(key_text) else {
      continue;
    };
    participants_cared_for.push(CaredForLink {
      primary:     care.get("primary").cloned().unwrap_or(Value::Null),
      participant: LinkedParticipant {
        general_info: general_info(store, &cared).await?,
        id:           cared,
      },
    });
  }

  Ok(Some(ParticipantView {
    aggregate,
    groups,
    carepartners,
    participants_cared_for,
  }))
}

/// Schedule rows for `id`, optionally narrowed to a month and/or year.
///
/// Filter values are matched against the stored keys by text, so `"3"`
/// finds a schedule stored with `"month": 3`.
pub async fn list_schedules<S>(
  store: &S,
  id: &ParticipantId,
  month: Option<&str>,
  year: Option<&str>,
) -> Result<Vec<Row>>
where
  S: RecordStore,
{
  let mut filter = KeyFilter::participant(RecordGroup::Schedule, id);
  if let Some(month) = month {
    filter = filter.eq("month", month)?;
  }
  if let Some(year) = year {
    filter = filter.eq("year", year)?;
  }
  store.list_by_filter(&filter).await.map_err(Error::store)
}

// ─── Deletes ─────────────────────────────────────────────────────────────────

/// Delete the aggregate row for `id`. Group rows are removed by the store's
/// cascade. Returns the number of aggregate rows deleted (0 or 1).
pub async fn delete_participant<S>(store: &S, id: &ParticipantId) -> Result<u64>
where
  S: RecordStore,
{
  info!(participant_id = %id, "deleting participant");
  store
    .delete_by_key(RowKey::participant(id).as_filter())
    .await
    .map_err(Error::store)
}

/// Outcome of [`delete_group_rows`].
#[derive(Debug, Clone, Serialize)]
pub struct GroupDeletion {
  pub group:   RecordGroup,
  pub table:   &'static str,
  /// The key filter that was applied, participant column included.
  pub keys:    Row,
  pub deleted: u64,
}

/// Delete rows of `group_name` belonging to `raw_id`.
///
/// `key_fields` may narrow the delete with discriminator columns (e.g.
/// `{"month": 3, "year": 2024}` for schedules). Without them every row of the
/// participant in that group is deleted. Any non-key column is rejected.
pub async fn delete_group_rows<S>(
  store: &S,
  group_name: &str,
  raw_id: &str,
  key_fields: Option<Value>,
) -> Result<GroupDeletion>
where
  S: RecordStore,
{
  let group = RecordGroup::parse(group_name)?;
  let id = ParticipantId::new(raw_id)?;

  let mut filter = KeyFilter::participant(group, &id);
  match key_fields {
    None | Some(Value::Null) => {}
    Some(Value::Object(fields)) => {
      for (column, value) in fields {
        if column != group.participant_column() {
          filter = filter.eq(&column, value)?;
        }
      }
    }
    Some(_) => return Err(Error::MalformedBody),
  }

  info!(
    participant_id = %id,
    table = group.table(),
    keys = filter.columns().len(),
    "deleting participant data"
  );
  let deleted = store.delete_by_key(&filter).await.map_err(Error::store)?;

  Ok(GroupDeletion { group, table: group.table(), keys: filter.to_row(), deleted })
}
