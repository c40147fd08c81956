//! Handlers for `/participants` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/participants` | Aggregates with their general info |
//! | `GET`    | `/participants/carepartners` | Care partners and who they care for |
//! | `GET`    | `/participants/:id` | Aggregate, group rows and care links; 404 if absent |
//! | `PUT`    | `/participants/:id` | Body: `{"<group>": {...}, ...}`; multi-group update |
//! | `DELETE` | `/participants/:id` | Deletes the aggregate; group rows cascade |
//! | `DELETE` | `/participants/:id/groups/:group` | Optional body of key columns |
//! | `GET`    | `/participants/:id/schedules` | Optional `?month` and `?year` |

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::{Path, Query, State, rejection::JsonRejection},
  response::IntoResponse,
};
use carehub_core::{
  key::Row,
  participant::{
    CarePartnerSummary, ParticipantId, ParticipantSummary, ParticipantView,
  },
  query::{self, GroupDeletion},
  report::UpdateReport,
  store::RecordStore,
  update,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /participants`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ParticipantSummary>>, ApiError>
where
  S: RecordStore,
{
  let participants = query::list_participants(store.as_ref()).await?;
  Ok(Json(participants))
}

/// `GET /participants/carepartners`
pub async fn care_partners<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CarePartnerSummary>>, ApiError>
where
  S: RecordStore,
{
  let partners = query::list_care_partners(store.as_ref()).await?;
  Ok(Json(partners))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /participants/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<ParticipantView>, ApiError>
where
  S: RecordStore,
{
  let id = ParticipantId::new(id)?;
  let view = query::load_participant(store.as_ref(), &id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("participant {id} not found")))?;
  Ok(Json(view))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /participants/:id`. The body maps group names to field objects.
///
/// Returns the update report; failures carry the partial report too.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateReport>, ApiError>
where
  S: RecordStore,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let report = update::apply(store.as_ref(), &id, body).await?;
  Ok(Json(report))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /participants/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let id = ParticipantId::new(id)?;
  let deleted = query::delete_participant(store.as_ref(), &id).await?;
  if deleted == 0 {
    return Err(ApiError::NotFound(format!("participant {id} not found")));
  }
  Ok(Json(json!({
    "message": format!("Participant {id} successfully deleted"),
    "participantid": id,
  })))
}

/// `DELETE /participants/:id/groups/:group` with an optional JSON body of key
/// columns narrowing the delete, e.g. `{"month": 3, "year": 2024}`.
pub async fn delete_group<S>(
  State(store): State<Arc<S>>,
  Path((id, group)): Path<(String, String)>,
  body: Bytes,
) -> Result<Json<GroupDeletion>, ApiError>
where
  S: RecordStore,
{
  let key_fields = if body.is_empty() {
    None
  } else {
    Some(
      serde_json::from_slice::<Value>(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?,
    )
  };
  let deletion =
    query::delete_group_rows(store.as_ref(), &group, &id, key_fields).await?;
  Ok(Json(deletion))
}

// ─── Schedules ────────────────────────────────────────────────────────────────

/// Kept as text: schedule keys may be any scalar, and stores match them by
/// their text form.
#[derive(Debug, Deserialize, Default)]
pub struct ScheduleParams {
  pub month: Option<String>,
  pub year:  Option<String>,
}

/// `GET /participants/:id/schedules[?month=..][&year=..]`
pub async fn schedules<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Query(params): Query<ScheduleParams>,
) -> Result<Json<Vec<Row>>, ApiError>
where
  S: RecordStore,
{
  let id = ParticipantId::new(id)?;
  let rows = query::list_schedules(
    store.as_ref(),
    &id,
    params.month.as_deref(),
    params.year.as_deref(),
  )
  .await?;
  Ok(Json(rows))
}
