//! The participant aggregate, the root row every group row belongs to.
//!
//! The aggregate carries only identity and timestamps. Everything else about a
//! participant lives in group rows keyed by the same id.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, key::Row};

/// A caller-supplied participant identifier. Opaque; never generated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
  /// Rejects empty or whitespace-only ids.
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      return Err(Error::MissingParticipantId);
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ParticipantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// The row stored in the `participants` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantAggregate {
  pub id:                     ParticipantId,
  pub participant_created_at: DateTime<Utc>,
  /// Bumped after every successful multi-group update.
  pub participant_updated_at: DateTime<Utc>,
}

impl ParticipantAggregate {
  pub fn new(id: ParticipantId, now: DateTime<Utc>) -> Self {
    Self { id, participant_created_at: now, participant_updated_at: now }
  }

  pub fn to_row(&self) -> Result<Row> {
    let mut row = Row::new();
    row.insert("id".into(), Value::from(self.id.as_str()));
    row.insert(
      "participant_created_at".into(),
      serde_json::to_value(self.participant_created_at)?,
    );
    row.insert(
      "participant_updated_at".into(),
      serde_json::to_value(self.participant_updated_at)?,
    );
    Ok(row)
  }

  pub fn from_row(row: Row) -> Result<Self> {
    Ok(serde_json::from_value(Value::Object(row))?)
  }
}

/// An aggregate together with its `general_info` row, as listed by
/// [`crate::query::list_participants`].
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSummary {
  #[serde(flatten)]
  pub aggregate:    ParticipantAggregate,
  pub general_info: Option<Row>,
}

/// The full read model for one participant: the aggregate plus every group's
/// rows, keyed by group name in registry order.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
  #[serde(flatten)]
  pub aggregate:              ParticipantAggregate,
  pub groups:                 Row,
  /// Care partners of this participant.
  pub carepartners:           Vec<CarePartnerLink>,
  /// Participants this participant is a care partner for.
  pub participants_cared_for: Vec<CaredForLink>,
}

// ─── Care partnerships ───────────────────────────────────────────────────────

/// `general_info.type` value marking a participant as a care partner.
pub const CARE_PARTNER_TYPE: &str = "Care Partner";

/// The other side of a care link, with its general info if recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedParticipant {
  pub id:           String,
  pub general_info: Option<Row>,
}

/// A `care` row seen from the cared-for participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarePartnerLink {
  pub primary:     Value,
  pub carepartner: LinkedParticipant,
}

/// A `care` row seen from the care partner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaredForLink {
  pub primary:     Value,
  pub participant: LinkedParticipant,
}

/// A care partner with everyone they care for, as listed by
/// [`crate::query::list_care_partners`].
#[derive(Debug, Clone, Serialize)]
pub struct CarePartnerSummary {
  pub id:                     ParticipantId,
  pub general_info:           Option<Row>,
  pub participants_cared_for: Vec<CaredForLink>,
}
