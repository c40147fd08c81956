//! The table registry: the closed set of tables a request may touch.
//!
//! Group names arriving in request bodies are parsed into [`RecordGroup`];
//! nothing else can name a table. Every table and column name that reaches a
//! storage backend is a `&'static str` taken from this module.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

// ─── Record groups ───────────────────────────────────────────────────────────

/// A named sub-record of a participant, stored in its own table.
///
/// The `snake_case` name is the wire name used as a top-level key in update
/// payloads and in `updated_tables`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordGroup {
  GeneralInfo,
  Demographics,
  AddressAndContact,
  MaritalStatus,
  /// Care-partnership links, one row per care partner.
  Care,
  HowDataFields,
  HowFalls,
  HowHospitalization,
  HowPrograms,
  HowToileting,
  Services,
  /// Monthly schedules, one row per month and year.
  Schedule,
}

impl RecordGroup {
  /// Look up a group by its wire name.
  pub fn parse(name: &str) -> Result<Self> {
    Self::from_str(name).map_err(|_| Error::UnknownGroup(name.to_owned()))
  }

  /// Whether `name` is a registered group.
  pub fn is_valid(name: &str) -> bool { Self::parse(name).is_ok() }

  /// All registered groups, in registry order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  pub fn name(self) -> &'static str { self.into() }

  /// Physical table identifier.
  pub fn table(self) -> &'static str {
    match self {
      Self::GeneralInfo => "participant_general_info",
      Self::Demographics => "participant_demographics",
      Self::AddressAndContact => "participant_address_and_contact",
      Self::MaritalStatus => "participant_marital_status",
      Self::Care => "participant_care",
      Self::HowDataFields => "participant_how_data_fields",
      Self::HowFalls => "participant_how_falls",
      Self::HowHospitalization => "participant_how_hospitalization",
      Self::HowPrograms => "participant_how_programs",
      Self::HowToileting => "participant_how_toileting",
      Self::Services => "participant_services",
      Self::Schedule => "participant_schedule",
    }
  }

  /// Conflict key columns. The first is always the participant column.
  pub fn key_columns(self) -> &'static [&'static str] {
    match self {
      Self::Care => &["id", "carepartner_id"],
      Self::Schedule => &["participant_id", "month", "year"],
      _ => &["id"],
    }
  }

  /// The column holding the participant id.
  pub fn participant_column(self) -> &'static str { self.key_columns()[0] }

  /// Key columns beyond the participant column.
  pub fn discriminators(self) -> &'static [&'static str] {
    &self.key_columns()[1..]
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Any table reachable through a [`crate::store::RecordStore`]: the
/// participant aggregate or one of the group tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  Participants,
  Group(RecordGroup),
}

impl Table {
  /// Every table, aggregate first.
  pub fn all() -> impl Iterator<Item = Self> {
    std::iter::once(Self::Participants).chain(RecordGroup::all().map(Self::Group))
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Participants => "participants",
      Self::Group(g) => g.table(),
    }
  }

  pub fn key_columns(self) -> &'static [&'static str] {
    match self {
      Self::Participants => &["id"],
      Self::Group(g) => g.key_columns(),
    }
  }

  /// The column holding the participant id.
  pub fn participant_column(self) -> &'static str { self.key_columns()[0] }

  /// Resolve `column` to the registry's static name if it is a key column.
  pub fn key_column(self, column: &str) -> Result<&'static str> {
    self
      .key_columns()
      .iter()
      .copied()
      .find(|c| *c == column)
      .ok_or_else(|| Error::NotAKeyColumn {
        table:  self.name(),
        column: column.to_owned(),
      })
  }
}

impl From<RecordGroup> for Table {
  fn from(g: RecordGroup) -> Self { Self::Group(g) }
}
