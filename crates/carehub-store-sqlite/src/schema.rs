//! SQL schema for the carehub SQLite store.
//!
//! Executed once at connection startup. Every table stores its key columns as
//! TEXT (so `3` and `"3"` address the same schedule month) and the full row
//! as a JSON object in `fields`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS participants (
    id      TEXT PRIMARY KEY,
    fields  TEXT NOT NULL        -- JSON object; includes id and timestamps
);

-- One row per participant.
CREATE TABLE IF NOT EXISTS participant_general_info (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_demographics (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_address_and_contact (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_marital_status (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_how_data_fields (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_how_falls (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_how_hospitalization (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_how_programs (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_how_toileting (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participant_services (
    id      TEXT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    fields  TEXT NOT NULL
);

-- One row per (participant, care partner).
CREATE TABLE IF NOT EXISTS participant_care (
    id              TEXT NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    carepartner_id  TEXT NOT NULL,
    fields          TEXT NOT NULL,
    PRIMARY KEY (id, carepartner_id)
);

-- One row per (participant, month, year).
CREATE TABLE IF NOT EXISTS participant_schedule (
    participant_id  TEXT NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    month           TEXT NOT NULL,
    year            TEXT NOT NULL,
    fields          TEXT NOT NULL,
    PRIMARY KEY (participant_id, month, year)
);

CREATE INDEX IF NOT EXISTS participant_care_partner_idx ON participant_care(carepartner_id);

PRAGMA user_version = 1;
";
