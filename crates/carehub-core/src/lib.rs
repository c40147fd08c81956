//! Core types and the participant record orchestrator for carehub.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::RecordStore`]; the HTTP layer calls into
//! [`update`] and [`query`].

pub mod error;
pub mod key;
pub mod participant;
pub mod query;
pub mod report;
pub mod store;
pub mod table;
pub mod update;

pub use error::{BoxError, Error, Result};
