//! JSON REST API for carehub.
//!
//! Exposes an axum [`Router`] backed by any
//! [`carehub_core::store::RecordStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility; handlers receive already-authenticated
//! requests.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", carehub_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod participants;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{delete, get},
};
use carehub_core::store::RecordStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CAREHUB_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route("/participants", get(participants::list::<S>))
    .route("/participants/carepartners", get(participants::care_partners::<S>))
    .route(
      "/participants/{id}",
      get(participants::get_one::<S>)
        .put(participants::update::<S>)
        .delete(participants::delete_one::<S>),
    )
    .route(
      "/participants/{id}/groups/{group}",
      delete(participants::delete_group::<S>),
    )
    .route("/participants/{id}/schedules", get(participants::schedules::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests;
