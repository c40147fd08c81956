//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use carehub_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn router() -> axum::Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn send(
  app: &axum::Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, json)
}

fn new_id() -> String { Uuid::new_v4().to_string() }

// ── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_creates_participant_and_reports_groups() {
  let app = router().await;
  let id = new_id();

  let (status, body) = send(
    &app,
    "PUT",
    &format!("/participants/{id}"),
    Some(json!({ "general_info": { "first_name": "Jo", "last_name": "Lee" } })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["participantid"], id.as_str());
  assert_eq!(body["updated_tables"], json!(["general_info"]));
  assert_eq!(body["updated_data"]["general_info"]["first_name"], "Jo");

  let (status, view) = send(&app, "GET", &format!("/participants/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(view["id"], id.as_str());
  assert_eq!(view["groups"]["general_info"][0]["last_name"], "Lee");
}

#[tokio::test]
async fn put_with_unknown_group_is_400_with_empty_report() {
  let app = router().await;
  let id = new_id();

  let (status, body) = send(
    &app,
    "PUT",
    &format!("/participants/{id}"),
    Some(json!({ "general_info": { "first_name": "Jo" }, "users": { "admin": true } })),
  )
  .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid table: users");
  assert_eq!(body["kind"], "validation");
  assert_eq!(body["updated_tables"], json!([]));
  assert_eq!(body["updated_data"], json!({}));
  assert_eq!(body["participantid"], id.as_str());

  let (status, _) = send(&app, "GET", &format!("/participants/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_with_invalid_json_is_400() {
  let app = router().await;
  let req = Request::builder()
    .method("PUT")
    .uri("/participants/p-1")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_empty_body_object_touches_participant() {
  let app = router().await;
  let id = new_id();

  let (status, body) =
    send(&app, "PUT", &format!("/participants/{id}"), Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["updated_tables"], json!([]));

  let (status, list) = send(&app, "GET", "/participants", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
  assert_eq!(list[0]["general_info"], Value::Null);
}

// ── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_unknown_participant_is_404() {
  let app = router().await;
  let (status, body) =
    send(&app, "GET", &format!("/participants/{}", new_id()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn schedules_filter_by_month_and_year() {
  let app = router().await;
  let id = new_id();
  for (month, year) in [(1, 2024), (2, 2024), (1, 2025)] {
    let (status, _) = send(
      &app,
      "PUT",
      &format!("/participants/{id}"),
      Some(json!({ "schedule": { "month": month, "year": year, "schedule": ["mon"] } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  let (_, all) = send(&app, "GET", &format!("/participants/{id}/schedules"), None).await;
  assert_eq!(all.as_array().unwrap().len(), 3);

  let (_, january) =
    send(&app, "GET", &format!("/participants/{id}/schedules?month=1"), None).await;
  assert_eq!(january.as_array().unwrap().len(), 2);

  let (_, one) = send(
    &app,
    "GET",
    &format!("/participants/{id}/schedules?month=1&year=2025"),
    None,
  )
  .await;
  assert_eq!(one.as_array().unwrap().len(), 1);
  assert_eq!(one[0]["year"], 2025);
}

// ── Deletes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_participant_then_404() {
  let app = router().await;
  let id = new_id();
  send(
    &app,
    "PUT",
    &format!("/participants/{id}"),
    Some(json!({ "general_info": { "first_name": "Jo" } })),
  )
  .await;

  let (status, body) = send(&app, "DELETE", &format!("/participants/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["participantid"], id.as_str());

  let (status, _) = send(&app, "DELETE", &format!("/participants/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_group_rows_by_key_fields() {
  let app = router().await;
  let id = new_id();
  for partner in ["p-2", "p-3"] {
    send(
      &app,
      "PUT",
      &format!("/participants/{id}"),
      Some(json!({ "care": { "carepartner_id": partner, "primary": false } })),
    )
    .await;
  }

  let (status, body) = send(
    &app,
    "DELETE",
    &format!("/participants/{id}/groups/care"),
    Some(json!({ "carepartner_id": "p-2" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["deleted"], 1);
  assert_eq!(body["table"], "participant_care");
  assert_eq!(body["keys"], json!({ "id": id, "carepartner_id": "p-2" }));

  let (_, view) = send(&app, "GET", &format!("/participants/{id}"), None).await;
  assert_eq!(view["groups"]["care"].as_array().unwrap().len(), 1);
  assert_eq!(view["groups"]["care"][0]["carepartner_id"], "p-3");
}

#[tokio::test]
async fn delete_group_rejects_unknown_group_and_non_key_columns() {
  let app = router().await;
  let id = new_id();

  let (status, body) =
    send(&app, "DELETE", &format!("/participants/{id}/groups/participants"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid table: participants");

  let (status, _) = send(
    &app,
    "DELETE",
    &format!("/participants/{id}/groups/general_info"),
    Some(json!({ "first_name": "Jo" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_ok() {
  let app = router().await;
  let (status, body) = send(&app, "GET", "/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn schedules_filter_by_named_month() {
  let app = router().await;
  let id = new_id();
  send(
    &app,
    "PUT",
    &format!("/participants/{id}"),
    Some(json!({ "schedule": { "month": "March", "year": 2024, "schedule": [] } })),
  )
  .await;

  let (status, rows) = send(
    &app,
    "GET",
    &format!("/participants/{id}/schedules?month=March&year=2024"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(rows.as_array().unwrap().len(), 1);
  assert_eq!(rows[0]["month"], "March");
}

#[tokio::test]
async fn care_partners_are_listed_and_linked() {
  let app = router().await;
  let partner = new_id();
  let cared = new_id();
  send(
    &app,
    "PUT",
    &format!("/participants/{partner}"),
    Some(json!({ "general_info": { "first_name": "Sam", "type": "Care Partner" } })),
  )
  .await;
  send(
    &app,
    "PUT",
    &format!("/participants/{cared}"),
    Some(json!({
      "general_info": { "first_name": "Jo", "type": "Participant" },
      "care": { "carepartner_id": partner, "primary": true },
    })),
  )
  .await;

  let (status, list) = send(&app, "GET", "/participants/carepartners", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
  assert_eq!(list[0]["id"], partner.as_str());
  assert_eq!(list[0]["participants_cared_for"][0]["participant"]["id"], cared.as_str());
  assert_eq!(list[0]["participants_cared_for"][0]["primary"], true);

  let (_, view) = send(&app, "GET", &format!("/participants/{cared}"), None).await;
  assert_eq!(view["carepartners"][0]["carepartner"]["id"], partner.as_str());
  assert_eq!(
    view["carepartners"][0]["carepartner"]["general_info"]["first_name"],
    "Sam"
  );
  assert_eq!(view["participants_cared_for"], json!([]));
}
