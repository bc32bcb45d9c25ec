//! JSON REST API for opptrack.
//!
//! Exposes an axum [`Router`] backed by any
//! [`opptrack_core::store::OpportunityStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", opptrack_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod opportunities;
pub mod reports;
pub mod revisions;

use std::sync::Arc;

use axum::{Router, routing::get};
use opptrack_core::store::OpportunityStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: OpportunityStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Records
    .route(
      "/opportunities",
      get(opportunities::list::<S>).post(opportunities::create::<S>),
    )
    .route(
      "/opportunities/{uid}",
      get(opportunities::get_one::<S>)
        .put(opportunities::update_one::<S>)
        .delete(opportunities::delete_one::<S>),
    )
    // History
    .route(
      "/opportunities/{uid}/revisions",
      get(revisions::list_revisions::<S>),
    )
    .route(
      "/opportunities/{uid}/forecast-revisions",
      get(revisions::list_forecast_changes::<S>),
    )
    // Reports
    .route("/reports/forecast", get(reports::forecast::<S>))
    .route("/reports/win-loss", get(reports::win_loss::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use opptrack_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn test_router() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
  }

  async fn send(
    router: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        builder.body(Body::from(json.to_string())).unwrap()
      }
      None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let parsed = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, parsed)
  }

  async fn create(router: &Router, body: Value) -> String {
    let (status, created) =
      send(router.clone(), "POST", "/opportunities", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    created["uid"].as_str().unwrap().to_owned()
  }

  // ── Records ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_get_roundtrip() {
    let router = test_router().await;
    let uid = create(
      &router,
      json!({"project_name": "Bridge", "changed_by": "alice"}),
    )
    .await;

    let (status, fetched) =
      send(router, "GET", &format!("/opportunities/{uid}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["project_name"], json!("Bridge"));
    assert_eq!(fetched["uid"], json!(uid));
  }

  #[tokio::test]
  async fn list_returns_all_records() {
    let router = test_router().await;
    create(&router, json!({"client": "ACME"})).await;
    create(&router, json!({"client": "Globex"})).await;

    let (status, listed) =
      send(router, "GET", "/opportunities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn get_unknown_uid_returns_404() {
    let router = test_router().await;
    let (status, body) = send(
      router,
      "GET",
      &format!("/opportunities/{}", uuid::Uuid::new_v4()),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  // ── Updates ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_unknown_uid_returns_404() {
    let router = test_router().await;
    let (status, _) = send(
      router,
      "PUT",
      &format!("/opportunities/{}", uuid::Uuid::new_v4()),
      Some(json!({"opp_status": "Submitted"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn update_with_no_usable_fields_returns_400() {
    let router = test_router().await;
    let uid = create(&router, json!({"client": "ACME"})).await;

    let (status, _) = send(
      router.clone(),
      "PUT",
      &format!("/opportunities/{uid}"),
      Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A payload of only reserved keys is just as empty.
    let (status, _) = send(
      router,
      "PUT",
      &format!("/opportunities/{uid}"),
      Some(json!({"uid": "anything", "changed_by": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn update_with_unknown_field_returns_400() {
    let router = test_router().await;
    let uid = create(&router, json!({"client": "ACME"})).await;

    let (status, body) = send(
      router,
      "PUT",
      &format!("/opportunities/{uid}"),
      Some(json!({"favourite_colour": "red"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("favourite_colour"));
  }

  #[tokio::test]
  async fn revision_history_grows_across_updates() {
    let router = test_router().await;
    let uid = create(&router, json!({"final_amt": 4000})).await;

    let (status, _) = send(
      router.clone(),
      "PUT",
      &format!("/opportunities/{uid}"),
      Some(json!({"revision": 1, "final_amt": 5000, "changed_by": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, revisions) = send(
      router,
      "GET",
      &format!("/opportunities/{uid}/revisions"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let revisions = revisions.as_array().unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0]["revision_number"], json!(0));
    assert_eq!(revisions[0]["snapshot"]["final_amt"], json!(4000));
    assert_eq!(revisions[1]["revision_number"], json!(1));
    assert_eq!(revisions[1]["snapshot"]["final_amt"], json!(5000));
    assert_eq!(revisions[1]["changed_by"], json!("bob"));
  }

  #[tokio::test]
  async fn forecast_history_records_each_change() {
    let router = test_router().await;
    let uid = create(&router, json!({})).await;

    for date in ["2025-03-01", "2025-04-15"] {
      let (status, _) = send(
        router.clone(),
        "PUT",
        &format!("/opportunities/{uid}"),
        Some(json!({"forecast_date": date})),
      )
      .await;
      assert_eq!(status, StatusCode::OK);
    }

    let (status, changes) = send(
      router,
      "GET",
      &format!("/opportunities/{uid}/forecast-revisions"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let changes = changes.as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0]["old_forecast_date"], Value::Null);
    assert_eq!(changes[0]["new_forecast_date"], json!("2025-03-01"));
    assert_eq!(changes[1]["old_forecast_date"], json!("2025-03-01"));
    assert_eq!(changes[1]["new_forecast_date"], json!("2025-04-15"));
  }

  // ── Deletion ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_removes_record_and_history() {
    let router = test_router().await;
    let uid = create(&router, json!({"final_amt": 1000})).await;

    let (status, _) = send(
      router.clone(),
      "DELETE",
      &format!("/opportunities/{uid}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
      send(router.clone(), "GET", &format!("/opportunities/{uid}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, revisions) = send(
      router.clone(),
      "GET",
      &format!("/opportunities/{uid}/revisions"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(revisions.as_array().unwrap().is_empty());

    let (status, _) = send(
      router,
      "DELETE",
      &format!("/opportunities/{uid}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Reports ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn forecast_report_excludes_closed_records() {
    let router = test_router().await;
    create(
      &router,
      json!({"project_name": "Open", "forecast_date": "2025-03-01", "final_amt": 1000, "opp_status": "OP50"}),
    )
    .await;
    create(
      &router,
      json!({"project_name": "Lost", "forecast_date": "2025-03-01", "final_amt": 9000, "opp_status": "LOST"}),
    )
    .await;

    let (status, report) =
      send(router.clone(), "GET", "/reports/forecast", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_count"], json!(1));
    assert_eq!(report["total_amount"], json!(1000.0));

    // An exact status filter narrows further; "all" does not.
    let (_, filtered) = send(
      router.clone(),
      "GET",
      "/reports/forecast?status=OP30",
      None,
    )
    .await;
    assert_eq!(filtered["total_count"], json!(0));

    let (_, unfiltered) =
      send(router, "GET", "/reports/forecast?status=all", None).await;
    assert_eq!(unfiltered["total_count"], json!(1));
  }

  #[tokio::test]
  async fn win_loss_report_lists_distinct_filter_values() {
    let router = test_router().await;
    create(&router, json!({"solutions": "Cloud", "account_mgr": "Reyes"})).await;
    create(&router, json!({"solutions": "Networking", "account_mgr": "Reyes"})).await;
    create(&router, json!({"solutions": "Cloud"})).await;

    let (status, data) =
      send(router, "GET", "/reports/win-loss", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["opportunities"].as_array().unwrap().len(), 3);
    assert_eq!(data["unique_solutions"], json!(["Cloud", "Networking"]));
    assert_eq!(data["unique_account_mgrs"], json!(["Reyes"]));
  }
}
