use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::TimeDelta;
use serde_json::{json, Value};
use snowtrip_tests::Harness;
use tower::ServiceExt;

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    read(app.clone().oneshot(request).await.unwrap()).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    read(app.clone().oneshot(request).await.unwrap()).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn health_reports_metrics_and_catalog() {
    let app = Harness::default().router();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["metrics"]["turns_total"].is_number());
    assert_eq!(body["catalog"]["source"], "static");
}

#[tokio::test]
async fn dialogue_turns_share_a_session() {
    let harness = Harness::default();
    let app = harness.router();

    let (status, first) = post(&app, "/v1/dialogue/turn", json!({ "text": "野澤 3月20-25日" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["state"], "confirming_trip");
    assert_eq!(first["requires_confirmation"], true);
    assert_eq!(first["trip"]["resort"]["id"], "nozawa");
    assert_eq!(first["trip"]["duration_days"], 6);
    let session_id = first["session_id"].as_str().unwrap().to_string();

    let (_, second) = post(
        &app,
        "/v1/dialogue/turn",
        json!({ "session_id": session_id, "text": "確定" }),
    )
    .await;
    assert_eq!(second["state"], "trip_created");
    assert_eq!(second["session_id"], session_id.as_str());
    assert!(second["trip"]["resort"].is_null());
    assert_eq!(harness.store.len(), 1);

    let (_, trips) = get(&app, "/v1/trips").await;
    assert_eq!(trips["trips"][0]["resort_id"], "nozawa");
    assert_eq!(trips["trips"][0]["start_date"], "2026-03-20");
}

#[tokio::test]
async fn ambiguous_turn_returns_suggestion_chips() {
    let app = Harness::default().router();
    let (_, body) = post(&app, "/v1/dialogue/turn", json!({ "text": "白馬" })).await;
    assert_eq!(body["state"], "awaiting_resort");
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 4);
    assert_eq!(body["last_error"]["kind"], "ambiguous_match");
    assert_eq!(body["missing"], json!(["resort", "start_date", "duration"]));
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let app = Harness::default().router();
    let (status, body) = post(&app, "/v1/dialogue/turn", json!({ "text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty_text");
}

#[tokio::test]
async fn resort_match_maps_errors_to_statuses() {
    let app = Harness::default().router();

    let (status, body) = post(&app, "/v1/resorts/match", json!({ "query": "Niseko" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resort"]["id"], "niseko");
    assert_eq!(body["resort"]["confidence"], 1.0);

    let (status, body) = post(&app, "/v1/resorts/match", json!({ "query": "hakuba" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "ambiguous_match");

    let (status, body) = post(&app, "/v1/resorts/match", json!({ "query": "qqqqqq" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "entity_not_found");
}

#[tokio::test]
async fn intent_and_dates_endpoints() {
    let app = Harness::default().router();

    let (_, intent) = post(&app, "/v1/intent", json!({ "text": "查看我的行程" })).await;
    assert_eq!(intent["action"], "VIEW_TRIPS");

    let (_, dates) = post(&app, "/v1/dates", json!({ "text": "12月11到20日" })).await;
    assert_eq!(dates["range"]["start"]["date"], "2025-12-11");
    assert_eq!(dates["range"]["end"]["date"], "2025-12-20");

    let (_, dates) = post(&app, "/v1/dates", json!({ "text": "12/20 5天" })).await;
    assert_eq!(dates["duration_days"], 5);
}

#[tokio::test]
async fn delete_unknown_trip_is_not_found() {
    let app = Harness::default().router();
    let (status, body) = post(&app, "/v1/trips/delete", json!({ "trip_id": "nope" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "trip_not_found");
}

#[tokio::test]
async fn idle_sessions_expire() {
    let harness = Harness::default();
    let app = harness.router();

    let (_, first) = post(&app, "/v1/dialogue/turn", json!({ "text": "野澤 3月20-25日" })).await;
    let session_id = first["session_id"].as_str().unwrap().to_string();
    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["sessions"], 1);

    harness.clock.advance(TimeDelta::hours(25));
    let (status, second) = post(
        &app,
        "/v1/dialogue/turn",
        json!({ "session_id": session_id, "text": "確定" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(second["state"], "trip_created");
    assert!(second["trip"]["resort"].is_null());
    assert!(harness.store.is_empty());

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["sessions"], 1);
}
