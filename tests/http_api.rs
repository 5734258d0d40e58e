//! Router-level tests.
//!
//! Requests rejected before any query runs use a lazy pool and need no
//! database. The rest are ignored by default and run against `DATABASE_URL`:
//! DATABASE_URL=postgres://... cargo test -- --ignored

use axum::body::{to_bytes, Body};
use chrono::{DateTime, TimeZone, Utc};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use event_manager::config::Config;
use event_manager::db::{create_lazy_pool, create_pool, run_migrations};
use event_manager::routes::create_routes;
use event_manager::state::AppState;

fn app() -> Router {
    let config = Config::from_lookup(|_| None);
    let pool = create_lazy_pool(&config).expect("lazy pool");
    create_routes(AppState::new(pool), &config)
}

async fn db_app() -> Router {
    let config = Config::from_env();
    let pool = create_pool(&config).await.expect("pool creation failed");
    run_migrations(&pool).await.expect("migrations failed");
    create_routes(AppState::new(pool), &config)
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    send_to(&app(), request).await
}

async fn send_to(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn assert_validation_error(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn health_check_returns_envelope_and_security_headers() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["service"], "event-manager");
}

#[tokio::test]
async fn create_event_rejects_inverted_window() {
    let (status, body) = send(json_request(
        Method::POST,
        "/events",
        json!({
            "name": "Conf",
            "location": "Berlin",
            "start_time": "2099-01-01T17:00:00Z",
            "end_time": "2099-01-01T09:00:00Z",
            "max_capacity": 100
        }),
    ))
    .await;

    assert_validation_error(status, &body);
    assert_eq!(
        body["error"]["details"]["__all__"],
        json!(["Event start time must be before end time"])
    );
}

#[tokio::test]
async fn create_event_rejects_start_in_the_past() {
    let (status, body) = send(json_request(
        Method::POST,
        "/events",
        json!({
            "name": "Conf",
            "location": "Berlin",
            "start_time": "2001-01-01T09:00:00Z",
            "end_time": "2001-01-01T17:00:00Z",
            "max_capacity": 100
        }),
    ))
    .await;

    assert_validation_error(status, &body);
    assert_eq!(
        body["error"]["message"],
        "Event start time cannot be in the past"
    );
}

#[tokio::test]
async fn create_event_rejects_non_positive_capacity() {
    let (status, body) = send(json_request(
        Method::POST,
        "/events",
        json!({
            "name": "Conf",
            "location": "Berlin",
            "start_time": "2099-01-01T09:00:00Z",
            "end_time": "2099-01-01T17:00:00Z",
            "max_capacity": 0
        }),
    ))
    .await;

    assert_validation_error(status, &body);
    assert!(body["error"]["details"]["max_capacity"].is_array());
}

#[tokio::test]
async fn create_event_rejects_malformed_json() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let (status, body) = send(request).await;
    assert_validation_error(status, &body);
}

#[tokio::test]
async fn malformed_event_id_is_rejected() {
    let (status, body) = send(get("/events/not-a-uuid")).await;
    assert_validation_error(status, &body);
    assert_eq!(
        body["error"]["message"],
        "'not-a-uuid' is not a valid event id"
    );

    let (status, body) = send(get("/events/42/attendees")).await;
    assert_validation_error(status, &body);
}

#[tokio::test]
async fn unknown_timezone_is_rejected() {
    let uri = format!("/events/{}?target_timezone=Mars/Olympus", Uuid::new_v4());
    let (status, body) = send(get(&uri)).await;

    assert_validation_error(status, &body);
    assert_eq!(body["error"]["message"], "Unknown timezone: Mars/Olympus");
}

#[tokio::test]
async fn attendee_pagination_bounds_are_enforced() {
    let id = Uuid::new_v4();

    let (status, body) = send(get(&format!("/events/{}/attendees?limit=0", id))).await;
    assert_validation_error(status, &body);

    let (status, body) = send(get(&format!("/events/{}/attendees?limit=201", id))).await;
    assert_validation_error(status, &body);

    let (status, body) = send(get(&format!("/events/{}/attendees?skip=-1", id))).await;
    assert_validation_error(status, &body);
}

#[tokio::test]
async fn event_list_rejects_bad_query() {
    let (status, body) = send(get("/events?limit=500")).await;
    assert_validation_error(status, &body);

    let (status, body) = send(get("/events?starts_after=yesterday")).await;
    assert_validation_error(status, &body);
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let uri = format!("/events/{}/register", Uuid::new_v4());
    let (status, body) = send(json_request(
        Method::POST,
        &uri,
        json!({ "name": "Ada", "email": "ada-at-example" }),
    ))
    .await;

    assert_validation_error(status, &body);
    assert_eq!(
        body["error"]["details"]["email"],
        json!(["Invalid email format"])
    );
}

#[tokio::test]
async fn partial_update_rejects_blank_name() {
    let uri = format!("/events/{}", Uuid::new_v4());
    let (status, body) = send(json_request(Method::PATCH, &uri, json!({ "name": "   " }))).await;

    assert_validation_error(status, &body);
    assert!(body["error"]["details"]["name"].is_array());
}

fn conf_body(capacity: i32) -> Value {
    json!({
        "name": format!("Conf {}", Uuid::new_v4()),
        "location": "Berlin",
        "start_time": "2099-01-01T09:00:00Z",
        "end_time": "2099-01-01T17:00:00Z",
        "max_capacity": capacity
    })
}

async fn create_event(app: &Router, capacity: i32) -> Value {
    let request = json_request(Method::POST, "/events", conf_body(capacity));
    let (status, body) = send_to(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["current_attendees"], 0);
    body["data"].clone()
}

async fn delete_event(app: &Router, id: &str) {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/events/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_to(app, request).await;
    assert_eq!(status, StatusCode::OK);
}

fn instant(value: &Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().expect("timestamp string"))
        .expect("rfc3339 timestamp")
        .with_timezone(&Utc)
}

#[tokio::test]
#[ignore = "requires database"]
async fn attendees_of_missing_event_are_not_found() {
    let app = db_app().await;
    let id = Uuid::new_v4();

    for uri in [
        format!("/events/{}/attendees", id),
        format!("/events/{}/attendees/count", id),
    ] {
        let (status, body) = send_to(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}: {}", uri, body);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn registration_returns_created_then_conflicts() {
    let app = db_app().await;
    let event = create_event(&app, 1).await;
    let id = event["id"].as_str().unwrap();
    let uri = format!("/events/{}/register", id);

    let (status, body) = send_to(
        &app,
        json_request(Method::POST, &uri, json!({ "name": "Ada", "email": "Ada@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["data"]["event_id"], id);
    assert_eq!(body["data"]["email"], "ada@example.com");

    let (status, body) = send_to(
        &app,
        json_request(Method::POST, &uri, json!({ "name": "Ada", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send_to(
        &app,
        json_request(Method::POST, &uri, json!({ "name": "Grace", "email": "grace@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"]["message"],
        "Event has reached its maximum capacity of 1"
    );

    let (status, body) = send_to(&app, get(&format!("/events/{}/attendees/count", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    delete_event(&app, id).await;

    let (status, _) = send_to(&app, get(&format!("/events/{}/attendees", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn get_event_in_target_timezone() {
    let app = db_app().await;
    let event = create_event(&app, 10).await;
    let id = event["id"].as_str().unwrap();

    let (status, body) = send_to(
        &app,
        get(&format!("/events/{}?target_timezone=Asia/Kolkata", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["data"]["start_time"], "2099-01-01T14:30:00+05:30");
    assert_eq!(body["data"]["end_time"], "2099-01-01T22:30:00+05:30");

    let (status, body) = send_to(&app, get(&format!("/events/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        instant(&body["data"]["start_time"]),
        Utc.with_ymd_and_hms(2099, 1, 1, 9, 0, 0).unwrap()
    );

    delete_event(&app, id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn partial_update_checks_window_against_stored_event() {
    let app = db_app().await;
    let event = create_event(&app, 10).await;
    let id = event["id"].as_str().unwrap();
    let uri = format!("/events/{}", id);

    let (status, body) = send_to(
        &app,
        json_request(Method::PATCH, &uri, json!({ "end_time": "2099-01-01T08:00:00Z" })),
    )
    .await;
    assert_validation_error(status, &body);

    let (status, body) = send_to(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        instant(&body["data"]["end_time"]),
        Utc.with_ymd_and_hms(2099, 1, 1, 17, 0, 0).unwrap()
    );

    delete_event(&app, id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn empty_patch_returns_event_with_attendee_count() {
    let app = db_app().await;
    let event = create_event(&app, 10).await;
    let id = event["id"].as_str().unwrap();

    let (status, _) = send_to(
        &app,
        json_request(
            Method::POST,
            &format!("/events/{}/register", id),
            json!({ "name": "Ada", "email": "ada@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_to(
        &app,
        json_request(Method::PATCH, &format!("/events/{}", id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);

    let data = &body["data"];
    assert_eq!(data["name"], event["name"]);
    assert_eq!(data["location"], event["location"]);
    assert_eq!(data["max_capacity"], event["max_capacity"]);
    assert_eq!(instant(&data["start_time"]), instant(&event["start_time"]));
    assert_eq!(instant(&data["end_time"]), instant(&event["end_time"]));
    assert_eq!(instant(&data["updated_at"]), instant(&event["updated_at"]));
    assert_eq!(data["current_attendees"], 1);

    delete_event(&app, id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn put_replaces_every_field() {
    let app = db_app().await;
    let event = create_event(&app, 10).await;
    let id = event["id"].as_str().unwrap();

    let (status, body) = send_to(
        &app,
        json_request(
            Method::PUT,
            &format!("/events/{}", id),
            json!({
                "name": "Renamed",
                "location": "Lisbon",
                "start_time": "2099-02-01T10:00:00Z",
                "end_time": "2099-02-02T10:00:00Z",
                "max_capacity": 50
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);

    let data = &body["data"];
    assert_eq!(data["id"], id);
    assert_eq!(data["name"], "Renamed");
    assert_eq!(data["location"], "Lisbon");
    assert_eq!(data["max_capacity"], 50);
    assert_eq!(
        instant(&data["start_time"]),
        Utc.with_ymd_and_hms(2099, 2, 1, 10, 0, 0).unwrap()
    );
    assert_eq!(
        instant(&data["end_time"]),
        Utc.with_ymd_and_hms(2099, 2, 2, 10, 0, 0).unwrap()
    );
    assert_eq!(data["current_attendees"], 0);

    delete_event(&app, id).await;
}
