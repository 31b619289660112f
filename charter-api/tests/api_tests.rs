use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use charter_api::{app, AppState, AuthConfig};
use charter_core::availability::{offset_of, DateOption, MonthGrid};
use charter_core::inquiry::{CaptchaVerifier, CharterInquiry, FormRelay};
use charter_core::mail::{EmailMessage, Mailer};
use charter_core::CoreResult;
use charter_store::{ConfiguredLocations, MemoryStore};
use charter_ticket::{PrinterConfig, PrinterMode, PrinterService};
use chrono::{Days, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> CoreResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct StubCaptcha {
    accept: bool,
}

#[async_trait]
impl CaptchaVerifier for StubCaptcha {
    async fn verify(&self, _token: &str) -> CoreResult<bool> {
        Ok(self.accept)
    }
}

#[derive(Default)]
struct RecordingRelay {
    relayed: Mutex<Vec<String>>,
}

#[async_trait]
impl FormRelay for RecordingRelay {
    async fn relay(&self, inquiry: &CharterInquiry) -> CoreResult<()> {
        self.relayed.lock().unwrap().push(inquiry.summary());
        Ok(())
    }
}

struct Harness {
    app: Router,
    state: AppState,
    mailer: Arc<RecordingMailer>,
    relay: Arc<RecordingRelay>,
}

fn receipts_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("charter_api_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn harness(name: &str, captcha_ok: bool) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let relay = Arc::new(RecordingRelay::default());
    let dir = receipts_dir(name);
    let (sse_tx, _) = tokio::sync::broadcast::channel(16);

    let state = AppState {
        flight_repo: store.clone(),
        ticket_repo: store.clone(),
        location_repo: Arc::new(ConfiguredLocations::new(vec![charter_core::flight::Location {
            code: "UBN".to_string(),
            name: "Chinggis Khaan International".to_string(),
            city: "Ulaanbaatar".to_string(),
            country: "Mongolia".to_string(),
        }])),
        notification_repo: store,
        mailer: mailer.clone(),
        captcha: Arc::new(StubCaptcha { accept: captcha_ok }),
        form_relay: relay.clone(),
        printer: Arc::new(PrinterService::new(PrinterConfig {
            mode: PrinterMode::Cloud,
            device_path: dir.join("lp0"),
            receipts_dir: dir,
        })),
        sse_tx,
        auth: AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
            admin_username: "admin".to_string(),
            admin_password: "hunter2".to_string(),
        },
        default_currency: "USD".to_string(),
        ticket_list_limit: 50,
    };

    Harness { app: app(state.clone()), state, mailer, relay }
}

// ============================================================================
// Helpers
// ============================================================================

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn request(method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send_json(
        app,
        request("POST", "/v1/auth/login", Some(json!({"username": "admin", "password": "hunter2"})), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn days_ahead(n: u64) -> NaiveDate {
    Utc::now().date_naive() + Days::new(n)
}

async fn add_flight(
    app: &Router,
    token: &str,
    number: &str,
    route: (&str, &str),
    day: NaiveDate,
    price: i32,
    seats: i32,
) -> Value {
    let body = json!({
        "flight_number": number,
        "origin": route.0,
        "destination": route.1,
        "departure_time": format!("{}T09:00:00", day),
        "arrival_time": format!("{}T13:00:00", day),
        "price": price,
        "currency": "USD",
        "total_seats": seats,
    });
    let (status, flight) = send_json(app, request("POST", "/v1/admin/flights", Some(body), Some(token))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", flight);
    flight
}

fn ticket_body(outbound: &Value, back: Option<&Value>, passengers: usize) -> Value {
    let people: Vec<Value> = (0..passengers)
        .map(|i| {
            json!({
                "first_name": format!("Guest{}", i + 1),
                "last_name": "Doe",
                "birth_date": "1990-01-01",
                "nationality": "MN",
                "passport_number": format!("e{}123", i),
            })
        })
        .collect();
    json!({
        "trip_type": if back.is_some() { "roundtrip" } else { "oneway" },
        "outbound_flight_id": outbound["id"],
        "return_flight_id": back.map(|b| b["id"].clone()),
        "passengers": people,
        "contact": { "name": "Jane Doe", "email": "jane@example.com", "phone": "+976 9911 2233" },
        "payment_method": "card",
        "language": "en",
    })
}

async fn seats_left(h: &Harness, token: &str, flight: &Value) -> i64 {
    let uri = format!("/v1/admin/flights/{}", flight["id"].as_str().unwrap());
    let (_, body) = send_json(&h.app, request("GET", &uri, None, Some(token))).await;
    body["available_seats"].as_i64().unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_health_and_locations() {
    let h = harness("health", true);
    let (status, body) = send_json(&h.app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send_json(&h.app, request("GET", "/v1/locations", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["code"], "UBN");
}

#[tokio::test]
async fn test_admin_routes_require_valid_token() {
    let h = harness("auth", true);

    let (status, _) = send_json(&h.app, request("GET", "/v1/admin/flights", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&h.app, request("GET", "/v1/admin/flights", None, Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(
        &h.app,
        request("POST", "/v1/auth/login", Some(json!({"username": "admin", "password": "nope"})), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let token = admin_token(&h.app).await;
    let (status, body) = send_json(&h.app, request("GET", "/v1/admin/flights", None, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_admin_flight_crud() {
    let h = harness("crud", true);
    let token = admin_token(&h.app).await;
    let day = days_ahead(20);

    let flight = add_flight(&h.app, &token, "ch101", ("ubn", "hnd"), day, 30000, 50).await;
    assert_eq!(flight["flight_number"], "CH101");
    assert_eq!(flight["origin"], "UBN");
    assert_eq!(flight["available_seats"], 50);
    let uri = format!("/v1/admin/flights/{}", flight["id"].as_str().unwrap());

    let mut edit = flight.clone();
    edit["price"] = json!(35000);
    edit["status"] = json!("cancelled");
    let (status, updated) = send_json(&h.app, request("PUT", &uri, Some(edit), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 35000);
    assert_eq!(updated["status"], "cancelled");

    let (status, listed) =
        send_json(&h.app, request("GET", "/v1/admin/flights?from=UBN&to=HND", None, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&h.app, request("DELETE", &uri, None, Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.app, request("GET", &uri, None, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_flight_draft_is_rejected() {
    let h = harness("invalid_draft", true);
    let token = admin_token(&h.app).await;
    let day = days_ahead(5);
    let body = json!({
        "flight_number": "CH1",
        "origin": "UBN",
        "destination": "UBN",
        "departure_time": format!("{}T09:00:00", day),
        "arrival_time": format!("{}T13:00:00", day),
        "price": 100,
        "currency": "USD",
        "total_seats": 10,
    });
    let (status, body) = send_json(&h.app, request("POST", "/v1/admin/flights", Some(body), Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("differ"));
}

#[tokio::test]
async fn test_availability_and_calendar() {
    let h = harness("availability", true);
    let token = admin_token(&h.app).await;
    let day = days_ahead(30);
    add_flight(&h.app, &token, "CH101", ("UBN", "HND"), day, 30000, 50).await;
    add_flight(&h.app, &token, "CH103", ("UBN", "HND"), day, 28000, 1).await;

    let uri = format!(
        "/v1/flights/availability?from=UBN&to=HND&start={}&end={}&passengers=2",
        day - Days::new(1),
        day + Days::new(1)
    );
    let (status, body) = send_json(&h.app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let options: Vec<DateOption> = serde_json::from_value(body).unwrap();
    assert_eq!(options.len(), 3);
    assert!(!options[0].has_flight);
    // The cheaper flight cannot seat two.
    assert_eq!(options[1].price, Some(30000));
    assert!(options[1].has_any_flight);

    let today = Utc::now().date_naive();
    let uri = format!("/v1/flights/calendar?from=UBN&to=HND&offset={}", offset_of(today, day));
    let (status, body) = send_json(&h.app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let grid: MonthGrid = serde_json::from_value(body).unwrap();
    assert_eq!(grid.days.len() % 7, 0);
    let cell = grid.find_in_month(day).unwrap();
    assert_eq!(cell.price, Some(28000));

    let uri = format!("/v1/flights?from=UBN&to=HND&date={}&passengers=2", day);
    let (status, body) = send_json(&h.app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_availability_range_is_bounded() {
    let h = harness("range", true);
    let start = days_ahead(1);
    let uri = format!(
        "/v1/flights/availability?from=UBN&to=HND&start={}&end={}",
        start,
        start + Days::new(366)
    );
    let (status, _) = send_json(&h.app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/v1/flights/availability?from=UBN&to=HND&start={}&end={}",
        start,
        start - Days::new(1)
    );
    let (status, _) = send_json(&h.app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_passenger_count_is_bounded() {
    let h = harness("party_size", true);
    let token = admin_token(&h.app).await;
    let day = days_ahead(30);
    add_flight(&h.app, &token, "CH101", ("UBN", "HND"), day, 30000, 50).await;

    for passengers in ["0", "101", "3000000000"] {
        let uri = format!(
            "/v1/flights/availability?from=UBN&to=HND&start={}&end={}&passengers={}",
            day, day, passengers
        );
        let (status, _) = send_json(&h.app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "availability with {}", passengers);

        let uri = format!("/v1/flights?from=UBN&to=HND&date={}&passengers={}", day, passengers);
        let (status, _) = send_json(&h.app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "flights with {}", passengers);
    }

    let uri = format!("/v1/flights?from=UBN&to=HND&date={}&passengers=51", day);
    let (status, body) = send_json(&h.app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_round_trip_ticket_flow() {
    let h = harness("ticket_flow", true);
    let token = admin_token(&h.app).await;
    let outbound = add_flight(&h.app, &token, "CH101", ("UBN", "HND"), days_ahead(10), 30000, 10).await;
    let back = add_flight(&h.app, &token, "CH102", ("HND", "UBN"), days_ahead(20), 32000, 10).await;
    let mut events = h.state.sse_tx.subscribe();

    let (status, created) = send_json(
        &h.app,
        request("POST", "/v1/tickets", Some(ticket_body(&outbound, Some(&back), 2)), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["total_price"], (30000 + 32000) * 2);
    assert_eq!(created["total_display"], "1,240.00 USD");
    assert_eq!(created["print"]["outcome"], "saved");
    let saved = created["print"]["path"].as_str().unwrap();
    assert!(std::path::Path::new(saved).exists());

    let reference = created["reference"].as_str().unwrap().to_string();
    assert_eq!(seats_left(&h, &token, &outbound).await, 8);
    assert_eq!(seats_left(&h, &token, &back).await, 8);

    let event = events.try_recv().unwrap();
    assert_eq!(event.kind, "new_booking");
    assert_eq!(event.reference.as_deref(), Some(reference.as_str()));

    let (status, ticket) =
        send_json(&h.app, request("GET", &format!("/v1/tickets/{}", reference.to_lowercase()), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["return_leg"]["flight_number"], "CH102");
    assert_eq!(ticket["passengers"][0]["passport_number"], "E0123");

    let (status, html) =
        send(&h.app, request("GET", &format!("/v1/tickets/{}/receipt?lang=es", reference), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains(&reference));
    assert!(html.contains("Vuelo de regreso"));

    let (status, _) =
        send(&h.app, request("GET", &format!("/v1/tickets/{}/receipt?lang=fr", reference), None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, pdf) =
        send(&h.app, request("GET", &format!("/v1/tickets/{}/receipt.pdf", reference), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(pdf.starts_with(b"%PDF-"));

    // The confirmation email is sent off the request path.
    let mut attempts = 0;
    while h.mailer.sent.lock().unwrap().is_empty() && attempts < 100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        attempts += 1;
    }
    let sent = h.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email.expose(), "jane@example.com");
    assert!(sent[0].subject.contains(&reference));

    let (status, listed) = send_json(&h.app, request("GET", "/v1/admin/tickets", None, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["reference"], reference);

    let (status, printed) = send_json(
        &h.app,
        request("POST", &format!("/v1/admin/tickets/{}/print", reference), None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(printed["outcome"], "saved");

    let (status, notifications) =
        send_json(&h.app, request("GET", "/v1/admin/notifications", None, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notifications[0]["kind"], "new_booking");
}

#[tokio::test]
async fn test_failed_return_leg_releases_outbound_seats() {
    let h = harness("release", true);
    let token = admin_token(&h.app).await;
    let outbound = add_flight(&h.app, &token, "CH101", ("UBN", "HND"), days_ahead(10), 30000, 5).await;
    let back = add_flight(&h.app, &token, "CH102", ("HND", "UBN"), days_ahead(12), 30000, 1).await;

    let (status, body) = send_json(
        &h.app,
        request("POST", "/v1/tickets", Some(ticket_body(&outbound, Some(&back), 2)), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    assert_eq!(seats_left(&h, &token, &outbound).await, 5);
    assert_eq!(seats_left(&h, &token, &back).await, 1);

    let (_, listed) = send_json(&h.app, request("GET", "/v1/admin/tickets", None, Some(&token))).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_return_before_departure_is_rejected() {
    let h = harness("order", true);
    let token = admin_token(&h.app).await;
    let outbound = add_flight(&h.app, &token, "CH101", ("UBN", "HND"), days_ahead(10), 30000, 5).await;
    let back = add_flight(&h.app, &token, "CH102", ("HND", "UBN"), days_ahead(8), 30000, 5).await;

    let (status, _) = send_json(
        &h.app,
        request("POST", "/v1/tickets", Some(ticket_body(&outbound, Some(&back), 1)), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(seats_left(&h, &token, &outbound).await, 5);
}

#[tokio::test]
async fn test_ticket_total_out_of_range_is_rejected() {
    let h = harness("overflow", true);
    let token = admin_token(&h.app).await;
    let outbound = add_flight(&h.app, &token, "CH101", ("UBN", "HND"), days_ahead(10), 150_000_000, 20).await;

    let (status, body) = send_json(
        &h.app,
        request("POST", "/v1/tickets", Some(ticket_body(&outbound, None, 15)), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["error"], "Total price out of range");
    assert_eq!(seats_left(&h, &token, &outbound).await, 20);

    // The server keeps answering after the rejected booking.
    let (status, _) = send_json(
        &h.app,
        request("POST", "/v1/tickets", Some(ticket_body(&outbound, None, 1)), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(seats_left(&h, &token, &outbound).await, 19);
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let h = harness("unknown", true);
    let (status, _) = send_json(&h.app, request("GET", "/v1/tickets/CH000000", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json(&h.app, request("GET", "/v1/tickets/not-a-ref", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn inquiry_body() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "phone": "+976 9911 2233",
        "origin": "UBN",
        "destination": "ICN",
        "departure_date": days_ahead(40).to_string(),
        "passengers": 14,
        "message": "Company retreat",
        "captcha_token": "token-from-widget",
    })
}

#[tokio::test]
async fn test_inquiry_rejected_when_captcha_fails() {
    let h = harness("captcha_fail", false);
    let (status, body) = send_json(&h.app, request("POST", "/v1/inquiries", Some(inquiry_body()), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CAPTCHA verification failed");
    assert!(h.relay.relayed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_inquiry_relayed_and_notified() {
    let h = harness("inquiry", true);
    let token = admin_token(&h.app).await;

    let (status, body) = send_json(&h.app, request("POST", "/v1/inquiries", Some(inquiry_body()), None)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "received");
    assert_eq!(h.relay.relayed.lock().unwrap().len(), 1);

    let (_, unread) =
        send_json(&h.app, request("GET", "/v1/admin/notifications?unread=true", None, Some(&token))).await;
    assert_eq!(unread[0]["kind"], "charter_inquiry");
    let id = unread[0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &h.app,
        request("POST", &format!("/v1/admin/notifications/{}/ack", id), None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, unread) =
        send_json(&h.app, request("GET", "/v1/admin/notifications?unread=true", None, Some(&token))).await;
    assert_eq!(unread, json!([]));
}

#[tokio::test]
async fn test_printer_status_and_event_stream() {
    let h = harness("printer", true);
    let token = admin_token(&h.app).await;

    let (status, body) = send_json(&h.app, request("GET", "/v1/admin/printer/status", None, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "cloud");
    assert_eq!(body["connected"], false);

    let res = h
        .app
        .clone()
        .oneshot(request("GET", "/v1/admin/notifications/stream", None, Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/event-stream");
}
