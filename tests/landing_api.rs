use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use zets_landing::api::collaborators::{Directions, Geocoder, RecordStore, SurveyRecord};
use zets_landing::error::{ProviderError, StoreError};
use zets_landing::flows::view_orchestrator::ViewDelays;
use zets_landing::models::landing_models::{Coordinate, Route, TravelMode};
use zets_landing::repositories::landing_sessions::LandingSessions;
use zets_landing::{build_router, AppState};

const DELHI: Coordinate = Coordinate { lat: 28.6139, lng: 77.2090 };
const CONNAUGHT_PLACE: Coordinate = Coordinate { lat: 28.6315, lng: 77.2167 };
const GURGAON: Coordinate = Coordinate { lat: 28.4595, lng: 77.0266 };

struct FakeGeocoder {
    known: HashMap<&'static str, Coordinate>,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        self.known.get(address).copied().ok_or(ProviderError::NoMatch)
    }
}

#[derive(Default)]
struct RecordingDirections {
    calls: Mutex<Vec<(Coordinate, Coordinate, TravelMode)>>,
}

#[async_trait]
impl Directions for RecordingDirections {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route, ProviderError> {
        self.calls.lock().unwrap().push((origin, destination, mode));
        Ok(Route {
            origin,
            destination,
            mode,
            encoded_polyline: "_p~iF~ps|U".to_string(),
            path: vec![origin, destination],
            distance: Some("27.4 km".to_string()),
            duration: Some("52 mins".to_string()),
        })
    }
}

/// Fails the first `failures` inserts with a network error, then stores rows.
struct FlakyStore {
    failures: AtomicUsize,
    rows: Mutex<Vec<(String, SurveyRecord)>>,
}

impl FlakyStore {
    fn failing(times: usize) -> Self {
        Self {
            failures: AtomicUsize::new(times),
            rows: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn insert(&self, table: &str, record: &SurveyRecord) -> Result<(), StoreError> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Rejected {
                status: 503,
                message: "network failure".to_string(),
            });
        }
        self.rows.lock().unwrap().push((table.to_string(), record.clone()));
        Ok(())
    }
}

/// Never answers, like a record store behind a hung connection.
struct SilentStore;

#[async_trait]
impl RecordStore for SilentStore {
    async fn insert(&self, _table: &str, _record: &SurveyRecord) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    app: axum::Router,
    directions: Arc<RecordingDirections>,
    store: Arc<FlakyStore>,
}

fn app(directions: Arc<RecordingDirections>, record_store: Arc<dyn RecordStore>) -> axum::Router {
    let geocoder = FakeGeocoder {
        known: HashMap::from([("Connaught Place, Delhi", CONNAUGHT_PLACE), ("Gurgaon", GURGAON)]),
    };
    let state = Arc::new(AppState {
        sessions: LandingSessions::new(ViewDelays::default(), DELHI),
        geocoder: Arc::new(geocoder),
        directions,
        record_store,
        survey_table: "survey_responses".to_string(),
        submit_timeout: SUBMIT_TIMEOUT,
    });
    build_router(state, "static", "http://localhost:8080")
}

fn harness(store_failures: usize) -> Harness {
    let directions = Arc::new(RecordingDirections::default());
    let store = Arc::new(FlakyStore::failing(store_failures));
    Harness {
        app: app(directions.clone(), store.clone()),
        directions,
        store,
    }
}

async fn send(app: &axum::Router, method: &str, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match payload {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(payload.to_string())),
        None => builder.body(axum::body::Body::empty()),
    }
    .expect("request build should succeed");

    let resp = app
        .clone()
        .oneshot(request)
        .await
        .expect("app should handle request");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("response body should be readable");
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, value)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    tokio::task::yield_now().await;
}

async fn new_session(app: &axum::Router) -> String {
    let (status, body) = send(app, "POST", "/api/landing/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["view"], "splash");
    body["session_id"].as_str().unwrap().to_string()
}

async fn to_survey(app: &axum::Router, id: &str) {
    advance(3_100).await;
    send(app, "PUT", &format!("/api/landing/sessions/{id}/pickup"), Some(json!({"text": "Connaught Place, Delhi"}))).await;
    send(app, "PUT", &format!("/api/landing/sessions/{id}/dropoff"), Some(json!({"text": "Gurgaon"}))).await;
    let (status, body) = send(app, "POST", &format!("/api/landing/sessions/{id}/book"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "thank_you");
    let (status, body) = send(app, "POST", &format!("/api/landing/sessions/{id}/continue"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "survey");
}

async fn answer(app: &axum::Router, id: &str, value: &str) -> (StatusCode, Value) {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/landing/sessions/{id}/survey/change"),
        Some(json!({"value": value})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    send(app, "POST", &format!("/api/landing/sessions/{id}/survey/next"), None).await
}

async fn fill_survey(app: &axum::Router, id: &str) {
    for value in ["Asha", "asha@example.in", "", "Delhi", "Metro", "", "Maybe"] {
        let (status, body) = answer(app, id, value).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
}

#[tokio::test]
async fn health_and_steps() {
    let h = harness(0);
    let (status, body) = send(&h.app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));

    let (status, body) = send(&h.app, "GET", "/api/survey/steps", None).await;
    assert_eq!(status, StatusCode::OK);
    let steps = body["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 8);
    assert_eq!(steps[2]["kind"], "phone");
    assert_eq!(steps[2]["constraints"]["max_length"], 10);
    assert_eq!(steps[6]["options"].as_array().unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn booking_widget_resolves_addresses_and_route() {
    let h = harness(0);
    let id = new_session(&h.app).await;
    advance(3_100).await;

    let (_, body) = send(&h.app, "GET", &format!("/api/landing/sessions/{id}"), None).await;
    assert_eq!(body["view"], "booking_widget");
    assert_eq!(body["booking"]["zoom"], 11);
    assert_eq!(body["booking"]["center"]["lat"], DELHI.lat);

    let (status, body) = send(
        &h.app,
        "PUT",
        &format!("/api/landing/sessions/{id}/pickup"),
        Some(json!({"text": "Connaught Place, Delhi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["center"]["lat"], CONNAUGHT_PLACE.lat);
    assert_eq!(body["booking"]["zoom"], 13);
    assert!(body["booking"]["route"].is_null());

    let (_, body) = send(
        &h.app,
        "PUT",
        &format!("/api/landing/sessions/{id}/dropoff"),
        Some(json!({"text": "Gurgaon"})),
    )
    .await;
    assert_eq!(body["booking"]["center"]["lat"], CONNAUGHT_PLACE.lat);
    assert_eq!(body["booking"]["route"]["distance"], "27.4 km");
    assert_eq!(body["booking"]["markers"].as_array().unwrap().len(), 2);
    assert_eq!(
        h.directions.calls.lock().unwrap().as_slice(),
        &[(CONNAUGHT_PLACE, GURGAON, TravelMode::Driving)]
    );

    let (_, body) = send(
        &h.app,
        "PUT",
        &format!("/api/landing/sessions/{id}/dropoff"),
        Some(json!({"text": ""})),
    )
    .await;
    assert!(body["booking"]["route"].is_null());
    assert!(body["booking"]["dropoff_coordinate"].is_null());
    assert_eq!(body["booking"]["can_book"], false);

    let (status, _) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/book"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(start_paused = true)]
async fn unknown_address_leaves_preview_unresolved() {
    let h = harness(0);
    let id = new_session(&h.app).await;
    advance(3_100).await;

    let (status, body) = send(
        &h.app,
        "PUT",
        &format!("/api/landing/sessions/{id}/pickup"),
        Some(json!({"text": "Atlantis"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["booking"]["pickup_coordinate"].is_null());
    assert_eq!(body["booking"]["pickup"], "Atlantis");
    assert_eq!(body["booking"]["center"]["lng"], DELHI.lng);
}

#[tokio::test(start_paused = true)]
async fn booking_is_refused_during_splash() {
    let h = harness(0);
    let id = new_session(&h.app).await;
    send(&h.app, "PUT", &format!("/api/landing/sessions/{id}/pickup"), Some(json!({"text": "Gurgaon"}))).await;
    send(&h.app, "PUT", &format!("/api/landing/sessions/{id}/dropoff"), Some(json!({"text": "Gurgaon"}))).await;

    let (status, body) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/book"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["view"], "splash");
}

#[tokio::test(start_paused = true)]
async fn thank_you_gives_way_to_survey_after_four_seconds() {
    let h = harness(0);
    let id = new_session(&h.app).await;
    advance(3_100).await;
    send(&h.app, "PUT", &format!("/api/landing/sessions/{id}/pickup"), Some(json!({"text": "Connaught Place, Delhi"}))).await;
    send(&h.app, "PUT", &format!("/api/landing/sessions/{id}/dropoff"), Some(json!({"text": "Gurgaon"}))).await;
    let (_, body) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/book"), None).await;
    let remaining = body["auto_advance_in_ms"].as_u64().unwrap();
    assert!(remaining > 3_900 && remaining <= 4_000);

    advance(4_100).await;
    let (_, body) = send(&h.app, "GET", &format!("/api/landing/sessions/{id}"), None).await;
    assert_eq!(body["view"], "survey");
}

#[tokio::test(start_paused = true)]
async fn survey_is_refused_before_it_shows() {
    let h = harness(0);
    let id = new_session(&h.app).await;
    let (status, body) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/survey/next"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["view"], "splash");
}

#[tokio::test(start_paused = true)]
async fn survey_validates_and_survives_a_failed_submission() {
    let h = harness(1);
    let id = new_session(&h.app).await;
    to_survey(&h.app, &id).await;

    let (status, body) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/survey/next"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "required");
    assert_eq!(body["snapshot"]["survey"]["error"]["message"], "This field is required");

    let (status, _) = answer(&h.app, &id, "Asha").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = answer(&h.app, &id, "a@b").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid-email");
    let (status, _) = answer(&h.app, &id, "asha@example.in").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = answer(&h.app, &id, "98 765 4321").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid-phone");
    assert_eq!(body["snapshot"]["survey"]["value"], "987654321");
    let (status, _) = answer(&h.app, &id, "98765 43210").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(answer(&h.app, &id, "Delhi").await.0, StatusCode::OK);
    assert_eq!(answer(&h.app, &id, "Metro").await.0, StatusCode::OK);
    assert_eq!(answer(&h.app, &id, "").await.0, StatusCode::OK);

    let (status, body) = answer(&h.app, &id, "").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "required");
    let (status, body) = answer(&h.app, &id, "Definitely!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["survey"]["step_index"], 7);
    assert_eq!(body["survey"]["primary_action"], "submit");

    let (status, body) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/survey/submit"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "submission-failed");
    assert_eq!(body["error"], "Submission failed. Please try again later.");
    assert_eq!(body["snapshot"]["survey"]["phase"], "in_progress");
    assert_eq!(body["snapshot"]["survey"]["step_index"], 7);
    assert!(h.store.rows.lock().unwrap().is_empty());

    let (status, body) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/survey/submit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["survey"]["phase"], "submitted");
    assert_eq!(body["survey"]["confirmation"]["headline"], "Thank you for your feedback!");

    let rows = h.store.rows.lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    let (table, record) = &rows[0];
    assert_eq!(table, "survey_responses");
    assert_eq!(record.get("email").map(String::as_str), Some("asha@example.in"));
    assert_eq!(record.get("phone").map(String::as_str), Some("9876543210"));
    assert_eq!(record.get("intent").map(String::as_str), Some("Definitely!"));
    assert!(record.contains_key("submission_id"));

    let (status, body) = send(&h.app, "POST", &format!("/api/landing/sessions/{id}/survey/submit"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already-submitted");
}

#[tokio::test(start_paused = true)]
async fn deleted_session_is_gone() {
    let h = harness(0);
    let id = new_session(&h.app).await;

    let (status, _) = send(&h.app, "DELETE", &format!("/api/landing/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&h.app, "GET", &format!("/api/landing/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Landing session not found");

    let (status, _) = send(&h.app, "DELETE", &format!("/api/landing/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn abandoned_submit_still_reopens_the_form() {
    let app = app(Arc::new(RecordingDirections::default()), Arc::new(SilentStore));
    let id = new_session(&app).await;
    to_survey(&app, &id).await;
    fill_survey(&app, &id).await;

    // the client gives up on the request while the insert is still pending
    let submit_uri = format!("/api/landing/sessions/{id}/survey/submit");
    let submit = send(&app, "POST", &submit_uri, None);
    assert!(tokio::time::timeout(Duration::from_secs(1), submit).await.is_err());

    let change_uri = format!("/api/landing/sessions/{id}/survey/change");
    let (status, body) = send(&app, "POST", &change_uri, Some(json!({"value": "x"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "submission-in-flight");

    advance(SUBMIT_TIMEOUT.as_millis() as u64).await;

    let (_, body) = send(&app, "GET", &format!("/api/landing/sessions/{id}"), None).await;
    assert_eq!(body["survey"]["phase"], "in_progress");
    assert_eq!(body["survey"]["step_index"], 7);
    assert_eq!(body["survey"]["error"]["code"], "submission-failed");

    let (status, body) = send(&app, "POST", &change_uri, Some(json!({"value": "Still keen"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["survey"]["value"], "Still keen");
    let (status, _) = send(&app, "POST", &format!("/api/landing/sessions/{id}/survey/back"), None).await;
    assert_eq!(status, StatusCode::OK);
}
