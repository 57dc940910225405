use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json as AxumJson,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::flows::address_resolution;
use crate::flows::landing_session::LandingSnapshot;
use crate::flows::route_preview;
use crate::handlers::landing_dtos::AddressRequest;
use crate::models::landing_models::Endpoint;
use crate::repositories::landing_sessions::SharedSession;
use crate::AppState;

pub type ApiError = (StatusCode, AxumJson<Value>);

pub(crate) fn find_session(state: &AppState, session_id: Uuid) -> Result<SharedSession, ApiError> {
    state.sessions.get(session_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            AxumJson(json!({"error": "Landing session not found"})),
        )
    })
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, AxumJson<LandingSnapshot>) {
    let session = state.sessions.create();
    let snapshot = session.lock().await.snapshot();
    (StatusCode::CREATED, AxumJson(snapshot))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<AxumJson<LandingSnapshot>, ApiError> {
    let session = find_session(&state, session_id)?;
    let mut session = session.lock().await;
    session.touch();
    Ok(AxumJson(session.snapshot()))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            AxumJson(json!({"error": "Landing session not found"})),
        ))
    }
}

pub async fn update_pickup(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AxumJson(input): AxumJson<AddressRequest>,
) -> Result<AxumJson<LandingSnapshot>, ApiError> {
    update_address(&state, session_id, Endpoint::Pickup, &input.text).await
}

pub async fn update_dropoff(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AxumJson(input): AxumJson<AddressRequest>,
) -> Result<AxumJson<LandingSnapshot>, ApiError> {
    update_address(&state, session_id, Endpoint::Dropoff, &input.text).await
}

// Provider calls run without holding the session lock; results for text that
// changed meanwhile are dropped by the session itself.
async fn update_address(
    state: &AppState,
    session_id: Uuid,
    endpoint: Endpoint,
    text: &str,
) -> Result<AxumJson<LandingSnapshot>, ApiError> {
    let session = find_session(state, session_id)?;
    let geocode = {
        let mut session = session.lock().await;
        session.touch();
        session.set_address(endpoint, text)
    };

    if let Some(request) = geocode {
        tracing::debug!("Resolving {:?} for session {}", endpoint, session_id);
        let coordinate = address_resolution::resolve(state.geocoder.as_ref(), &request.address).await;
        let route_request = session.lock().await.apply_geocode(&request, coordinate);

        if let Some(route_request) = route_request {
            let result = route_preview::fetch(state.directions.as_ref(), &route_request).await;
            session.lock().await.apply_route(&route_request, result);
        }
    }

    let snapshot = session.lock().await.snapshot();
    Ok(AxumJson(snapshot))
}

pub async fn book_ride(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<AxumJson<LandingSnapshot>, ApiError> {
    let session = find_session(&state, session_id)?;
    let mut session = session.lock().await;
    session.touch();

    if session.book_ride().is_none() {
        if !session.addresses().can_book() {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                AxumJson(json!({"error": "Both pickup and drop-off locations are needed to book a ride"})),
            ));
        }
        return Err((
            StatusCode::CONFLICT,
            AxumJson(json!({"error": "The booking widget is not showing", "view": session.view_state()})),
        ));
    }

    tracing::info!("Simulated ride booked for session {}", session_id);
    Ok(AxumJson(session.snapshot()))
}

pub async fn continue_to_survey(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<AxumJson<LandingSnapshot>, ApiError> {
    let session = find_session(&state, session_id)?;
    let mut session = session.lock().await;
    session.touch();

    if session.continue_to_survey().is_none() {
        return Err((
            StatusCode::CONFLICT,
            AxumJson(json!({"error": "The thank-you screen is not showing", "view": session.view_state()})),
        ));
    }
    Ok(AxumJson(session.snapshot()))
}
