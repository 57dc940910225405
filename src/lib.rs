use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod config;
pub mod error;
pub mod api {
    pub mod collaborators;
    pub mod google_maps;
    pub mod supabase;
}
pub mod models {
    pub mod landing_models;
    pub mod survey_models;
}
pub mod flows {
    pub mod address_resolution;
    pub mod landing_session;
    pub mod route_preview;
    pub mod survey_machine;
    pub mod view_orchestrator;
}
pub mod handlers {
    pub mod landing_dtos;
    pub mod landing_handlers;
    pub mod survey_handlers;
}
pub mod repositories {
    pub mod landing_sessions;
}
pub mod jobs {
    pub mod session_sweeper;
}
pub mod utils {
    pub mod polyline;
    pub mod timer;
}

use api::collaborators::{Directions, Geocoder, RecordStore};
use api::google_maps::GoogleMapsClient;
use api::supabase::SupabaseClient;
use config::LandingConfig;
use flows::survey_machine::SUBMISSION_ID_FIELD;
use handlers::{landing_handlers, survey_handlers};
use repositories::landing_sessions::LandingSessions;

pub struct AppState {
    pub sessions: LandingSessions,
    pub geocoder: Arc<dyn Geocoder>,
    pub directions: Arc<dyn Directions>,
    pub record_store: Arc<dyn RecordStore>,
    pub survey_table: String,
    /// Longest a survey may stay in `Submitting` before the insert is abandoned.
    pub submit_timeout: Duration,
}

impl AppState {
    /// Wires the Google Maps and Supabase adapters described by `config`.
    pub fn from_config(config: &LandingConfig) -> Self {
        let maps = Arc::new(GoogleMapsClient::with_base_url(
            config.google_maps_api_key.clone(),
            config.google_maps_base_url.clone(),
        ));
        let store = SupabaseClient::new(config.supabase_url.clone(), config.supabase_anon_key.clone())
            .with_conflict_column(SUBMISSION_ID_FIELD);
        Self {
            sessions: LandingSessions::new(config.view_delays, config.default_center),
            geocoder: maps.clone(),
            directions: maps,
            record_store: Arc::new(store),
            survey_table: config.survey_table.clone(),
            submit_timeout: config.submit_timeout,
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn build_router(state: Arc<AppState>, static_dir: &str, frontend_url: &str) -> Router {
    let allow_origin = match HeaderValue::from_str(frontend_url) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!("FRONTEND_URL is not a valid origin ({}), CORS disabled", e);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    let landing_routes = Router::new()
        .route("/api/landing/sessions", post(landing_handlers::create_session))
        .route(
            "/api/landing/sessions/{session_id}",
            get(landing_handlers::get_session).delete(landing_handlers::delete_session),
        )
        .route("/api/landing/sessions/{session_id}/pickup", put(landing_handlers::update_pickup))
        .route("/api/landing/sessions/{session_id}/dropoff", put(landing_handlers::update_dropoff))
        .route("/api/landing/sessions/{session_id}/book", post(landing_handlers::book_ride))
        .route("/api/landing/sessions/{session_id}/continue", post(landing_handlers::continue_to_survey));

    let survey_routes = Router::new()
        .route("/api/survey/steps", get(survey_handlers::get_survey_steps))
        .route("/api/landing/sessions/{session_id}/survey/change", post(survey_handlers::change_answer))
        .route("/api/landing/sessions/{session_id}/survey/next", post(survey_handlers::next_step))
        .route("/api/landing/sessions/{session_id}/survey/back", post(survey_handlers::previous_step))
        .route("/api/landing/sessions/{session_id}/survey/submit", post(survey_handlers::submit_survey));

    Router::new()
        .route("/api/health", get(health_check))
        .merge(landing_routes)
        .merge(survey_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_origin(allow_origin)
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
        )
        .with_state(state)
}
