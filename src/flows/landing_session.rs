use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{ProviderError, StepError};
use crate::flows::address_resolution::{AddressResolution, GeocodeRequest};
use crate::flows::route_preview::{RoutePreview, RouteRequest};
use crate::flows::survey_machine::{SurveyMachine, SurveyPhase};
use crate::flows::view_orchestrator::{ViewDelays, ViewEvent, ViewOrchestrator};
use crate::models::landing_models::{Coordinate, Endpoint, MapMarker, Route, ViewState};
use crate::models::survey_models::{ConfirmationView, StepDescriptor, CONFIRMATION};

#[derive(Debug, Clone, Serialize)]
pub struct BookingSnapshot {
    pub pickup: String,
    pub dropoff: String,
    pub pickup_coordinate: Option<Coordinate>,
    pub dropoff_coordinate: Option<Coordinate>,
    pub center: Coordinate,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
    pub route: Option<Route>,
    pub can_book: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    Next,
    Submit,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveySnapshot {
    #[serde(flatten)]
    pub phase: SurveyPhase,
    pub step_number: usize,
    pub step_count: usize,
    pub progress: f64,
    pub step: &'static StepDescriptor,
    pub value: String,
    pub error: Option<StepError>,
    pub can_go_back: bool,
    pub primary_action: PrimaryAction,
    pub submit_disabled: bool,
    pub confirmation: Option<&'static ConfirmationView>,
}

/// Everything the page needs to render one visitor's current state.
#[derive(Debug, Clone, Serialize)]
pub struct LandingSnapshot {
    pub session_id: Uuid,
    pub view: ViewState,
    pub auto_advance_in_ms: Option<u64>,
    pub booking: BookingSnapshot,
    pub survey: SurveySnapshot,
}

/// One visitor's pass through splash, booking widget, thank-you and survey.
pub struct LandingSession {
    id: Uuid,
    view: ViewOrchestrator,
    addresses: AddressResolution,
    route: RoutePreview,
    survey: SurveyMachine,
    last_seen: Instant,
}

impl LandingSession {
    /// Starts on the splash screen with its timer armed.
    pub fn start(id: Uuid, delays: ViewDelays, default_center: Coordinate) -> Self {
        Self {
            id,
            view: ViewOrchestrator::start(delays),
            addresses: AddressResolution::new(default_center),
            route: RoutePreview::new(),
            survey: SurveyMachine::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn view_state(&self) -> ViewState {
        self.view.state()
    }

    pub fn addresses(&self) -> &AddressResolution {
        &self.addresses
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.route()
    }

    pub fn survey(&self) -> &SurveyMachine {
        &self.survey
    }

    /// The survey, but only while it is the screen being shown.
    pub fn survey_mut(&mut self) -> Option<&mut SurveyMachine> {
        if self.view.state() == ViewState::Survey {
            Some(&mut self.survey)
        } else {
            None
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_seen)
    }

    pub fn set_address(&mut self, endpoint: Endpoint, text: &str) -> Option<GeocodeRequest> {
        let request = self.addresses.set_text(endpoint, text);
        // text changed: the old coordinate is gone, so is any route through it
        self.route.sync(self.addresses.resolved_pair());
        request
    }

    /// Stores a geocoding result. Returns the route lookup to run once both ends resolve.
    pub fn apply_geocode(
        &mut self,
        request: &GeocodeRequest,
        coordinate: Option<Coordinate>,
    ) -> Option<RouteRequest> {
        if !self.addresses.apply(request, coordinate) {
            return None;
        }
        self.route.sync(self.addresses.resolved_pair())
    }

    pub fn apply_route(&mut self, request: &RouteRequest, result: Result<Route, ProviderError>) -> bool {
        self.route.apply(request, result)
    }

    pub fn book_ride(&self) -> Option<ViewState> {
        self.view.dispatch(ViewEvent::BookRide {
            pickup: self.addresses.text(Endpoint::Pickup).to_string(),
            dropoff: self.addresses.text(Endpoint::Dropoff).to_string(),
        })
    }

    pub fn continue_to_survey(&self) -> Option<ViewState> {
        self.view.dispatch(ViewEvent::Continue)
    }

    /// Cancels pending timed transitions. Called before the session is dropped.
    pub fn teardown(&self) {
        self.view.shutdown();
    }

    pub fn snapshot(&self) -> LandingSnapshot {
        LandingSnapshot {
            session_id: self.id,
            view: self.view.state(),
            auto_advance_in_ms: self
                .view
                .auto_advance_in()
                .map(|left| left.as_millis() as u64),
            booking: self.booking_snapshot(),
            survey: self.survey_snapshot(),
        }
    }

    fn booking_snapshot(&self) -> BookingSnapshot {
        let addresses = &self.addresses;
        BookingSnapshot {
            pickup: addresses.text(Endpoint::Pickup).to_string(),
            dropoff: addresses.text(Endpoint::Dropoff).to_string(),
            pickup_coordinate: addresses.coordinate(Endpoint::Pickup),
            dropoff_coordinate: addresses.coordinate(Endpoint::Dropoff),
            center: addresses.center(),
            zoom: addresses.zoom(),
            markers: addresses.markers(),
            route: self.route.route().cloned(),
            can_book: addresses.can_book(),
        }
    }

    fn survey_snapshot(&self) -> SurveySnapshot {
        let survey = &self.survey;
        let step_count = survey.steps().len();
        let phase = survey.phase();
        SurveySnapshot {
            phase,
            step_number: survey.step_index() + 1,
            step_count,
            progress: (survey.step_index() + 1) as f64 / step_count as f64,
            step: survey.current_step(),
            value: survey.value().to_string(),
            error: survey.error().map(StepError::from),
            can_go_back: survey.step_index() > 0,
            primary_action: if survey.is_last_step() {
                PrimaryAction::Submit
            } else {
                PrimaryAction::Next
            },
            submit_disabled: phase == SurveyPhase::Submitting,
            confirmation: (phase == SurveyPhase::Submitted).then_some(&CONFIRMATION),
        }
    }
}
