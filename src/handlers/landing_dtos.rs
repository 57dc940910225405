use serde::{Deserialize, Serialize};

use crate::flows::landing_session::LandingSnapshot;
use crate::models::survey_models::StepDescriptor;

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SurveyChangeRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SurveyStepsResponse {
    pub steps: &'static [StepDescriptor],
}

/// Survey refusal: the message to show plus the state to render alongside it.
#[derive(Debug, Serialize)]
pub struct SurveyErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub snapshot: LandingSnapshot,
}
