use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a survey step refuses to advance. Recovered locally and shown inline.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid 10-digit phone number")]
    InvalidPhone,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required => "required",
            ValidationError::InvalidEmail => "invalid-email",
            ValidationError::InvalidPhone => "invalid-phone",
        }
    }
}

/// Geocoding / directions failures. These only ever degrade the map preview.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request to map provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No match found")]
    NoMatch,
    #[error("Map provider returned status {status}: {message}")]
    Status { status: String, message: String },
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Record store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Request to record store failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Record store rejected insert ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Record store did not answer within {0:?}")]
    TimedOut(Duration),
}

/// Everything a survey operation can refuse with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurveyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Submission failed. Please try again later.")]
    Submission(String),
    #[error("A submission is already in flight")]
    SubmissionInFlight,
    #[error("The survey has already been submitted")]
    AlreadySubmitted,
    #[error("Only the final step can be submitted")]
    NotAtFinalStep,
}

impl SurveyError {
    pub fn code(&self) -> &'static str {
        match self {
            SurveyError::Validation(e) => e.code(),
            SurveyError::Submission(_) => "submission-failed",
            SurveyError::SubmissionInFlight => "submission-in-flight",
            SurveyError::AlreadySubmitted => "already-submitted",
            SurveyError::NotAtFinalStep => "not-at-final-step",
        }
    }
}

/// Error as rendered next to the current survey step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepError {
    pub code: &'static str,
    pub message: String,
}

impl From<&SurveyError> for StepError {
    fn from(err: &SurveyError) -> Self {
        StepError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
