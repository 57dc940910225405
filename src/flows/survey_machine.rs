use std::collections::BTreeMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::api::collaborators::{RecordStore, SurveyRecord};
use crate::error::{StoreError, SurveyError, ValidationError};
use crate::models::survey_models::{InputKind, StepDescriptor, SURVEY_STEPS};

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

const PHONE_DIGITS: usize = 10;

/// Column carrying the client-generated idempotency key of a response.
pub const SUBMISSION_ID_FIELD: &str = "submission_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SurveyPhase {
    InProgress { step_index: usize },
    Submitting,
    Submitted,
}

/// Checks one answer against its step. Blank answers, and select answers that
/// are not one of the listed options, count as empty.
pub fn validate(step: &StepDescriptor, value: &str) -> Result<(), ValidationError> {
    let empty = value.trim().is_empty()
        || (step.kind == InputKind::Select && !step.options.contains(&value));
    if empty {
        return if step.required { Err(ValidationError::Required) } else { Ok(()) };
    }
    match step.kind {
        InputKind::Email if !EMAIL_SHAPE.is_match(value) => Err(ValidationError::InvalidEmail),
        InputKind::Phone
            if value.len() != PHONE_DIGITS || !value.chars().all(|c| c.is_ascii_digit()) =>
        {
            Err(ValidationError::InvalidPhone)
        }
        _ => Ok(()),
    }
}

fn normalize(kind: InputKind, value: &str) -> String {
    match kind {
        InputKind::Phone => value.chars().filter(|c| c.is_ascii_digit()).collect(),
        _ => value.to_string(),
    }
}

/// The multi-step lead-capture form.
#[derive(Debug, Clone)]
pub struct SurveyMachine {
    steps: &'static [StepDescriptor],
    step_index: usize,
    answers: BTreeMap<String, String>,
    error: Option<SurveyError>,
    submitting: bool,
    submitted: bool,
    submission_id: Uuid,
}

impl Default for SurveyMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyMachine {
    pub fn new() -> Self {
        Self {
            steps: SURVEY_STEPS,
            step_index: 0,
            answers: BTreeMap::new(),
            error: None,
            submitting: false,
            submitted: false,
            submission_id: Uuid::new_v4(),
        }
    }

    pub fn phase(&self) -> SurveyPhase {
        if self.submitted {
            SurveyPhase::Submitted
        } else if self.submitting {
            SurveyPhase::Submitting
        } else {
            SurveyPhase::InProgress { step_index: self.step_index }
        }
    }

    pub fn steps(&self) -> &'static [StepDescriptor] {
        self.steps
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn is_last_step(&self) -> bool {
        self.step_index + 1 == self.steps.len()
    }

    pub fn current_step(&self) -> &'static StepDescriptor {
        &self.steps[self.step_index]
    }

    /// Answer for the current step, empty when untouched.
    pub fn value(&self) -> &str {
        self.answers
            .get(self.current_step().field)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn error(&self) -> Option<&SurveyError> {
        self.error.as_ref()
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    fn ensure_editable(&self) -> Result<(), SurveyError> {
        if self.submitted {
            Err(SurveyError::AlreadySubmitted)
        } else if self.submitting {
            Err(SurveyError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }

    pub fn change(&mut self, value: &str) -> Result<(), SurveyError> {
        self.ensure_editable()?;
        let step = self.current_step();
        self.answers
            .insert(step.field.to_string(), normalize(step.kind, value));
        self.error = None;
        Ok(())
    }

    fn validate_current(&mut self) -> Result<(), SurveyError> {
        if let Err(e) = validate(self.current_step(), self.value()) {
            let err = SurveyError::Validation(e);
            self.error = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }

    /// Advances one step if the current answer is acceptable. Does nothing on
    /// the final step; only `submit` finishes the form.
    pub fn next(&mut self) -> Result<(), SurveyError> {
        self.ensure_editable()?;
        if self.is_last_step() {
            return Ok(());
        }
        self.validate_current()?;
        self.step_index += 1;
        self.error = None;
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), SurveyError> {
        self.ensure_editable()?;
        if self.step_index == 0 {
            return Ok(());
        }
        self.step_index -= 1;
        self.error = None;
        Ok(())
    }

    /// Validates the final step and locks the form. Returns the record to insert.
    pub fn begin_submit(&mut self) -> Result<SurveyRecord, SurveyError> {
        self.ensure_editable()?;
        if !self.is_last_step() {
            return Err(SurveyError::NotAtFinalStep);
        }
        self.validate_current()?;

        self.submitting = true;
        self.error = None;
        let mut record: SurveyRecord = self.answers.clone();
        record.insert(SUBMISSION_ID_FIELD.to_string(), self.submission_id.to_string());
        Ok(record)
    }

    /// Settles an in-flight submission. A failure reopens the last step with
    /// the answers kept so the user can submit again.
    pub fn finish_submit(&mut self, result: Result<(), StoreError>) -> Result<(), SurveyError> {
        if !self.submitting {
            return self.ensure_editable();
        }
        self.submitting = false;
        match result {
            Ok(()) => {
                self.submitted = true;
                tracing::info!("Survey response {} stored", self.submission_id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Survey response {} failed to store: {}", self.submission_id, e);
                let err = SurveyError::Submission(e.to_string());
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

/// Inserts a begun submission, giving up after `limit`. The outcome goes to
/// `SurveyMachine::finish_submit` either way.
pub async fn insert_within(
    store: &dyn RecordStore,
    table: &str,
    record: &SurveyRecord,
    limit: Duration,
) -> Result<(), StoreError> {
    match tokio::time::timeout(limit, store.insert(table, record)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::TimedOut(limit)),
    }
}
