use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::error::SurveyError;
use crate::flows::landing_session::LandingSession;
use crate::flows::survey_machine::{self, SurveyMachine};
use crate::handlers::landing_dtos::{SurveyChangeRequest, SurveyErrorResponse, SurveyStepsResponse};
use crate::handlers::landing_handlers::find_session;
use crate::models::survey_models::SURVEY_STEPS;
use crate::AppState;

pub async fn get_survey_steps() -> AxumJson<SurveyStepsResponse> {
    AxumJson(SurveyStepsResponse { steps: SURVEY_STEPS })
}

fn status_for(err: &SurveyError) -> StatusCode {
    match err {
        SurveyError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SurveyError::Submission(_) => StatusCode::BAD_GATEWAY,
        SurveyError::SubmissionInFlight
        | SurveyError::AlreadySubmitted
        | SurveyError::NotAtFinalStep => StatusCode::CONFLICT,
    }
}

fn refused(err: SurveyError, session: &LandingSession) -> Response {
    (
        status_for(&err),
        AxumJson(SurveyErrorResponse {
            error: err.to_string(),
            code: err.code(),
            snapshot: session.snapshot(),
        }),
    )
        .into_response()
}

fn survey_not_showing(session: &LandingSession) -> Response {
    (
        StatusCode::CONFLICT,
        AxumJson(json!({"error": "The survey is not showing", "view": session.view_state()})),
    )
        .into_response()
}

/// Runs one synchronous survey operation under the session lock.
async fn with_survey<F>(state: &AppState, session_id: Uuid, op: F) -> Response
where
    F: FnOnce(&mut SurveyMachine) -> Result<(), SurveyError>,
{
    let session = match find_session(state, session_id) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let mut session = session.lock().await;
    session.touch();

    let outcome = match session.survey_mut() {
        Some(survey) => op(survey),
        None => return survey_not_showing(&session),
    };
    match outcome {
        Ok(()) => AxumJson(session.snapshot()).into_response(),
        Err(err) => refused(err, &session),
    }
}

pub async fn change_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AxumJson(input): AxumJson<SurveyChangeRequest>,
) -> Response {
    with_survey(&state, session_id, |survey| survey.change(&input.value)).await
}

pub async fn next_step(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    with_survey(&state, session_id, SurveyMachine::next).await
}

pub async fn previous_step(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    with_survey(&state, session_id, SurveyMachine::back).await
}

pub async fn submit_survey(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    let session = match find_session(&state, session_id) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    // the survey stays in Submitting while the insert runs unlocked,
    // which is what turns a second submit into a 409
    let record = {
        let mut guard = session.lock().await;
        guard.touch();
        let begun = match guard.survey_mut() {
            Some(survey) => survey.begin_submit(),
            None => return survey_not_showing(&guard),
        };
        match begun {
            Ok(record) => record,
            Err(err) => return refused(err, &guard),
        }
    };

    // settled in its own task so a dropped request cannot leave the form locked
    tracing::info!("Submitting survey for session {}", session_id);
    let settle = tokio::spawn(async move {
        let result = survey_machine::insert_within(
            state.record_store.as_ref(),
            &state.survey_table,
            &record,
            state.submit_timeout,
        )
        .await;

        let mut guard = session.lock().await;
        let finished = match guard.survey_mut() {
            Some(survey) => survey.finish_submit(result),
            None => return survey_not_showing(&guard),
        };
        match finished {
            Ok(()) => AxumJson(guard.snapshot()).into_response(),
            Err(err) => refused(err, &guard),
        }
    });

    match settle.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Survey settle task for session {} failed: {}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                AxumJson(json!({"error": "Submission failed. Please try again later."})),
            )
                .into_response()
        }
    }
}
