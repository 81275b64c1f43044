use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{GapAnswer, IncomeRecord, SessionId, TaxSession};
use super::repository::{RepositoryError, SessionRepository};
use super::rules::Scenario;
use super::service::{ExtractionUpload, FilingService, FilingServiceError, SessionDraft};
use crate::workflows::extraction::{ExtractionError, UploadRejected};

/// Router builder exposing session, computation, rule and gap endpoints.
pub fn filing_router<R>(service: Arc<FilingService<R>>) -> Router
where
    R: SessionRepository + 'static,
{
    Router::new()
        .route("/api/v1/sessions", post(create_handler::<R>))
        .route("/api/v1/sessions/:session_id", get(session_handler::<R>))
        .route(
            "/api/v1/sessions/:session_id/incomes",
            put(upsert_income_handler::<R>),
        )
        .route(
            "/api/v1/sessions/:session_id/extractions",
            post(extraction_handler::<R>),
        )
        .route(
            "/api/v1/sessions/:session_id/gap-answers",
            post(gap_answer_handler::<R>),
        )
        .route(
            "/api/v1/sessions/:session_id/filing",
            get(filing_handler::<R>),
        )
        .route("/api/v1/sessions/:session_id/rules", get(rules_handler::<R>))
        .route("/api/v1/sessions/:session_id/gaps", get(gaps_handler::<R>))
        .route("/api/v1/filing/evaluate", post(evaluate_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScenarioQuery {
    #[serde(default)]
    pub(crate) scenario: Option<String>,
}

impl ScenarioQuery {
    fn parse(&self) -> Result<Option<Scenario>, Response> {
        match self.scenario.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(value) => value.parse::<Scenario>().map(Some).map_err(|error| {
                let payload = json!({
                    "error": error,
                    "scenarios": Scenario::ordered().map(Scenario::tag),
                });
                (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GapAnswerRequest {
    pub(crate) question_id: String,
    pub(crate) answer: GapAnswer,
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    axum::Json(draft): axum::Json<SessionDraft>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.create(draft) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(FilingServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "session already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn session_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upsert_income_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(income): axum::Json<IncomeRecord>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.upsert_income(&SessionId(session_id), income) {
        Ok(upsert) => (StatusCode::OK, axum::Json(upsert)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn extraction_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(upload): axum::Json<ExtractionUpload>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.ingest_extraction(&SessionId(session_id), upload) {
        Ok(outcome) => (StatusCode::CREATED, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn gap_answer_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<GapAnswerRequest>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let session_id = SessionId(session_id);
    let recorded = service.record_gap_answer(&session_id, &request.question_id, request.answer);
    match recorded.and_then(|_| service.gaps(&session_id)) {
        Ok(questions) => {
            let payload = json!({
                "session_id": session_id.0,
                "question_id": request.question_id,
                "remaining": questions,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn filing_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.compute(&SessionId(session_id)) {
        Ok(filing) => (StatusCode::OK, axum::Json(filing)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rules_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Path(session_id): Path<String>,
    Query(query): Query<ScenarioQuery>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let scenario = match query.parse() {
        Ok(scenario) => scenario,
        Err(response) => return response,
    };
    match service.evaluate(&SessionId(session_id), scenario) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn gaps_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.gaps(&SessionId(session_id)) {
        Ok(questions) => {
            let payload = json!({ "questions": questions });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Stateless evaluation of a session posted in full.
pub(crate) async fn evaluate_handler<R>(
    State(service): State<Arc<FilingService<R>>>,
    Query(query): Query<ScenarioQuery>,
    axum::Json(mut session): axum::Json<TaxSession>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let scenario = match query.parse() {
        Ok(scenario) => scenario,
        Err(response) => return response,
    };
    let evaluation = service.evaluate_session(&mut session, scenario);
    (StatusCode::OK, axum::Json(evaluation)).into_response()
}

fn error_response(error: FilingServiceError) -> Response {
    let status = match &error {
        FilingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        FilingServiceError::Repository(RepositoryError::Conflict | RepositoryError::Stale) => {
            StatusCode::CONFLICT
        }
        FilingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        FilingServiceError::Upload(UploadRejected::TooLarge { .. }) => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        FilingServiceError::Upload(UploadRejected::Empty) => StatusCode::BAD_REQUEST,
        FilingServiceError::Upload(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        FilingServiceError::Extraction(ExtractionError::Pattern(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        FilingServiceError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FilingServiceError::UnknownQuestion(_) => StatusCode::BAD_REQUEST,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
