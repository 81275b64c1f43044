use crate::infra::{AppState, InMemorySessionRepository};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use taxcheck::workflows::filing::{
    filing_router, FilingComputation, FilingService, GapQuestionDescriptor, ReportView, Scenario,
    SessionRepository, TaxSession,
};

pub(crate) type SessionService = FilingService<InMemorySessionRepository>;

#[derive(Debug, Deserialize)]
pub(crate) struct FilingReportRequest {
    pub(crate) session: TaxSession,
    #[serde(default)]
    pub(crate) scenario: Option<Scenario>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FilingReportResponse {
    pub(crate) scenario: Option<Scenario>,
    pub(crate) score: u8,
    pub(crate) filing: FilingComputation,
    pub(crate) report: ReportView,
    pub(crate) gaps: Vec<GapQuestionDescriptor>,
}

pub(crate) fn with_service_routes<R>(service: Arc<FilingService<R>>) -> axum::Router
where
    R: SessionRepository + 'static,
{
    filing_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/filing/report",
            axum::routing::post(filing_report_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Stateless evaluation rendered as the stage-grouped report view.
pub(crate) async fn filing_report_endpoint(
    Extension(service): Extension<Arc<SessionService>>,
    Json(payload): Json<FilingReportRequest>,
) -> Json<FilingReportResponse> {
    let FilingReportRequest {
        mut session,
        scenario,
    } = payload;

    let evaluation = service.evaluate_session(&mut session, scenario);
    Json(FilingReportResponse {
        scenario,
        score: evaluation.report.summary.score,
        report: ReportView::from_report(&evaluation.report),
        filing: evaluation.filing,
        gaps: evaluation.gaps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::sample_session;
    use taxcheck::workflows::filing::FilingDefaults;

    fn service() -> Arc<SessionService> {
        Arc::new(FilingService::new(
            Arc::new(InMemorySessionRepository::default()),
            FilingDefaults::default(),
        ))
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn filing_report_endpoint_groups_results_by_stage() {
        let request = FilingReportRequest {
            session: sample_session(),
            scenario: None,
        };

        let Json(body) = filing_report_endpoint(Extension(service()), Json(request)).await;

        assert_eq!(body.filing.taxable_income, 65_000.0);
        assert_eq!(body.filing.net_result, -214.0);
        assert!(!body.report.stages.is_empty());
        assert!(body.score <= 100);
        assert!(body.gaps.iter().any(|question| question.id == "has401k"));
    }

    #[tokio::test]
    async fn filing_report_endpoint_honours_scenario() {
        let request = FilingReportRequest {
            session: sample_session(),
            scenario: Some(Scenario::Fed1099),
        };

        let Json(body) = filing_report_endpoint(Extension(service()), Json(request)).await;

        assert_eq!(body.scenario, Some(Scenario::Fed1099));
        let ids: Vec<_> = body
            .report
            .stages
            .iter()
            .flat_map(|stage| stage.results.iter().map(|result| result.id))
            .collect();
        assert!(ids.contains(&"se-tax-amount"));
        assert!(!ids.contains(&"w2-wages-total"));
    }
}
