use crate::error::AppError;
use crate::infra::{deserialize_date, deserialize_optional_date, ApiDecisionService, AppState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use croppulse::engines::claims::{ClaimRequest, ClaimType, ClaimVerdict};
use croppulse::engines::credit::CompositeScore;
use croppulse::engines::logistics::HarvestAssessment;
use croppulse::evidence::{FarmId, FarmerId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct ComputeScoreRequest {
    pub(crate) farmer_id: String,
    /// Scoring date override for reproducible runs; defaults to today.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyClaimRequest {
    pub(crate) farmer_id: String,
    pub(crate) farm_id: String,
    pub(crate) claim_type: ClaimType,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) claim_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssessHarvestRequest {
    pub(crate) farm_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreHistoryResponse {
    pub(crate) farmer_id: String,
    pub(crate) scores: Vec<CompositeScore>,
}

pub(crate) fn decision_routes(service: Arc<ApiDecisionService>) -> axum::Router {
    axum::Router::new()
        .route(
            "/api/v1/scores/compute",
            axum::routing::post(compute_score_endpoint),
        )
        .route(
            "/api/v1/scores/:farmer_id/history",
            axum::routing::get(score_history_endpoint),
        )
        .route(
            "/api/v1/claims/verify",
            axum::routing::post(verify_claim_endpoint),
        )
        .route(
            "/api/v1/harvest/assess",
            axum::routing::post(assess_harvest_endpoint),
        )
        .with_state(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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

pub(crate) async fn compute_score_endpoint(
    State(service): State<Arc<ApiDecisionService>>,
    Json(payload): Json<ComputeScoreRequest>,
) -> Result<Json<CompositeScore>, AppError> {
    let as_of = payload.as_of.unwrap_or_else(|| Local::now().date_naive());
    let farmer = FarmerId(payload.farmer_id);
    let record = service.compute_credit_score(&farmer, as_of).await?;
    Ok(Json(record))
}

pub(crate) async fn score_history_endpoint(
    State(service): State<Arc<ApiDecisionService>>,
    Path(farmer_id): Path<String>,
) -> Result<Json<ScoreHistoryResponse>, AppError> {
    let farmer = FarmerId(farmer_id.clone());
    let scores = service.score_history(&farmer)?;
    Ok(Json(ScoreHistoryResponse {
        farmer_id,
        scores,
    }))
}

pub(crate) async fn verify_claim_endpoint(
    State(service): State<Arc<ApiDecisionService>>,
    Json(payload): Json<VerifyClaimRequest>,
) -> Result<Json<ClaimVerdict>, AppError> {
    let request = ClaimRequest {
        farmer_id: FarmerId(payload.farmer_id),
        farm_id: FarmId(payload.farm_id),
        claim_type: payload.claim_type,
        claim_date: payload.claim_date,
    };
    let verdict = service
        .verify_claim(&request, Local::now().date_naive())
        .await?;
    Ok(Json(verdict))
}

pub(crate) async fn assess_harvest_endpoint(
    State(service): State<Arc<ApiDecisionService>>,
    Json(payload): Json<AssessHarvestRequest>,
) -> Result<Json<HarvestAssessment>, AppError> {
    let farm = FarmId(payload.farm_id);
    let assessment = service.assess_harvest(&farm).await?;
    Ok(Json(assessment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_service, seed_fixtures};
    use croppulse::config::EngineConfig;
    use croppulse::engines::claims::Recommendation;
    use croppulse::engines::logistics::Urgency;
    use croppulse::evidence::memory::InMemoryEvidenceStore;

    fn seeded_service() -> Arc<ApiDecisionService> {
        let store = Arc::new(InMemoryEvidenceStore::new());
        seed_fixtures(&store, Local::now().date_naive());
        build_service(EngineConfig::default(), store).expect("default config validates")
    }

    #[tokio::test]
    async fn compute_score_endpoint_returns_full_breakdown() {
        let service = seeded_service();
        let request = ComputeScoreRequest {
            farmer_id: "amara-okello".to_string(),
            as_of: None,
        };

        let Json(record) = compute_score_endpoint(State(service.clone()), Json(request))
            .await
            .expect("score computes");

        assert_eq!(record.sub_scores.len(), 3);
        assert!(record.value <= 1000);

        let Json(history) = score_history_endpoint(
            State(service),
            Path("amara-okello".to_string()),
        )
        .await
        .expect("history reads");
        assert_eq!(history.scores.len(), 1);
        assert_eq!(history.scores[0].score_id, record.score_id);
    }

    #[tokio::test]
    async fn unknown_farmer_maps_to_unprocessable() {
        let service = seeded_service();
        let request = ComputeScoreRequest {
            farmer_id: "nobody".to_string(),
            as_of: None,
        };

        let error = compute_score_endpoint(State(service), Json(request))
            .await
            .expect_err("no evidence for unknown farmer");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn verify_claim_endpoint_approves_seeded_drought() {
        let service = seeded_service();
        let request = VerifyClaimRequest {
            farmer_id: "amara-okello".to_string(),
            farm_id: "farm-0001".to_string(),
            claim_type: ClaimType::Drought,
            claim_date: Local::now().date_naive() - chrono::Duration::days(3),
        };

        let Json(verdict) = verify_claim_endpoint(State(service), Json(request))
            .await
            .expect("verdict");
        assert_eq!(verdict.recommendation, Recommendation::ApproveStrong);
        assert_eq!(verdict.evidence.len(), 3);
    }

    #[tokio::test]
    async fn future_claim_maps_to_bad_request() {
        let service = seeded_service();
        let request = VerifyClaimRequest {
            farmer_id: "amara-okello".to_string(),
            farm_id: "farm-0001".to_string(),
            claim_type: ClaimType::Drought,
            claim_date: Local::now().date_naive() + chrono::Duration::days(5),
        };

        let error = verify_claim_endpoint(State(service), Json(request))
            .await
            .expect_err("future claims are rejected");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assess_harvest_endpoint_flags_the_wet_week() {
        let service = seeded_service();
        let request = AssessHarvestRequest {
            farm_id: "farm-0001".to_string(),
        };

        let Json(assessment) = assess_harvest_endpoint(State(service), Json(request))
            .await
            .expect("assessment");
        assert_eq!(assessment.urgency, Urgency::Critical);
        assert!(assessment.optimal_date.is_none());
    }

    #[tokio::test]
    async fn assess_harvest_without_forecast_is_unprocessable() {
        let service = seeded_service();
        let request = AssessHarvestRequest {
            farm_id: "farm-9999".to_string(),
        };

        let error = assess_harvest_endpoint(State(service), Json(request))
            .await
            .expect_err("no forecast seeded for farm-9999");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
