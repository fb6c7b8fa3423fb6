//! Orchestration over the three engines.
//!
//! The service owns the adapter handles and the score ledger, fetches
//! evidence concurrently with a per-call timeout, and degrades any failed
//! fetch to "source unavailable" before handing the inputs to an engine.
//! Engines stay synchronous and pure; everything async lives here.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::engines::claims::{ClaimEngine, ClaimInputs, ClaimRequest, ClaimVerdict};
use crate::engines::credit::ledger::ScoreLedger;
use crate::engines::credit::{CompositeScore, CreditInputs, CreditScorer};
use crate::engines::logistics::{HarvestAssessment, LogisticsEngine};
use crate::error::DecisionError;
use crate::evidence::adapters::{
    fetch_with_timeout, ActionStore, FarmRegistry, ForecastStore, GroundTruthStore,
    SatelliteStore, SourceError,
};
use crate::evidence::{DateWindow, FarmId, FarmerId};

/// Entry point for every decision operation.
pub struct DecisionService<R, S, G, A, F, L> {
    registry: Arc<R>,
    satellite: Arc<S>,
    ground_truth: Arc<G>,
    actions: Arc<A>,
    forecasts: Arc<F>,
    ledger: Arc<L>,
    credit: CreditScorer,
    claims: ClaimEngine,
    logistics: LogisticsEngine,
    config: EngineConfig,
}

impl<R, S, G, A, F, L> DecisionService<R, S, G, A, F, L>
where
    R: FarmRegistry,
    S: SatelliteStore,
    G: GroundTruthStore,
    A: ActionStore,
    F: ForecastStore,
    L: ScoreLedger,
{
    /// Rejects invalid weight configuration up front, before any request.
    pub fn new(
        config: EngineConfig,
        registry: Arc<R>,
        satellite: Arc<S>,
        ground_truth: Arc<G>,
        actions: Arc<A>,
        forecasts: Arc<F>,
        ledger: Arc<L>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry,
            satellite,
            ground_truth,
            actions,
            forecasts,
            ledger,
            credit: CreditScorer::new(config.credit.clone()),
            claims: ClaimEngine::new(config.claims.clone()),
            logistics: LogisticsEngine::new(config.logistics.clone()),
            config,
        })
    }

    /// Compute and persist a new composite credit score for the farmer.
    pub async fn compute_credit_score(
        &self,
        farmer: &FarmerId,
        as_of: NaiveDate,
    ) -> Result<CompositeScore, DecisionError> {
        let limit = self.config.evidence_timeout;

        let (profile, actions, reporting) = tokio::join!(
            fetch_with_timeout(limit, self.registry.farm_profile(farmer)),
            fetch_with_timeout(limit, self.actions.action_history(farmer)),
            fetch_with_timeout(limit, self.ground_truth.reporting_history(farmer)),
        );

        let profile = degrade("farm_registry", farmer, profile).flatten();

        // The scan lookup needs the farm id, so it waits on the profile.
        let latest_scan = match &profile {
            Some(profile) => {
                let window =
                    DateWindow::trailing(as_of, self.config.credit.scan_lookback_days);
                let scan = fetch_with_timeout(
                    limit,
                    self.satellite.latest_scan(&profile.farm_id, window),
                )
                .await;
                degrade("satellite", farmer, scan).flatten()
            }
            None => None,
        };

        let inputs = CreditInputs {
            profile,
            latest_scan,
            actions: degrade("actions", farmer, actions),
            reporting: degrade("ground_truth", farmer, reporting),
        };

        let record = self.credit.score(farmer, &inputs, as_of)?;
        self.ledger.append(record.clone())?;
        info!(
            farmer = %farmer,
            score = record.value,
            grade = record.grade.label(),
            "credit score computed"
        );
        Ok(record)
    }

    /// Full scoring history for a farmer, oldest first.
    pub fn score_history(&self, farmer: &FarmerId) -> Result<Vec<CompositeScore>, DecisionError> {
        Ok(self.ledger.history(farmer)?)
    }

    /// Verify a weather claim against satellite, neighbor, and self-report
    /// evidence.
    pub async fn verify_claim(
        &self,
        request: &ClaimRequest,
        today: NaiveDate,
    ) -> Result<ClaimVerdict, DecisionError> {
        self.claims.validate(request, today)?;
        let limit = self.config.evidence_timeout;

        let (scan, neighbor_reports, own_reports) = tokio::join!(
            fetch_with_timeout(
                limit,
                self.satellite
                    .latest_scan(&request.farm_id, self.claims.scan_window(request.claim_date)),
            ),
            fetch_with_timeout(
                limit,
                self.ground_truth.reports_near_farm(
                    &request.farm_id,
                    self.config.claims.neighbor_limit,
                    self.claims.neighbor_window(request.claim_date),
                ),
            ),
            fetch_with_timeout(
                limit,
                self.ground_truth.reports_by_farmer(
                    &request.farmer_id,
                    self.claims.self_report_window(request.claim_date),
                ),
            ),
        );

        let inputs = ClaimInputs {
            scan: degrade("satellite", &request.farmer_id, scan).flatten(),
            neighbor_reports: degrade("neighbors", &request.farmer_id, neighbor_reports),
            own_reports: degrade("self_reports", &request.farmer_id, own_reports),
        };

        let verdict = self.claims.verify(request, &inputs)?;
        info!(
            farmer = %request.farmer_id,
            claim_type = request.claim_type.label(),
            confidence = verdict.confidence,
            recommendation = ?verdict.recommendation,
            "claim verified"
        );
        Ok(verdict)
    }

    /// Assess harvest timing and transport risk for a farm.
    pub async fn assess_harvest(
        &self,
        farm: &FarmId,
    ) -> Result<HarvestAssessment, DecisionError> {
        let required = self.logistics.min_forecast_days();
        let forecast = fetch_with_timeout(
            self.config.evidence_timeout,
            self.forecasts.forecast(farm, required),
        )
        .await
        .map_err(|source| {
            warn!(farm = %farm, error = %source, "forecast fetch failed");
            DecisionError::MissingForecast {
                farm_id: farm.clone(),
                got: 0,
                required,
            }
        })?;

        let assessment = self.logistics.assess(farm, &forecast)?;
        info!(
            farm = %farm,
            urgency = assessment.urgency.label(),
            road_risk = assessment.road_risk.level.label(),
            "harvest assessed"
        );
        Ok(assessment)
    }
}

/// Log and swallow a single-source failure; the aggregator handles the gap.
fn degrade<T>(
    source: &'static str,
    subject: &impl std::fmt::Display,
    result: Result<T, SourceError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%subject, source, %error, "evidence source degraded to unavailable");
            None
        }
    }
}
