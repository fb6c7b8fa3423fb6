//! Composite credit scorer.
//!
//! Three pillars feed the 0-1000 score: traditional risk indicators (farm
//! size, crop health, climate risk, payment history, deforestation),
//! verified-action behavior, and ground-truth reporting behavior. Pillars
//! with no underlying records are unavailable and their weight redistributes;
//! a farmer with nothing on file at all cannot be scored.

mod factors;
mod grade;
pub mod ledger;

pub use grade::{CreditTerms, Grade};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CreditConfig;
use crate::engines::aggregate::{aggregate, FactorContribution, WeightedInput};
use crate::error::DecisionError;
use crate::evidence::{
    ActionHistory, EvidenceDetail, EvidenceItem, FarmProfile, FarmerId, ReportingHistory,
    SatelliteScan, SourceKind, TraditionalIndicator,
};

/// The three composite pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Traditional,
    Action,
    GroundTruth,
}

impl Pillar {
    pub const fn label(self) -> &'static str {
        match self {
            Pillar::Traditional => "traditional",
            Pillar::Action => "action",
            Pillar::GroundTruth => "ground_truth",
        }
    }
}

/// A 0-100 pillar result with the evidence that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub pillar: Pillar,
    pub value: f64,
    pub evidence: Vec<EvidenceItem>,
    /// Indicator-level breakdown, populated for the traditional pillar.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributions: Vec<FactorContribution>,
}

/// Frozen scoring record. Never mutated after creation; a re-score appends a
/// new record to the ledger instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub score_id: Uuid,
    pub farmer_id: FarmerId,
    pub value: u16,
    pub grade: Grade,
    pub sub_scores: Vec<SubScore>,
    /// Data-freshness confidence in the score, 0.0-0.95.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<CreditTerms>,
    pub computed_at: DateTime<Utc>,
}

/// Evidence gathered for one scoring request. `None` fields mean the source
/// was unavailable (missing record, timeout).
#[derive(Debug, Clone, Default)]
pub struct CreditInputs {
    pub profile: Option<FarmProfile>,
    pub latest_scan: Option<SatelliteScan>,
    pub actions: Option<ActionHistory>,
    pub reporting: Option<ReportingHistory>,
}

/// Stateless scorer applying the configured weight sets.
pub struct CreditScorer {
    config: CreditConfig,
}

impl CreditScorer {
    pub fn new(config: CreditConfig) -> Self {
        Self { config }
    }

    pub fn score(
        &self,
        farmer: &FarmerId,
        inputs: &CreditInputs,
        as_of: NaiveDate,
    ) -> Result<CompositeScore, DecisionError> {
        let traditional = self.traditional_pillar(inputs);
        let action = self.action_pillar(inputs);
        let ground_truth = self.ground_truth_pillar(inputs);

        let weights = &self.config.pillar_weights;
        let pillar_inputs = [
            pillar_input(Pillar::Traditional, weights.traditional, &traditional),
            pillar_input(Pillar::Action, weights.action, &action),
            pillar_input(Pillar::GroundTruth, weights.ground_truth, &ground_truth),
        ];

        let outcome =
            aggregate(&pillar_inputs).map_err(|source| DecisionError::InsufficientEvidence {
                subject: format!("credit score for farmer {farmer}"),
                source,
            })?;

        let value = (outcome.score * 10.0).round().min(1000.0) as u16;
        let sub_scores = [traditional, action, ground_truth]
            .into_iter()
            .flatten()
            .collect();

        Ok(CompositeScore {
            score_id: Uuid::new_v4(),
            farmer_id: farmer.clone(),
            value,
            grade: Grade::from_score(value),
            sub_scores,
            confidence: freshness_confidence(inputs, as_of),
            terms: CreditTerms::from_score(value),
            computed_at: Utc::now(),
        })
    }

    fn traditional_pillar(&self, inputs: &CreditInputs) -> Option<SubScore> {
        let profile = inputs.profile.as_ref()?;
        let weights = &self.config.traditional_weights;
        let mut evidence = Vec::new();

        let farm_size = factors::farm_size_score(profile.size_acres);
        evidence.push(traditional_evidence(
            TraditionalIndicator::FarmSize,
            profile.size_acres,
            farm_size,
            None,
        ));

        let crop_health = inputs
            .latest_scan
            .as_ref()
            .and_then(|scan| scan.ndvi_mean.map(|ndvi| (scan.scan_date, ndvi)))
            .map(|(scan_date, ndvi)| {
                let normalized = factors::crop_health_score(ndvi);
                evidence.push(traditional_evidence(
                    TraditionalIndicator::CropHealth,
                    ndvi,
                    normalized,
                    Some(scan_date),
                ));
                normalized
            });

        let climate_risk = profile.climate_risk.map(|indicator| {
            let normalized = factors::climate_risk_score(indicator.risk_score);
            evidence.push(traditional_evidence(
                TraditionalIndicator::ClimateRisk,
                indicator.risk_score,
                normalized,
                Some(indicator.assessed_on),
            ));
            normalized
        });

        let payment_history = factors::payment_history_score(&profile.payments).map(|score| {
            evidence.push(traditional_evidence(
                TraditionalIndicator::PaymentHistory,
                f64::from(profile.payments.total),
                score,
                None,
            ));
            score
        });

        let deforestation = profile.deforestation.map(|indicator| {
            let normalized = factors::deforestation_score(indicator.detected);
            evidence.push(traditional_evidence(
                TraditionalIndicator::Deforestation,
                if indicator.detected { 1.0 } else { 0.0 },
                normalized,
                Some(indicator.checked_on),
            ));
            normalized
        });

        let indicator_inputs = [
            weighted("farm_size", weights.farm_size, Some(farm_size)),
            weighted("crop_health", weights.crop_health, crop_health),
            weighted("climate_risk", weights.climate_risk, climate_risk),
            weighted(
                "payment_history",
                weights.payment_history,
                payment_history,
            ),
            weighted("deforestation", weights.deforestation, deforestation),
        ];

        // Farm size is always present once a profile exists, so this cannot
        // fail with insufficient evidence.
        let outcome = aggregate(&indicator_inputs).ok()?;

        Some(SubScore {
            pillar: Pillar::Traditional,
            value: outcome.score,
            evidence,
            contributions: outcome.contributions,
        })
    }

    fn action_pillar(&self, inputs: &CreditInputs) -> Option<SubScore> {
        let history = inputs.actions.as_ref()?;
        let value = factors::action_score(history)?;
        Some(SubScore {
            pillar: Pillar::Action,
            value,
            evidence: vec![EvidenceItem {
                source: SourceKind::Actions,
                observed_at: None,
                supports_claim: None,
                detail: EvidenceDetail::Actions {
                    submitted: history.submitted,
                    verified: history.verified,
                    distinct_verified_types: history.distinct_verified_types,
                    active_months: history.active_months,
                },
            }],
            contributions: Vec::new(),
        })
    }

    fn ground_truth_pillar(&self, inputs: &CreditInputs) -> Option<SubScore> {
        let history = inputs.reporting.as_ref()?;
        let value = factors::ground_truth_score(history, self.config.full_frequency_reports)?;
        Some(SubScore {
            pillar: Pillar::GroundTruth,
            value,
            evidence: vec![EvidenceItem {
                source: SourceKind::SelfReports,
                observed_at: None,
                supports_claim: None,
                detail: EvidenceDetail::SelfReports {
                    matching_reports: history.corroborated as usize,
                    total_reports: history.submitted as usize,
                },
            }],
            contributions: Vec::new(),
        })
    }
}

fn weighted(name: &'static str, weight: f64, value: Option<f64>) -> WeightedInput {
    WeightedInput {
        name,
        weight,
        value,
    }
}

fn pillar_input(pillar: Pillar, weight: f64, sub: &Option<SubScore>) -> WeightedInput {
    WeightedInput {
        name: pillar.label(),
        weight,
        value: sub.as_ref().map(|sub| sub.value),
    }
}

fn traditional_evidence(
    indicator: TraditionalIndicator,
    raw: f64,
    normalized: f64,
    observed_at: Option<NaiveDate>,
) -> EvidenceItem {
    EvidenceItem {
        source: SourceKind::TraditionalFactor,
        observed_at,
        supports_claim: None,
        detail: EvidenceDetail::TraditionalFactor {
            indicator,
            raw,
            normalized,
        },
    }
}

/// Data-freshness confidence: starts at 0.30 and climbs with recent
/// satellite, climate, and deforestation data, capped at 0.95.
fn freshness_confidence(inputs: &CreditInputs, as_of: NaiveDate) -> f64 {
    let mut confidence: f64 = 0.30;

    if let Some(scan) = &inputs.latest_scan {
        confidence += match (as_of - scan.scan_date).num_days() {
            ..=7 => 0.25,
            8..=14 => 0.20,
            15..=30 => 0.15,
            _ => 0.10,
        };
    }

    if let Some(indicator) = inputs.profile.as_ref().and_then(|p| p.climate_risk) {
        confidence += match (as_of - indicator.assessed_on).num_days() {
            ..=30 => 0.20,
            31..=60 => 0.15,
            _ => 0.10,
        };
    }

    if let Some(indicator) = inputs.profile.as_ref().and_then(|p| p.deforestation) {
        confidence += match (as_of - indicator.checked_on).num_days() {
            ..=90 => 0.15,
            _ => 0.10,
        };
    }

    confidence.min(0.95)
}
