//! Weather claim verification.
//!
//! A claim is checked against three independent evidence sources: satellite
//! imagery over the farm, weather reports from neighboring farms, and the
//! claimant's own prior reports. Each source reads as supporting or
//! contradicting; sources with nothing usable in their window drop out and
//! their weight redistributes. The verdict is a confidence in the claim, not
//! a payout decision.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ClaimConfig;
use crate::engines::aggregate::{aggregate, WeightedInput};
use crate::error::DecisionError;
use crate::evidence::{
    DateWindow, EvidenceDetail, EvidenceItem, FarmId, FarmerId, SatelliteScan, SourceKind,
    WeatherCondition, WeatherReport,
};

/// Insurable weather events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Drought,
    Flood,
    Storm,
    Frost,
}

impl ClaimType {
    pub const fn label(self) -> &'static str {
        match self {
            ClaimType::Drought => "drought",
            ClaimType::Flood => "flood",
            ClaimType::Storm => "storm",
            ClaimType::Frost => "frost",
        }
    }

    /// Ground-truth conditions that corroborate this claim type. A drought is
    /// corroborated by persistently dry observations, not by a "drought"
    /// report (reporters describe the sky, not the damage).
    pub const fn matching_conditions(self) -> &'static [WeatherCondition] {
        match self {
            ClaimType::Drought => &[WeatherCondition::Clear, WeatherCondition::Cloudy],
            ClaimType::Flood => &[WeatherCondition::HeavyRain, WeatherCondition::Storm],
            ClaimType::Storm => &[WeatherCondition::Storm, WeatherCondition::Windy],
            ClaimType::Frost => &[WeatherCondition::VeryCold],
        }
    }
}

/// An incoming claim to verify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub farmer_id: FarmerId,
    pub farm_id: FarmId,
    pub claim_type: ClaimType,
    pub claim_date: NaiveDate,
}

/// What the verifier recommends the claims desk do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ApproveStrong,
    Approve,
    Investigate,
    Reject,
}

impl Recommendation {
    fn from_confidence(confidence: f64) -> Self {
        if confidence >= 80.0 {
            Recommendation::ApproveStrong
        } else if confidence >= 60.0 {
            Recommendation::Approve
        } else if confidence >= 40.0 {
            Recommendation::Investigate
        } else {
            Recommendation::Reject
        }
    }
}

/// Evidence gathered for one claim. `None` marks a source that could not be
/// reached; a reachable source with nothing in its window is still `Some`
/// and the engine decides whether the empty result is usable.
#[derive(Debug, Clone, Default)]
pub struct ClaimInputs {
    pub scan: Option<SatelliteScan>,
    pub neighbor_reports: Option<Vec<WeatherReport>>,
    pub own_reports: Option<Vec<WeatherReport>>,
}

/// Immutable verification outcome with the full evidence trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub claim_id: Uuid,
    pub farmer_id: FarmerId,
    pub farm_id: FarmId,
    pub claim_type: ClaimType,
    pub claim_date: NaiveDate,
    /// 0-100 confidence that the claimed event occurred.
    pub confidence: f64,
    pub recommendation: Recommendation,
    pub evidence: Vec<EvidenceItem>,
    pub verified_at: DateTime<Utc>,
}

pub struct ClaimEngine {
    config: ClaimConfig,
}

impl ClaimEngine {
    pub fn new(config: ClaimConfig) -> Self {
        Self { config }
    }

    /// Reject impossible claims before any evidence is fetched.
    pub fn validate(&self, request: &ClaimRequest, today: NaiveDate) -> Result<(), DecisionError> {
        if request.claim_date > today {
            return Err(DecisionError::MalformedInput {
                reason: format!("claim date {} is in the future", request.claim_date),
            });
        }
        let age = (today - request.claim_date).num_days();
        if age > self.config.max_claim_age_days {
            return Err(DecisionError::MalformedInput {
                reason: format!(
                    "claim date {} is {age} days old, limit is {} days",
                    request.claim_date, self.config.max_claim_age_days
                ),
            });
        }
        Ok(())
    }

    pub fn scan_window(&self, claim_date: NaiveDate) -> DateWindow {
        DateWindow::around(claim_date, self.config.scan_window_days)
    }

    pub fn neighbor_window(&self, claim_date: NaiveDate) -> DateWindow {
        DateWindow::around(claim_date, self.config.neighbor_window_days)
    }

    pub fn self_report_window(&self, claim_date: NaiveDate) -> DateWindow {
        DateWindow::around(claim_date, self.config.self_report_window_days)
    }

    /// Weigh the gathered evidence into a verdict. Fails only when every
    /// source was unusable.
    pub fn verify(
        &self,
        request: &ClaimRequest,
        inputs: &ClaimInputs,
    ) -> Result<ClaimVerdict, DecisionError> {
        let satellite = self.satellite_evidence(request, inputs.scan.as_ref());
        let neighbors =
            self.neighbor_evidence(request, inputs.neighbor_reports.as_deref());
        let self_reports = self.self_report_evidence(request, inputs.own_reports.as_deref());

        let weights = &self.config.source_weights;
        let source_inputs = [
            support_input("satellite", weights.satellite, &satellite),
            support_input("neighbors", weights.neighbors, &neighbors),
            support_input("self_reports", weights.self_reports, &self_reports),
        ];

        let outcome =
            aggregate(&source_inputs).map_err(|source| DecisionError::InsufficientEvidence {
                subject: format!(
                    "{} claim by farmer {} on {}",
                    request.claim_type.label(),
                    request.farmer_id,
                    request.claim_date
                ),
                source,
            })?;

        let evidence = [satellite, neighbors, self_reports]
            .into_iter()
            .flatten()
            .collect();

        Ok(ClaimVerdict {
            claim_id: Uuid::new_v4(),
            farmer_id: request.farmer_id.clone(),
            farm_id: request.farm_id.clone(),
            claim_type: request.claim_type,
            claim_date: request.claim_date,
            confidence: outcome.score,
            recommendation: Recommendation::from_confidence(outcome.score),
            evidence,
            verified_at: Utc::now(),
        })
    }

    /// Satellite reading for the claim window. Drought claims need NDVI,
    /// flood claims need SAR backscatter; storm and frost leave no signature
    /// the imagery can attest to, so the source drops out for those.
    fn satellite_evidence(
        &self,
        request: &ClaimRequest,
        scan: Option<&SatelliteScan>,
    ) -> Option<EvidenceItem> {
        let scan = scan?;
        let supports = match request.claim_type {
            ClaimType::Drought => scan
                .ndvi_mean
                .map(|ndvi| ndvi < self.config.drought_ndvi_threshold)?,
            ClaimType::Flood => scan
                .sar_vv_mean_db
                .map(|sar| sar < self.config.flood_sar_threshold_db)?,
            ClaimType::Storm | ClaimType::Frost => return None,
        };
        Some(EvidenceItem {
            source: SourceKind::Satellite,
            observed_at: Some(scan.scan_date),
            supports_claim: Some(supports),
            detail: EvidenceDetail::Satellite {
                ndvi_mean: scan.ndvi_mean,
                sar_vv_mean_db: scan.sar_vv_mean_db,
            },
        })
    }

    /// Corroboration from nearby farms. Requires reports from at least
    /// `min_neighbor_reporters` distinct farmers; below that the source is
    /// unavailable so a lone accomplice cannot carry the verdict.
    fn neighbor_evidence(
        &self,
        request: &ClaimRequest,
        reports: Option<&[WeatherReport]>,
    ) -> Option<EvidenceItem> {
        let reports = reports?;
        let mut reporters: Vec<&FarmerId> =
            reports.iter().map(|report| &report.farmer_id).collect();
        reporters.sort_by(|a, b| a.0.cmp(&b.0));
        reporters.dedup();
        if reporters.len() < self.config.min_neighbor_reporters {
            return None;
        }

        let matching = reports
            .iter()
            .filter(|report| {
                request
                    .claim_type
                    .matching_conditions()
                    .contains(&report.condition)
            })
            .count();
        let agreement_rate = matching as f64 / reports.len() as f64;

        Some(EvidenceItem {
            source: SourceKind::Neighbors,
            observed_at: Some(request.claim_date),
            supports_claim: Some(agreement_rate >= self.config.neighbor_agreement_threshold),
            detail: EvidenceDetail::Neighbors {
                agreement_rate,
                matching_reports: matching,
                total_reports: reports.len(),
                distinct_reporters: reporters.len(),
            },
        })
    }

    /// The claimant's own filings around the claim date. Never having filed
    /// anything is absence of evidence, not contradiction.
    fn self_report_evidence(
        &self,
        request: &ClaimRequest,
        reports: Option<&[WeatherReport]>,
    ) -> Option<EvidenceItem> {
        let reports = reports?;
        if reports.is_empty() {
            return None;
        }
        let matching = reports
            .iter()
            .filter(|report| {
                request
                    .claim_type
                    .matching_conditions()
                    .contains(&report.condition)
            })
            .count();
        Some(EvidenceItem {
            source: SourceKind::SelfReports,
            observed_at: Some(request.claim_date),
            supports_claim: Some(matching >= 1),
            detail: EvidenceDetail::SelfReports {
                matching_reports: matching,
                total_reports: reports.len(),
            },
        })
    }
}

fn support_input(name: &'static str, weight: f64, item: &Option<EvidenceItem>) -> WeightedInput {
    WeightedInput {
        name,
        weight,
        value: item.as_ref().and_then(|item| {
            item.supports_claim
                .map(|supports| if supports { 100.0 } else { 0.0 })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ClaimEngine {
        ClaimEngine::new(ClaimConfig::default())
    }

    fn drought_request() -> ClaimRequest {
        ClaimRequest {
            farmer_id: FarmerId("farmer-1".to_string()),
            farm_id: FarmId("farm-1".to_string()),
            claim_type: ClaimType::Drought,
            claim_date: NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date"),
        }
    }

    fn neighbor_report(farmer: &str, condition: WeatherCondition) -> WeatherReport {
        WeatherReport {
            farmer_id: FarmerId(farmer.to_string()),
            farm_id: FarmId(format!("farm-{farmer}")),
            condition,
            reported_on: NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date"),
            corroborated: false,
        }
    }

    #[test]
    fn future_claim_is_malformed() {
        let mut request = drought_request();
        request.claim_date = NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date");
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");
        match engine().validate(&request, today) {
            Err(DecisionError::MalformedInput { reason }) => {
                assert!(reason.contains("future"), "{reason}");
            }
            other => panic!("expected malformed input, got {other:?}"),
        }
    }

    #[test]
    fn stale_claim_is_malformed() {
        let request = drought_request();
        let today = NaiveDate::from_ymd_opt(2027, 4, 1).expect("valid date");
        assert!(matches!(
            engine().validate(&request, today),
            Err(DecisionError::MalformedInput { .. })
        ));
    }

    #[test]
    fn fully_corroborated_drought_is_a_strong_approve() {
        let request = drought_request();
        let inputs = ClaimInputs {
            scan: Some(SatelliteScan {
                farm_id: request.farm_id.clone(),
                scan_date: request.claim_date,
                ndvi_mean: Some(0.22),
                sar_vv_mean_db: None,
            }),
            neighbor_reports: Some(vec![
                neighbor_report("n1", WeatherCondition::Clear),
                neighbor_report("n2", WeatherCondition::Clear),
                neighbor_report("n3", WeatherCondition::Cloudy),
            ]),
            own_reports: Some(vec![neighbor_report("farmer-1", WeatherCondition::Clear)]),
        };

        let verdict = engine().verify(&request, &inputs).expect("verdict");
        assert!((verdict.confidence - 100.0).abs() < 1e-9);
        assert_eq!(verdict.recommendation, Recommendation::ApproveStrong);
        assert_eq!(verdict.evidence.len(), 3);
    }

    #[test]
    fn missing_satellite_redistributes_weight() {
        let request = drought_request();
        let inputs = ClaimInputs {
            scan: None,
            neighbor_reports: Some(vec![
                neighbor_report("n1", WeatherCondition::Clear),
                neighbor_report("n2", WeatherCondition::Clear),
                neighbor_report("n3", WeatherCondition::Storm),
            ]),
            own_reports: Some(vec![neighbor_report("farmer-1", WeatherCondition::Storm)]),
        };

        // Neighbors support (2/3 agreement), own report contradicts. With the
        // satellite dark: 0.4/0.7 * 100 + 0.3/0.7 * 0 = 57.14.
        let verdict = engine().verify(&request, &inputs).expect("verdict");
        assert!((verdict.confidence - 400.0 / 7.0).abs() < 1e-9);
        assert_eq!(verdict.recommendation, Recommendation::Investigate);
    }

    #[test]
    fn storm_claims_never_use_satellite() {
        let mut request = drought_request();
        request.claim_type = ClaimType::Storm;
        let inputs = ClaimInputs {
            scan: Some(SatelliteScan {
                farm_id: request.farm_id.clone(),
                scan_date: request.claim_date,
                ndvi_mean: Some(0.10),
                sar_vv_mean_db: Some(-20.0),
            }),
            neighbor_reports: Some(vec![
                neighbor_report("n1", WeatherCondition::Storm),
                neighbor_report("n2", WeatherCondition::Windy),
                neighbor_report("n3", WeatherCondition::Storm),
            ]),
            own_reports: None,
        };

        let verdict = engine().verify(&request, &inputs).expect("verdict");
        assert!(verdict
            .evidence
            .iter()
            .all(|item| item.source != SourceKind::Satellite));
        assert!((verdict.confidence - 100.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_distinct_reporters_marks_neighbors_unavailable() {
        let request = drought_request();
        // Three reports but only two distinct reporters.
        let inputs = ClaimInputs {
            scan: None,
            neighbor_reports: Some(vec![
                neighbor_report("n1", WeatherCondition::Clear),
                neighbor_report("n1", WeatherCondition::Clear),
                neighbor_report("n2", WeatherCondition::Clear),
            ]),
            own_reports: Some(vec![neighbor_report("farmer-1", WeatherCondition::Clear)]),
        };

        let verdict = engine().verify(&request, &inputs).expect("verdict");
        assert!(verdict
            .evidence
            .iter()
            .all(|item| item.source != SourceKind::Neighbors));
        // Only the self-report carries the verdict.
        assert!((verdict.confidence - 100.0).abs() < 1e-9);
    }

    #[test]
    fn all_sources_dark_is_insufficient_evidence() {
        let request = drought_request();
        let inputs = ClaimInputs {
            scan: None,
            neighbor_reports: Some(Vec::new()),
            own_reports: Some(Vec::new()),
        };
        assert!(matches!(
            engine().verify(&request, &inputs),
            Err(DecisionError::InsufficientEvidence { .. })
        ));
    }

    #[test]
    fn contradicted_claim_is_rejected() {
        let request = drought_request();
        let inputs = ClaimInputs {
            scan: Some(SatelliteScan {
                farm_id: request.farm_id.clone(),
                scan_date: request.claim_date,
                ndvi_mean: Some(0.65),
                sar_vv_mean_db: None,
            }),
            neighbor_reports: Some(vec![
                neighbor_report("n1", WeatherCondition::HeavyRain),
                neighbor_report("n2", WeatherCondition::HeavyRain),
                neighbor_report("n3", WeatherCondition::Storm),
            ]),
            own_reports: Some(vec![neighbor_report(
                "farmer-1",
                WeatherCondition::HeavyRain,
            )]),
        };

        let verdict = engine().verify(&request, &inputs).expect("verdict");
        assert!((verdict.confidence - 0.0).abs() < 1e-9);
        assert_eq!(verdict.recommendation, Recommendation::Reject);
    }
}
