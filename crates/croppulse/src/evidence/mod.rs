//! Typed evidence model shared by the three decision engines.
//!
//! Every adapter returns values from the small closed set below; the dynamic
//! payloads of upstream systems are deliberately not representable here so a
//! verdict can always enumerate exactly what it was built from.

pub mod adapters;
pub mod memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for a registered farmer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmerId(pub String);

impl fmt::Display for FarmerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for a registered farm plot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmId(pub String);

impl fmt::Display for FarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of evidence origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Satellite,
    Neighbors,
    SelfReports,
    Actions,
    TraditionalFactor,
}

impl SourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            SourceKind::Satellite => "satellite",
            SourceKind::Neighbors => "neighbors",
            SourceKind::SelfReports => "self_reports",
            SourceKind::Actions => "actions",
            SourceKind::TraditionalFactor => "traditional_factor",
        }
    }
}

/// One piece of evidence as consumed by an aggregator, immutable once built.
///
/// `supports_claim` is populated for claim verification; credit evidence
/// leaves it unset. `detail` always carries enough raw data for a reviewer
/// to re-derive the engine's reading without the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_claim: Option<bool>,
    pub detail: EvidenceDetail,
}

/// Fixed-schema payload per evidence source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceDetail {
    Satellite {
        #[serde(skip_serializing_if = "Option::is_none")]
        ndvi_mean: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sar_vv_mean_db: Option<f64>,
    },
    Neighbors {
        agreement_rate: f64,
        matching_reports: usize,
        total_reports: usize,
        distinct_reporters: usize,
    },
    SelfReports {
        matching_reports: usize,
        total_reports: usize,
    },
    Actions {
        submitted: u32,
        verified: u32,
        distinct_verified_types: u32,
        active_months: u32,
    },
    TraditionalFactor {
        indicator: TraditionalIndicator,
        raw: f64,
        normalized: f64,
    },
}

/// The five indicators blended into the traditional credit pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraditionalIndicator {
    FarmSize,
    CropHealth,
    ClimateRisk,
    PaymentHistory,
    Deforestation,
}

impl TraditionalIndicator {
    pub const fn label(self) -> &'static str {
        match self {
            TraditionalIndicator::FarmSize => "farm_size",
            TraditionalIndicator::CropHealth => "crop_health",
            TraditionalIndicator::ClimateRisk => "climate_risk",
            TraditionalIndicator::PaymentHistory => "payment_history",
            TraditionalIndicator::Deforestation => "deforestation",
        }
    }
}

/// Inclusive date window used by evidence lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window of +/- `days` around `center`.
    pub fn around(center: NaiveDate, days: i64) -> Self {
        Self {
            start: center - chrono::Duration::days(days),
            end: center + chrono::Duration::days(days),
        }
    }

    /// Window covering the `days` before `end`, inclusive.
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Registry snapshot of a farm and its operator's traditional indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmProfile {
    pub farm_id: FarmId,
    pub farmer_id: FarmerId,
    pub size_acres: f64,
    pub crop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub climate_risk: Option<ClimateRiskIndicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deforestation: Option<DeforestationIndicator>,
    pub payments: PaymentHistory,
}

/// Modeled climate risk for the farm's location, 0 (benign) to 100 (severe).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateRiskIndicator {
    pub risk_score: f64,
    pub assessed_on: NaiveDate,
}

/// Latest deforestation compliance check for the plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeforestationIndicator {
    pub detected: bool,
    pub checked_on: NaiveDate,
}

/// Loan repayment tallies. `total` counts every scheduled installment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub on_time: u32,
    pub late_paid: u32,
    pub total: u32,
}

/// A completed satellite scan; stores only return completed scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteScan {
    pub farm_id: FarmId,
    pub scan_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndvi_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sar_vv_mean_db: Option<f64>,
}

/// Field-observed weather condition vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    LightRain,
    HeavyRain,
    Storm,
    Windy,
    VeryCold,
}

/// A ground-truth weather report filed by a farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub farmer_id: FarmerId,
    pub farm_id: FarmId,
    pub condition: WeatherCondition,
    pub reported_on: NaiveDate,
    /// Whether a later verification or satellite cross-check agreed.
    pub corroborated: bool,
}

/// Proof-of-action tallies over the engine's lookback window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionHistory {
    pub submitted: u32,
    pub verified: u32,
    pub distinct_verified_types: u32,
    /// Months with at least one verified action.
    pub active_months: u32,
}

/// Ground-truth reporting tallies over a rolling twelve months.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingHistory {
    pub submitted: u32,
    pub corroborated: u32,
}

/// One day of a forward-looking weather forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub rainfall_mm: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claim_evidence_serializes_with_a_kind_tag() {
        let item = EvidenceItem {
            source: SourceKind::Satellite,
            observed_at: Some(NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date")),
            supports_claim: Some(true),
            detail: EvidenceDetail::Satellite {
                ndvi_mean: Some(0.22),
                sar_vv_mean_db: None,
            },
        };

        let value = serde_json::to_value(&item).expect("serializes");
        assert_eq!(value["source"], json!("satellite"));
        assert_eq!(value["supports_claim"], json!(true));
        assert_eq!(value["detail"]["kind"], json!("satellite"));
        assert_eq!(value["detail"]["ndvi_mean"], json!(0.22));
        // Absent readings are omitted, not serialized as null.
        assert!(value["detail"].get("sar_vv_mean_db").is_none());
    }

    #[test]
    fn credit_evidence_omits_the_claim_only_fields() {
        let item = EvidenceItem {
            source: SourceKind::TraditionalFactor,
            observed_at: None,
            supports_claim: None,
            detail: EvidenceDetail::TraditionalFactor {
                indicator: TraditionalIndicator::FarmSize,
                raw: 3.2,
                normalized: 80.0,
            },
        };

        let value = serde_json::to_value(&item).expect("serializes");
        assert!(value.get("supports_claim").is_none());
        assert!(value.get("observed_at").is_none());
        assert_eq!(value["detail"]["indicator"], json!("farm_size"));

        let back: EvidenceItem = serde_json::from_value(value).expect("round-trips");
        assert_eq!(back, item);
    }
}
