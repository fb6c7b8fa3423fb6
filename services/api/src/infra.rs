use chrono::NaiveDate;
use croppulse::config::{ConfigError, EngineConfig};
use croppulse::engines::credit::ledger::InMemoryScoreLedger;
use croppulse::evidence::memory::InMemoryEvidenceStore;
use croppulse::evidence::{
    ActionHistory, ClimateRiskIndicator, DailyForecast, DeforestationIndicator, FarmId,
    FarmProfile, FarmerId, PaymentHistory, ReportingHistory, SatelliteScan, WeatherCondition,
    WeatherReport,
};
use croppulse::service::DecisionService;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The concrete service wired over the in-memory store. External integrations
/// swap in their own adapter implementations without touching the routes.
pub(crate) type ApiDecisionService = DecisionService<
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryScoreLedger,
>;

pub(crate) fn build_service(
    config: EngineConfig,
    store: Arc<InMemoryEvidenceStore>,
) -> Result<Arc<ApiDecisionService>, ConfigError> {
    let service = DecisionService::new(
        config,
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        Arc::new(InMemoryScoreLedger::new()),
    )?;
    Ok(Arc::new(service))
}

/// Seed a representative dataset: one well-documented farmer, one thin-file
/// farmer, a drought event with neighbor corroboration, and a wet forecast.
pub(crate) fn seed_fixtures(store: &InMemoryEvidenceStore, today: NaiveDate) {
    let amara = FarmerId("amara-okello".to_string());
    let amara_farm = FarmId("farm-0001".to_string());
    store.insert_profile(FarmProfile {
        farm_id: amara_farm.clone(),
        farmer_id: amara.clone(),
        size_acres: 3.2,
        crop: "maize".to_string(),
        climate_risk: Some(ClimateRiskIndicator {
            risk_score: 35.0,
            assessed_on: today - chrono::Duration::days(21),
        }),
        deforestation: Some(DeforestationIndicator {
            detected: false,
            checked_on: today - chrono::Duration::days(40),
        }),
        payments: PaymentHistory {
            on_time: 9,
            late_paid: 2,
            total: 12,
        },
    });
    store.insert_scan(SatelliteScan {
        farm_id: amara_farm.clone(),
        scan_date: today - chrono::Duration::days(4),
        ndvi_mean: Some(0.24),
        sar_vv_mean_db: Some(-9.5),
    });
    store.insert_action_history(
        amara.clone(),
        ActionHistory {
            submitted: 14,
            verified: 11,
            distinct_verified_types: 5,
            active_months: 8,
        },
    );
    store.insert_reporting_history(
        amara.clone(),
        ReportingHistory {
            submitted: 10,
            corroborated: 9,
        },
    );
    store.insert_report(WeatherReport {
        farmer_id: amara.clone(),
        farm_id: amara_farm.clone(),
        condition: WeatherCondition::Clear,
        reported_on: today - chrono::Duration::days(3),
        corroborated: false,
    });

    // Neighbors corroborating the dry spell around Amara's farm.
    for (idx, condition) in [
        WeatherCondition::Clear,
        WeatherCondition::Clear,
        WeatherCondition::Cloudy,
        WeatherCondition::Clear,
    ]
    .into_iter()
    .enumerate()
    {
        store.insert_report(WeatherReport {
            farmer_id: FarmerId(format!("neighbor-{idx}")),
            farm_id: FarmId(format!("farm-10{idx}")),
            condition,
            reported_on: today - chrono::Duration::days(3),
            corroborated: true,
        });
    }

    // Thin-file farmer: registered, no satellite coverage, no history yet.
    let kwame = FarmerId("kwame-mensah".to_string());
    store.insert_profile(FarmProfile {
        farm_id: FarmId("farm-0002".to_string()),
        farmer_id: kwame,
        size_acres: 1.1,
        crop: "cassava".to_string(),
        climate_risk: None,
        deforestation: None,
        payments: PaymentHistory::default(),
    });

    // A week of worsening rain for the harvest assessment.
    let rainfall = [2.0, 8.0, 15.0, 22.0, 30.0, 25.0, 18.0];
    store.insert_forecast(
        amara_farm,
        rainfall
            .iter()
            .enumerate()
            .map(|(offset, rain)| DailyForecast {
                date: today + chrono::Duration::days(offset as i64),
                rainfall_mm: *rain,
                temperature_c: 26.0,
                humidity_pct: 84.0,
            })
            .collect(),
    );
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
