//! Harvest assessment behavior over the in-memory adapters.

use std::sync::Arc;

use chrono::NaiveDate;
use croppulse::config::EngineConfig;
use croppulse::engines::credit::ledger::InMemoryScoreLedger;
use croppulse::engines::logistics::{RoadRiskLevel, Urgency};
use croppulse::error::DecisionError;
use croppulse::evidence::memory::InMemoryEvidenceStore;
use croppulse::evidence::{DailyForecast, FarmId};
use croppulse::service::DecisionService;

type TestService = DecisionService<
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryEvidenceStore,
    InMemoryScoreLedger,
>;

fn service_over(store: Arc<InMemoryEvidenceStore>) -> TestService {
    DecisionService::new(
        EngineConfig::default(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        Arc::new(InMemoryScoreLedger::new()),
    )
    .expect("default config validates")
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date")
}

fn forecast_week(daily: impl Fn(usize) -> (f64, f64, f64)) -> Vec<DailyForecast> {
    (0..7)
        .map(|offset| {
            let (rainfall_mm, temperature_c, humidity_pct) = daily(offset);
            DailyForecast {
                date: start() + chrono::Duration::days(offset as i64),
                rainfall_mm,
                temperature_c,
                humidity_pct,
            }
        })
        .collect()
}

#[tokio::test]
async fn clear_week_recommends_immediate_harvest() {
    let store = Arc::new(InMemoryEvidenceStore::new());
    let farm = FarmId("farm-1".to_string());
    store.insert_forecast(farm.clone(), forecast_week(|_| (0.5, 24.0, 55.0)));
    let service = service_over(store);

    let assessment = service.assess_harvest(&farm).await.expect("assessment");
    assert_eq!(assessment.optimal_date, Some(start()));
    assert_eq!(assessment.window.len(), 7);
    assert_eq!(assessment.road_risk.level, RoadRiskLevel::Low);
    assert_eq!(assessment.projected_loss_pct, 0.0);
    assert_eq!(assessment.urgency, Urgency::Low);
}

#[tokio::test]
async fn saturating_rain_turns_critical() {
    let store = Arc::new(InMemoryEvidenceStore::new());
    let farm = FarmId("farm-1".to_string());
    // ~120 mm across the week, humid throughout, nothing harvestable.
    store.insert_forecast(farm.clone(), forecast_week(|_| (120.0 / 7.0, 27.0, 86.0)));
    let service = service_over(store);

    let assessment = service.assess_harvest(&farm).await.expect("assessment");
    assert_eq!(assessment.road_risk.level, RoadRiskLevel::High);
    assert_eq!(assessment.road_risk.days_until_closure, Some(2));
    assert_eq!(assessment.optimal_date, None);
    assert_eq!(assessment.urgency, Urgency::Critical);
    // 2%/day * 7 days * (1 + 0.5 + 0.3).
    assert!((assessment.projected_loss_pct - 25.2).abs() < 1e-9);
    assert!(assessment
        .recommendations
        .iter()
        .any(|line| line.contains("impassable")));
}

#[tokio::test]
async fn delayed_window_accrues_loss() {
    let store = Arc::new(InMemoryEvidenceStore::new());
    let farm = FarmId("farm-1".to_string());
    // Wet and humid for three days, one clear harvest day, then humid again.
    store.insert_forecast(
        farm.clone(),
        forecast_week(|offset| match offset {
            0..=2 => (20.0, 26.0, 85.0),
            3 => (0.0, 25.0, 70.0),
            _ => (0.0, 25.0, 95.0),
        }),
    );
    let service = service_over(store);

    let assessment = service.assess_harvest(&farm).await.expect("assessment");
    assert_eq!(
        assessment.optimal_date,
        Some(start() + chrono::Duration::days(3))
    );
    // The later humid days break the run: only one committable day.
    assert_eq!(assessment.window.len(), 1);
    // 60 mm cumulative, avg humidity above 80: 2.0 * 3 * 1.8 = 10.8.
    assert!((assessment.projected_loss_pct - 10.8).abs() < 1e-9);
    assert_eq!(assessment.road_risk.level, RoadRiskLevel::Medium);
    assert_eq!(assessment.urgency, Urgency::High);
}

#[tokio::test]
async fn short_forecast_is_a_hard_error() {
    let store = Arc::new(InMemoryEvidenceStore::new());
    let farm = FarmId("farm-1".to_string());
    store.insert_forecast(
        farm.clone(),
        forecast_week(|_| (0.0, 25.0, 60.0))
            .into_iter()
            .take(3)
            .collect(),
    );
    let service = service_over(store);

    match service.assess_harvest(&farm).await {
        Err(DecisionError::MissingForecast {
            farm_id,
            got,
            required,
        }) => {
            assert_eq!(farm_id, farm);
            assert_eq!(got, 3);
            assert_eq!(required, 7);
        }
        other => panic!("expected missing forecast, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_farm_has_no_forecast() {
    let store = Arc::new(InMemoryEvidenceStore::new());
    let service = service_over(store);
    let farm = FarmId("farm-unknown".to_string());

    assert!(matches!(
        service.assess_harvest(&farm).await,
        Err(DecisionError::MissingForecast { got: 0, .. })
    ));
}
