//! In-memory evidence store backing tests, the demo CLI, and the default
//! service wiring. The scoring and verification logic must be runnable with
//! zero external integrations; this store is how.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::adapters::{
    ActionStore, FarmRegistry, ForecastStore, GroundTruthStore, SatelliteStore, SourceError,
};
use super::{
    ActionHistory, DailyForecast, DateWindow, FarmId, FarmProfile, FarmerId, ReportingHistory,
    SatelliteScan, WeatherReport,
};

/// One store implementing every adapter trait over seeded records.
#[derive(Default)]
pub struct InMemoryEvidenceStore {
    inner: Mutex<Records>,
}

#[derive(Default)]
struct Records {
    profiles: HashMap<FarmerId, FarmProfile>,
    scans: Vec<SatelliteScan>,
    reports: Vec<WeatherReport>,
    actions: HashMap<FarmerId, ActionHistory>,
    reporting: HashMap<FarmerId, ReportingHistory>,
    forecasts: HashMap<FarmId, Vec<DailyForecast>>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: FarmProfile) {
        let mut records = self.inner.lock().expect("evidence store mutex poisoned");
        records.profiles.insert(profile.farmer_id.clone(), profile);
    }

    pub fn insert_scan(&self, scan: SatelliteScan) {
        let mut records = self.inner.lock().expect("evidence store mutex poisoned");
        records.scans.push(scan);
    }

    pub fn insert_report(&self, report: WeatherReport) {
        let mut records = self.inner.lock().expect("evidence store mutex poisoned");
        records.reports.push(report);
    }

    pub fn insert_action_history(&self, farmer: FarmerId, history: ActionHistory) {
        let mut records = self.inner.lock().expect("evidence store mutex poisoned");
        records.actions.insert(farmer, history);
    }

    pub fn insert_reporting_history(&self, farmer: FarmerId, history: ReportingHistory) {
        let mut records = self.inner.lock().expect("evidence store mutex poisoned");
        records.reporting.insert(farmer, history);
    }

    pub fn insert_forecast(&self, farm: FarmId, series: Vec<DailyForecast>) {
        let mut records = self.inner.lock().expect("evidence store mutex poisoned");
        records.forecasts.insert(farm, series);
    }
}

#[async_trait]
impl FarmRegistry for InMemoryEvidenceStore {
    async fn farm_profile(&self, farmer: &FarmerId) -> Result<Option<FarmProfile>, SourceError> {
        let records = self.inner.lock().expect("evidence store mutex poisoned");
        Ok(records.profiles.get(farmer).cloned())
    }
}

#[async_trait]
impl SatelliteStore for InMemoryEvidenceStore {
    async fn latest_scan(
        &self,
        farm: &FarmId,
        window: DateWindow,
    ) -> Result<Option<SatelliteScan>, SourceError> {
        let records = self.inner.lock().expect("evidence store mutex poisoned");
        Ok(records
            .scans
            .iter()
            .filter(|scan| &scan.farm_id == farm && window.contains(scan.scan_date))
            .max_by_key(|scan| scan.scan_date)
            .cloned())
    }
}

#[async_trait]
impl GroundTruthStore for InMemoryEvidenceStore {
    async fn reports_by_farmer(
        &self,
        farmer: &FarmerId,
        window: DateWindow,
    ) -> Result<Vec<WeatherReport>, SourceError> {
        let records = self.inner.lock().expect("evidence store mutex poisoned");
        Ok(records
            .reports
            .iter()
            .filter(|report| &report.farmer_id == farmer && window.contains(report.reported_on))
            .cloned()
            .collect())
    }

    async fn reports_near_farm(
        &self,
        farm: &FarmId,
        limit: usize,
        window: DateWindow,
    ) -> Result<Vec<WeatherReport>, SourceError> {
        // The seeded store has no geography; "nearest" is every other farm,
        // capped at the caller's limit of distinct reporting farms.
        let records = self.inner.lock().expect("evidence store mutex poisoned");
        let mut reporting_farms: Vec<&FarmId> = Vec::new();
        let mut out = Vec::new();
        for report in &records.reports {
            if &report.farm_id == farm || !window.contains(report.reported_on) {
                continue;
            }
            if !reporting_farms.contains(&&report.farm_id) {
                if reporting_farms.len() >= limit {
                    continue;
                }
                reporting_farms.push(&report.farm_id);
            }
            out.push(report.clone());
        }
        Ok(out)
    }

    async fn reporting_history(
        &self,
        farmer: &FarmerId,
    ) -> Result<ReportingHistory, SourceError> {
        let records = self.inner.lock().expect("evidence store mutex poisoned");
        Ok(records.reporting.get(farmer).copied().unwrap_or_default())
    }
}

#[async_trait]
impl ActionStore for InMemoryEvidenceStore {
    async fn action_history(&self, farmer: &FarmerId) -> Result<ActionHistory, SourceError> {
        let records = self.inner.lock().expect("evidence store mutex poisoned");
        Ok(records.actions.get(farmer).copied().unwrap_or_default())
    }
}

#[async_trait]
impl ForecastStore for InMemoryEvidenceStore {
    async fn forecast(
        &self,
        farm: &FarmId,
        days: usize,
    ) -> Result<Vec<DailyForecast>, SourceError> {
        let records = self.inner.lock().expect("evidence store mutex poisoned");
        let series = records.forecasts.get(farm).cloned().unwrap_or_default();
        Ok(series.into_iter().take(days).collect())
    }
}
