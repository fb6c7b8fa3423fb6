//! Read-only adapter traits over externally owned data.
//!
//! The core never writes through these interfaces and holds no locks across
//! calls. Every call made by an engine goes through [`fetch_with_timeout`];
//! a slow or failing store degrades to "source unavailable" so that weight
//! redistribution, not a stuck request, absorbs the outage.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::{
    ActionHistory, DailyForecast, DateWindow, FarmId, FarmProfile, FarmerId, ReportingHistory,
    SatelliteScan, WeatherReport,
};

/// Failure of a single evidence source. Recoverable: the aggregator
/// redistributes the source's weight unless no source is left.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("evidence fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Farm/record registry: traditional indicators by farmer.
#[async_trait]
pub trait FarmRegistry: Send + Sync {
    async fn farm_profile(&self, farmer: &FarmerId) -> Result<Option<FarmProfile>, SourceError>;
}

/// Satellite-index store over already-computed scan indices.
#[async_trait]
pub trait SatelliteStore: Send + Sync {
    /// Most recent completed scan for the farm within the window, if any.
    async fn latest_scan(
        &self,
        farm: &FarmId,
        window: DateWindow,
    ) -> Result<Option<SatelliteScan>, SourceError>;
}

/// Ground-truth weather report store.
#[async_trait]
pub trait GroundTruthStore: Send + Sync {
    async fn reports_by_farmer(
        &self,
        farmer: &FarmerId,
        window: DateWindow,
    ) -> Result<Vec<WeatherReport>, SourceError>;

    /// Reports filed from the nearest `limit` registered farms, excluding the
    /// given farm itself.
    async fn reports_near_farm(
        &self,
        farm: &FarmId,
        limit: usize,
        window: DateWindow,
    ) -> Result<Vec<WeatherReport>, SourceError>;

    /// Rolling twelve-month reporting tallies for a farmer.
    async fn reporting_history(&self, farmer: &FarmerId)
        -> Result<ReportingHistory, SourceError>;
}

/// Proof-of-action store.
#[async_trait]
pub trait ActionStore: Send + Sync {
    async fn action_history(&self, farmer: &FarmerId) -> Result<ActionHistory, SourceError>;
}

/// Forecast store keyed by farm location.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    async fn forecast(&self, farm: &FarmId, days: usize)
        -> Result<Vec<DailyForecast>, SourceError>;
}

/// Bound an adapter call by the configured per-request budget.
pub async fn fetch_with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_converts_to_source_error() {
        let result: Result<(), SourceError> =
            fetch_with_timeout(Duration::from_millis(5), async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            })
            .await;

        match result {
            Err(SourceError::Timeout(limit)) => {
                assert_eq!(limit, Duration::from_millis(5));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fast_fetch_passes_through() {
        let result = fetch_with_timeout(Duration::from_millis(50), async { Ok(7_u32) }).await;
        assert_eq!(result.expect("fetch succeeds"), 7);
    }
}
