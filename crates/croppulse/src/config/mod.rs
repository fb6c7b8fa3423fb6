use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut engine = EngineConfig::default();
        if let Ok(raw) = env::var("APP_EVIDENCE_TIMEOUT_MS") {
            let millis = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout)?;
            engine.evidence_timeout = Duration::from_millis(millis);
        }
        engine.validate()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// All weights and thresholds the decision engines run with.
///
/// Weight sets are validated once here, at configuration time; the engines
/// assume every set they receive sums to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub credit: CreditConfig,
    pub claims: ClaimConfig,
    pub logistics: LogisticsConfig,
    /// Per-call budget for a single evidence-adapter fetch. A source that
    /// does not answer within this window is treated as unavailable.
    pub evidence_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            credit: CreditConfig::default(),
            claims: ClaimConfig::default(),
            logistics: LogisticsConfig::default(),
            evidence_timeout: Duration::from_millis(2_000),
        }
    }
}

impl EngineConfig {
    /// Reject weight sets that do not sum to 1.0. Called at load/construction
    /// time so a bad deployment fails before serving any request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight_sum(
            "credit.traditional",
            &[
                self.credit.traditional_weights.farm_size,
                self.credit.traditional_weights.crop_health,
                self.credit.traditional_weights.climate_risk,
                self.credit.traditional_weights.payment_history,
                self.credit.traditional_weights.deforestation,
            ],
        )?;
        check_weight_sum(
            "credit.pillars",
            &[
                self.credit.pillar_weights.traditional,
                self.credit.pillar_weights.action,
                self.credit.pillar_weights.ground_truth,
            ],
        )?;
        check_weight_sum(
            "claims.sources",
            &[
                self.claims.source_weights.satellite,
                self.claims.source_weights.neighbors,
                self.claims.source_weights.self_reports,
            ],
        )?;
        Ok(())
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn check_weight_sum(set: &'static str, weights: &[f64]) -> Result<(), ConfigError> {
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::InvalidWeightConfiguration { set, total });
    }
    Ok(())
}

/// Credit scorer weights and lookback settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditConfig {
    pub traditional_weights: TraditionalWeights,
    pub pillar_weights: PillarWeights,
    /// Reports per rolling year that earn full frequency credit.
    pub full_frequency_reports: u32,
    /// How far back to look for a usable satellite scan.
    pub scan_lookback_days: i64,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            traditional_weights: TraditionalWeights::default(),
            pillar_weights: PillarWeights::default(),
            full_frequency_reports: 12,
            scan_lookback_days: 90,
        }
    }
}

/// Weights over the five traditional risk indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct TraditionalWeights {
    pub farm_size: f64,
    pub crop_health: f64,
    pub climate_risk: f64,
    pub payment_history: f64,
    pub deforestation: f64,
}

impl Default for TraditionalWeights {
    fn default() -> Self {
        Self {
            farm_size: 0.15,
            crop_health: 0.25,
            climate_risk: 0.20,
            payment_history: 0.25,
            deforestation: 0.15,
        }
    }
}

/// Weights over the three composite pillars.
#[derive(Debug, Clone, PartialEq)]
pub struct PillarWeights {
    pub traditional: f64,
    pub action: f64,
    pub ground_truth: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            traditional: 0.40,
            action: 0.30,
            ground_truth: 0.30,
        }
    }
}

/// Claim verification thresholds and evidence windows.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimConfig {
    pub source_weights: ClaimSourceWeights,
    /// Satellite scans are considered within +/- this many days of the claim.
    pub scan_window_days: i64,
    /// Neighbor reports are considered within +/- this many days of the claim.
    pub neighbor_window_days: i64,
    /// The claimant's own reports are considered within +/- this many days.
    pub self_report_window_days: i64,
    /// How many nearby farms to poll for corroboration.
    pub neighbor_limit: usize,
    /// Collusion deterrent: fewer distinct reporters than this marks the
    /// neighbor source unavailable rather than letting one or two accomplices
    /// carry 40% of the verdict.
    pub min_neighbor_reporters: usize,
    /// Fraction of neighbor reports that must match the claimed condition.
    pub neighbor_agreement_threshold: f64,
    /// NDVI below this supports a drought claim.
    pub drought_ndvi_threshold: f64,
    /// SAR VV backscatter (dB) below this supports a flood claim.
    pub flood_sar_threshold_db: f64,
    /// Claims older than this are rejected before any evidence fetch.
    pub max_claim_age_days: i64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            source_weights: ClaimSourceWeights::default(),
            scan_window_days: 7,
            neighbor_window_days: 3,
            self_report_window_days: 7,
            neighbor_limit: 10,
            min_neighbor_reporters: 3,
            neighbor_agreement_threshold: 0.5,
            drought_ndvi_threshold: 0.30,
            flood_sar_threshold_db: -15.0,
            max_claim_age_days: 365,
        }
    }
}

/// Weights over the three claim evidence sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSourceWeights {
    pub satellite: f64,
    pub neighbors: f64,
    pub self_reports: f64,
}

impl Default for ClaimSourceWeights {
    fn default() -> Self {
        Self {
            satellite: 0.30,
            neighbors: 0.40,
            self_reports: 0.30,
        }
    }
}

/// Harvest window, road risk, and loss projection thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticsConfig {
    pub min_forecast_days: usize,
    /// A day qualifies for harvest when rainfall is below this (mm).
    pub harvest_max_rainfall_mm: f64,
    pub harvest_min_temp_c: f64,
    pub harvest_max_temp_c: f64,
    pub harvest_max_humidity_pct: f64,
    /// Cumulative forecast rainfall above this marks road risk HIGH.
    pub road_high_rainfall_mm: f64,
    /// Cumulative forecast rainfall at or above this marks road risk MEDIUM.
    pub road_medium_rainfall_mm: f64,
    /// Accumulated rainfall at which rural roads become impassable. Closure
    /// horizon is derived from how fast the forecast reaches this.
    pub road_saturation_mm: f64,
    /// Post-harvest loss per day of delay, percent.
    pub base_loss_rate_pct_per_day: f64,
    pub humidity_loss_bonus: f64,
    pub rainfall_loss_bonus: f64,
    pub loss_humidity_threshold_pct: f64,
    pub loss_rainfall_threshold_mm: f64,
    pub max_loss_pct: f64,
    /// CRITICAL urgency requires closure within this many days...
    pub critical_closure_days: u32,
    /// ...and a loss slope steeper than this (percent per day).
    pub critical_loss_slope_pct_per_day: f64,
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            min_forecast_days: 7,
            harvest_max_rainfall_mm: 5.0,
            harvest_min_temp_c: 20.0,
            harvest_max_temp_c: 30.0,
            harvest_max_humidity_pct: 80.0,
            road_high_rainfall_mm: 100.0,
            road_medium_rainfall_mm: 50.0,
            road_saturation_mm: 35.0,
            base_loss_rate_pct_per_day: 2.0,
            humidity_loss_bonus: 0.5,
            rainfall_loss_bonus: 0.3,
            loss_humidity_threshold_pct: 80.0,
            loss_rainfall_threshold_mm: 50.0,
            max_loss_pct: 50.0,
            critical_closure_days: 2,
            critical_loss_slope_pct_per_day: 3.0,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidTimeout,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWeightConfiguration { set: &'static str, total: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidTimeout => {
                write!(f, "APP_EVIDENCE_TIMEOUT_MS must be a valid millisecond count")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidWeightConfiguration { set, total } => {
                write!(f, "weight set '{set}' sums to {total}, expected 1.0")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_EVIDENCE_TIMEOUT_MS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine.evidence_timeout, Duration::from_millis(2_000));
    }

    #[test]
    fn evidence_timeout_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_EVIDENCE_TIMEOUT_MS", "750");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.engine.evidence_timeout, Duration::from_millis(750));
        reset_env();
    }

    #[test]
    fn default_engine_weights_validate() {
        EngineConfig::default().validate().expect("defaults sum to 1.0");
    }

    #[test]
    fn skewed_weight_set_is_rejected() {
        let mut config = EngineConfig::default();
        config.claims.source_weights.satellite = 0.50;
        match config.validate() {
            Err(ConfigError::InvalidWeightConfiguration { set, total }) => {
                assert_eq!(set, "claims.sources");
                assert!((total - 1.2).abs() < 1e-9);
            }
            other => panic!("expected invalid weight configuration, got {other:?}"),
        }
    }
}
