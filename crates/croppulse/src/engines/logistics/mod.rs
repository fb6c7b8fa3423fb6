//! Harvest and transport risk assessment.
//!
//! Works entirely from a daily forecast: find the days suitable for
//! harvesting, project how fast rural roads degrade under the forecast
//! rainfall, estimate post-harvest loss for the implied delay, and rank how
//! urgently the farmer needs to act.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::LogisticsConfig;
use crate::error::DecisionError;
use crate::evidence::{DailyForecast, FarmId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadRiskLevel {
    Low,
    Medium,
    High,
}

impl RoadRiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RoadRiskLevel::Low => "low",
            RoadRiskLevel::Medium => "medium",
            RoadRiskLevel::High => "high",
        }
    }
}

/// Road degradation outlook over the forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadRisk {
    pub level: RoadRiskLevel,
    /// Days until accumulated rainfall is expected to make roads impassable.
    /// `None` when the forecast never reaches saturation pace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_closure: Option<u32>,
    pub cumulative_rainfall_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

/// Full assessment returned to the farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestAssessment {
    pub farm_id: FarmId,
    /// First day suitable for harvesting, if any in the horizon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_date: Option<NaiveDate>,
    /// Contiguous run of suitable days starting at the optimal date.
    pub window: Vec<NaiveDate>,
    pub road_risk: RoadRisk,
    /// Projected post-harvest loss if harvest happens on the optimal date
    /// (or at the end of the horizon when no day qualifies).
    pub projected_loss_pct: f64,
    pub urgency: Urgency,
    pub recommendations: Vec<String>,
}

pub struct LogisticsEngine {
    config: LogisticsConfig,
}

impl LogisticsEngine {
    pub fn new(config: LogisticsConfig) -> Self {
        Self { config }
    }

    pub fn min_forecast_days(&self) -> usize {
        self.config.min_forecast_days
    }

    pub fn assess(
        &self,
        farm_id: &FarmId,
        forecast: &[DailyForecast],
    ) -> Result<HarvestAssessment, DecisionError> {
        if forecast.len() < self.config.min_forecast_days {
            return Err(DecisionError::MissingForecast {
                farm_id: farm_id.clone(),
                got: forecast.len(),
                required: self.config.min_forecast_days,
            });
        }

        // The window is the unbroken run of suitable days starting at the
        // first one; later isolated dry days are not a plan the farmer can
        // commit to today.
        let window: Vec<NaiveDate> = match forecast
            .iter()
            .position(|day| self.suitable_for_harvest(day))
        {
            Some(first) => forecast[first..]
                .iter()
                .take_while(|day| self.suitable_for_harvest(day))
                .map(|day| day.date)
                .collect(),
            None => Vec::new(),
        };
        let optimal_date = window.first().copied();

        let road_risk = self.road_risk(forecast);

        // Delay until the optimal day, or the whole horizon when none fits.
        let delay_days = match optimal_date {
            Some(date) => forecast
                .iter()
                .position(|day| day.date == date)
                .unwrap_or(forecast.len()),
            None => forecast.len(),
        };

        let loss_slope = self.loss_slope(forecast, road_risk.cumulative_rainfall_mm);
        let projected_loss_pct =
            (loss_slope * delay_days as f64).min(self.config.max_loss_pct);

        let urgency = self.urgency(&road_risk, optimal_date.is_some(), loss_slope);
        let recommendations =
            self.recommendations(optimal_date, &road_risk, projected_loss_pct, urgency);

        Ok(HarvestAssessment {
            farm_id: farm_id.clone(),
            optimal_date,
            window,
            road_risk,
            projected_loss_pct,
            urgency,
            recommendations,
        })
    }

    fn suitable_for_harvest(&self, day: &DailyForecast) -> bool {
        day.rainfall_mm < self.config.harvest_max_rainfall_mm
            && day.temperature_c >= self.config.harvest_min_temp_c
            && day.temperature_c <= self.config.harvest_max_temp_c
            && day.humidity_pct < self.config.harvest_max_humidity_pct
    }

    fn road_risk(&self, forecast: &[DailyForecast]) -> RoadRisk {
        let cumulative: f64 = forecast.iter().map(|day| day.rainfall_mm).sum();
        let level = if cumulative > self.config.road_high_rainfall_mm {
            RoadRiskLevel::High
        } else if cumulative >= self.config.road_medium_rainfall_mm {
            RoadRiskLevel::Medium
        } else {
            RoadRiskLevel::Low
        };

        // At LOW the forecast never accumulates enough to close roads within
        // a meaningful horizon. Otherwise, closure arrives when rainfall at
        // the average daily pace reaches saturation.
        let days_until_closure = match level {
            RoadRiskLevel::Low => None,
            _ => {
                let avg_daily = cumulative / forecast.len() as f64;
                let days = (self.config.road_saturation_mm / avg_daily).round().max(1.0);
                Some(days as u32)
            }
        };

        RoadRisk {
            level,
            days_until_closure,
            cumulative_rainfall_mm: cumulative,
        }
    }

    /// Loss per day of delay: the base rate, worsened by humid spoilage
    /// conditions and wet handling conditions.
    fn loss_slope(&self, forecast: &[DailyForecast], cumulative_rainfall_mm: f64) -> f64 {
        let avg_humidity: f64 =
            forecast.iter().map(|day| day.humidity_pct).sum::<f64>() / forecast.len() as f64;

        let mut multiplier = 1.0;
        if avg_humidity > self.config.loss_humidity_threshold_pct {
            multiplier += self.config.humidity_loss_bonus;
        }
        if cumulative_rainfall_mm > self.config.loss_rainfall_threshold_mm {
            multiplier += self.config.rainfall_loss_bonus;
        }
        self.config.base_loss_rate_pct_per_day * multiplier
    }

    fn urgency(&self, road_risk: &RoadRisk, has_optimal: bool, loss_slope: f64) -> Urgency {
        let closing_soon = road_risk
            .days_until_closure
            .is_some_and(|days| days <= self.config.critical_closure_days);

        if closing_soon && loss_slope > self.config.critical_loss_slope_pct_per_day {
            Urgency::Critical
        } else if closing_soon || (road_risk.level == RoadRiskLevel::Medium && has_optimal) {
            Urgency::High
        } else if road_risk.level == RoadRiskLevel::Medium || !has_optimal {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    fn recommendations(
        &self,
        optimal_date: Option<NaiveDate>,
        road_risk: &RoadRisk,
        projected_loss_pct: f64,
        urgency: Urgency,
    ) -> Vec<String> {
        let mut out = Vec::new();
        match optimal_date {
            Some(date) => out.push(format!("Plan harvest for {date}, the first suitable day.")),
            None => out.push(
                "No suitable harvest day in the forecast; arrange covered storage or drying."
                    .to_string(),
            ),
        }
        if let Some(days) = road_risk.days_until_closure {
            out.push(format!(
                "Roads expected impassable in about {days} day(s) ({:.0} mm forecast); move produce to market early.",
                road_risk.cumulative_rainfall_mm
            ));
        }
        if projected_loss_pct > 0.0 {
            out.push(format!(
                "Projected post-harvest loss of {projected_loss_pct:.1}% at the current delay."
            ));
        }
        if urgency == Urgency::Critical {
            out.push("Act today: road closure and spoilage risks are compounding.".to_string());
        }
        out
    }
}
