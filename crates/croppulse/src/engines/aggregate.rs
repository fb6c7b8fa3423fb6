//! Weighted aggregation of partially available sub-factors.
//!
//! The one rule every engine shares: a missing source is never scored as
//! zero. Its weight is redistributed proportionally across whatever remains,
//! and only a fully dark evidence set fails the decision.

use serde::{Deserialize, Serialize};

/// A named sub-factor offered to the aggregator. `value` is `None` when the
/// backing source was unavailable (no data, timeout, out of window).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedInput {
    pub name: &'static str,
    pub weight: f64,
    pub value: Option<f64>,
}

impl WeightedInput {
    pub fn available(name: &'static str, weight: f64, value: f64) -> Self {
        Self {
            name,
            weight,
            value: Some(value),
        }
    }

    pub fn unavailable(name: &'static str, weight: f64) -> Self {
        Self {
            name,
            weight,
            value: None,
        }
    }
}

/// Per-factor breakdown of an aggregation, kept for auditability.
/// `effective_weight` is the configured weight after redistribution; it is
/// zero for factors that were unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub name: String,
    pub configured_weight: f64,
    pub effective_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub score: f64,
    pub contributions: Vec<FactorContribution>,
    /// True when at least one factor was unavailable and weight moved.
    pub redistributed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("no available sub-factor among [{}]", .attempted.join(", "))]
    InsufficientEvidence { attempted: Vec<String> },
}

/// Combine `(weight, value)` pairs into a single 0-100 score.
///
/// Available factors keep their relative proportions: each effective weight
/// is `weight / sum(available weights)`, so the effective weights of the
/// available set always sum to 1.0.
pub fn aggregate(inputs: &[WeightedInput]) -> Result<Aggregate, AggregationError> {
    let available_weight: f64 = inputs
        .iter()
        .filter(|input| input.value.is_some())
        .map(|input| input.weight)
        .sum();

    if available_weight <= 0.0 {
        return Err(AggregationError::InsufficientEvidence {
            attempted: inputs.iter().map(|input| input.name.to_string()).collect(),
        });
    }

    let mut score = 0.0;
    let mut redistributed = false;
    let mut contributions = Vec::with_capacity(inputs.len());

    for input in inputs {
        let effective_weight = match input.value {
            Some(value) => {
                let effective = input.weight / available_weight;
                score += effective * value;
                effective
            }
            None => {
                redistributed = true;
                0.0
            }
        };
        contributions.push(FactorContribution {
            name: input.name.to_string(),
            configured_weight: input.weight,
            effective_weight,
            value: input.value,
        });
    }

    Ok(Aggregate {
        score,
        contributions,
        redistributed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_factors() -> [(&'static str, f64); 5] {
        [
            ("farm_size", 0.15),
            ("crop_health", 0.25),
            ("climate_risk", 0.20),
            ("payment_history", 0.25),
            ("deforestation", 0.15),
        ]
    }

    #[test]
    fn full_availability_is_plain_weighted_sum() {
        let inputs = [
            WeightedInput::available("a", 0.4, 80.0),
            WeightedInput::available("b", 0.3, 60.0),
            WeightedInput::available("c", 0.3, 50.0),
        ];
        let outcome = aggregate(&inputs).expect("all available");
        assert!((outcome.score - 65.0).abs() < 1e-9);
        assert!(!outcome.redistributed);
    }

    #[test]
    fn missing_factor_redistributes_not_zeroes() {
        let inputs = [
            WeightedInput::unavailable("satellite", 0.3),
            WeightedInput::available("neighbors", 0.4, 100.0),
            WeightedInput::available("self_reports", 0.3, 100.0),
        ];
        let outcome = aggregate(&inputs).expect("two available");
        // Both remaining sources fully support; the missing satellite must
        // not drag the score below 100.
        assert!((outcome.score - 100.0).abs() < 1e-9);
        assert!(outcome.redistributed);

        let neighbors = &outcome.contributions[1];
        assert!((neighbors.effective_weight - 0.4 / 0.7).abs() < 1e-9);
    }

    #[test]
    fn no_available_factor_is_insufficient_evidence() {
        let inputs = [
            WeightedInput::unavailable("satellite", 0.3),
            WeightedInput::unavailable("neighbors", 0.4),
            WeightedInput::unavailable("self_reports", 0.3),
        ];
        match aggregate(&inputs) {
            Err(AggregationError::InsufficientEvidence { attempted }) => {
                assert_eq!(attempted, vec!["satellite", "neighbors", "self_reports"]);
            }
            other => panic!("expected insufficient evidence, got {other:?}"),
        }
    }

    #[test]
    fn effective_weights_sum_to_one_for_every_availability_subset() {
        // Exhaustive over all non-empty availability subsets of five factors.
        let factors = five_factors();
        for mask in 1_u32..(1 << factors.len()) {
            let inputs: Vec<WeightedInput> = factors
                .iter()
                .enumerate()
                .map(|(idx, (name, weight))| {
                    if mask & (1 << idx) != 0 {
                        WeightedInput::available(name, *weight, 50.0)
                    } else {
                        WeightedInput::unavailable(name, *weight)
                    }
                })
                .collect();

            let outcome = aggregate(&inputs).expect("at least one available");
            let total: f64 = outcome
                .contributions
                .iter()
                .map(|contribution| contribution.effective_weight)
                .sum();
            assert!(
                (total - 1.0).abs() < 1e-9,
                "mask {mask:b}: effective weights sum to {total}"
            );
            // Uniform inputs must aggregate to the input value regardless of
            // which subset was available.
            assert!((outcome.score - 50.0).abs() < 1e-9);
        }
    }
}
