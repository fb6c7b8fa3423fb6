//! Normalization of raw evidence into 0-100 sub-factor scores.
//!
//! Functions returning `Option` yield `None` when the underlying record set
//! is empty; the caller redistributes that factor's weight instead of
//! substituting a neutral value.

use crate::evidence::{ActionHistory, PaymentHistory, ReportingHistory};

/// Larger plots indicate more established operations.
pub(crate) fn farm_size_score(acres: f64) -> f64 {
    if acres >= 10.0 {
        100.0
    } else if acres >= 5.0 {
        90.0
    } else if acres >= 2.5 {
        80.0
    } else if acres >= 1.5 {
        70.0
    } else if acres >= 1.0 {
        60.0
    } else if acres >= 0.5 {
        50.0
    } else {
        40.0
    }
}

/// NDVI banding: dense healthy vegetation scores high, stressed or bare
/// ground bottoms out at 50 (low vigor is weak evidence, not proof of ruin).
pub(crate) fn crop_health_score(ndvi: f64) -> f64 {
    if ndvi >= 0.80 {
        100.0
    } else if ndvi >= 0.75 {
        95.0
    } else if ndvi >= 0.70 {
        90.0
    } else if ndvi >= 0.65 {
        85.0
    } else if ndvi >= 0.60 {
        80.0
    } else if ndvi >= 0.55 {
        75.0
    } else if ndvi >= 0.50 {
        70.0
    } else if ndvi >= 0.45 {
        65.0
    } else if ndvi >= 0.40 {
        60.0
    } else if ndvi >= 0.35 {
        55.0
    } else {
        50.0
    }
}

/// Climate risk is inverted: a benign location scores high.
pub(crate) fn climate_risk_score(risk: f64) -> f64 {
    (100.0 - risk).clamp(0.0, 100.0)
}

/// On-time installments earn full credit, late-but-paid 70%. `None` when no
/// installment was ever scheduled.
pub(crate) fn payment_history_score(payments: &PaymentHistory) -> Option<f64> {
    if payments.total == 0 {
        return None;
    }
    let weighted = f64::from(payments.on_time) + f64::from(payments.late_paid) * 0.7;
    Some((weighted / f64::from(payments.total) * 100.0).min(100.0))
}

/// Deforestation is a binary disqualifier for the indicator.
pub(crate) fn deforestation_score(detected: bool) -> f64 {
    if detected {
        0.0
    } else {
        100.0
    }
}

/// Verified-action pillar: verification rate plus diversity and consistency
/// bonuses. `None` when the farmer never submitted an action.
pub(crate) fn action_score(history: &ActionHistory) -> Option<f64> {
    if history.submitted == 0 {
        return None;
    }
    let verification_rate =
        f64::from(history.verified) / f64::from(history.submitted) * 100.0;
    let diversity_bonus = (f64::from(history.distinct_verified_types) * 5.0).min(20.0);
    let consistency_bonus = (f64::from(history.active_months) * 3.0).min(15.0);
    Some((verification_rate * 0.65 + diversity_bonus + consistency_bonus).min(100.0))
}

/// Ground-truth pillar: reporting frequency (full credit at
/// `full_frequency_reports` per rolling year) blended with corroboration
/// accuracy. `None` when the farmer never filed a report.
pub(crate) fn ground_truth_score(history: &ReportingHistory, full_frequency: u32) -> Option<f64> {
    if history.submitted == 0 {
        return None;
    }
    let frequency =
        (f64::from(history.submitted) / f64::from(full_frequency) * 100.0).min(100.0);
    let accuracy = f64::from(history.corroborated) / f64::from(history.submitted) * 100.0;
    Some(frequency * 0.4 + accuracy * 0.6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farm_size_bands() {
        assert_eq!(farm_size_score(12.0), 100.0);
        assert_eq!(farm_size_score(5.0), 90.0);
        assert_eq!(farm_size_score(2.5), 80.0);
        assert_eq!(farm_size_score(1.0), 60.0);
        assert_eq!(farm_size_score(0.3), 40.0);
    }

    #[test]
    fn crop_health_bands() {
        assert_eq!(crop_health_score(0.85), 100.0);
        assert_eq!(crop_health_score(0.75), 95.0);
        assert_eq!(crop_health_score(0.60), 80.0);
        assert_eq!(crop_health_score(0.40), 60.0);
        assert_eq!(crop_health_score(0.20), 50.0);
    }

    #[test]
    fn payment_history_weights_late_payments() {
        let payments = PaymentHistory {
            on_time: 8,
            late_paid: 2,
            total: 10,
        };
        let score = payment_history_score(&payments).expect("has installments");
        assert!((score - 94.0).abs() < 1e-9);

        assert!(payment_history_score(&PaymentHistory::default()).is_none());
    }

    #[test]
    fn action_score_applies_capped_bonuses() {
        let history = ActionHistory {
            submitted: 10,
            verified: 8,
            distinct_verified_types: 6,
            active_months: 7,
        };
        // 80% rate * 0.65 + min(20, 30) + min(15, 21) = 52 + 20 + 15 = 87.
        let score = action_score(&history).expect("has submissions");
        assert!((score - 87.0).abs() < 1e-9);
    }

    #[test]
    fn action_score_zero_when_nothing_verified() {
        let history = ActionHistory {
            submitted: 4,
            verified: 0,
            distinct_verified_types: 0,
            active_months: 0,
        };
        let score = action_score(&history).expect("submitted actions count");
        assert_eq!(score, 0.0);
        assert!(action_score(&ActionHistory::default()).is_none());
    }

    #[test]
    fn ground_truth_blends_frequency_and_accuracy() {
        let history = ReportingHistory {
            submitted: 6,
            corroborated: 3,
        };
        // frequency 50, accuracy 50 -> 0.4*50 + 0.6*50 = 50.
        let score = ground_truth_score(&history, 12).expect("has reports");
        assert!((score - 50.0).abs() < 1e-9);

        let frequent = ReportingHistory {
            submitted: 24,
            corroborated: 24,
        };
        let score = ground_truth_score(&frequent, 12).expect("has reports");
        assert!((score - 100.0).abs() < 1e-9);

        assert!(ground_truth_score(&ReportingHistory::default(), 12).is_none());
    }
}
