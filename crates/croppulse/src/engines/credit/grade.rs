use serde::{Deserialize, Serialize};

/// Letter grade banding over the 0-1000 composite score.
///
/// Bands are half-open integer intervals with no gaps: every integer in
/// 0..=1000 maps to exactly one grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(value: u16) -> Self {
        match value {
            800..=1000 => Grade::A,
            700..=799 => Grade::B,
            600..=699 => Grade::C,
            500..=599 => Grade::D,
            _ => Grade::F,
        }
    }

    /// Headline lending rate for the band; `None` marks the subject
    /// ineligible.
    pub const fn interest_rate_pct(self) -> Option<f64> {
        match self {
            Grade::A => Some(8.0),
            Grade::B => Some(10.0),
            Grade::C => Some(12.0),
            Grade::D => Some(15.0),
            Grade::F => None,
        }
    }

    pub const fn is_eligible(self) -> bool {
        !matches!(self, Grade::F)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// Recommended loan terms derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditTerms {
    pub max_loan_amount: f64,
    pub interest_rate_min_pct: f64,
    pub interest_rate_max_pct: f64,
    pub default_probability_pct: f64,
}

impl CreditTerms {
    /// Terms ladder for eligible scores (grade D and above).
    pub fn from_score(value: u16) -> Option<Self> {
        if !Grade::from_score(value).is_eligible() {
            return None;
        }
        let (max_loan_amount, rates, default_probability_pct) = if value >= 850 {
            (100_000.0, (8.0, 10.0), 3.0)
        } else if value >= 800 {
            (85_000.0, (9.0, 11.0), 4.0)
        } else if value >= 750 {
            (75_000.0, (10.0, 12.0), 5.0)
        } else if value >= 700 {
            (65_000.0, (11.0, 13.0), 6.0)
        } else if value >= 650 {
            (55_000.0, (12.0, 14.0), 8.0)
        } else if value >= 600 {
            (45_000.0, (13.0, 15.0), 10.0)
        } else if value >= 550 {
            (35_000.0, (14.0, 16.0), 12.0)
        } else {
            (30_000.0, (15.0, 17.0), 15.0)
        };
        Some(Self {
            max_loan_amount,
            interest_rate_min_pct: rates.0,
            interest_rate_max_pct: rates.1,
            default_probability_pct,
        })
    }
}
