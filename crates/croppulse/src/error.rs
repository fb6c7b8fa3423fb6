use crate::engines::aggregate::AggregationError;
use crate::engines::credit::ledger::LedgerError;
use crate::evidence::FarmId;

/// Error raised by a decision operation.
///
/// Per-source outages never surface here; they are absorbed by weight
/// redistribution. A decision fails only when nothing usable remains, and the
/// message always names what was missing so the caller can retry once the
/// dependency is restored.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("insufficient evidence for {subject}: {source}")]
    InsufficientEvidence {
        subject: String,
        #[source]
        source: AggregationError,
    },
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },
    #[error("forecast for farm {farm_id} covers {got} day(s), at least {required} required")]
    MissingForecast {
        farm_id: FarmId,
        got: usize,
        required: usize,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
