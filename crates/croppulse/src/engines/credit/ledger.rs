//! Append-only score history.
//!
//! A `CompositeScore` is frozen at creation: the ledger only ever appends,
//! and history reads hand back clones of the original records. Re-scoring a
//! farmer produces a new record; it never touches the old one.

use std::collections::HashMap;
use std::sync::Mutex;

use super::CompositeScore;
use crate::evidence::FarmerId;

/// Storage abstraction so the scorer can be exercised in isolation.
pub trait ScoreLedger: Send + Sync {
    fn append(&self, record: CompositeScore) -> Result<(), LedgerError>;
    /// Full history in append order, oldest first.
    fn history(&self, farmer: &FarmerId) -> Result<Vec<CompositeScore>, LedgerError>;
    fn latest(&self, farmer: &FarmerId) -> Result<Option<CompositeScore>, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("score ledger unavailable: {0}")]
    Unavailable(String),
}

/// In-process ledger used by tests, the demo, and the default service wiring.
#[derive(Default)]
pub struct InMemoryScoreLedger {
    records: Mutex<HashMap<FarmerId, Vec<CompositeScore>>>,
}

impl InMemoryScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreLedger for InMemoryScoreLedger {
    fn append(&self, record: CompositeScore) -> Result<(), LedgerError> {
        let mut guard = self.records.lock().expect("ledger mutex poisoned");
        guard
            .entry(record.farmer_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    fn history(&self, farmer: &FarmerId) -> Result<Vec<CompositeScore>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard.get(farmer).cloned().unwrap_or_default())
    }

    fn latest(&self, farmer: &FarmerId) -> Result<Option<CompositeScore>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard
            .get(farmer)
            .and_then(|records| records.last().cloned()))
    }
}
