//! CropPulse decision core: weighted multi-source evidence aggregation for
//! smallholder credit scoring, insurance-claim verification, and harvest
//! logistics risk.
//!
//! The engines are stateless, request-scoped computations. All external data
//! (farm registry, satellite scans, ground-truth reports, action proofs,
//! forecasts) is reached through the read-only adapter traits in
//! [`evidence::adapters`]; a source that fails or times out degrades into
//! weight redistribution instead of failing the whole decision.

pub mod config;
pub mod engines;
pub mod error;
pub mod evidence;
pub mod service;
pub mod telemetry;
