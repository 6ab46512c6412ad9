//! Deterministic, explainable maintenance risk scoring for aircraft fleets.
//!
//! Raw operational features are min-max normalized against a population
//! snapshot, combined into a weighted-average score in [0,1], and mapped to
//! an ordered risk band carrying a scheduling decision.

pub mod config;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod telemetry;
