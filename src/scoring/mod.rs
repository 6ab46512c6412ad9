pub mod bands;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod types;
pub mod validation;

pub use bands::{classify, BandTable, BandThreshold};
pub use config::*;
pub use engine::{score, FeatureContribution, ScoreBreakdown};
pub use error::ScoringError;
pub use normalizer::{min_max, normalize, DEGENERATE_MIDPOINT};
pub use types::{
    FeatureRange, FeatureSet, NormalizedFeatureSet, PopulationStats, RiskBand, RiskScore,
    SchedulingDecision, WeightTable,
};
pub use validation::{validate_population, validate_scoring};
