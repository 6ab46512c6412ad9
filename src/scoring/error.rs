use thiserror::Error;

/// Errors raised while configuring or running the scoring pipeline.
///
/// Configuration errors abort a whole run; the rest are attributed to a
/// single entity and recorded in its outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("missing feature '{feature}'")]
    MissingFeature { feature: String },

    #[error("no population statistics for feature '{feature}'")]
    MissingStatistic { feature: String },

    #[error("feature '{feature}' has non-finite value {value}")]
    NonFiniteFeature { feature: String, value: f64 },

    #[error("sum of applicable weights is zero")]
    EmptyWeight,

    #[error("weight for '{feature}' is negative ({weight})")]
    NegativeWeight { feature: String, weight: f64 },

    #[error("weight for '{feature}' is not a finite number ({weight})")]
    NonFiniteWeight { feature: String, weight: f64 },

    #[error("sum of weights overflows ({total})")]
    WeightOverflow { total: f64 },

    #[error("invalid band configuration: {reason}")]
    InvalidBandConfiguration { reason: String },

    #[error("invalid population statistics for '{feature}': {reason}")]
    InvalidStats { feature: String, reason: String },
}

impl ScoringError {
    /// True for errors that invalidate the whole run rather than one entity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ScoringError::EmptyWeight
                | ScoringError::NegativeWeight { .. }
                | ScoringError::NonFiniteWeight { .. }
                | ScoringError::WeightOverflow { .. }
                | ScoringError::InvalidBandConfiguration { .. }
                | ScoringError::InvalidStats { .. }
        )
    }
}
