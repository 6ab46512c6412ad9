use super::error::ScoringError;
use super::types::{FeatureRange, FeatureSet, NormalizedFeatureSet, PopulationStats, WeightTable};
use std::collections::BTreeMap;

/// Value assigned to a feature whose population range has zero width.
pub const DEGENERATE_MIDPOINT: f64 = 0.5;

/// Rescale one value into [0,1] with min-max scaling.
///
/// Values outside the population range are clamped. A zero-width range
/// yields [`DEGENERATE_MIDPOINT`] regardless of `value`.
pub fn min_max(value: f64, range: &FeatureRange) -> f64 {
    if range.is_degenerate() {
        return DEGENERATE_MIDPOINT;
    }
    ((value - range.min) / (range.max - range.min)).clamp(0.0, 1.0)
}

/// Normalize every feature present in both `raw` and `stats`.
///
/// Every feature named by `weights` must be present in `raw` and have a
/// population range; the first missing one (in name order) is reported.
pub fn normalize(
    raw: &FeatureSet,
    stats: &PopulationStats,
    weights: &WeightTable,
) -> Result<NormalizedFeatureSet, ScoringError> {
    for feature in weights.features() {
        if !raw.contains(feature) {
            return Err(ScoringError::MissingFeature {
                feature: feature.to_string(),
            });
        }
        if stats.get(feature).is_none() {
            return Err(ScoringError::MissingStatistic {
                feature: feature.to_string(),
            });
        }
    }

    let mut normalized = BTreeMap::new();
    for (feature, value) in raw.iter() {
        let Some(range) = stats.get(feature) else {
            continue;
        };
        if !value.is_finite() {
            return Err(ScoringError::NonFiniteFeature {
                feature: feature.to_string(),
                value,
            });
        }
        normalized.insert(feature.to_string(), min_max(value, range));
    }

    Ok(NormalizedFeatureSet::new(normalized))
}
