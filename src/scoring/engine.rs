use super::error::ScoringError;
use super::types::{NormalizedFeatureSet, RiskScore, WeightTable};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub normalized: f64, // value in [0,1]
    pub weight: f64,     // raw weight from the table
    pub share: f64,      // normalized * weight / total weight
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub score: RiskScore,
    pub total_weight: f64,
    pub contributions: Vec<FeatureContribution>,
}

/// Weighted average of the normalized features that also carry a weight.
///
/// Features are visited in name order. Unweighted features are ignored, as
/// are weights for features that were not normalized.
pub fn score(
    normalized: &NormalizedFeatureSet,
    weights: &WeightTable,
) -> Result<ScoreBreakdown, ScoringError> {
    for (feature, weight) in weights.iter() {
        if !weight.is_finite() {
            return Err(ScoringError::NonFiniteWeight {
                feature: feature.to_string(),
                weight,
            });
        }
        if weight < 0.0 {
            return Err(ScoringError::NegativeWeight {
                feature: feature.to_string(),
                weight,
            });
        }
    }

    let applicable: Vec<(&str, f64, f64)> = normalized
        .iter()
        .filter_map(|(feature, value)| weights.get(feature).map(|w| (feature, value, w)))
        .collect();

    let total_weight: f64 = applicable.iter().map(|(_, _, w)| w).sum();
    if !total_weight.is_finite() {
        return Err(ScoringError::WeightOverflow {
            total: total_weight,
        });
    }
    if total_weight == 0.0 {
        return Err(ScoringError::EmptyWeight);
    }

    // Bounded by total_weight while every normalized value is in [0,1]
    let weighted_sum: f64 = applicable.iter().map(|(_, n, w)| n * w).sum();
    if !weighted_sum.is_finite() {
        return Err(ScoringError::WeightOverflow {
            total: weighted_sum,
        });
    }

    let contributions = applicable
        .into_iter()
        .map(|(feature, normalized, weight)| FeatureContribution {
            feature: feature.to_string(),
            normalized,
            weight,
            share: normalized * weight / total_weight,
        })
        .collect();

    // Clamp absorbs rounding when every input sits at 1.0
    Ok(ScoreBreakdown {
        score: RiskScore::new(weighted_sum / total_weight),
        total_weight,
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::normalize;
    use crate::scoring::types::{FeatureRange, FeatureSet, PopulationStats};
    use std::collections::BTreeMap;

    fn normalized(entries: &[(&str, f64)]) -> NormalizedFeatureSet {
        NormalizedFeatureSet::new(entries.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    fn weights(entries: &[(&str, f64)]) -> WeightTable {
        entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_reference_example_score() {
        let n = normalized(&[("hours", 0.8), ("events", 0.6), ("downtime", 0.5)]);
        let w = weights(&[("hours", 0.5), ("events", 0.3), ("downtime", 0.2)]);

        let result = score(&n, &w).unwrap();
        assert!((result.score.value() - 0.68).abs() < 1e-12);
        assert!((result.total_weight - 1.0).abs() < 1e-12);
        assert_eq!(result.contributions.len(), 3);
    }

    #[test]
    fn test_weights_not_summing_to_one() {
        // Same proportions as the reference example, scaled by 10
        let n = normalized(&[("hours", 0.8), ("events", 0.6), ("downtime", 0.5)]);
        let w = weights(&[("hours", 5.0), ("events", 3.0), ("downtime", 2.0)]);

        let result = score(&n, &w).unwrap();
        assert!((result.score.value() - 0.68).abs() < 1e-12);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let n = normalized(&[("hours", 0.8)]);
        let w = weights(&[("hours", 1.0), ("events", -0.5)]);

        let err = score(&n, &w).unwrap_err();
        assert_eq!(
            err,
            ScoringError::NegativeWeight {
                feature: "events".to_string(),
                weight: -0.5
            }
        );
    }

    #[test]
    fn test_zero_weight_sum_rejected() {
        let n = normalized(&[("hours", 0.8), ("events", 0.2)]);
        let w = weights(&[("hours", 0.0), ("events", 0.0)]);

        assert_eq!(score(&n, &w).unwrap_err(), ScoringError::EmptyWeight);
    }

    #[test]
    fn test_overflowing_weights_rejected() {
        let n = normalized(&[("a", 1.0), ("b", 1.0)]);
        let w = weights(&[("a", 1e308), ("b", 1e308)]);

        let err = score(&n, &w).unwrap_err();
        assert!(matches!(err, ScoringError::WeightOverflow { .. }));
    }

    #[test]
    fn test_nan_weight_not_reported_as_negative() {
        let n = normalized(&[("hours", 0.5)]);
        let w = weights(&[("hours", f64::NAN)]);

        let err = score(&n, &w).unwrap_err();
        assert!(matches!(err, ScoringError::NonFiniteWeight { ref feature, .. } if feature == "hours"));
    }

    #[test]
    fn test_large_finite_weights_stay_in_unit_interval() {
        let n = normalized(&[("a", 1.0), ("b", 0.25)]);
        let w = weights(&[("a", 1e307), ("b", 1e307)]);

        let s = score(&n, &w).unwrap().score.value();
        assert!((0.0..=1.0).contains(&s));
        assert!((s - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_no_overlap_is_empty_weight() {
        let n = normalized(&[("hours", 0.8)]);
        let w = weights(&[("events", 1.0)]);

        assert_eq!(score(&n, &w).unwrap_err(), ScoringError::EmptyWeight);
    }

    #[test]
    fn test_unweighted_features_ignored() {
        let n = normalized(&[("hours", 1.0), ("sorties", 0.0)]);
        let w = weights(&[("hours", 2.0)]);

        let result = score(&n, &w).unwrap();
        assert_eq!(result.score.value(), 1.0);
        assert_eq!(result.contributions.len(), 1);
    }

    #[test]
    fn test_contributions_sum_to_score() {
        let n = normalized(&[("a", 0.1), ("b", 0.9), ("c", 0.45)]);
        let w = weights(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);

        let result = score(&n, &w).unwrap();
        let total: f64 = result.contributions.iter().map(|c| c.share).sum();
        assert!((total - result.score.value()).abs() < 1e-12);
    }

    #[test]
    fn test_score_in_unit_interval() {
        let w = weights(&[("a", 0.7), ("b", 0.1), ("c", 3.3)]);
        let steps = [0.0, 0.25, 0.5, 0.75, 1.0];
        for a in steps {
            for b in steps {
                for c in steps {
                    let n = normalized(&[("a", a), ("b", b), ("c", c)]);
                    let s = score(&n, &w).unwrap().score.value();
                    assert!((0.0..=1.0).contains(&s));
                }
            }
        }
    }

    #[test]
    fn test_full_scoring_flow() {
        let raw = FeatureSet::from_iter([("hours", 2500.0), ("events", 20.0)]);
        let stats = PopulationStats::new(BTreeMap::from([
            ("hours".to_string(), FeatureRange::new(0.0, 10000.0)),
            ("events".to_string(), FeatureRange::new(0.0, 20.0)),
        ]))
        .unwrap();
        let w = WeightTable::new(BTreeMap::from([
            ("hours".to_string(), 1.0),
            ("events".to_string(), 3.0),
        ]))
        .unwrap();

        let n = normalize(&raw, &stats, &w).unwrap();
        let result = score(&n, &w).unwrap();

        // (0.25 * 1 + 1.0 * 3) / 4
        assert!((result.score.value() - 0.8125).abs() < 1e-12);
    }
}
