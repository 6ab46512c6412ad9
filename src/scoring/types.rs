use super::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw operational attributes captured for one aircraft.
///
/// Backed by a `BTreeMap` so every traversal happens in feature-name order,
/// which keeps floating-point sums reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeMap<String, f64>);

impl FeatureSet {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0.get(feature).copied()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.0.contains_key(feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Observed range of one feature across the reference population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Zero variance: every entity in the population had the same value.
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Per-feature min/max snapshot used for normalization.
///
/// Validated on construction (`min <= max`, both finite) and read-only
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PopulationStats(BTreeMap<String, FeatureRange>);

impl PopulationStats {
    /// Wrap an externally supplied snapshot.
    pub fn new(ranges: BTreeMap<String, FeatureRange>) -> Result<Self, ScoringError> {
        for (feature, range) in &ranges {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(ScoringError::InvalidStats {
                    feature: feature.clone(),
                    reason: "bounds must be finite".to_string(),
                });
            }
            if range.min > range.max {
                return Err(ScoringError::InvalidStats {
                    feature: feature.clone(),
                    reason: format!("min {} exceeds max {}", range.min, range.max),
                });
            }
        }
        Ok(Self(ranges))
    }

    /// Compute the range of every feature observed in `population`.
    ///
    /// Non-finite values are skipped; they fail later, per entity, during
    /// normalization.
    pub fn from_population<'a, I>(population: I) -> Self
    where
        I: IntoIterator<Item = &'a FeatureSet>,
    {
        let mut ranges: BTreeMap<String, FeatureRange> = BTreeMap::new();
        for features in population {
            for (name, value) in features.iter() {
                if !value.is_finite() {
                    continue;
                }
                ranges
                    .entry(name.to_string())
                    .and_modify(|r| {
                        r.min = r.min.min(value);
                        r.max = r.max.max(value);
                    })
                    .or_insert(FeatureRange::new(value, value));
            }
        }
        Self(ranges)
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureRange> {
        self.0.get(feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureRange)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, FeatureRange> {
        self.0
    }
}

/// Features rescaled to [0,1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedFeatureSet(BTreeMap<String, f64>);

impl NormalizedFeatureSet {
    pub(crate) fn new(values: BTreeMap<String, f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0.get(feature).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Non-negative importance of each feature.
///
/// Weights need not sum to 1; the scorer divides by their total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<String, f64>);

impl WeightTable {
    /// Build a table, rejecting negative or non-finite weights and tables
    /// whose total is zero or overflows.
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self, ScoringError> {
        let table = Self(weights);
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        for (feature, &weight) in &self.0 {
            if !weight.is_finite() {
                return Err(ScoringError::NonFiniteWeight {
                    feature: feature.clone(),
                    weight,
                });
            }
            if weight < 0.0 {
                return Err(ScoringError::NegativeWeight {
                    feature: feature.clone(),
                    weight,
                });
            }
        }
        let total = self.total();
        if !total.is_finite() {
            return Err(ScoringError::WeightOverflow { total });
        }
        if total <= 0.0 {
            return Err(ScoringError::EmptyWeight);
        }
        Ok(())
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0.get(feature).copied()
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for WeightTable {
    /// Collects without validation; call [`WeightTable::validate`] before use.
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Aggregated risk in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(f64);

impl RiskScore {
    pub(crate) fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Action handed to maintenance and crew scheduling for a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulingDecision {
    /// Normal rotation.
    Clear,
    /// Schedule with extra inspection and experienced crew.
    Monitor,
    /// Pull from the schedule and flag for maintenance.
    Ground,
}

impl SchedulingDecision {
    /// Configuration spelling ("clear", "monitor", "ground")
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingDecision::Clear => "clear",
            SchedulingDecision::Monitor => "monitor",
            SchedulingDecision::Ground => "ground",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            SchedulingDecision::Clear => "clear for scheduling",
            SchedulingDecision::Monitor => "schedule with inspection",
            SchedulingDecision::Ground => "flag for maintenance",
        }
    }
}

impl fmt::Display for SchedulingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())
    }
}

/// A named risk category. Ordered by `rank`, lowest risk first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBand {
    pub name: String,
    pub rank: usize,
    pub decision: SchedulingDecision,
}

impl PartialOrd for RiskBand {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskBand {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(entries: &[(&str, f64, f64)]) -> BTreeMap<String, FeatureRange> {
        entries
            .iter()
            .map(|(name, min, max)| (name.to_string(), FeatureRange::new(*min, *max)))
            .collect()
    }

    #[test]
    fn test_stats_reject_inverted_range() {
        let result = PopulationStats::new(ranges(&[("hours", 10.0, 5.0)]));
        assert!(matches!(
            result,
            Err(ScoringError::InvalidStats { ref feature, .. }) if feature == "hours"
        ));
    }

    #[test]
    fn test_stats_reject_non_finite() {
        let result = PopulationStats::new(ranges(&[("hours", 0.0, f64::INFINITY)]));
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_accept_degenerate_range() {
        let stats = PopulationStats::new(ranges(&[("hours", 3.0, 3.0)])).unwrap();
        assert!(stats.get("hours").unwrap().is_degenerate());
    }

    #[test]
    fn test_stats_from_population() {
        let fleet = vec![
            FeatureSet::from_iter([("hours", 100.0), ("events", 4.0)]),
            FeatureSet::from_iter([("hours", 900.0), ("events", 1.0)]),
            FeatureSet::from_iter([("hours", 400.0), ("downtime", f64::NAN)]),
        ];
        let stats = PopulationStats::from_population(&fleet);

        assert_eq!(stats.get("hours"), Some(&FeatureRange::new(100.0, 900.0)));
        assert_eq!(stats.get("events"), Some(&FeatureRange::new(1.0, 4.0)));
        assert!(stats.get("downtime").is_none());
    }

    #[test]
    fn test_stats_from_empty_population() {
        let stats = PopulationStats::from_population(&Vec::<FeatureSet>::new());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_weight_table_rejects_negative() {
        let result = WeightTable::new(BTreeMap::from([
            ("hours".to_string(), 0.5),
            ("events".to_string(), -0.1),
        ]));
        assert_eq!(
            result,
            Err(ScoringError::NegativeWeight {
                feature: "events".to_string(),
                weight: -0.1
            })
        );
    }

    #[test]
    fn test_weight_table_rejects_all_zero() {
        let result = WeightTable::new(BTreeMap::from([("hours".to_string(), 0.0)]));
        assert_eq!(result, Err(ScoringError::EmptyWeight));
    }

    #[test]
    fn test_weight_table_rejects_overflowing_total() {
        let result = WeightTable::new(BTreeMap::from([
            ("a".to_string(), 1e308),
            ("b".to_string(), 1e308),
        ]));
        assert!(matches!(result, Err(ScoringError::WeightOverflow { total }) if total.is_infinite()));
    }

    #[test]
    fn test_weight_table_rejects_nan_as_non_finite() {
        let result = WeightTable::new(BTreeMap::from([("hours".to_string(), f64::NAN)]));
        assert!(matches!(
            result,
            Err(ScoringError::NonFiniteWeight { ref feature, .. }) if feature == "hours"
        ));
    }

    #[test]
    fn test_weight_table_need_not_sum_to_one() {
        let table = WeightTable::new(BTreeMap::from([
            ("hours".to_string(), 5.0),
            ("events".to_string(), 3.0),
        ]))
        .unwrap();
        assert_eq!(table.total(), 8.0);
    }

    #[test]
    fn test_risk_score_clamped() {
        assert_eq!(RiskScore::new(1.0000001).value(), 1.0);
        assert_eq!(RiskScore::new(-0.2).value(), 0.0);
    }

    #[test]
    fn test_band_ordering_by_rank() {
        let low = RiskBand {
            name: "LOW".to_string(),
            rank: 0,
            decision: SchedulingDecision::Clear,
        };
        let high = RiskBand {
            name: "HIGH".to_string(),
            rank: 2,
            decision: SchedulingDecision::Ground,
        };
        assert!(low < high);
    }

    #[test]
    fn test_decision_serde_kebab_case() {
        let json = serde_json::to_string(&SchedulingDecision::Ground).unwrap();
        assert_eq!(json, "\"ground\"");
    }
}
