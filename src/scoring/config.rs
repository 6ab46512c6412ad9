use super::bands::BandThreshold;
use super::types::SchedulingDecision;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TOTAL_FLIGHT_HOURS: &str = "total_flight_hours";
pub const MAINTENANCE_EVENT_COUNT: &str = "maintenance_event_count";
pub const AVG_DOWNTIME_DAYS: &str = "avg_downtime_days";

/// Main scoring configuration.
///
/// Weights are relative importances and need not sum to 1. Bands are listed
/// lowest risk first with strictly ascending upper bounds.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights:
///     total_flight_hours: 0.5
///     maintenance_event_count: 0.3
///     avg_downtime_days: 0.2
///   bands:
///     - { name: LOW, upper_bound: 0.33, decision: clear }
///     - { name: MEDIUM, upper_bound: 0.66, decision: monitor }
///     - { name: HIGH, upper_bound: 1.0, decision: ground }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Feature name -> non-negative weight
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, f64>,

    /// Ordered band thresholds
    #[serde(default = "default_bands")]
    pub bands: Vec<BandThreshold>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            bands: default_bands(),
        }
    }
}

fn default_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        (TOTAL_FLIGHT_HOURS.to_string(), 0.5),
        (MAINTENANCE_EVENT_COUNT.to_string(), 0.3),
        (AVG_DOWNTIME_DAYS.to_string(), 0.2),
    ])
}

fn default_bands() -> Vec<BandThreshold> {
    vec![
        BandThreshold::new("LOW", 0.33, SchedulingDecision::Clear),
        BandThreshold::new("MEDIUM", 0.66, SchedulingDecision::Monitor),
        BandThreshold::new("HIGH", 1.0, SchedulingDecision::Ground),
    ]
}
