use crate::ingest::IngestConfig;
use crate::scoring::{FeatureRange, ScoringConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Externally aggregated min/max per feature. When absent, the range is
    /// computed from the assessed population itself.
    #[serde(default)]
    pub population: Option<BTreeMap<String, FeatureRange>>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub log_level: Option<String>,
}
