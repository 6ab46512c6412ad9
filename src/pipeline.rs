use crate::scoring::{
    classify, normalize, score, BandTable, FeatureContribution, FeatureSet, NormalizedFeatureSet,
    PopulationStats, RiskBand, RiskScore, ScoringConfig, ScoringError, WeightTable,
};
use anyhow::{anyhow, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Raw features for one aircraft, keyed by its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub entity_id: String,
    pub features: FeatureSet,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<String>, features: FeatureSet) -> Self {
        Self {
            entity_id: entity_id.into(),
            features,
        }
    }
}

/// Scored aircraft, with the normalized snapshot that produced the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResult {
    pub entity_id: String,
    pub score: RiskScore,
    pub band: RiskBand,
    pub normalized: NormalizedFeatureSet,
    pub contributions: Vec<FeatureContribution>,
}

/// Per-entity result of a batch: either scored or failed with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum EntityOutcome {
    Assessed(AssessmentResult),
    Failed {
        entity_id: String,
        #[serde(serialize_with = "serialize_error")]
        error: ScoringError,
    },
}

impl EntityOutcome {
    pub fn entity_id(&self) -> &str {
        match self {
            EntityOutcome::Assessed(result) => &result.entity_id,
            EntityOutcome::Failed { entity_id, .. } => entity_id,
        }
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        match self {
            EntityOutcome::Assessed(result) => Some(result),
            EntityOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EntityOutcome::Failed { .. })
    }
}

fn serialize_error<S: Serializer>(error: &ScoringError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Validated, read-only configuration for one run.
#[derive(Debug, Clone)]
pub struct RiskModel {
    stats: PopulationStats,
    weights: WeightTable,
    bands: BandTable,
}

impl RiskModel {
    pub fn new(
        stats: PopulationStats,
        weights: WeightTable,
        bands: BandTable,
    ) -> Result<Self, ScoringError> {
        weights.validate()?;
        Ok(Self {
            stats,
            weights,
            bands,
        })
    }

    /// Build a model from scoring configuration and a population snapshot.
    pub fn from_config(
        config: &ScoringConfig,
        stats: PopulationStats,
    ) -> Result<Self, ScoringError> {
        let weights = WeightTable::new(config.weights.clone())?;
        let bands = BandTable::new(config.bands.clone())?;
        Self::new(stats, weights, bands)
    }

    pub fn stats(&self) -> &PopulationStats {
        &self.stats
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// Normalize, score and classify a single aircraft.
    pub fn assess_entity(
        &self,
        entity_id: &str,
        features: &FeatureSet,
    ) -> Result<AssessmentResult, ScoringError> {
        let normalized = normalize(features, &self.stats, &self.weights)?;
        let breakdown = score(&normalized, &self.weights)?;
        let band = classify(breakdown.score, &self.bands).clone();

        Ok(AssessmentResult {
            entity_id: entity_id.to_string(),
            score: breakdown.score,
            band,
            normalized,
            contributions: breakdown.contributions,
        })
    }

    /// Assess one record, folding per-entity errors into the outcome.
    pub fn assess_record(&self, record: &EntityRecord) -> EntityOutcome {
        match self.assess_entity(&record.entity_id, &record.features) {
            Ok(result) => {
                debug!(
                    entity = %result.entity_id,
                    score = %result.score,
                    band = %result.band,
                    "assessed"
                );
                EntityOutcome::Assessed(result)
            }
            Err(error) => {
                warn!(entity = %record.entity_id, %error, "assessment failed");
                EntityOutcome::Failed {
                    entity_id: record.entity_id.clone(),
                    error,
                }
            }
        }
    }

    /// Assess every record in input order.
    pub fn assess_all(&self, records: &[EntityRecord]) -> Vec<EntityOutcome> {
        let outcomes: Vec<_> = records.iter().map(|r| self.assess_record(r)).collect();
        log_summary(&outcomes);
        outcomes
    }
}

/// Assess a batch sequentially.
///
/// Configuration errors fail the whole call before any entity is touched;
/// per-entity errors become `EntityOutcome::Failed` and the batch goes on.
/// The output has one entry per input, in input order.
pub fn assess(
    entities: &[EntityRecord],
    stats: &PopulationStats,
    weights: &WeightTable,
    bands: &BandTable,
) -> Result<Vec<EntityOutcome>, ScoringError> {
    let model = RiskModel::new(stats.clone(), weights.clone(), bands.clone())?;
    Ok(model.assess_all(entities))
}

/// Assess a batch on the blocking thread pool.
///
/// Records are split into at most `parallelism` chunks; each outcome is
/// tagged with its input index and the batch is reassembled in input order,
/// so the result is identical to [`assess`].
pub async fn assess_concurrent(
    entities: Vec<EntityRecord>,
    model: Arc<RiskModel>,
    parallelism: usize,
) -> Result<Vec<EntityOutcome>> {
    let total = entities.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let chunk_size = total.div_ceil(parallelism.max(1));

    let mut chunks: Vec<Vec<(usize, EntityRecord)>> = Vec::new();
    for (index, record) in entities.into_iter().enumerate() {
        if index % chunk_size == 0 {
            chunks.push(Vec::with_capacity(chunk_size));
        }
        if let Some(chunk) = chunks.last_mut() {
            chunk.push((index, record));
        }
    }

    debug!(entities = total, chunks = chunks.len(), "dispatching batch");

    let mut tasks = FuturesUnordered::new();
    for chunk in chunks {
        let model = Arc::clone(&model);
        tasks.push(tokio::task::spawn_blocking(move || {
            chunk
                .into_iter()
                .map(|(index, record)| (index, model.assess_record(&record)))
                .collect::<Vec<_>>()
        }));
    }

    let mut slots: Vec<Option<EntityOutcome>> = vec![None; total];
    while let Some(joined) = tasks.next().await {
        for (index, outcome) in joined? {
            slots[index] = Some(outcome);
        }
    }

    let outcomes = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or_else(|| anyhow!("no outcome for entity #{}", index)))
        .collect::<Result<Vec<_>>>()?;

    log_summary(&outcomes);
    Ok(outcomes)
}

fn log_summary(outcomes: &[EntityOutcome]) {
    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    info!(
        assessed = outcomes.len() - failed,
        failed,
        "batch complete"
    );
}

/// Per-band counts and aggregate figures for a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub assessed: usize,
    pub failed: usize,
    pub bands: Vec<BandCount>,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandCount {
    pub band: String,
    pub count: usize,
}

impl BatchSummary {
    /// Summarize outcomes; every configured band is listed, even when empty.
    pub fn from_outcomes(outcomes: &[EntityOutcome], bands: &BandTable) -> Self {
        let scored: Vec<&AssessmentResult> = outcomes.iter().filter_map(|o| o.result()).collect();

        let band_counts = bands
            .bands()
            .map(|band| BandCount {
                band: band.name.clone(),
                count: scored.iter().filter(|r| r.band.rank == band.rank).count(),
            })
            .collect();

        let mean_score = if scored.is_empty() {
            None
        } else {
            Some(scored.iter().map(|r| r.score.value()).sum::<f64>() / scored.len() as f64)
        };

        Self {
            total: outcomes.len(),
            assessed: scored.len(),
            failed: outcomes.len() - scored.len(),
            bands: band_counts,
            mean_score,
        }
    }
}
