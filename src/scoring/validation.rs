use super::bands::BandTable;
use super::config::ScoringConfig;
use super::types::FeatureRange;
use std::collections::{BTreeMap, HashSet};

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Validate weights
    if config.weights.is_empty() {
        errors.push("scoring.weights: at least one feature weight is required".to_string());
    }
    for (feature, weight) in &config.weights {
        if !weight.is_finite() {
            errors.push(format!("scoring.weights.{}: must be a finite number", feature));
        } else if *weight < 0.0 {
            errors.push(format!(
                "scoring.weights.{}: must be non-negative (got {})",
                feature, weight
            ));
        }
    }
    if !config.weights.is_empty() && config.weights.values().all(|w| w.is_finite() && *w >= 0.0) {
        let total = config.weights.values().sum::<f64>();
        if !total.is_finite() {
            errors.push("scoring.weights: weights sum to a non-finite total".to_string());
        } else if total == 0.0 {
            errors.push("scoring.weights: weights sum to zero".to_string());
        }
    }

    // Validate bands, per entry first so every bad field is reported
    let mut seen = HashSet::new();
    for (i, band) in config.bands.iter().enumerate() {
        if band.name.trim().is_empty() {
            errors.push(format!("scoring.bands[{}].name: must not be empty", i));
        } else if !seen.insert(band.name.as_str()) {
            errors.push(format!(
                "scoring.bands[{}].name: duplicate band '{}'",
                i, band.name
            ));
        }
        if !band.upper_bound.is_finite() {
            errors.push(format!(
                "scoring.bands[{}].upper_bound: must be a finite number",
                i
            ));
        } else if i > 0 && band.upper_bound <= config.bands[i - 1].upper_bound {
            errors.push(format!(
                "scoring.bands[{}].upper_bound: {} must be greater than {}",
                i,
                band.upper_bound,
                config.bands[i - 1].upper_bound
            ));
        }
    }

    // Catch anything the per-entry checks above do not phrase
    if errors.iter().all(|e| !e.starts_with("scoring.bands")) {
        if let Err(e) = BandTable::new(config.bands.clone()) {
            errors.push(format!("scoring.bands: {}", e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate an externally supplied population snapshot.
pub fn validate_population(population: &BTreeMap<String, FeatureRange>) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (feature, range) in population {
        if !range.min.is_finite() || !range.max.is_finite() {
            errors.push(format!("population.{}: bounds must be finite", feature));
        } else if range.min > range.max {
            errors.push(format!(
                "population.{}: min {} exceeds max {}",
                feature, range.min, range.max
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
