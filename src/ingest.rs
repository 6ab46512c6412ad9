use crate::pipeline::EntityRecord;
use crate::scoring::FeatureSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// How to read per-aircraft feature rows from CSV.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Column holding the aircraft identifier
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Columns that are neither the id nor a feature
    #[serde(default = "default_ignore_columns")]
    pub ignore_columns: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            ignore_columns: default_ignore_columns(),
        }
    }
}

fn default_id_column() -> String {
    "aircraft_id".to_string()
}

fn default_ignore_columns() -> Vec<String> {
    vec!["flight_date".to_string()]
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("id column '{0}' not found in header")]
    MissingIdColumn(String),

    #[error("line {line}: empty aircraft id")]
    MissingId { line: u64 },

    #[error("line {line}: aircraft '{id}' already appears on line {first_line}")]
    DuplicateId { id: String, line: u64, first_line: u64 },

    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },
}

/// Read one `EntityRecord` per CSV row, in file order.
///
/// Empty cells are treated as absent features so that the row still reaches
/// the pipeline and fails there with the missing feature named. Each aircraft
/// id may appear only once; per-flight logs must be aggregated first.
pub fn read_feature_records<R: Read>(
    reader: R,
    config: &IngestConfig,
) -> Result<Vec<EntityRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let id_index = headers
        .iter()
        .position(|h| h == config.id_column)
        .ok_or_else(|| IngestError::MissingIdColumn(config.id_column.clone()))?;

    let feature_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, name)| {
            let ignored = config.ignore_columns.iter().any(|c| c.as_str() == *name);
            *i != id_index && !ignored
        })
        .collect();

    let mut records = Vec::new();
    let mut first_seen: HashMap<String, u64> = HashMap::new();
    for row in csv_reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let entity_id = row.get(id_index).unwrap_or_default();
        if entity_id.is_empty() {
            return Err(IngestError::MissingId { line });
        }
        if let Some(&first_line) = first_seen.get(entity_id) {
            return Err(IngestError::DuplicateId {
                id: entity_id.to_string(),
                line,
                first_line,
            });
        }
        first_seen.insert(entity_id.to_string(), line);

        let mut features = BTreeMap::new();
        for (index, column) in &feature_columns {
            let cell = row.get(*index).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| IngestError::InvalidValue {
                line,
                column: column.to_string(),
                value: cell.to_string(),
            })?;
            features.insert(column.to_string(), value);
        }

        records.push(EntityRecord::new(entity_id, FeatureSet::new(features)));
    }

    Ok(records)
}

/// Open `path` and read its feature records.
pub fn load_feature_records(
    path: &Path,
    config: &IngestConfig,
) -> Result<Vec<EntityRecord>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_feature_records(file, config)
}
