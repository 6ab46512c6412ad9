use fleet_risk::ingest::{read_feature_records, IngestConfig};
use fleet_risk::pipeline::{assess, assess_concurrent, BatchSummary, EntityOutcome, RiskModel};
use fleet_risk::scoring::{
    BandTable, BandThreshold, FeatureRange, FeatureSet, PopulationStats, SchedulingDecision,
    ScoringConfig, ScoringError, WeightTable,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn reference_stats() -> PopulationStats {
    PopulationStats::new(BTreeMap::from([
        ("hours".to_string(), FeatureRange::new(0.0, 10000.0)),
        ("events".to_string(), FeatureRange::new(0.0, 20.0)),
        ("downtime".to_string(), FeatureRange::new(0.0, 10.0)),
    ]))
    .unwrap()
}

fn reference_weights() -> WeightTable {
    WeightTable::new(BTreeMap::from([
        ("hours".to_string(), 0.5),
        ("events".to_string(), 0.3),
        ("downtime".to_string(), 0.2),
    ]))
    .unwrap()
}

fn reference_bands() -> BandTable {
    BandTable::new(vec![
        BandThreshold::new("LOW", 0.33, SchedulingDecision::Clear),
        BandThreshold::new("MEDIUM", 0.66, SchedulingDecision::Monitor),
        BandThreshold::new("HIGH", 1.0, SchedulingDecision::Ground),
    ])
    .unwrap()
}

#[test]
fn reference_aircraft_scores_high() {
    let raw = FeatureSet::from_iter([("hours", 8000.0), ("events", 12.0), ("downtime", 5.0)]);
    let entities = vec![fleet_risk::pipeline::EntityRecord::new("N100", raw)];

    let outcomes = assess(
        &entities,
        &reference_stats(),
        &reference_weights(),
        &reference_bands(),
    )
    .unwrap();

    let result = outcomes[0].result().expect("reference aircraft should be scored");
    assert_eq!(result.normalized.get("hours"), Some(0.8));
    assert_eq!(result.normalized.get("events"), Some(0.6));
    assert_eq!(result.normalized.get("downtime"), Some(0.5));
    assert!((result.score.value() - 0.68).abs() < 1e-12);
    assert_eq!(result.band.name, "HIGH");
}

#[test]
fn zero_variance_feature_is_neutral() {
    let stats = PopulationStats::new(BTreeMap::from([
        ("hours".to_string(), FeatureRange::new(4000.0, 4000.0)),
        ("events".to_string(), FeatureRange::new(0.0, 20.0)),
        ("downtime".to_string(), FeatureRange::new(0.0, 10.0)),
    ]))
    .unwrap();
    let raw = FeatureSet::from_iter([("hours", 99999.0), ("events", 0.0), ("downtime", 0.0)]);
    let entities = vec![fleet_risk::pipeline::EntityRecord::new("N1", raw)];

    let outcomes = assess(&entities, &stats, &reference_weights(), &reference_bands()).unwrap();
    let result = outcomes[0].result().unwrap();
    assert_eq!(result.normalized.get("hours"), Some(0.5));
    // 0.5 * 0.5 / 1.0
    assert!((result.score.value() - 0.25).abs() < 1e-12);
    assert_eq!(result.band.name, "LOW");
}

#[tokio::test]
async fn csv_fleet_with_bad_row_keeps_length_and_order() {
    let csv = "\
aircraft_id,flight_date,hours,events,downtime
N100,2024-05-01,8000,12,5
N200,2024-05-01,3000,,1
N300,2024-05-02,200,1,0
N400,2024-05-02,10000,20,10
";
    let records = read_feature_records(csv.as_bytes(), &IngestConfig::default()).unwrap();
    let model = Arc::new(
        RiskModel::new(reference_stats(), reference_weights(), reference_bands()).unwrap(),
    );

    let outcomes = assess_concurrent(records, Arc::clone(&model), 3).await.unwrap();

    assert_eq!(outcomes.len(), 4);
    let ids: Vec<&str> = outcomes.iter().map(|o| o.entity_id()).collect();
    assert_eq!(ids, vec!["N100", "N200", "N300", "N400"]);

    match &outcomes[1] {
        EntityOutcome::Failed { error, .. } => assert_eq!(
            *error,
            ScoringError::MissingFeature {
                feature: "events".to_string()
            }
        ),
        other => panic!("expected N200 to fail, got {:?}", other),
    }

    let decisions: Vec<Option<SchedulingDecision>> = outcomes
        .iter()
        .map(|o| o.result().map(|r| r.band.decision))
        .collect();
    assert_eq!(
        decisions,
        vec![
            Some(SchedulingDecision::Ground),
            None,
            Some(SchedulingDecision::Clear),
            Some(SchedulingDecision::Ground),
        ]
    );

    let summary = BatchSummary::from_outcomes(&outcomes, model.bands());
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.assessed, 3);
}

#[test]
fn population_computed_from_input_when_not_supplied() {
    let csv = "\
aircraft_id,total_flight_hours,maintenance_event_count,avg_downtime_days
A,1000,2,1
B,3000,6,3
C,2000,4,2
";
    let records = read_feature_records(csv.as_bytes(), &IngestConfig::default()).unwrap();
    let stats = PopulationStats::from_population(records.iter().map(|r| &r.features));
    let model = RiskModel::from_config(&ScoringConfig::default(), stats).unwrap();

    let outcomes = model.assess_all(&records);
    let scores: Vec<f64> = outcomes
        .iter()
        .map(|o| o.result().unwrap().score.value())
        .collect();

    assert_eq!(scores[0], 0.0);
    assert_eq!(scores[1], 1.0);
    assert!((scores[2] - 0.5).abs() < 1e-12);

    let bands: Vec<&str> = outcomes
        .iter()
        .map(|o| o.result().unwrap().band.name.as_str())
        .collect();
    assert_eq!(bands, vec!["LOW", "HIGH", "MEDIUM"]);
}

#[test]
fn configuration_errors_abort_before_scoring() {
    let config = ScoringConfig {
        bands: vec![
            BandThreshold::new("LOW", 0.8, SchedulingDecision::Clear),
            BandThreshold::new("HIGH", 0.4, SchedulingDecision::Ground),
        ],
        ..ScoringConfig::default()
    };
    let err = RiskModel::from_config(&config, reference_stats()).unwrap_err();
    assert!(err.is_configuration());

    let inverted = PopulationStats::new(BTreeMap::from([(
        "hours".to_string(),
        FeatureRange::new(5.0, 1.0),
    )]));
    assert!(matches!(inverted, Err(ScoringError::InvalidStats { .. })));
}
