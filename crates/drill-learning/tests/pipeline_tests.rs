//! End-to-end tests: processed drilling data into the classifier pipeline.

use drill_learning::{LearningError, ModelPipeline, ModelPipelineConfig, build_ml_pipeline};
use drill_processing::{DrillingProcessor, MemoryLogger, ProcessorConfig};
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../drill-processing/tests/fixtures/well_small.csv")
}

fn processed_well() -> DataFrame {
    let mut processor = DrillingProcessor::builder()
        .config(ProcessorConfig::default())
        .logger(Arc::new(MemoryLogger::new()))
        .build()
        .unwrap();
    processor.load(fixture()).unwrap();
    processor.run().unwrap();
    processor.into_data().unwrap()
}

fn labels(df: &DataFrame, column: &str) -> Vec<String> {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_formation_classifier_on_processed_data() {
    let df = processed_well();
    let mut pipeline = build_ml_pipeline(
        &["depth", "pressure", "temperature", "pt_ratio", "pressure_gradient"],
        &[] as &[&str],
    );

    pipeline.fit(&df, "formation").unwrap();
    let predictions = pipeline.predict(&df).unwrap();
    let truth = labels(&df, "formation");

    let correct = predictions.iter().zip(&truth).filter(|(p, t)| p == t).count();
    assert!(
        correct as f64 / truth.len() as f64 >= 0.9,
        "only {} of {} correct",
        correct,
        truth.len()
    );
}

#[test]
fn test_predict_handles_nulls_in_new_rows() {
    let df = processed_well();
    let config = ModelPipelineConfig::builder()
        .n_estimators(30)
        .random_seed(3)
        .build()
        .unwrap();
    let mut pipeline = ModelPipeline::new(&["depth", "rop"], &["formation"], config);
    pipeline.fit(&df, "formation").unwrap();

    let new_rows = df![
        "depth" => [Some(1550.0), None],
        "rop" => [None, Some(20.0)],
        "formation" => [None::<&str>, Some("basalt")],
    ]
    .unwrap();
    let predictions = pipeline.predict(&new_rows).unwrap();
    assert_eq!(predictions.len(), 2);
}

#[test]
fn test_predict_requires_fitted_feature_columns() {
    let df = processed_well();
    let mut pipeline = build_ml_pipeline(&["depth", "torque"], &[] as &[&str]);
    pipeline.fit(&df, "formation").unwrap();

    let missing = df!["depth" => [1600.0]].unwrap();
    let err = pipeline.predict(&missing).unwrap_err();
    assert!(matches!(err, LearningError::FeatureNotFound(name) if name == "torque"));
}
