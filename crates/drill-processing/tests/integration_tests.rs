//! Integration tests for the drilling data processor.
//!
//! These tests verify end-to-end behavior of the processor on files and
//! in-memory frames.

use anyhow::bail;
use drill_processing::pipeline::io::write_frame;
use drill_processing::{
    ConfigError, DrillingFeatureEngineer, DrillingProcessor, FeatureEngineer, FeatureSettings,
    ImputationStrategy, LogLevel, MemoryLogger, OutlierDetector, OutlierMethod, OutlierSettings,
    ProcessingError, ProcessorConfig, ProcessorState, Stage, StatisticalOutlierDetector,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// `rows` distinct drilling records.
fn drilling_frame(rows: usize) -> DataFrame {
    let depth: Vec<f64> = (0..rows).map(|i| 1000.0 + i as f64 * 10.0).collect();
    let pressure: Vec<f64> = (0..rows).map(|i| 2200.0 + (i % 9) as f64 * 12.0).collect();
    let temperature: Vec<f64> = (0..rows).map(|i| 70.0 + (i % 6) as f64 * 0.5).collect();
    let flow_rate: Vec<f64> = (0..rows).map(|i| 480.0 + (i % 4) as f64 * 6.0).collect();
    let formation: Vec<&str> = (0..rows)
        .map(|i| if i % 2 == 0 { "shale" } else { "sandstone" })
        .collect();
    df![
        "depth" => depth,
        "pressure" => pressure,
        "temperature" => temperature,
        "flow_rate" => flow_rate,
        "formation" => formation,
    ]
    .unwrap()
}

fn processor_with_logger(config: ProcessorConfig) -> (DrillingProcessor, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let processor = DrillingProcessor::builder()
        .config(config)
        .logger(logger.clone())
        .build()
        .unwrap();
    (processor, logger)
}

fn mentions(logger: &MemoryLogger, level: LogLevel, text: &str) -> usize {
    logger
        .events_at(level)
        .iter()
        .filter(|event| event.message.contains(text))
        .count()
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_csv_fixture() {
    let (mut processor, _) = processor_with_logger(ProcessorConfig::default());
    processor.load(fixtures_path().join("well_small.csv")).unwrap();
    assert_eq!(processor.data().unwrap().height(), 61);

    let processed = processor.run().unwrap();

    // 61 rows, one exact duplicate, then floor(60 * 0.05) outliers.
    assert_eq!(processed.height(), 57);
    assert_eq!(processed.column("pressure").unwrap().null_count(), 0);
    assert_eq!(processed.column("formation").unwrap().null_count(), 0);
    for feature in [
        "pt_ratio",
        "flow_efficiency",
        "pressure_gradient",
        "temperature_gradient",
        "drilling_strength",
        "specific_energy",
    ] {
        assert!(processed.column(feature).is_ok(), "missing feature {}", feature);
    }

    assert_eq!(processor.state(), ProcessorState::QualityChecked);
    let report = processor.quality_report().unwrap();
    assert_eq!(report.row_count, 57);
    assert_eq!(report.duplicate_rows, 0);
    assert!(report.score > 0.0 && report.score <= 1.0);
}

#[test]
fn test_parquet_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("well.parquet");
    let mut df = drilling_frame(50);
    write_frame(&mut df, &path).unwrap();

    let (mut processor, logger) = processor_with_logger(ProcessorConfig::default());
    processor.load(&path).unwrap();
    assert_eq!(processor.data().unwrap().shape(), (50, 5));
    assert_eq!(mentions(&logger, LogLevel::Info, "Loaded 50 rows"), 1);

    processor.run().unwrap();
    assert_eq!(processor.data().unwrap().height(), 48);
}

#[test]
fn test_clean_imputes_and_removes_duplicates() {
    // 98 distinct rows, 5 missing pressures, plus 2 exact duplicates.
    let base = drilling_frame(98);
    let mut pressure: Vec<Option<f64>> = base
        .column("pressure")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    for i in [3, 17, 40, 66, 90] {
        pressure[i] = None;
    }
    let mut with_missing = base.clone();
    with_missing
        .replace("pressure", Series::new("pressure".into(), pressure))
        .unwrap();
    let duplicates = with_missing.slice(10, 2);
    let df = with_missing.vstack(&duplicates).unwrap();
    assert_eq!(df.height(), 100);
    assert_eq!(df.column("pressure").unwrap().null_count(), 5);

    let (mut processor, _) = processor_with_logger(ProcessorConfig::default());
    processor.load_frame(df).unwrap();
    processor.clean().unwrap();

    let cleaned = processor.data().unwrap();
    assert_eq!(cleaned.height(), 98);
    assert_eq!(cleaned.column("pressure").unwrap().null_count(), 0);
}

/// `drilling_frame(rows)` with the given pressure cells overwritten.
fn with_pressures(rows: usize, cells: &[(usize, f64)]) -> DataFrame {
    let mut df = drilling_frame(rows);
    let mut pressure: Vec<f64> = df
        .column("pressure")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    for &(i, value) in cells {
        pressure[i] = value;
    }
    df.replace("pressure", Series::new("pressure".into(), pressure))
        .unwrap();
    df
}

fn float_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name).unwrap().f64().unwrap().into_iter().collect()
}

#[test]
fn test_infinite_value_runs_through_default_pipeline() {
    let df = with_pressures(40, &[(17, f64::INFINITY)]);

    let (mut processor, logger) = processor_with_logger(ProcessorConfig::default());
    processor.load_frame(df).unwrap();
    let processed = processor.run().unwrap();

    // floor(40 * 0.05) rows removed by the isolation forest.
    assert_eq!(processed.height(), 38);
    for feature in ["pt_ratio", "flow_efficiency", "pressure_gradient"] {
        assert!(
            float_values(processed, feature)
                .into_iter()
                .flatten()
                .all(f64::is_finite),
            "non-finite value in {}",
            feature
        );
    }
    assert_eq!(processor.state(), ProcessorState::QualityChecked);
    assert!(logger.events_at(LogLevel::Error).is_empty());
}

#[test]
fn test_iqr_removes_infinite_rows() {
    let df = with_pressures(40, &[(17, f64::INFINITY), (30, f64::NEG_INFINITY)]);
    let config = ProcessorConfig::builder()
        .outlier_method(OutlierMethod::Iqr)
        .build()
        .unwrap();

    let (mut processor, _) = processor_with_logger(config);
    processor.load_frame(df).unwrap();
    let processed = processor.run().unwrap();

    assert_eq!(processed.height(), 38);
    assert!(
        float_values(processed, "pressure")
            .into_iter()
            .all(|v| v.is_some_and(f64::is_finite))
    );
}

#[test]
fn test_nan_cells_are_imputed_from_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("well_nan.parquet");
    let mut df = with_pressures(50, &[(5, f64::NAN), (21, f64::NAN), (33, f64::NAN)]);
    write_frame(&mut df, &path).unwrap();

    let (mut processor, _) = processor_with_logger(ProcessorConfig::default());
    processor.load(&path).unwrap();
    processor.clean().unwrap();

    let pressure = float_values(processor.data().unwrap(), "pressure");
    assert_eq!(pressure.len(), 50);
    assert!(pressure.iter().all(|v| v.is_some_and(|p| !p.is_nan())));

    processor.handle_outliers().unwrap();
    processor.engineer_features().unwrap();
    processor.check_quality().unwrap();
    let report = processor.quality_report().unwrap();
    assert_eq!(report.total_missing, 0);
}

#[test]
fn test_keep_outliers_preserves_row_count() {
    let config = ProcessorConfig::builder()
        .remove_outliers(false)
        .build()
        .unwrap();
    let (mut processor, _) = processor_with_logger(config);
    processor.load_frame(drilling_frame(40)).unwrap();

    processor.clean().unwrap();
    let before = processor.data().unwrap().height();
    processor.handle_outliers().unwrap();
    assert_eq!(processor.data().unwrap().height(), before);
}

/// Delegates to the default detector and records how many rows it flagged.
struct CountingDetector {
    flagged: Arc<AtomicUsize>,
}

impl OutlierDetector for CountingDetector {
    fn detect(&self, df: &DataFrame, settings: &OutlierSettings) -> anyhow::Result<BooleanChunked> {
        let mask = StatisticalOutlierDetector.detect(df, settings)?;
        let flagged = mask.into_iter().filter(|v| *v == Some(true)).count();
        self.flagged.store(flagged, Ordering::SeqCst);
        Ok(mask)
    }
}

#[test]
fn test_outlier_removal_matches_mask() {
    for method in [OutlierMethod::IsolationForest, OutlierMethod::Iqr, OutlierMethod::ZScore] {
        let flagged = Arc::new(AtomicUsize::new(0));
        let mut df = drilling_frame(60);
        // One extreme pressure reading.
        let mut pressure: Vec<f64> = df
            .column("pressure")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        pressure[25] = 50_000.0;
        df.replace("pressure", Series::new("pressure".into(), pressure))
            .unwrap();

        let mut processor = DrillingProcessor::builder()
            .config(ProcessorConfig::builder().outlier_method(method).build().unwrap())
            .logger(Arc::new(MemoryLogger::new()))
            .outlier_detector(CountingDetector {
                flagged: flagged.clone(),
            })
            .build()
            .unwrap();
        processor.load_frame(df).unwrap();
        processor.clean().unwrap();
        let before = processor.data().unwrap().height();
        processor.handle_outliers().unwrap();
        let after = processor.data().unwrap().height();

        let flagged = flagged.load(Ordering::SeqCst);
        assert!(flagged >= 1, "{} flagged nothing", method);
        assert_eq!(after, before - flagged, "method {}", method);
    }
}

#[test]
fn test_feature_engineering_adds_expected_columns() {
    let config = ProcessorConfig::builder()
        .add_formation_features(false)
        .build()
        .unwrap();
    let (mut processor, _) = processor_with_logger(config);
    processor.load_frame(drilling_frame(30)).unwrap();
    processor.clean().unwrap();
    processor.handle_outliers().unwrap();

    let before = processor.data().unwrap().clone();
    processor.engineer_features().unwrap();
    let after = processor.data().unwrap();

    assert_eq!(after.height(), before.height());
    let added: Vec<String> = after
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .filter(|c| before.column(c).is_err())
        .collect();
    assert_eq!(added, vec!["pt_ratio".to_string(), "flow_efficiency".to_string()]);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_run_before_load_is_precondition_error() {
    let (mut processor, logger) = processor_with_logger(ProcessorConfig::default());

    let err = processor.run().unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(err.error_code(), "PRECONDITION_ERROR");
    assert!(processor.quality_report().is_none());
    assert_eq!(logger.events_at(LogLevel::Error).len(), 1);
}

#[test]
fn test_header_only_csv_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "depth,pressure,temperature,flow_rate\n").unwrap();

    let (mut processor, _) = processor_with_logger(ProcessorConfig::default());
    let err = processor.load(&path).unwrap_err();

    assert!(matches!(err, ProcessingError::DataLoad(_)));
    assert_eq!(processor.state(), ProcessorState::Uninitialized);
    assert!(processor.run().unwrap_err().is_precondition());
}

#[test]
fn test_missing_file_is_load_error() {
    let (mut processor, logger) = processor_with_logger(ProcessorConfig::default());
    let err = processor
        .load(fixtures_path().join("no_such_well.parquet"))
        .unwrap_err();
    assert_eq!(err.error_code(), "DATA_LOAD_ERROR");
    assert_eq!(mentions(&logger, LogLevel::Error, "no_such_well"), 1);
}

#[test]
fn test_too_few_rows_is_validation_error() {
    let (mut processor, _) = processor_with_logger(ProcessorConfig::default());
    let err = processor.load_frame(drilling_frame(5)).unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}

struct FailingEngineer;

impl FeatureEngineer for FailingEngineer {
    fn engineer(&self, _df: DataFrame, _settings: &FeatureSettings) -> anyhow::Result<DataFrame> {
        bail!("division table corrupted")
    }
}

#[test]
fn test_failing_stage_propagates_with_stage_name() {
    let logger = Arc::new(MemoryLogger::new());
    let mut processor = DrillingProcessor::builder()
        .logger(logger.clone())
        .feature_engineer(FailingEngineer)
        .build()
        .unwrap();
    processor.load_frame(drilling_frame(30)).unwrap();

    let err = processor.run().unwrap_err();

    assert_eq!(err.stage(), Some(Stage::EngineerFeatures));
    assert_eq!(err.error_code(), "STAGE_EXECUTION_ERROR");
    assert_eq!(
        std::error::Error::source(&err).unwrap().to_string(),
        "division table corrupted"
    );
    assert_eq!(processor.state(), ProcessorState::Failed);
    assert!(processor.data().is_none());
    assert!(processor.quality_report().is_none());

    assert_eq!(
        mentions(&logger, LogLevel::Info, "Starting stage 'engineer_features'"),
        1
    );
    assert_eq!(mentions(&logger, LogLevel::Error, "engineer_features"), 1);
    let later = logger
        .events()
        .iter()
        .filter(|event| event.message.contains("check_quality"))
        .count();
    assert_eq!(later, 0);

    // A failed processor refuses to run again until reloaded.
    assert!(processor.run().unwrap_err().is_precondition());
    processor.load_frame(drilling_frame(30)).unwrap();
    assert_eq!(processor.state(), ProcessorState::Loaded);
}

#[test]
fn test_default_engineer_fails_without_source_columns() {
    let validator = drill_processing::DataValidator::new(vec!["depth".to_string()], 1);
    let mut processor = DrillingProcessor::builder()
        .validator(validator)
        .logger(Arc::new(MemoryLogger::new()))
        .feature_engineer(DrillingFeatureEngineer)
        .build()
        .unwrap();
    let depth: Vec<f64> = (0..20).map(|i| i as f64).collect();
    processor.load_frame(df!["depth" => depth].unwrap()).unwrap();

    let err = processor.run().unwrap_err();
    assert_eq!(err.stage(), Some(Stage::EngineerFeatures));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_empty_config_uses_defaults() {
    let config = ProcessorConfig::from_json_str("{}").unwrap();
    assert_eq!(config.imputation_strategy, ImputationStrategy::Median);
    assert_eq!(config.outlier_method(), OutlierMethod::IsolationForest);
    assert!(config.remove_outliers);
    assert!(config.features.add_formation_features);
}

#[test]
fn test_unsupported_config_value_rejected_at_parse_time() {
    let err = ProcessorConfig::from_json_str(r#"{"imputation_strategy": "knn"}"#).unwrap_err();
    match &err {
        ConfigError::UnsupportedValue { key, value } => {
            assert_eq!(key, "imputation_strategy");
            assert_eq!(value, "knn");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let err: ProcessingError = err.into();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
}

#[test]
fn test_config_file_drives_processor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");
    std::fs::write(
        &path,
        r#"{"outlier_method": "iqr", "remove_outliers": false, "add_formation_features": false}"#,
    )
    .unwrap();

    let config = ProcessorConfig::from_file(&path).unwrap();
    let (mut processor, _) = processor_with_logger(config);
    processor.load_frame(drilling_frame(30)).unwrap();
    let processed = processor.run().unwrap();

    assert_eq!(processed.height(), 30);
    assert!(processed.column("pressure_gradient").is_err());
}

#[test]
fn test_error_serializes_code_and_stage() {
    let err = ProcessingError::stage_failed(Stage::Clean, anyhow::anyhow!("boom"));
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["code"], "STAGE_EXECUTION_ERROR");
    assert_eq!(json["stage"], "clean");
}
