//! Configuration document persistence across runs.
//!
//! Tests verify:
//! - A previous `data_root_path` survives a re-run by default
//! - The computed root path policy replaces it
//! - Previous documents are backed up, never overwritten
//! - `image_size` and `matrix` are kept from the previous document
//! - A non-file `viewer.json` aborts before any processing

use std::fs;

use slice_atlas::pipeline;
use slice_atlas::toolkit::ImageToolkit;
use slice_atlas::{PipelineOptions, PrepareError, RootPathPolicy};

use super::test_utils::{file_names, read_json, Dataset, RecordingTiler};

fn single_layer() -> Dataset {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 2, 32, 24);
    data
}

/// Rewrite one key of the saved document.
fn edit_config(path: &std::path::Path, key: &str, value: serde_json::Value) {
    let mut config = read_json(path);
    config[key] = value;
    fs::write(path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
}

#[test]
fn test_round_trip_keeps_previous_root_path() {
    let data = single_layer();
    let toolkit = ImageToolkit::new();
    let tiler = RecordingTiler::new();
    let options = PipelineOptions::new(data.input(), data.output());

    let first = pipeline::run(&options, &toolkit, &tiler).unwrap();
    assert_eq!(first.config.data_root_path, "./output");
    assert!(first.backup_path.is_none());

    edit_config(&first.config_path, "data_root_path", "./published".into());

    let second = pipeline::run(&options, &toolkit, &tiler).unwrap();
    assert_eq!(second.config.data_root_path, "./published");
    assert_eq!(
        read_json(&second.config_path)["data_root_path"],
        "./published"
    );

    // The edited document was moved aside
    let backup = second.backup_path.expect("backup of the previous document");
    assert!(backup.is_file());
    assert_eq!(read_json(&backup)["data_root_path"], "./published");

    let names = file_names(&data.output());
    let backups: Vec<_> = names
        .iter()
        .filter(|n| n.starts_with("viewer.json."))
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(!backups[0].contains(':'));
}

#[test]
fn test_use_computed_root_path() {
    let data = single_layer();
    let toolkit = ImageToolkit::new();
    let tiler = RecordingTiler::new();
    let options = PipelineOptions::new(data.input(), data.output());

    let first = pipeline::run(&options, &toolkit, &tiler).unwrap();
    edit_config(&first.config_path, "data_root_path", "./published".into());

    let options = options.with_root_path_policy(RootPathPolicy::UseComputed);
    let second = pipeline::run(&options, &toolkit, &tiler).unwrap();
    assert_eq!(second.config.data_root_path, "./output");
}

#[test]
fn test_previous_image_size_and_matrix_are_kept() {
    let data = single_layer();
    let toolkit = ImageToolkit::new();
    let tiler = RecordingTiler::new();
    let options = PipelineOptions::new(data.input(), data.output());

    let first = pipeline::run(&options, &toolkit, &tiler).unwrap();
    assert_eq!(first.config.image_size, 32);

    edit_config(&first.config_path, "image_size", 1000.into());
    edit_config(
        &first.config_path,
        "matrix",
        "0.05,0,0,-13.54,0,0.05,0,-16.00,0,0,0.05,-3.0,0,0,0,1".into(),
    );

    let options = options.with_micrometers(3.0);
    let second = pipeline::run(&options, &toolkit, &tiler).unwrap();
    assert_eq!(second.config.image_size, 1000);
    assert_eq!(
        second.config.matrix,
        "0.05,0,0,-13.54,0,0.05,0,-16.00,0,0,0.05,-3.0,0,0,0,1"
    );
}

#[test]
fn test_partial_prior_fills_missing_fields() {
    let data = single_layer();
    fs::write(
        data.output().join("viewer.json"),
        r#"{"data_root_path": "./output", "image_size": 77}"#,
    )
    .unwrap();

    let options = PipelineOptions::new(data.input(), data.output()).with_micrometers(2.0);
    let outcome = pipeline::run(&options, &ImageToolkit::new(), &RecordingTiler::new()).unwrap();

    assert_eq!(outcome.config.image_size, 77);
    assert_eq!(outcome.config.matrix, "2,0,0,0,0,2,0,0,0,0,2,0,0,0,0,1");
    assert!(outcome.backup_path.is_some());
}

#[test]
fn test_config_path_is_a_directory() {
    let data = single_layer();
    fs::create_dir_all(data.output().join("viewer.json")).unwrap();
    let tiler = RecordingTiler::new();

    let options = PipelineOptions::new(data.input(), data.output());
    let err = pipeline::run(&options, &ImageToolkit::new(), &tiler).unwrap_err();

    assert!(matches!(err, PrepareError::ConfigConflict { .. }));
    assert!(err.to_string().contains("non-file"));
    // Nothing was processed
    assert!(tiler.calls().is_empty());
}

#[test]
fn test_invalid_previous_document() {
    let data = single_layer();
    fs::write(data.output().join("viewer.json"), "[1, 2").unwrap();

    let options = PipelineOptions::new(data.input(), data.output());
    let err = pipeline::run(&options, &ImageToolkit::new(), &RecordingTiler::new()).unwrap_err();
    assert!(matches!(err, PrepareError::Json { .. }));
}
