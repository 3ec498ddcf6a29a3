//! End-to-end pipeline runs.
//!
//! Tests verify:
//! - Single-plane and multi-plane output layouts and configuration shapes
//! - Subview policy, including placeholders for a missing orthogonal axis
//! - Overlay copies follow ordinal order
//! - Real Deep Zoom output from the production tiler

use std::fs;

use slice_atlas::pipeline;
use slice_atlas::toolkit::{DeepZoomTiler, ImageToolkit, PyramidParams};
use slice_atlas::{PipelineOptions, PrepareError};

use super::test_utils::{file_names, read_json, Dataset, RecordingTiler};

const STAIN_ID: &str = "bGF5ZXIxX3N0YWlu";

// =============================================================================
// Single Plane
// =============================================================================

#[test]
fn test_single_plane_coronal() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 3, 64, 48);
    let tiler = RecordingTiler::new();

    let options = PipelineOptions::new(data.input(), data.output());
    let outcome = pipeline::run(&options, &ImageToolkit::new(), &tiler).unwrap();

    // One pyramid per slice, indexed by position
    let out = data.output();
    let descriptors: Vec<_> = tiler.calls().iter().map(|c| c.descriptor.clone()).collect();
    assert_eq!(
        descriptors,
        vec![
            out.join(STAIN_ID).join("0.dzi"),
            out.join(STAIN_ID).join("1.dzi"),
            out.join(STAIN_ID).join("2.dzi"),
        ]
    );
    assert!(tiler
        .calls()
        .iter()
        .all(|c| c.params == PyramidParams::STANDARD));

    // Exactly one thumbnail, for the orthogonal plane
    assert_eq!(file_names(&out.join("subview")), vec!["sagittal.jpg"]);
    assert_eq!(
        image::image_dimensions(out.join("subview/sagittal.jpg")).unwrap(),
        (200, 200)
    );
    assert_eq!(outcome.report.subviews, 1);
    assert_eq!(outcome.report.placeholders, 0);

    let config = read_json(&out.join("viewer.json"));
    assert_eq!(config["slide_count"], 3);
    assert_eq!(config["slice_step"], 1);
    assert_eq!(config["subview"]["min"], 1);
    assert_eq!(config["subview"]["max"], 200);
    assert!(config["subview"].get("x_min").is_none());
    assert!(config["subview"].get("coronal_slide").is_none());
    assert!(config.get("coronal_slice_step").is_none());

    assert_eq!(config["data"][STAIN_ID]["metadata"], "stain");
    assert_eq!(config["first_access"]["plane"], "coronal");
    assert_eq!(config["first_access"]["slide"], 1);
    assert_eq!(config["first_access"]["delineations"], "hide");
    assert_eq!(config["delineations"], "");
    assert_eq!(config["image_size"], 64);
    assert_eq!(config["matrix"], "1,0,0,0,0,1,0,0,0,0,1,0,0,0,0,1");
    assert_eq!(config["data_root_path"], "./output");
}

#[test]
fn test_micrometer_scalar_scales_matrix() {
    let data = Dataset::new();
    data.layer("axial", "layer1_stain", 1, 16, 16);

    let options = PipelineOptions::new(data.input(), data.output()).with_micrometers(0.5);
    let outcome = pipeline::run(&options, &ImageToolkit::new(), &RecordingTiler::new()).unwrap();
    assert_eq!(outcome.config.matrix, "0.5,0,0,0,0,0.5,0,0,0,0,0.5,0,0,0,0,1");
}

// =============================================================================
// Multi Plane
// =============================================================================

#[test]
fn test_two_axes_multi_plane() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 3, 40, 40)
        .layer("coronal", "layer2_neun", 3, 40, 40)
        .layer("sagittal", "layer1_stain", 2, 30, 30)
        .layer("sagittal", "layer2_neun", 2, 30, 30);
    let tiler = RecordingTiler::new();

    let options = PipelineOptions::new(data.input(), data.output());
    let outcome = pipeline::run(&options, &ImageToolkit::new(), &tiler).unwrap();
    let out = data.output();

    // Pyramids nested under the axis
    assert_eq!(tiler.calls().len(), 10);
    assert_eq!(tiler.calls_under(&out.join(STAIN_ID).join("coronal")).len(), 3);
    assert_eq!(tiler.calls_under(&out.join(STAIN_ID).join("sagittal")).len(), 2);

    // coronal -> sagittal exists: one computed thumbnail per slice
    assert_eq!(
        file_names(&out.join("subview/coronal")),
        vec!["0.jpg", "1.jpg", "2.jpg"]
    );
    // sagittal -> axial is missing: placeholders
    assert_eq!(file_names(&out.join("subview/sagittal")), vec!["0.jpg", "1.jpg"]);
    assert_eq!(outcome.report.subviews, 3);
    assert_eq!(outcome.report.placeholders, 2);

    let config = read_json(&out.join("viewer.json"));
    let subview = &config["subview"];
    for key in ["x_min", "y_min", "z_min"] {
        assert_eq!(subview[key], 1, "{key}");
    }
    for key in ["x_max", "y_max", "z_max"] {
        assert_eq!(subview[key], 200, "{key}");
    }
    assert!(subview.get("min").is_none());
    assert_eq!(subview["coronal_slide"], 3);
    assert_eq!(subview["sagittal_slide"], 2);
    assert_eq!(config["coronal_slice_step"], 1);
    assert_eq!(config["sagittal_slice_step"], 1);
    assert!(config.get("slide_count").is_none());

    // First access from the first axis only
    assert_eq!(config["first_access"]["plane"], "coronal");
    assert_eq!(config["first_access"]["slide"], 1);
}

#[test]
fn test_missing_orthogonal_axis_uses_default_image() {
    let data = Dataset::new();
    data.layer("sagittal", "layer1_stain", 2, 20, 20)
        .layer("axial", "layer1_stain", 3, 20, 20);

    let defaults = data.extra("defaults");
    fs::write(defaults.join("coronal.jpg"), b"coronal placeholder").unwrap();

    let options = PipelineOptions::new(data.input(), data.output())
        .with_subview_defaults(Some(defaults));
    let outcome = pipeline::run(&options, &ImageToolkit::new(), &RecordingTiler::new()).unwrap();
    let out = data.output();

    // axial -> coronal is missing: copies of the static default
    for i in 0..3 {
        let bytes = fs::read(out.join(format!("subview/axial/{i}.jpg"))).unwrap();
        assert_eq!(bytes, b"coronal placeholder");
    }
    // sagittal -> axial exists: computed downsamples
    let computed = out.join("subview/sagittal/0.jpg");
    assert_eq!(image::image_dimensions(&computed).unwrap(), (200, 200));

    assert_eq!(outcome.report.placeholders, 3);
    assert_eq!(outcome.report.subviews, 2);
}

#[test]
fn test_missing_default_image_renders_placeholder() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 1, 20, 20)
        .layer("axial", "layer1_stain", 1, 20, 20);

    let options = PipelineOptions::new(data.input(), data.output())
        .with_subview_defaults(Some(data.extra("empty-defaults")));
    pipeline::run(&options, &ImageToolkit::new(), &RecordingTiler::new()).unwrap();

    // coronal -> sagittal is missing, and no sagittal.jpg default exists
    let rendered = image::open(data.output().join("subview/coronal/0.jpg"))
        .unwrap()
        .to_rgb8();
    assert_eq!(rendered.dimensions(), (200, 200));
    let pixel = rendered.get_pixel(100, 100);
    assert!(pixel.0.iter().all(|&c| (120..=136).contains(&c)), "{pixel:?}");
}

// =============================================================================
// Overlays
// =============================================================================

#[test]
fn test_overlays_copied_in_ordinal_order() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 3, 10, 10)
        .overlay("coronal", "overlay1_regions", "a_10.svg", "ten")
        .overlay("coronal", "overlay1_regions", "a_2.svg", "two")
        .overlay("coronal", "overlay1_regions", "a_9.svg", "nine");

    let options = PipelineOptions::new(data.input(), data.output());
    let outcome = pipeline::run(&options, &ImageToolkit::new(), &RecordingTiler::new()).unwrap();
    let svgs = data.output().join("SVGs");

    assert_eq!(fs::read_to_string(svgs.join("Anno_0.svg")).unwrap(), "two");
    assert_eq!(fs::read_to_string(svgs.join("Anno_1.svg")).unwrap(), "nine");
    assert_eq!(fs::read_to_string(svgs.join("Anno_2.svg")).unwrap(), "ten");
    assert_eq!(outcome.report.overlays, 3);

    let config = read_json(&data.output().join("viewer.json"));
    assert_eq!(config["delineations"], "SVGs");
    assert_eq!(config["first_access"]["delineations"], "show");
    assert_eq!(config["overlays"]["SVGs"]["metadata"], "regions");
    assert!(config["data"].get("SVGs").is_none());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_fatal_error_writes_no_config() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 2, 10, 10)
        .layer("coronal", "layer2_neun", 1, 10, 10);

    let options = PipelineOptions::new(data.input(), data.output());
    let err = pipeline::run(&options, &ImageToolkit::new(), &RecordingTiler::new()).unwrap_err();

    assert!(matches!(err, PrepareError::Consistency { .. }));
    assert!(!data.output().join("viewer.json").exists());
}

#[test]
fn test_missing_paths() {
    let data = Dataset::new();
    let toolkit = ImageToolkit::new();
    let tiler = RecordingTiler::new();

    let options = PipelineOptions::new(data.input(), data.output().join("missing"));
    assert!(matches!(
        pipeline::run(&options, &toolkit, &tiler),
        Err(PrepareError::Path { .. })
    ));

    let options = PipelineOptions::new(data.input().join("missing"), data.output());
    assert!(matches!(
        pipeline::run(&options, &toolkit, &tiler),
        Err(PrepareError::Path { .. })
    ));

    // Input exists but holds no axis directory
    let options = PipelineOptions::new(data.input(), data.output());
    assert!(matches!(
        pipeline::run(&options, &toolkit, &tiler),
        Err(PrepareError::Path { .. })
    ));
    assert!(tiler.calls().is_empty());
}

// =============================================================================
// Production Tiler
// =============================================================================

#[test]
fn test_deep_zoom_output() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 2, 300, 120);

    let options = PipelineOptions::new(data.input(), data.output());
    let outcome = pipeline::run(&options, &ImageToolkit::new(), &DeepZoomTiler::new()).unwrap();
    assert_eq!(outcome.report.pyramids, 2);

    let layer_dir = data.output().join(STAIN_ID);
    let xml = fs::read_to_string(layer_dir.join("0.dzi")).unwrap();
    assert!(xml.contains("TileSize=\"256\""));
    assert!(xml.contains("Overlap=\"1\""));
    assert!(xml.contains("Format=\"jpg\""));
    assert!(xml.contains("Width=\"300\""));
    assert!(xml.contains("Height=\"120\""));

    // 300 px -> max level 9, two columns at full resolution
    assert!(layer_dir.join("0_files/9/0_0.jpg").is_file());
    assert!(layer_dir.join("0_files/9/1_0.jpg").is_file());
    assert!(layer_dir.join("1_files/0/0_0.jpg").is_file());
}
