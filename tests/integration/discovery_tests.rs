//! Composition discovery against real directory trees.
//!
//! Tests verify:
//! - Layer and slice ordering follows integer ordinals only
//! - Every axis carries the reference composition
//! - Structural violations name the offending axis and layers
//! - Headers are read from real PNG and TIFF files

use slice_atlas::composition::{discover, Axis};
use slice_atlas::error::PrepareError;
use slice_atlas::naming::safe_identifier;
use slice_atlas::toolkit::ImageToolkit;

use super::test_utils::Dataset;

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_slice_order_independent_of_creation_order() {
    let forward = Dataset::new();
    for i in [1, 2, 3, 9, 10, 11] {
        forward.slice("coronal", "layer1_stain", &format!("brain_{i}.png"), 8, 8);
    }

    let shuffled = Dataset::new();
    for i in [10, 2, 11, 1, 9, 3] {
        shuffled.slice("coronal", "layer1_stain", &format!("brain_{i}.png"), 8, 8);
    }

    let toolkit = ImageToolkit::new();
    let a = discover(&forward.input(), &toolkit).unwrap();
    let b = discover(&shuffled.input(), &toolkit).unwrap();

    let ordinals = |c: &slice_atlas::Composition| -> Vec<u32> {
        c.axes[0].layers[0].slices.iter().map(|s| s.ordinal).collect()
    };
    assert_eq!(ordinals(&a), vec![1, 2, 3, 9, 10, 11]);
    assert_eq!(ordinals(&a), ordinals(&b));
}

#[test]
fn test_layers_sorted_by_numeric_ordinal() {
    let data = Dataset::new();
    data.layer("coronal", "layer10_top", 1, 4, 4)
        .layer("coronal", "layer2_middle", 1, 4, 4)
        .layer("coronal", "layer1_bottom", 1, 4, 4);

    let composition = discover(&data.input(), &ImageToolkit::new()).unwrap();
    let names: Vec<_> = composition.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["bottom", "middle", "top"]);
    assert_eq!(composition.reference_layer().dir_name, "layer1_bottom");
    assert_eq!(
        composition.reference_layer().safe_id,
        safe_identifier("layer1_bottom")
    );
}

#[test]
fn test_non_matching_entries_are_skipped() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 2, 4, 4)
        .overlay("coronal", "layer1_stain", "notes.txt", "x")
        .overlay("coronal", "layer1_stain", "thumb.jpg", "x")
        .overlay("coronal", "scans", "s_1.png", "x")
        .overlay("other", "layer1_stain", "s_1.png", "x");

    let composition = discover(&data.input(), &ImageToolkit::new()).unwrap();
    assert_eq!(composition.axes.len(), 1);
    assert_eq!(composition.layers.len(), 1);
    assert_eq!(composition.axes[0].slice_count(), 2);
}

// =============================================================================
// Composition Equality Across Axes
// =============================================================================

#[test]
fn test_every_axis_carries_reference_layers() {
    let data = Dataset::new();
    for axis in ["coronal", "sagittal", "axial"] {
        data.layer(axis, "layer1_stain", 2, 6, 6)
            .layer(axis, "layer2_neun", 2, 6, 6)
            .overlay(axis, "overlay1_regions", "a_1.svg", "<svg/>")
            .overlay(axis, "overlay1_regions", "a_2.svg", "<svg/>");
    }
    // Extra layer outside the reference axis is ignored
    data.layer("axial", "layer3_extra", 2, 6, 6);

    let composition = discover(&data.input(), &ImageToolkit::new()).unwrap();
    assert!(composition.is_multi_plane());
    assert_eq!(
        composition.axes.iter().map(|a| a.axis).collect::<Vec<_>>(),
        Axis::ALL.to_vec()
    );

    let reference: Vec<_> = composition.layers.iter().map(|l| &l.safe_id).collect();
    for axis in &composition.axes {
        let ids: Vec<_> = axis.layers.iter().map(|l| &l.spec.safe_id).collect();
        assert_eq!(ids, reference);
        assert_eq!(axis.overlays.len(), 1);
        assert_eq!(axis.overlays[0].files.len(), 2);
    }
}

#[test]
fn test_missing_layer_names_axis_and_layer() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 1, 4, 4)
        .layer("coronal", "layer2_neun", 1, 4, 4)
        .layer("axial", "layer1_stain", 1, 4, 4);

    let err = discover(&data.input(), &ImageToolkit::new()).unwrap_err();
    assert!(matches!(err, PrepareError::Composition { .. }));
    let message = err.to_string();
    assert!(message.contains("axial"), "{message}");
    assert!(message.contains("layer2_neun"), "{message}");
}

#[test]
fn test_slice_count_mismatch_names_both_layers() {
    let data = Dataset::new();
    data.layer("sagittal", "layer1_stain", 3, 4, 4)
        .layer("sagittal", "layer2_neun", 2, 4, 4);

    let err = discover(&data.input(), &ImageToolkit::new()).unwrap_err();
    match err {
        PrepareError::Consistency {
            axis,
            layer,
            count,
            reference_layer,
            reference_count,
        } => {
            assert_eq!(axis, "sagittal");
            assert_eq!(layer, "layer2_neun");
            assert_eq!(count, 2);
            assert_eq!(reference_layer, "layer1_stain");
            assert_eq!(reference_count, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// Header Inspection
// =============================================================================

#[test]
fn test_headers_from_png_and_tiff() {
    let data = Dataset::new();
    data.slice("coronal", "layer1_stain", "s_1.png", 40, 30);
    let tif = data.input().join("coronal/layer1_stain/s_2.tif");
    image::RgbImage::new(41, 31)
        .save_with_format(&tif, image::ImageFormat::Tiff)
        .unwrap();

    let composition = discover(&data.input(), &ImageToolkit::new()).unwrap();
    let slices = &composition.axes[0].layers[0].slices;
    assert_eq!(slices.len(), 2);
    assert_eq!((slices[0].header.width, slices[0].header.height), (40, 30));
    assert_eq!((slices[1].header.width, slices[1].header.height), (41, 31));
    assert_eq!(slices[1].extension, "tif");
}

#[test]
fn test_unreadable_header_is_fatal() {
    let data = Dataset::new();
    data.overlay("coronal", "layer1_stain", "s_1.png", "not a png");

    let err = discover(&data.input(), &ImageToolkit::new()).unwrap_err();
    assert!(matches!(err, PrepareError::Header { .. }));
}
