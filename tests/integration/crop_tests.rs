//! Crop region computation and application.
//!
//! Tests verify:
//! - A shifted origin shrinks the layer's crop region
//! - Shifted or oversized slices are cropped before tiling
//! - Scratch rasters do not outlive their slice, even when tiling fails
//! - Final sizes never exceed raw sizes

use slice_atlas::composition::{discover, Axis};
use slice_atlas::crop::{crop_region, CropPlan, CropRegion};
use slice_atlas::pipeline;
use slice_atlas::{PipelineOptions, PrepareError};

use super::test_utils::{Dataset, FailingTiler, OriginToolkit, RecordingTiler};

/// Shifts `s_2.png` by 10 columns.
fn shifted_toolkit() -> OriginToolkit {
    OriginToolkit::new().with_origin("s_2.png", 10, 0)
}

#[test]
fn test_shifted_origin_crop_region() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 3, 500, 400);

    let composition = discover(&data.input(), &shifted_toolkit()).unwrap();
    let plan = CropPlan::compute(&composition).unwrap();

    assert_eq!(
        plan.region(Axis::Coronal, 0),
        Some(CropRegion {
            width: 490,
            height: 400
        })
    );

    let shifted = plan.slice(Axis::Coronal, 0, 1).unwrap();
    assert!(shifted.needs_crop);
    assert_eq!((shifted.origin.x, shifted.origin.y), (10, 0));

    for i in 0..3 {
        let geometry = plan.slice(Axis::Coronal, 0, i).unwrap();
        assert_eq!((geometry.width, geometry.height), (490, 400));
    }
}

#[test]
fn test_crop_applied_before_tiling() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 3, 500, 400);
    for i in 1..=3 {
        data.slice("coronal", "layer2_neun", &format!("n_{i}.png"), 500, 400);
    }
    let toolkit = shifted_toolkit();
    let tiler = RecordingTiler::new();

    let options = PipelineOptions::new(data.input(), data.output());
    let outcome = pipeline::run(&options, &toolkit, &tiler).unwrap();

    // layer2 is unaffected by the shift in layer1
    let plan = CropPlan::compute(&outcome.composition).unwrap();
    assert_eq!(
        plan.region(Axis::Coronal, 1),
        Some(CropRegion {
            width: 500,
            height: 400
        })
    );
    assert_eq!(outcome.report.cropped, 3);

    let calls = tiler.calls();
    assert_eq!(calls.len(), 6);
    let (cropped, direct): (Vec<_>, Vec<_>) = calls
        .iter()
        .partition(|c| !c.source.starts_with(data.input()));

    assert_eq!(cropped.len(), 3);
    for call in &cropped {
        assert_eq!((call.width, call.height), (490, 400), "{call:?}");
        // Scratch rasters are gone once their slice is done
        assert!(!call.source.exists(), "{} still exists", call.source.display());
    }

    assert_eq!(direct.len(), 3);
    for call in &direct {
        assert_eq!((call.width, call.height), (500, 400));
        assert!(call.source.starts_with(data.input().join("coronal/layer2_neun")));
    }

    assert_eq!(outcome.config.image_size, 490);
}

#[test]
fn test_scratch_removed_when_tiling_fails() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 3, 500, 400);
    // s_1 is the first slice tiled; shifting it forces a scratch raster
    let toolkit = OriginToolkit::new().with_origin("s_1.png", 10, 0);
    let tiler = FailingTiler::new();

    let options = PipelineOptions::new(data.input(), data.output());
    let err = pipeline::run(&options, &toolkit, &tiler).unwrap_err();
    assert!(matches!(err, PrepareError::Toolkit { .. }), "{err}");

    // The first failure aborts the run
    let sources = tiler.sources();
    assert_eq!(sources.len(), 1);
    let (scratch, existed) = &sources[0];
    assert!(!scratch.starts_with(data.input()));
    assert!(*existed, "scratch raster was not written before tiling");
    assert!(!scratch.exists(), "{} still exists", scratch.display());

    assert!(!data.output().join("viewer.json").exists());
}

#[test]
fn test_final_size_never_exceeds_raw_size() {
    let data = Dataset::new();
    data.slice("coronal", "layer1_stain", "s_1.png", 320, 200)
        .slice("coronal", "layer1_stain", "s_2.png", 300, 240)
        .slice("coronal", "layer1_stain", "s_3.png", 310, 210);
    let toolkit = OriginToolkit::new()
        .with_origin("s_1.png", 5, 5)
        .with_origin("s_3.png", 0, 20);

    let composition = discover(&data.input(), &toolkit).unwrap();
    let plan = CropPlan::compute(&composition).unwrap();
    let region = plan.region(Axis::Coronal, 0).unwrap();
    assert_eq!(
        region,
        CropRegion {
            width: 300,
            height: 190
        }
    );

    for (i, slice) in composition.axes[0].layers[0].slices.iter().enumerate() {
        let geometry = plan.slice(Axis::Coronal, 0, i).unwrap();
        assert!(geometry.width <= slice.header.width);
        assert!(geometry.height <= slice.header.height);
    }

    // Recomputing from the cropped sizes gives the same region
    let cropped: Vec<_> = composition.axes[0].layers[0]
        .slices
        .iter()
        .map(|_| slice_atlas::SliceHeader::with_size(region.width, region.height))
        .collect();
    assert_eq!(crop_region(&cropped), Some(region));
}

#[test]
fn test_origin_outside_slice_is_rejected() {
    let data = Dataset::new();
    data.layer("coronal", "layer1_stain", 2, 50, 50);
    let toolkit = OriginToolkit::new().with_origin("s_1.png", 60, 0);

    let composition = discover(&data.input(), &toolkit).unwrap();
    assert!(CropPlan::compute(&composition).is_err());
}
