//! Per-slice crop and pyramid generation.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::composition::Slice;
use crate::crop::SliceGeometry;
use crate::error::PrepareError;
use crate::toolkit::{PyramidTiler, RasterToolkit, Region};

use super::subview::write_thumbnail;
use super::{ProductionReport, Producer};

/// Build the pyramid of one slice, and its thumbnail when requested.
///
/// A slice that needs cropping is first extracted into a scratch PNG, which
/// is removed when this function returns, whatever the outcome.
pub(super) fn produce_slice<T, P>(
    producer: &Producer<'_, T, P>,
    slice: &Slice,
    geometry: Option<SliceGeometry>,
    descriptor: &Path,
    thumbnail: Option<&Path>,
    report: &mut ProductionReport,
) -> Result<(), PrepareError>
where
    T: RasterToolkit + ?Sized,
    P: PyramidTiler + ?Sized,
{
    let scratch = match geometry {
        Some(g) if g.needs_crop => Some(crop_to_scratch(producer, slice, g)?),
        _ => None,
    };
    let source = scratch.as_ref().map_or(slice.path.as_path(), |f| f.path());

    let summary = producer
        .tiler
        .build_pyramid(source, descriptor, &producer.params)
        .map_err(|e| PrepareError::toolkit(&slice.path, e))?;
    debug!(
        "{} -> {} ({}x{}, {} tiles)",
        slice.path.display(),
        descriptor.display(),
        summary.width,
        summary.height,
        summary.tiles
    );
    report.pyramids += 1;
    if scratch.is_some() {
        report.cropped += 1;
    }

    if let Some(target) = thumbnail {
        write_thumbnail(producer, source, target)?;
        report.subviews += 1;
    }

    Ok(())
}

fn crop_to_scratch<T, P>(
    producer: &Producer<'_, T, P>,
    slice: &Slice,
    geometry: SliceGeometry,
) -> Result<NamedTempFile, PrepareError>
where
    T: RasterToolkit + ?Sized,
    P: PyramidTiler + ?Sized,
{
    let toolkit = producer.toolkit;
    let raster = toolkit
        .read_full(&slice.path)
        .map_err(|e| PrepareError::toolkit(&slice.path, e))?;
    let region = Region {
        x: geometry.origin.x,
        y: geometry.origin.y,
        width: geometry.width,
        height: geometry.height,
    };
    let cropped = toolkit
        .extract_region(&raster, region)
        .map_err(|e| PrepareError::toolkit(&slice.path, e))?;

    let scratch = tempfile::Builder::new()
        .prefix("slice-crop-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| PrepareError::io(std::env::temp_dir(), e))?;
    toolkit
        .write(&cropped, scratch.path())
        .map_err(|e| PrepareError::toolkit(scratch.path(), e))?;

    debug!(
        "Cropped {} to {}x{} at ({}, {})",
        slice.path.display(),
        region.width,
        region.height,
        region.x,
        region.y
    );
    Ok(scratch)
}
