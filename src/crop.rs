//! Common crop region of a layer.
//!
//! Slices of a layer are registered on their own origin. The crop region is
//! the largest rectangle that, anchored at each slice's origin, fits inside
//! every slice of the layer:
//!
//! ```text
//! width  = min(slice.width  - slice.origin.x)
//! height = min(slice.height - slice.origin.y)
//! ```
//!
//! Every pyramid of the layer is then built at exactly that size.

use std::collections::HashMap;

use serde::Serialize;

use crate::composition::{Axis, Composition};
use crate::error::PrepareError;
use crate::format::{Origin, SliceHeader};

/// Size shared by every slice of a layer after cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRegion {
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Compute the crop region of a set of slices, `None` if there are none.
pub fn crop_region<'a, I>(headers: I) -> Option<CropRegion>
where
    I: IntoIterator<Item = &'a SliceHeader>,
{
    headers
        .into_iter()
        .map(SliceHeader::extent_from_origin)
        .fold(None, |acc, (w, h)| match acc {
            None => Some(CropRegion {
                width: w,
                height: h,
            }),
            Some(r) => Some(CropRegion {
                width: r.width.min(w),
                height: r.height.min(h),
            }),
        })
}

/// Whether a slice must be cropped to match the region exactly.
///
/// True when the slice extends past the region, or when its origin is not at
/// `(0, 0)` and the pixels before the origin must be dropped.
///
/// This flags more than the shifted slice alone: in a layer of three
/// 500x400 slices where only one has origin `(10, 0)`, the region is 490x400
/// and all three are cropped. The unshifted ones are ten columns too wide,
/// and tiling them uncropped would break the uniform layer size.
pub fn needs_crop(header: &SliceHeader, region: CropRegion) -> bool {
    let (w, h) = header.extent_from_origin();
    header.origin != Origin::default() || w > region.width || h > region.height
}

/// Processing geometry of one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceGeometry {
    /// Top-left corner of the kept rectangle
    pub origin: Origin,
    /// Final width
    pub width: u32,
    /// Final height
    pub height: u32,
    /// Whether the raster must be cropped before tiling
    pub needs_crop: bool,
}

/// Crop regions of every layer of every axis.
///
/// Kept beside the [`Composition`] rather than inside it; lookups use the
/// axis plus the layer and slice positions of the composition.
#[derive(Debug, Clone, Default)]
pub struct CropPlan {
    regions: HashMap<(Axis, usize), CropRegion>,
    slices: HashMap<(Axis, usize, usize), SliceGeometry>,
}

impl CropPlan {
    /// Compute the plan for a composition.
    ///
    /// # Errors
    ///
    /// [`PrepareError::InvalidComposition`] if a layer has no common area,
    /// i.e. one slice's origin lies outside it.
    pub fn compute(composition: &Composition) -> Result<Self, PrepareError> {
        let mut plan = CropPlan::default();

        for axis in &composition.axes {
            for (layer_index, layer) in axis.layers.iter().enumerate() {
                let Some(region) = crop_region(layer.slices.iter().map(|s| &s.header)) else {
                    continue;
                };
                if region.is_empty() {
                    return Err(PrepareError::InvalidComposition {
                        axis: axis.axis.to_string(),
                        message: format!(
                            "layer '{}' has an empty crop region {}x{}",
                            layer.spec.dir_name, region.width, region.height
                        ),
                    });
                }
                plan.regions.insert((axis.axis, layer_index), region);

                for (slice_index, slice) in layer.slices.iter().enumerate() {
                    plan.slices.insert(
                        (axis.axis, layer_index, slice_index),
                        SliceGeometry {
                            origin: slice.header.origin,
                            width: region.width,
                            height: region.height,
                            needs_crop: needs_crop(&slice.header, region),
                        },
                    );
                }
            }
        }

        Ok(plan)
    }

    /// Crop region of a layer within an axis.
    pub fn region(&self, axis: Axis, layer_index: usize) -> Option<CropRegion> {
        self.regions.get(&(axis, layer_index)).copied()
    }

    /// Geometry of a slice.
    pub fn slice(&self, axis: Axis, layer_index: usize, slice_index: usize) -> Option<SliceGeometry> {
        self.slices.get(&(axis, layer_index, slice_index)).copied()
    }

    /// Number of slices that must be cropped.
    pub fn crop_count(&self) -> usize {
        self.slices.values().filter(|g| g.needs_crop).count()
    }
}
