//! Pyramid, subview and overlay production.
//!
//! # Output layout
//!
//! ```text
//! <out>/<safe_id>[/<axis>]/<index>.dzi       one pyramid per slice
//! <out>/<safe_id>[/<axis>]/<index>_files/
//! <out>/SVGs[/<axis>]/Anno_<index>.svg       copied overlays
//! <out>/subview/<orthogonal>.jpg             single-plane thumbnail
//! <out>/subview/<axis>/<index>.jpg           multi-plane thumbnails
//! ```
//!
//! The `[/<axis>]` segment only exists for multi-plane datasets. `<index>` is
//! the slice position in ordinal order, starting at 0.

mod overlay;
mod pyramid;
mod subview;

pub use subview::{SubviewPlan, SUBVIEW_FOLDER, SUBVIEW_SIZE};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::composition::{Axis, AxisComposition, Composition};
use crate::crop::CropPlan;
use crate::error::PrepareError;
use crate::toolkit::{PyramidParams, PyramidTiler, RasterToolkit};

/// Counts of everything written by a [`Producer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductionReport {
    pub pyramids: usize,
    pub cropped: usize,
    pub subviews: usize,
    pub placeholders: usize,
    pub overlays: usize,
}

/// Output directory naming.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    multi_plane: bool,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, multi_plane: bool) -> Self {
        Self {
            root: root.into(),
            multi_plane,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_multi_plane(&self) -> bool {
        self.multi_plane
    }

    /// Directory of a layer or overlay set within an axis.
    pub fn group_dir(&self, safe_id: &str, axis: Axis) -> PathBuf {
        let dir = self.root.join(safe_id);
        if self.multi_plane {
            dir.join(axis.name())
        } else {
            dir
        }
    }

    /// Root of the thumbnail tree.
    pub fn subview_dir(&self) -> PathBuf {
        self.root.join(SUBVIEW_FOLDER)
    }
}

/// Drives the tiler and toolkit over a whole composition.
pub struct Producer<'a, T: ?Sized, P: ?Sized> {
    toolkit: &'a T,
    tiler: &'a P,
    layout: OutputLayout,
    subview_defaults: Option<PathBuf>,
    params: PyramidParams,
}

impl<'a, T, P> Producer<'a, T, P>
where
    T: RasterToolkit + ?Sized,
    P: PyramidTiler + ?Sized,
{
    pub fn new(toolkit: &'a T, tiler: &'a P, layout: OutputLayout) -> Self {
        Self {
            toolkit,
            tiler,
            layout,
            subview_defaults: None,
            params: PyramidParams::STANDARD,
        }
    }

    /// Directory holding `<axis>.jpg` placeholder thumbnails.
    pub fn with_subview_defaults(mut self, dir: Option<PathBuf>) -> Self {
        self.subview_defaults = dir;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Produce every output of `composition`.
    pub fn produce(
        &self,
        composition: &Composition,
        plan: &CropPlan,
    ) -> Result<ProductionReport, PrepareError> {
        let mut report = ProductionReport::default();

        for axis in &composition.axes {
            info!("Preparing {} axis", axis.axis);
            let subviews = SubviewPlan::for_axis(composition, axis.axis);
            self.produce_axis(axis, plan, &subviews, &mut report)?;
        }

        info!(
            "Produced {} pyramid(s) ({} cropped), {} subview(s), {} placeholder(s), {} overlay file(s)",
            report.pyramids, report.cropped, report.subviews, report.placeholders, report.overlays
        );
        Ok(report)
    }

    fn produce_axis(
        &self,
        axis: &AxisComposition,
        plan: &CropPlan,
        subviews: &SubviewPlan,
        report: &mut ProductionReport,
    ) -> Result<(), PrepareError> {
        for (layer_index, layer) in axis.layers.iter().enumerate() {
            info!("  {} ({} slice(s))", layer.spec.name, layer.slices.len());
            let out_dir = self.layout.group_dir(&layer.spec.safe_id, axis.axis);
            fs::create_dir_all(&out_dir).map_err(|e| PrepareError::io(&out_dir, e))?;

            for (index, slice) in layer.slices.iter().enumerate() {
                let geometry = plan.slice(axis.axis, layer_index, index);
                let thumbnail = if layer_index == 0 {
                    subviews.thumbnail_for(&self.layout, index)
                } else {
                    None
                };

                let descriptor = out_dir.join(format!("{index}.dzi"));
                pyramid::produce_slice(
                    self,
                    slice,
                    geometry,
                    &descriptor,
                    thumbnail.as_deref(),
                    report,
                )?;
            }
        }

        subview::write_placeholders(self, subviews, report)?;

        for set in &axis.overlays {
            let out_dir = self.layout.group_dir(&set.spec.safe_id, axis.axis);
            overlay::copy_overlay_set(set, &out_dir, report)?;
        }

        Ok(())
    }
}
