//! Orthogonal-plane navigation thumbnails.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::composition::{Axis, Composition};
use crate::error::PrepareError;
use crate::toolkit::{PyramidTiler, RasterToolkit, ResampleTarget};

use super::{OutputLayout, ProductionReport, Producer};

/// Folder of the thumbnail tree, relative to the output root.
pub const SUBVIEW_FOLDER: &str = "subview";

/// Side of a square thumbnail, in pixels.
pub const SUBVIEW_SIZE: u32 = 200;

/// Which thumbnails an axis supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubviewPlan {
    /// Single-plane: the center slice feeds `subview/<orthogonal>.jpg`.
    Center { center: usize, orthogonal: Axis },
    /// Multi-plane: every slice feeds `subview/<axis>/<index>.jpg`.
    PerSlice { axis: Axis },
    /// Multi-plane with the orthogonal axis missing: every
    /// `subview/<axis>/<index>.jpg` is a copy of the orthogonal placeholder.
    Placeholder {
        axis: Axis,
        orthogonal: Axis,
        count: usize,
    },
}

impl SubviewPlan {
    /// Decide the thumbnails of `axis`, which must be part of `composition`.
    pub fn for_axis(composition: &Composition, axis: Axis) -> Self {
        let count = composition
            .axes
            .iter()
            .find(|a| a.axis == axis)
            .map_or(0, |a| a.slice_count());
        let orthogonal = axis.orthogonal();

        if !composition.is_multi_plane() {
            SubviewPlan::Center {
                center: count / 2,
                orthogonal,
            }
        } else if composition.contains(orthogonal) {
            SubviewPlan::PerSlice { axis }
        } else {
            SubviewPlan::Placeholder {
                axis,
                orthogonal,
                count,
            }
        }
    }

    /// Thumbnail to compute from the reference layer slice at `index`.
    pub fn thumbnail_for(&self, layout: &OutputLayout, index: usize) -> Option<PathBuf> {
        match *self {
            SubviewPlan::Center { center, orthogonal } if center == index => Some(
                layout
                    .subview_dir()
                    .join(format!("{}.jpg", orthogonal.name())),
            ),
            SubviewPlan::PerSlice { axis } => Some(
                layout
                    .subview_dir()
                    .join(axis.name())
                    .join(format!("{index}.jpg")),
            ),
            _ => None,
        }
    }
}

/// Resample `source` into a square thumbnail at `target`.
pub(super) fn write_thumbnail<T, P>(
    producer: &Producer<'_, T, P>,
    source: &Path,
    target: &Path,
) -> Result<(), PrepareError>
where
    T: RasterToolkit + ?Sized,
    P: PyramidTiler + ?Sized,
{
    ensure_parent(target)?;
    let toolkit = producer.toolkit;
    let raster = toolkit
        .read_full(source)
        .map_err(|e| PrepareError::toolkit(source, e))?;
    let thumbnail = toolkit
        .resample(
            &raster,
            ResampleTarget::Size {
                width: SUBVIEW_SIZE,
                height: SUBVIEW_SIZE,
            },
        )
        .map_err(|e| PrepareError::toolkit(source, e))?;
    toolkit
        .write(&thumbnail, target)
        .map_err(|e| PrepareError::toolkit(target, e))?;
    debug!("Subview {}", target.display());
    Ok(())
}

/// Write placeholder copies for a [`SubviewPlan::Placeholder`] axis.
pub(super) fn write_placeholders<T, P>(
    producer: &Producer<'_, T, P>,
    plan: &SubviewPlan,
    report: &mut ProductionReport,
) -> Result<(), PrepareError>
where
    T: RasterToolkit + ?Sized,
    P: PyramidTiler + ?Sized,
{
    let SubviewPlan::Placeholder {
        axis,
        orthogonal,
        count,
    } = *plan
    else {
        return Ok(());
    };

    warn!(
        "No {} axis: {} subviews use the {} placeholder",
        orthogonal, axis, orthogonal
    );

    let dir = producer.layout.subview_dir().join(axis.name());
    fs::create_dir_all(&dir).map_err(|e| PrepareError::io(&dir, e))?;

    let default_image = producer
        .subview_defaults
        .as_ref()
        .map(|d| d.join(format!("{}.jpg", orthogonal.name())))
        .filter(|p| p.is_file());

    for index in 0..count {
        let target = dir.join(format!("{index}.jpg"));
        match &default_image {
            Some(source) => {
                fs::copy(source, &target).map_err(|e| PrepareError::io(&target, e))?;
            }
            None => {
                let raster = producer.toolkit.placeholder(SUBVIEW_SIZE, SUBVIEW_SIZE);
                producer
                    .toolkit
                    .write(&raster, &target)
                    .map_err(|e| PrepareError::toolkit(&target, e))?;
            }
        }
        report.placeholders += 1;
    }

    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), PrepareError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| PrepareError::io(parent, e)),
        None => Ok(()),
    }
}
