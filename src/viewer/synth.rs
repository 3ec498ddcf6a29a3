//! Configuration synthesis from a composition and its crop plan.

use std::path::Path;

use clap::ValueEnum;
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::composition::{Composition, DELINEATION_ID};
use crate::crop::CropPlan;
use crate::error::PrepareError;
use crate::format::Spacing;
use crate::produce::{SUBVIEW_FOLDER, SUBVIEW_SIZE};

use super::document::{
    FirstAccess, GroupEntry, PriorConfig, Slicing, Subview, SubviewShape, ViewerConfig,
    Visibility,
};

/// Smallest thumbnail coordinate.
const SUBVIEW_MIN: u32 = 1;

/// Distance between consecutive slices, in slice units.
const SLICE_STEP: u32 = 1;

/// What to do when a previous document names another data root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RootPathPolicy {
    /// Keep the previous `data_root_path`
    #[default]
    KeepPrevious,
    /// Replace it with the path derived from the output directory
    UseComputed,
}

/// Builds a [`ViewerConfig`].
#[derive(Debug, Clone)]
pub struct Synthesizer {
    policy: RootPathPolicy,
    micrometers: f64,
}

impl Synthesizer {
    /// `micrometers` scales the spacing of the transform matrix.
    pub fn new(policy: RootPathPolicy, micrometers: f64) -> Self {
        Self {
            policy,
            micrometers,
        }
    }

    /// Fold the composition into a document, honoring a previous one.
    pub fn synthesize(
        &self,
        composition: &Composition,
        plan: &CropPlan,
        output_root: &Path,
        prior: Option<&PriorConfig>,
    ) -> Result<ViewerConfig, PrepareError> {
        let data: IndexMap<String, GroupEntry> = composition
            .layers
            .iter()
            .map(|layer| {
                (
                    layer.safe_id.clone(),
                    GroupEntry {
                        metadata: layer.name.clone(),
                    },
                )
            })
            .collect();
        let overlays: IndexMap<String, GroupEntry> = composition
            .overlays
            .iter()
            .map(|overlay| {
                (
                    overlay.safe_id.clone(),
                    GroupEntry {
                        metadata: overlay.name.clone(),
                    },
                )
            })
            .collect();

        let (shape, slicing) = subview_shape(composition);

        let reference_axis = composition.reference_axis();
        let first_access = FirstAccess {
            plane: reference_axis.axis.name().to_string(),
            slide: reference_axis.slice_count() / 2,
            delineations: if composition.has_delineations() {
                Visibility::Show
            } else {
                Visibility::Hide
            },
        };
        let delineations = if composition.has_delineations() {
            DELINEATION_ID.to_string()
        } else {
            String::new()
        };

        let prior_image_size = prior.and_then(|p| p.image_size);
        let prior_matrix = prior.and_then(|p| p.matrix.clone());
        let (image_size, matrix) = match (prior_image_size, prior_matrix) {
            (Some(size), Some(matrix)) => (size, matrix),
            (size, matrix) => {
                let (computed_size, spacing) = reference_geometry(composition, plan)?;
                (
                    size.unwrap_or(computed_size),
                    matrix.unwrap_or_else(|| transform_matrix(spacing, self.micrometers)),
                )
            }
        };

        Ok(ViewerConfig {
            data_root_path: self.root_path(output_root, prior),
            data,
            overlays,
            subview: Subview {
                foldername: SUBVIEW_FOLDER.to_string(),
                size: SUBVIEW_SIZE,
                shape,
            },
            slicing,
            first_access,
            delineations,
            image_size,
            matrix,
        })
    }

    fn root_path(&self, output_root: &Path, prior: Option<&PriorConfig>) -> String {
        let computed = computed_root_path(output_root);
        let Some(previous) = prior.and_then(|p| p.data_root_path.as_deref()) else {
            return computed;
        };
        if previous == computed {
            return computed;
        }

        match self.policy {
            RootPathPolicy::KeepPrevious => {
                warn!(
                    "Keeping previous data_root_path '{}' (computed '{}')",
                    previous, computed
                );
                previous.to_string()
            }
            RootPathPolicy::UseComputed => {
                warn!(
                    "Replacing previous data_root_path '{}' with '{}'",
                    previous, computed
                );
                computed
            }
        }
    }
}

/// `"./" + <last component of the output path>`.
pub fn computed_root_path(output_root: &Path) -> String {
    let name = output_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("./{name}")
}

/// Significant digits kept in matrix entries.
const MATRIX_SIGNIFICANT_DIGITS: usize = 12;

/// Row-major 4x4 affine scaling pixels to physical units.
pub fn transform_matrix(spacing: Spacing, micrometers: f64) -> String {
    let sx = matrix_entry(spacing.x * micrometers);
    let sy = matrix_entry(spacing.y * micrometers);
    let u = matrix_entry(micrometers);
    format!("{sx},0,0,0,0,{sy},0,0,0,0,{u},0,0,0,0,1")
}

/// Shortest decimal form of `value` rounded to
/// [`MATRIX_SIGNIFICANT_DIGITS`], so that `0.7 * 0.1` prints as `0.07`.
fn matrix_entry(value: f64) -> String {
    let rounded = format!("{:.*e}", MATRIX_SIGNIFICANT_DIGITS - 1, value);
    rounded.parse::<f64>().unwrap_or(value).to_string()
}

fn subview_shape(composition: &Composition) -> (SubviewShape, Slicing) {
    if !composition.is_multi_plane() {
        let count = composition.reference_axis().slice_count();
        return (
            SubviewShape::SinglePlane {
                min: SUBVIEW_MIN,
                max: SUBVIEW_SIZE,
            },
            Slicing::SinglePlane {
                slide_count: count,
                slice_step: SLICE_STEP,
            },
        );
    }

    let mut slides = IndexMap::new();
    let mut steps = IndexMap::new();
    for axis in &composition.axes {
        slides.insert(format!("{}_slide", axis.axis), axis.slice_count());
        steps.insert(format!("{}_slice_step", axis.axis), SLICE_STEP);
    }

    (
        SubviewShape::MultiPlane {
            x_min: SUBVIEW_MIN,
            x_max: SUBVIEW_SIZE,
            y_min: SUBVIEW_MIN,
            y_max: SUBVIEW_SIZE,
            z_min: SUBVIEW_MIN,
            z_max: SUBVIEW_SIZE,
            slides,
        },
        Slicing::MultiPlane(steps),
    )
}

/// Image size and spacing of the reference axis's reference layer's first
/// slice.
fn reference_geometry(
    composition: &Composition,
    plan: &CropPlan,
) -> Result<(u32, Spacing), PrepareError> {
    let axis = composition.reference_axis();
    let layer = axis.reference_layer();
    let (Some(slice), Some(geometry)) = (layer.slices.first(), plan.slice(axis.axis, 0, 0)) else {
        return Err(PrepareError::InvalidComposition {
            axis: axis.axis.to_string(),
            message: format!("reference layer '{}' holds no slice", layer.spec.dir_name),
        });
    };

    let size = geometry.width.max(geometry.height);
    info!(
        "Image size {} from {} (spacing {} x {})",
        size,
        slice.path.display(),
        slice.header.spacing.x,
        slice.header.spacing.y
    );
    Ok((size, slice.header.spacing))
}
