//! Dataset composition: axes, layers, overlays and their slices.
//!
//! # Model
//!
//! ```text
//! Composition
//! ├── layers:   [LayerSpec]      reference order, bottom to top
//! ├── overlays: [OverlaySpec]    at most one set
//! └── axes:     [AxisComposition] priority order, reference axis first
//!     ├── layers:   [AxisLayer]   same order as Composition::layers
//!     │   └── slices: [Slice]     integer ordinal order
//!     └── overlays: [AxisOverlay]
//!         └── files: [OverlayFile]
//! ```
//!
//! A [`Composition`] is built once by [`discover`] and is read-only
//! afterwards. Computed crop geometry lives in [`crate::crop::CropPlan`].

mod resolver;

pub use resolver::discover;

use std::fmt;
use std::path::PathBuf;

use crate::format::SliceHeader;

/// Fixed output identifier of the annotation overlay set.
pub const DELINEATION_ID: &str = "SVGs";

// =============================================================================
// Axis
// =============================================================================

/// Anatomical sectioning plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    Coronal,
    Sagittal,
    Axial,
}

impl Axis {
    /// All axes in discovery priority order.
    pub const ALL: [Axis; 3] = [Axis::Coronal, Axis::Sagittal, Axis::Axial];

    /// Directory name and configuration key prefix.
    pub const fn name(self) -> &'static str {
        match self {
            Axis::Coronal => "coronal",
            Axis::Sagittal => "sagittal",
            Axis::Axial => "axial",
        }
    }

    /// The orthogonal plane whose navigation thumbnail this axis supplies.
    pub const fn orthogonal(self) -> Axis {
        match self {
            Axis::Coronal => Axis::Sagittal,
            Axis::Sagittal => Axis::Axial,
            Axis::Axial => Axis::Coronal,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Reference Composition
// =============================================================================

/// A layer of the reference composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    /// Stacking order, bottom to top
    pub ordinal: u32,
    /// Semantic name (e.g. a stain)
    pub name: String,
    /// Directory name, identical in every axis
    pub dir_name: String,
    /// Output path segment and configuration key
    pub safe_id: String,
}

/// An overlay set of the reference composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySpec {
    pub ordinal: u32,
    pub name: String,
    pub dir_name: String,
    /// Always [`DELINEATION_ID`]
    pub safe_id: String,
}

// =============================================================================
// Per-Axis Content
// =============================================================================

/// One raster slice of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub ordinal: u32,
    /// File name without extension
    pub shortname: String,
    pub extension: String,
    pub path: PathBuf,
    /// Geometry read from the file header
    pub header: SliceHeader,
}

/// One annotation file of an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayFile {
    pub ordinal: u32,
    pub shortname: String,
    pub extension: String,
    pub path: PathBuf,
}

/// A layer's slices within one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayer {
    pub spec: LayerSpec,
    pub path: PathBuf,
    pub slices: Vec<Slice>,
}

/// An overlay's files within one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisOverlay {
    pub spec: OverlaySpec,
    pub path: PathBuf,
    pub files: Vec<OverlayFile>,
}

/// Everything discovered under one axis directory.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisComposition {
    pub axis: Axis,
    pub path: PathBuf,
    /// Same order as [`Composition::layers`]; the first is the reference layer
    pub layers: Vec<AxisLayer>,
    pub overlays: Vec<AxisOverlay>,
}

impl AxisComposition {
    /// The lowest-ordinal layer of this axis.
    pub fn reference_layer(&self) -> &AxisLayer {
        &self.layers[0]
    }

    /// Number of slices in the reference layer, shared by every layer.
    pub fn slice_count(&self) -> usize {
        self.reference_layer().slices.len()
    }
}

// =============================================================================
// Composition
// =============================================================================

/// Resolved mapping `axis -> {layers, overlays}`.
///
/// Invariants, enforced by [`discover`]:
/// - `axes` is non-empty and in [`Axis::ALL`] order;
/// - every axis holds every layer of `layers`, in the same order;
/// - within an axis, every layer has the same slice count.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub layers: Vec<LayerSpec>,
    pub overlays: Vec<OverlaySpec>,
    pub axes: Vec<AxisComposition>,
}

impl Composition {
    /// The first axis found, authoritative for layers and overlays.
    pub fn reference_axis(&self) -> &AxisComposition {
        &self.axes[0]
    }

    /// The bottom layer of the reference composition.
    pub fn reference_layer(&self) -> &LayerSpec {
        &self.layers[0]
    }

    /// More than one axis was found.
    pub fn is_multi_plane(&self) -> bool {
        self.axes.len() > 1
    }

    /// Whether an axis directory was discovered.
    pub fn contains(&self, axis: Axis) -> bool {
        self.axes.iter().any(|a| a.axis == axis)
    }

    /// Whether an annotation overlay set exists.
    pub fn has_delineations(&self) -> bool {
        !self.overlays.is_empty()
    }
}
