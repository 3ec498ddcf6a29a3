//! `viewer.json` document model.
//!
//! # Example (multi-plane)
//!
//! ```json
//! {
//!   "data_root_path": "./brain42",
//!   "data": { "bGF5ZXIxX3N0YWlu": { "metadata": "stain" } },
//!   "overlays": { "SVGs": { "metadata": "regions" } },
//!   "subview": {
//!     "foldername": "subview", "size": 200,
//!     "x_min": 1, "x_max": 200, "y_min": 1, "y_max": 200, "z_min": 1, "z_max": 200,
//!     "coronal_slide": 12, "sagittal_slide": 8
//!   },
//!   "coronal_slice_step": 1,
//!   "sagittal_slice_step": 1,
//!   "first_access": { "plane": "coronal", "slide": 6, "delineations": "show" },
//!   "delineations": "SVGs",
//!   "image_size": 4096,
//!   "matrix": "0.5,0,0,0,0,0.5,0,0,0,0,1,0,0,0,0,1"
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata entry of a layer or overlay set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub metadata: String,
}

/// Full configuration document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerConfig {
    pub data_root_path: String,
    /// Layers keyed by safe identifier, bottom to top
    pub data: IndexMap<String, GroupEntry>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub overlays: IndexMap<String, GroupEntry>,
    pub subview: Subview,
    #[serde(flatten)]
    pub slicing: Slicing,
    pub first_access: FirstAccess,
    /// Overlay identifier, empty without overlays
    pub delineations: String,
    pub image_size: u32,
    pub matrix: String,
}

/// `subview` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subview {
    pub foldername: String,
    pub size: u32,
    #[serde(flatten)]
    pub shape: SubviewShape,
}

/// Thumbnail bounds, flat for one plane and per dimension for several.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubviewShape {
    SinglePlane {
        min: u32,
        max: u32,
    },
    MultiPlane {
        x_min: u32,
        x_max: u32,
        y_min: u32,
        y_max: u32,
        z_min: u32,
        z_max: u32,
        /// `<axis>_slide` slice counts
        #[serde(flatten)]
        slides: IndexMap<String, usize>,
    },
}

/// Top-level slice counts and steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Slicing {
    SinglePlane { slide_count: usize, slice_step: u32 },
    /// `<axis>_slice_step` entries
    MultiPlane(IndexMap<String, u32>),
}

/// Overlay visibility on first display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Show,
    Hide,
}

/// Initial view of the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstAccess {
    pub plane: String,
    pub slide: usize,
    pub delineations: Visibility,
}

/// The fields of a previous document that survive a new run.
///
/// Every other key is recomputed, so parsing stays lenient.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriorConfig {
    #[serde(default)]
    pub data_root_path: Option<String>,
    #[serde(default)]
    pub image_size: Option<u32>,
    #[serde(default)]
    pub matrix: Option<String>,
}
