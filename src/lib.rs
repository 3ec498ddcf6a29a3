//! # slice-atlas
//!
//! Prepares stacks of large 2-D slide images for a multi-plane web viewer.
//!
//! Given a source tree organized by anatomical axis, layer and annotation
//! overlay, the library:
//!
//! - **Discovers** the composition: axes, layers and overlays, ordered by the
//!   integer ordinals of their names, checked for consistency across axes
//! - **Aligns** each layer on a common crop region anchored at every slice's
//!   registered origin
//! - **Produces** one Deep Zoom pyramid per slice, navigation thumbnails and
//!   copies of the annotation files
//! - **Synthesizes** the `viewer.json` document, honoring a previous one
//!
//! ## Input layout
//!
//! ```text
//! <input>/coronal/layer1_stain/brain_001.tif
//! <input>/coronal/layer2_neun/brain_001.tif
//! <input>/coronal/overlay1_regions/brain_001.svg
//! <input>/sagittal/...
//! ```
//!
//! ## Architecture
//!
//! - [`io`] - positioned reads used by the header parsers
//! - [`mod@format`] - TIFF and PNG header parsing, no pixel decode
//! - [`naming`] - directory and file naming convention
//! - [`composition`] - composition model and discovery
//! - [`crop`] - common crop regions
//! - [`toolkit`] - raster toolkit and Deep Zoom tiler
//! - [`produce`] - pyramids, subviews and overlay copies
//! - [`viewer`] - configuration document
//! - [`pipeline`] - end-to-end run
//! - [`config`] - CLI and prompts
//!
//! ## Example
//!
//! ```rust,no_run
//! use slice_atlas::{pipeline, DeepZoomTiler, ImageToolkit, PipelineOptions};
//!
//! let options = PipelineOptions::new("/data/raw/brain42", "/data/www/brain42")
//!     .with_micrometers(0.5);
//! let outcome = pipeline::run(&options, &ImageToolkit::new(), &DeepZoomTiler::new())?;
//! println!("{} pyramids", outcome.report.pyramids);
//! # Ok::<(), slice_atlas::PrepareError>(())
//! ```

pub mod composition;
pub mod config;
pub mod crop;
pub mod error;
pub mod format;
pub mod io;
pub mod naming;
pub mod pipeline;
pub mod produce;
pub mod toolkit;
pub mod viewer;

// Re-export commonly used types
pub use composition::{discover, Axis, Composition};
pub use config::{Cli, PipelineOptions};
pub use crop::{crop_region, needs_crop, CropPlan, CropRegion};
pub use error::{HeaderError, IoError, PrepareError, ToolkitError};
pub use format::{read_slice_header, Origin, SliceHeader, Spacing};
pub use pipeline::{run, PipelineOutcome};
pub use produce::{OutputLayout, ProductionReport, Producer};
pub use toolkit::{
    DeepZoomTiler, ImageToolkit, MetadataInspector, PyramidParams, PyramidTiler, RasterToolkit,
};
pub use viewer::{RootPathPolicy, Synthesizer, ViewerConfig};
