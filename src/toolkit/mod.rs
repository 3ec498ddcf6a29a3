//! Image collaborators of the pipeline.
//!
//! - [`raster`]: header inspection and whole-raster operations
//! - [`deepzoom`]: Deep Zoom pyramid generation

pub mod deepzoom;
pub mod raster;

pub use deepzoom::{
    DeepZoomTiler, PyramidParams, PyramidSummary, PyramidTiler, ResizeFilter, TileFormat,
};
pub use raster::{
    decode_slice, decode_with_limits, ImageToolkit, MetadataInspector, Raster, RasterToolkit, Region, ResampleTarget,
};
