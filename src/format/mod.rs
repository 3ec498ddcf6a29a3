//! Header readers for slice rasters.
//!
//! Discovery must never materialize pixel data, so slice geometry comes from
//! purpose-built header parsers:
//!
//! - **TIFF**: first IFD only (extent, resolution, position)
//! - **PNG**: chunks before the first `IDAT` (`IHDR`, `pHYs`, `oFFs`)
//!
//! Use [`detect::read_slice_header`] to read any supported slice file.

pub mod detect;
pub mod header;
pub mod png;
pub mod tiff;

pub use detect::{detect_format, is_tiff_header, read_slice_header, RasterFormat};
pub use header::{Origin, SliceHeader, Spacing};
