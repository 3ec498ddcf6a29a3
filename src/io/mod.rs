//! Header-level file access.
//!
//! Discovery reads only the first few kilobytes of each slice, so the format
//! parsers work against a [`RangeReader`] instead of a decoded raster.

mod range_reader;

pub use range_reader::{FileRangeReader, MemoryRangeReader, RangeReader};
