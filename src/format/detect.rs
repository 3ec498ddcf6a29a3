//! Format detection and header dispatch for slice files.
//!
//! Slices are identified by magic bytes, never by extension:
//!
//! - **TIFF / BigTIFF**: `II`/`MM` followed by version 42 or 43
//! - **PNG**: the eight-byte PNG signature
//!
//! Anything else falls back to the `image` crate's dimension probe, which
//! still only reads the header, with unit spacing and a zero origin.

use std::path::Path;

use tracing::debug;

use crate::error::HeaderError;
use crate::io::{FileRangeReader, RangeReader};

use super::header::SliceHeader;
use super::png::{is_png_header, read_png_header, PNG_SIGNATURE};
use super::tiff::{read_tiff_header, ByteOrder, TIFF_HEADER_SIZE};

// =============================================================================
// RasterFormat
// =============================================================================

/// Detected slice raster format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// Classic TIFF or BigTIFF
    Tiff,
    /// Portable Network Graphics
    Png,
}

impl RasterFormat {
    /// Get a human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            RasterFormat::Tiff => "TIFF",
            RasterFormat::Png => "PNG",
        }
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Check if bytes represent a valid TIFF header.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    if bytes.len() < TIFF_HEADER_SIZE {
        return false;
    }

    let byte_order = match u16::from_le_bytes([bytes[0], bytes[1]]) {
        0x4949 => ByteOrder::LittleEndian,
        0x4D4D => ByteOrder::BigEndian,
        _ => return false,
    };

    let version = byte_order.read_u16(&bytes[2..4]);
    version == 42 || version == 43
}

/// Detect the raster format from the leading bytes of a file.
pub fn detect_format<R: RangeReader + ?Sized>(
    reader: &R,
) -> Result<Option<RasterFormat>, HeaderError> {
    let probe_len = (PNG_SIGNATURE.len() as u64).min(reader.size()) as usize;
    let bytes = reader.read_exact_at(0, probe_len)?;

    if is_tiff_header(&bytes) {
        Ok(Some(RasterFormat::Tiff))
    } else if is_png_header(&bytes) {
        Ok(Some(RasterFormat::Png))
    } else {
        Ok(None)
    }
}

/// Read the header of a slice file without decoding its pixels.
pub fn read_slice_header(path: &Path) -> Result<SliceHeader, HeaderError> {
    let reader = FileRangeReader::open(path)?;

    match detect_format(&reader)? {
        Some(RasterFormat::Tiff) => read_tiff_header(&reader),
        Some(RasterFormat::Png) => read_png_header(&reader),
        None => {
            debug!(
                "{}: unknown magic, probing dimensions with the image decoder",
                reader.identifier()
            );
            let (width, height) = image::ImageReader::open(path)
                .and_then(|r| r.with_guessed_format())
                .map_err(|e| HeaderError::Unreadable(e.to_string()))?
                .into_dimensions()
                .map_err(|e| HeaderError::Unreadable(e.to_string()))?;
            Ok(SliceHeader::with_size(width, height))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
