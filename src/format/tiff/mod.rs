//! TIFF header reader.
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian,
//!   MM = big-endian) in the header; every multi-byte value follows it.
//! - **Classic TIFF vs BigTIFF**: 32-bit vs 64-bit offsets, handled transparently.
//! - **Geometry only**: the first IFD gives the pixel extent, the resolution
//!   (converted to micrometers per pixel) and the position (converted to the
//!   registered origin in pixels). Strips and tiles are never touched.

mod parser;
mod tags;

pub use parser::{
    read_rational, read_uint, ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE,
    TIFF_HEADER_SIZE,
};
pub use tags::{FieldType, ResolutionUnit, TiffTag};

use tracing::debug;

use crate::error::HeaderError;
use crate::io::RangeReader;

use super::header::{Origin, SliceHeader, Spacing};

/// Read slice geometry from the first IFD of a TIFF file.
pub fn read_tiff_header<R: RangeReader + ?Sized>(reader: &R) -> Result<SliceHeader, HeaderError> {
    let header_len = (BIGTIFF_HEADER_SIZE as u64).min(reader.size()) as usize;
    let header_bytes = reader.read_exact_at(0, header_len)?;
    let header = TiffHeader::parse(&header_bytes, reader.size())?;
    let ifd = Ifd::read_first(reader, &header)?;
    let order = header.byte_order;

    let width = required_uint(&ifd, TiffTag::ImageWidth, order)?;
    let height = required_uint(&ifd, TiffTag::ImageLength, order)?;

    let unit = match ifd.find(TiffTag::ResolutionUnit) {
        Some(entry) => {
            let raw = read_uint(entry, TiffTag::ResolutionUnit, order)?;
            ResolutionUnit::from_u16(raw as u16).ok_or(HeaderError::InvalidTagValue {
                tag: TiffTag::ResolutionUnit.name(),
                message: format!("unknown unit {raw}"),
            })?
        }
        None => ResolutionUnit::default(),
    };

    let x_resolution = optional_rational(reader, &ifd, TiffTag::XResolution, &header)?;
    let y_resolution = optional_rational(reader, &ifd, TiffTag::YResolution, &header)?;
    let x_position = optional_rational(reader, &ifd, TiffTag::XPosition, &header)?;
    let y_position = optional_rational(reader, &ifd, TiffTag::YPosition, &header)?;

    let spacing = Spacing {
        x: spacing_from_resolution(x_resolution, unit),
        y: spacing_from_resolution(y_resolution, unit),
    };

    // Positions are in resolution units; pixels = position * pixels-per-unit.
    let origin = Origin {
        x: origin_in_pixels(x_position, x_resolution),
        y: origin_in_pixels(y_position, y_resolution),
    };

    debug!(
        "TIFF {}: {}x{} spacing={:?} origin={:?}",
        reader.identifier(),
        width,
        height,
        spacing,
        origin
    );

    Ok(SliceHeader {
        width,
        height,
        spacing,
        origin,
    })
}

fn required_uint(ifd: &Ifd, tag: TiffTag, order: ByteOrder) -> Result<u32, HeaderError> {
    let entry = ifd.find(tag).ok_or(HeaderError::MissingTag(tag.name()))?;
    let value = read_uint(entry, tag, order)?;
    u32::try_from(value).map_err(|_| HeaderError::InvalidTagValue {
        tag: tag.name(),
        message: format!("{value} does not fit in 32 bits"),
    })
}

fn optional_rational<R: RangeReader + ?Sized>(
    reader: &R,
    ifd: &Ifd,
    tag: TiffTag,
    header: &TiffHeader,
) -> Result<Option<f64>, HeaderError> {
    ifd.find(tag)
        .map(|entry| read_rational(reader, entry, tag, header))
        .transpose()
}

fn spacing_from_resolution(resolution: Option<f64>, unit: ResolutionUnit) -> f64 {
    match (resolution, unit.micrometers()) {
        (Some(res), Some(um)) if res > 0.0 => um / res,
        _ => 1.0,
    }
}

fn origin_in_pixels(position: Option<f64>, resolution: Option<f64>) -> u32 {
    match (position, resolution) {
        (Some(pos), Some(res)) if pos > 0.0 && res > 0.0 => (pos * res).round() as u32,
        _ => 0,
    }
}
