//! PNG header reader.
//!
//! Walks the chunk list up to the first `IDAT` and collects:
//!
//! - `IHDR`: width and height,
//! - `pHYs`: pixels per meter, converted to micrometers per pixel,
//! - `oFFs`: image offset, in pixels or micrometers.
//!
//! Chunk CRCs are not verified; the pixel decoder does that when the slice is
//! actually tiled.

use tracing::debug;

use crate::error::HeaderError;
use crate::io::RangeReader;

use super::header::{Origin, SliceHeader, Spacing};

/// The eight-byte PNG signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Chunk length + type.
const CHUNK_PREFIX: usize = 8;

/// Trailing CRC.
const CHUNK_CRC: u64 = 4;

/// `pHYs` unit specifier for meters.
const PHYS_UNIT_METER: u8 = 1;

/// `oFFs` unit specifiers.
const OFFS_UNIT_PIXEL: u8 = 0;
const OFFS_UNIT_MICROMETER: u8 = 1;

/// Check if bytes start with the PNG signature.
pub fn is_png_header(bytes: &[u8]) -> bool {
    bytes.len() >= PNG_SIGNATURE.len() && bytes[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// Read slice geometry from PNG chunks.
pub fn read_png_header<R: RangeReader + ?Sized>(reader: &R) -> Result<SliceHeader, HeaderError> {
    let size = reader.size();
    if size < PNG_SIGNATURE.len() as u64 {
        return Err(HeaderError::FileTooSmall {
            required: PNG_SIGNATURE.len() as u64,
            actual: size,
        });
    }
    if !is_png_header(&reader.read_exact_at(0, PNG_SIGNATURE.len())?) {
        return Err(HeaderError::InvalidPng("missing signature".to_string()));
    }

    let mut dimensions = None;
    let mut spacing = Spacing::default();
    let mut offset_chunk: Option<(i32, i32, u8)> = None;

    let mut pos = PNG_SIGNATURE.len() as u64;
    while pos + CHUNK_PREFIX as u64 <= size {
        let prefix = reader.read_exact_at(pos, CHUNK_PREFIX)?;
        let length = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let kind = [prefix[4], prefix[5], prefix[6], prefix[7]];
        let data_pos = pos + CHUNK_PREFIX as u64;

        match &kind {
            b"IHDR" => {
                let data = read_chunk(reader, data_pos, length, 8, "IHDR")?;
                let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
                dimensions = Some((width, height));
            }
            b"pHYs" => {
                let data = read_chunk(reader, data_pos, length, 9, "pHYs")?;
                let ppm_x = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                let ppm_y = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
                if data[8] == PHYS_UNIT_METER && ppm_x > 0 && ppm_y > 0 {
                    spacing = Spacing {
                        x: 1_000_000.0 / ppm_x as f64,
                        y: 1_000_000.0 / ppm_y as f64,
                    };
                }
            }
            b"oFFs" => {
                let data = read_chunk(reader, data_pos, length, 9, "oFFs")?;
                let x = i32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                let y = i32::from_be_bytes([data[4], data[5], data[6], data[7]]);
                offset_chunk = Some((x, y, data[8]));
            }
            b"IDAT" | b"IEND" => break,
            _ => {}
        }

        pos = data_pos + length as u64 + CHUNK_CRC;
    }

    let (width, height) =
        dimensions.ok_or_else(|| HeaderError::InvalidPng("missing IHDR chunk".to_string()))?;

    // oFFs may precede pHYs, so resolve it once spacing is known.
    let origin = match offset_chunk {
        Some((x, y, OFFS_UNIT_PIXEL)) => Origin {
            x: x.max(0) as u32,
            y: y.max(0) as u32,
        },
        Some((x, y, OFFS_UNIT_MICROMETER)) => Origin {
            x: (x.max(0) as f64 / spacing.x).round() as u32,
            y: (y.max(0) as f64 / spacing.y).round() as u32,
        },
        Some((_, _, unit)) => {
            debug!("{}: ignoring oFFs with unit {}", reader.identifier(), unit);
            Origin::default()
        }
        None => Origin::default(),
    };

    Ok(SliceHeader {
        width,
        height,
        spacing,
        origin,
    })
}

fn read_chunk<R: RangeReader + ?Sized>(
    reader: &R,
    pos: u64,
    length: usize,
    expected: usize,
    name: &str,
) -> Result<bytes::Bytes, HeaderError> {
    if length < expected {
        return Err(HeaderError::InvalidPng(format!(
            "{name} chunk is {length} bytes, expected {expected}"
        )));
    }
    Ok(reader.read_exact_at(pos, expected)?)
}
