//! TIFF header and IFD parsing.
//!
//! # TIFF Header Structure
//!
//! ## Classic TIFF (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! ## BigTIFF (16 bytes)
//! ```text
//! Bytes 0-1: Byte order
//! Bytes 2-3: Version (43 = 0x002B)
//! Bytes 4-5: Offset byte size (must be 8)
//! Bytes 6-7: Reserved (must be 0)
//! Bytes 8-15: Offset to first IFD (8 bytes)
//! ```
//!
//! Only the first IFD is ever read: it describes the full-resolution slice.

use crate::error::HeaderError;
use crate::io::RangeReader;

use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
const VERSION_BIGTIFF: u16 = 43;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of BigTIFF header in bytes
pub const BIGTIFF_HEADER_SIZE: usize = 16;

/// Upper bound on entries in one IFD; anything larger is a corrupt file.
const MAX_IFD_ENTRIES: u64 = 4096;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from the first two bytes of a slice.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let raw = [bytes[0], bytes[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(raw),
            ByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    /// Read a u32 from the first four bytes of a slice.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }

    /// Read a u64 from the first eight bytes of a slice.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(raw),
            ByteOrder::BigEndian => u64::from_be_bytes(raw),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Whether this is a BigTIFF file (64-bit offsets)
    pub is_bigtiff: bool,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// # Errors
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if version is not 42 or 43
    /// - `InvalidBigTiffOffsetSize` if BigTIFF offset size is not 8
    /// - `FileTooSmall` if there aren't enough bytes for the header
    /// - `InvalidIfdOffset` if the first IFD offset is outside the file
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, HeaderError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(HeaderError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(HeaderError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        let (is_bigtiff, first_ifd_offset) = match version {
            VERSION_TIFF => (false, byte_order.read_u32(&bytes[4..8]) as u64),
            VERSION_BIGTIFF => {
                if bytes.len() < BIGTIFF_HEADER_SIZE {
                    return Err(HeaderError::FileTooSmall {
                        required: BIGTIFF_HEADER_SIZE as u64,
                        actual: bytes.len() as u64,
                    });
                }
                let offset_size = byte_order.read_u16(&bytes[4..6]);
                if offset_size != 8 {
                    return Err(HeaderError::InvalidBigTiffOffsetSize(offset_size));
                }
                (true, byte_order.read_u64(&bytes[8..16]))
            }
            _ => return Err(HeaderError::InvalidVersion(version)),
        };

        if first_ifd_offset >= file_size {
            return Err(HeaderError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            is_bigtiff,
            first_ifd_offset,
        })
    }

    /// Size of an IFD entry in bytes (12 classic, 20 BigTIFF).
    #[inline]
    pub const fn ifd_entry_size(&self) -> usize {
        if self.is_bigtiff {
            20
        } else {
            12
        }
    }

    /// Size of the entry count field at the start of an IFD.
    #[inline]
    pub const fn ifd_count_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }
}

// =============================================================================
// IFD
// =============================================================================

/// One entry of an Image File Directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Raw tag ID
    pub tag: u16,
    /// Raw field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// The value/offset field, exactly as stored (4 or 8 bytes)
    pub value_offset: Vec<u8>,
}

impl IfdEntry {
    /// Offset of the out-of-line value data.
    pub fn offset(&self, byte_order: ByteOrder) -> u64 {
        if self.value_offset.len() == 8 {
            byte_order.read_u64(&self.value_offset)
        } else {
            byte_order.read_u32(&self.value_offset) as u64
        }
    }
}

/// The first Image File Directory of a TIFF file.
#[derive(Debug, Clone, Default)]
pub struct Ifd {
    pub entries: Vec<IfdEntry>,
}

impl Ifd {
    /// Read the first IFD following the header.
    pub fn read_first<R: RangeReader + ?Sized>(
        reader: &R,
        header: &TiffHeader,
    ) -> Result<Self, HeaderError> {
        let offset = header.first_ifd_offset;
        let count_bytes = reader.read_exact_at(offset, header.ifd_count_size())?;
        let entry_count = if header.is_bigtiff {
            header.byte_order.read_u64(&count_bytes)
        } else {
            header.byte_order.read_u16(&count_bytes) as u64
        };

        if entry_count > MAX_IFD_ENTRIES {
            return Err(HeaderError::InvalidIfdOffset(offset));
        }

        let entry_size = header.ifd_entry_size();
        let bytes = reader.read_exact_at(
            offset + header.ifd_count_size() as u64,
            entry_count as usize * entry_size,
        )?;

        Ok(Self::parse_entries(&bytes, entry_count as usize, header))
    }

    /// Parse `entry_count` packed entries.
    pub fn parse_entries(bytes: &[u8], entry_count: usize, header: &TiffHeader) -> Self {
        let order = header.byte_order;
        let entry_size = header.ifd_entry_size();

        let entries = bytes
            .chunks_exact(entry_size)
            .take(entry_count)
            .map(|raw| {
                let tag = order.read_u16(&raw[0..2]);
                let field_type = order.read_u16(&raw[2..4]);
                let (count, value_offset) = if header.is_bigtiff {
                    (order.read_u64(&raw[4..12]), raw[12..20].to_vec())
                } else {
                    (order.read_u32(&raw[4..8]) as u64, raw[8..12].to_vec())
                };
                IfdEntry {
                    tag,
                    field_type,
                    count,
                    value_offset,
                }
            })
            .collect();

        Self { entries }
    }

    /// Find the entry for a tag.
    pub fn find(&self, tag: TiffTag) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.tag == tag.as_u16())
    }
}

// =============================================================================
// Value Reading
// =============================================================================

/// Read the first value of an integer tag (BYTE, SHORT, LONG or LONG8).
pub fn read_uint(entry: &IfdEntry, tag: TiffTag, order: ByteOrder) -> Result<u64, HeaderError> {
    let field_type = FieldType::from_u16(entry.field_type);
    let raw = &entry.value_offset;
    match field_type {
        Some(FieldType::Byte) => Ok(raw[0] as u64),
        Some(FieldType::Short) => Ok(order.read_u16(raw) as u64),
        Some(FieldType::Long) => Ok(order.read_u32(raw) as u64),
        Some(FieldType::Long8) if raw.len() == 8 => Ok(order.read_u64(raw)),
        _ => Err(HeaderError::InvalidTagValue {
            tag: tag.name(),
            message: format!("expected an integer type, got type {}", entry.field_type),
        }),
    }
}

/// Read the first value of a RATIONAL tag as a float.
///
/// Classic TIFF always stores rationals out of line; BigTIFF inlines one.
pub fn read_rational<R: RangeReader + ?Sized>(
    reader: &R,
    entry: &IfdEntry,
    tag: TiffTag,
    header: &TiffHeader,
) -> Result<f64, HeaderError> {
    if FieldType::from_u16(entry.field_type) != Some(FieldType::Rational) || entry.count == 0 {
        return Err(HeaderError::InvalidTagValue {
            tag: tag.name(),
            message: format!(
                "expected RATIONAL with at least one value, got type {} x{}",
                entry.field_type, entry.count
            ),
        });
    }

    let order = header.byte_order;
    let bytes = if FieldType::Rational.fits_inline(1, header.is_bigtiff) {
        bytes::Bytes::copy_from_slice(&entry.value_offset)
    } else {
        reader.read_exact_at(entry.offset(order), FieldType::Rational.size_in_bytes())?
    };

    let numerator = order.read_u32(&bytes[0..4]);
    let denominator = order.read_u32(&bytes[4..8]);
    if denominator == 0 {
        return Err(HeaderError::InvalidTagValue {
            tag: tag.name(),
            message: "zero denominator".to_string(),
        });
    }
    Ok(numerator as f64 / denominator as f64)
}

// =============================================================================
// Tests
// =============================================================================
