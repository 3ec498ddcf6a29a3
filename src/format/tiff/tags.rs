//! TIFF tag and field type definitions.
//!
//! Only the vocabulary needed to recover slice geometry is defined here:
//! pixel extent, resolution (for spacing) and position (for the registered
//! origin). Every other tag is skipped while parsing.

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two unsigned 32-bit integers: numerator then denominator (8 bytes)
    Rational = 5,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// Unsigned 64-bit integer (8 bytes) - BigTIFF only
    Long8 = 16,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Rational | FieldType::Long8 => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for types this parser never needs to decode.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            7 => Some(FieldType::Undefined),
            16 => Some(FieldType::Long8),
            _ => None,
        }
    }

    /// Check if a value with this type and count fits inline in an IFD entry.
    ///
    /// Classic TIFF inlines up to 4 bytes, BigTIFF up to 8.
    #[inline]
    pub fn fits_inline(self, count: u64, is_bigtiff: bool) -> bool {
        let threshold = if is_bigtiff { 8 } else { 4 };
        self.size_in_bytes() as u64 * count <= threshold
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs carrying slice geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Pixels per resolution unit in X direction
    XResolution = 282,

    /// Pixels per resolution unit in Y direction
    YResolution = 283,

    /// X offset of the image, in resolution units
    XPosition = 286,

    /// Y offset of the image, in resolution units
    YPosition = 287,

    /// Unit of resolution (1=none, 2=inch, 3=centimeter)
    ResolutionUnit = 296,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            282 => Some(TiffTag::XResolution),
            283 => Some(TiffTag::YResolution),
            286 => Some(TiffTag::XPosition),
            287 => Some(TiffTag::YPosition),
            296 => Some(TiffTag::ResolutionUnit),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Tag name for error messages.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageLength => "ImageLength",
            TiffTag::XResolution => "XResolution",
            TiffTag::YResolution => "YResolution",
            TiffTag::XPosition => "XPosition",
            TiffTag::YPosition => "YPosition",
            TiffTag::ResolutionUnit => "ResolutionUnit",
        }
    }
}

// =============================================================================
// Resolution Unit
// =============================================================================

/// TIFF resolution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionUnit {
    /// No absolute unit; resolution is only an aspect ratio
    None,
    /// Inch (the TIFF default)
    #[default]
    Inch,
    /// Centimeter
    Centimeter,
}

impl ResolutionUnit {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(ResolutionUnit::None),
            2 => Some(ResolutionUnit::Inch),
            3 => Some(ResolutionUnit::Centimeter),
            _ => None,
        }
    }

    /// Micrometers in one unit, or `None` when the unit carries no physical size.
    pub const fn micrometers(self) -> Option<f64> {
        match self {
            ResolutionUnit::None => None,
            ResolutionUnit::Inch => Some(25_400.0),
            ResolutionUnit::Centimeter => Some(10_000.0),
        }
    }
}
