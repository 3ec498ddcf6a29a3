//! Header-level slice metadata.

use serde::Serialize;

/// Physical pixel spacing in micrometers per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spacing {
    pub x: f64,
    pub y: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Registered origin of a slice, as a pixel index.
///
/// The crop region of a layer is anchored at this point in every slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Origin {
    pub x: u32,
    pub y: u32,
}

/// Geometry read from a slice file without decoding its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliceHeader {
    /// Raw pixel width
    pub width: u32,
    /// Raw pixel height
    pub height: u32,
    /// Pixel spacing
    pub spacing: Spacing,
    /// Registered origin
    pub origin: Origin,
}

impl SliceHeader {
    /// Header with unit spacing and a zero origin.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            spacing: Spacing::default(),
            origin: Origin::default(),
        }
    }

    /// Extent available to the right of and below the origin.
    pub fn extent_from_origin(&self) -> (u32, u32) {
        (
            self.width.saturating_sub(self.origin.x),
            self.height.saturating_sub(self.origin.y),
        )
    }
}
