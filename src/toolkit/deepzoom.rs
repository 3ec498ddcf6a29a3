//! Deep Zoom Image (DZI) pyramid generation.
//!
//! # DZI Format Overview
//!
//! - DZI level 0 = 1x1 pixel (lowest resolution)
//! - DZI max level = full resolution, `ceil(log2(max(width, height)))`
//!
//! A pyramid for `slice.dzi` is an XML descriptor plus a tile tree:
//!
//! ```text
//! slice.dzi
//! slice_files/<level>/<column>_<row>.jpg
//! ```
//!
//! Tiles overlap their neighbours by `overlap` pixels on every inner edge,
//! which lets viewers blend tile seams.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use crate::error::ToolkitError;

use super::raster::decode_slice;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Parameters
// =============================================================================

/// Tile encoding of a pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFormat {
    /// Lossy JPEG tiles
    Jpeg,
}

impl TileFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            TileFormat::Jpeg => "jpg",
        }
    }
}

/// Filter used to build the lower pyramid levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
    /// Anti-aliasing (Lanczos, 3 lobes)
    Antialias,
    /// Bilinear
    Linear,
}

impl ResizeFilter {
    pub const fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Antialias => FilterType::Lanczos3,
            ResizeFilter::Linear => FilterType::Triangle,
        }
    }
}

/// Pyramid generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PyramidParams {
    pub tile_size: u32,
    pub overlap: u32,
    pub format: TileFormat,
    /// Quality in `0.0..=1.0`
    pub quality: f32,
    pub filter: ResizeFilter,
}

impl PyramidParams {
    /// Fixed policy for every slice pyramid: 256px JPEG tiles, one pixel of
    /// overlap, quality 0.5, anti-aliased levels. Not user-configurable.
    pub const STANDARD: PyramidParams = PyramidParams {
        tile_size: 256,
        overlap: 1,
        format: TileFormat::Jpeg,
        quality: 0.5,
        filter: ResizeFilter::Antialias,
    };

    /// Quality as a JPEG encoder setting (1-100).
    pub fn jpeg_quality(&self) -> u8 {
        clamp_quality((self.quality * 100.0).round().clamp(0.0, 255.0) as u8)
    }
}

impl Default for PyramidParams {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tiler
// =============================================================================

/// Summary of a generated pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidSummary {
    pub width: u32,
    pub height: u32,
    /// Number of levels, `max_level + 1`
    pub levels: usize,
    pub tiles: usize,
}

/// Builds a multi-resolution tile pyramid from a source raster file.
pub trait PyramidTiler {
    /// Build the pyramid for `source`, writing the descriptor at `descriptor`
    /// and its tiles next to it.
    fn build_pyramid(
        &self,
        source: &Path,
        descriptor: &Path,
        params: &PyramidParams,
    ) -> Result<PyramidSummary, ToolkitError>;
}

/// Deep Zoom tiler built on the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct DeepZoomTiler;

impl DeepZoomTiler {
    pub fn new() -> Self {
        Self
    }
}

impl PyramidTiler for DeepZoomTiler {
    fn build_pyramid(
        &self,
        source: &Path,
        descriptor: &Path,
        params: &PyramidParams,
    ) -> Result<PyramidSummary, ToolkitError> {
        let img = decode_slice(source)?.to_rgb8();

        let (width, height) = img.dimensions();
        let max_level = calculate_max_dzi_level(width, height);
        let tiles_dir = tiles_dir_for(descriptor);
        let quality = params.jpeg_quality();
        let filter = params.filter.filter_type();

        let mut tiles = 0;
        let mut level_img = img;
        for level in (0..=max_level).rev() {
            let (level_width, level_height) =
                dzi_level_dimensions(width, height, level, max_level);
            if level_img.dimensions() != (level_width, level_height) {
                level_img = imageops::resize(&level_img, level_width, level_height, filter);
            }

            let level_dir = tiles_dir.join(level.to_string());
            fs::create_dir_all(&level_dir)?;

            let (columns, rows) = dzi_tile_count(level_width, level_height, params.tile_size);
            for column in 0..columns {
                for row in 0..rows {
                    let (x, y, w, h) = tile_bounds(
                        level_width,
                        level_height,
                        column,
                        row,
                        params.tile_size,
                        params.overlap,
                    );
                    let tile = imageops::crop_imm(&level_img, x, y, w, h).to_image();
                    let tile_path =
                        level_dir.join(format!("{column}_{row}.{}", params.format.extension()));
                    write_jpeg(&tile, &tile_path, quality)?;
                    tiles += 1;
                }
            }
        }

        let xml = generate_dzi_xml(width, height, params);
        fs::write(descriptor, xml)?;

        debug!(
            "Pyramid {}: {}x{}, {} levels, {} tiles",
            descriptor.display(),
            width,
            height,
            max_level + 1,
            tiles
        );

        Ok(PyramidSummary {
            width,
            height,
            levels: max_level + 1,
            tiles,
        })
    }
}

fn write_jpeg(tile: &RgbImage, path: &Path, quality: u8) -> Result<(), ToolkitError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(tile)
        .map_err(|e| ToolkitError::EncodeError {
            message: e.to_string(),
        })
}

/// Tile directory next to a descriptor: `slice.dzi` -> `slice_files`.
pub fn tiles_dir_for(descriptor: &Path) -> PathBuf {
    let stem = descriptor
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    descriptor.with_file_name(format!("{stem}_files"))
}

// =============================================================================
// DZI Geometry
// =============================================================================

/// Generate the DZI XML descriptor.
///
/// # Example Output
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
///        TileSize="256"
///        Overlap="1"
///        Format="jpg">
///   <Size Width="46920" Height="33600" />
/// </Image>
/// ```
pub fn generate_dzi_xml(width: u32, height: u32, params: &PyramidParams) -> String {
    let tile_size = params.tile_size;
    let overlap = params.overlap;
    let format = params.format.extension();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
       TileSize="{tile_size}"
       Overlap="{overlap}"
       Format="{format}">
  <Size Width="{width}" Height="{height}" />
</Image>"#
    )
}

/// Calculate the maximum DZI level for given image dimensions.
pub fn calculate_max_dzi_level(width: u32, height: u32) -> usize {
    let max_dim = width.max(height) as f64;
    if max_dim <= 1.0 {
        return 0;
    }
    max_dim.log2().ceil() as usize
}

/// Calculate dimensions at a specific DZI level.
///
/// At level L: `ceil(size / 2^(max_level - L))`, never below one pixel.
pub fn dzi_level_dimensions(
    width: u32,
    height: u32,
    dzi_level: usize,
    max_dzi_level: usize,
) -> (u32, u32) {
    if dzi_level > max_dzi_level {
        return (0, 0);
    }

    let shift = (max_dzi_level - dzi_level).min(31) as u32;
    let scale = 1u64 << shift;
    let level_width = (width as u64).div_ceil(scale) as u32;
    let level_height = (height as u64).div_ceil(scale) as u32;

    (level_width.max(1), level_height.max(1))
}

/// Calculate tile count at a DZI level.
pub fn dzi_tile_count(level_width: u32, level_height: u32, tile_size: u32) -> (u32, u32) {
    let tiles_x = level_width.div_ceil(tile_size);
    let tiles_y = level_height.div_ceil(tile_size);
    (tiles_x.max(1), tiles_y.max(1))
}

/// Pixel bounds `(x, y, width, height)` of a tile, overlap included.
///
/// Inner edges grow by `overlap` on both sides; the first column/row only
/// grows to the right/bottom.
pub fn tile_bounds(
    level_width: u32,
    level_height: u32,
    column: u32,
    row: u32,
    tile_size: u32,
    overlap: u32,
) -> (u32, u32, u32, u32) {
    let offset_x = if column == 0 { 0 } else { overlap };
    let offset_y = if row == 0 { 0 } else { overlap };
    let x = column * tile_size - offset_x;
    let y = row * tile_size - offset_y;

    let w = tile_size + if column == 0 { 1 } else { 2 } * overlap;
    let h = tile_size + if row == 0 { 1 } else { 2 } * overlap;

    (x, y, w.min(level_width - x), h.min(level_height - y))
}
