//! Raster toolkit: header inspection and whole-image operations.
//!
//! The pipeline only talks to [`RasterToolkit`]; [`ImageToolkit`] is the
//! production implementation on top of the `image` crate.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Limits, Rgb, RgbImage};
use tracing::debug;

use crate::error::{HeaderError, ToolkitError};
use crate::format::{read_slice_header, SliceHeader};

/// Decoded raster.
pub type Raster = DynamicImage;

/// Gray level of rendered placeholders.
pub const PLACEHOLDER_GRAY: u8 = 128;

/// JPEG quality used for single-image outputs (subviews, placeholders).
pub const THUMBNAIL_JPEG_QUALITY: u8 = 85;

/// Decode a slice with the given decoder limits.
///
/// Slices are trusted inputs and routinely exceed the `image` crate's default
/// allocation limit, so [`decode_slice`] lifts every limit.
pub fn decode_with_limits(path: &Path, limits: Limits) -> Result<Raster, ToolkitError> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.limits(limits);
    reader.decode().map_err(|e| ToolkitError::DecodeError {
        message: e.to_string(),
    })
}

/// Decode a slice of any size.
pub fn decode_slice(path: &Path) -> Result<Raster, ToolkitError> {
    decode_with_limits(path, Limits::no_limits())
}

/// Rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Target of a resample operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResampleTarget {
    /// Exact output size; aspect ratio is not preserved
    Size { width: u32, height: u32 },
    /// Uniform scale factor
    Scale(f64),
}

/// Reads slice geometry from file headers.
pub trait MetadataInspector {
    /// Read width, height, spacing and origin without decoding pixels.
    fn read_header(&self, path: &Path) -> Result<SliceHeader, HeaderError>;
}

/// Whole-raster operations used by the producer.
pub trait RasterToolkit: MetadataInspector {
    /// Decode a raster file.
    fn read_full(&self, path: &Path) -> Result<Raster, ToolkitError>;

    /// Copy a sub-rectangle out of a raster.
    fn extract_region(&self, raster: &Raster, region: Region) -> Result<Raster, ToolkitError>;

    /// Resample a raster.
    fn resample(&self, raster: &Raster, target: ResampleTarget) -> Result<Raster, ToolkitError>;

    /// Render a neutral placeholder raster.
    fn placeholder(&self, width: u32, height: u32) -> Raster;

    /// Encode a raster, the format being chosen by the path's extension.
    fn write(&self, raster: &Raster, path: &Path) -> Result<(), ToolkitError>;
}

/// [`RasterToolkit`] backed by the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct ImageToolkit;

impl ImageToolkit {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataInspector for ImageToolkit {
    fn read_header(&self, path: &Path) -> Result<SliceHeader, HeaderError> {
        read_slice_header(path)
    }
}

impl RasterToolkit for ImageToolkit {
    fn read_full(&self, path: &Path) -> Result<Raster, ToolkitError> {
        decode_slice(path)
    }

    fn extract_region(&self, raster: &Raster, region: Region) -> Result<Raster, ToolkitError> {
        let fits_x = region.x.checked_add(region.width).is_some_and(|r| r <= raster.width());
        let fits_y = region.y.checked_add(region.height).is_some_and(|b| b <= raster.height());
        if !fits_x || !fits_y {
            return Err(ToolkitError::RegionOutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
                raster_width: raster.width(),
                raster_height: raster.height(),
            });
        }
        Ok(raster.crop_imm(region.x, region.y, region.width, region.height))
    }

    fn resample(&self, raster: &Raster, target: ResampleTarget) -> Result<Raster, ToolkitError> {
        let (width, height) = match target {
            ResampleTarget::Size { width, height } => (width, height),
            ResampleTarget::Scale(factor) => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(ToolkitError::EncodeError {
                        message: format!("invalid scale factor {factor}"),
                    });
                }
                (
                    ((raster.width() as f64 * factor).round() as u32).max(1),
                    ((raster.height() as f64 * factor).round() as u32).max(1),
                )
            }
        };
        if width == 0 || height == 0 {
            return Err(ToolkitError::EncodeError {
                message: format!("cannot resample to {width}x{height}"),
            });
        }
        Ok(raster.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn placeholder(&self, width: u32, height: u32) -> Raster {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([PLACEHOLDER_GRAY; 3]),
        ))
    }

    fn write(&self, raster: &Raster, path: &Path) -> Result<(), ToolkitError> {
        let format = ImageFormat::from_path(path).map_err(|e| ToolkitError::EncodeError {
            message: e.to_string(),
        })?;
        debug!("Writing {:?} raster to {}", format, path.display());

        match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => {
                let file = std::fs::File::create(path)?;
                let mut writer = std::io::BufWriter::new(file);
                JpegEncoder::new_with_quality(&mut writer, THUMBNAIL_JPEG_QUALITY)
                    .encode_image(&raster.to_rgb8())
                    .map_err(|e| ToolkitError::EncodeError {
                        message: e.to_string(),
                    })
            }
            _ => raster
                .save_with_format(path, format)
                .map_err(|e| ToolkitError::EncodeError {
                    message: e.to_string(),
                }),
        }
    }
}
