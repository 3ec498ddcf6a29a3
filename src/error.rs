use std::path::PathBuf;

use thiserror::Error;

/// I/O errors that can occur when reading slide headers from disk
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Underlying filesystem error
    #[error("Filesystem error: {0}")]
    Fs(String),

    /// Requested range exceeds file bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Fs(err.to_string())
    }
}

/// Errors that can occur when reading slide header metadata
#[derive(Debug, Clone, Error)]
pub enum HeaderError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// PNG stream is malformed
    #[error("Invalid PNG: {0}")]
    InvalidPng(String),

    /// Image header could not be read by the fallback decoder
    #[error("Unreadable image header: {0}")]
    Unreadable(String),
}

/// Errors raised by the raster toolkit and the pyramid tiler
#[derive(Debug, Clone, Error)]
pub enum ToolkitError {
    /// Failed to decode source image
    #[error("Failed to decode image: {message}")]
    DecodeError { message: String },

    /// Failed to encode output image
    #[error("Failed to encode image: {message}")]
    EncodeError { message: String },

    /// Requested region does not fit inside the raster
    #[error("Region {width}x{height} at ({x}, {y}) exceeds raster of {raster_width}x{raster_height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        raster_width: u32,
        raster_height: u32,
    },

    /// Filesystem error while writing outputs
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ToolkitError {
    fn from(err: std::io::Error) -> Self {
        ToolkitError::Io(err.to_string())
    }
}

/// Fatal errors of the preparation pipeline.
///
/// Every variant aborts the run; none is retried.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// Supplied path is missing, not a directory, or holds no dataset
    #[error("{message}: {}", path.display())]
    Path { path: PathBuf, message: String },

    /// A layer or overlay required by the reference composition is missing
    #[error("Missing {kind} '{name}' for {axis} axis")]
    Composition {
        axis: String,
        kind: &'static str,
        name: String,
    },

    /// The reference composition itself is unusable
    #[error("Invalid composition in {axis} axis: {message}")]
    InvalidComposition { axis: String, message: String },

    /// Slice counts differ between two layers of the same axis
    #[error(
        "Image number in '{layer}' ({count}) for {axis} axis is different from layer '{reference_layer}' ({reference_count})"
    )]
    Consistency {
        axis: String,
        layer: String,
        count: usize,
        reference_layer: String,
        reference_count: usize,
    },

    /// Configuration cannot be persisted over a non-file element
    #[error("Could not save config in non-file element: {}", path.display())]
    ConfigConflict { path: PathBuf },

    /// Header metadata could not be read
    #[error("Cannot read header of {}: {source}", path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },

    /// Raster or tiling collaborator failed
    #[error("Image processing failed for {}: {source}", path.display())]
    Toolkit {
        path: PathBuf,
        #[source]
        source: ToolkitError,
    },

    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration document could not be parsed or serialized
    #[error("Invalid configuration document {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PrepareError {
    /// Wrap a filesystem error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepareError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a toolkit error with the path it concerns.
    pub fn toolkit(path: impl Into<PathBuf>, source: ToolkitError) -> Self {
        PrepareError::Toolkit {
            path: path.into(),
            source,
        }
    }
}
