//! Naming convention of the input tree.
//!
//! ```text
//! <input>/<axis>/layer<N>_<name>/<prefix>_<ordinal>.<ext>
//! <input>/<axis>/overlay<N>_<name>/<prefix>_<ordinal>.svg
//! ```
//!
//! Ordinals are parsed as integers so that `slice_10` sorts after `slice_9`.
//! Entries that do not follow the convention are not part of the dataset and
//! are skipped by the caller without error.

use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use regex::Regex;

/// Raster extensions accepted for layer slices.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "tif", "tiff"];

/// Vector extensions accepted for overlay slices.
pub const OVERLAY_EXTENSIONS: &[&str] = &["svg"];

/// Kind of a group directory within an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// `layer<N>_<name>`: a raster stack
    Layer,
    /// `overlay<N>_<name>`: an annotation stack
    Overlay,
}

impl GroupKind {
    pub const fn label(self) -> &'static str {
        match self {
            GroupKind::Layer => "layer",
            GroupKind::Overlay => "overlay",
        }
    }

    /// Extensions accepted for the slice files of this kind of group.
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            GroupKind::Layer => RASTER_EXTENSIONS,
            GroupKind::Overlay => OVERLAY_EXTENSIONS,
        }
    }
}

/// Parsed `layer<N>_<name>` or `overlay<N>_<name>` directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDirName {
    pub kind: GroupKind,
    pub ordinal: u32,
    pub name: String,
}

/// Parsed `(<prefix>_)?<ordinal>.<ext>` file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceFileName {
    /// File name without its extension
    pub shortname: String,
    pub ordinal: u32,
    /// Extension as found on disk, without the dot
    pub extension: String,
}

fn group_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // (?i)             - case-insensitive prefix
        // (layer|overlay)  - group kind
        // (\d+)            - ordinal
        // _(.+)            - semantic name, may contain further underscores
        Regex::new(r"(?i)^(layer|overlay)(\d+)_(.+)$").expect("valid group pattern")
    })
}

fn slice_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // The prefix is optional but must end with '_' so that the ordinal is
        // the full trailing digit run.
        Regex::new(r"^((?:.+_)?(\d+))\.([A-Za-z0-9]+)$").expect("valid slice pattern")
    })
}

/// Parse a group directory name.
///
/// # Examples
///
/// ```
/// use slice_atlas::naming::{parse_group_dir, GroupKind};
///
/// let group = parse_group_dir("Layer2_NeuN").unwrap();
/// assert_eq!(group.kind, GroupKind::Layer);
/// assert_eq!(group.ordinal, 2);
/// assert_eq!(group.name, "NeuN");
/// ```
pub fn parse_group_dir(dir_name: &str) -> Option<GroupDirName> {
    let captures = group_pattern().captures(dir_name)?;
    let kind = if captures[1].eq_ignore_ascii_case("layer") {
        GroupKind::Layer
    } else {
        GroupKind::Overlay
    };
    let ordinal = captures[2].parse().ok()?;

    Some(GroupDirName {
        kind,
        ordinal,
        name: captures[3].to_string(),
    })
}

/// Parse a slice file name, accepting only the extensions of `kind`.
pub fn parse_slice_file(file_name: &str, kind: GroupKind) -> Option<SliceFileName> {
    let captures = slice_pattern().captures(file_name)?;
    let extension = &captures[3];
    if !kind
        .extensions()
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(extension))
    {
        return None;
    }
    let ordinal = captures[2].parse().ok()?;

    Some(SliceFileName {
        shortname: captures[1].to_string(),
        ordinal,
        extension: extension.to_string(),
    })
}

/// Filesystem-safe identifier for a layer directory, used as an output
/// path segment and as the layer key of the viewer configuration.
pub fn safe_identifier(dir_name: &str) -> String {
    URL_SAFE.encode(dir_name.as_bytes())
}
