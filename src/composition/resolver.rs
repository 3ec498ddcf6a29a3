//! Composition discovery.
//!
//! The first axis directory found fixes the layer and overlay set; every
//! other axis must present the same directories. Slice geometry is read
//! through a [`MetadataInspector`], which only touches file headers.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::PrepareError;
use crate::naming::{
    parse_group_dir, parse_slice_file, safe_identifier, GroupDirName, GroupKind, SliceFileName,
};
use crate::toolkit::MetadataInspector;

use super::{
    Axis, AxisComposition, AxisLayer, AxisOverlay, Composition, LayerSpec, OverlayFile,
    OverlaySpec, Slice, DELINEATION_ID,
};

/// Discover the composition under `input_root`.
///
/// # Errors
///
/// - [`PrepareError::Path`] if `input_root` is not a directory or holds no
///   axis directory
/// - [`PrepareError::InvalidComposition`] if the reference axis has no
///   layer, has two layers with the same ordinal, or a reference layer is
///   empty
/// - [`PrepareError::Composition`] if an axis lacks a reference layer or
///   overlay directory
/// - [`PrepareError::Consistency`] if two layers of an axis differ in slice
///   count
/// - [`PrepareError::Header`] if a slice header cannot be read
pub fn discover<I: MetadataInspector + ?Sized>(
    input_root: &Path,
    inspector: &I,
) -> Result<Composition, PrepareError> {
    if !input_root.is_dir() {
        return Err(PrepareError::Path {
            path: input_root.to_path_buf(),
            message: "Input path does not exist or is not a directory".to_string(),
        });
    }

    let mut reference: Option<(Vec<LayerSpec>, Vec<OverlaySpec>)> = None;
    let mut axes = Vec::new();

    for axis in Axis::ALL {
        let axis_path = input_root.join(axis.name());
        if !axis_path.is_dir() {
            debug!("No {} directory in {}", axis, input_root.display());
            continue;
        }

        if reference.is_none() {
            let (layers, overlays) = reference_composition(axis, &axis_path)?;
            info!(
                "Reference axis {}: {} layer(s), {} overlay set(s)",
                axis,
                layers.len(),
                overlays.len()
            );
            reference = Some((layers, overlays));
        }

        if let Some((layers, overlays)) = &reference {
            axes.push(resolve_axis(axis, &axis_path, layers, overlays, inspector)?);
        }
    }

    let Some((layers, overlays)) = reference else {
        return Err(PrepareError::Path {
            path: input_root.to_path_buf(),
            message: "No coronal, sagittal or axial directory found".to_string(),
        });
    };

    Ok(Composition {
        layers,
        overlays,
        axes,
    })
}

// =============================================================================
// Reference Composition
// =============================================================================

fn reference_composition(
    axis: Axis,
    axis_path: &Path,
) -> Result<(Vec<LayerSpec>, Vec<OverlaySpec>), PrepareError> {
    let mut layers = Vec::new();
    let mut overlays = Vec::new();

    for (group, dir_name) in group_dirs(axis_path)? {
        match group.kind {
            GroupKind::Layer => layers.push(LayerSpec {
                ordinal: group.ordinal,
                safe_id: safe_identifier(&dir_name),
                name: group.name,
                dir_name,
            }),
            GroupKind::Overlay => overlays.push(OverlaySpec {
                ordinal: group.ordinal,
                safe_id: DELINEATION_ID.to_string(),
                name: group.name,
                dir_name,
            }),
        }
    }

    if layers.is_empty() {
        return Err(PrepareError::InvalidComposition {
            axis: axis.to_string(),
            message: "no layer<N>_<name> directory".to_string(),
        });
    }

    layers.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.dir_name.cmp(&b.dir_name)));
    if let Some(pair) = layers.windows(2).find(|w| w[0].ordinal == w[1].ordinal) {
        return Err(PrepareError::InvalidComposition {
            axis: axis.to_string(),
            message: format!(
                "layers '{}' and '{}' share ordinal {}",
                pair[0].dir_name, pair[1].dir_name, pair[0].ordinal
            ),
        });
    }

    overlays.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.dir_name.cmp(&b.dir_name)));
    if overlays.len() > 1 {
        let ignored: Vec<&str> = overlays[1..].iter().map(|o| o.dir_name.as_str()).collect();
        warn!(
            "Only one overlay set is supported; using '{}', ignoring {:?}",
            overlays[0].dir_name, ignored
        );
        overlays.truncate(1);
    }

    Ok((layers, overlays))
}

/// Group directories of an axis, in no particular order.
fn group_dirs(axis_path: &Path) -> Result<Vec<(GroupDirName, String)>, PrepareError> {
    let mut groups = Vec::new();
    for (name, path) in read_dir(axis_path)? {
        if !path.is_dir() {
            continue;
        }
        match parse_group_dir(&name) {
            Some(group) => groups.push((group, name)),
            None => debug!("Skipping directory {}", path.display()),
        }
    }
    Ok(groups)
}

// =============================================================================
// Per-Axis Resolution
// =============================================================================

fn resolve_axis<I: MetadataInspector + ?Sized>(
    axis: Axis,
    axis_path: &Path,
    layer_specs: &[LayerSpec],
    overlay_specs: &[OverlaySpec],
    inspector: &I,
) -> Result<AxisComposition, PrepareError> {
    let mut layers: Vec<AxisLayer> = Vec::with_capacity(layer_specs.len());

    for spec in layer_specs {
        let path = require_group(axis, axis_path, GroupKind::Layer, &spec.dir_name)?;
        let files = slice_files(&path, GroupKind::Layer)?;

        let mut slices = Vec::with_capacity(files.len());
        for (file, file_path) in files {
            let header = inspector
                .read_header(&file_path)
                .map_err(|source| PrepareError::Header {
                    path: file_path.clone(),
                    source,
                })?;
            debug!(
                "{}: {}x{}, spacing {:?}, origin {:?}",
                file_path.display(),
                header.width,
                header.height,
                header.spacing,
                header.origin
            );
            slices.push(Slice {
                ordinal: file.ordinal,
                shortname: file.shortname,
                extension: file.extension,
                path: file_path,
                header,
            });
        }

        match layers.first() {
            None if slices.is_empty() => {
                return Err(PrepareError::InvalidComposition {
                    axis: axis.to_string(),
                    message: format!("reference layer '{}' holds no slice", spec.dir_name),
                });
            }
            Some(reference) if reference.slices.len() != slices.len() => {
                return Err(PrepareError::Consistency {
                    axis: axis.to_string(),
                    layer: spec.dir_name.clone(),
                    count: slices.len(),
                    reference_layer: reference.spec.dir_name.clone(),
                    reference_count: reference.slices.len(),
                });
            }
            _ => {}
        }

        info!("{} / {}: {} slice(s)", axis, spec.dir_name, slices.len());
        layers.push(AxisLayer {
            spec: spec.clone(),
            path,
            slices,
        });
    }

    let slice_count = layers.first().map_or(0, |l| l.slices.len());
    let mut overlays = Vec::with_capacity(overlay_specs.len());
    for spec in overlay_specs {
        let path = require_group(axis, axis_path, GroupKind::Overlay, &spec.dir_name)?;
        let files: Vec<OverlayFile> = slice_files(&path, GroupKind::Overlay)?
            .into_iter()
            .map(|(file, path)| OverlayFile {
                ordinal: file.ordinal,
                shortname: file.shortname,
                extension: file.extension,
                path,
            })
            .collect();

        if files.len() != slice_count {
            warn!(
                "{} / {}: {} annotation file(s) for {} slice(s)",
                axis,
                spec.dir_name,
                files.len(),
                slice_count
            );
        }

        overlays.push(AxisOverlay {
            spec: spec.clone(),
            path,
            files,
        });
    }

    Ok(AxisComposition {
        axis,
        path: axis_path.to_path_buf(),
        layers,
        overlays,
    })
}

fn require_group(
    axis: Axis,
    axis_path: &Path,
    kind: GroupKind,
    dir_name: &str,
) -> Result<PathBuf, PrepareError> {
    let path = axis_path.join(dir_name);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(PrepareError::Composition {
            axis: axis.to_string(),
            kind: kind.label(),
            name: dir_name.to_string(),
        })
    }
}

/// Matching slice files of a group, sorted by integer ordinal.
fn slice_files(
    group_path: &Path,
    kind: GroupKind,
) -> Result<Vec<(SliceFileName, PathBuf)>, PrepareError> {
    let mut files = Vec::new();
    for (name, path) in read_dir(group_path)? {
        if !path.is_file() {
            continue;
        }
        match parse_slice_file(&name, kind) {
            Some(file) => files.push((file, path)),
            None => debug!("Skipping file {}", path.display()),
        }
    }

    files.sort_by(|(a, _), (b, _)| {
        a.ordinal
            .cmp(&b.ordinal)
            .then_with(|| a.shortname.cmp(&b.shortname))
    });
    Ok(files)
}

/// Directory entries as `(file name, path)`, skipping non UTF-8 names.
fn read_dir(dir: &Path) -> Result<Vec<(String, PathBuf)>, PrepareError> {
    let entries = fs::read_dir(dir).map_err(|e| PrepareError::io(dir, e))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PrepareError::io(dir, e))?;
        let path = entry.path();
        match entry.file_name().into_string() {
            Ok(name) => out.push((name, path)),
            Err(_) => debug!("Skipping non UTF-8 entry {}", path.display()),
        }
    }
    Ok(out)
}
