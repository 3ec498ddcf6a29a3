//! Verbatim copy of annotation overlays.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::composition::AxisOverlay;
use crate::error::PrepareError;

use super::ProductionReport;

/// Output name of the annotation file at `index`.
pub fn annotation_file_name(index: usize, extension: &str) -> String {
    format!("Anno_{index}.{extension}")
}

/// Copy an overlay set, renaming files by their position in ordinal order.
pub(super) fn copy_overlay_set(
    set: &AxisOverlay,
    out_dir: &Path,
    report: &mut ProductionReport,
) -> Result<(), PrepareError> {
    fs::create_dir_all(out_dir).map_err(|e| PrepareError::io(out_dir, e))?;

    for (index, file) in set.files.iter().enumerate() {
        let target: PathBuf = out_dir.join(annotation_file_name(index, &file.extension));
        fs::copy(&file.path, &target).map_err(|e| PrepareError::io(&file.path, e))?;
        debug!("{} -> {}", file.path.display(), target.display());
        report.overlays += 1;
    }

    Ok(())
}
