//! End-to-end preparation run.
//!
//! ```text
//! paths ─▶ prior viewer.json ─▶ discover ─▶ crop plan ─▶ produce ─▶ synthesize ─▶ save
//! ```
//!
//! Every step before `save` may abort the run; the configuration document is
//! only written once everything else succeeded.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::composition::{discover, Composition};
use crate::config::PipelineOptions;
use crate::crop::CropPlan;
use crate::error::PrepareError;
use crate::produce::{OutputLayout, ProductionReport, Producer};
use crate::toolkit::{PyramidTiler, RasterToolkit};
use crate::viewer::{config_path, load_prior, save, Synthesizer, ViewerConfig};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub composition: Composition,
    pub report: ProductionReport,
    pub config: ViewerConfig,
    pub config_path: PathBuf,
    /// Where the previous document was moved, if there was one
    pub backup_path: Option<PathBuf>,
}

/// Run the whole preparation.
///
/// # Errors
///
/// Any [`PrepareError`]; no configuration is written in that case.
pub fn run<T, P>(
    options: &PipelineOptions,
    toolkit: &T,
    tiler: &P,
) -> Result<PipelineOutcome, PrepareError>
where
    T: RasterToolkit + ?Sized,
    P: PyramidTiler + ?Sized,
{
    require_dir(&options.output, "Output path not found")?;
    require_dir(&options.input, "Path of the source images not found")?;
    info!("Config & data will be generated in {}", options.output.display());

    let config_path = config_path(&options.output);
    let prior = load_prior(&config_path)?;

    let composition = discover(&options.input, toolkit)?;
    let plan = CropPlan::compute(&composition)?;
    info!(
        "{} axis(es), {} layer(s), {} slice(s) to crop",
        composition.axes.len(),
        composition.layers.len(),
        plan.crop_count()
    );

    let layout = OutputLayout::new(&options.output, composition.is_multi_plane());
    let report = Producer::new(toolkit, tiler, layout)
        .with_subview_defaults(options.subview_defaults.clone())
        .produce(&composition, &plan)?;

    let config = Synthesizer::new(options.root_path_policy, options.micrometers).synthesize(
        &composition,
        &plan,
        &options.output,
        prior.as_ref(),
    )?;
    let backup_path = save(&config_path, &config, prior.is_some())?;

    Ok(PipelineOutcome {
        composition,
        report,
        config,
        config_path,
        backup_path,
    })
}

fn require_dir(path: &Path, message: &str) -> Result<(), PrepareError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PrepareError::Path {
            path: path.to_path_buf(),
            message: message.to_string(),
        })
    }
}
