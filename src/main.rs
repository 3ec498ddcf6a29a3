//! slice-atlas - prepare slide image stacks for a multi-plane viewer.
//!
//! This binary prompts for the dataset paths and runs the pipeline.

use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slice_atlas::{
    config::{prompt_micrometers, prompt_path, Cli, PipelineOptions},
    pipeline,
    toolkit::{DeepZoomTiler, ImageToolkit},
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Validate configuration
    if let Err(e) = cli.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let options = match prompt_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = options.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let toolkit = ImageToolkit::new();
    let tiler = DeepZoomTiler::new();
    match pipeline::run(&options, &toolkit, &tiler) {
        Ok(outcome) => {
            info!("Done: {}", outcome.config_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Ask for output path, input path and micrometer scalar, in that order.
fn prompt_options(cli: &Cli) -> io::Result<PipelineOptions> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let current = std::env::current_dir()?;
    let out_path = prompt_path(
        &mut input,
        &mut output,
        "Please indicate output path",
        Some(&current),
    )?;
    let in_path = prompt_path(
        &mut input,
        &mut output,
        "Please indicate path of the source images",
        None,
    )?;
    let micrometers = prompt_micrometers(&mut input, &mut output)?;

    Ok(PipelineOptions::new(in_path, out_path)
        .with_micrometers(micrometers)
        .with_root_path_policy(cli.root_path_policy)
        .with_subview_defaults(cli.subview_defaults.clone()))
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "slice_atlas=debug"
    } else {
        "slice_atlas=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
