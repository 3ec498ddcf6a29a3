//! Configuration management for slice-atlas.
//!
//! Dataset paths and the micrometer scalar are asked interactively; the
//! command line only carries ambient settings:
//!
//! - Command-line arguments via clap
//! - Environment variables with `SLICE_ATLAS_` prefix
//!
//! # Environment Variables
//!
//! - `SLICE_ATLAS_ROOT_PATH_POLICY` - `keep-previous` (default) or `use-computed`
//! - `SLICE_ATLAS_SUBVIEW_DEFAULTS` - directory of `<axis>.jpg` placeholder thumbnails
//! - `SLICE_ATLAS_VERBOSE` - debug logging

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::viewer::RootPathPolicy;

// =============================================================================
// Default Values
// =============================================================================

/// Default micrometer scalar of the transform matrix.
pub const DEFAULT_MICROMETERS: f64 = 1.0;

// =============================================================================
// CLI Arguments
// =============================================================================

/// slice-atlas - prepare slide image stacks for a multi-plane viewer.
///
/// Builds Deep Zoom pyramids, navigation thumbnails and a `viewer.json`
/// document from a `<axis>/layer<N>_<name>/<prefix>_<ordinal>.<ext>` tree.
#[derive(Parser, Debug, Clone)]
#[command(name = "slice-atlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Policy when a previous viewer.json names another data root.
    #[arg(
        long,
        value_enum,
        default_value_t = RootPathPolicy::KeepPrevious,
        env = "SLICE_ATLAS_ROOT_PATH_POLICY"
    )]
    pub root_path_policy: RootPathPolicy,

    /// Directory holding `coronal.jpg`, `sagittal.jpg` and `axial.jpg`
    /// placeholder thumbnails.
    ///
    /// If not specified, placeholders are rendered as plain gray images.
    #[arg(long, env = "SLICE_ATLAS_SUBVIEW_DEFAULTS")]
    pub subview_defaults: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false, env = "SLICE_ATLAS_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref dir) = self.subview_defaults {
            if !dir.is_dir() {
                return Err(format!(
                    "Subview defaults directory not found: {}. \
                     Set --subview-defaults or SLICE_ATLAS_SUBVIEW_DEFAULTS",
                    dir.display()
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Pipeline Options
// =============================================================================

/// Everything a pipeline run needs, assembled after prompting.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Source tree holding the axis directories
    pub input: PathBuf,
    /// Output root, receives pyramids and `viewer.json`
    pub output: PathBuf,
    /// Physical unit scalar of the transform matrix
    pub micrometers: f64,
    pub root_path_policy: RootPathPolicy,
    pub subview_defaults: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            micrometers: DEFAULT_MICROMETERS,
            root_path_policy: RootPathPolicy::default(),
            subview_defaults: None,
        }
    }

    pub fn with_micrometers(mut self, micrometers: f64) -> Self {
        self.micrometers = micrometers;
        self
    }

    pub fn with_root_path_policy(mut self, policy: RootPathPolicy) -> Self {
        self.root_path_policy = policy;
        self
    }

    pub fn with_subview_defaults(mut self, dir: Option<PathBuf>) -> Self {
        self.subview_defaults = dir;
        self
    }

    /// Validate values that do not touch the filesystem.
    pub fn validate(&self) -> Result<(), String> {
        if !self.micrometers.is_finite() || self.micrometers <= 0.0 {
            return Err(format!(
                "micrometer scalar must be a positive number, got {}",
                self.micrometers
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Prompts
// =============================================================================

/// Ask for a path. An empty answer selects `default` when there is one.
///
/// Relative answers are resolved against the current directory.
pub fn prompt_path<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: Option<&Path>,
) -> io::Result<PathBuf> {
    let answer = ask(input, output, question)?;
    let path = match (answer.is_empty(), default) {
        (true, Some(default)) => default.to_path_buf(),
        (true, None) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{question}: no path given"),
            ))
        }
        (false, _) => PathBuf::from(answer),
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Ask for the micrometer scalar; an empty answer selects
/// [`DEFAULT_MICROMETERS`].
pub fn prompt_micrometers<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<f64> {
    let answer = ask(
        input,
        output,
        &format!("Size of a pixel unit in micrometers [{DEFAULT_MICROMETERS}]"),
    )?;
    if answer.is_empty() {
        return Ok(DEFAULT_MICROMETERS);
    }
    answer.parse().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a number: {answer}"),
        )
    })
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{question} : ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// =============================================================================
// Tests
// =============================================================================
