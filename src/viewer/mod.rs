//! Viewer configuration document.
//!
//! - [`document`]: serde model of `viewer.json`
//! - [`synth`]: builds the document from a composition
//! - [`store`]: reads the previous document and writes the new one

pub mod document;
pub mod store;
pub mod synth;

pub use document::{FirstAccess, GroupEntry, PriorConfig, Subview, SubviewShape, ViewerConfig};
pub use store::{config_path, load_prior, save, CONFIG_FILE_NAME};
pub use synth::{computed_root_path, transform_matrix, RootPathPolicy, Synthesizer};
