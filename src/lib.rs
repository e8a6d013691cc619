//! couplemap mines a git history for change coupling and maps the result
//! as a city: files that change together cluster into districts, and the
//! commit record scores which clusters are worth restructuring.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod distance;
pub mod embed;
pub mod errors;
pub mod graph;
pub mod history;
pub mod intervals;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod related;

pub use config::AnalysisConfig;
pub use distance::CouplingStrategy;
pub use errors::CouplemapError;
pub use pipeline::{run_analysis, AnalysisOutcome};
