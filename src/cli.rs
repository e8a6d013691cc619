//! Command-line interface.

use crate::distance::CouplingStrategy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "couplemap",
    about = "Mine a git history for change coupling and map it as a city",
    version
)]
pub struct Cli {
    /// Repository to analyze: a local path, or a remote url to clone
    /// (git@... or https://...). Required unless --load is given.
    pub url: Option<String>,

    /// Coupling signal driving the analysis.
    #[arg(long, value_enum, default_value_t = CouplingStrategy::Logical)]
    pub couplings: CouplingStrategy,

    /// Keep a copy of the generated data file under saved/.
    #[arg(long)]
    pub save: bool,

    /// Reuse a previously saved data file instead of analyzing.
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    pub load: Option<PathBuf>,

    /// Drop commits modifying more than this many files.
    #[arg(long, value_name = "N")]
    pub remove_bulk: Option<usize>,

    /// Report which lines co-change with a line range, as FILE:START-END.
    #[arg(long, value_name = "FILE:START-END")]
    pub related: Option<String>,

    /// Directory the visualization data file is written to.
    #[arg(long, value_name = "DIR", default_value = "visualization")]
    pub out_dir: PathBuf,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Parses the `--related` argument format `path:start-end`.
pub fn parse_line_range(raw: &str) -> Option<(String, u32, u32)> {
    let (path, range) = raw.rsplit_once(':')?;
    let (start, end) = range.split_once('-')?;
    let start: u32 = start.parse().ok()?;
    let end: u32 = end.parse().ok()?;
    if path.is_empty() || start == 0 || end < start {
        return None;
    }
    Some((path.to_string(), start, end))
}
