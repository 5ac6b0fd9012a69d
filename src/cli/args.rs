//! Command line argument parsing for the clustree CLI using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Clustree - a persistent cluster tree for approximate nearest-neighbor search
#[derive(Parser, Debug, Clone)]
#[command(name = "clustree")]
#[command(about = "A persistent cluster tree for approximate nearest-neighbor search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ClustreeArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ClustreeArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Insert points into a tree
    Insert(InsertArgs),

    /// Find the nearest points to a query
    Query(QueryArgs),

    /// Show tree statistics
    Stats(StatsArgs),

    /// Validate tree invariants
    Validate(ValidateArgs),

    /// Build a tree from random points and report timings
    Demo(DemoArgs),
}

impl Command {
    /// The subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Insert(_) => "insert",
            Command::Query(_) => "query",
            Command::Stats(_) => "stats",
            Command::Validate(_) => "validate",
            Command::Demo(_) => "demo",
        }
    }
}

/// Options shared by every command that opens an existing or new tree.
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// Path to the tree directory
    #[arg(value_name = "INDEX_PATH")]
    pub index_path: PathBuf,

    /// Point dimension (inferred from an existing tree when omitted)
    #[arg(short, long)]
    pub dimension: Option<usize>,

    /// Sibling count at which a layer is split
    #[arg(short, long, default_value = "8", env = "CLUSTREE_MAX_LEAFS")]
    pub max_leafs: usize,

    /// Tree configuration file (JSON); overrides --dimension and --max-leafs
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Fsync every record before it is published
    #[arg(long, env = "CLUSTREE_SYNC_WRITES")]
    pub sync_writes: bool,
}

/// Arguments for inserting points
#[derive(Parser, Debug, Clone)]
pub struct InsertArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Point file, one JSON array of numbers per line
    #[arg(long, value_name = "POINTS_FILE", conflicts_with = "point")]
    pub file: Option<PathBuf>,

    /// A comma-separated point, may be repeated
    #[arg(short, long, value_name = "X,Y,...", allow_hyphen_values = true)]
    pub point: Vec<String>,

    /// Show progress during insertion
    #[arg(long)]
    pub progress: bool,
}

/// Arguments for nearest-neighbor queries
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Comma-separated query point
    #[arg(value_name = "X,Y,...", allow_hyphen_values = true)]
    pub point: String,

    /// Maximum number of results to return
    #[arg(short = 'k', long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub tree: TreeArgs,
}

/// Arguments for validation
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub tree: TreeArgs,
}

/// Arguments for the demo
#[derive(Parser, Debug, Clone)]
pub struct DemoArgs {
    /// Tree directory (an in-memory tree is used when omitted)
    #[arg(long, value_name = "INDEX_PATH")]
    pub index_path: Option<PathBuf>,

    /// Fsync every record before it is published
    #[arg(long, requires = "index_path")]
    pub sync_writes: bool,

    /// Number of random points to insert
    #[arg(short = 'n', long, default_value = "1000")]
    pub points: usize,

    /// Sibling count at which a layer is split
    #[arg(short, long, default_value = "25")]
    pub max_leafs: usize,

    /// Number of neighbors to enumerate around the origin
    #[arg(short = 'k', long, default_value = "100")]
    pub limit: usize,

    /// Random seed
    #[arg(short, long, default_value = "42")]
    pub seed: u64,

    /// Region map width in characters (0 disables the map)
    #[arg(long, default_value = "60")]
    pub width: usize,

    /// Region map height in characters
    #[arg(long, default_value = "30")]
    pub height: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
