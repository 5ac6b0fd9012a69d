//! Command implementations for the clustree CLI.

use std::f32::consts::TAU;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use ahash::AHashMap;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{ClustreeError, Result};
use crate::storage::file::FileStorageConfig;
use crate::storage::{StorageConfig, StorageFactory};
use crate::tree::{ClusterTree, NodeId, TreeConfig};

/// Symbols used to tell regions apart on the ASCII map.
const REGION_SYMBOLS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@#$%&*+=";

/// Half-width of the square the demo map covers.
const MAP_EXTENT: f32 = 3.0;

/// Execute a CLI command.
pub fn execute_command(args: ClustreeArgs) -> Result<()> {
    match &args.command {
        Command::Insert(insert_args) => insert_points(insert_args.clone(), &args),
        Command::Query(query_args) => query_tree(query_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
        Command::Validate(validate_args) => validate_tree(validate_args.clone(), &args),
        Command::Demo(demo_args) => run_demo(demo_args.clone(), &args),
    }
}

/// Open the tree at `args.index_path`.
///
/// With `create` unset the directory must already hold a tree.
fn open_tree(args: &TreeArgs, create: bool) -> Result<ClusterTree> {
    if !create && !args.index_path.is_dir() {
        return Err(ClustreeError::invalid_argument(format!(
            "No tree at {}",
            args.index_path.display()
        )));
    }

    let storage = StorageFactory::create(StorageConfig::File(
        FileStorageConfig::new(&args.index_path).with_sync_writes(args.sync_writes),
    ))?;
    let stored = ClusterTree::stored_dimension(storage.as_ref())?;
    if !create && stored.is_none() {
        return Err(ClustreeError::invalid_argument(format!(
            "No tree at {}",
            args.index_path.display()
        )));
    }

    let config = match &args.config {
        Some(path) => {
            debug!("Loading tree config from: {}", path.display());
            TreeConfig::from_json_file(path)?
        }
        None => {
            let dimension = args.dimension.or(stored).ok_or_else(|| {
                ClustreeError::config("--dimension is required to create a new tree")
            })?;
            TreeConfig::new(dimension).with_max_leafs(args.max_leafs)
        }
    };

    ClusterTree::with_storage(storage, config)
}

/// Parse a comma-separated point such as `1.5,-2,0`.
pub fn parse_point(text: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(|part| {
            part.trim().parse::<f32>().map_err(|e| {
                ClustreeError::invalid_argument(format!("Invalid coordinate '{part}': {e}"))
            })
        })
        .collect()
}

/// Read points from a file holding one JSON array per line.
pub fn read_points_file(path: &Path) -> Result<Vec<Vec<f32>>> {
    let reader = BufReader::new(File::open(path)?);
    let mut points = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let point: Vec<f32> = serde_json::from_str(&line).map_err(|e| {
            ClustreeError::invalid_argument(format!(
                "Error parsing point on line {}: {e}",
                line_num + 1
            ))
        })?;
        points.push(point);
    }

    Ok(points)
}

/// Insert points into a tree.
fn insert_points(args: InsertArgs, cli_args: &ClustreeArgs) -> Result<()> {
    let points = match &args.file {
        Some(path) => read_points_file(path)?,
        None => args
            .point
            .iter()
            .map(|p| parse_point(p))
            .collect::<Result<Vec<_>>>()?,
    };
    if points.is_empty() {
        return Err(ClustreeError::invalid_argument("No points to insert"));
    }

    let mut tree = open_tree(&args.tree, true)?;
    info!(
        "Inserting {} points into {}",
        points.len(),
        args.tree.index_path.display()
    );

    let start_time = Instant::now();
    let total = points.len();
    for (i, point) in points.iter().enumerate() {
        if args.progress && cli_args.verbosity() > 0 {
            eprint!("{:.2}%\r", i as f64 / total as f64 * 100.0);
        }
        tree.insert(point)?;
    }
    tree.flush()?;
    let duration = start_time.elapsed();

    output_result(
        "Points inserted successfully",
        &InsertionResult {
            points_inserted: total,
            total_points: tree.count()?,
            duration_ms: duration.as_millis() as u64,
            points_per_second: if duration.as_secs_f64() > 0.0 {
                total as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
        },
        cli_args,
    )
}

/// Find the nearest points to a query.
fn query_tree(args: QueryArgs, cli_args: &ClustreeArgs) -> Result<()> {
    let query = parse_point(&args.point)?;
    let tree = open_tree(&args.tree, false)?;

    let start_time = Instant::now();
    let neighbors = tree
        .nearest(&query, args.limit)?
        .collect::<Result<Vec<_>>>()?;
    let duration = start_time.elapsed();

    output_result(
        "Query completed",
        &QueryResults {
            query,
            neighbors,
            duration_ms: duration.as_secs_f64() * 1000.0,
        },
        cli_args,
    )
}

/// Show tree statistics.
fn show_stats(args: StatsArgs, cli_args: &ClustreeArgs) -> Result<()> {
    let tree = open_tree(&args.tree, false)?;

    output_result(
        "Tree statistics",
        &StatsReport {
            index_path: args.tree.index_path.to_string_lossy().to_string(),
            dimension: tree.dimension(),
            max_leafs: tree.max_leafs(),
            records: tree.record_count()?,
            stats: tree.stats()?,
        },
        cli_args,
    )
}

/// Validate tree invariants.
fn validate_tree(args: ValidateArgs, cli_args: &ClustreeArgs) -> Result<()> {
    let tree = open_tree(&args.tree, false)?;
    let report = tree.validate()?;

    if !report.is_valid() {
        warn!(
            "{} violations found in {}",
            report.violations.len(),
            args.tree.index_path.display()
        );
    }

    output_result("Validation finished", &report, cli_args)?;

    if report.is_valid() {
        Ok(())
    } else {
        Err(ClustreeError::other(format!(
            "Tree failed validation with {} violations",
            report.violations.len()
        )))
    }
}

/// Draw a standard normal sample (Box-Muller).
fn gaussian(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Render the region every cell of a grid over `[-MAP_EXTENT, MAP_EXTENT]²` falls into.
///
/// Returns the map rows (top row first) and the number of distinct regions.
pub fn region_map(tree: &ClusterTree, width: usize, height: usize) -> Result<(Vec<String>, usize)> {
    let mut symbols: AHashMap<NodeId, char> = AHashMap::new();
    let mut rows = Vec::with_capacity(height);

    for row in 0..height {
        let y = MAP_EXTENT - (row as f32 + 0.5) / height as f32 * 2.0 * MAP_EXTENT;
        let mut line = String::with_capacity(width);

        for col in 0..width {
            let x = ((col as f32 + 0.5) / width as f32 - 0.5) * 2.0 * MAP_EXTENT;
            let symbol = match tree.region(&[x, y])? {
                Some(region) => {
                    let next = symbols.len();
                    *symbols
                        .entry(region)
                        .or_insert(REGION_SYMBOLS[next % REGION_SYMBOLS.len()] as char)
                }
                None => ' ',
            };
            line.push(symbol);
        }
        rows.push(line);
    }

    Ok((rows, symbols.len()))
}

/// Build a two-dimensional tree from gaussian points and report timings.
fn run_demo(args: DemoArgs, cli_args: &ClustreeArgs) -> Result<()> {
    let config = TreeConfig::new(2).with_max_leafs(args.max_leafs);
    let mut tree = match &args.index_path {
        Some(path) => ClusterTree::with_config(
            StorageConfig::File(FileStorageConfig::new(path).with_sync_writes(args.sync_writes)),
            config,
        )?,
        None => ClusterTree::with_config(StorageConfig::default(), config)?,
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let start_time = Instant::now();
    for i in 0..args.points {
        if cli_args.verbosity() > 1 {
            eprint!("{:.2}%\r", i as f64 / args.points as f64 * 100.0);
        }
        tree.insert(&[gaussian(&mut rng), gaussian(&mut rng)])?;
    }
    tree.flush()?;
    let insert_secs = start_time.elapsed().as_secs_f64();

    let start_time = Instant::now();
    let distances = tree
        .nearest(&[0.0, 0.0], args.limit)?
        .map(|neighbor| neighbor.map(|n| n.distance))
        .collect::<Result<Vec<_>>>()?;
    let query_duration = start_time.elapsed();

    let (region_map, regions) = if args.width > 0 && args.height > 0 {
        region_map(&tree, args.width, args.height)?
    } else {
        (Vec::new(), 0)
    };

    output_result(
        "Demo finished",
        &DemoResults {
            points_inserted: args.points,
            points_per_second: if insert_secs > 0.0 {
                args.points as f64 / insert_secs
            } else {
                0.0
            },
            root_counter: tree.root()?.descendant_counter,
            results_found: distances.len(),
            query_duration_ms: query_duration.as_secs_f64() * 1000.0,
            distances,
            regions,
            region_map,
        },
        cli_args,
    )
}
