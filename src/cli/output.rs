//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{ClustreeArgs, OutputFormat};
use crate::error::Result;
use crate::tree::{Neighbor, TreeStats, ValidationReport, Violation};

/// Result structure for point insertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertionResult {
    pub points_inserted: usize,
    pub total_points: u64,
    pub duration_ms: u64,
    pub points_per_second: f64,
}

/// Result structure for nearest-neighbor queries.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResults {
    pub query: Vec<f32>,
    pub neighbors: Vec<Neighbor>,
    pub duration_ms: f64,
}

/// Tree statistics for display.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsReport {
    pub index_path: String,
    pub dimension: usize,
    pub max_leafs: usize,
    pub records: usize,
    #[serde(flatten)]
    pub stats: TreeStats,
}

/// Demo results.
#[derive(Debug, Serialize, Deserialize)]
pub struct DemoResults {
    pub points_inserted: usize,
    pub points_per_second: f64,
    pub root_counter: u64,
    pub results_found: usize,
    pub query_duration_ms: f64,
    pub distances: Vec<f32>,
    pub regions: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub region_map: Vec<String>,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput: Serialize {
    /// Print the result for a terminal reader.
    fn print_human(&self) -> Result<()> {
        output_generic_human(&serde_json::to_value(self)?)
    }
}

impl HumanOutput for InsertionResult {}

impl HumanOutput for StatsReport {}

impl HumanOutput for QueryResults {
    fn print_human(&self) -> Result<()> {
        println!("Nearest to {:?}:", self.query);
        println!("═══════════════");

        for (i, neighbor) in self.neighbors.iter().enumerate() {
            println!(
                "{:>4}. {:?}  distance {:.6}  ({})",
                i + 1,
                neighbor.position,
                neighbor.distance,
                neighbor.id
            );
        }

        println!();
        println!(
            "Found {} results in {:.3} ms",
            self.neighbors.len(),
            self.duration_ms
        );
        Ok(())
    }
}

impl HumanOutput for ValidationReport {
    fn print_human(&self) -> Result<()> {
        println!("Nodes checked: {}", self.nodes_checked);
        if self.is_valid() {
            println!("Tree is valid");
            return Ok(());
        }

        println!("{} violations:", self.violations.len());
        for violation in &self.violations {
            match violation {
                Violation::DanglingChild { parent, child } => {
                    println!("  dangling child {child} under {parent}")
                }
                Violation::FanOutExceeded {
                    node,
                    children,
                    max_leafs,
                } => println!("  {node} has {children} children (max {max_leafs})"),
                Violation::CentroidDrift { node, drift } => {
                    println!("  {node} is {drift:.6} away from its children's centroid")
                }
                Violation::WrongDimension { node, dimension } => {
                    println!("  {node} has dimension {dimension}")
                }
            }
        }
        Ok(())
    }
}

impl HumanOutput for DemoResults {
    fn print_human(&self) -> Result<()> {
        println!("Points/sec = {:.2}", self.points_per_second);
        println!("Root has {} total children", self.root_counter);
        println!(
            "Found {} results in {:.4} ms",
            self.results_found, self.query_duration_ms
        );

        println!("Distances:");
        for distance in self.distances.iter().take(10) {
            println!("{distance}");
        }

        if !self.region_map.is_empty() {
            println!();
            println!("Regions ({}):", self.regions);
            for row in &self.region_map {
                println!("{row}");
            }
        }
        Ok(())
    }
}

/// Output a result in the specified format.
pub fn output_result<T: HumanOutput>(message: &str, result: &T, args: &ClustreeArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: HumanOutput>(message: &str, result: &T, args: &ClustreeArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }
    result.print_human()
}

/// Generic output for flat results.
fn output_generic_human(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &ClustreeArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}
