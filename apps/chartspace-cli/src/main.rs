use anyhow::Context;
use chartspace_aggregate::aggregate;
use chartspace_common::TabularDataset;
use chartspace_render::{DebugTextRenderer, OrbitCamera, Renderer, Scene};
use chartspace_view::ViewerConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chartspace-cli", about = "CLI tool for chartspace datasets and scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List a dataset's columns and which of them are numeric
    Columns {
        /// Dataset JSON file
        data: PathBuf,
    },
    /// Print per-category totals for a column pair
    Aggregate {
        /// Dataset JSON file
        data: PathBuf,
        /// Category column
        #[arg(short, long)]
        x: String,
        /// Value column
        #[arg(short, long)]
        y: String,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Build the chart scene and print it as text
    Scene {
        /// Dataset JSON file
        data: PathBuf,
        /// Category column
        #[arg(short, long)]
        x: String,
        /// Value column
        #[arg(short, long)]
        y: String,
        /// Viewer configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load(path: &Path) -> anyhow::Result<TabularDataset> {
    let dataset = TabularDataset::load(path)
        .with_context(|| format!("loading dataset {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.headers().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("chartspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("crates: common, aggregate, render, input, view, render-wgpu");
            let camera = OrbitCamera::default();
            println!(
                "default camera: eye={:?} fov={:.0}deg",
                camera.eye(),
                camera.fov.to_degrees()
            );
        }
        Commands::Columns { data } => {
            let dataset = load(&data)?;
            let numeric = dataset.numeric_columns();
            println!("rows: {}", dataset.row_count());
            for header in dataset.headers() {
                let tag = if numeric.contains(&header.as_str()) {
                    "numeric"
                } else {
                    "text"
                };
                println!("  {header} ({tag})");
            }
        }
        Commands::Aggregate { data, x, y, json } => {
            let dataset = load(&data)?;
            let totals = aggregate(&dataset, &x, &y)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                for a in &totals {
                    println!("{:<24} {}", a.label, a.total);
                }
                println!("{} categories", totals.len());
            }
        }
        Commands::Scene { data, x, y, config } => {
            let dataset = load(&data)?;
            let config = match config {
                Some(path) => ViewerConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => ViewerConfig::default(),
            };
            let totals = aggregate(&dataset, &x, &y)?;
            let scene = Scene::build(&totals, &config.layout);
            let camera = OrbitCamera::with_distance(config.orbit.initial_distance);
            print!("{}", DebugTextRenderer.render(&scene, &camera));
        }
    }

    Ok(())
}
