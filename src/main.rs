use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dictseg::{LayoutType, PatternLibrary, Pipeline, SegmentationConfig};

#[derive(Parser)]
#[command(name = "dictseg")]
#[command(about = "Cut scanned dictionary pages into individual entries")]
struct Cli {
    /// Path to input page image
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Dictionary layout of the page
    #[arg(short, long, value_enum)]
    layout: LayoutType,

    /// Directory holding the layout's divider glyph PNGs
    #[arg(short, long, value_name = "DIR")]
    patterns: Option<PathBuf>,

    /// JSON file overriding segmentation thresholds
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save intermediate images into a session directory under DIR
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the result as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => SegmentationConfig::from_json_file(path)?,
        None => SegmentationConfig::default(),
    };

    let mut pipeline = Pipeline::new(args.layout).with_config(config);

    if let Some(dir) = &args.patterns {
        pipeline = pipeline.with_patterns(PatternLibrary::from_directory(dir, args.layout)?)?;
    }

    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    info!(image = %args.image_path.display(), layout = %args.layout, "processing page");
    let grid = pipeline.process_path(&args.image_path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&grid)?);
        return Ok(());
    }

    println!("\n=== Dictionary Page Segmentation ===");
    println!("Layout: {}", grid.layout);
    println!("Rotation: {:.3} degrees", grid.rotation.angle_degrees);
    println!(
        "Text block: {}x{} at ({}, {})",
        grid.block.width, grid.block.height, grid.block.x, grid.block.y
    );
    println!("Columns: {}", grid.column_count());
    println!("Column lines: {:?}", grid.vertical_lines);
    println!("Total entries: {}", grid.entries.len());

    if args.verbose {
        for column in 0..grid.column_count() {
            println!("\nColumn {}:", column + 1);
            for entry in grid.entries_in_column(column) {
                println!(
                    "  Entry {} at ({}, {}) - {}x{}",
                    entry.sequence, entry.bbox.x, entry.bbox.y, entry.bbox.width, entry.bbox.height
                );
            }
        }
    }

    Ok(())
}
