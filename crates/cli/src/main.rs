//! vegtrace CLI - vegetation index, land-cover classes and class polygons

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use vegtrace_algorithms::imagery::LandCover;
use vegtrace_algorithms::pipeline::{self, PipelineConfig, PipelineOutput};
use vegtrace_algorithms::vector::extract_polygons;
use vegtrace_colormap::{index_to_rgba, labels_to_rgba, ClassPalette};
use vegtrace_core::io::{read_geotiff, write_geojson, write_geotiff, write_rgba_geotiff, GeoTiffOptions};
use vegtrace_core::{MaskedRaster, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vegtrace")]
#[command(author, version, about = "Vegetation index, land-cover classes and class polygons", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Compute the index, classify it and extract polygons of one class
    Run(RunArgs),
    /// Extract polygons of one class from an existing label raster
    Extract {
        /// Label raster (codes 0-3)
        labels: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        /// Class to extract: vegetation, water, barren
        #[arg(short, long, default_value = "vegetation")]
        target: LandCover,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Red band raster
    #[arg(long)]
    red: PathBuf,
    /// Near-infrared band raster
    #[arg(long)]
    nir: PathBuf,
    /// Directory receiving all outputs
    #[arg(short, long)]
    output_dir: PathBuf,
    /// JSON file with pipeline parameters; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Divisor turning digital numbers into reflectance
    #[arg(long)]
    scale: Option<f64>,
    /// Denominator offset guarding against division by zero
    #[arg(long)]
    epsilon: Option<f64>,
    /// Index strictly above this is vegetation
    #[arg(long)]
    veg_min: Option<f64>,
    /// Index strictly below this is water
    #[arg(long)]
    water_max: Option<f64>,
    /// Class to extract as polygons: vegetation, water, barren
    #[arg(short, long)]
    target: Option<LandCover>,
    /// No-data value of the red band (overrides the file's)
    #[arg(long)]
    red_nodata: Option<f64>,
    /// No-data value of the NIR band (overrides the file's)
    #[arg(long)]
    nir_nodata: Option<f64>,
    /// Write into a new ndvi_output_<YYYYmmdd_HHMMSS> subdirectory
    #[arg(long)]
    timestamp: bool,
    /// Also write RGBA previews of the index and the classes
    #[arg(long)]
    preview: bool,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_band(path: &Path, nodata: Option<f64>) -> Result<MaskedRaster<f64>> {
    let pb = spinner(&format!("Reading {}...", path.display()));
    let mut raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();

    if nodata.is_some() {
        raster.set_nodata(nodata);
    }
    info!(
        "Input {}: {} x {}, nodata {:?}",
        path.display(),
        raster.cols(),
        raster.rows(),
        raster.nodata()
    );
    Ok(MaskedRaster::from_nodata(raster))
}

fn write_raster<T: vegtrace_core::RasterElement>(raster: &Raster<T>, path: &Path) -> Result<()> {
    let pb = spinner(&format!("Writing {}...", path.display()));
    write_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn load_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if let Some(scale) = args.scale {
        config.index.scale = scale;
    }
    if let Some(epsilon) = args.epsilon {
        config.index.epsilon = epsilon;
    }
    if let Some(veg_min) = args.veg_min {
        config.thresholds.veg_min = veg_min;
    }
    if let Some(water_max) = args.water_max {
        config.thresholds.water_max = water_max;
    }
    if let Some(target) = args.target {
        config.target = target;
    }

    config.validate().context("Invalid pipeline parameters")?;
    Ok(config)
}

fn output_dir(base: &Path, timestamp: bool) -> Result<PathBuf> {
    let dir = if timestamp {
        base.join(format!("ndvi_output_{}", Local::now().format("%Y%m%d_%H%M%S")))
    } else {
        base.to_path_buf()
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    Ok(dir)
}

fn print_summary(output: &PipelineOutput, dir: &Path, elapsed: std::time::Duration) {
    let counts = output.class_counts();
    let total = output.labels.len().max(1) as f64;

    println!("Outputs saved to: {}", dir.display());
    println!("\nClasses:");
    for class in LandCover::ALL {
        let n = counts[class.code() as usize];
        println!(
            "  {:<10} {:>10} cells ({:.1}%)",
            class.name(),
            n,
            100.0 * n as f64 / total
        );
    }
    println!(
        "\n{} polygons: {} accepted, {} rejected",
        output.polygons.class,
        output.polygons.len(),
        output.polygons.rejected_count()
    );
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    let red = read_band(&args.red, args.red_nodata)?;
    let nir = read_band(&args.nir, args.nir_nodata)?;
    let dir = output_dir(&args.output_dir, args.timestamp)?;

    let start = Instant::now();
    let pb = spinner("Computing index, classes and polygons...");
    let output = pipeline::run(&red, &nir, &config).context("Pipeline failed")?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if output.polygons.rejected_count() > 0 {
        warn!(
            "{} region(s) had invalid geometry and were skipped",
            output.polygons.rejected_count()
        );
    }

    write_raster(&output.index.to_filled(), &dir.join("ndvi.tif"))?;
    write_raster(&output.labels, &dir.join("classes.tif"))?;

    if args.preview {
        let pb = spinner("Writing previews...");
        let classes = labels_to_rgba(&output.labels, &ClassPalette::default());
        write_rgba_geotiff(&classes, &output.labels, dir.join("classes_preview.tif"))
            .context("Failed to write class preview")?;
        let index = index_to_rgba(&output.index);
        write_rgba_geotiff(&index, &output.labels, dir.join("ndvi_preview.tif"))
            .context("Failed to write index preview")?;
        pb.finish_and_clear();
    }

    print_summary(&output, &dir, elapsed);

    let areas = dir.join(format!("{}_areas.geojson", config.target.name()));
    let crs = output.labels.crs().cloned();
    write_geojson(&output.polygons.into_features(crs), &areas)
        .with_context(|| format!("Failed to write {}", areas.display()))?;
    println!("Polygons saved to: {}", areas.display());

    Ok(())
}

fn extract(labels_path: &Path, output: &Path, target: LandCover) -> Result<()> {
    if target == LandCover::NoData {
        bail!("no-data is not an extractable class");
    }

    let pb = spinner("Reading labels...");
    let labels: Raster<u8> = read_geotiff(labels_path)
        .with_context(|| format!("Failed to read raster {}", labels_path.display()))?;
    pb.finish_and_clear();

    let start = Instant::now();
    let set = extract_polygons(&labels, target.code()).context("Failed to extract polygons")?;
    let elapsed = start.elapsed();

    let (accepted, rejected) = (set.len(), set.rejected_count());
    write_geojson(&set.into_features(labels.crs().cloned()), output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{} polygons saved to: {}", target, output.display());
    println!("  Accepted: {}, rejected: {}", accepted, rejected);
    println!("  Processing time: {:.2?}", elapsed);
    Ok(())
}

fn info(input: &Path) -> Result<()> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(input).context("Failed to read raster")?;
    pb.finish_and_clear();

    let (rows, cols) = raster.shape();
    let bounds = raster.bounds();
    let transform = raster.transform();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!(
        "Pixel size: {} x {}",
        transform.pixel_width, transform.pixel_height
    );
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = raster.crs() {
        println!("CRS: {}", crs);
    }
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => info(&input),
        Commands::Run(args) => run(args),
        Commands::Extract {
            labels,
            output,
            target,
        } => extract(&labels, &output, target),
    }
}
