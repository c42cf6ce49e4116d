//! Command-line interface for the raster conversion tool.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::batch::{BatchConverter, JobStatus};
use crate::config::{ByteOrder, ConversionConfig, Preset};
use crate::handle::PackedLayout;
use crate::pipeline::{BatchStats, ConversionPipeline, ConversionResult};
use crate::raster::DecodedRaster;

/// JPEG 2000 raster conversion tool
///
/// Decodes JPEG 2000 (and other) images and packs them into interleaved
/// buffers laid out for a host graphics API.
#[derive(Parser, Debug)]
#[command(name = "jp2raster")]
#[command(version)]
#[command(about = "Convert decoded JPEG 2000 rasters into packed platform images")]
#[command(long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Layout options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Starting preset
    #[arg(short, long, value_enum, default_value = "standard")]
    pub preset: PresetArg,

    /// TOML configuration file (overrides the preset)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Channel depth of the packed buffer
    #[arg(long, value_parser = ["8", "16"])]
    pub bits: Option<String>,

    /// Append an opaque alpha channel to RGB images
    #[arg(long)]
    pub alpha: bool,

    /// Row alignment in bytes (power of two)
    #[arg(long)]
    pub align: Option<usize>,

    /// Write 16-bit channels little-endian
    #[arg(long)]
    pub little_endian: bool,
}

impl LayoutArgs {
    /// Resolve preset, config file and flags into one configuration.
    pub fn to_config(&self) -> anyhow::Result<ConversionConfig> {
        let mut config = match &self.config {
            Some(path) => ConversionConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Preset::from(self.preset.clone()).config(),
        };

        if let Some(bits) = &self.bits {
            config.bits_per_component = bits.parse()?;
        }
        if self.alpha {
            config.synthesize_alpha = true;
        }
        if let Some(align) = self.align {
            config.row_alignment = align;
        }
        if self.little_endian {
            config.byte_order = ByteOrder::Little;
        }

        config.validate()?;
        Ok(config)
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode an image, pack it and save the result
    Convert {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Output path; the extension selects the format
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Packed layout options
        #[command(flatten)]
        layout: LayoutArgs,

        /// Convert without writing output
        #[arg(long)]
        dry_run: bool,
    },

    /// Show raster and packed layout information
    Info {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Packed layout options
        #[command(flatten)]
        layout: LayoutArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert every matching file in a directory
    Batch {
        /// Input directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Packed layout options
        #[command(flatten)]
        layout: LayoutArgs,

        /// Scan subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Parallel jobs (defaults to the CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// File name patterns (repeatable)
        #[arg(long = "pattern")]
        patterns: Vec<String>,

        /// Output file extension
        #[arg(long, default_value = "png")]
        format: String,
    },
}

/// Preset argument.
#[derive(ValueEnum, Clone, Debug)]
pub enum PresetArg {
    /// 8-bit, tightly packed, no synthesised alpha
    Standard,
    /// 8-bit with opaque alpha and 16-byte rows
    CoreGraphics,
    /// 16-bit channels
    HighPrecision,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Standard => Preset::Standard,
            PresetArg::CoreGraphics => Preset::CoreGraphics,
            PresetArg::HighPrecision => Preset::HighPrecision,
        }
    }
}

/// Run the CLI application.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    } else if !cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();
    }

    match cli.command {
        Commands::Convert {
            input,
            output,
            layout,
            dry_run,
        } => run_convert(&input, output.as_deref(), &layout, dry_run, cli.quiet),
        Commands::Info {
            input,
            layout,
            json,
        } => run_info(&input, &layout, json),
        Commands::Batch {
            input,
            output,
            layout,
            recursive,
            jobs,
            patterns,
            format,
        } => run_batch(
            &input, output, &layout, recursive, jobs, patterns, &format, cli.quiet,
        ),
    }
}

fn run_convert(
    input: &Path,
    output: Option<&Path>,
    layout: &LayoutArgs,
    dry_run: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let pipeline = ConversionPipeline::new(layout.to_config()?)?.dry_run(dry_run);
    let result = pipeline
        .convert_file(input, output)
        .with_context(|| format!("converting {}", input.display()))?;

    if !quiet {
        print_conversion_result(&result);
    }

    Ok(())
}

#[derive(Serialize)]
struct InfoReport<'a> {
    path: &'a Path,
    width: u32,
    height: u32,
    color_space: String,
    components: Vec<ComponentReport>,
    packed: &'a PackedLayout,
    bitmap_info: u32,
}

#[derive(Serialize)]
struct ComponentReport {
    precision: u32,
    signed: bool,
    alpha: bool,
}

fn run_info(input: &Path, layout: &LayoutArgs, json: bool) -> anyhow::Result<()> {
    let pipeline = ConversionPipeline::new(layout.to_config()?)?;
    let (raster, packed) = pipeline
        .analyze(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let report = info_report(input, &raster, &packed);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Raster Information");
    println!("==================");
    println!("File: {}", input.display());
    println!("  Dimensions: {}x{}", report.width, report.height);
    println!("  Colour Space: {}", report.color_space);
    for (index, component) in report.components.iter().enumerate() {
        println!(
            "  Component {}: {} bits{}{}",
            index,
            component.precision,
            if component.signed { ", signed" } else { "" },
            if component.alpha { ", alpha" } else { "" }
        );
    }
    println!();
    print_layout(&packed);

    Ok(())
}

fn info_report<'a>(path: &'a Path, raster: &DecodedRaster, packed: &'a PackedLayout) -> InfoReport<'a> {
    InfoReport {
        path,
        width: raster.width,
        height: raster.height,
        color_space: raster.color_space.to_string(),
        components: raster
            .components
            .iter()
            .map(|c| ComponentReport {
                precision: c.precision,
                signed: c.is_signed,
                alpha: c.is_alpha,
            })
            .collect(),
        packed,
        bitmap_info: packed.bitmap_info(),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_batch(
    input: &Path,
    output: PathBuf,
    layout: &LayoutArgs,
    recursive: bool,
    jobs: Option<usize>,
    patterns: Vec<String>,
    format: &str,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut converter = BatchConverter::new(layout.to_config()?)
        .recursive(recursive)
        .output_dir(output)
        .output_extension(format);
    if let Some(jobs) = jobs {
        converter = converter.max_parallel(jobs);
    }
    if !patterns.is_empty() {
        converter = converter.patterns(patterns);
    }

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}]")?,
        );
        bar
    };

    let (stats, results) = converter
        .process_directory_with(input, |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
        .with_context(|| format!("converting {}", input.display()))?;
    bar.finish_and_clear();

    if !quiet {
        for result in results.iter().filter(|r| r.status == JobStatus::Failed) {
            if let Some(err) = &result.error {
                println!("  Failed: {} ({})", result.job.source_path.display(), err);
            }
        }
        print_batch_stats(&stats);
    }

    if stats.failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", stats.failed, stats.total_files);
    }

    Ok(())
}

fn print_layout(layout: &PackedLayout) {
    println!("Packed Layout:");
    println!(
        "  Model: {:?} ({} channel(s), alpha {:?})",
        layout.color_model, layout.channels, layout.alpha_info
    );
    println!("  Bits/Component: {}", layout.bits_per_component);
    println!("  Bits/Pixel: {}", layout.bits_per_pixel);
    println!("  Bytes/Row: {}", layout.bytes_per_row);
    println!(
        "  Buffer Size: {} bytes ({:.2} MB)",
        layout.buffer_len(),
        layout.buffer_len() as f64 / 1_048_576.0
    );
    println!("  Bitmap Info: {:#06x}", layout.bitmap_info());
}

fn print_conversion_result(result: &ConversionResult) {
    println!("Conversion Result:");
    println!("  Source: {} ({})", result.source_path.display(), result.format);
    if let Some(out) = &result.output_path {
        println!("  Output: {}", out.display());
    }
    println!("  Input Size: {} bytes", result.input_size);
    println!("  Precisions: {:?}", result.precisions);
    print_layout(&result.layout);
    println!("  Time: {} ms", result.conversion_time_ms);

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
}

fn print_batch_stats(stats: &BatchStats) {
    println!("Batch Result:");
    println!("  Files: {}", stats.total_files);
    println!("  Converted: {}", stats.successful);
    println!("  Failed: {}", stats.failed);
    println!("  Skipped: {}", stats.skipped);
    println!(
        "  Input: {} bytes, Packed: {} bytes ({:.2}x)",
        stats.total_input_bytes,
        stats.total_packed_bytes,
        stats.expansion_ratio()
    );
    println!("  Time: {} ms", stats.total_time_ms);
}
