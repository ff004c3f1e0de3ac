use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use layertrace::color::{parse_hex, to_hex};
use layertrace::{
    BinaryOptions, ComposeOptions, DenoiseOptions, ImageFilters, PaintOrder, QuantizeOptions,
    TraceOptions, UsvgOptimizer,
};
use visioncortex::PathSimplifyMode;

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Threshold the image into a single layer and trace it
    Binary(BinaryCommand),
    /// Quantize to a palette and trace one layer per color
    Quantize(QuantizeCommand),
    /// Quantize, median-filter every layer, infill gaps and trace
    Denoise(DenoiseCommand),
}

/// Input, output and export flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Input image path
    pub input: PathBuf,
    /// Output SVG path (defaults to input name with `.svg`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Run the assembled SVG through the usvg optimizer
    #[arg(long)]
    pub optimize: bool,
    /// Coordinate precision used by the optimizer
    #[arg(long = "optimize-precision", default_value_t = 2)]
    pub optimize_precision: u8,
    /// Save the preprocessed image as PNG (defaults to `<name>-preview.png`)
    #[arg(long = "export-preview", value_name = "PATH", num_args = 0..=1)]
    pub export_preview: Option<Option<PathBuf>>,
    /// Save every layer mask as `<DIR>/<id>.png`
    #[arg(long = "export-layers", value_name = "DIR")]
    pub export_layers: Option<PathBuf>,
}

impl From<&OutputArgs> for UsvgOptimizer {
    fn from(args: &OutputArgs) -> Self {
        UsvgOptimizer::default().with_precision(args.optimize_precision)
    }
}

#[derive(Args, Debug)]
pub struct BinaryCommand {
    #[command(flatten)]
    pub output: OutputArgs,
    /// Lowest gray value treated as background
    #[arg(long = "threshold-low", default_value_t = 128)]
    pub threshold_low: u8,
    /// Highest gray value treated as background
    #[arg(long = "threshold-high", default_value_t = 255)]
    pub threshold_high: u8,
    /// Fill color of the traced layer
    #[arg(long, default_value = "#000000", value_parser = parse_color)]
    pub color: String,
    #[command(flatten)]
    pub trace_options: TraceOptionsArgs,
}

impl From<&BinaryCommand> for BinaryOptions {
    fn from(cmd: &BinaryCommand) -> Self {
        BinaryOptions::default()
            .with_threshold(cmd.threshold_low, cmd.threshold_high)
            .with_color(cmd.color.clone())
    }
}

#[derive(Args, Debug)]
pub struct QuantizeCommand {
    #[command(flatten)]
    pub output: OutputArgs,
    #[command(flatten)]
    pub quantize: QuantizeArgs,
    /// Stack masks so each layer also covers every darker layer
    #[arg(long)]
    pub stack: bool,
    #[command(flatten)]
    pub trace_options: TraceOptionsArgs,
}

#[derive(Args, Debug)]
pub struct DenoiseCommand {
    #[command(flatten)]
    pub output: OutputArgs,
    #[command(flatten)]
    pub quantize: QuantizeArgs,
    /// Keep every layer's mask to its own pixels instead of stacking
    #[arg(long = "no-stack")]
    pub no_stack: bool,
    /// Median filter radius applied to every mask before infill
    #[arg(long = "median-radius")]
    pub median_radius: Option<u32>,
    #[command(flatten)]
    pub trace_options: TraceOptionsArgs,
}

impl From<&DenoiseCommand> for DenoiseOptions {
    fn from(cmd: &DenoiseCommand) -> Self {
        let quantize = QuantizeOptions::from(&cmd.quantize).with_stack(!cmd.no_stack);
        DenoiseOptions::default()
            .with_quantize(quantize)
            .with_median_radius(cmd.median_radius)
    }
}

#[derive(Args, Debug)]
pub struct QuantizeArgs {
    /// Number of palette colors
    #[arg(short = 'c', long = "colors", default_value_t = 8)]
    pub color_count: usize,
    /// Drop layers covering less than this share of the image (0.0-1.0 or 0-100%)
    #[arg(long = "min-percent", default_value_t = 0.0, value_parser = parse_fraction)]
    pub min_percent: f64,
    /// Leave pixels with alpha below this value out of every layer
    #[arg(long = "alpha-threshold")]
    pub alpha_threshold: Option<u8>,
    /// Brightness multiplier applied before quantizing
    #[arg(long)]
    pub brightness: Option<f32>,
    /// Gaussian blur sigma applied before quantizing
    #[arg(long)]
    pub blur: Option<f32>,
    /// Contrast adjustment applied before quantizing
    #[arg(long)]
    pub contrast: Option<f32>,
}

impl From<&QuantizeArgs> for QuantizeOptions {
    fn from(args: &QuantizeArgs) -> Self {
        QuantizeOptions::default()
            .with_color_count(args.color_count)
            .with_min_percent(args.min_percent)
            .with_alpha_threshold(args.alpha_threshold)
            .with_filters(ImageFilters {
                brightness: args.brightness,
                blur: args.blur,
                contrast: args.contrast,
            })
    }
}

/// Path simplification modes for SVG vectorization.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TracerMode {
    None,
    Polygon,
    Spline,
}

impl From<TracerMode> for PathSimplifyMode {
    /// Convert TracerMode to vtracer::PathSimplifyMode.
    fn from(value: TracerMode) -> Self {
        match value {
            TracerMode::None => PathSimplifyMode::None,
            TracerMode::Polygon => PathSimplifyMode::Polygon,
            TracerMode::Spline => PathSimplifyMode::Spline,
        }
    }
}

/// Order in which traced layers are painted.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PaintOrderArg {
    LightestFirst,
    DarkestFirst,
}

impl From<PaintOrderArg> for PaintOrder {
    fn from(value: PaintOrderArg) -> Self {
        match value {
            PaintOrderArg::LightestFirst => PaintOrder::LightestFirst,
            PaintOrderArg::DarkestFirst => PaintOrder::DarkestFirst,
        }
    }
}

#[derive(Args, Debug)]
pub struct TraceOptionsArgs {
    /// Path simplification mode
    #[arg(long = "mode", value_enum, default_value_t = TracerMode::Spline)]
    pub mode: TracerMode,
    /// Speckle filter size used by the tracer
    #[arg(long = "filter-speckle", default_value_t = 4)]
    pub filter_speckle: usize,
    /// Corner threshold override in degrees
    #[arg(long = "corner-threshold", default_value_t = 60)]
    pub corner_threshold: i32,
    /// Segment length threshold override
    #[arg(long = "length-threshold", default_value_t = 4.0)]
    pub length_threshold: f64,
    /// Maximum subdivision iterations override
    #[arg(long = "max-iterations", default_value_t = 10)]
    pub max_iterations: usize,
    /// Splice threshold override in degrees
    #[arg(long = "splice-threshold", default_value_t = 45)]
    pub splice_threshold: i32,
    /// Path precision override (decimal places)
    #[arg(long = "path-precision")]
    pub path_precision: Option<u32>,
    /// Disable explicit path precision override
    #[arg(long = "no-path-precision")]
    pub no_path_precision: bool,
    /// Paint order of the traced layers
    #[arg(long = "paint-order", value_enum, default_value_t = PaintOrderArg::LightestFirst)]
    pub paint_order: PaintOrderArg,
    /// Fill every layer with this color instead of its own
    #[arg(long, value_parser = parse_color)]
    pub fill: Option<String>,
}

impl From<&TraceOptionsArgs> for TraceOptions {
    fn from(args: &TraceOptionsArgs) -> Self {
        let defaults = TraceOptions::default();
        let tracer_path_precision = if args.no_path_precision {
            None
        } else {
            args.path_precision.or(defaults.tracer_path_precision)
        };
        TraceOptions {
            tracer_mode: args.mode.into(),
            tracer_filter_speckle: args.filter_speckle,
            tracer_corner_threshold: args.corner_threshold,
            tracer_length_threshold: args.length_threshold,
            tracer_max_iterations: args.max_iterations,
            tracer_splice_threshold: args.splice_threshold,
            tracer_path_precision,
        }
    }
}

impl From<&TraceOptionsArgs> for ComposeOptions {
    fn from(args: &TraceOptionsArgs) -> Self {
        ComposeOptions::default()
            .with_paint_order(args.paint_order.into())
            .with_fill(args.fill.clone())
    }
}

/// Normalize a `#rrggbb` / `rrggbb` color to lowercase `#rrggbb`.
fn parse_color(value: &str) -> Result<String, String> {
    parse_hex(value)
        .map(|[r, g, b]| to_hex(r, g, b))
        .ok_or_else(|| format!("color must be `#rrggbb`, got `{value}`"))
}

/// Accept a share either as a fraction (0.0-1.0) or as a percentage (1-100).
fn parse_fraction(value: &str) -> Result<f64, String> {
    let trimmed = value.trim_end_matches('%');
    let parsed = trimmed
        .parse::<f64>()
        .map_err(|_| format!("expected a number, got `{value}`"))?;

    if trimmed.len() != value.len() || parsed > 1.0 {
        if (0.0..=100.0).contains(&parsed) {
            return Ok(parsed / 100.0);
        }
    } else if parsed >= 0.0 {
        return Ok(parsed);
    }

    Err(format!(
        "{value} is out of range; expected 0.0-1.0 or 0-100%"
    ))
}
