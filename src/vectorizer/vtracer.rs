use image::GrayImage;
use visioncortex::{PathSimplifyMode, PointF64};
use vtracer::{ColorImage, ColorMode, Config, Hierarchical, SvgFile, convert};

use crate::mask::mask_to_color_image;
use crate::{LayertraceError, LayertraceResult};

use super::MaskVectorizer;

/// Options for tracing a layer mask with VTracer.
#[derive(Debug, Clone)]
pub struct TraceOptions {
    pub tracer_mode: PathSimplifyMode,
    /// Ink clusters smaller than this many pixels are discarded.
    pub tracer_filter_speckle: usize,
    pub tracer_corner_threshold: i32,
    pub tracer_length_threshold: f64,
    pub tracer_max_iterations: usize,
    pub tracer_splice_threshold: i32,
    /// Decimal places in path coordinates, `None` for full precision.
    pub tracer_path_precision: Option<u32>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            tracer_mode: PathSimplifyMode::Spline,
            tracer_filter_speckle: 4,
            tracer_corner_threshold: 60,
            tracer_length_threshold: 4.0,
            tracer_max_iterations: 10,
            tracer_splice_threshold: 45,
            tracer_path_precision: Some(2),
        }
    }
}

impl TraceOptions {
    pub fn with_mode(mut self, mode: PathSimplifyMode) -> Self {
        self.tracer_mode = mode;
        self
    }

    pub fn with_filter_speckle(mut self, filter_speckle: usize) -> Self {
        self.tracer_filter_speckle = filter_speckle;
        self
    }

    pub fn with_path_precision(mut self, precision: Option<u32>) -> Self {
        self.tracer_path_precision = precision;
        self
    }
}

/// VTracer-based path vectorizer for single-color layer masks.
#[derive(Debug, Clone, Copy, Default)]
pub struct VtracerVectorizer;

impl MaskVectorizer for VtracerVectorizer {
    type Options = TraceOptions;

    fn vectorize(
        &self,
        mask: &GrayImage,
        fill: &str,
        options: &Self::Options,
    ) -> LayertraceResult<String> {
        let svg_file = trace(mask_to_color_image(mask), options)?;
        Ok(path_fragments(&svg_file, fill))
    }
}

/// Trace a ColorImage in binary mode, where dark pixels are the shape.
pub fn trace(img: ColorImage, options: &TraceOptions) -> LayertraceResult<SvgFile> {
    let cfg = Config {
        color_mode: ColorMode::Binary,
        hierarchical: Hierarchical::Stacked,
        mode: options.tracer_mode,
        filter_speckle: options.tracer_filter_speckle,
        color_precision: 6,
        layer_difference: 16,
        corner_threshold: options.tracer_corner_threshold,
        length_threshold: options.tracer_length_threshold,
        max_iterations: options.tracer_max_iterations,
        splice_threshold: options.tracer_splice_threshold,
        path_precision: options.tracer_path_precision,
    };

    convert(img, cfg).map_err(LayertraceError::trace)
}

/// Render every traced path as a `<path>` element painted with `fill`.
pub fn path_fragments(svg_file: &SvgFile, fill: &str) -> String {
    let mut out = String::new();
    for svg_path in &svg_file.paths {
        let (d, offset) =
            svg_path
                .path
                .to_svg_string(true, PointF64::default(), svg_file.path_precision);
        out.push_str(&format!(
            "<path d=\"{d}\" fill=\"{fill}\" transform=\"translate({},{})\"/>\n",
            offset.x, offset.y
        ));
    }
    out
}
