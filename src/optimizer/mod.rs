use crate::LayertraceResult;

/// Rewrites an assembled SVG document into a smaller equivalent one.
pub trait SvgOptimizer {
    fn optimize(&self, svg: &str) -> LayertraceResult<String>;
}

#[cfg(feature = "optimizer-usvg")]
pub mod usvg;
