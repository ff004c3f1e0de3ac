use usvg::{Options, Tree, WriteOptions};

use crate::{LayertraceError, LayertraceResult};

use super::SvgOptimizer;

/// Parse with usvg and write the normalized tree back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsvgOptimizer {
    /// Decimal places kept in path coordinates.
    pub coordinates_precision: u8,
    pub transforms_precision: u8,
}

impl Default for UsvgOptimizer {
    fn default() -> Self {
        Self {
            coordinates_precision: 2,
            transforms_precision: 4,
        }
    }
}

impl UsvgOptimizer {
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.coordinates_precision = precision;
        self
    }
}

impl SvgOptimizer for UsvgOptimizer {
    fn optimize(&self, svg: &str) -> LayertraceResult<String> {
        let tree = Tree::from_str(svg, &Options::default())
            .map_err(|e| LayertraceError::Optimize(e.to_string()))?;
        let write = WriteOptions {
            coordinates_precision: self.coordinates_precision,
            transforms_precision: self.transforms_precision,
            ..WriteOptions::default()
        };
        Ok(tree.to_string(&write))
    }
}
