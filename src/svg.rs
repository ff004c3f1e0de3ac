use std::fs;
use std::path::Path;

use image::DynamicImage;

use crate::LayertraceResult;
use crate::layer::{Layer, LayerSet, OriginalMetadata};
use crate::optimizer::SvgOptimizer;
use crate::raster::encode_png;
use crate::vectorizer::MaskVectorizer;

/// Order in which traced layers are written into the document.
///
/// Later paths paint over earlier ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaintOrder {
    /// Descending z-index: with stacked masks the darker, smaller layers end up on top.
    #[default]
    LightestFirst,
    /// Ascending z-index.
    DarkestFirst,
}

/// How traced layers are combined into one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    pub paint_order: PaintOrder,
    /// Fill every layer with this color instead of its own.
    pub fill: Option<String>,
}

impl ComposeOptions {
    pub fn with_paint_order(mut self, paint_order: PaintOrder) -> Self {
        self.paint_order = paint_order;
        self
    }

    pub fn with_fill(mut self, fill: Option<String>) -> Self {
        self.fill = fill;
        self
    }
}

/// Wrap path fragments in an `<svg>` element of the given size.
pub fn assemble_svg<I, S>(width: u32, height: u32, fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" xmlns=\"http://www.w3.org/2000/svg\">"
    );
    for fragment in fragments {
        svg.push_str(fragment.as_ref());
    }
    svg.push_str("</svg>");
    svg
}

impl LayerSet {
    /// Trace every layer and assemble the fragments into one SVG document.
    ///
    /// Stops at the first layer the vectorizer rejects.
    pub fn trace<V>(
        &self,
        vectorizer: &V,
        options: &V::Options,
        compose: &ComposeOptions,
    ) -> LayertraceResult<VectorizedImage>
    where
        V: MaskVectorizer,
    {
        let mut ordered: Vec<&Layer> = self.layers.iter().collect();
        match compose.paint_order {
            PaintOrder::LightestFirst => ordered.sort_by(|a, b| b.z_index.cmp(&a.z_index)),
            PaintOrder::DarkestFirst => ordered.sort_by_key(|l| l.z_index),
        }

        let fragments = ordered
            .into_iter()
            .map(|layer| -> LayertraceResult<String> {
                let fill = compose.fill.as_deref().unwrap_or(&layer.color);
                let paths = vectorizer
                    .vectorize(&layer.mask, fill, options)
                    .map_err(|e| e.in_layer(&layer.id))?;
                tracing::trace!(layer = %layer.id, bytes = paths.len(), "Traced layer");
                Ok(paths)
            })
            .collect::<LayertraceResult<Vec<_>>>()?;

        let svg = assemble_svg(self.metadata.width, self.metadata.height, fragments);
        tracing::debug!(layers = self.layers.len(), bytes = svg.len(), "Assembled SVG");

        Ok(VectorizedImage {
            svg,
            preprocessed: self.preprocessed.clone(),
            metadata: self.metadata.clone(),
        })
    }
}

/// A traced image: the SVG document plus the composite it was traced from.
#[derive(Debug, Clone)]
pub struct VectorizedImage {
    pub svg: String,
    pub preprocessed: DynamicImage,
    pub metadata: OriginalMetadata,
}

impl VectorizedImage {
    /// Replace the document with the optimizer's output.
    pub fn optimize<O: SvgOptimizer + ?Sized>(mut self, optimizer: &O) -> LayertraceResult<Self> {
        let before = self.svg.len();
        self.svg = optimizer.optimize(&self.svg)?;
        tracing::debug!(before, after = self.svg.len(), "Optimized SVG");
        Ok(self)
    }

    /// Write the SVG document to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> LayertraceResult<()> {
        fs::write(path, &self.svg)?;
        Ok(())
    }

    /// PNG encoding of the preprocessed composite.
    pub fn preprocessed_png(&self) -> LayertraceResult<Vec<u8>> {
        encode_png(&self.preprocessed)
    }
}
