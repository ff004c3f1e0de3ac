use image::GrayImage;

use crate::LayertraceResult;

/// A trait representing an algorithm that can turn a layer mask into SVG path fragments.
///
/// Implementations return only the `<path>` elements for the ink pixels of
/// `mask`, filled with `fill`; the surrounding document is assembled by the caller.
pub trait MaskVectorizer {
    type Options;

    fn vectorize(
        &self,
        mask: &GrayImage,
        fill: &str,
        options: &Self::Options,
    ) -> LayertraceResult<String>;
}

#[cfg(feature = "vectorizer-vtracer")]
pub mod vtracer;
