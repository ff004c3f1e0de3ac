pub mod color;
pub mod compositor;
pub mod config;
pub mod denoise;
pub mod error;
pub mod layer;
pub mod mask;
pub mod optimizer;
pub mod preprocess;
pub mod quantize;
pub mod raster;
pub mod svg;
pub mod vectorizer;

pub use color::PaletteEntry;
pub use config::{BinaryOptions, DenoiseOptions, ImageFilters, QuantizeOptions};
pub use denoise::{MaskDenoiser, MedianDenoiser};
pub use error::{LayertraceError, LayertraceResult};
pub use layer::{Layer, LayerSet, OriginalMetadata};
pub use optimizer::SvgOptimizer;
#[cfg(feature = "optimizer-usvg")]
pub use optimizer::usvg::UsvgOptimizer;
pub use quantize::{KmeansQuantizer, Quantizer};
pub use svg::{ComposeOptions, PaintOrder, VectorizedImage};
pub use vectorizer::MaskVectorizer;
#[cfg(feature = "vectorizer-vtracer")]
pub use vectorizer::vtracer::{TraceOptions, VtracerVectorizer};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

/// Entry point for decoding images and configuring the quantizer.
#[derive(Debug, Clone, Default)]
pub struct Layertrace<Q = KmeansQuantizer> {
    quantizer: Q,
    /// Used by [`DecodedImage::quantize`] when no options are passed.
    default_quantize: QuantizeOptions,
}

impl Layertrace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<Q: Quantizer + Clone> Layertrace<Q> {
    /// Swap in a different palette quantizer.
    pub fn with_quantizer<R: Quantizer + Clone>(self, quantizer: R) -> Layertrace<R> {
        Layertrace {
            quantizer,
            default_quantize: self.default_quantize,
        }
    }

    /// Set the quantize options to use when none are specified.
    pub fn with_default_quantize(mut self, options: QuantizeOptions) -> Self {
        self.default_quantize = options;
        self
    }

    pub fn quantizer(&self) -> &Q {
        &self.quantizer
    }

    /// Read and decode an image file.
    pub fn for_image(&self, image_path: impl AsRef<Path>) -> LayertraceResult<DecodedImage<Q>> {
        let bytes = fs::read(image_path.as_ref())?;
        self.for_bytes(&bytes)
    }

    /// Wrap an already decoded RGBA buffer of `width * height * 4` bytes.
    pub fn for_rgba(
        &self,
        width: u32,
        height: u32,
        raw: Vec<u8>,
    ) -> LayertraceResult<DecodedImage<Q>> {
        let image = raster::rgba_from_raw(width, height, raw)?;
        tracing::debug!(width, height, "Wrapped raw RGBA buffer");
        let metadata = OriginalMetadata {
            width,
            height,
            format: None,
        };
        Ok(self.decoded(image, metadata))
    }

    /// Decode an in-memory image.
    pub fn for_bytes(&self, bytes: &[u8]) -> LayertraceResult<DecodedImage<Q>> {
        let (image, metadata) = raster::decode(bytes)?;
        Ok(self.decoded(image, metadata))
    }

    fn decoded(&self, image: RgbaImage, metadata: OriginalMetadata) -> DecodedImage<Q> {
        DecodedImage {
            image: Arc::new(image),
            metadata,
            quantizer: self.quantizer.clone(),
            default_quantize: self.default_quantize.clone(),
        }
    }
}

/// A decoded input image from which any of the layer modes can be run.
#[derive(Debug, Clone)]
pub struct DecodedImage<Q = KmeansQuantizer> {
    image: Arc<RgbaImage>,
    metadata: OriginalMetadata,
    quantizer: Q,
    default_quantize: QuantizeOptions,
}

impl<Q: Quantizer> DecodedImage<Q> {
    /// Get a reference to the decoded RGBA pixels.
    pub fn image(&self) -> &RgbaImage {
        self.image.as_ref()
    }

    pub fn metadata(&self) -> &OriginalMetadata {
        &self.metadata
    }

    /// Threshold into a single layer.
    pub fn binary(&self, options: &BinaryOptions) -> LayertraceResult<LayerSet> {
        preprocess::binary(&self.image, self.metadata.clone(), options)
    }

    /// Quantize into one layer per palette color, with the default options when `None`.
    pub fn quantize(&self, options: Option<&QuantizeOptions>) -> LayertraceResult<LayerSet> {
        let options = options.unwrap_or(&self.default_quantize);
        preprocess::quantize(&self.image, self.metadata.clone(), &self.quantizer, options)
    }

    /// Quantize, median-filter the masks and infill orphaned pixels.
    pub fn quantize_denoised(&self, options: &DenoiseOptions) -> LayertraceResult<LayerSet> {
        preprocess::quantize_denoised_median(
            &self.image,
            self.metadata.clone(),
            &self.quantizer,
            options,
        )
    }

    /// Like [`Self::quantize_denoised`] with a caller-supplied mask filter.
    pub fn quantize_denoised_with<D: MaskDenoiser + ?Sized>(
        &self,
        denoiser: &D,
        options: &QuantizeOptions,
    ) -> LayertraceResult<LayerSet> {
        preprocess::quantize_denoised(
            &self.image,
            self.metadata.clone(),
            &self.quantizer,
            Some(denoiser),
            options,
        )
    }
}

/// Decode `bytes` and threshold them into a single layer.
pub fn binary_preprocess(bytes: &[u8], options: &BinaryOptions) -> LayertraceResult<LayerSet> {
    Layertrace::new().for_bytes(bytes)?.binary(options)
}

/// Decode `bytes` and quantize them with the default k-means quantizer.
pub fn quantize_preprocess(bytes: &[u8], options: &QuantizeOptions) -> LayertraceResult<LayerSet> {
    Layertrace::new().for_bytes(bytes)?.quantize(Some(options))
}

/// Decode `bytes`, quantize, denoise and infill.
pub fn quantize_denoise_preprocess(
    bytes: &[u8],
    options: &DenoiseOptions,
) -> LayertraceResult<LayerSet> {
    Layertrace::new().for_bytes(bytes)?.quantize_denoised(options)
}
