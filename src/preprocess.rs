//! The three preprocessing modes: binary threshold, palette quantization and
//! quantization with per-mask denoising.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};

use crate::LayertraceResult;
use crate::compositor::{retain_min_coverage, stack_layers};
use crate::config::{BinaryOptions, DenoiseOptions, QuantizeOptions};
use crate::denoise::{MaskDenoiser, MedianDenoiser, denoise_layers, infill_orphans};
use crate::layer::{Layer, LayerSet, OriginalMetadata, extract_layers};
use crate::mask::{BACKGROUND, INK};
use crate::quantize::{Quantizer, used_entries};
use crate::raster::apply_filters;

/// Threshold the grayscale image into a single ink layer.
///
/// Gray values inside the inclusive `threshold` range become background.
pub fn binary(
    image: &RgbaImage,
    metadata: OriginalMetadata,
    options: &BinaryOptions,
) -> LayertraceResult<LayerSet> {
    let (low, high) = options.threshold;
    let gray = image::imageops::grayscale(image);
    let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Luma([if (low..=high).contains(&v) { BACKGROUND } else { INK }])
    });

    let layer = Layer::from_mask("binary", 0, &options.color, mask.clone())?;
    tracing::debug!(ink = layer.count, low, high, "Thresholded binary layer");

    Ok(LayerSet {
        layers: vec![layer],
        preprocessed: DynamicImage::ImageLuma8(mask),
        metadata,
    })
}

/// Quantize to a palette and cut one layer per used color.
pub fn quantize<Q: Quantizer + ?Sized>(
    image: &RgbaImage,
    metadata: OriginalMetadata,
    quantizer: &Q,
    options: &QuantizeOptions,
) -> LayertraceResult<LayerSet> {
    let (quantized, layers) = quantized_layers(image, quantizer, options)?;
    finish(quantized, layers, metadata, options)
}

/// Quantize, median-filter every mask, then hand orphaned pixels to their
/// nearest claimed neighbour before stacking.
pub fn quantize_denoised<Q, D>(
    image: &RgbaImage,
    metadata: OriginalMetadata,
    quantizer: &Q,
    denoiser: Option<&D>,
    options: &QuantizeOptions,
) -> LayertraceResult<LayerSet>
where
    Q: Quantizer + ?Sized,
    D: MaskDenoiser + ?Sized,
{
    let (quantized, mut layers) = quantized_layers(image, quantizer, options)?;
    if let Some(denoiser) = denoiser {
        layers = denoise_layers(layers, denoiser);
    }
    let layers = infill_orphans(layers, &quantized, options.alpha_threshold)?;
    finish(quantized, layers, metadata, options)
}

/// [`quantize_denoised`] with a [`MedianDenoiser`] built from the options.
pub fn quantize_denoised_median<Q: Quantizer + ?Sized>(
    image: &RgbaImage,
    metadata: OriginalMetadata,
    quantizer: &Q,
    options: &DenoiseOptions,
) -> LayertraceResult<LayerSet> {
    let denoiser = options.median_radius.map(MedianDenoiser::new);
    quantize_denoised(
        image,
        metadata,
        quantizer,
        denoiser.as_ref(),
        &options.quantize,
    )
}

fn quantized_layers<Q: Quantizer + ?Sized>(
    image: &RgbaImage,
    quantizer: &Q,
    options: &QuantizeOptions,
) -> LayertraceResult<(RgbaImage, Vec<Layer>)> {
    let filtered = if options.filters.is_identity() {
        image.clone()
    } else {
        apply_filters(image, &options.filters)
    };

    let palette = quantizer.build_palette(&filtered, options.color_count)?;
    let quantized = quantizer.apply_palette(&filtered, &palette);
    let used = used_entries(&quantized, &palette);
    tracing::debug!(
        palette = palette.len(),
        used = used.len(),
        "Quantized image"
    );

    let extraction = extract_layers(&quantized, &used, options.alpha_threshold);
    Ok((quantized, extraction.layers))
}

fn finish(
    quantized: RgbaImage,
    layers: Vec<Layer>,
    metadata: OriginalMetadata,
    options: &QuantizeOptions,
) -> LayertraceResult<LayerSet> {
    let layers = if options.stack {
        stack_layers(layers)?
    } else {
        layers
    };
    let layers = retain_min_coverage(layers, options.min_percent, metadata.pixel_count());

    Ok(LayerSet {
        layers,
        preprocessed: DynamicImage::ImageRgba8(quantized),
        metadata,
    })
}
