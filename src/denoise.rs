use std::collections::HashMap;

use image::{GrayImage, Rgba, RgbaImage};
use imageproc::filter::median_filter;

use crate::color::pack_key;
use crate::layer::Layer;
use crate::mask::{BACKGROUND, INK, SearchScratch, nearest_non_empty_with, union_claimed};
use crate::{LayertraceError, LayertraceResult};

/// A morphological filter applied to one layer mask at a time.
pub trait MaskDenoiser {
    fn denoise(&self, mask: &GrayImage) -> GrayImage;
}

/// Square median filter. Binary masks stay binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianDenoiser {
    pub radius: u32,
}

impl MedianDenoiser {
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }
}

impl MaskDenoiser for MedianDenoiser {
    fn denoise(&self, mask: &GrayImage) -> GrayImage {
        if self.radius == 0 {
            return mask.clone();
        }
        median_filter(mask, self.radius, self.radius)
    }
}

/// Replace every mask with its denoised version. Counts are left alone.
pub fn denoise_layers<D: MaskDenoiser + ?Sized>(layers: Vec<Layer>, denoiser: &D) -> Vec<Layer> {
    layers
        .into_iter()
        .map(|layer| {
            let mask = denoiser.denoise(&layer.mask);
            Layer { mask, ..layer }
        })
        .collect()
}

/// Give every unclaimed pixel to the layer of its nearest claimed neighbour.
///
/// The union of all masks is computed once up front, so pixels filled during
/// this pass never serve as a source for other orphans and a second pass
/// changes nothing. The receiving layer is chosen by the neighbour's color in
/// `quantized`, not by which mask still claims it. Pixels with alpha below
/// `alpha_threshold` are never claimed.
pub fn infill_orphans(
    mut layers: Vec<Layer>,
    quantized: &RgbaImage,
    alpha_threshold: Option<u8>,
) -> LayertraceResult<Vec<Layer>> {
    let (w, h) = quantized.dimensions();
    if let Some(layer) = layers.iter().find(|l| l.mask.dimensions() != (w, h)) {
        return Err(LayertraceError::DimensionMismatch {
            width: w,
            height: h,
            channels: 1,
            found: layer.mask.as_raw().len(),
        });
    }

    let by_key: HashMap<u32, usize> = layers
        .iter()
        .enumerate()
        .map(|(idx, layer)| (layer.key(), idx))
        .collect();
    let union = union_claimed(layers.iter().map(|l| &l.mask), w, h)?;
    if !union.as_raw().contains(&INK) {
        tracing::debug!("No claimed pixels to infill from");
        return Ok(layers);
    }
    let pixels = quantized.as_raw();

    let mut scratch = SearchScratch::new();
    let mut filled = 0u64;
    let mut unresolved = 0u64;
    for (pixel, &value) in union.as_raw().iter().enumerate() {
        if value != BACKGROUND {
            continue;
        }
        let alpha = pixels[pixel * 4 + 3];
        if alpha_threshold.is_some_and(|t| alpha < t) {
            continue;
        }

        let Some(source) = nearest_non_empty_with(&mut scratch, union.as_raw(), pixel, w, h) else {
            unresolved += 1;
            continue;
        };
        let Rgba([r, g, b, _]) = quantized_pixel(pixels, source);
        match by_key.get(&pack_key(r, g, b)) {
            Some(&idx) => {
                layers[idx].claim(pixel);
                filled += 1;
            }
            None => unresolved += 1,
        }
    }

    tracing::debug!(filled, unresolved, "Infilled orphaned pixels");
    Ok(layers)
}

fn quantized_pixel(raw: &[u8], pixel: usize) -> Rgba<u8> {
    let i = pixel * 4;
    Rgba([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]])
}
