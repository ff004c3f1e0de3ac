use std::collections::{BTreeMap, HashMap, HashSet};

use image::{Rgba, RgbaImage};
use kmeans_colors::get_kmeans;
use palette::{IntoColor, Lab, LinSrgb, Srgb};

use crate::color::{PaletteEntry, pack_key};
use crate::{LayertraceError, LayertraceResult};

/// A palette quantizer: picks representative colors and maps pixels onto them.
pub trait Quantizer {
    /// Choose at most `color_count` colors representing the image.
    fn build_palette(
        &self,
        image: &RgbaImage,
        color_count: usize,
    ) -> LayertraceResult<Vec<PaletteEntry>>;

    /// Replace every pixel with its nearest palette color, keeping its alpha.
    fn apply_palette(&self, image: &RgbaImage, palette: &[PaletteEntry]) -> RgbaImage {
        remap_nearest(image, palette)
    }
}

/// K-means quantizer working in CIE Lab.
#[derive(Debug, Clone)]
pub struct KmeansQuantizer {
    pub max_iterations: usize,
    pub converge: f32,
    pub seed: u64,
    /// Pixels with alpha below this value do not influence the palette.
    pub min_alpha: u8,
}

impl Default for KmeansQuantizer {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            converge: 1e-4,
            seed: 0,
            min_alpha: 1,
        }
    }
}

impl KmeansQuantizer {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_min_alpha(mut self, min_alpha: u8) -> Self {
        self.min_alpha = min_alpha;
        self
    }
}

impl Quantizer for KmeansQuantizer {
    fn build_palette(
        &self,
        image: &RgbaImage,
        color_count: usize,
    ) -> LayertraceResult<Vec<PaletteEntry>> {
        let samples: Vec<[u8; 3]> = image
            .pixels()
            .filter(|px| px[3] >= self.min_alpha)
            .map(|Rgba([r, g, b, _])| [*r, *g, *b])
            .collect();

        let distinct: BTreeMap<u32, [u8; 3]> = samples
            .iter()
            .map(|&[r, g, b]| (pack_key(r, g, b), [r, g, b]))
            .collect();

        if color_count == 0 || distinct.is_empty() {
            return Err(LayertraceError::EmptyPalette);
        }

        if distinct.len() <= color_count {
            tracing::debug!(colors = distinct.len(), "Image already fits the palette");
            return Ok(distinct.into_values().map(PaletteEntry::from).collect());
        }

        let lab: Vec<Lab> = samples
            .iter()
            .map(|&[r, g, b]| {
                let linear: LinSrgb<f32> = Srgb::new(r, g, b).into_format::<f32>().into_linear();
                linear.into_color()
            })
            .collect();

        let result = get_kmeans(
            color_count,
            self.max_iterations,
            self.converge,
            false,
            &lab,
            self.seed,
        );

        let mut seen = HashSet::new();
        let palette: Vec<PaletteEntry> = result
            .centroids
            .iter()
            .map(|&centroid| {
                let linear: LinSrgb<f32> = centroid.into_color();
                let srgb: Srgb<f32> = Srgb::from_linear(linear);
                let rgb: Srgb<u8> = srgb.into_format();
                PaletteEntry::new(rgb.red, rgb.green, rgb.blue)
            })
            .filter(|entry| seen.insert(entry.key))
            .collect();

        tracing::debug!(
            requested = color_count,
            built = palette.len(),
            score = result.score,
            "Built k-means palette"
        );

        if palette.is_empty() {
            return Err(LayertraceError::EmptyPalette);
        }
        Ok(palette)
    }
}

/// Map each pixel to the palette entry with the smallest squared RGB distance.
///
/// Ties go to the earlier entry. Alpha is copied from the source pixel.
pub fn remap_nearest(image: &RgbaImage, palette: &[PaletteEntry]) -> RgbaImage {
    let mut cache: HashMap<u32, [u8; 3]> = HashMap::new();
    let mut out = image.clone();
    if palette.is_empty() {
        return out;
    }

    for px in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *px;
        let [nr, ng, nb] = *cache
            .entry(pack_key(r, g, b))
            .or_insert_with(|| nearest_entry([r, g, b], palette));
        *px = Rgba([nr, ng, nb, a]);
    }
    out
}

fn nearest_entry(rgb: [u8; 3], palette: &[PaletteEntry]) -> [u8; 3] {
    let distance = |entry: &PaletteEntry| -> i32 {
        rgb.iter()
            .zip(entry.rgb.iter())
            .map(|(&a, &b)| {
                let d = i32::from(a) - i32::from(b);
                d * d
            })
            .sum()
    };

    let mut best = palette[0];
    let mut best_distance = distance(&best);
    for entry in &palette[1..] {
        let d = distance(entry);
        if d < best_distance {
            best = *entry;
            best_distance = d;
        }
    }
    best.rgb
}

/// Keep only the palette entries that actually occur in the quantized image.
pub fn used_entries(quantized: &RgbaImage, palette: &[PaletteEntry]) -> Vec<PaletteEntry> {
    let present: HashSet<u32> = quantized
        .pixels()
        .map(|Rgba([r, g, b, _])| pack_key(*r, *g, *b))
        .collect();
    palette
        .iter()
        .filter(|entry| present.contains(&entry.key))
        .copied()
        .collect()
}
