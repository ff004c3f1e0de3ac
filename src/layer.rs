use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

use crate::color::{PaletteEntry, pack_key, parse_hex, to_hex};
use crate::{LayertraceError, LayertraceResult};
use crate::mask::{INK, blank_mask};
use crate::raster::encode_png;

/// Size and format of the image a layer set was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalMetadata {
    pub width: u32,
    pub height: u32,
    /// MIME type guessed from the input bytes, e.g. `image/png`.
    pub format: Option<String>,
}

impl OriginalMetadata {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// One flat-color layer: a single-channel mask where `0` is ink and `255` background.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: String,
    /// Rank after the luminance sort, 0 is the darkest layer.
    pub z_index: usize,
    /// Display color, `#rrggbb`.
    pub color: String,
    pub rgb: [u8; 3],
    pub mask: GrayImage,
    /// Pixels assigned to this layer by its own color (plus infill), before stacking.
    pub count: u64,
}

impl Layer {
    /// A layer with an all-background mask.
    pub fn empty(entry: &PaletteEntry, z_index: usize, width: u32, height: u32) -> Self {
        Self {
            id: format!("layer_{z_index}"),
            z_index,
            color: entry.hex(),
            rgb: entry.rgb,
            mask: blank_mask(width, height),
            count: 0,
        }
    }

    /// A layer around an existing mask.
    ///
    /// `color` is `#rrggbb` or `rrggbb` and is stored in lowercase `#rrggbb` form.
    pub fn from_mask(
        id: impl Into<String>,
        z_index: usize,
        color: &str,
        mask: GrayImage,
    ) -> LayertraceResult<Self> {
        let [r, g, b] =
            parse_hex(color).ok_or_else(|| LayertraceError::InvalidColor(color.to_string()))?;
        let count = crate::mask::ink_count(&mask);
        Ok(Self {
            id: id.into(),
            z_index,
            color: to_hex(r, g, b),
            rgb: [r, g, b],
            mask,
            count,
        })
    }

    pub fn key(&self) -> u32 {
        let [r, g, b] = self.rgb;
        pack_key(r, g, b)
    }

    /// Fraction of `total` pixels owned by this layer.
    pub fn coverage(&self, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.count as f64 / total as f64
        }
    }

    /// Claim the pixel at linear index `pixel` for this layer.
    pub(crate) fn claim(&mut self, pixel: usize) {
        let w = self.mask.width() as usize;
        let (x, y) = ((pixel % w) as u32, (pixel / w) as u32);
        self.mask.put_pixel(x, y, Luma([INK]));
        self.count += 1;
    }
}

/// Ordered layers plus the composite they were cut from.
#[derive(Debug, Clone)]
pub struct LayerSet {
    /// Sorted ascending by `z_index`.
    pub layers: Vec<Layer>,
    /// The quantized (or thresholded) image the masks were derived from.
    pub preprocessed: DynamicImage,
    pub metadata: OriginalMetadata,
}

impl LayerSet {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// PNG encoding of the preprocessed composite.
    pub fn preprocessed_png(&self) -> LayertraceResult<Vec<u8>> {
        encode_png(&self.preprocessed)
    }

    /// PNG encoding of every mask, keyed by layer id, in z-order.
    pub fn layer_pngs(&self) -> LayertraceResult<Vec<(String, Vec<u8>)>> {
        self.layers
            .iter()
            .map(|layer| {
                let png = encode_png(&DynamicImage::ImageLuma8(layer.mask.clone()))?;
                Ok((layer.id.clone(), png))
            })
            .collect()
    }

    /// Write every mask as `<dir>/<id>.png`, returning the written paths.
    pub fn save_layers(&self, dir: impl AsRef<Path>) -> LayertraceResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.layers.len());
        for (id, png) in self.layer_pngs()? {
            let path = dir.join(format!("{id}.png"));
            fs::write(&path, png)?;
            written.push(path);
        }
        Ok(written)
    }

}

/// Masks for every palette color of a quantized image, before stacking.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Sorted ascending by luminance; `layers[i].z_index == i`.
    pub layers: Vec<Layer>,
    /// Pixels left out because their alpha was below the visibility threshold.
    pub skipped_transparent: u64,
    /// Pixels whose color matched no palette entry.
    pub skipped_unknown: u64,
}

impl Extraction {
    pub fn assigned(&self) -> u64 {
        self.layers.iter().map(|l| l.count).sum()
    }
}

/// Build one mask per palette entry from a quantized RGBA image.
///
/// Entries are sorted by luminance (darkest first) and that order becomes the
/// z-index. Pixels with alpha below `alpha_threshold` and pixels whose color is
/// not in the palette are left out of every layer.
pub fn extract_layers(
    quantized: &RgbaImage,
    palette: &[PaletteEntry],
    alpha_threshold: Option<u8>,
) -> Extraction {
    let (w, h) = quantized.dimensions();

    let mut sorted: Vec<PaletteEntry> = palette.to_vec();
    sorted.sort_by(|a, b| a.luminance.total_cmp(&b.luminance));

    let mut key_index: HashMap<u32, usize> = HashMap::with_capacity(sorted.len());
    let mut unique = Vec::with_capacity(sorted.len());
    for entry in sorted {
        if let Entry::Vacant(slot) = key_index.entry(entry.key) {
            slot.insert(unique.len());
            unique.push(entry);
        }
    }

    let mut layers: Vec<Layer> = unique
        .iter()
        .enumerate()
        .map(|(z, entry)| Layer::empty(entry, z, w, h))
        .collect();

    let mut skipped_transparent = 0;
    let mut skipped_unknown = 0;
    for (pixel, Rgba([r, g, b, a])) in quantized.pixels().enumerate() {
        if alpha_threshold.is_some_and(|t| *a < t) {
            skipped_transparent += 1;
            continue;
        }
        match key_index.get(&pack_key(*r, *g, *b)) {
            Some(&idx) => layers[idx].claim(pixel),
            None => skipped_unknown += 1,
        }
    }

    if skipped_unknown > 0 {
        tracing::warn!(
            pixels = skipped_unknown,
            "Skipped pixels whose color is not in the palette"
        );
    }
    tracing::debug!(
        layers = layers.len(),
        skipped_transparent,
        "Extracted layer masks"
    );

    Extraction {
        layers,
        skipped_transparent,
        skipped_unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The 2x2 image from the black/white example: columns alternate black, white.
    fn checker_2x2() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        img
    }

    mod extract_layers {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn black_and_white_example() {
                // palette deliberately given lightest first
                let palette = vec![PaletteEntry::new(255, 255, 255), PaletteEntry::new(0, 0, 0)];
                let ex = extract_layers(&checker_2x2(), &palette, None);

                assert_eq!(ex.layers.len(), 2);
                let black = &ex.layers[0];
                let white = &ex.layers[1];
                assert_eq!(black.z_index, 0);
                assert_eq!(black.color, "#000000");
                assert_eq!(black.count, 2);
                assert_eq!(black.mask.as_raw(), &vec![0, 255, 0, 255]);
                assert_eq!(white.z_index, 1);
                assert_eq!(white.color, "#ffffff");
                assert_eq!(white.count, 2);
                assert_eq!(white.mask.as_raw(), &vec![255, 0, 255, 0]);
            }

            #[test]
            fn ids_follow_z_index() {
                let palette = vec![PaletteEntry::new(200, 0, 0), PaletteEntry::new(10, 10, 10)];
                let ex = extract_layers(&checker_2x2(), &palette, None);
                assert_eq!(ex.layers[0].id, "layer_0");
                assert_eq!(ex.layers[1].id, "layer_1");
            }

            #[test]
            fn transparent_pixels_are_skipped() {
                let mut img = checker_2x2();
                img.put_pixel(0, 0, Rgba([0, 0, 0, 10]));
                let palette = vec![PaletteEntry::new(0, 0, 0), PaletteEntry::new(255, 255, 255)];
                let ex = extract_layers(&img, &palette, Some(128));

                assert_eq!(ex.skipped_transparent, 1);
                assert_eq!(ex.layers[0].count, 1);
                assert_eq!(ex.layers[0].mask.as_raw(), &vec![255, 255, 0, 255]);
            }

            #[test]
            fn alpha_is_ignored_without_threshold() {
                let mut img = checker_2x2();
                img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
                let palette = vec![PaletteEntry::new(0, 0, 0), PaletteEntry::new(255, 255, 255)];
                let ex = extract_layers(&img, &palette, None);
                assert_eq!(ex.skipped_transparent, 0);
                assert_eq!(ex.layers[0].count, 2);
            }

            #[test]
            fn unknown_colors_are_skipped() {
                let mut img = checker_2x2();
                img.put_pixel(1, 1, Rgba([1, 2, 3, 255]));
                let palette = vec![PaletteEntry::new(0, 0, 0), PaletteEntry::new(255, 255, 255)];
                let ex = extract_layers(&img, &palette, None);
                assert_eq!(ex.skipped_unknown, 1);
                assert_eq!(ex.layers[1].count, 1);
            }

            #[test]
            fn duplicate_palette_keys_collapse() {
                let palette = vec![
                    PaletteEntry::new(0, 0, 0),
                    PaletteEntry::new(0, 0, 0),
                    PaletteEntry::new(255, 255, 255),
                ];
                let ex = extract_layers(&checker_2x2(), &palette, None);
                assert_eq!(ex.layers.len(), 2);
                assert_eq!(ex.assigned(), 4);
            }

            #[test]
            fn unused_entries_get_empty_masks() {
                let palette = vec![
                    PaletteEntry::new(0, 0, 0),
                    PaletteEntry::new(128, 128, 128),
                    PaletteEntry::new(255, 255, 255),
                ];
                let ex = extract_layers(&checker_2x2(), &palette, None);
                assert_eq!(ex.layers[1].count, 0);
                assert!(ex.layers[1].mask.as_raw().iter().all(|&v| v == 255));
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// extract_layers: every pixel is counted once or skipped
                #[test]
                fn counts_partition_the_image(
                    picks in proptest::collection::vec((0usize..4, any::<u8>()), 1..64),
                    threshold in proptest::option::of(any::<u8>()),
                ) {
                    let colors = [[0u8, 0, 0], [90, 20, 200], [180, 180, 30], [9, 9, 9]];
                    // the last color is not in the palette
                    let palette: Vec<PaletteEntry> = colors[..3].iter().copied().map(PaletteEntry::from).collect();
                    let w = picks.len() as u32;
                    let img = RgbaImage::from_fn(w, 1, |x, _| {
                        let (c, a) = picks[x as usize];
                        let [r, g, b] = colors[c];
                        Rgba([r, g, b, a])
                    });
                    let ex = extract_layers(&img, &palette, threshold);
                    prop_assert_eq!(
                        ex.assigned() + ex.skipped_transparent + ex.skipped_unknown,
                        u64::from(w)
                    );
                    for layer in &ex.layers {
                        prop_assert_eq!(crate::mask::ink_count(&layer.mask), layer.count);
                    }
                }

                /// extract_layers: z-order is ascending luminance
                #[test]
                fn sorted_by_luminance(colors in proptest::collection::vec(any::<[u8; 3]>(), 1..8)) {
                    let palette: Vec<PaletteEntry> = colors.into_iter().map(PaletteEntry::from).collect();
                    let img = RgbaImage::new(1, 1);
                    let ex = extract_layers(&img, &palette, None);
                    for pair in ex.layers.windows(2) {
                        let lum = |l: &Layer| crate::color::luminance(l.rgb[0], l.rgb[1], l.rgb[2]);
                        prop_assert!(lum(&pair[0]) <= lum(&pair[1]));
                    }
                    for (i, layer) in ex.layers.iter().enumerate() {
                        prop_assert_eq!(layer.z_index, i);
                    }
                }
            }
        }
    }

    mod layer {
        use super::*;

        #[test]
        fn coverage_is_fraction_of_total() {
            let entry = PaletteEntry::new(1, 2, 3);
            let mut layer = Layer::empty(&entry, 0, 2, 2);
            layer.claim(3);
            assert_eq!(layer.count, 1);
            assert_eq!(layer.coverage(4), 0.25);
            assert_eq!(layer.coverage(0), 0.0);
            assert_eq!(layer.mask.get_pixel(1, 1).0[0], INK);
        }

        #[test]
        fn from_mask_counts_ink_and_parses_color() {
            let mask = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
            let layer = Layer::from_mask("binary", 0, "FF8000", mask).unwrap();
            assert_eq!(layer.count, 1);
            assert_eq!(layer.color, "#ff8000");
            assert_eq!(layer.rgb, [255, 128, 0]);
            assert_eq!(layer.key(), 0xff8000);
        }

        #[test]
        fn from_mask_rejects_non_hex_color() {
            let err = Layer::from_mask("binary", 0, "black", blank_mask(1, 1)).unwrap_err();
            assert!(matches!(err, LayertraceError::InvalidColor(c) if c == "black"));
        }
    }
}
