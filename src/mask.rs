use std::collections::VecDeque;

use image::{GrayImage, Luma};

use crate::raster::gray_from_raw;
use crate::{LayertraceError, LayertraceResult};

#[cfg(feature = "vectorizer-vtracer")]
use vtracer::ColorImage;

/// Mask value for a pixel that belongs to the layer.
pub const INK: u8 = 0;
/// Mask value for a pixel that the layer leaves transparent.
pub const BACKGROUND: u8 = 255;

/// 8-connected neighbour offsets as `(dx, dy)`, in search order.
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A mask of the given size with every pixel unclaimed.
pub fn blank_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
}

/// Number of ink pixels in a mask.
pub fn ink_count(mask: &GrayImage) -> u64 {
    mask.as_raw().iter().filter(|&&v| v == INK).count() as u64
}

/// Element-wise AND of two byte buffers.
///
/// Without `looping` both buffers must have the same length. With `looping`
/// the output has the length of `b` and `a` is repeated cyclically over it.
pub fn bitwise_and(a: &[u8], b: &[u8], looping: bool) -> LayertraceResult<Vec<u8>> {
    if looping {
        if a.is_empty() && !b.is_empty() {
            return Err(LayertraceError::LengthMismatch {
                expected: b.len(),
                found: 0,
            });
        }
        return Ok(b
            .iter()
            .enumerate()
            .map(|(i, &bv)| a[i % a.len()] & bv)
            .collect());
    }

    if a.len() != b.len() {
        return Err(LayertraceError::LengthMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(&av, &bv)| av & bv).collect())
}

/// AND two masks of identical dimensions into a new mask.
///
/// Ink is `0`, so the result claims every pixel claimed by either input.
pub fn and_masks(a: &GrayImage, b: &GrayImage) -> LayertraceResult<GrayImage> {
    let (w, h) = a.dimensions();
    if b.dimensions() != (w, h) {
        return Err(LayertraceError::LengthMismatch {
            expected: a.as_raw().len(),
            found: b.as_raw().len(),
        });
    }
    let raw = bitwise_and(a.as_raw(), b.as_raw(), false)?;
    gray_from_raw(w, h, raw)
}

/// Fold a set of masks into one buffer that reads `0` wherever any mask claims the pixel.
pub fn union_claimed<'a, I>(masks: I, width: u32, height: u32) -> LayertraceResult<GrayImage>
where
    I: IntoIterator<Item = &'a GrayImage>,
{
    masks
        .into_iter()
        .try_fold(blank_mask(width, height), |acc, mask| and_masks(&acc, mask))
}

/// Reusable buffers for repeated [`nearest_non_empty_with`] searches over one grid.
///
/// Each search bumps `stamp` instead of clearing `visited`, so a search costs
/// only the cells it actually reaches.
#[derive(Debug, Default)]
pub struct SearchScratch {
    visited: Vec<u32>,
    stamp: u32,
    queue: VecDeque<usize>,
}

impl SearchScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search over `size` cells.
    fn begin(&mut self, size: usize) {
        if self.visited.len() != size {
            self.visited.clear();
            self.visited.resize(size, 0);
            self.stamp = 0;
        }
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.visited.fill(0);
            self.stamp = 1;
        }
        self.queue.clear();
    }

    /// Mark `idx` for the current search, false if it was already marked.
    fn visit(&mut self, idx: usize) -> bool {
        if self.visited[idx] == self.stamp {
            false
        } else {
            self.visited[idx] = self.stamp;
            true
        }
    }
}

/// Find the closest pixel whose mask value is `0`, searching outward from `start`.
///
/// The search is a breadth-first walk over the 8-connected grid, so the first
/// hit is at the smallest Chebyshev distance. Returns `None` when no pixel in
/// bounds is claimed or when `start` lies outside the image.
pub fn nearest_non_empty(mask: &[u8], start: usize, width: u32, height: u32) -> Option<usize> {
    nearest_non_empty_with(&mut SearchScratch::new(), mask, start, width, height)
}

/// [`nearest_non_empty`] reusing the buffers of `scratch` between calls.
pub fn nearest_non_empty_with(
    scratch: &mut SearchScratch,
    mask: &[u8],
    start: usize,
    width: u32,
    height: u32,
) -> Option<usize> {
    let (w, h) = (width as usize, height as usize);
    let size = w.checked_mul(h)?;
    if start >= size || mask.len() < size {
        return None;
    }

    scratch.begin(size);
    scratch.visit(start);
    scratch.queue.push_back(start);

    while let Some(idx) = scratch.queue.pop_front() {
        if mask[idx] == INK {
            return Some(idx);
        }

        let (x, y) = ((idx % w) as i64, (idx / w) as i64);
        for (dx, dy) in NEIGHBOURS {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                continue;
            }
            let nid = ny as usize * w + nx as usize;
            if scratch.visit(nid) {
                scratch.queue.push_back(nid);
            }
        }
    }

    None
}

/// Convert a layer mask into the RGBA image the tracer consumes.
///
/// Ink becomes opaque black and background opaque white, so a binary trace
/// picks up exactly the claimed pixels.
#[cfg(feature = "vectorizer-vtracer")]
pub fn mask_to_color_image(mask: &GrayImage) -> ColorImage {
    let (w, h) = mask.dimensions();
    let (w_usize, h_usize) = (w as usize, h as usize);
    let mut rgba = vec![0u8; 4 * w_usize * h_usize];

    for (i, Luma([v])) in mask.pixels().enumerate() {
        let shade = if *v == INK { 0 } else { 255 };
        let idx = i * 4;
        rgba[idx] = shade;
        rgba[idx + 1] = shade;
        rgba[idx + 2] = shade;
        rgba[idx + 3] = 255;
    }

    ColorImage {
        pixels: rgba,
        width: w_usize,
        height: h_usize,
    }
}
