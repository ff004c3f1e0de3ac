use crate::LayertraceResult;
use crate::layer::Layer;
use crate::mask::{and_masks, blank_mask};

/// Stack masks so every layer also claims all pixels of the layers below it.
///
/// Layers are processed in ascending z-index. A running canvas accumulates
/// claimed pixels and each layer receives its own copy of the canvas after
/// its mask has been folded in, so layer 0 is unchanged and every later mask
/// is a superset of all earlier ones. Counts are not touched.
pub fn stack_layers(mut layers: Vec<Layer>) -> LayertraceResult<Vec<Layer>> {
    let Some(first) = layers.first() else {
        return Ok(layers);
    };
    let (w, h) = first.mask.dimensions();
    layers.sort_by_key(|l| l.z_index);

    let mut stacked = Vec::with_capacity(layers.len());
    let mut canvas = blank_mask(w, h);
    for layer in layers {
        canvas = and_masks(&canvas, &layer.mask)?;
        stacked.push(Layer {
            mask: canvas.clone(),
            ..layer
        });
    }

    tracing::trace!(layers = stacked.len(), "Stacked layer masks");
    Ok(stacked)
}

/// Drop layers whose own coverage of `total` pixels is below `min_percent`.
///
/// Coverage comes from each layer's count, never from its (possibly stacked) mask.
pub fn retain_min_coverage(layers: Vec<Layer>, min_percent: f64, total: u64) -> Vec<Layer> {
    let before = layers.len();
    let kept: Vec<Layer> = layers
        .into_iter()
        .filter(|layer| layer.coverage(total) >= min_percent)
        .collect();
    if kept.len() < before {
        tracing::debug!(
            dropped = before - kept.len(),
            min_percent,
            "Dropped layers below minimum coverage"
        );
    }
    kept
}
