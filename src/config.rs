/// Filters applied to the decoded image before palette quantization.
///
/// Every field is optional; `None` leaves the image untouched by that filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageFilters {
    /// Brightness multiplier (1.0 = unchanged).
    pub brightness: Option<f32>,
    /// Gaussian blur sigma in pixels.
    pub blur: Option<f32>,
    /// Contrast adjustment in percent, negative values reduce contrast.
    pub contrast: Option<f32>,
}

impl ImageFilters {
    pub fn with_brightness(mut self, brightness: f32) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_blur(mut self, sigma: f32) -> Self {
        self.blur = Some(sigma);
        self
    }

    pub fn with_contrast(mut self, contrast: f32) -> Self {
        self.contrast = Some(contrast);
        self
    }

    /// True when no filter would change the image.
    pub fn is_identity(&self) -> bool {
        self.brightness.is_none() && self.blur.is_none() && self.contrast.is_none()
    }
}

/// Options for the single-layer threshold mode.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOptions {
    /// Inclusive gray range treated as background; everything else becomes ink.
    pub threshold: (u8, u8),
    /// Fill color of the single layer.
    pub color: String,
}

impl Default for BinaryOptions {
    fn default() -> Self {
        Self {
            threshold: (128, 255),
            color: "#000000".to_string(),
        }
    }
}

impl BinaryOptions {
    pub fn with_threshold(mut self, low: u8, high: u8) -> Self {
        self.threshold = (low, high);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Options for the palette quantization mode.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeOptions {
    /// Number of palette colors requested from the quantizer.
    pub color_count: usize,
    /// Layers whose own coverage is below this fraction (0.0-1.0) are dropped.
    pub min_percent: f64,
    /// Stack masks so each layer also covers every darker layer.
    pub stack: bool,
    /// Pixels with alpha below this value are left out of every layer.
    pub alpha_threshold: Option<u8>,
    /// Filters applied before quantization.
    pub filters: ImageFilters,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            color_count: 8,
            min_percent: 0.0,
            stack: false,
            alpha_threshold: None,
            filters: ImageFilters::default(),
        }
    }
}

impl QuantizeOptions {
    pub fn with_color_count(mut self, color_count: usize) -> Self {
        self.color_count = color_count;
        self
    }

    pub fn with_min_percent(mut self, min_percent: f64) -> Self {
        self.min_percent = min_percent;
        self
    }

    pub fn with_stack(mut self, stack: bool) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_alpha_threshold(mut self, alpha_threshold: Option<u8>) -> Self {
        self.alpha_threshold = alpha_threshold;
        self
    }

    pub fn with_filters(mut self, filters: ImageFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Options for quantization followed by per-mask denoising and infill.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiseOptions {
    pub quantize: QuantizeOptions,
    /// Median filter radius; `None` skips filtering but still runs infill.
    pub median_radius: Option<u32>,
}

impl Default for DenoiseOptions {
    fn default() -> Self {
        Self {
            quantize: QuantizeOptions::default().with_stack(true),
            median_radius: None,
        }
    }
}

impl DenoiseOptions {
    pub fn with_quantize(mut self, quantize: QuantizeOptions) -> Self {
        self.quantize = quantize;
        self
    }

    pub fn with_median_radius(mut self, radius: Option<u32>) -> Self {
        self.median_radius = radius;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_defaults() {
        let opts = QuantizeOptions::default();
        assert_eq!(opts.color_count, 8);
        assert_eq!(opts.min_percent, 0.0);
        assert!(!opts.stack);
        assert!(opts.alpha_threshold.is_none());
        assert!(opts.filters.is_identity());
    }

    #[test]
    fn denoise_defaults_stack() {
        let opts = DenoiseOptions::default();
        assert!(opts.quantize.stack);
        assert!(opts.median_radius.is_none());
    }

    #[test]
    fn binary_defaults() {
        let opts = BinaryOptions::default();
        assert_eq!(opts.threshold, (128, 255));
        assert_eq!(opts.color, "#000000");
    }

    #[test]
    fn builders_set_fields() {
        let filters = ImageFilters::default().with_blur(1.5).with_brightness(1.2);
        assert!(!filters.is_identity());
        let opts = QuantizeOptions::default()
            .with_color_count(4)
            .with_min_percent(0.1)
            .with_alpha_threshold(Some(128))
            .with_filters(filters.clone());
        assert_eq!(opts.color_count, 4);
        assert_eq!(opts.alpha_threshold, Some(128));
        assert_eq!(opts.filters, filters);
    }
}
