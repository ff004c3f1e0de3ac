use thiserror::Error;

/// Result type alias for operations that may fail with [`LayertraceError`].
pub type LayertraceResult<T> = std::result::Result<T, LayertraceError>;

/// Error types that can occur while layering and tracing an image.
///
/// Decoding and palette failures are fatal for the whole image, tracing
/// failures carry the id of the layer that was rejected.
#[derive(Debug, Error)]
pub enum LayertraceError {
    /// Input bytes could not be decoded as an image.
    #[error("Image decoding failed: {0}")]
    Decode(#[source] image::ImageError),
    /// Image filtering or encoding error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A raw buffer does not hold `width * height * channels` bytes.
    #[error(
        "Buffer of {found} bytes does not match a {width}x{height} image with {channels} channel(s)"
    )]
    DimensionMismatch {
        width: u32,
        height: u32,
        channels: u8,
        found: usize,
    },
    /// Two mask buffers that must be combined element-wise differ in length.
    #[error("Mask length {found} does not match expected length {expected}")]
    LengthMismatch { expected: usize, found: usize },
    /// The tracer rejected the mask of a single layer.
    #[error("Tracing layer `{layer}` failed: {message}")]
    Trace { layer: String, message: String },
    /// A caller-supplied color is not `#rrggbb` hex.
    #[error("Invalid color `{0}`, expected #rrggbb")]
    InvalidColor(String),
    /// The quantizer produced no colors for the image.
    #[error("Quantizer returned an empty palette")]
    EmptyPalette,
    /// The SVG optimizer rejected the assembled document.
    #[error("SVG optimization failed: {0}")]
    Optimize(String),
}

impl LayertraceError {
    /// A tracer failure not yet attributed to a layer.
    pub fn trace(message: impl Into<String>) -> Self {
        Self::Trace {
            layer: String::new(),
            message: message.into(),
        }
    }

    /// Attribute a tracer failure to `layer`. Other variants pass through.
    pub fn in_layer(self, layer: &str) -> Self {
        match self {
            Self::Trace { message, .. } => Self::Trace {
                layer: layer.to_string(),
                message,
            },
            other => other,
        }
    }
}
