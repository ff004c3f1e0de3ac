/// Pack an RGB triple into a single `0xRRGGBB` key.
///
/// Two colors belong to the same layer iff their keys are equal.
pub fn pack_key(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Relative luminance with BT.709 weights, used to order layers.
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b)
}

/// Format an RGB triple as `#rrggbb`.
pub fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse `#rrggbb` or `rrggbb` (either case) into an RGB triple.
pub fn parse_hex(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

/// A single color chosen by the quantizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    pub rgb: [u8; 3],
    pub luminance: f64,
    pub key: u32,
}

impl PaletteEntry {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            rgb: [r, g, b],
            luminance: luminance(r, g, b),
            key: pack_key(r, g, b),
        }
    }

    /// Display form of the entry, `#rrggbb`.
    pub fn hex(&self) -> String {
        let [r, g, b] = self.rgb;
        to_hex(r, g, b)
    }
}

impl From<[u8; 3]> for PaletteEntry {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}
