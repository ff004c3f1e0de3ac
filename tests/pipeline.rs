use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use layertrace::{
    BinaryOptions, DenoiseOptions, Layertrace, LayertraceError, QuantizeOptions,
    binary_preprocess, quantize_denoise_preprocess, quantize_preprocess,
};

fn png(img: RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Left column black, right column white.
fn black_white_columns() -> Vec<u8> {
    png(RgbaImage::from_fn(2, 2, |x, _| {
        if x == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    }))
}

/// A dark square on a light field, large enough to survive speckle filtering.
fn square_on_field() -> Vec<u8> {
    png(RgbaImage::from_fn(32, 32, |x, y| {
        if (8..24).contains(&x) && (8..24).contains(&y) {
            Rgba([20, 30, 40, 255])
        } else {
            Rgba([230, 220, 210, 255])
        }
    }))
}

#[test]
fn black_and_white_example_end_to_end() {
    let set = quantize_preprocess(&black_white_columns(), &QuantizeOptions::default()).unwrap();

    assert_eq!(set.metadata.width, 2);
    assert_eq!(set.metadata.height, 2);
    assert_eq!(set.metadata.format.as_deref(), Some("image/png"));
    assert_eq!(set.len(), 2);

    let black = &set.layers[0];
    assert_eq!((black.z_index, black.color.as_str()), (0, "#000000"));
    assert_eq!(black.mask.as_raw(), &vec![0, 255, 0, 255]);

    let white = &set.layers[1];
    assert_eq!((white.z_index, white.color.as_str()), (1, "#ffffff"));
    assert_eq!(white.mask.as_raw(), &vec![255, 0, 255, 0]);
}

#[test]
fn binary_mode_has_one_layer() {
    let set = binary_preprocess(&black_white_columns(), &BinaryOptions::default()).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.layers[0].id, "binary");
    assert_eq!(set.layers[0].count, 2);
}

#[test]
fn denoise_mode_stacks_by_default() {
    let set = quantize_denoise_preprocess(&black_white_columns(), &DenoiseOptions::default()).unwrap();
    assert_eq!(set.layers[1].mask.as_raw(), &vec![0, 0, 0, 0]);
}

#[test]
fn handle_reuses_one_decode_for_every_mode() {
    let session = Layertrace::new().for_bytes(&square_on_field()).unwrap();
    assert_eq!(session.image().dimensions(), (32, 32));

    let binary = session.binary(&BinaryOptions::default()).unwrap();
    let quantized = session.quantize(None).unwrap();
    let denoised = session
        .quantize_denoised(&DenoiseOptions::default().with_median_radius(Some(1)))
        .unwrap();

    assert_eq!(binary.layers[0].count, 16 * 16);
    assert_eq!(quantized.len(), 2);
    assert_eq!(denoised.len(), 2);
}

#[test]
fn raw_rgba_buffer_skips_decoding() {
    let raw: Vec<u8> = [[0, 0, 0, 255], [255, 255, 255, 255]].concat();
    let session = Layertrace::new().for_rgba(2, 1, raw).unwrap();
    assert_eq!(session.metadata().format, None);

    let set = session.quantize(None).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.layers[0].mask.as_raw(), &vec![0, 255]);
}

#[test]
fn short_rgba_buffer_is_rejected() {
    let err = Layertrace::new().for_rgba(2, 2, vec![0; 15]).unwrap_err();
    assert!(matches!(
        err,
        LayertraceError::DimensionMismatch {
            width: 2,
            height: 2,
            channels: 4,
            found: 15
        }
    ));
}

#[test]
fn every_pixel_is_accounted_for() {
    let set = quantize_preprocess(&square_on_field(), &QuantizeOptions::default()).unwrap();
    let total: u64 = set.layers.iter().map(|l| l.count).sum();
    assert_eq!(total, 32 * 32);
}

#[test]
fn layer_pngs_decode_back_to_masks() {
    let set = quantize_preprocess(&black_white_columns(), &QuantizeOptions::default()).unwrap();
    for ((id, bytes), layer) in set.layer_pngs().unwrap().into_iter().zip(&set.layers) {
        assert_eq!(id, layer.id);
        let decoded = image::load_from_memory(&bytes).unwrap().to_luma8();
        assert_eq!(&decoded, &layer.mask);
    }
}

#[test]
fn save_layers_writes_one_file_per_layer() {
    let dir = tempfile::tempdir().unwrap();
    let set = quantize_preprocess(&square_on_field(), &QuantizeOptions::default()).unwrap();
    let written = set.save_layers(dir.path().join("layers")).unwrap();
    assert_eq!(written.len(), set.len());
    for path in written {
        assert!(path.exists());
    }
}

#[test]
fn undecodable_input_fails() {
    let err = quantize_preprocess(b"not an image", &QuantizeOptions::default()).unwrap_err();
    assert!(matches!(err, LayertraceError::Decode(_)));
}

#[cfg(feature = "vectorizer-vtracer")]
mod traced {
    use super::*;
    use layertrace::{ComposeOptions, PaintOrder, TraceOptions, VtracerVectorizer};

    #[test]
    fn stacked_square_traces_to_layered_svg() {
        let opts = QuantizeOptions::default().with_stack(true);
        let set = quantize_preprocess(&square_on_field(), &opts).unwrap();
        let out = set
            .trace(&VtracerVectorizer, &TraceOptions::default(), &ComposeOptions::default())
            .unwrap();

        assert!(out.svg.starts_with("<svg width=\"32\" height=\"32\" viewBox=\"0 0 32 32\""));
        assert!(out.svg.ends_with("</svg>"));
        let dark = out.svg.find("fill=\"#141e28\"").unwrap();
        let light = out.svg.find("fill=\"#e6dcd2\"").unwrap();
        // lightest first: the light background path is painted before the square
        assert!(light < dark);
    }

    #[test]
    fn darkest_first_paints_square_first() {
        let set = quantize_preprocess(&square_on_field(), &QuantizeOptions::default()).unwrap();
        let compose = ComposeOptions::default().with_paint_order(PaintOrder::DarkestFirst);
        let out = set
            .trace(&VtracerVectorizer, &TraceOptions::default(), &compose)
            .unwrap();
        assert!(out.svg.find("#141e28").unwrap() < out.svg.find("#e6dcd2").unwrap());
    }

    #[cfg(feature = "optimizer-usvg")]
    #[test]
    fn optimized_svg_is_still_svg() {
        let set = binary_preprocess(&square_on_field(), &BinaryOptions::default()).unwrap();
        let out = set
            .trace(&VtracerVectorizer, &TraceOptions::default(), &ComposeOptions::default())
            .unwrap()
            .optimize(&layertrace::UsvgOptimizer::default())
            .unwrap();
        assert!(out.svg.contains("<svg"));
        assert!(out.svg.contains("<path"));
    }
}
