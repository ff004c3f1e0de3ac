use layertrace::LayertraceError;

pub fn report_error(err: &LayertraceError) {
    match err {
        LayertraceError::Decode(source) => {
            eprintln!("Could not read the input image: {source}");
            eprintln!();
            eprintln!("Supported inputs are the raster formats enabled in the `image` crate (PNG, JPEG, GIF, WebP, ...).");
        }
        LayertraceError::EmptyPalette => {
            eprintln!("{err}");
            eprintln!();
            eprintln!("The image has no visible pixels to build a palette from.");
            eprintln!("  - Check that the image is not fully transparent");
            eprintln!("  - Or pass --colors with a value of at least 1");
        }
        LayertraceError::Trace { layer, .. } => {
            eprintln!("{err}");
            eprintln!();
            eprintln!("Export the masks with --export-layers to inspect `{layer}`.");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}
