use std::fs;
use std::path::{Path, PathBuf};

use layertrace::{
    ComposeOptions, LayerSet, LayertraceResult, TraceOptions, UsvgOptimizer, VtracerVectorizer,
};

use crate::cli::{OutputArgs, TraceOptionsArgs};

/// Trace the layers, then write the SVG and any requested exports.
pub fn write_outputs(
    layers: &LayerSet,
    output: &OutputArgs,
    trace_args: &TraceOptionsArgs,
) -> LayertraceResult<()> {
    if layers.is_empty() {
        eprintln!("Warning: no layers left to trace; the SVG will be empty.");
    }

    let options = TraceOptions::from(trace_args);
    let compose = ComposeOptions::from(trace_args);
    let mut vectorized = layers.trace(&VtracerVectorizer, &options, &compose)?;
    if output.optimize {
        vectorized = vectorized.optimize(&UsvgOptimizer::from(output))?;
    }

    let svg_path = output
        .output
        .clone()
        .unwrap_or_else(|| derive_svg_path(&output.input));
    vectorized.save(&svg_path)?;
    println!(
        "SVG with {} layer(s) saved to {}",
        layers.len(),
        svg_path.display()
    );

    if let Some(preview) = &output.export_preview {
        let path = preview
            .clone()
            .unwrap_or_else(|| derive_variant_path(&output.input, "preview", "png"));
        fs::write(&path, vectorized.preprocessed_png()?)?;
        println!("Preview PNG saved to {}", path.display());
    }

    if let Some(dir) = &output.export_layers {
        let written = layers.save_layers(dir)?;
        println!("{} layer PNG(s) saved to {}", written.len(), dir.display());
    }

    Ok(())
}

/// Derive a variant file path by appending a suffix before the extension.
pub fn derive_variant_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let mut derived = input.to_path_buf();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| suffix.to_string());
    let filename = format!("{}-{}.{}", stem, suffix, extension);
    derived.set_file_name(filename);
    derived
}

/// Derive an SVG file path by changing the extension to "svg".
pub fn derive_svg_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("svg");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_path_replaces_extension() {
        assert_eq!(derive_svg_path(Path::new("a/photo.png")), PathBuf::from("a/photo.svg"));
    }

    #[test]
    fn variant_path_keeps_directory() {
        assert_eq!(
            derive_variant_path(Path::new("a/photo.jpg"), "preview", "png"),
            PathBuf::from("a/photo-preview.png")
        );
    }
}
