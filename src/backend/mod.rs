//! Converter backends for vector artwork.
//!
//! Each backend is a capability descriptor plus an invocation contract: given
//! a source path and a DPI it produces a raster image or fails. Multiple
//! backends may claim the same extension; the vector renderer tries them in
//! the fixed priority order returned by [`default_backends`].

pub mod ghostscript;
pub mod inkscape;
pub mod magick;
pub mod process;
pub mod svg;

use std::path::Path;

use anyhow::Context as _;
use image::DynamicImage;

use crate::error::{ProofError, ProofResult};
use crate::toolchain::Toolchain;

pub use inkscape::InkscapeBackend;
pub use magick::MagickBackend;
pub use svg::SvgBackend;

pub trait ConversionBackend {
    fn name(&self) -> &'static str;

    /// Whether this backend accepts the (lowercased) extension.
    fn supports(&self, ext: &str) -> bool;

    /// Rasterize `input` at `dpi`. External backends write a scoped temp file
    /// and decode it; the in-process backend returns pixels directly.
    fn rasterize(&self, input: &Path, dpi: u32) -> ProofResult<DynamicImage>;
}

/// The fixed priority order: Inkscape, then ImageMagick, then the in-process
/// SVG rasterizer as a last resort for `.svg`. Unavailable binaries are never
/// instantiated, so they are never invoked.
pub fn default_backends(tools: Toolchain) -> Vec<Box<dyn ConversionBackend>> {
    let mut backends: Vec<Box<dyn ConversionBackend>> = Vec::new();
    if tools.inkscape {
        backends.push(Box::new(InkscapeBackend));
    }
    if tools.imagemagick {
        backends.push(Box::new(MagickBackend));
    }
    backends.push(Box::new(SvgBackend));
    backends
}

/// Validate and decode a raster file a converter claims to have written.
///
/// Converters sometimes exit zero while writing nothing, or a zero-byte file;
/// both count as failure so the fallback chain can proceed.
pub(crate) fn load_nonempty_raster(path: &Path, backend: &str) -> ProofResult<DynamicImage> {
    let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if len == 0 {
        return Err(ProofError::conversion_failed(format!(
            "{backend} produced an empty output file"
        )));
    }
    let img = image::open(path).with_context(|| format!("decode {backend} output"))?;
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toolchain_still_offers_the_svg_backend() {
        let backends = default_backends(Toolchain::default());
        assert_eq!(backends.len(), 1);
        assert!(backends[0].supports("svg"));
        assert!(!backends[0].supports("eps"));
    }

    #[test]
    fn full_toolchain_orders_externals_first() {
        let tools = Toolchain {
            inkscape: true,
            imagemagick: true,
            ghostscript: true,
        };
        let names: Vec<_> = default_backends(tools).iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["inkscape", "imagemagick", "resvg"]);
    }
}
