//! Fallback-chain behavior with injected stub backends: no external binaries
//! are touched, per the injected-capability design.

use std::path::Path;

use artproof::backend::ConversionBackend;
use artproof::error::{ProofError, ProofResult};
use artproof::{Toolchain, VectorRenderer};
use image::DynamicImage;

struct FailingBackend {
    name: &'static str,
    message: String,
}

impl ConversionBackend for FailingBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, _ext: &str) -> bool {
        true
    }

    fn rasterize(&self, _input: &Path, _dpi: u32) -> ProofResult<DynamicImage> {
        Err(ProofError::conversion_failed(self.message.clone()))
    }
}

struct SolidBackend;

impl ConversionBackend for SolidBackend {
    fn name(&self) -> &'static str {
        "solid"
    }

    fn supports(&self, ext: &str) -> bool {
        ext == "eps"
    }

    fn rasterize(&self, _input: &Path, _dpi: u32) -> ProofResult<DynamicImage> {
        Ok(DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            40,
            20,
            image::Rgb([0, 0, 0]),
        )))
    }
}

#[test]
fn chain_falls_through_to_the_first_success() {
    let renderer = VectorRenderer::with_backends(
        vec![
            Box::new(FailingBackend {
                name: "first",
                message: "primary died".into(),
            }),
            Box::new(SolidBackend),
        ],
        Toolchain::default(),
    );

    let img = renderer.render(Path::new("art.eps"), "eps", 300).unwrap();
    assert_eq!((img.width(), img.height()), (40, 20));
}

#[test]
fn exhausted_chain_surfaces_the_last_diagnostic_truncated() {
    let long_tail = "x".repeat(600);
    let renderer = VectorRenderer::with_backends(
        vec![
            Box::new(FailingBackend {
                name: "first",
                message: "first failure".into(),
            }),
            Box::new(FailingBackend {
                name: "second",
                message: format!("ghostscript barfed: {long_tail}"),
            }),
        ],
        Toolchain::default(),
    );

    let err = renderer
        .render(Path::new("art.eps"), "eps", 300)
        .unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("ghostscript barfed"), "msg = {msg}");
    assert!(!msg.contains("first failure"));
    // Raw tool output is bounded, not passed through whole.
    assert!(msg.len() < 400, "diagnostic not truncated: {} bytes", msg.len());
}

#[test]
fn no_eligible_backend_is_an_actionable_failure() {
    let renderer = VectorRenderer::with_backends(vec![], Toolchain::default());
    let err = renderer
        .render(Path::new("art.eps"), "eps", 300)
        .unwrap_err();
    assert!(matches!(err, ProofError::ConversionFailed(_)));
    assert!(err.to_string().contains("install"));
}

#[test]
fn empty_toolchain_cannot_render_postscript() {
    // Default (all-false) toolchain leaves only the in-process SVG backend,
    // which does not claim `.eps`.
    let renderer = VectorRenderer::new(Toolchain::default());
    let err = renderer
        .render(Path::new("art.eps"), "eps", 300)
        .unwrap_err();
    assert!(matches!(err, ProofError::ConversionFailed(_)));
}
