//! In-process SVG rasterizer built on usvg/resvg.
//!
//! This is the library-based sibling of the external converters: always
//! available, claims only `.svg`, and keeps the background transparent for
//! the post-processor to composite later.

use std::path::Path;

use anyhow::Context as _;
use image::{DynamicImage, RgbaImage};

use crate::backend::ConversionBackend;
use crate::error::{ProofError, ProofResult};

/// SVG user units are 1/96 in, so this is the scale at 96 dpi.
const SVG_REFERENCE_DPI: f64 = 96.0;

/// Guard against pathological pixmap allocations from absurd DPI or
/// oversized documents.
const MAX_DIM: u32 = 16_384;

pub struct SvgBackend;

impl ConversionBackend for SvgBackend {
    fn name(&self) -> &'static str {
        "resvg"
    }

    fn supports(&self, ext: &str) -> bool {
        ext == "svg"
    }

    fn rasterize(&self, input: &Path, dpi: u32) -> ProofResult<DynamicImage> {
        let bytes = std::fs::read(input)
            .with_context(|| format!("read svg '{}'", input.display()))?;
        rasterize_bytes(&bytes, dpi)
    }
}

pub fn rasterize_bytes(bytes: &[u8], dpi: u32) -> ProofResult<DynamicImage> {
    let mut opts = usvg::Options::default();
    opts.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let scale = f64::from(dpi) / SVG_REFERENCE_DPI;
    let size = tree.size();
    let (width, height) = scaled_px(size.width(), size.height(), scale)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ProofError::conversion_failed("failed to allocate svg pixmap"))?;

    let sx = width as f32 / size.width();
    let sy = height as f32 / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    // resvg writes premultiplied RGBA; the pipeline works in straight alpha.
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for px in pixmap.pixels() {
        let straight = px.demultiply();
        data.extend_from_slice(&[straight.red(), straight.green(), straight.blue(), straight.alpha()]);
    }
    let img = RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| ProofError::conversion_failed("svg pixmap size mismatch (unexpected)"))?;
    Ok(DynamicImage::ImageRgba8(img))
}

fn scaled_px(w: f32, h: f32, scale: f64) -> ProofResult<(u32, u32)> {
    fn to_px(v: f32, scale: f64) -> ProofResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ProofError::conversion_failed("svg has invalid width/height"));
        }
        Ok(((f64::from(v) * scale).ceil() as u32).max(1))
    }

    let width = to_px(w, scale)?;
    let height = to_px(h, scale)?;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(ProofError::conversion_failed(format!(
            "svg raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((width, height))
}
