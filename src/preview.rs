//! The one-shot preview pipeline.
//!
//! Per request: `Received → Dispatched → Rendering → (Extracting, vector
//! only) → PostProcessing → Done | Failed`. The stages run as straight-line
//! control flow under tracing spans; the only internal retry is the
//! PostScript white-background attempt inside rendering. No partial result
//! is ever returned.

use std::path::Path;

use image::DynamicImage;

use crate::dispatch::{self, FileKind};
use crate::error::ProofResult;
use crate::post::{self, BackgroundMode, PhysicalSize, Watermark};
use crate::render_embroidery::{EmbroideryRenderer, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::render_vector::{VectorRenderer, DEFAULT_DPI};
use crate::sampled::{dominant_colors, SampledColor};
use crate::stitch::{self, StitchStats};
use crate::swatch::{ColorSet, SwatchExtractor};
use crate::toolchain::Toolchain;

/// How many sampled colors the fallback path reports.
const SAMPLED_COLOR_COUNT: usize = 6;

/// Request-level knobs with production defaults.
#[derive(Clone, Copy, Debug)]
pub struct PreviewOptions {
    pub background: BackgroundMode,
    pub dpi: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub embroidery_canvas: (u32, u32),
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            background: BackgroundMode::Auto,
            dpi: DEFAULT_DPI,
            max_width: post::PREVIEW_MAX_WIDTH,
            max_height: post::PREVIEW_MAX_HEIGHT,
            embroidery_canvas: (DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
        }
    }
}

/// The terminal artifact of a successful request.
///
/// `file_type` determines which optional fields are populated: embroidery
/// results never carry color data, vector results never carry stitch
/// statistics.
#[derive(Debug, serde::Serialize)]
pub struct PreviewResult {
    pub file_type: FileKind,
    pub width: u32,
    pub height: u32,
    /// Mean brightness measured before background compositing, 0–255.
    pub brightness: f64,
    /// Background actually applied (auto already resolved).
    pub background: BackgroundMode,
    pub size_kb: f64,
    pub physical_size: Option<PhysicalSize>,
    pub vector_colors: Option<ColorSet>,
    pub sampled_colors: Option<Vec<SampledColor>>,
    pub stitches: Option<StitchStats>,
    pub pdf_size_kb: Option<f64>,
    /// Final preview, PNG-encoded.
    #[serde(skip)]
    pub png: Vec<u8>,
    /// Companion scalable PDF, when the source format allows one.
    #[serde(skip)]
    pub pdf: Option<Vec<u8>>,
}

/// The assembled pipeline. Construct once (font discovery and backend
/// wiring) and reuse across requests.
pub struct PreviewPipeline {
    renderer: VectorRenderer,
    extractor: SwatchExtractor,
    watermark: Watermark,
    options: PreviewOptions,
}

impl PreviewPipeline {
    pub fn new(tools: Toolchain, options: PreviewOptions) -> Self {
        Self {
            renderer: VectorRenderer::new(tools),
            extractor: SwatchExtractor::new(tools),
            watermark: Watermark::discover(),
            options,
        }
    }

    /// Generate a preview for one uploaded file.
    #[tracing::instrument(skip(self, path), fields(file = %path.display()))]
    pub fn generate(&self, path: &Path) -> ProofResult<PreviewResult> {
        let ext = dispatch::extension(path).unwrap_or_default();
        match dispatch::classify(path)? {
            FileKind::Vector => self.vector_preview(path, &ext),
            FileKind::Embroidery => self.embroidery_preview(path),
        }
    }

    fn vector_preview(&self, path: &Path, ext: &str) -> ProofResult<PreviewResult> {
        // Colors come from the original source bytes, before rasterization;
        // extraction failures degrade, never abort.
        let span = tracing::info_span!("extract").entered();
        let vector_colors = match self.extractor.extract_from_file(path, ext) {
            Ok(colors) => colors,
            Err(err) => {
                tracing::warn!(%err, "color extraction failed, continuing without");
                None
            }
        };
        drop(span);

        let raster = {
            let _span = tracing::info_span!("render").entered();
            self.renderer.render(path, ext, self.options.dpi)?
        };

        // Sampled approximation only when the byte scan found nothing.
        let sampled_colors = if vector_colors.is_none() {
            let colors = dominant_colors(&raster, SAMPLED_COLOR_COUNT);
            (!colors.is_empty()).then_some(colors)
        } else {
            None
        };

        let pdf = self.renderer.scalable_companion(path, ext)?;

        let _span = tracing::info_span!("post_process").entered();
        // Brightness is measured twice: once on the full-resolution raster,
        // and again after the fit (the post-resize value drives the
        // auto-background choice and is the one reported).
        tracing::debug!(
            brightness = post::brightness(&raster),
            "pre-resize brightness"
        );
        let resized = post::resize_to_fit(raster, self.options.max_width, self.options.max_height);
        let (png, width, height, brightness, background) = self.finish(resized)?;

        Ok(PreviewResult {
            file_type: FileKind::Vector,
            width,
            height,
            brightness,
            background,
            size_kb: kb(png.len()),
            physical_size: Some(post::physical_size(width, height, self.options.dpi)),
            vector_colors,
            sampled_colors,
            stitches: None,
            pdf_size_kb: pdf.as_ref().map(|b| kb(b.len())),
            png,
            pdf,
        })
    }

    fn embroidery_preview(&self, path: &Path) -> ProofResult<PreviewResult> {
        let pattern = {
            let _span = tracing::info_span!("parse_stitches").entered();
            stitch::read_pattern(path)?
        };
        let stats = pattern.stats();

        let (canvas_w, canvas_h) = self.options.embroidery_canvas;
        let raster = {
            let _span = tracing::info_span!("render").entered();
            EmbroideryRenderer::new(canvas_w, canvas_h).render(&pattern)?
        };

        // The embroidery canvas is pre-sized; no resize step.
        let _span = tracing::info_span!("post_process").entered();
        let (png, width, height, brightness, background) =
            self.finish(DynamicImage::ImageRgba8(raster))?;

        Ok(PreviewResult {
            file_type: FileKind::Embroidery,
            width,
            height,
            brightness,
            background,
            size_kb: kb(png.len()),
            physical_size: None,
            vector_colors: None,
            sampled_colors: None,
            stitches: Some(stats),
            pdf_size_kb: None,
            png,
            pdf: None,
        })
    }

    /// Shared tail: brightness → background → watermark → PNG.
    fn finish(&self, img: DynamicImage) -> ProofResult<(Vec<u8>, u32, u32, f64, BackgroundMode)> {
        let brightness = post::brightness(&img);
        let background = self.options.background.resolve(brightness);
        let composited = post::composite_background(img, background);

        let mut rgba = composited.into_rgba8();
        self.watermark.stamp(&mut rgba);
        let (width, height) = rgba.dimensions();

        let final_img = if background == BackgroundMode::Transparent {
            DynamicImage::ImageRgba8(rgba)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).into_rgb8())
        };
        let png = post::encode_png(&final_img)?;

        let round1 = |v: f64| (v * 10.0).round() / 10.0;
        Ok((png, width, height, round1(brightness), background))
    }
}

fn kb(len: usize) -> f64 {
    (len as f64 / 1024.0 * 100.0).round() / 100.0
}

impl PreviewResult {
    /// True when the companion PDF is absent because the source is
    /// raster-native or no capable converter was present.
    pub fn pdf_unavailable(&self) -> bool {
        self.pdf.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_fails_before_any_io() {
        let pipeline = PreviewPipeline::new(Toolchain::default(), PreviewOptions::default());
        let err = pipeline
            .generate(Path::new("/nonexistent/file.indd"))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProofError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn default_options_match_production_constants() {
        let opts = PreviewOptions::default();
        assert_eq!(opts.dpi, 300);
        assert_eq!((opts.max_width, opts.max_height), (1200, 1200));
        assert_eq!(opts.embroidery_canvas, (1200, 800));
        assert_eq!(opts.background, BackgroundMode::Auto);
    }
}
