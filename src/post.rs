//! Post-processing: resize, background compositing, watermark stamping, PNG
//! serialization, physical-size math.
//!
//! Step order is fixed: brightness is measured on the source content before
//! any background is composited, so a transparent canvas never biases the
//! auto-background choice.

use ab_glyph::{FontVec, PxScale};
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::ProofResult;

/// Vector previews are bounded to this box; embroidery canvases are
/// pre-sized and skip the resize step.
pub const PREVIEW_MAX_WIDTH: u32 = 1200;
pub const PREVIEW_MAX_HEIGHT: u32 = 1200;

/// Brightness above this picks the dark ground in auto mode; exactly at the
/// threshold picks light.
pub const AUTO_DARK_THRESHOLD: f64 = 200.0;

const LIGHT_GROUND: [u8; 3] = [240, 240, 240];
const DARK_GROUND: [u8; 3] = [45, 45, 48];

const WATERMARK_LABEL: &str = "ArtProof";
const WATERMARK_SHORT: &str = "AP";
/// Below this edge length the full label stops being legible.
const WATERMARK_SHORT_EDGE: u32 = 200;

/// Background treatment for the final preview.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    #[default]
    Auto,
    Light,
    Dark,
    Transparent,
}

impl BackgroundMode {
    /// Resolve `Auto` against a measured brightness. Bright, near-white
    /// artwork gets the dark canvas so it stands out, and vice versa.
    pub fn resolve(self, brightness: f64) -> BackgroundMode {
        match self {
            BackgroundMode::Auto => {
                if brightness > AUTO_DARK_THRESHOLD {
                    BackgroundMode::Dark
                } else {
                    BackgroundMode::Light
                }
            }
            other => other,
        }
    }
}

/// Mean of the grayscale-converted pixels, 0–255.
pub fn brightness(img: &DynamicImage) -> f64 {
    let gray = img.to_luma8();
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
    sum as f64 / pixels.len() as f64
}

/// Downscale (never upscale) so both dimensions fit `max_w` × `max_h`,
/// preserving aspect ratio.
pub fn resize_to_fit(img: DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    if img.width() <= max_w && img.height() <= max_h {
        return img;
    }
    img.resize(max_w, max_h, FilterType::Lanczos3)
}

/// Composite the image over the resolved background.
///
/// Call with an already-resolved mode (never `Auto`). `Transparent` keeps the
/// alpha channel; the solid modes paste the image over the fixed ground using
/// its own alpha as the mask.
pub fn composite_background(img: DynamicImage, mode: BackgroundMode) -> DynamicImage {
    let ground = match mode {
        BackgroundMode::Transparent => {
            return DynamicImage::ImageRgba8(img.into_rgba8());
        }
        BackgroundMode::Dark => DARK_GROUND,
        // Auto is resolved by the caller; treat a stray Auto as light.
        BackgroundMode::Light | BackgroundMode::Auto => LIGHT_GROUND,
    };

    let rgba = img.into_rgba8();
    let (w, h) = rgba.dimensions();
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba([ground[0], ground[1], ground[2], 255]));
    image::imageops::overlay(&mut canvas, &rgba, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).into_rgb8())
}

/// Watermark stamper with a lazily discovered system font.
///
/// Discovery is a one-time cost; keep the stamper alive across requests.
pub struct Watermark {
    font: Option<FontVec>,
}

impl Watermark {
    /// Locate a sans-serif system face. Hosts without any usable face still
    /// get the backing rectangle, so previews remain marked.
    pub fn discover() -> Self {
        let font = system_sans_font();
        if font.is_none() {
            tracing::warn!("no system sans-serif font found; watermark text will be omitted");
        }
        Self { font }
    }

    /// Stamper that never draws text, for deterministic tests.
    pub fn disabled() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Label variant for an image size: very small previews get the short
    /// abbreviation so the mark stays legible.
    pub fn label(width: u32, height: u32) -> &'static str {
        if width < WATERMARK_SHORT_EDGE || height < WATERMARK_SHORT_EDGE {
            WATERMARK_SHORT
        } else {
            WATERMARK_LABEL
        }
    }

    /// Stamp the bottom-right corner over a semi-transparent rounded backing.
    pub fn stamp(&self, img: &mut RgbaImage) {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        // Size scales with image width, clamped to keep the mark subtle.
        let font_size = (f64::from(width) * 0.012).clamp(8.0, 16.0) as f32;
        let label = Self::label(width, height);

        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(PxScale::from(font_size), font, label),
            // Fontless degrade: estimated advance keeps the backing plausible.
            None => ((label.len() as f32 * font_size * 0.6) as u32, font_size as u32),
        };

        let padding = ((font_size * 0.25) as u32).max(2);
        let margin = (width / 100).max(3);

        let box_w = text_w + 2 * padding;
        let box_h = text_h + 2 * padding;
        if box_w + margin > width || box_h + margin > height {
            return;
        }

        let x0 = width - box_w - margin;
        let y0 = height - box_h - margin;

        let mut overlay = RgbaImage::from_pixel(box_w, box_h, Rgba([0, 0, 0, 0]));
        rounded_backing(&mut overlay, Rgba([255, 255, 255, 140]));
        if let Some(font) = &self.font {
            draw_text_mut(
                &mut overlay,
                Rgba([120, 120, 120, 255]),
                padding as i32,
                padding as i32,
                PxScale::from(font_size),
                font,
                label,
            );
        }
        image::imageops::overlay(img, &overlay, i64::from(x0), i64::from(y0));
    }
}

/// Fill the whole overlay as a rounded rectangle: center cross of rects plus
/// quarter-circle corners.
fn rounded_backing(overlay: &mut RgbaImage, color: Rgba<u8>) {
    let (w, h) = overlay.dimensions();
    let radius = 3i32.min(w as i32 / 2).min(h as i32 / 2);
    if w as i32 <= 2 * radius || h as i32 <= 2 * radius {
        draw_filled_rect_mut(overlay, Rect::at(0, 0).of_size(w, h), color);
        return;
    }

    draw_filled_rect_mut(
        overlay,
        Rect::at(radius, 0).of_size(w - 2 * radius as u32, h),
        color,
    );
    draw_filled_rect_mut(
        overlay,
        Rect::at(0, radius).of_size(w, h - 2 * radius as u32),
        color,
    );
    let corners = [
        (radius, radius),
        (w as i32 - radius - 1, radius),
        (radius, h as i32 - radius - 1),
        (w as i32 - radius - 1, h as i32 - radius - 1),
    ];
    for (cx, cy) in corners {
        draw_filled_circle_mut(overlay, (cx, cy), radius, color);
    }
}

/// Serialize to PNG with size optimization enabled.
pub fn encode_png(img: &DynamicImage) -> ProofResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buf,
        CompressionType::Best,
        PngFilterType::Adaptive,
    );
    img.write_with_encoder(encoder)
        .map_err(|e| crate::error::ProofError::post_process(format!("png encode: {e}")))?;
    Ok(buf)
}

/// Physical print size implied by a pixel count at a DPI.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PhysicalSize {
    pub width_inches: f64,
    pub height_inches: f64,
    pub dpi: u32,
}

pub fn physical_size(width_px: u32, height_px: u32, dpi: u32) -> PhysicalSize {
    let round2 = |v: f64| (v * 100.0).round() / 100.0;
    PhysicalSize {
        width_inches: round2(f64::from(width_px) / f64::from(dpi)),
        height_inches: round2(f64::from(height_px) / f64::from(dpi)),
        dpi,
    }
}

fn system_sans_font() -> Option<FontVec> {
    use usvg::fontdb::{Database, Family, Query};

    let mut db = Database::new();
    db.load_system_fonts();
    let id = db.query(&Query {
        families: &[Family::SansSerif],
        ..Query::default()
    })?;
    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
    })?
}
