//! Stitch-to-raster rendering: draw a parsed pattern as connected line
//! segments on a fixed canvas, with a fit-to-canvas transform that preserves
//! aspect ratio.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use kurbo::{Affine, Point};

use crate::error::{ProofError, ProofResult};
use crate::stitch::{flags, StitchPattern};

/// Default canvas, distinct from the vector preview's max-bound logic.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1200;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 800;

/// Blank border kept around the design, per side.
const MARGIN: f64 = 50.0;

const GROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const THREAD: Rgba<u8> = Rgba([0, 0, 0, 255]);

pub struct EmbroideryRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for EmbroideryRenderer {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl EmbroideryRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Draw the pattern centered on a white canvas.
    ///
    /// The pen walk reproduces machine behavior: trim and color-change lift
    /// the pen (no spurious line across a thread break), jump moves it
    /// without drawing, anything else stitches a segment from the previous
    /// position.
    #[tracing::instrument(skip_all, fields(stitches = pattern.stitch_count()))]
    pub fn render(&self, pattern: &StitchPattern) -> ProofResult<RgbaImage> {
        let bounds = pattern
            .bounds()
            .ok_or_else(|| ProofError::degenerate_pattern("pattern contains no stitches"))?;

        if bounds.width() == 0 || bounds.height() == 0 {
            return Err(ProofError::degenerate_pattern(format!(
                "pattern bounds collapse to {}x{} machine units",
                bounds.width(),
                bounds.height()
            )));
        }

        let usable_w = f64::from(self.width) - 2.0 * MARGIN;
        let usable_h = f64::from(self.height) - 2.0 * MARGIN;
        if usable_w <= 0.0 || usable_h <= 0.0 {
            return Err(ProofError::conversion_failed(format!(
                "canvas {}x{} leaves no room inside the {MARGIN} px margins",
                self.width, self.height
            )));
        }

        let pattern_w = f64::from(bounds.width());
        let pattern_h = f64::from(bounds.height());

        // Uniform scale, so the design never distorts.
        let scale = (usable_w / pattern_w).min(usable_h / pattern_h);
        let offset_x = MARGIN + (usable_w - pattern_w * scale) / 2.0;
        let offset_y = MARGIN + (usable_h - pattern_h * scale) / 2.0;

        let to_canvas = Affine::translate((offset_x, offset_y))
            * Affine::scale(scale)
            * Affine::translate((-f64::from(bounds.min_x), -f64::from(bounds.min_y)));

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, GROUND);

        let mut pen: Option<Point> = None;
        for stitch in pattern.stitches() {
            let here = to_canvas * Point::new(f64::from(stitch.x), f64::from(stitch.y));

            if stitch.flags & (flags::TRIM | flags::COLOR_CHANGE | flags::END) != 0 {
                pen = None;
            }
            if let Some(prev) = pen {
                if stitch.flags & flags::JUMP == 0 {
                    draw_stitch_segment(&mut canvas, prev, here);
                }
            }
            pen = Some(here);
        }

        Ok(canvas)
    }
}

/// 2 px thread stroke: double-stroke offset across the dominant axis.
fn draw_stitch_segment(canvas: &mut RgbaImage, from: Point, to: Point) {
    let a = (from.x as f32, from.y as f32);
    let b = (to.x as f32, to.y as f32);
    draw_line_segment_mut(canvas, a, b, THREAD);

    let (dx, dy) = (to.x - from.x, to.y - from.y);
    if dx.abs() >= dy.abs() {
        draw_line_segment_mut(canvas, (a.0, a.1 + 1.0), (b.0, b.1 + 1.0), THREAD);
    } else {
        draw_line_segment_mut(canvas, (a.0 + 1.0, a.1), (b.0 + 1.0, b.1), THREAD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stitch::Stitch;

    fn plain(x: i32, y: i32) -> Stitch {
        Stitch { x, y, flags: 0 }
    }

    #[test]
    fn zero_width_bounds_are_degenerate_not_a_division() {
        let pattern = StitchPattern::new(vec![plain(7, 0), plain(7, 100)]);
        let err = EmbroideryRenderer::default().render(&pattern).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProofError::DegeneratePattern(_)
        ));
    }

    #[test]
    fn empty_pattern_is_degenerate() {
        let err = EmbroideryRenderer::default()
            .render(&StitchPattern::new(vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProofError::DegeneratePattern(_)
        ));
    }

    #[test]
    fn rendering_is_centered_within_margins() {
        let pattern = StitchPattern::new(vec![plain(0, 0), plain(1000, 1000)]);
        let canvas = EmbroideryRenderer::default().render(&pattern).unwrap();
        assert_eq!(canvas.dimensions(), (1200, 800));

        // Square design on a 1200x800 canvas: height is the binding axis, so
        // the drawn diagonal spans x 250..950 centered, y 50..750.
        let mut min_x = u32::MAX;
        let mut max_x = 0;
        for (x, _, px) in canvas.enumerate_pixels() {
            if px[0] == 0 {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
        }
        assert!(min_x >= 245 && min_x <= 255, "min_x = {min_x}");
        assert!(max_x >= 945 && max_x <= 955, "max_x = {max_x}");
    }

    #[test]
    fn trim_suppresses_the_arriving_segment() {
        // The thread is cut and the next record lands far away: the segment
        // into the trim stitch must not be drawn as a spurious bridge.
        let pattern = StitchPattern::new(vec![
            plain(0, 0),
            plain(10, 0),
            Stitch {
                x: 1000,
                y: 1000,
                flags: flags::TRIM,
            },
        ]);
        let canvas = EmbroideryRenderer::default().render(&pattern).unwrap();
        let dark = canvas
            .enumerate_pixels()
            .filter(|(_, _, px)| px[0] == 0)
            .count();
        // Only the short initial segment is inked.
        assert!(dark < 50, "unexpected ink count {dark}");
    }

    #[test]
    fn jump_moves_without_drawing() {
        let pattern = StitchPattern::new(vec![
            plain(0, 0),
            Stitch {
                x: 1000,
                y: 1000,
                flags: flags::JUMP,
            },
            plain(990, 1000),
        ]);
        let canvas = EmbroideryRenderer::default().render(&pattern).unwrap();
        let dark = canvas
            .enumerate_pixels()
            .filter(|(_, _, px)| px[0] == 0)
            .count();
        // Only the tiny post-jump stitch is inked, never the jump itself.
        assert!(dark < 40, "unexpected ink count {dark}");
    }
}
