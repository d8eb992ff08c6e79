//! Stitch-pattern data model.
//!
//! Coordinates are embroidery machine units (1/10 mm). The canvas convention
//! is screen-like: +y grows downward (machine-format readers flip on decode).

use std::path::Path;

use crate::error::{ProofError, ProofResult};

/// Control-flag bits on a stitch record.
pub mod flags {
    /// Pen moves without stitching.
    pub const JUMP: u8 = 0b0001;
    /// Thread is cut; the next segment must not be drawn.
    pub const TRIM: u8 = 0b0010;
    /// Thread color swap; also lifts the pen.
    pub const COLOR_CHANGE: u8 = 0b0100;
    /// End of pattern.
    pub const END: u8 = 0b1000;
}

/// One needle position plus control flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stitch {
    pub x: i32,
    pub y: i32,
    pub flags: u8,
}

/// Axis-aligned bounds over all stitch coordinates, in machine units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PatternBounds {
    pub fn width(self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> i32 {
        self.max_y - self.min_y
    }

    pub fn width_mm(self) -> f64 {
        f64::from(self.width()) / 10.0
    }

    pub fn height_mm(self) -> f64 {
        f64::from(self.height()) / 10.0
    }
}

/// Totals reported to the production workflow, independent of rendering.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct StitchStats {
    pub stitch_count: u32,
    pub thread_changes: u32,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// An ordered, immutable stitch sequence parsed from a machine file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StitchPattern {
    stitches: Vec<Stitch>,
}

impl StitchPattern {
    pub fn new(stitches: Vec<Stitch>) -> Self {
        Self { stitches }
    }

    pub fn stitches(&self) -> &[Stitch] {
        &self.stitches
    }

    pub fn stitch_count(&self) -> u32 {
        self.stitches.len() as u32
    }

    /// Number of thread color swaps over the whole pattern.
    pub fn thread_changes(&self) -> u32 {
        self.stitches
            .iter()
            .filter(|s| s.flags & flags::COLOR_CHANGE != 0)
            .count() as u32
    }

    /// `None` for an empty pattern.
    pub fn bounds(&self) -> Option<PatternBounds> {
        let first = self.stitches.first()?;
        let mut b = PatternBounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for s in &self.stitches {
            b.min_x = b.min_x.min(s.x);
            b.min_y = b.min_y.min(s.y);
            b.max_x = b.max_x.max(s.x);
            b.max_y = b.max_y.max(s.y);
        }
        Some(b)
    }

    pub fn stats(&self) -> StitchStats {
        let bounds = self.bounds();
        let round2 = |v: f64| (v * 100.0).round() / 100.0;
        StitchStats {
            stitch_count: self.stitch_count(),
            thread_changes: self.thread_changes(),
            width_mm: round2(bounds.map(PatternBounds::width_mm).unwrap_or(0.0)),
            height_mm: round2(bounds.map(PatternBounds::height_mm).unwrap_or(0.0)),
        }
    }
}

/// Read a stitch pattern from a machine file, dispatching on extension.
///
/// The stitch parser is an external collaborator in the pipeline contract;
/// the crate bundles a Tajima DST reader (the dominant commercial format) and
/// reports the other embroidery extensions with actionable guidance.
pub fn read_pattern(path: &Path) -> ProofResult<StitchPattern> {
    let ext = crate::dispatch::extension(path).unwrap_or_default();
    match ext.as_str() {
        "dst" => crate::stitch_dst::read(path),
        "pes" | "exp" | "jef" | "vp3" | "xxx" | "u01" => {
            Err(ProofError::conversion_failed(format!(
                "no bundled stitch reader for '.{ext}' — convert the design to DST \
                 or supply a parsed pattern through the library API"
            )))
        }
        _ => Err(ProofError::conversion_failed(format!(
            "'.{ext}' is not an embroidery stitch format"
        ))),
    }
}
