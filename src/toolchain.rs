//! Probed availability of the external converter binaries.
//!
//! Availability is an explicit value injected into the renderer and extractor
//! at construction, never ambient global state — tests build a [`Toolchain`]
//! literal instead of touching the process environment.

/// Binary name used for Inkscape invocations.
pub const INKSCAPE_BIN: &str = "inkscape";
/// Binary name used for ImageMagick invocations (classic `convert` entry).
pub const MAGICK_BIN: &str = "convert";
/// Binary name used for Ghostscript invocations.
pub const GHOSTSCRIPT_BIN: &str = "gs";

/// Which external converters are present on this host.
///
/// `Default` is the empty toolchain: only the in-process SVG rasterizer is
/// usable. Probing is idempotent and cheap enough to repeat, but callers may
/// cache one probe per process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Toolchain {
    pub inkscape: bool,
    pub imagemagick: bool,
    pub ghostscript: bool,
}

impl Toolchain {
    /// Look up each converter binary on PATH.
    pub fn probe() -> Self {
        Self {
            inkscape: which::which(INKSCAPE_BIN).is_ok(),
            imagemagick: which::which(MAGICK_BIN).is_ok(),
            ghostscript: which::which(GHOSTSCRIPT_BIN).is_ok(),
        }
    }
}
