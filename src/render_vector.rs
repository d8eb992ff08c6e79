//! Vector rendering through the converter fallback chain, plus the companion
//! scalable-PDF artifact.

use std::path::Path;

use anyhow::Context as _;
use image::DynamicImage;

use crate::backend::process::{truncate_diagnostic, DIAGNOSTIC_LIMIT};
use crate::backend::{default_backends, ConversionBackend};
use crate::error::{ProofError, ProofResult};
use crate::toolchain::Toolchain;

/// Print resolution assumed when the caller does not specify one.
pub const DEFAULT_DPI: u32 = 300;

/// Rasterizes vector artwork by trying eligible backends in priority order.
pub struct VectorRenderer {
    backends: Vec<Box<dyn ConversionBackend>>,
    tools: Toolchain,
}

impl VectorRenderer {
    pub fn new(tools: Toolchain) -> Self {
        Self {
            backends: default_backends(tools),
            tools,
        }
    }

    /// Construct with an explicit backend list, for tests that exercise the
    /// chain without external binaries.
    pub fn with_backends(backends: Vec<Box<dyn ConversionBackend>>, tools: Toolchain) -> Self {
        Self { backends, tools }
    }

    /// Rasterize `input` at `dpi`.
    ///
    /// Backend failures become the next fallback attempt and never escape;
    /// only when every eligible backend has failed does the last diagnostic
    /// surface, truncated, as [`ProofError::ConversionFailed`].
    #[tracing::instrument(skip(self, input), fields(input = %input.display()))]
    pub fn render(&self, input: &Path, ext: &str, dpi: u32) -> ProofResult<DynamicImage> {
        if !self.backends.iter().any(|b| b.supports(ext)) {
            return Err(ProofError::conversion_failed(format!(
                "no converter available for '.{ext}' — install inkscape or imagemagick"
            )));
        }

        let mut last_diagnostic = String::new();
        for backend in self.backends.iter().filter(|b| b.supports(ext)) {
            match backend.rasterize(input, dpi) {
                Ok(img) if img.width() > 0 && img.height() > 0 => {
                    tracing::info!(
                        backend = backend.name(),
                        width = img.width(),
                        height = img.height(),
                        "rasterized vector source"
                    );
                    return Ok(img);
                }
                Ok(_) => {
                    last_diagnostic = format!("{} produced a zero-size raster", backend.name());
                    tracing::warn!(backend = backend.name(), "zero-size raster, trying next backend");
                }
                Err(err) => {
                    last_diagnostic = truncate_diagnostic(&err.to_string(), DIAGNOSTIC_LIMIT);
                    tracing::warn!(
                        backend = backend.name(),
                        %err,
                        "backend failed, trying next"
                    );
                }
            }
        }

        Err(ProofError::conversion_failed(format!(
            "all converters failed for '.{ext}': {last_diagnostic}"
        )))
    }

    /// Produce the scalable companion PDF when the format allows one.
    ///
    /// `Ok(None)` means "unavailable", which is a reportable outcome, not an
    /// error: raster-native sources (XCF) have no vector form, and a missing
    /// converter merely forfeits the companion.
    #[tracing::instrument(skip(self, input), fields(input = %input.display()))]
    pub fn scalable_companion(&self, input: &Path, ext: &str) -> ProofResult<Option<Vec<u8>>> {
        match ext {
            // Already a PDF: pass the original through untouched.
            "pdf" => {
                let bytes = std::fs::read(input)
                    .with_context(|| format!("read pdf '{}'", input.display()))?;
                Ok(Some(bytes))
            }
            "eps" | "ai" if self.tools.ghostscript => {
                self.companion_via(input, |inp, out| {
                    crate::backend::ghostscript::ps_to_pdf(inp, out)
                })
            }
            "svg" | "cdr" if self.tools.inkscape => {
                self.companion_via(input, |inp, out| crate::backend::inkscape::export_pdf(inp, out))
            }
            // XCF is raster-native; everything else lacks a capable converter.
            _ => Ok(None),
        }
    }

    fn companion_via(
        &self,
        input: &Path,
        convert: impl Fn(&Path, &Path) -> ProofResult<()>,
    ) -> ProofResult<Option<Vec<u8>>> {
        let out = tempfile::Builder::new()
            .prefix("artproof-")
            .suffix(".pdf")
            .tempfile()
            .context("create temp pdf file")?;

        match convert(input, out.path()) {
            Ok(()) => {
                let bytes = std::fs::read(out.path()).context("read companion pdf")?;
                Ok(Some(bytes))
            }
            Err(err) => {
                // The preview still stands without its companion.
                tracing::warn!(%err, "companion pdf conversion failed");
                Ok(None)
            }
        }
    }
}
