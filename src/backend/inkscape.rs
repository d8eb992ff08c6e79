//! Inkscape converter: primary rasterizer for every vector format, and the
//! vector-preserving PDF exporter for SVG/CDR sources.

use std::path::Path;
use std::process::Command;

use anyhow::Context as _;
use image::DynamicImage;

use crate::backend::process::{run_with_timeout, CONVERT_TIMEOUT};
use crate::backend::{load_nonempty_raster, ConversionBackend};
use crate::dispatch::VECTOR_EXTENSIONS;
use crate::error::{ProofError, ProofResult};
use crate::toolchain::INKSCAPE_BIN;

pub struct InkscapeBackend;

impl ConversionBackend for InkscapeBackend {
    fn name(&self) -> &'static str {
        "inkscape"
    }

    fn supports(&self, ext: &str) -> bool {
        VECTOR_EXTENSIONS.contains(&ext)
    }

    fn rasterize(&self, input: &Path, dpi: u32) -> ProofResult<DynamicImage> {
        let out = tempfile::Builder::new()
            .prefix("artproof-")
            .suffix(".png")
            .tempfile()
            .context("create temp raster file")?;

        let mut cmd = Command::new(INKSCAPE_BIN);
        cmd.arg(input)
            .arg("--export-type=png")
            .arg(format!("--export-dpi={dpi}"))
            .arg(format!("--export-filename={}", out.path().display()));

        let run = run_with_timeout(cmd, CONVERT_TIMEOUT)?;
        if !run.success {
            return Err(ProofError::conversion_failed(format!(
                "inkscape: {}",
                run.diagnostic()
            )));
        }
        load_nonempty_raster(out.path(), "inkscape")
    }
}

/// Vector-preserving PDF export (SVG/CDR). Text is flattened to paths so the
/// output needs no fonts downstream.
pub fn export_pdf(input: &Path, output: &Path) -> ProofResult<()> {
    let mut cmd = Command::new(INKSCAPE_BIN);
    cmd.arg(input)
        .arg("--export-type=pdf")
        .arg("--export-pdf-version=1.5")
        .arg("--export-text-to-path")
        .arg(format!("--export-filename={}", output.display()));

    let run = run_with_timeout(cmd, CONVERT_TIMEOUT)?;
    if !run.success {
        return Err(ProofError::conversion_failed(format!(
            "inkscape pdf export: {}",
            run.diagnostic()
        )));
    }
    Ok(())
}
