//! ImageMagick converter: the general-purpose fallback rasterizer.
//!
//! Per-format argument quirks matter here: XCF must be flattened (layered
//! editor format), SVG keeps a transparent background, PDF renders page one
//! only, and EPS/AI get a single retry onto an opaque white canvas — some
//! PostScript inputs fail to flatten onto a transparent one.

use std::path::Path;
use std::process::Command;

use anyhow::Context as _;
use image::DynamicImage;

use crate::backend::process::{run_with_timeout, CommandOutput, CONVERT_TIMEOUT};
use crate::backend::{load_nonempty_raster, ConversionBackend};
use crate::dispatch::VECTOR_EXTENSIONS;
use crate::error::{ProofError, ProofResult};
use crate::toolchain::MAGICK_BIN;

pub struct MagickBackend;

impl ConversionBackend for MagickBackend {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    fn supports(&self, ext: &str) -> bool {
        VECTOR_EXTENSIONS.contains(&ext)
    }

    fn rasterize(&self, input: &Path, dpi: u32) -> ProofResult<DynamicImage> {
        let ext = crate::dispatch::extension(input).unwrap_or_default();
        let out = tempfile::Builder::new()
            .prefix("artproof-")
            .suffix(".png")
            .tempfile()
            .context("create temp raster file")?;

        let mut run = run_with_timeout(primary_command(&ext, input, out.path(), dpi), CONVERT_TIMEOUT)?;

        if !run.success && matches!(ext.as_str(), "eps" | "ai") {
            tracing::debug!(input = %input.display(), "retrying postscript input on a white canvas");
            run = run_with_timeout(white_retry_command(input, out.path(), dpi), CONVERT_TIMEOUT)?;
        }

        if !run.success {
            return Err(conversion_error(&run));
        }
        load_nonempty_raster(out.path(), "imagemagick")
    }
}

fn primary_command(ext: &str, input: &Path, output: &Path, dpi: u32) -> Command {
    let mut cmd = Command::new(MAGICK_BIN);
    let density = dpi.to_string();
    match ext {
        "xcf" => {
            cmd.arg("-flatten")
                .arg("-density")
                .arg(&density)
                .arg(input)
                .arg(output);
        }
        "cdr" => {
            cmd.arg("-density")
                .arg(&density)
                .arg(input)
                .arg("-flatten")
                .arg(output);
        }
        "svg" => {
            cmd.arg("-background")
                .arg("none")
                .arg("-density")
                .arg(&density)
                .arg(input)
                .arg(output);
        }
        "eps" | "ai" => {
            cmd.arg("-density")
                .arg(&density)
                .arg(input)
                .arg("-flatten")
                .arg(output);
        }
        // PDF and anything else: first page only, kept transparent until
        // the explicit flatten.
        _ => {
            cmd.arg("-density")
                .arg(&density)
                .arg("-background")
                .arg("none")
                .arg(format!("{}[0]", input.display()))
                .arg("-flatten")
                .arg(output);
        }
    }
    cmd
}

fn white_retry_command(input: &Path, output: &Path, dpi: u32) -> Command {
    let mut cmd = Command::new(MAGICK_BIN);
    cmd.arg("-density")
        .arg(dpi.to_string())
        .arg("-background")
        .arg("white")
        .arg("-flatten")
        .arg(input)
        .arg(output);
    cmd
}

fn conversion_error(run: &CommandOutput) -> ProofError {
    ProofError::conversion_failed(format!("imagemagick: {}", run.diagnostic()))
}
