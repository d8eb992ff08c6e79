//! Ghostscript duties: PostScript→PDF companion conversion and the
//! authoritative ink-coverage analysis behind Pantone detection.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::backend::process::{run_with_timeout, ANALYZE_TIMEOUT, CONVERT_TIMEOUT};
use crate::error::{ProofError, ProofResult};
use crate::toolchain::GHOSTSCRIPT_BIN;

fn pantone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)PANTONE\s+(\d+(?:-\d+)?)\s*([A-Za-z]{1,3})").unwrap())
}

/// Spot colors actually used by the artwork, per Ghostscript's `inkcov`
/// device. Unlike a textual scan this reports only inks present in rendered
/// output, not swatches that are declared but never drawn.
pub fn used_pantones(input: &Path) -> ProofResult<Vec<String>> {
    let mut cmd = Command::new(GHOSTSCRIPT_BIN);
    cmd.arg("-o").arg("-").arg("-sDEVICE=inkcov").arg(input);

    let run = run_with_timeout(cmd, ANALYZE_TIMEOUT)?;
    if !run.success {
        return Err(ProofError::extraction(format!(
            "ghostscript ink coverage: {}",
            run.diagnostic()
        )));
    }

    let stdout = String::from_utf8_lossy(&run.stdout);
    let mut names: Vec<String> = pantone_re()
        .captures_iter(&stdout)
        .map(|cap| format!("PANTONE {} {}", &cap[1], cap[2].to_ascii_uppercase()))
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

/// PostScript (EPS/AI) to vector PDF, cropped to the artwork bounding box.
pub fn ps_to_pdf(input: &Path, output: &Path) -> ProofResult<()> {
    let mut cmd = Command::new(GHOSTSCRIPT_BIN);
    cmd.arg("-dNOPAUSE")
        .arg("-dBATCH")
        .arg("-sDEVICE=pdfwrite")
        .arg("-dEPSCrop")
        .arg(format!("-sOutputFile={}", output.display()))
        .arg(input);

    let run = run_with_timeout(cmd, CONVERT_TIMEOUT)?;
    if !run.success {
        return Err(ProofError::conversion_failed(format!(
            "ghostscript pdfwrite: {}",
            run.diagnostic()
        )));
    }
    let len = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    if len == 0 {
        return Err(ProofError::conversion_failed(
            "ghostscript pdfwrite produced an empty file",
        ));
    }
    Ok(())
}
