//! Format dispatch: map a file's extension to a handling strategy.
//!
//! Dispatch is a pure function of the extension string and performs no I/O.

use std::path::Path;

use crate::error::{ProofError, ProofResult};

/// Vector-artwork extensions rasterized through the converter backends.
pub const VECTOR_EXTENSIONS: [&str; 6] = ["ai", "eps", "pdf", "svg", "cdr", "xcf"];

/// Embroidery stitch-data extensions drawn by the stitch renderer.
pub const EMBROIDERY_EXTENSIONS: [&str; 7] = ["dst", "pes", "exp", "jef", "vp3", "xxx", "u01"];

/// Handling strategy for a supported upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Vector,
    Embroidery,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Vector => "vector",
            FileKind::Embroidery => "embroidery",
        }
    }
}

/// Lowercased extension of `path`, without the dot.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Classify an already-lowercased extension.
pub fn classify_extension(ext: &str) -> ProofResult<FileKind> {
    if VECTOR_EXTENSIONS.contains(&ext) {
        return Ok(FileKind::Vector);
    }
    if EMBROIDERY_EXTENSIONS.contains(&ext) {
        return Ok(FileKind::Embroidery);
    }
    if ext == "indd" {
        // InDesign documents have no direct rasterizer.
        return Err(ProofError::unsupported_format(
            "InDesign (.indd) files cannot be processed directly — \
             export from InDesign as PDF, AI, or EPS and upload the export",
        ));
    }
    Err(ProofError::unsupported_format(format!(
        "'.{ext}' is not a supported design format — export to PDF, AI, or EPS first"
    )))
}

/// Classify a file path by its extension, case-insensitively.
pub fn classify(path: &Path) -> ProofResult<FileKind> {
    match extension(path) {
        Some(ext) => classify_extension(&ext),
        None => Err(ProofError::unsupported_format(
            "file has no extension — export to PDF, AI, or EPS first",
        )),
    }
}

/// True when the file name carries a supported vector or embroidery suffix.
pub fn is_supported(name: &str) -> bool {
    classify(Path::new(name)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_declared_extension_dispatches() {
        for ext in VECTOR_EXTENSIONS {
            assert_eq!(classify_extension(ext).unwrap(), FileKind::Vector);
        }
        for ext in EMBROIDERY_EXTENSIONS {
            assert_eq!(classify_extension(ext).unwrap(), FileKind::Embroidery);
        }
    }

    #[test]
    fn suffix_match_ignores_case() {
        assert_eq!(
            classify(Path::new("logo.SVG")).unwrap(),
            FileKind::Vector
        );
        assert_eq!(
            classify(Path::new("badge.Dst")).unwrap(),
            FileKind::Embroidery
        );
    }

    #[test]
    fn indd_guidance_names_the_exports() {
        let err = classify(Path::new("brochure.indd")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("PDF"));
        assert!(msg.contains("EPS"));
    }
}
