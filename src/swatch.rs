//! Color/swatch extraction from raw vector file bytes.
//!
//! Vector formats with a text-based or partially-text-based internal
//! structure (AI/EPS/PDF/SVG) carry color declarations that a byte-level scan
//! can recover: Pantone spot references, CMYK/RGB/grayscale operators, and
//! named separation color spaces. The scan is heuristic and format-fragile by
//! design — a best-effort auxiliary signal, not a parser — so every stage is
//! independent and failures degrade to "no colors found".

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context as _;
use regex::Regex;

use crate::color::{Cmyk, Rgb};
use crate::error::ProofResult;
use crate::toolchain::Toolchain;

/// List caps per kind, print-shop display limits.
const MAX_PANTONE: usize = 15;
const MAX_CMYK: usize = 15;
const MAX_RGB: usize = 15;
const MAX_GRAYSCALE: usize = 10;
const MAX_SPOT_OTHER: usize = 5;

/// One classified color declaration.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRecord {
    Pantone { name: String },
    Cmyk { c: u8, m: u8, y: u8, k: u8 },
    Rgb { r: u8, g: u8, b: u8 },
    Grayscale { percent: u8 },
    SpotOther { name: String },
}

/// Classified colors found in a vector source, one de-duplicated, capped,
/// ordered list per kind.
///
/// An all-empty set is represented as `None` at the extractor boundary, so
/// "no colors found" stays distinguishable from "extraction not attempted".
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ColorSet {
    pub pantone: Vec<String>,
    pub cmyk: Vec<Cmyk>,
    pub rgb: Vec<Rgb>,
    pub grayscale: Vec<u8>,
    pub spot_other: Vec<String>,
}

impl ColorSet {
    pub fn is_empty(&self) -> bool {
        self.pantone.is_empty()
            && self.cmyk.is_empty()
            && self.rgb.is_empty()
            && self.grayscale.is_empty()
            && self.spot_other.is_empty()
    }

    /// Flatten into tagged records, Pantone first, in display order.
    pub fn records(&self) -> Vec<ColorRecord> {
        let mut out = Vec::new();
        out.extend(self.pantone.iter().map(|name| ColorRecord::Pantone {
            name: name.clone(),
        }));
        out.extend(self.spot_other.iter().map(|name| ColorRecord::SpotOther {
            name: name.clone(),
        }));
        out.extend(self.cmyk.iter().map(|v| ColorRecord::Cmyk {
            c: v.c,
            m: v.m,
            y: v.y,
            k: v.k,
        }));
        out.extend(self.grayscale.iter().map(|&percent| ColorRecord::Grayscale {
            percent,
        }));
        out.extend(self.rgb.iter().map(|v| ColorRecord::Rgb {
            r: v.r,
            g: v.g,
            b: v.b,
        }));
        out
    }
}

/// Byte-level swatch scanner with an optional authoritative Ghostscript path.
pub struct SwatchExtractor {
    tools: Toolchain,
}

impl SwatchExtractor {
    pub fn new(tools: Toolchain) -> Self {
        Self { tools }
    }

    /// Read `path` and scan it. I/O failures surface as
    /// [`crate::error::ProofError::Extraction`]; the pipeline treats those as
    /// non-fatal and degrades.
    pub fn extract_from_file(&self, path: &Path, ext: &str) -> ProofResult<Option<ColorSet>> {
        if !scannable(ext) {
            return Ok(None);
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("read '{}' for color extraction", path.display()))
            .map_err(|e| crate::error::ProofError::extraction(format!("{e:#}")))?;
        Ok(self.extract(Some(path), &bytes, ext))
    }

    /// Scan raw bytes. `path` enables the authoritative ink-coverage pass
    /// when Ghostscript is available.
    #[tracing::instrument(skip(self, path, bytes))]
    pub fn extract(&self, path: Option<&Path>, bytes: &[u8], ext: &str) -> Option<ColorSet> {
        if !scannable(ext) {
            return None;
        }

        // Vector internals mix binary and ASCII-range text; decode
        // permissively so undecodable bytes become placeholders, never errors.
        let text = String::from_utf8_lossy(bytes);

        let set = ColorSet {
            pantone: self.pantone_names(path, &text),
            cmyk: cmyk_values(&text),
            grayscale: grayscale_values(&text),
            rgb: rgb_values(&text),
            spot_other: separation_names(&text),
        };

        if set.is_empty() {
            None
        } else {
            tracing::debug!(
                pantone = set.pantone.len(),
                cmyk = set.cmyk.len(),
                rgb = set.rgb.len(),
                grayscale = set.grayscale.len(),
                spot_other = set.spot_other.len(),
                "classified embedded colors"
            );
            Some(set)
        }
    }

    /// Pantone stage: prefer the ink-coverage analysis (reports only inks
    /// present in rendered output); fall back to textual pattern matching
    /// over the byte stream. No reconciliation between the two.
    fn pantone_names(&self, path: Option<&Path>, text: &str) -> Vec<String> {
        if let Some(path) = path {
            if self.tools.ghostscript {
                match crate::backend::ghostscript::used_pantones(path) {
                    Ok(names) if !names.is_empty() => return names,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::debug!(%err, "ink-coverage pass failed, falling back to textual scan");
                    }
                }
            }
        }
        textual_pantones(text)
    }
}

/// Extensions with scannable internals. CDR and XCF are binary-opaque for
/// this purpose; embroidery formats never carry swatch declarations.
fn scannable(ext: &str) -> bool {
    matches!(ext, "ai" | "eps" | "pdf" | "svg")
}

fn regexes(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

fn pantone_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        regexes(&[
            // PANTONE 293 U, PANTONE 7547 CVC, PANTONE 2745-C ...
            r"(?i)PANTONE\s+(\d+(?:-\d+)?)\s*([A-Za-z]{1,3})",
            // PostScript literal-name encoding: /(PANTONE 293 U)
            r"(?i)/\(PANTONE\s+(\d+(?:-\d+)?)\s*([A-Za-z]{1,3})\)",
            // EPS structuring comments
            r"(?i)%%CMYKCustomColor:.*PANTONE\s+(\d+(?:-\d+)?)\s*([A-Za-z]{1,3})",
        ])
    })
}

fn cmyk_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        regexes(&[
            r"([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+(?:setcmykcolor|k)",
            r"/DeviceCMYK\s+.*?\[([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)\]",
        ])
    })
}

fn gray_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        regexes(&[
            r"([\d.]+)\s+(?:setgray|g)\s",
            r"/DeviceGray\s+.*?\[([\d.]+)\]",
        ])
    })
}

fn white_swatch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)/White[\s)]|"White"|'White'|\(White\)"#).unwrap())
}

fn rgb_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        regexes(&[
            // `rg`/`RG` are case-significant PDF operators; no (?i) here.
            r"([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+(?:setrgbcolor|rg|RG)\s",
            r"/DeviceRGB\s+.*?\[([\d.]+)\s+([\d.]+)\s+([\d.]+)\]",
        ])
    })
}

fn separation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/Separation\s*/\(([^)]+)\)").unwrap())
}

fn textual_pantones(text: &str) -> Vec<String> {
    let mut found = HashSet::new();
    for re in pantone_res() {
        for cap in re.captures_iter(text) {
            found.insert(format!("PANTONE {} {}", &cap[1], cap[2].to_ascii_uppercase()));
        }
    }
    let mut names: Vec<String> = found.into_iter().collect();
    names.sort();
    names.truncate(MAX_PANTONE);
    names
}

/// The 0–1-vs-scaled disambiguation: a first component at or below 1.0 marks
/// the whole tuple as normalized fractions. A deliberately specified integer
/// value of 1 (e.g. 1% cyan) is therefore misread as 100% — a known
/// limitation of the heuristic, preserved as documented behavior.
fn scale_component(value: f64, normalized: bool, full_scale: f64) -> i64 {
    if normalized {
        (value * full_scale) as i64
    } else {
        value as i64
    }
}

fn cmyk_values(text: &str) -> Vec<Cmyk> {
    let mut found = HashSet::new();
    for re in cmyk_res() {
        for cap in re.captures_iter(text) {
            let parsed: Option<Vec<f64>> = (1..=4).map(|i| cap[i].parse().ok()).collect();
            let Some(vals) = parsed else { continue };
            let normalized = vals[0] <= 1.0;
            let quad: Vec<u8> = vals
                .iter()
                .map(|&v| scale_component(v, normalized, 100.0).clamp(0, 100) as u8)
                .collect();
            // White (0,0,0,0) is a real separation in print work; keep it.
            found.insert(Cmyk {
                c: quad[0],
                m: quad[1],
                y: quad[2],
                k: quad[3],
            });
        }
    }
    let mut values: Vec<Cmyk> = found.into_iter().collect();
    // Black/dark inks first, the print-shop convention.
    values.sort_by_key(|v| (v.k, v.c, v.m, v.y));
    values.truncate(MAX_CMYK);
    values
}

fn grayscale_values(text: &str) -> Vec<u8> {
    let mut found = HashSet::new();

    // An explicit "White" swatch name counts as 100% even when no gray
    // operator carries it.
    if white_swatch_re().is_match(text) {
        found.insert(100u8);
    }

    for re in gray_res() {
        for cap in re.captures_iter(text) {
            let Ok(value) = cap[1].parse::<f64>() else {
                continue;
            };
            let normalized = value <= 1.0;
            found.insert(scale_component(value, normalized, 100.0).clamp(0, 100) as u8);
        }
    }

    let mut values: Vec<u8> = found.into_iter().collect();
    // White first.
    values.sort_by(|a, b| b.cmp(a));
    values.truncate(MAX_GRAYSCALE);
    values
}

fn rgb_values(text: &str) -> Vec<Rgb> {
    let mut found = HashSet::new();
    for re in rgb_res() {
        for cap in re.captures_iter(text) {
            let parsed: Option<Vec<f64>> = (1..=3).map(|i| cap[i].parse().ok()).collect();
            let Some(vals) = parsed else { continue };
            let normalized = vals[0] <= 1.0;
            let channels: Vec<u8> = vals
                .iter()
                .map(|&v| scale_component(v, normalized, 255.0).clamp(0, 255) as u8)
                .collect();
            found.insert(Rgb {
                r: channels[0],
                g: channels[1],
                b: channels[2],
            });
        }
    }
    let mut values: Vec<Rgb> = found.into_iter().collect();
    values.sort();
    values.truncate(MAX_RGB);
    values
}

fn separation_names(text: &str) -> Vec<String> {
    let mut found = HashSet::new();
    for cap in separation_re().captures_iter(text) {
        let name = cap[1].trim().to_string();
        // Pantone separations are already captured by the Pantone stage.
        if name.to_ascii_uppercase().contains("PANTONE") {
            continue;
        }
        found.insert(name);
    }
    // Set semantics; sorted only for deterministic output.
    let mut names: Vec<String> = found.into_iter().collect();
    names.sort();
    names.truncate(MAX_SPOT_OTHER);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(bytes: &[u8], ext: &str) -> Option<ColorSet> {
        SwatchExtractor::new(Toolchain::default()).extract(None, bytes, ext)
    }

    #[test]
    fn opaque_extensions_are_never_scanned() {
        assert!(extract(b"PANTONE 293 U", "cdr").is_none());
        assert!(extract(b"PANTONE 293 U", "xcf").is_none());
        assert!(extract(b"PANTONE 293 U", "dst").is_none());
    }

    #[test]
    fn pantone_encodings_deduplicate() {
        let set = extract(
            b"%!PS\n/(PANTONE 293 U) def\nPANTONE 293 U findcolor\n",
            "eps",
        )
        .unwrap();
        assert_eq!(set.pantone, vec!["PANTONE 293 U"]);
    }

    #[test]
    fn normalized_cmyk_scales_and_scaled_passes_through() {
        let set = extract(b"0.5 0.2 0.8 0.0 setcmykcolor\n", "eps").unwrap();
        assert_eq!(
            set.cmyk,
            vec![Cmyk {
                c: 50,
                m: 20,
                y: 80,
                k: 0
            }]
        );

        let set = extract(b"/DeviceCMYK id [50 20 80 0]\n", "pdf").unwrap();
        assert_eq!(
            set.cmyk,
            vec![Cmyk {
                c: 50,
                m: 20,
                y: 80,
                k: 0
            }]
        );
    }

    #[test]
    fn boundary_value_one_reads_as_normalized() {
        // The documented heuristic limitation: a literal 1 scales to 100.
        let set = extract(b"1 0 0 0 setcmykcolor\n", "eps").unwrap();
        assert_eq!(set.cmyk[0].c, 100);
    }

    #[test]
    fn cmyk_sorts_dark_inks_first() {
        let set = extract(
            b"0 0 0 0 setcmykcolor\n0.1 0 0 1.0 setcmykcolor\n0 0.2 0 0.5 setcmykcolor\n",
            "eps",
        )
        .unwrap();
        let ks: Vec<u8> = set.cmyk.iter().map(|v| v.k).collect();
        assert_eq!(ks, vec![0, 50, 100]);
    }

    #[test]
    fn white_swatch_forces_full_grayscale() {
        let set = extract(b"/White (swatch) def\n0.25 setgray \n", "ai").unwrap();
        assert_eq!(set.grayscale, vec![100, 25]);
    }

    #[test]
    fn rgb_operators_and_arrays_match() {
        let set = extract(
            b"1 0 0 RG \n/DeviceRGB cs [0 0.5 0.25]\n",
            "pdf",
        )
        .unwrap();
        assert_eq!(
            set.rgb,
            vec![
                Rgb { r: 0, g: 127, b: 63 },
                Rgb { r: 255, g: 0, b: 0 },
            ]
        );
    }

    #[test]
    fn separation_names_exclude_pantone() {
        let set = extract(
            b"/Separation /(Reflex Blue) cs\n/Separation /(PANTONE 293 U) cs\n",
            "pdf",
        )
        .unwrap();
        assert_eq!(set.spot_other, vec!["Reflex Blue"]);
        assert_eq!(set.pantone, vec!["PANTONE 293 U"]);
    }

    #[test]
    fn empty_scan_reports_absence_not_an_empty_set() {
        assert!(extract(b"nothing colorful here", "svg").is_none());
    }

    #[test]
    fn caps_hold() {
        let mut doc = Vec::new();
        for i in 0..40 {
            doc.extend_from_slice(format!("{} 0 0 {} setcmykcolor\n", i, i).as_bytes());
            doc.extend_from_slice(format!("/Separation /(Spot {i}) cs\n").as_bytes());
        }
        let set = extract(&doc, "eps").unwrap();
        assert!(set.cmyk.len() <= 15);
        assert!(set.spot_other.len() <= 5);
    }

    #[test]
    fn undecodable_bytes_do_not_abort_the_scan() {
        let mut doc = vec![0xFF, 0xFE, 0x90, 0x80];
        doc.extend_from_slice(b"\nPANTONE 7547 C\n");
        doc.extend_from_slice(&[0xC3, 0x28]);
        let set = extract(&doc, "ai").unwrap();
        assert_eq!(set.pantone, vec!["PANTONE 7547 C"]);
    }
}
