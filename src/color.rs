//! Print-convention color math shared by the swatch extractor and the
//! sampled-color fallback.

/// Process-color ink percentages, each 0–100.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Cmyk {
    pub c: u8,
    pub m: u8,
    pub y: u8,
    pub k: u8,
}

/// Screen-color channels, each 0–255.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Convert screen RGB to the CMYK a print shop would run.
///
/// Uses the standard K-extraction formula. Pure black maps to K 100 with no
/// chromatic ink.
pub fn rgb_to_cmyk(rgb: Rgb) -> Cmyk {
    if rgb == (Rgb { r: 0, g: 0, b: 0 }) {
        return Cmyk {
            c: 0,
            m: 0,
            y: 0,
            k: 100,
        };
    }

    let c = 1.0 - f64::from(rgb.r) / 255.0;
    let m = 1.0 - f64::from(rgb.g) / 255.0;
    let y = 1.0 - f64::from(rgb.b) / 255.0;

    let k = c.min(m).min(y);
    if k >= 1.0 {
        return Cmyk {
            c: 0,
            m: 0,
            y: 0,
            k: 100,
        };
    }

    Cmyk {
        c: (((c - k) / (1.0 - k)) * 100.0).round() as u8,
        m: (((m - k) / (1.0 - k)) * 100.0).round() as u8,
        y: (((y - k) / (1.0 - k)) * 100.0).round() as u8,
        k: (k * 100.0).round() as u8,
    }
}

/// Approximate a CMYK mix as screen RGB, for swatch display only.
pub fn cmyk_to_rgb(cmyk: Cmyk) -> Rgb {
    let scale = |ink: u8| 1.0 - f64::from(ink) / 100.0;
    let k = scale(cmyk.k);
    Rgb {
        r: (255.0 * scale(cmyk.c) * k).round() as u8,
        g: (255.0 * scale(cmyk.m) * k).round() as u8,
        b: (255.0 * scale(cmyk.y) * k).round() as u8,
    }
}

/// Rough color-family name for a swatch. A sales-floor label, not a
/// colorimetric classification.
pub fn color_name(rgb: Rgb) -> &'static str {
    let (r, g, b) = (rgb.r, rgb.g, rgb.b);
    if r > 200 && g > 200 && b > 200 {
        return "White";
    }
    if r < 50 && g < 50 && b < 50 {
        return "Black";
    }
    if r > g && r > b {
        if g > 100 {
            return "Orange/Gold";
        }
        return "Red";
    }
    if g > r && g > b {
        return "Green";
    }
    if b > r && b > g {
        return "Blue";
    }
    if r > 150 && g > 150 {
        return "Yellow";
    }
    if r > 100 && b > 100 {
        return "Purple";
    }
    "Gray"
}
