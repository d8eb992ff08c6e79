//! Sampled dominant-color approximation over a rendered raster.
//!
//! Fallback signal for vector sources whose byte scan found nothing: a small
//! deterministic k-means in Lab space (CIEDE2000 distances) over a strided
//! pixel sample. Approximate by construction — swatch extraction from the
//! source bytes is always preferred when it yields anything.

use image::DynamicImage;
use palette::{color_difference::Ciede2000, white_point::D65, FromColor, Lab, Srgb};

use crate::color::{self, Cmyk, Rgb};

/// Keep the sample small enough that previews stay interactive.
const MAX_SAMPLES: usize = 20_000;
const MAX_ITERATIONS: usize = 12;

/// One dominant color with print metadata attached.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SampledColor {
    pub rgb: Rgb,
    pub hex: String,
    pub cmyk: Cmyk,
    pub name: String,
    /// Share of sampled pixels assigned to this color, 0–1.
    pub proportion: f32,
}

/// Extract up to `count` dominant colors, strongest first.
pub fn dominant_colors(image: &DynamicImage, count: usize) -> Vec<SampledColor> {
    let rgba = image.to_rgba8();
    let total = rgba.pixels().len();
    if total == 0 || count == 0 {
        return Vec::new();
    }

    let stride = (total / MAX_SAMPLES).max(1);
    let samples: Vec<Lab<D65, f32>> = rgba
        .pixels()
        .step_by(stride)
        .map(|p| {
            // Alpha-blend onto white so transparency reads as ground, not black.
            let a = f32::from(p[3]) / 255.0;
            let blend = |c: u8| (f32::from(c) * a + 255.0 * (1.0 - a)) as u8;
            lab_of(Rgb {
                r: blend(p[0]),
                g: blend(p[1]),
                b: blend(p[2]),
            })
        })
        .collect();

    let k = count.min(samples.len());
    let centers = kmeans(&samples, k);

    // Final assignment for proportions.
    let mut counts = vec![0usize; centers.len()];
    for lab in &samples {
        counts[nearest(&centers, *lab)] += 1;
    }

    let mut colors: Vec<SampledColor> = centers
        .iter()
        .zip(&counts)
        .filter(|&(_, &n)| n > 0)
        .map(|(lab, &n)| {
            let rgb = rgb_of(*lab);
            SampledColor {
                rgb,
                hex: rgb.hex(),
                cmyk: color::rgb_to_cmyk(rgb),
                name: color::color_name(rgb).to_string(),
                proportion: n as f32 / samples.len() as f32,
            }
        })
        .collect();
    colors.sort_by(|a, b| b.proportion.total_cmp(&a.proportion));
    colors
}

fn lab_of(rgb: Rgb) -> Lab<D65, f32> {
    Lab::from_color(Srgb::new(
        f32::from(rgb.r) / 255.0,
        f32::from(rgb.g) / 255.0,
        f32::from(rgb.b) / 255.0,
    ))
}

fn rgb_of(lab: Lab<D65, f32>) -> Rgb {
    let srgb = Srgb::from_color(lab);
    Rgb {
        r: (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        g: (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        b: (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    }
}

fn nearest(centers: &[Lab<D65, f32>], lab: Lab<D65, f32>) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, center) in centers.iter().enumerate() {
        let dist = lab.difference(*center);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Deterministic seeding: median-luminance sample first, then repeated
/// farthest-point picks. No RNG, so previews are reproducible.
fn seed_centers(samples: &[Lab<D65, f32>], k: usize) -> Vec<Lab<D65, f32>> {
    let mut by_luma: Vec<usize> = (0..samples.len()).collect();
    by_luma.sort_by(|&a, &b| samples[a].l.total_cmp(&samples[b].l));
    let first = by_luma[by_luma.len() / 2];

    let mut centers = vec![samples[first]];
    let mut min_dist: Vec<f32> = samples
        .iter()
        .map(|s| s.difference(centers[0]))
        .collect();

    while centers.len() < k {
        let (far, _) = min_dist
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .expect("samples are non-empty");
        let next = samples[far];
        for (d, s) in min_dist.iter_mut().zip(samples) {
            *d = d.min(s.difference(next));
        }
        centers.push(next);
    }
    centers
}

fn kmeans(samples: &[Lab<D65, f32>], k: usize) -> Vec<Lab<D65, f32>> {
    let mut centers = seed_centers(samples, k);
    let mut labels = vec![usize::MAX; samples.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (label, lab) in labels.iter_mut().zip(samples) {
            let assigned = nearest(&centers, *lab);
            if assigned != *label {
                *label = assigned;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![(0.0f64, 0.0f64, 0.0f64, 0u64); centers.len()];
        for (&label, lab) in labels.iter().zip(samples) {
            let s = &mut sums[label];
            s.0 += f64::from(lab.l);
            s.1 += f64::from(lab.a);
            s.2 += f64::from(lab.b);
            s.3 += 1;
        }
        for (center, (l, a, b, n)) in centers.iter_mut().zip(&sums) {
            if *n > 0 {
                *center = Lab::new(
                    (*l / *n as f64) as f32,
                    (*a / *n as f64) as f32,
                    (*b / *n as f64) as f32,
                );
            }
        }
    }
    centers
}
