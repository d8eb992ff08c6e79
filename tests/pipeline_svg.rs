//! End-to-end vector pipeline through the in-process SVG backend only
//! (empty toolchain, nothing external).

use std::io::Write as _;

use artproof::{BackgroundMode, PreviewOptions, PreviewPipeline, Toolchain};

fn write_svg(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

fn pipeline(background: BackgroundMode) -> PreviewPipeline {
    PreviewPipeline::new(
        Toolchain::default(),
        PreviewOptions {
            background,
            ..PreviewOptions::default()
        },
    )
}

const BLACK_RECT: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="960" height="480">
  <rect x="0" y="0" width="960" height="480" fill="#000000"/>
</svg>"##;

#[test]
fn black_rect_svg_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_svg(&dir, "rect.svg", BLACK_RECT);

    let result = pipeline(BackgroundMode::Auto).generate(&path).unwrap();

    assert_eq!(result.file_type, artproof::FileKind::Vector);
    // 960x480 at 300 dpi rasterizes to 3000x1500, then fits the 1200 box.
    assert_eq!((result.width, result.height), (1200, 600));
    assert!(result.stitches.is_none());

    // Solid black content: auto resolves to the light ground.
    assert!(result.brightness < 10.0);
    assert_eq!(result.background, BackgroundMode::Light);

    // Physical size at the default 300 dpi.
    let phys = result.physical_size.unwrap();
    assert_eq!(phys.width_inches, 4.0);
    assert_eq!(phys.height_inches, 2.0);

    // No color operators in the markup, so the byte scan reports absence and
    // the sampled fallback takes over with black.
    assert!(result.vector_colors.is_none());
    let sampled = result.sampled_colors.as_ref().unwrap();
    assert_eq!(sampled[0].name, "Black");
    assert!(sampled[0].proportion > 0.9);
    assert_eq!(sampled[0].cmyk.k, 100);

    // The PNG decodes to the reported size, and the bottom-right corner
    // carries the watermark backing over the black artwork.
    let decoded = image::load_from_memory(&result.png).unwrap().into_rgb8();
    assert_eq!(decoded.dimensions(), (1200, 600));
    let marked = decoded
        .enumerate_pixels()
        .filter(|(x, y, px)| *x >= 600 && *y >= 300 && px.0 != [0, 0, 0])
        .count();
    assert!(marked > 0, "watermark missing from the bottom-right region");

    // No converter for a scalable companion on an empty toolchain.
    assert!(result.pdf_unavailable());
    assert_eq!(result.size_kb, (result.png.len() as f64 / 1024.0 * 100.0).round() / 100.0);
}

#[test]
fn transparent_regions_composite_over_the_chosen_ground() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="400">
  <rect x="0" y="0" width="200" height="400" fill="#ffffff"/>
</svg>"##;
    let dir = tempfile::tempdir().unwrap();
    let path = write_svg(&dir, "half.svg", svg);

    let result = pipeline(BackgroundMode::Dark).generate(&path).unwrap();
    assert_eq!(result.background, BackgroundMode::Dark);

    let decoded = image::load_from_memory(&result.png).unwrap().into_rgb8();
    // Left half is the white artwork, right half shows the dark ground.
    assert_eq!(decoded.get_pixel(10, 10).0, [255, 255, 255]);
    assert_eq!(decoded.get_pixel(decoded.width() - 10, 10).0, [45, 45, 48]);
}

#[test]
fn transparent_mode_keeps_the_alpha_channel() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="300">
  <rect x="0" y="0" width="100" height="100" fill="#336699"/>
</svg>"##;
    let dir = tempfile::tempdir().unwrap();
    let path = write_svg(&dir, "alpha.svg", svg);

    let result = pipeline(BackgroundMode::Transparent).generate(&path).unwrap();
    let decoded = image::load_from_memory(&result.png).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgba8);
    let rgba = decoded.into_rgba8();
    assert_eq!(rgba.get_pixel(rgba.width() - 1, 0)[3], 0);
}

#[test]
fn embedded_color_operators_win_over_sampling() {
    // SVG is scannable text; plant PostScript-style operators in a comment to
    // exercise the byte-level scan on a constructed fixture.
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="300">
  <!-- 0.5 0.2 0.8 0.0 setcmykcolor
       PANTONE 293 U -->
  <rect x="0" y="0" width="300" height="300" fill="#ff0000"/>
</svg>"##;
    let dir = tempfile::tempdir().unwrap();
    let path = write_svg(&dir, "tagged.svg", svg);

    let result = pipeline(BackgroundMode::Auto).generate(&path).unwrap();
    let colors = result.vector_colors.as_ref().unwrap();
    assert_eq!(colors.pantone, vec!["PANTONE 293 U"]);
    assert_eq!(colors.cmyk.len(), 1);
    assert_eq!(colors.cmyk[0].c, 50);
    // Extraction succeeded, so the sampled fallback never runs.
    assert!(result.sampled_colors.is_none());
}
