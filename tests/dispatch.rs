use artproof::dispatch::{EMBROIDERY_EXTENSIONS, VECTOR_EXTENSIONS};
use artproof::is_supported;

#[test]
fn is_supported_iff_suffix_is_declared() {
    for ext in VECTOR_EXTENSIONS.iter().chain(EMBROIDERY_EXTENSIONS.iter()) {
        assert!(is_supported(&format!("logo.{ext}")), "lowercase .{ext}");
        assert!(
            is_supported(&format!("logo.{}", ext.to_ascii_uppercase())),
            "uppercase .{ext}"
        );
    }

    for name in ["logo.jpg", "logo.png", "logo.indd", "logo.docx", "logo"] {
        assert!(!is_supported(name), "{name} should be unsupported");
    }
}

#[test]
fn dispatch_performs_no_io() {
    // A path that cannot exist still classifies purely by suffix.
    assert!(is_supported("/definitely/not/here/art.SVG"));
}
