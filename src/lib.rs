//! artproof turns uploaded artwork files into annotated PNG previews plus
//! the metadata a promotional-products workflow needs: pixel and physical
//! dimensions, embedded spot/process colors, and stitch statistics for
//! embroidery machine files.
//!
//! The public API is pipeline-oriented:
//!
//! - Probe the host once with [`Toolchain::probe`]
//! - Build a [`PreviewPipeline`]
//! - Feed it file paths and receive [`PreviewResult`] records
#![forbid(unsafe_code)]

pub mod backend;
pub mod color;
pub mod dispatch;
pub mod error;
pub mod post;
pub mod preview;
pub mod render_embroidery;
pub mod render_vector;
pub mod sampled;
pub mod stitch;
pub mod stitch_dst;
pub mod swatch;
pub mod toolchain;

pub use crate::dispatch::{classify, is_supported, FileKind};
pub use crate::error::{ProofError, ProofResult};
pub use crate::post::BackgroundMode;
pub use crate::preview::{PreviewOptions, PreviewPipeline, PreviewResult};
pub use crate::render_embroidery::EmbroideryRenderer;
pub use crate::render_vector::VectorRenderer;
pub use crate::stitch::{StitchPattern, StitchStats};
pub use crate::swatch::{ColorRecord, ColorSet, SwatchExtractor};
pub use crate::toolchain::Toolchain;
