pub type ProofResult<T> = Result<T, ProofError>;

#[derive(thiserror::Error, Debug)]
pub enum ProofError {
    /// Extension is outside both the vector and embroidery sets. The message
    /// carries user-facing guidance (what to export instead).
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Every eligible converter backend failed or was unavailable.
    #[error("conversion failed: {0}")]
    ConversionFailed(String),

    /// Stitch pattern bounds collapse to zero width or height.
    #[error("degenerate pattern: {0}")]
    DegeneratePattern(String),

    /// Swatch/color scanning failed. Non-fatal at the pipeline boundary:
    /// callers degrade to "no colors found" and continue.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Resize/composite/stamp/encode failed. Fatal, no usable image exists.
    #[error("post-process error: {0}")]
    PostProcess(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProofError {
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn conversion_failed(msg: impl Into<String>) -> Self {
        Self::ConversionFailed(msg.into())
    }

    pub fn degenerate_pattern(msg: impl Into<String>) -> Self {
        Self::DegeneratePattern(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    pub fn post_process(msg: impl Into<String>) -> Self {
        Self::PostProcess(msg.into())
    }
}
