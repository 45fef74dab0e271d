//! Error types for page segmentation.
//!
//! Every failure aborts the current page. Each variant names the pipeline
//! stage that gave up and the condition it hit, so a caller can decide
//! whether to retry with relaxed thresholds.
use thiserror::Error;

/// Result type alias using [`SegmentationError`].
pub type Result<T> = std::result::Result<T, SegmentationError>;

#[derive(Debug, Error)]
pub enum SegmentationError {
    /// Empty or unreadable raster, pattern or configuration.
    #[error("invalid input at {stage}: {message}")]
    InvalidInput {
        stage: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A detector found fewer candidates than its algorithm requires.
    #[error("insufficient evidence at {stage}: {message}")]
    InsufficientEvidence { stage: &'static str, message: String },

    /// A crop computed from borders has non-positive width or height.
    #[error("degenerate geometry at {stage}: {message}")]
    DegenerateGeometry { stage: &'static str, message: String },
}

impl SegmentationError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            stage,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_input_with_source<E>(stage: &'static str, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidInput {
            stage,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn insufficient_evidence(stage: &'static str, message: impl Into<String>) -> Self {
        Self::InsufficientEvidence {
            stage,
            message: message.into(),
        }
    }

    pub fn degenerate_geometry(stage: &'static str, message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            stage,
            message: message.into(),
        }
    }

    /// Stage at which the page was abandoned.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidInput { stage, .. }
            | Self::InsufficientEvidence { stage, .. }
            | Self::DegenerateGeometry { stage, .. } => stage,
        }
    }
}
