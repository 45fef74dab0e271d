pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod segmentation;

pub use config::SegmentationConfig;
pub use diagnostics::{DiagnosticSink, Diagnostics, DirectorySink, NullSink};
pub use error::{Result, SegmentationError};
pub use models::{
    BoundaryMark, BoundingBox, EntriesGrid, EntryBoundarySet, EntryRegion, LayoutType, RotationEstimate, Segment,
};
pub use pipeline::Pipeline;
pub use segmentation::{EntryBoundaryStrategy, PatternLibrary};
