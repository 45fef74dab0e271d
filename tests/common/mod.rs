mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from dictseg for tests
pub use dictseg::config::{BorderConfig, EntryConfig, SegmentationConfig, SkewConfig, SplitterConfig};
pub use dictseg::models::{BoundaryMark, EntryBoundarySet, LayoutType, LineSegment, Point};
pub use dictseg::segmentation::histogram::Histogram;
