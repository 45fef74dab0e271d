pub mod borders;
pub mod entries;
pub mod histogram;
pub mod patterns;
pub mod preprocessing;
pub mod skew;
pub mod splitter;

pub use borders::{column_cuts, normalize_horizontal, normalize_vertical, scan_columns, scan_rows};
pub use entries::{EntryBoundaryStrategy, KamusStrategy, LexiconStrategy, strategy_for};
pub use histogram::Histogram;
pub use patterns::{Pattern, PatternLibrary};
pub use skew::SkewEstimator;
pub use splitter::{ColumnSplitter, SplitDecision};
