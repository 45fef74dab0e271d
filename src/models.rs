use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Indent values above this are treated as "no indentation signal".
pub const INDENT_SANITY_CAP: u32 = 100;

/// Dictionary layout; selects the divider patterns and the entry-boundary strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    /// Entries separated by divider glyphs near the right margin.
    Kamus,
    /// Entries separated by indentation, with occasional divider glyphs.
    Lexicon,
}

impl std::fmt::Display for LayoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutType::Kamus => write!(f, "kamus"),
            LayoutType::Lexicon => write!(f, "lexicon"),
        }
    }
}

/// A candidate boundary on one axis.
///
/// `strict` marks come from the solid-rule test (or from normalization,
/// which promotes its output) and are never padded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryMark {
    pub position: u32,
    pub strict: bool,
}

impl BoundaryMark {
    pub fn soft(position: u32) -> Self {
        Self { position, strict: false }
    }

    pub fn strict(position: u32) -> Self {
        Self { position, strict: true }
    }
}

/// A point on a 1-D signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMagnitude {
    pub position: u32,
    pub magnitude: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        let dx = (self.end.x - self.start.x) as f64;
        let dy = (self.end.y - self.start.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle from vertical in degrees, `atan2(dx, dy)`.
    pub fn angle_from_vertical(&self) -> f64 {
        let dx = (self.end.x - self.start.x) as f64;
        let dy = (self.end.y - self.start.y) as f64;
        dx.atan2(dy).to_degrees()
    }

    pub fn midpoint_x(&self) -> i32 {
        (self.start.x + self.end.x) / 2
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RotationEstimate {
    pub angle_degrees: f64,
    pub supporting_lines: Vec<LineSegment>,
}

/// Rectangular sub-region of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub top_left: (u32, u32),
    pub bottom_right: (u32, u32),
    /// Leftmost ink column inside the vertical middle third, 0 when unknown.
    pub indent: u32,
}

impl Segment {
    /// A segment with no indentation signal (divider matches, raw regions).
    pub fn new(top_left: (u32, u32), bottom_right: (u32, u32)) -> Self {
        Self {
            top_left,
            bottom_right,
            indent: 0,
        }
    }

    /// A segment whose indent is read from per-row start points.
    ///
    /// Only non-zero start points count. The first and last thirds are
    /// skipped so ascenders and descenders of neighbouring entries do not
    /// leak in.
    pub fn with_start_points(top_left: (u32, u32), bottom_right: (u32, u32), start_points: &[u32]) -> Self {
        let top = top_left.1 as usize;
        let height = bottom_right.1.saturating_sub(top_left.1) as usize;

        let rows: Vec<u32> = start_points
            .iter()
            .skip(top)
            .take(height)
            .copied()
            .filter(|&sp| sp != 0)
            .collect();

        let third = rows.len().div_ceil(3);
        let indent = rows
            .iter()
            .skip(third)
            .take(third)
            .min()
            .copied()
            .filter(|&sp| sp <= INDENT_SANITY_CAP)
            .unwrap_or(0);

        Self {
            top_left,
            bottom_right,
            indent,
        }
    }

    pub fn top(&self) -> u32 {
        self.top_left.1
    }

    pub fn bottom(&self) -> u32 {
        self.bottom_right.1
    }

    pub fn left(&self) -> u32 {
        self.top_left.0
    }

    pub fn right(&self) -> u32 {
        self.bottom_right.0
    }

    pub fn width(&self) -> u32 {
        self.right().saturating_sub(self.left())
    }

    pub fn height(&self) -> u32 {
        self.bottom().saturating_sub(self.top())
    }

    /// Length of the horizontal overlap with `other`; negative when disjoint.
    pub fn horizontal_overlap(&self, other: &Segment) -> i64 {
        self.right().min(other.right()) as i64 - self.left().max(other.left()) as i64
    }
}

/// Sorted, de-duplicated row positions separating entries inside a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryBoundarySet {
    rows: Vec<u32>,
}

impl EntryBoundarySet {
    pub fn new(mut rows: Vec<u32>) -> Self {
        rows.sort_unstable();
        rows.dedup();
        Self { rows }
    }

    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Adjacent pairs at least `min_height` apart; shorter pairs are noise.
    pub fn spans(&self, min_height: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rows
            .windows(2)
            .map(|w| (w[0], w[1]))
            .filter(move |(top, bottom)| bottom - top >= min_height)
    }
}

/// Bounding box in text-block coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One dictionary entry cut out of a column.
#[derive(Clone, Serialize)]
pub struct EntryRegion {
    pub column: usize,
    /// 1-based position inside the column.
    pub sequence: usize,
    pub bbox: BoundingBox,
    #[serde(skip)]
    pub image: DynamicImage,
}

impl std::fmt::Debug for EntryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryRegion")
            .field("column", &self.column)
            .field("sequence", &self.sequence)
            .field("bbox", &self.bbox)
            .finish_non_exhaustive()
    }
}

/// Result of segmenting one page.
#[derive(Debug, Clone, Serialize)]
pub struct EntriesGrid {
    pub layout: LayoutType,
    /// Text block in deskewed page coordinates.
    pub block: BoundingBox,
    pub rotation: RotationEstimate,
    /// Column cut lines in text-block coordinates.
    pub vertical_lines: Vec<u32>,
    pub entries: Vec<EntryRegion>,
}

impl EntriesGrid {
    pub fn column_count(&self) -> usize {
        self.vertical_lines.len().saturating_sub(1)
    }

    pub fn entries_in_column(&self, column: usize) -> impl Iterator<Item = &EntryRegion> {
        self.entries.iter().filter(move |e| e.column == column)
    }
}
