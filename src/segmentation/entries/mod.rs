//! Entry boundary detection inside a single column.
//!
//! Each dictionary layout marks where one entry ends and the next begins
//! differently, so the detection is a strategy picked by [`LayoutType`].
mod kamus;
mod lexicon;

pub use kamus::{KamusStrategy, snap_to_gap};
pub use lexicon::LexiconStrategy;

use image::GrayImage;

use crate::config::EntryConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::models::{EntryBoundarySet, LayoutType};
use crate::segmentation::patterns::PatternLibrary;
use crate::segmentation::preprocessing::{self, INK};

/// Turns a grayscale column into the rows separating its entries.
pub trait EntryBoundaryStrategy: Send + Sync {
    /// Layout this strategy handles
    fn layout(&self) -> LayoutType;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;

    fn compute_entry_boundaries(
        &self,
        column: &GrayImage,
        patterns: &PatternLibrary,
        diagnostics: &Diagnostics,
    ) -> Result<EntryBoundarySet>;
}

/// Strategy for `layout` using the thresholds in `config`.
pub fn strategy_for(layout: LayoutType, config: &EntryConfig) -> Box<dyn EntryBoundaryStrategy> {
    match layout {
        LayoutType::Kamus => Box::new(KamusStrategy::new(config.clone())),
        LayoutType::Lexicon => Box::new(LexiconStrategy::new(config.clone())),
    }
}

/// Consecutive blank-ish rows of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapSegment {
    rows: Vec<u32>,
}

impl GapSegment {
    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    pub fn first(&self) -> u32 {
        self.rows.first().copied().unwrap_or(0)
    }

    pub fn last(&self) -> u32 {
        self.rows.last().copied().unwrap_or(0)
    }

    /// Rounded mean row.
    pub fn center(&self) -> u32 {
        if self.rows.is_empty() {
            return 0;
        }
        (self.sum() as f64 / self.rows.len() as f64).round() as u32
    }

    /// Truncated mean row.
    pub fn truncated_center(&self) -> u32 {
        if self.rows.is_empty() {
            return 0;
        }
        (self.sum() / self.rows.len() as u64) as u32
    }

    fn sum(&self) -> u64 {
        self.rows.iter().map(|&r| r as u64).sum()
    }
}

/// Thresholds of one gap projection.
#[derive(Debug, Clone, Copy)]
pub struct GapParams {
    /// Rows below this percentage of the reference density are gaps.
    pub percent: f64,
    /// Rows whose raw sum is below this are gaps regardless of percentage.
    pub row_sum_floor: u64,
    /// Gap rows at most this far apart belong to the same segment.
    pub merge_distance: u32,
}

/// Group the low-density rows of a binary column into gap segments.
///
/// Row sums are compared against the densest row. With `end_points`, each
/// row is first divided by its own rightmost ink column, so that short last
/// lines of a paragraph do not read as gaps.
pub fn gap_segments(binary: &GrayImage, params: GapParams, end_points: Option<&[u32]>) -> Vec<GapSegment> {
    let sums = preprocessing::row_sums(binary);

    let Some((max_row, &max)) = sums
        .iter()
        .enumerate()
        .fold(None::<(usize, &u64)>, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
    else {
        return Vec::new();
    };

    let end_at = |row: usize| end_points.and_then(|e| e.get(row).copied()).unwrap_or(1) as f64;
    let scale = match end_points {
        Some(_) if end_at(max_row) > 0.0 => max as f64 / end_at(max_row),
        _ => max as f64,
    };

    let mut segments: Vec<GapSegment> = Vec::new();
    for (row, &sum) in sums.iter().enumerate() {
        let reference = scale * end_at(row);
        let percent = if reference > 0.0 { sum as f64 * 100.0 / reference } else { 0.0 };
        if sum >= params.row_sum_floor && percent >= params.percent {
            continue;
        }

        let row = row as u32;
        match segments.last_mut() {
            Some(segment) if row - segment.last() <= params.merge_distance => segment.rows.push(row),
            _ => segments.push(GapSegment { rows: vec![row] }),
        }
    }
    segments
}

/// Per row, the leftmost ink column in `[margin, width / divisor)`, 0 if none.
pub fn start_points(binary: &GrayImage, margin: u32, divisor: u32) -> Vec<u32> {
    let limit = binary.width() / divisor.max(1);
    (0..binary.height())
        .map(|y| {
            (margin..limit)
                .find(|&x| binary.get_pixel(x, y)[0] == INK)
                .unwrap_or(0)
        })
        .collect()
}

/// Per row, the rightmost ink column at or left of `width - margin`, 0 if none.
pub fn end_points(binary: &GrayImage, margin: u32) -> Vec<u32> {
    let width = binary.width();
    if width == 0 {
        return vec![0; binary.height() as usize];
    }
    let start = width.saturating_sub(margin).min(width - 1);
    (0..binary.height())
        .map(|y| {
            (0..=start)
                .rev()
                .find(|&x| binary.get_pixel(x, y)[0] == INK)
                .unwrap_or(0)
        })
        .collect()
}
