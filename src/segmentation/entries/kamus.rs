use image::GrayImage;
use tracing::debug;

use super::{EntryBoundaryStrategy, GapParams, GapSegment, gap_segments};
use crate::config::EntryConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, SegmentationError};
use crate::models::{EntryBoundarySet, LayoutType};
use crate::segmentation::patterns::PatternLibrary;
use crate::segmentation::preprocessing;

/// Entries separated by divider glyphs near the right margin.
///
/// Each glyph match is aligned with the horizontal ink gap it sits in; the
/// first and last gaps of the column close the set.
pub struct KamusStrategy {
    config: EntryConfig,
}

impl KamusStrategy {
    pub fn new(config: EntryConfig) -> Self {
        Self { config }
    }
}

impl EntryBoundaryStrategy for KamusStrategy {
    fn layout(&self) -> LayoutType {
        LayoutType::Kamus
    }

    fn name(&self) -> &str {
        "Kamus divider glyphs"
    }

    fn compute_entry_boundaries(
        &self,
        column: &GrayImage,
        patterns: &PatternLibrary,
        diagnostics: &Diagnostics,
    ) -> Result<EntryBoundarySet> {
        let kamus = &self.config.kamus;

        let blurred = preprocessing::blur(column, self.config.blur_radius);
        let binary = preprocessing::threshold_binary_inv(&blurred, kamus.binarize_level);
        diagnostics.record_gray(&blurred, "blurred");
        diagnostics.record_gray(&binary, "blurred_thresholded");

        let min_x = kamus.divider_min_x(column.width());
        let dividers = patterns.find_dividers(column, self.config.match_confidence, Some(min_x));

        let gaps = gap_segments(
            &binary,
            GapParams {
                percent: kamus.gap_percent,
                row_sum_floor: kamus.row_sum_floor,
                merge_distance: self.config.gap_merge_distance,
            },
            None,
        );

        let (Some(first), Some(last)) = (gaps.first(), gaps.last()) else {
            return Err(SegmentationError::insufficient_evidence(
                "kamus entries",
                "no horizontal ink gap in column",
            ));
        };

        let centers: Vec<u32> = gaps.iter().map(GapSegment::center).collect();
        let mut rows: Vec<u32> = dividers
            .iter()
            .map(|d| snap_to_gap(d.top(), &centers, kamus.snap_limit, kamus.snap_nudge))
            .collect();
        rows.push(first.truncated_center());
        rows.push(last.truncated_center());

        debug!(
            dividers = dividers.len(),
            gaps = gaps.len(),
            boundaries = rows.len(),
            "kamus boundaries"
        );

        Ok(EntryBoundarySet::new(rows))
    }
}

/// Align a divider's top row with the gap lines around it.
///
/// Inside a pair of gap lines the closer one is picked (the upper one on a
/// tie). A picked line past `limit` is not trusted as-is: the divider row is
/// nudged up by `nudge` instead. Outside all pairs the nearest line is used.
pub fn snap_to_gap(row: u32, lines: &[u32], limit: u32, nudge: u32) -> u32 {
    let enclosing = lines.windows(2).find(|w| row > w[0] && row < w[1]);

    match enclosing {
        Some(w) => {
            let nearest = if w[1] - row >= row - w[0] { w[0] } else { w[1] };
            if nearest > limit { row.saturating_sub(nudge) } else { nearest }
        }
        None => lines
            .iter()
            .copied()
            .min_by_key(|&line| line.abs_diff(row))
            .unwrap_or(row),
    }
}
