use image::GrayImage;
use tracing::{debug, warn};

use super::{EntryBoundaryStrategy, GapParams, GapSegment, end_points, gap_segments, start_points};
use crate::config::EntryConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, SegmentationError};
use crate::models::{EntryBoundarySet, LayoutType, Segment};
use crate::segmentation::patterns::PatternLibrary;
use crate::segmentation::preprocessing;

/// Entries recognised by their hanging indentation.
///
/// The column is cut at every ink gap. A piece whose text starts at or
/// right of the average indentation opens a new entry; pieces starting
/// further left are continuation lines. Divider glyphs, when present,
/// override the indentation guess.
pub struct LexiconStrategy {
    config: EntryConfig,
}

impl LexiconStrategy {
    pub fn new(config: EntryConfig) -> Self {
        Self { config }
    }
}

impl EntryBoundaryStrategy for LexiconStrategy {
    fn layout(&self) -> LayoutType {
        LayoutType::Lexicon
    }

    fn name(&self) -> &str {
        "Lexicon indentation"
    }

    fn compute_entry_boundaries(
        &self,
        column: &GrayImage,
        patterns: &PatternLibrary,
        diagnostics: &Diagnostics,
    ) -> Result<EntryBoundarySet> {
        let lexicon = &self.config.lexicon;
        let (width, height) = column.dimensions();

        let blurred = preprocessing::blur(column, self.config.blur_radius);
        let binary = preprocessing::threshold_binary_inv(&blurred, lexicon.binarize_level);
        let eroded = preprocessing::erode(&binary, lexicon.erode_iterations);
        diagnostics.record_gray(&blurred, "0_blurred");
        diagnostics.record_gray(&binary, "0_blurred_thresholded");
        diagnostics.record_gray(&eroded, "0_blurred_thresholded_eroded");

        let dividers = patterns.find_dividers(column, self.config.match_confidence, None);

        let starts = start_points(&binary, lexicon.edge_margin, lexicon.start_scan_divisor);
        let ends = end_points(&binary, lexicon.edge_margin);

        let gaps = gap_segments(
            &eroded,
            GapParams {
                percent: lexicon.gap_percent,
                row_sum_floor: lexicon.row_sum_floor,
                merge_distance: self.config.gap_merge_distance,
            },
            Some(&ends),
        );
        let centers: Vec<u32> = gaps.iter().map(GapSegment::center).collect();

        let (Some(&first), Some(&last)) = (centers.first(), centers.last()) else {
            return Err(SegmentationError::insufficient_evidence(
                "lexicon entries",
                "no horizontal ink gap in column",
            ));
        };

        let tops = std::iter::once(0).chain(centers.iter().copied());
        let bottoms = centers.iter().copied().chain(std::iter::once(height));
        let pieces: Vec<Segment> = tops
            .zip(bottoms)
            .map(|(top, bottom)| Segment::with_start_points((0, top), (width, bottom), &starts))
            .collect();

        let indents = pieces.iter().map(|p| p.indent).filter(|&i| i != 0);
        let mut rows: Vec<u32> = match (indents.clone().min(), indents.max()) {
            (Some(min), Some(max)) => {
                let average = (min + max) / 2;
                pieces.iter().filter(|p| p.indent >= average).map(Segment::top).collect()
            }
            _ => {
                warn!(pieces = pieces.len(), "no indentation signal in column");
                Vec::new()
            }
        };

        for divider in &dividers {
            let bottom_limit = divider.bottom().saturating_sub(lexicon.divider_bottom_tolerance);
            rows.retain(|&row| !(row > divider.top() && row < bottom_limit));
            rows.push(divider.top());
        }

        rows.push(first);
        rows.push(last);

        debug!(
            dividers = dividers.len(),
            gaps = gaps.len(),
            pieces = pieces.len(),
            boundaries = rows.len(),
            "lexicon boundaries"
        );

        Ok(EntryBoundarySet::new(rows))
    }
}
