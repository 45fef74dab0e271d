//! Tunable thresholds of the segmentation pipeline.
//!
//! Defaults are the values the pipeline was tuned with on real Kamus and
//! Lexicon scans. Every section can be partially overridden from JSON; missing
//! fields keep their defaults.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SegmentationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub page: PageConfig,
    pub borders: BorderConfig,
    pub skew: SkewConfig,
    pub splitter: SplitterConfig,
    pub entries: EntryConfig,
}

impl SegmentationConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SegmentationError::invalid_input_with_source("config", format!("cannot read {}", path.display()), e)
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| SegmentationError::invalid_input_with_source("config", "malformed configuration", e))
    }
}

/// Page-level preprocessing and block/column detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub denoise_radius: u32,
    /// Local-mean window radius for the first page binarization.
    pub page_block_radius: u32,
    /// Local-mean window radius after deskewing.
    pub rotated_block_radius: u32,
    /// A pixel is ink when it is this much darker than its local mean.
    pub adaptive_offset: i16,
    /// Box-filter radius of the background estimate used before line detection.
    pub filter_radius: u32,
    pub filter_offset: f32,
    pub close_radius: u8,
    pub rotated_close_erode: u8,
    /// Fraction of the densest column an ink column must exceed.
    pub column_threshold: f64,
    /// Below-threshold samples needed to close a column region.
    pub column_gap_tolerance: usize,
    pub row_threshold: f64,
    pub page_rule_threshold: f64,
    pub page_row_tolerance: usize,
    pub column_rule_threshold: f64,
    pub column_row_tolerance: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            denoise_radius: 1,
            page_block_radius: 6,
            rotated_block_radius: 3,
            adaptive_offset: 2,
            filter_radius: 10,
            filter_offset: 0.3,
            close_radius: 2,
            rotated_close_erode: 1,
            column_threshold: 0.1,
            column_gap_tolerance: 30,
            row_threshold: 0.05,
            page_rule_threshold: 0.5,
            page_row_tolerance: 20,
            column_rule_threshold: 0.85,
            column_row_tolerance: 30,
        }
    }
}

/// Constants of the border normalization passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    /// Regions narrower than this are noise blobs.
    pub min_region_width: u32,
    pub vertical_pad: u32,
    /// Gutters wider than this are kept as true gutters.
    pub wide_gutter: u32,
    pub gutter_shrink: u32,
    pub horizontal_pad: u32,
    /// A rule followed by a soft mark closer than this absorbs the soft mark.
    pub rule_merge_distance: u32,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            min_region_width: 120,
            vertical_pad: 30,
            wide_gutter: 60,
            gutter_shrink: 30,
            horizontal_pad: 15,
            rule_merge_distance: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkewConfig {
    /// Segments further than this from vertical (degrees) are ignored.
    pub max_angle: f64,
    pub cluster_distance: i32,
    /// Representatives shorter than this fraction of the longest are dropped.
    pub keep_ratio: f64,
    pub vote_threshold: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
    /// Fail the page instead of skipping rotation when no line is found.
    pub require_lines: bool,
}

impl Default for SkewConfig {
    fn default() -> Self {
        Self {
            max_angle: 3.0,
            cluster_distance: 10,
            keep_ratio: 0.75,
            vote_threshold: 200,
            min_line_length: 300,
            max_line_gap: 10,
            require_lines: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub flat_threshold: f64,
    pub refill_gap: usize,
    pub left_border: u32,
    pub right_border: u32,
    pub cluster_distance: u32,
    pub merge_distance: u32,
    pub max_resplits: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            flat_threshold: 200.0,
            refill_gap: 30,
            left_border: 30,
            right_border: 20,
            cluster_distance: 120,
            merge_distance: 200,
            max_resplits: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    pub blur_radius: u32,
    pub match_confidence: f32,
    pub min_entry_height: u32,
    /// Gap rows closer than this belong to the same gap segment.
    pub gap_merge_distance: u32,
    pub kamus: KamusConfig,
    pub lexicon: LexiconConfig,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            blur_radius: 5,
            match_confidence: 0.8,
            min_entry_height: 20,
            gap_merge_distance: 15,
            kamus: KamusConfig::default(),
            lexicon: LexiconConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KamusConfig {
    pub binarize_level: u8,
    pub gap_percent: f64,
    pub row_sum_floor: u64,
    /// Dividers are only searched right of
    /// `width * divider_min_x_numerator / divider_min_x_denominator`.
    pub divider_min_x_numerator: u32,
    pub divider_min_x_denominator: u32,
    pub snap_limit: u32,
    pub snap_nudge: u32,
}

impl KamusConfig {
    /// Left limit of the divider search in a column `width` pixels wide.
    pub fn divider_min_x(&self, width: u32) -> u32 {
        (width as u64 * self.divider_min_x_numerator as u64)
            .checked_div(self.divider_min_x_denominator as u64)
            .map_or(0, |x| x.min(width as u64) as u32)
    }
}

impl Default for KamusConfig {
    fn default() -> Self {
        Self {
            binarize_level: 190,
            gap_percent: 5.0,
            row_sum_floor: 160,
            divider_min_x_numerator: 6,
            divider_min_x_denominator: 7,
            snap_limit: 20,
            snap_nudge: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub binarize_level: u8,
    pub gap_percent: f64,
    pub row_sum_floor: u64,
    pub erode_iterations: u8,
    /// Columns skipped at each horizontal edge by the start/end point scans.
    pub edge_margin: u32,
    /// The start point scan stops at `width / start_scan_divisor`.
    pub start_scan_divisor: u32,
    pub divider_bottom_tolerance: u32,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            binarize_level: 230,
            gap_percent: 15.0,
            row_sum_floor: 200,
            erode_iterations: 2,
            edge_margin: 12,
            start_scan_divisor: 5,
            divider_bottom_tolerance: 5,
        }
    }
}
