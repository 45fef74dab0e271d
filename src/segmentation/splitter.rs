//! Detection of under-split columns.
//!
//! A column cut that missed a gutter leaves a sharp rise in the column
//! profile where the hidden column starts. Those rises are picked out of the
//! first difference of the profile, clustered, and folded into the cut list.
use tracing::debug;

use crate::config::SplitterConfig;
use crate::models::IndexMagnitude;
use crate::segmentation::histogram::Histogram;

const SUPPRESSED: i64 = -1;

/// Outcome of checking one column for hidden gutters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitDecision {
    /// The current cuts stand.
    Keep,
    /// The block must be re-cut along these lines.
    Resplit(Vec<u32>),
}

pub struct ColumnSplitter<'a> {
    config: &'a SplitterConfig,
}

impl<'a> ColumnSplitter<'a> {
    pub fn new(config: &'a SplitterConfig) -> Self {
        Self { config }
    }

    /// Positions in `(left_border, width - right_border)` where the column
    /// profile rises sharply.
    pub fn find_extremums(&self, hist: &Histogram) -> Vec<IndexMagnitude> {
        let profile = hist.col_profile();
        let n = profile.len();
        if n == 0 {
            return Vec::new();
        }

        let mut diff = vec![SUPPRESSED; n];
        for i in 1..n {
            diff[i] = profile[i] as i64 - profile[i - 1] as i64;
        }

        let min = diff.iter().copied().min().unwrap_or(0);
        for value in diff.iter_mut().skip(1) {
            *value -= min;
        }

        let mean = diff.iter().sum::<i64>() as f64 / n as f64;
        let buffer = diff.clone();

        for value in diff.iter_mut().skip(1) {
            if (*value as f64 - mean).abs() <= self.config.flat_threshold {
                *value = SUPPRESSED;
            }
        }

        // Short suppressed stretches between two spikes belong to the spike.
        let mut last = 0usize;
        for i in 1..n {
            if diff[i] == SUPPRESSED {
                continue;
            }
            if i - last < self.config.refill_gap {
                diff[last + 1..i].copy_from_slice(&buffer[last + 1..i]);
            }
            last = i;
        }

        let width = hist.width();
        let right_limit = width.saturating_sub(self.config.right_border);

        diff.iter()
            .enumerate()
            .filter(|&(i, &magnitude)| {
                let i = i as u32;
                magnitude > 0 && i > self.config.left_border && i < right_limit
            })
            .map(|(i, &magnitude)| IndexMagnitude {
                position: i as u32,
                magnitude,
            })
            .collect()
    }

    /// Cluster sorted positions, then merge neighbouring clusters.
    ///
    /// A position joins a cluster when it is within `cluster_distance` of the
    /// cluster's first member; each cluster becomes its rounded mean. A mean
    /// closer than `merge_distance` to the one kept before it is dropped.
    pub fn merge_candidates(&self, positions: &[u32]) -> Vec<u32> {
        let mut sorted = positions.to_vec();
        sorted.sort_unstable();

        let mut clusters: Vec<(u32, Vec<u32>)> = Vec::new();
        for position in sorted {
            match clusters.last_mut() {
                Some((anchor, members)) if position - *anchor <= self.config.cluster_distance => {
                    members.push(position)
                }
                _ => clusters.push((position, vec![position])),
            }
        }

        let means: Vec<u32> = clusters
            .iter()
            .map(|(_, members)| {
                let sum: u64 = members.iter().map(|&m| m as u64).sum();
                (sum as f64 / members.len() as f64).round() as u32
            })
            .collect();

        let mut merged = means;
        let mut i = 0;
        while i + 1 < merged.len() {
            if merged[i + 1] - merged[i] < self.config.merge_distance {
                merged.remove(i + 1);
            } else {
                i += 1;
            }
        }
        merged
    }

    /// Check one column's histogram against the block's current cut list.
    ///
    /// `column_left` is the column's offset inside the block; extremums are
    /// moved into block coordinates before they are merged with `cuts`.
    pub fn evaluate(&self, hist: &Histogram, column_left: u32, cuts: &[u32]) -> SplitDecision {
        let extremums = self.find_extremums(hist);
        if extremums.is_empty() {
            return SplitDecision::Keep;
        }

        let positions: Vec<u32> = extremums
            .iter()
            .map(|e| e.position + column_left)
            .chain(cuts.iter().copied())
            .collect();
        let merged = self.merge_candidates(&positions);

        debug!(
            extremums = extremums.len(),
            current = cuts.len(),
            merged = merged.len(),
            "column split candidates"
        );

        if merged.len() > cuts.len() {
            SplitDecision::Resplit(merged)
        } else {
            SplitDecision::Keep
        }
    }
}
