//! Boundary detection on 1-D ink profiles.
//!
//! A threshold scan with hysteresis turns a profile into raw region marks;
//! normalization then prunes and pads them into final boundaries.
use crate::config::BorderConfig;
use crate::error::{Result, SegmentationError};
use crate::models::BoundaryMark;
use crate::segmentation::histogram::Histogram;

/// Scan a profile for regions where `profile[i] / max` crosses `threshold`.
///
/// A region opens on its first in-region sample. It closes only after
/// `gap_tolerance` consecutive out-of-region samples (fewer near the far
/// edge), and the closing mark is the last in-region sample. With
/// `inverted`, regions are the low-density stretches and close on the first
/// dense sample. The first and last positions never become marks, so a low
/// stretch running into the far edge closes on its last sample instead.
pub fn scan_axis(profile: &[u32], max: u32, threshold: f64, inverted: bool, gap_tolerance: usize) -> Vec<BoundaryMark> {
    let len = profile.len();
    let mut marks = Vec::new();
    let mut in_region = false;
    let mut step = 0usize;
    let mut last_hit = 0usize;

    for (i, &value) in profile.iter().enumerate() {
        let ratio = if max == 0 { 0.0 } else { value as f64 / max as f64 };
        let interior = i != 0 && i + 1 != len;
        let hit = interior && if inverted { ratio < threshold } else { ratio > threshold };

        if hit {
            step = 0;
            last_hit = i;
            if !in_region {
                in_region = true;
                marks.push(BoundaryMark::soft(i as u32));
            }
        } else if in_region && inverted {
            in_region = false;
            let close = if interior { i } else { last_hit };
            marks.push(BoundaryMark::soft(close as u32));
        } else if in_region {
            step += 1;
            if step >= gap_tolerance.min(len - i) {
                in_region = false;
                marks.push(BoundaryMark::soft(last_hit as u32));
            }
        }
    }

    marks
}

/// Column scan over a histogram's column profile.
pub fn scan_columns(hist: &Histogram, threshold: f64, gap_tolerance: usize) -> Vec<BoundaryMark> {
    scan_axis(hist.col_profile(), hist.col_ink_max(), threshold, false, gap_tolerance)
}

/// Row scan over a histogram's row profile.
///
/// Besides the hysteresis scan, any interior row whose run value exceeds
/// `rule_threshold` of the raster width is a solid rule and is emitted at
/// once as a strict mark.
pub fn scan_rows(hist: &Histogram, threshold: f64, rule_threshold: f64, gap_tolerance: usize) -> Vec<BoundaryMark> {
    let profile = hist.row_profile();
    let runs = hist.row_run();
    let max = hist.row_ink_max();
    let width = hist.width() as f64;
    let len = profile.len();

    let mut marks = Vec::new();
    let mut in_region = false;
    let mut step = 0usize;
    let mut last_hit = 0usize;

    for (i, &value) in profile.iter().enumerate() {
        let interior = i != 0 && i + 1 != len;

        if interior && runs[i] as f64 / width > rule_threshold {
            marks.push(BoundaryMark::strict(i as u32));
            continue;
        }

        let ratio = if max == 0 { 0.0 } else { value as f64 / max as f64 };
        if interior && ratio > threshold {
            step = 0;
            last_hit = i;
            if !in_region {
                in_region = true;
                marks.push(BoundaryMark::soft(i as u32));
            }
        } else if in_region {
            step += 1;
            if step >= gap_tolerance.min(len - i) {
                in_region = false;
                marks.push(BoundaryMark::soft(last_hit as u32));
            }
        }
    }

    marks
}

/// Turn raw column marks (start/end alternating) into region pairs.
///
/// Narrow regions are dropped, the outer edges are padded, and each interior
/// gutter is either shrunk from both sides (wide gutters) or split at its
/// midpoint. Output marks are strict; strict input marks are left in place,
/// so normalizing a normalized list changes nothing.
pub fn normalize_vertical(
    raw: &[BoundaryMark],
    extent: u32,
    config: &BorderConfig,
) -> Result<Vec<(BoundaryMark, BoundaryMark)>> {
    if raw.len() < 2 {
        return Err(SegmentationError::insufficient_evidence(
            "vertical borders",
            format!("{} raw boundaries, need at least 2", raw.len()),
        ));
    }

    let mut pairs: Vec<(BoundaryMark, BoundaryMark)> = raw
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .filter(|(start, end)| end.position.saturating_sub(start.position) > config.min_region_width)
        .collect();

    if pairs.is_empty() {
        return Err(SegmentationError::insufficient_evidence(
            "vertical borders",
            format!("no region wider than {}px", config.min_region_width),
        ));
    }

    if let Some((first, _)) = pairs.first_mut() {
        if !first.strict {
            first.position = first.position.saturating_sub(config.vertical_pad);
        }
    }
    if let Some((_, last)) = pairs.last_mut() {
        if !last.strict {
            last.position = if extent.saturating_sub(last.position) < config.vertical_pad {
                extent
            } else {
                last.position + config.vertical_pad
            };
        }
    }

    for i in 1..pairs.len() {
        let prev_end = pairs[i - 1].1;
        let next_start = pairs[i].0;
        if prev_end.strict && next_start.strict {
            continue;
        }

        let gap = next_start.position.saturating_sub(prev_end.position);
        let shift = if gap > config.wide_gutter { config.gutter_shrink } else { gap / 2 };

        if !prev_end.strict {
            pairs[i - 1].1.position = prev_end.position + shift;
        }
        if !next_start.strict {
            pairs[i].0.position = next_start.position.saturating_sub(shift);
        }
    }

    Ok(pairs
        .into_iter()
        .map(|(start, end)| (BoundaryMark::strict(start.position), BoundaryMark::strict(end.position)))
        .collect())
}

/// Reduce raw row marks to the single top/bottom pair of the text block.
///
/// A rule immediately followed by a soft mark closer than
/// `rule_merge_distance` absorbs the soft mark. The widest remaining gap
/// wins and is padded outward, except on strict sides.
pub fn normalize_horizontal(
    raw: &[BoundaryMark],
    extent: u32,
    config: &BorderConfig,
) -> Result<(BoundaryMark, BoundaryMark)> {
    if raw.len() < 2 {
        return Err(SegmentationError::insufficient_evidence(
            "horizontal borders",
            format!("{} raw boundaries, need at least 2", raw.len()),
        ));
    }

    let mut buffer = raw.to_vec();
    let mut index = 0;
    while index + 1 < buffer.len() {
        let (current, next) = (buffer[index], buffer[index + 1]);
        if current.strict
            && !next.strict
            && (next.position as i64 - current.position as i64) < config.rule_merge_distance as i64
        {
            buffer.remove(index + 1);
            continue;
        }
        index += 1;
    }

    let (top, bottom) = buffer
        .windows(2)
        .map(|w| (w[0], w[1]))
        .fold(None::<(BoundaryMark, BoundaryMark)>, |best, (a, b)| match best {
            Some((ba, bb)) if bb.position as i64 - ba.position as i64 >= b.position as i64 - a.position as i64 => {
                Some((ba, bb))
            }
            _ => Some((a, b)),
        })
        .ok_or_else(|| {
            SegmentationError::insufficient_evidence(
                "horizontal borders",
                "a rule line absorbed every other boundary",
            )
        })?;

    let top_pad = if top.strict { 0 } else { config.horizontal_pad };
    let bottom_pad = if bottom.strict { 0 } else { config.horizontal_pad };

    let top_position = top.position.saturating_sub(top_pad);
    let bottom_position = if extent.saturating_sub(bottom.position) > bottom_pad {
        bottom.position + bottom_pad
    } else {
        extent
    };

    Ok((BoundaryMark::strict(top_position), BoundaryMark::strict(bottom_position)))
}

/// Flatten region pairs back into a mark list.
pub fn flatten_pairs(pairs: &[(BoundaryMark, BoundaryMark)]) -> Vec<BoundaryMark> {
    pairs.iter().flat_map(|(start, end)| [*start, *end]).collect()
}

/// Column cut lines: first start, the middle of every interior gutter, last end.
pub fn column_cuts(pairs: &[(BoundaryMark, BoundaryMark)]) -> Vec<u32> {
    let Some(((first, _), (_, last))) = pairs.first().zip(pairs.last()) else {
        return Vec::new();
    };

    let mut cuts = vec![first.position];
    cuts.extend(
        pairs
            .windows(2)
            .map(|w| (w[0].1.position + w[1].0.position) / 2),
    );
    cuts.push(last.position);
    cuts
}
