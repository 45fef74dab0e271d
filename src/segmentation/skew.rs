//! Page skew estimation from near-vertical line segments.
use image::GrayImage;
use tracing::debug;

use crate::config::SkewConfig;
use crate::models::{LineSegment, Point, RotationEstimate};
use crate::segmentation::preprocessing::{self, SegmentDetectionOptions};

/// Estimates how far a text block is rotated away from vertical.
pub struct SkewEstimator<'a> {
    config: &'a SkewConfig,
}

impl<'a> SkewEstimator<'a> {
    pub fn new(config: &'a SkewConfig) -> Self {
        Self { config }
    }

    /// Detect segments on a closed binary raster and estimate from them.
    pub fn estimate(&self, closed: &GrayImage) -> (RotationEstimate, Vec<LineSegment>) {
        let lines = preprocessing::detect_line_segments(
            closed,
            SegmentDetectionOptions {
                vote_threshold: self.config.vote_threshold,
                min_length: self.config.min_line_length,
                max_gap: self.config.max_line_gap,
            },
        );
        let estimate = self.estimate_from_segments(&lines);
        (estimate, lines)
    }

    /// Average angle of the longest clusters of near-vertical segments.
    ///
    /// Returns exactly 0 when no segment lies within the angle limit.
    pub fn estimate_from_segments(&self, lines: &[LineSegment]) -> RotationEstimate {
        let theta = self.config.max_angle;
        let mut clusters: Vec<(i32, Vec<Point>)> = Vec::new();

        for line in lines {
            let mut angle = line.angle_from_vertical();
            if angle > 90.0 {
                angle -= 180.0;
            }
            if angle <= -theta || angle >= theta {
                continue;
            }

            let key = line.midpoint_x();
            match clusters
                .iter_mut()
                .find(|(k, _)| (k - key).abs() <= self.config.cluster_distance)
            {
                Some((_, points)) => points.extend([line.start, line.end]),
                None => clusters.push((key, vec![line.start, line.end])),
            }
        }

        if clusters.is_empty() {
            debug!(lines = lines.len(), "no near-vertical segment, skipping rotation");
            return RotationEstimate::default();
        }

        let representatives: Vec<LineSegment> = clusters.iter().filter_map(|(_, points)| span(points)).collect();
        let longest = representatives.iter().map(LineSegment::length).fold(0.0, f64::max);

        let kept: Vec<LineSegment> = representatives
            .into_iter()
            .filter(|line| line.length() >= longest * self.config.keep_ratio)
            .collect();

        let angle = if kept.is_empty() {
            0.0
        } else {
            kept.iter().map(LineSegment::angle_from_vertical).sum::<f64>() / kept.len() as f64
        };

        debug!(
            clusters = clusters.len(),
            kept = kept.len(),
            angle,
            "skew estimated"
        );

        RotationEstimate {
            angle_degrees: angle,
            supporting_lines: kept,
        }
    }
}

/// Segment spanning the extreme top and bottom of a cluster, drawn top to bottom.
fn span(points: &[Point]) -> Option<LineSegment> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    let top = points.iter().find(|p| p.y == min_y)?;
    let bottom = points.iter().find(|p| p.y == max_y)?;

    Some(if bottom.x < top.x {
        LineSegment::new(Point::new(max_x, min_y), Point::new(min_x, max_y))
    } else {
        LineSegment::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    })
}
