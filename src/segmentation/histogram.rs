//! Row and column ink projections of a binary raster.
use image::GrayImage;
use std::collections::BTreeMap;

use crate::error::{Result, SegmentationError};

/// A horizontal run of ink, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkRun {
    pub start: u32,
    pub end: u32,
}

/// Ink-density profiles of a binary raster.
///
/// Built in one pass and never updated: a changed raster needs a new
/// histogram. The `*_profile` views have their first and last sample forced
/// to zero so that raster edges never read as borders; the cached maxima are
/// taken over those views.
#[derive(Debug, Clone)]
pub struct Histogram {
    width: u32,
    height: u32,
    row_ink: Vec<u32>,
    col_ink: Vec<u32>,
    row_profile: Vec<u32>,
    col_profile: Vec<u32>,
    row_run: Vec<i64>,
    col_run: Vec<i64>,
    row_runs: BTreeMap<u32, Vec<InkRun>>,
    row_ink_max: u32,
    row_run_max: i64,
    col_ink_max: u32,
    col_run_max: i64,
    ink_pixels: u64,
}

impl Histogram {
    /// Project a binary raster. Any non-zero pixel is ink.
    pub fn from_binary(binary: &GrayImage) -> Result<Self> {
        let (width, height) = binary.dimensions();
        if width == 0 || height == 0 {
            return Err(SegmentationError::invalid_input(
                "projection",
                format!("cannot project an empty {width}x{height} raster"),
            ));
        }

        let mut row_ink = vec![0u32; height as usize];
        let mut row_run = vec![0i64; height as usize];
        let mut col_ink = vec![0u32; width as usize];
        let mut col_run = vec![0i64; width as usize];
        let mut row_runs: BTreeMap<u32, Vec<InkRun>> = BTreeMap::new();
        let mut ink_pixels = 0u64;

        for (y, row) in binary.rows().enumerate() {
            let mut seen_ink = false;
            let mut in_run = false;
            let mut runs: Vec<InkRun> = Vec::new();

            for (x, pixel) in row.enumerate() {
                if pixel[0] != 0 {
                    seen_ink = true;
                    ink_pixels += 1;
                    row_ink[y] += 1;
                    row_run[y] += 1;
                    col_ink[x] += 1;
                    col_run[x] += 1;
                    if !in_run {
                        runs.push(InkRun {
                            start: x as u32,
                            end: width,
                        });
                        in_run = true;
                    }
                } else {
                    if seen_ink {
                        row_run[y] -= 1;
                    }
                    col_run[x] -= 1;
                    if in_run {
                        if let Some(run) = runs.last_mut() {
                            run.end = x as u32;
                        }
                        in_run = false;
                    }
                }
            }

            if !runs.is_empty() {
                row_runs.insert(y as u32, runs);
            }
        }

        let row_profile = force_edges(&row_ink);
        let col_profile = force_edges(&col_ink);

        Ok(Self {
            width,
            height,
            row_ink_max: row_profile.iter().copied().max().unwrap_or(0),
            row_run_max: row_run.iter().copied().max().unwrap_or(0),
            col_ink_max: col_profile.iter().copied().max().unwrap_or(0),
            col_run_max: col_run.iter().copied().max().unwrap_or(0),
            row_ink,
            col_ink,
            row_profile,
            col_profile,
            row_run,
            col_run,
            row_runs,
            ink_pixels,
        })
    }

    /// Clamp negative row run values to -1, leaving only "how solid" signal.
    pub fn clamp_negative_row_runs(&mut self) {
        for value in self.row_run.iter_mut().filter(|v| **v < 0) {
            *value = -1;
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Exact ink count per row.
    pub fn row_ink(&self) -> &[u32] {
        &self.row_ink
    }

    /// Exact ink count per column.
    pub fn col_ink(&self) -> &[u32] {
        &self.col_ink
    }

    /// Row ink counts with the first and last row forced to zero.
    pub fn row_profile(&self) -> &[u32] {
        &self.row_profile
    }

    /// Column ink counts with the first and last column forced to zero.
    pub fn col_profile(&self) -> &[u32] {
        &self.col_profile
    }

    /// Per row: ink pixels minus background pixels after the first ink pixel.
    pub fn row_run(&self) -> &[i64] {
        &self.row_run
    }

    /// Per column: ink pixels minus background pixels.
    pub fn col_run(&self) -> &[i64] {
        &self.col_run
    }

    /// Ink runs of row `y`; empty for rows without ink.
    pub fn row_runs(&self, y: u32) -> &[InkRun] {
        self.row_runs.get(&y).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_ink_max(&self) -> u32 {
        self.row_ink_max
    }

    pub fn row_run_max(&self) -> i64 {
        self.row_run_max
    }

    pub fn col_ink_max(&self) -> u32 {
        self.col_ink_max
    }

    pub fn col_run_max(&self) -> i64 {
        self.col_run_max
    }

    pub fn ink_pixels(&self) -> u64 {
        self.ink_pixels
    }
}

fn force_edges(counts: &[u32]) -> Vec<u32> {
    let mut profile = counts.to_vec();
    if let Some(first) = profile.first_mut() {
        *first = 0;
    }
    if let Some(last) = profile.last_mut() {
        *last = 0;
    }
    profile
}
