//! Integration tests for ink projections.
//!
//! Tests cover:
//! - Exact row/column counts versus edge-forced profiles
//! - Signed run values and their clamping
//! - Sparse per-row run lists
//! - Rejection of empty rasters

mod common;

use common::*;
use dictseg::SegmentationError;
use dictseg::segmentation::histogram::InkRun;

#[test]
fn test_counts_are_exact() -> anyhow::Result<()> {
    let mut img = blank_binary(10, 6);
    fill_rect(&mut img, 0, 10, 0, 1, INK);
    fill_rect(&mut img, 2, 5, 3, 4, INK);

    let hist = Histogram::from_binary(&img)?;

    assert_eq!(hist.row_ink(), &[10, 0, 0, 3, 0, 0]);
    assert_eq!(hist.col_ink(), &[1, 1, 2, 2, 2, 1, 1, 1, 1, 1]);
    assert_eq!(hist.ink_pixels(), 13);

    let row_total: u32 = hist.row_ink().iter().sum();
    let col_total: u32 = hist.col_ink().iter().sum();
    assert_eq!(row_total, col_total);

    Ok(())
}

#[test]
fn test_profiles_force_edges_to_zero() -> anyhow::Result<()> {
    // 1. Raster that is ink everywhere
    let mut img = blank_binary(8, 5);
    fill_rect(&mut img, 0, 8, 0, 5, INK);

    // 2. Edges are zero in the profile views only
    let hist = Histogram::from_binary(&img)?;
    assert_eq!(hist.row_profile(), &[0, 8, 8, 8, 0]);
    assert_eq!(hist.col_profile(), &[0, 5, 5, 5, 5, 5, 5, 0]);
    assert_eq!(hist.row_ink()[0], 8);

    // 3. Maxima come from the profile views
    assert_eq!(hist.row_ink_max(), 8);
    assert_eq!(hist.col_ink_max(), 5);

    Ok(())
}

#[test]
fn test_any_nonzero_pixel_is_ink() -> anyhow::Result<()> {
    let mut img = blank_binary(4, 3);
    img.put_pixel(1, 1, image::Luma([1]));
    img.put_pixel(2, 1, image::Luma([128]));

    let hist = Histogram::from_binary(&img)?;
    assert_eq!(hist.row_ink()[1], 2);

    Ok(())
}

#[test]
fn test_row_run_marks_solid_rules() -> anyhow::Result<()> {
    // Row 1: solid rule. Row 3: sparse dots.
    let mut img = blank_binary(20, 5);
    fill_rect(&mut img, 0, 20, 1, 2, INK);
    for x in (0..20).step_by(4) {
        img.put_pixel(x, 3, INK);
    }

    let mut hist = Histogram::from_binary(&img)?;
    assert_eq!(hist.row_run()[1], 20);
    assert_eq!(hist.row_run()[3], 5 - 15);
    assert_eq!(hist.row_run()[0], 0);
    assert_eq!(hist.row_run_max(), 20);

    hist.clamp_negative_row_runs();
    assert_eq!(hist.row_run()[3], -1);
    assert_eq!(hist.row_run()[1], 20);

    Ok(())
}

#[test]
fn test_col_run_counts_background_too() -> anyhow::Result<()> {
    let mut img = blank_binary(3, 10);
    fill_rect(&mut img, 1, 2, 0, 8, INK);

    let hist = Histogram::from_binary(&img)?;
    assert_eq!(hist.col_run(), &[-10, 6, -10]);
    assert_eq!(hist.col_run_max(), 6);

    Ok(())
}

#[test]
fn test_row_runs_are_sparse() -> anyhow::Result<()> {
    let mut img = blank_binary(12, 4);
    fill_rect(&mut img, 1, 4, 2, 3, INK);
    fill_rect(&mut img, 7, 12, 2, 3, INK);

    let hist = Histogram::from_binary(&img)?;
    assert!(hist.row_runs(0).is_empty());
    assert_eq!(
        hist.row_runs(2),
        &[InkRun { start: 1, end: 4 }, InkRun { start: 7, end: 12 }]
    );
    assert!(hist.row_runs(99).is_empty());

    Ok(())
}

#[test]
fn test_empty_raster_is_rejected() {
    let result = Histogram::from_binary(&blank_binary(0, 10));
    assert!(matches!(
        result,
        Err(SegmentationError::InvalidInput { stage: "projection", .. })
    ));
}
