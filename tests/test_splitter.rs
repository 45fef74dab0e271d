//! Integration tests for the column splitter.
//!
//! Tests cover:
//! - Extremum detection on a column hiding three bands
//! - Resplitting into three sub-columns, which then stay put
//! - Candidate clustering and merging
//! - Never returning fewer cuts than given

mod common;

use common::*;
use dictseg::segmentation::splitter::{ColumnSplitter, SplitDecision};

#[test]
fn test_band_starts_are_extremums() -> anyhow::Result<()> {
    let config = SplitterConfig::default();
    let hist = Histogram::from_binary(&three_band_column())?;

    let extremums = ColumnSplitter::new(&config).find_extremums(&hist);
    let positions: Vec<u32> = extremums.iter().map(|e| e.position).collect();

    assert_eq!(positions, vec![40, 340, 640]);
    assert!(extremums.iter().all(|e| e.magnitude > 0));

    Ok(())
}

#[test]
fn test_merged_column_is_resplit_into_three() -> anyhow::Result<()> {
    // 1. One column spanning all three bands
    let config = SplitterConfig::default();
    let splitter = ColumnSplitter::new(&config);
    let column = three_band_column();
    let hist = Histogram::from_binary(&column)?;

    // 2. The splitter asks for a re-cut with more lines
    let cuts = vec![0, 900];
    let SplitDecision::Resplit(new_cuts) = splitter.evaluate(&hist, 0, &cuts) else {
        panic!("expected a resplit");
    };
    assert_eq!(new_cuts, vec![20, 340, 640, 900]);
    assert_eq!(new_cuts.len() - 1, 3);

    // 3. Each sub-column is stable on the next pass
    for k in 0..3 {
        let (x0, x1) = (new_cuts[k], new_cuts[k + 1]);
        let sub = image::imageops::crop_imm(&column, x0, 0, x1 - x0, column.height()).to_image();
        let sub_hist = Histogram::from_binary(&sub)?;
        assert_eq!(splitter.evaluate(&sub_hist, x0, &new_cuts), SplitDecision::Keep, "column {k}");
    }

    Ok(())
}

#[test]
fn test_flat_column_is_kept() -> anyhow::Result<()> {
    let config = SplitterConfig::default();
    let mut img = blank_binary(500, 400);
    fill_rect(&mut img, 0, 500, 0, 400, INK);
    let hist = Histogram::from_binary(&img)?;

    assert_eq!(ColumnSplitter::new(&config).evaluate(&hist, 0, &[0, 500]), SplitDecision::Keep);

    Ok(())
}

#[test]
fn test_candidates_cluster_then_merge() {
    let config = SplitterConfig::default();
    let splitter = ColumnSplitter::new(&config);

    // 0..110 cluster around the first member; 300 and 450 are closer than 200.
    assert_eq!(splitter.merge_candidates(&[110, 0, 50, 300, 450, 900]), vec![53, 300, 900]);
    assert!(splitter.merge_candidates(&[]).is_empty());
}

#[test]
fn test_resplit_never_shrinks_the_cut_list() -> anyhow::Result<()> {
    let config = SplitterConfig::default();
    let splitter = ColumnSplitter::new(&config);
    let hist = Histogram::from_binary(&three_band_column())?;

    // Many cuts already: the merged list is not longer, so nothing changes.
    let cuts = vec![0, 250, 500, 750, 900];
    match splitter.evaluate(&hist, 0, &cuts) {
        SplitDecision::Keep => {}
        SplitDecision::Resplit(new_cuts) => assert!(new_cuts.len() > cuts.len()),
    }

    Ok(())
}
