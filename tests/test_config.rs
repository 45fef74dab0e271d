//! Integration tests for configuration loading.
//!
//! Tests cover:
//! - Tuned defaults
//! - Partial JSON overrides keeping the remaining defaults
//! - Malformed and missing configuration files

mod common;

use common::*;
use dictseg::SegmentationError;
use dictseg::config::KamusConfig;
use std::io::Write;

#[test]
fn test_defaults() {
    let config = SegmentationConfig::default();

    assert_eq!(config.borders.min_region_width, 120);
    assert_eq!(config.borders.vertical_pad, 30);
    assert_eq!(config.skew.max_angle, 3.0);
    assert!(!config.skew.require_lines);
    assert_eq!(config.splitter.max_resplits, 8);
    assert_eq!(config.entries.min_entry_height, 20);
    assert_eq!(config.entries.kamus.binarize_level, 190);
    assert_eq!(config.entries.lexicon.binarize_level, 230);
}

#[test]
fn test_divider_min_x_is_integer_ratio() {
    let kamus = KamusConfig::default();

    // 350 * (6.0 / 7.0) truncates to 299 in floating point.
    assert_eq!(kamus.divider_min_x(350), 300);
    assert_eq!(kamus.divider_min_x(200), 171);
    assert_eq!(kamus.divider_min_x(0), 0);

    let degenerate = KamusConfig {
        divider_min_x_denominator: 0,
        ..KamusConfig::default()
    };
    assert_eq!(degenerate.divider_min_x(350), 0);
}

#[test]
fn test_partial_json_keeps_other_defaults() -> anyhow::Result<()> {
    let config = SegmentationConfig::from_json_str(
        r#"{
            "skew": { "require_lines": true },
            "entries": { "kamus": { "snap_limit": 30 } }
        }"#,
    )?;

    assert!(config.skew.require_lines);
    assert_eq!(config.skew.max_angle, SkewConfig::default().max_angle);
    assert_eq!(config.entries.kamus.snap_limit, 30);
    assert_eq!(config.entries.kamus.snap_nudge, 10);
    assert_eq!(config.borders, BorderConfig::default());
    assert_eq!(config.splitter, SplitterConfig::default());

    Ok(())
}

#[test]
fn test_malformed_json_is_invalid_input() {
    let result = SegmentationConfig::from_json_str(r#"{ "skew": { "max_angle": "steep" } }"#);
    assert!(matches!(result, Err(SegmentationError::InvalidInput { stage: "config", .. })));

    let err = SegmentationConfig::from_json_str("{").unwrap_err();
    assert_eq!(err.stage(), "config");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_config_from_file() -> anyhow::Result<()> {
    // 1. Write a config overriding the entry height
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{ "entries": {{ "min_entry_height": 35 }} }}"#)?;

    // 2. Load it back
    let config = SegmentationConfig::from_json_file(file.path())?;
    assert_eq!(config.entries.min_entry_height, 35);
    assert_eq!(config.entries.blur_radius, EntryConfig::default().blur_radius);

    Ok(())
}

#[test]
fn test_missing_config_file_is_invalid_input() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let result = SegmentationConfig::from_json_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(SegmentationError::InvalidInput { stage: "config", .. })));
}

#[test]
fn test_config_reaches_the_pipeline() {
    let mut config = SegmentationConfig::default();
    config.entries.min_entry_height = 42;

    let pipeline = dictseg::Pipeline::new(LayoutType::Lexicon).with_config(config.clone());
    assert_eq!(pipeline.config(), &config);
}
