//! Divider glyph templates and their matching inside a column.
use image::GrayImage;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SegmentationError};
use crate::models::{LayoutType, Segment};
use crate::segmentation::preprocessing;

/// One divider glyph raster.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub raster: GrayImage,
}

/// The divider glyphs of one dictionary layout.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    layout: LayoutType,
    patterns: Vec<Pattern>,
}

impl PatternLibrary {
    pub fn new(layout: LayoutType, patterns: Vec<Pattern>) -> Self {
        Self { layout, patterns }
    }

    /// A library without glyphs; entry boundaries then come from gaps alone.
    pub fn empty(layout: LayoutType) -> Self {
        Self::new(layout, Vec::new())
    }

    /// File stem prefix of this layout's glyph files.
    pub fn file_prefix(layout: LayoutType) -> &'static str {
        match layout {
            LayoutType::Kamus => "divide_template",
            LayoutType::Lexicon => "lx_divide_template",
        }
    }

    /// Load `<prefix>.png`, `<prefix>_2.png`, ... from `dir`, ordered by suffix.
    ///
    /// A stem without a numeric suffix counts as number 1.
    pub fn from_directory(dir: impl AsRef<Path>, layout: LayoutType) -> Result<Self> {
        let dir = dir.as_ref();
        let prefix = Self::file_prefix(layout);

        let entries = std::fs::read_dir(dir).map_err(|e| {
            SegmentationError::invalid_input_with_source("patterns", format!("cannot read {}", dir.display()), e)
        })?;

        let mut numbered: Vec<(u32, String, std::path::PathBuf)> = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| SegmentationError::invalid_input_with_source("patterns", "cannot list directory", e))?
                .path();

            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_png {
                continue;
            }

            let number = if stem == prefix {
                Some(1)
            } else {
                stem.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .and_then(|n| n.parse::<u32>().ok())
            };
            if let Some(number) = number {
                numbered.push((number, stem.to_string(), path));
            }
        }
        numbered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut patterns = Vec::with_capacity(numbered.len());
        for (_, name, path) in numbered {
            let raster = image::open(&path)
                .map_err(|e| {
                    SegmentationError::invalid_input_with_source(
                        "patterns",
                        format!("cannot decode {}", path.display()),
                        e,
                    )
                })?
                .to_luma8();
            if raster.width() == 0 || raster.height() == 0 {
                return Err(SegmentationError::invalid_input(
                    "patterns",
                    format!("{} is empty", path.display()),
                ));
            }
            patterns.push(Pattern { name, raster });
        }

        info!(layout = %layout, count = patterns.len(), dir = %dir.display(), "loaded divider patterns");
        Ok(Self::new(layout, patterns))
    }

    pub fn layout(&self) -> LayoutType {
        self.layout
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Locate divider glyphs in a grayscale column, sorted top to bottom.
    ///
    /// A match must score above `confidence`. Within one pattern, a match
    /// less than one glyph height below the previous accepted match is
    /// dropped, as is any match starting above the previous match's bottom
    /// once all patterns are merged. With `min_x`, only matches right of it
    /// are considered and the matches are grouped by horizontal overlap; the
    /// rightmost group is returned.
    pub fn find_dividers(&self, column: &GrayImage, confidence: f32, min_x: Option<u32>) -> Vec<Segment> {
        let mut found: Vec<Segment> = Vec::new();

        for pattern in &self.patterns {
            let Some(scores) = preprocessing::match_template_ncc(column, &pattern.raster) else {
                debug!(pattern = %pattern.name, "pattern larger than column, skipped");
                continue;
            };
            let (tw, th) = pattern.raster.dimensions();

            let mut last: Option<u32> = None;
            for (x, y, score) in scores.enumerate_pixels() {
                // Flat windows score 0.
                let accepted = score[0] > confidence && min_x.is_none_or(|m| x > m);
                if !accepted {
                    continue;
                }
                if last.is_none_or(|l| y - l > th) {
                    found.push(Segment::new((x, y), (x + tw, y + th)));
                    last = Some(y);
                }
            }
        }

        found.sort_by_key(Segment::top);

        let mut deduped: Vec<Segment> = Vec::with_capacity(found.len());
        for (i, segment) in found.iter().enumerate() {
            if i == 0 || segment.top() > found[i - 1].bottom() {
                deduped.push(*segment);
            }
        }

        if min_x.is_none() || deduped.is_empty() {
            return deduped;
        }

        let mut groups: Vec<(Segment, Vec<Segment>)> = Vec::new();
        for segment in deduped {
            match groups.iter_mut().find(|(key, _)| key.horizontal_overlap(&segment) > 0) {
                Some((_, members)) => members.push(segment),
                None => groups.push((segment, vec![segment])),
            }
        }

        let mut best: Option<(Segment, Vec<Segment>)> = None;
        for (key, members) in groups {
            if best.as_ref().is_none_or(|(b, _)| key.left() > b.left()) {
                best = Some((key, members));
            }
        }
        best.map(|(_, members)| members).unwrap_or_default()
    }
}
