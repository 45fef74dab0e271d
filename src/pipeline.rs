//! Page driver: from a scanned page to the entries of every column.
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::SegmentationConfig;
use crate::diagnostics::{DiagnosticSink, Diagnostics, DirectorySink};
use crate::error::{Result, SegmentationError};
use crate::models::{BoundingBox, EntriesGrid, EntryRegion, LayoutType, RotationEstimate};
use crate::segmentation::borders::{self, column_cuts, normalize_horizontal, normalize_vertical};
use crate::segmentation::entries::{EntryBoundaryStrategy, strategy_for};
use crate::segmentation::histogram::Histogram;
use crate::segmentation::patterns::PatternLibrary;
use crate::segmentation::preprocessing::{self, CropRegion};
use crate::segmentation::skew::SkewEstimator;
use crate::segmentation::splitter::{ColumnSplitter, SplitDecision};

/// Rasters of the deskewed text block every column is cut from.
struct BlockRasters {
    source: DynamicImage,
    gray: image::GrayImage,
    closed: image::GrayImage,
}

/// Where the column loop stands.
enum ColumnState {
    /// Process the column between `cuts[k]` and `cuts[k + 1]`.
    Scanning(usize),
    /// Column `k` hid a gutter; re-cut the block and retry `k`.
    Resplitting { column: usize, cuts: Vec<u32> },
    Done,
}

enum ColumnOutcome {
    Entries(Vec<EntryRegion>),
    Resplit(Vec<u32>),
}

/// Configured page segmenter.
///
/// Holds no per-page state: one pipeline can process any number of pages,
/// from any number of threads.
pub struct Pipeline {
    layout: LayoutType,
    config: SegmentationConfig,
    patterns: PatternLibrary,
    strategy: Box<dyn EntryBoundaryStrategy>,
    diagnostics: Diagnostics,
}

impl Pipeline {
    /// Pipeline with default thresholds, no divider patterns and no diagnostics.
    pub fn new(layout: LayoutType) -> Self {
        let config = SegmentationConfig::default();
        Self {
            layout,
            strategy: strategy_for(layout, &config.entries),
            patterns: PatternLibrary::empty(layout),
            diagnostics: Diagnostics::disabled(),
            config,
        }
    }

    pub fn with_config(mut self, config: SegmentationConfig) -> Self {
        self.strategy = strategy_for(self.layout, &config.entries);
        self.config = config;
        self
    }

    /// Use `patterns` as divider glyphs. They must belong to the pipeline's layout.
    pub fn with_patterns(mut self, patterns: PatternLibrary) -> Result<Self> {
        if patterns.layout() != self.layout {
            return Err(SegmentationError::invalid_input(
                "patterns",
                format!("{} patterns given to a {} pipeline", patterns.layout(), self.layout),
            ));
        }
        self.patterns = patterns;
        Ok(self)
    }

    /// Replace the layout's built-in boundary strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn EntryBoundaryStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Diagnostics::new(sink);
        self
    }

    /// Save intermediate rasters into a fresh session directory under `output_dir`.
    pub fn with_debug(self, output_dir: PathBuf) -> anyhow::Result<Self> {
        let sink = DirectorySink::new(&output_dir)?;
        info!(dir = %sink.session_dir().display(), "debug output enabled");
        Ok(self.with_sink(Arc::new(sink)))
    }

    pub fn layout(&self) -> LayoutType {
        self.layout
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// Load a page from disk and segment it.
    pub fn process_path(&self, path: impl AsRef<Path>) -> Result<EntriesGrid> {
        let path = path.as_ref();
        let page = image::open(path).map_err(|e| {
            SegmentationError::invalid_input_with_source("page", format!("cannot load {}", path.display()), e)
        })?;
        self.process(&page)
    }

    /// Segment one page into dictionary entries.
    #[instrument(skip_all, fields(layout = %self.layout, width = page.width(), height = page.height()))]
    pub fn process(&self, page: &DynamicImage) -> Result<EntriesGrid> {
        let (width, height) = (page.width(), page.height());
        if width == 0 || height == 0 {
            return Err(SegmentationError::invalid_input("page", format!("empty {width}x{height} page")));
        }

        let page_cfg = &self.config.page;
        let diag = &self.diagnostics;

        diag.record(page, "00_page_source");
        let gray = preprocessing::to_grayscale(page);
        diag.record_gray(&gray, "00_page_gray");
        let denoised = preprocessing::denoise(&gray, page_cfg.denoise_radius);
        drop(gray);
        diag.record_gray(&denoised, "00_page_gray_denoised");

        let block = self.locate_text_block(&denoised)?;
        let rotation = self.estimate_rotation(&block, &denoised)?;
        let rasters = self.deskewed_block(page, &denoised, &block, rotation.angle_degrees);
        drop(denoised);

        let hist = Histogram::from_binary(&rasters.closed)?;
        let raw = borders::scan_columns(&hist, page_cfg.column_threshold, page_cfg.column_gap_tolerance);
        let pairs = normalize_vertical(&raw, block.width(), &self.config.borders)?;
        let mut cuts = column_cuts(&pairs);
        info!(columns = cuts.len().saturating_sub(1), ?cuts, "column cuts");

        let max_resplits = self.config.splitter.max_resplits;
        let mut resplits = 0usize;
        let mut entries = Vec::new();
        let mut state = ColumnState::Scanning(0);

        loop {
            state = match state {
                ColumnState::Scanning(k) if k + 1 >= cuts.len() => ColumnState::Done,
                ColumnState::Scanning(k) => match self.process_column(k, &cuts, &rasters, resplits < max_resplits)? {
                    ColumnOutcome::Entries(found) => {
                        debug!(column = k, entries = found.len(), "column done");
                        entries.extend(found);
                        ColumnState::Scanning(k + 1)
                    }
                    ColumnOutcome::Resplit(new_cuts) => ColumnState::Resplitting {
                        column: k,
                        cuts: new_cuts,
                    },
                },
                ColumnState::Resplitting { column, cuts: new_cuts } => {
                    resplits += 1;
                    info!(column, resplits, cuts = ?new_cuts, "column hid a gutter, re-cutting block");
                    cuts = new_cuts;
                    ColumnState::Scanning(column)
                }
                ColumnState::Done => break,
            };
        }

        info!(
            columns = cuts.len().saturating_sub(1),
            entries = entries.len(),
            angle = rotation.angle_degrees,
            "page segmented"
        );

        Ok(EntriesGrid {
            layout: self.layout,
            block: BoundingBox {
                x: block.x0,
                y: block.y0,
                width: block.width(),
                height: block.height(),
            },
            rotation,
            vertical_lines: cuts,
            entries,
        })
    }

    /// Text block of the page: outer column borders and the row band.
    fn locate_text_block(&self, denoised: &image::GrayImage) -> Result<CropRegion> {
        let page_cfg = &self.config.page;
        let (width, height) = denoised.dimensions();

        let thresholded = preprocessing::adaptive_threshold(denoised, page_cfg.page_block_radius, page_cfg.adaptive_offset);
        self.diagnostics.record_gray(&thresholded, "00_page_gray_thresholded");

        let mut hist = Histogram::from_binary(&thresholded)?;
        hist.clamp_negative_row_runs();

        let raw_columns = borders::scan_columns(&hist, page_cfg.column_threshold, page_cfg.column_gap_tolerance);
        let raw_rows = borders::scan_rows(
            &hist,
            page_cfg.row_threshold,
            page_cfg.page_rule_threshold,
            page_cfg.page_row_tolerance,
        );
        debug!(columns = raw_columns.len(), rows = raw_rows.len(), "raw page borders");

        let pairs = normalize_vertical(&raw_columns, width, &self.config.borders)?;
        let (top, bottom) = normalize_horizontal(&raw_rows, height, &self.config.borders)?;

        let (Some((left, _)), Some((_, right))) = (pairs.first(), pairs.last()) else {
            return Err(SegmentationError::insufficient_evidence("text block", "no column borders"));
        };

        let block = CropRegion::checked(
            left.position,
            right.position,
            top.position,
            bottom.position,
            width,
            height,
            "text block",
        )?;
        debug!(?block, "text block");
        if self.diagnostics.is_enabled() {
            self.diagnostics
                .record_gray(&block.crop_gray(denoised), "01_page_text_block");
        }
        Ok(block)
    }

    fn estimate_rotation(&self, block: &CropRegion, denoised: &image::GrayImage) -> Result<RotationEstimate> {
        let page_cfg = &self.config.page;

        let block_gray = block.crop_gray(denoised);
        self.diagnostics.record_gray(&block_gray, "02_page_interested_area");
        let filtered = preprocessing::threshold_with_filter(&block_gray, page_cfg.filter_radius, page_cfg.filter_offset);
        self.diagnostics.record_gray(&filtered, "02_page_interested_area_thresholded");
        let closed = preprocessing::close(&filtered, page_cfg.close_radius, 0);
        self.diagnostics.record_gray(&closed, "02_page_interested_area_thresholded_closed");

        let (rotation, lines) = SkewEstimator::new(&self.config.skew).estimate(&closed);
        debug!(segments = lines.len(), angle = rotation.angle_degrees, "rotation estimated");

        if rotation.supporting_lines.is_empty() && self.config.skew.require_lines {
            return Err(SegmentationError::insufficient_evidence(
                "skew",
                format!("none of {} line segments is near vertical", lines.len()),
            ));
        }
        Ok(rotation)
    }

    /// Rotate the whole page, then cut the text block out again.
    fn deskewed_block(
        &self,
        page: &DynamicImage,
        denoised: &image::GrayImage,
        block: &CropRegion,
        angle: f64,
    ) -> BlockRasters {
        let page_cfg = &self.config.page;

        let (source, gray) = if angle == 0.0 {
            (block.crop_color(page), block.crop_gray(denoised))
        } else {
            let rotated_page = preprocessing::rotate_page(page, angle);
            let rotated_gray = preprocessing::rotate_gray(denoised, angle);
            (block.crop_color(&rotated_page), block.crop_gray(&rotated_gray))
        };

        self.diagnostics.record(&source, "03_page_rotated_block");

        let thresholded =
            preprocessing::adaptive_threshold(&gray, page_cfg.rotated_block_radius, page_cfg.adaptive_offset);
        let closed = preprocessing::close(&thresholded, page_cfg.close_radius, page_cfg.rotated_close_erode);
        self.diagnostics.record_gray(&closed, "02_page_rotated_page_closed");

        BlockRasters { source, gray, closed }
    }

    fn process_column(
        &self,
        k: usize,
        cuts: &[u32],
        rasters: &BlockRasters,
        allow_resplit: bool,
    ) -> Result<ColumnOutcome> {
        let page_cfg = &self.config.page;
        let (block_width, block_height) = rasters.closed.dimensions();

        let region = CropRegion::checked(cuts[k], cuts[k + 1], 0, block_height, block_width, block_height, "column")?;
        let column_closed = region.crop_gray(&rasters.closed);
        self.diagnostics
            .record_gray(&column_closed, &format!("04_column_{k}_thresholded_closed"));

        let mut hist = Histogram::from_binary(&column_closed)?;
        hist.clamp_negative_row_runs();

        match ColumnSplitter::new(&self.config.splitter).evaluate(&hist, region.x0, cuts) {
            SplitDecision::Resplit(new_cuts) if allow_resplit => return Ok(ColumnOutcome::Resplit(new_cuts)),
            SplitDecision::Resplit(_) => {
                warn!(column = k, "resplit limit reached, keeping current columns");
            }
            SplitDecision::Keep => {}
        }

        let raw_rows = borders::scan_rows(
            &hist,
            page_cfg.row_threshold,
            page_cfg.column_rule_threshold,
            page_cfg.column_row_tolerance,
        );
        let (top, bottom) = normalize_horizontal(&raw_rows, region.height(), &self.config.borders)?;
        let rows = CropRegion::checked(
            0,
            region.width(),
            top.position,
            bottom.position,
            region.width(),
            region.height(),
            "column rows",
        )?;

        let column_source = region.crop_color(&rasters.source);
        let column_gray = region.crop_gray(&rasters.gray);
        let final_source = rows.crop_color(&column_source);
        let final_gray = rows.crop_gray(&column_gray);
        self.diagnostics.record(&final_source, &format!("05_column_{k}_final_source"));

        let boundaries = self.strategy.compute_entry_boundaries(
            &final_gray,
            &self.patterns,
            &self.diagnostics.scoped(format!("05_column_{k}_")),
        )?;
        debug!(column = k, strategy = self.strategy.name(), rows = ?boundaries.rows(), "entry boundaries");

        let min_height = self.config.entries.min_entry_height;
        let final_height = final_source.height();
        let mut entries = Vec::new();

        for (top_row, bottom_row) in boundaries.spans(min_height) {
            let bottom_row = bottom_row.min(final_height);
            if bottom_row <= top_row || bottom_row - top_row < min_height {
                continue;
            }

            let sequence = entries.len() + 1;
            let image = final_source.crop_imm(0, top_row, final_source.width(), bottom_row - top_row);
            self.diagnostics
                .record(&image, &format!("07_column_{k}_entry_{sequence}"));

            entries.push(EntryRegion {
                column: k,
                sequence,
                bbox: BoundingBox {
                    x: region.x0,
                    y: rows.y0 + top_row,
                    width: region.width(),
                    height: bottom_row - top_row,
                },
                image,
            });
        }

        Ok(ColumnOutcome::Entries(entries))
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("layout", &self.layout)
            .field("patterns", &self.patterns.len())
            .field("strategy", &self.strategy.name())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}
