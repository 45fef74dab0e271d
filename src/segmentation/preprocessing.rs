//! Image primitives the segmentation core relies on.
//!
//! Binary rasters produced here follow one convention: ink is 255,
//! background is 0.
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb};
use imageproc::distance_transform::Norm;
use imageproc::filter::{box_filter, median_filter};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::hough::{LineDetectionOptions, detect_lines};
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use imageproc::morphology;
use imageproc::template_matching::{MatchTemplateMethod, match_template};

use crate::error::{Result, SegmentationError};
use crate::models::{LineSegment, Point};

pub const INK: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Median filter to knock out scanner speckle
pub fn denoise(img: &GrayImage, radius: u32) -> GrayImage {
    median_filter(img, radius, radius)
}

/// Box blur
pub fn blur(img: &GrayImage, radius: u32) -> GrayImage {
    box_filter(img, radius, radius)
}

/// Local-mean binarization: a pixel is ink when it is at least `offset`
/// darker than the mean of its `(2r+1)²` neighbourhood.
pub fn adaptive_threshold(img: &GrayImage, block_radius: u32, offset: i16) -> GrayImage {
    let (width, height) = img.dimensions();
    let integral = integral_image::<_, u64>(img);

    GrayImage::from_fn(width, height, |x, y| {
        let left = x.saturating_sub(block_radius);
        let top = y.saturating_sub(block_radius);
        let right = (x + block_radius).min(width - 1);
        let bottom = (y + block_radius).min(height - 1);

        let sum = sum_image_pixels(&integral, left, top, right, bottom)[0];
        let count = ((right - left + 1) * (bottom - top + 1)) as u64;
        let mean = (sum / count) as i32;

        let value = img.get_pixel(x, y)[0] as i32;
        if value < mean - offset as i32 { Luma([INK]) } else { Luma([BACKGROUND]) }
    })
}

/// Ink where the pixel is darker than a box-blurred background estimate.
pub fn threshold_with_filter(img: &GrayImage, radius: u32, offset: f32) -> GrayImage {
    let background = box_filter(img, radius, radius);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let bg = background.get_pixel(x, y)[0] as f32;
        let value = img.get_pixel(x, y)[0] as f32;
        if bg - value - offset > 0.0 { Luma([INK]) } else { Luma([BACKGROUND]) }
    })
}

/// Inverted fixed-level binarization: pixels at or below `level` become ink.
pub fn threshold_binary_inv(img: &GrayImage, level: u8) -> GrayImage {
    threshold(img, level, ThresholdType::BinaryInverted)
}

/// Morphological closing with a disk of `radius`, optionally eroded afterwards.
pub fn close(binary: &GrayImage, radius: u8, erode_iterations: u8) -> GrayImage {
    let closed = morphology::close(binary, Norm::L2, radius);
    if erode_iterations > 0 { erode(&closed, erode_iterations) } else { closed }
}

pub fn erode(binary: &GrayImage, iterations: u8) -> GrayImage {
    morphology::erode(binary, Norm::LInf, iterations)
}

/// Rotate clockwise about the centre, filling uncovered pixels with white.
pub fn rotate_page(img: &DynamicImage, angle_degrees: f64) -> DynamicImage {
    let rgb = img.to_rgb8();
    let rotated = rotate_about_center(
        &rgb,
        angle_degrees.to_radians() as f32,
        Interpolation::Bilinear,
        Rgb([255, 255, 255]),
    );
    DynamicImage::ImageRgb8(rotated)
}

pub fn rotate_gray(img: &GrayImage, angle_degrees: f64) -> GrayImage {
    rotate_about_center(img, angle_degrees.to_radians() as f32, Interpolation::Bilinear, Luma([255]))
}

/// Sum of pixel values per row.
pub fn row_sums(img: &GrayImage) -> Vec<u64> {
    let mut sums = vec![0u64; img.height() as usize];
    for (_, y, pixel) in img.enumerate_pixels() {
        sums[y as usize] += pixel[0] as u64;
    }
    sums
}

/// Zero-mean normalized cross-correlation of `template` over `img`.
///
/// Each score is the correlation coefficient between the template and the
/// window under it, in `[-1, 1]`. Windows or templates of a single flat
/// tone have no variance and score 0. Returns `None` when the template
/// does not fit.
pub fn match_template_ncc(img: &GrayImage, template: &GrayImage) -> Option<ImageBuffer<Luma<f32>, Vec<f32>>> {
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > img.width() || th > img.height() {
        return None;
    }

    // Inverted rasters keep blank paper at 0, so the raw cross term stays small.
    let mut inv_img = img.clone();
    image::imageops::invert(&mut inv_img);
    let mut inv_template = template.clone();
    image::imageops::invert(&mut inv_template);

    let n = (tw * th) as i128;
    let t_sum: i128 = inv_template.pixels().map(|p| p[0] as i128).sum();
    let t_sq: i128 = inv_template.pixels().map(|p| (p[0] as i128).pow(2)).sum();
    let t_spread = n * t_sq - t_sum * t_sum;

    let cross = match_template(&inv_img, &inv_template, MatchTemplateMethod::CrossCorrelation);
    let sums = integral_image::<_, u64>(&inv_img);
    let squares = integral_squared_image::<_, u64>(&inv_img);

    Some(ImageBuffer::from_fn(cross.width(), cross.height(), |x, y| {
        let (right, bottom) = (x + tw - 1, y + th - 1);
        let i_sum = sum_image_pixels(&sums, x, y, right, bottom)[0] as i128;
        let i_sq = sum_image_pixels(&squares, x, y, right, bottom)[0] as i128;
        let i_spread = n * i_sq - i_sum * i_sum;
        if t_spread <= 0 || i_spread <= 0 {
            return Luma([0.0]);
        }

        let numerator = n as f64 * cross.get_pixel(x, y)[0] as f64 - (t_sum * i_sum) as f64;
        let score = numerator / ((t_spread as f64) * (i_spread as f64)).sqrt();
        Luma([score.clamp(-1.0, 1.0) as f32])
    }))
}

/// Rectangle `[x0, x1) × [y0, y1)` to cut out of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl CropRegion {
    /// Clamp to `width × height` and reject empty rectangles.
    pub fn checked(x0: u32, x1: u32, y0: u32, y1: u32, width: u32, height: u32, stage: &'static str) -> Result<Self> {
        let region = Self {
            x0: x0.min(width),
            x1: x1.min(width),
            y0: y0.min(height),
            y1: y1.min(height),
        };
        if region.x1 <= region.x0 || region.y1 <= region.y0 {
            return Err(SegmentationError::degenerate_geometry(
                stage,
                format!("crop [{x0}, {x1}) x [{y0}, {y1}) is empty inside {width}x{height}"),
            ));
        }
        Ok(region)
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn crop_gray(&self, img: &GrayImage) -> GrayImage {
        image::imageops::crop_imm(img, self.x0, self.y0, self.width(), self.height()).to_image()
    }

    pub fn crop_color(&self, img: &DynamicImage) -> DynamicImage {
        img.crop_imm(self.x0, self.y0, self.width(), self.height())
    }
}

/// Parameters of the line segment detector.
#[derive(Debug, Clone, Copy)]
pub struct SegmentDetectionOptions {
    pub vote_threshold: u32,
    pub min_length: u32,
    pub max_gap: u32,
}

/// Find straight ink segments.
///
/// Candidate lines come from the Hough transform; each line is then walked
/// across the raster and split into ink runs, bridging holes up to
/// `max_gap` samples. Runs shorter than `min_length` are dropped.
pub fn detect_line_segments(binary: &GrayImage, options: SegmentDetectionOptions) -> Vec<LineSegment> {
    let lines = detect_lines(
        binary,
        LineDetectionOptions {
            vote_threshold: options.vote_threshold,
            suppression_radius: 5,
        },
    );

    let mut segments = Vec::new();
    for line in lines {
        let theta = (line.angle_in_degrees as f32).to_radians();
        let (sin, cos) = theta.sin_cos();
        let samples = walk_line(binary, line.r, sin, cos);
        collect_runs(binary, &samples, options, &mut segments);
    }
    segments
}

/// Pixel positions along `x·cos + y·sin = r`, stepping along the longer axis.
fn walk_line(binary: &GrayImage, r: f32, sin: f32, cos: f32) -> Vec<(i32, i32)> {
    let (width, height) = (binary.width() as i32, binary.height() as i32);

    if cos.abs() >= sin.abs() {
        (0..height)
            .map(|y| (((r - y as f32 * sin) / cos).round() as i32, y))
            .filter(|&(x, _)| x >= 0 && x < width)
            .collect()
    } else {
        (0..width)
            .map(|x| (x, ((r - x as f32 * cos) / sin).round() as i32))
            .filter(|&(_, y)| y >= 0 && y < height)
            .collect()
    }
}

fn collect_runs(
    binary: &GrayImage,
    samples: &[(i32, i32)],
    options: SegmentDetectionOptions,
    out: &mut Vec<LineSegment>,
) {
    let mut run_start: Option<(i32, i32)> = None;
    let mut last_on = (0, 0);
    let mut gap = 0u32;

    let close_run = |start: (i32, i32), end: (i32, i32), out: &mut Vec<LineSegment>| {
        let segment = LineSegment::new(Point::new(start.0, start.1), Point::new(end.0, end.1));
        if segment.length() >= options.min_length as f64 {
            out.push(segment);
        }
    };

    for &(x, y) in samples {
        if is_ink_near(binary, x, y) {
            if run_start.is_none() {
                run_start = Some((x, y));
            }
            last_on = (x, y);
            gap = 0;
        } else if let Some(start) = run_start {
            gap += 1;
            if gap > options.max_gap {
                close_run(start, last_on, out);
                run_start = None;
                gap = 0;
            }
        }
    }

    if let Some(start) = run_start {
        close_run(start, last_on, out);
    }
}

/// Ink within one pixel of `(x, y)` along either axis.
fn is_ink_near(binary: &GrayImage, x: i32, y: i32) -> bool {
    let (width, height) = (binary.width() as i32, binary.height() as i32);
    [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)]
        .iter()
        .map(|(dx, dy)| (x + dx, y + dy))
        .filter(|&(px, py)| px >= 0 && py >= 0 && px < width && py < height)
        .any(|(px, py)| binary.get_pixel(px as u32, py as u32)[0] != BACKGROUND)
}
