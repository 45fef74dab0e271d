#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use tempfile::TempDir;

pub const INK: Luma<u8> = Luma([255]);
pub const BLACK: Luma<u8> = Luma([0]);
pub const WHITE: Luma<u8> = Luma([255]);

/// Binary raster with no ink.
pub fn blank_binary(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// White grayscale raster.
pub fn white_gray(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, WHITE)
}

/// Paint `[x0, x1) × [y0, y1)` with `value`.
pub fn fill_rect(img: &mut GrayImage, x0: u32, x1: u32, y0: u32, y1: u32, value: Luma<u8>) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, value);
        }
    }
}

/// 800x1000 binary page: 20% text ink everywhere plus a solid rule at row
/// 500 covering columns 20..780 (95% of the width).
pub fn rule_page() -> GrayImage {
    let mut img = GrayImage::from_fn(800, 1000, |x, y| if (7 * x + 13 * y) % 5 == 0 { INK } else { Luma([0]) });
    fill_rect(&mut img, 20, 780, 500, 501, INK);
    img
}

/// 740x400 binary page: margin 50, column 300, gutter 40, column 300,
/// margin 50. Columns carry exactly 30% ink per pixel column.
pub fn two_column_page() -> GrayImage {
    GrayImage::from_fn(740, 400, |x, y| {
        let in_column = (50..350).contains(&x) || (390..690).contains(&x);
        if in_column && (x + 3 * y) % 10 < 3 { INK } else { Luma([0]) }
    })
}

/// 900x600 binary column hiding three full-height bands:
/// 40..280, 340..580 and 640..880.
pub fn three_band_column() -> GrayImage {
    GrayImage::from_fn(900, 600, |x, _| {
        if (40..280).contains(&x) || (340..580).contains(&x) || (640..880).contains(&x) {
            INK
        } else {
            Luma([0])
        }
    })
}

/// Black glyph-like strokes: 5 dark pixels out of every 8.
pub fn is_stroke(x: u32) -> bool {
    x % 8 < 5
}

/// Draw a text line of strokes on a grayscale raster.
pub fn draw_text_line(img: &mut GrayImage, x0: u32, x1: u32, y0: u32, height: u32) {
    for y in y0..(y0 + height).min(img.height()) {
        for x in x0..x1.min(img.width()) {
            if is_stroke(x) {
                img.put_pixel(x, y, BLACK);
            }
        }
    }
}

/// 300x200 grayscale column with four text lines (14 rows each, every 40 rows
/// from row 20) spanning columns 20..240.
pub fn kamus_column() -> GrayImage {
    let mut img = white_gray(300, 200);
    for k in 0..4 {
        draw_text_line(&mut img, 20, 240, 20 + 40 * k, 14);
    }
    img
}

/// 400x400 grayscale column holding four entries of three lines each. The
/// first line of an entry starts at x=60, continuation lines at x=30.
pub fn lexicon_column() -> GrayImage {
    let mut img = white_gray(400, 400);
    for k in 0..12u32 {
        let x0 = if k % 3 == 0 { 60 } else { 30 };
        draw_text_line(&mut img, x0, 360, 20 + 30 * k, 14);
    }
    img
}

/// 600x800 white page with a text block at 100..500 x 100..700: twenty
/// lines of strokes, 14 rows tall, one every 30 rows.
pub fn text_page() -> DynamicImage {
    let mut gray = white_gray(600, 800);
    for k in 0..20 {
        draw_text_line(&mut gray, 100, 500, 100 + 30 * k, 14);
    }
    to_rgb(&gray)
}

/// 640x800 white page with two text columns, 60..280 and 320..540, sharing
/// the line grid of [`text_page`].
pub fn two_column_text_page() -> DynamicImage {
    let mut gray = white_gray(640, 800);
    for k in 0..20 {
        draw_text_line(&mut gray, 60, 280, 100 + 30 * k, 14);
        draw_text_line(&mut gray, 320, 540, 100 + 30 * k, 14);
    }
    to_rgb(&gray)
}

pub fn to_rgb(gray: &GrayImage) -> DynamicImage {
    let rgb = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    DynamicImage::ImageRgb8(rgb)
}

/// Divider glyph: a black bar inside a 2px white frame.
pub fn divider_glyph(width: u32, height: u32) -> GrayImage {
    let mut glyph = white_gray(width, height);
    fill_rect(&mut glyph, 2, width.saturating_sub(2), 2, height.saturating_sub(2), BLACK);
    glyph
}

/// Black ring with a `border`-pixel wall around a white hole.
pub fn hollow_glyph(width: u32, height: u32, border: u32) -> GrayImage {
    let mut glyph = GrayImage::from_pixel(width, height, BLACK);
    fill_rect(&mut glyph, border, width - border, border, height - border, WHITE);
    glyph
}

/// Copy `glyph` onto `img` with its top-left corner at (x, y).
pub fn paste(img: &mut GrayImage, glyph: &GrayImage, x: u32, y: u32) {
    image::imageops::replace(img, glyph, x as i64, y as i64);
}

/// 1060x800 white page with three text columns, 60..360, 380..680 and
/// 700..1000, separated by 20px gutters.
pub fn three_column_text_page() -> DynamicImage {
    let mut gray = white_gray(1060, 800);
    for k in 0..20 {
        for x0 in [60, 380, 700] {
            draw_text_line(&mut gray, x0, x0 + 300, 100 + 30 * k, 14);
        }
    }
    to_rgb(&gray)
}

/// Temp directory holding the given PNG file names, each a small glyph.
pub fn pattern_dir(names: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp directory");
    for name in names {
        divider_glyph(16, 10)
            .save(dir.path().join(name))
            .expect("Failed to save test pattern");
    }
    dir
}
