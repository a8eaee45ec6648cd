//! Synthetic glyph plates for tests.

use std::path::PathBuf;

use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_filled_rect_mut},
    rect::Rect,
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use crate::types::RasterImage;

const PAPER: Rgb<u8> = Rgb([245, 240, 235]);
const INK: Rgb<u8> = Rgb([25, 20, 30]);

/// Side of the design box the glyph shapes are laid out in
const DESIGN: f32 = 40.0;
const MARGIN: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Ring,
    Cross,
    VerticalBar,
    HorizontalBar,
    Corner,
    MirroredCorner,
    Tee,
    DoubleBar,
}

impl Glyph {
    pub const ALL: [Glyph; 8] = [
        Glyph::Ring,
        Glyph::Cross,
        Glyph::VerticalBar,
        Glyph::HorizontalBar,
        Glyph::Corner,
        Glyph::MirroredCorner,
        Glyph::Tee,
        Glyph::DoubleBar,
    ];

    /// Filled rectangles in design coordinates: (x0, y0, x1, y1)
    fn strokes(self) -> &'static [(f32, f32, f32, f32)] {
        match self {
            Glyph::Ring => &[],
            Glyph::Cross => &[(17.0, 2.0, 23.0, 38.0), (2.0, 17.0, 38.0, 23.0)],
            Glyph::VerticalBar => &[(16.0, 2.0, 24.0, 38.0)],
            Glyph::HorizontalBar => &[(2.0, 16.0, 38.0, 24.0)],
            Glyph::Corner => &[(4.0, 2.0, 12.0, 38.0), (4.0, 30.0, 36.0, 38.0)],
            Glyph::MirroredCorner => &[(28.0, 2.0, 36.0, 38.0), (4.0, 30.0, 36.0, 38.0)],
            Glyph::Tee => &[(2.0, 2.0, 38.0, 10.0), (16.0, 2.0, 24.0, 38.0)],
            Glyph::DoubleBar => &[(6.0, 2.0, 14.0, 38.0), (26.0, 2.0, 34.0, 38.0)],
        }
    }

    pub fn draw(self, img: &mut RgbImage, x: u32, y: u32, scale: f32) {
        let at = |v: f32, origin: u32| origin as i32 + (v * scale).round() as i32;

        if self == Glyph::Ring {
            let center = (at(20.0, x), at(20.0, y));
            draw_filled_circle_mut(img, center, (18.0 * scale).round() as i32, INK);
            draw_filled_circle_mut(img, center, (10.0 * scale).round() as i32, PAPER);
            return;
        }

        for &(x0, y0, x1, y1) in self.strokes() {
            let width = ((x1 - x0) * scale).round().max(1.0) as u32;
            let height = ((y1 - y0) * scale).round().max(1.0) as u32;
            draw_filled_rect_mut(img, Rect::at(at(x0, x), at(y0, y)).of_size(width, height), INK);
        }
    }
}

fn extent(scale: f32) -> u32 {
    (DESIGN * scale).ceil() as u32
}

/// Route `tracing` output through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Writes glyph images into a temporary directory
pub struct GlyphWriter {
    dir: TempDir,
}

impl GlyphWriter {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn image(glyph: Glyph, x: u32, y: u32, scale: f32) -> RgbImage {
        let mut img = RgbImage::from_pixel(x + extent(scale) + MARGIN, y + extent(scale) + MARGIN, PAPER);
        glyph.draw(&mut img, x, y, scale);
        img
    }

    pub fn raster(&self, glyph: Glyph, scale: f32) -> RasterImage {
        RasterImage::new(Self::image(glyph, MARGIN, MARGIN, scale), 3).expect("raster")
    }

    /// Save a single glyph drawn at (`x`, `y`)
    pub fn write(&self, name: &str, glyph: Glyph, x: u32, y: u32, scale: f32) -> PathBuf {
        let path = self.path(name);
        Self::image(glyph, x, y, scale).save(&path).expect("save glyph");
        path
    }

    pub fn write_blank(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        RgbImage::from_pixel(64, 64, PAPER).save(&path).expect("save blank");
        path
    }

    /// Save several glyphs on one plate
    pub fn plate(&self, glyphs: &[(Glyph, u32, u32, f32)]) -> PathBuf {
        let width = glyphs.iter().map(|&(_, x, _, s)| x + extent(s)).max().unwrap_or(0) + MARGIN;
        let height = glyphs.iter().map(|&(_, _, y, s)| y + extent(s)).max().unwrap_or(0) + MARGIN;

        let mut img = RgbImage::from_pixel(width, height, PAPER);
        for &(glyph, x, y, scale) in glyphs {
            glyph.draw(&mut img, x, y, scale);
        }
        let path = self.path("plate.png");
        img.save(&path).expect("save plate");
        path
    }
}

impl Default for GlyphWriter {
    fn default() -> Self {
        Self::new()
    }
}
