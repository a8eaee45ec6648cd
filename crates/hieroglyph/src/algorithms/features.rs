use std::{f64::consts::PI, ops::Range};

use geo::{Area, EuclideanLength};
use geo_types::{Coord, LineString, Polygon};
use imageproc::contours::{find_contours, BorderType};
use tracing::trace;
use crate::{
    algorithms::preprocessing::foreground_bounds,
    traits::{FeatureExtractor, FeatureGroup},
    types::{CanonicalImage, FeatureVector},
};

/// Dimension of descriptors produced by [`GlyphDescriptor::default`]
pub const FEATURE_DIM: usize = 64 + 32 + 2 + 9 + 4;

/// Ink fraction over a square grid of zones
#[derive(Debug, Clone)]
pub struct ZoningFeatures {
    pub grid: u32,
}

impl Default for ZoningFeatures {
    fn default() -> Self {
        Self { grid: 8 }
    }
}

impl FeatureGroup for ZoningFeatures {
    fn name(&self) -> &'static str {
        "zoning"
    }

    fn len(&self) -> usize {
        (self.grid * self.grid) as usize
    }

    fn extend(&self, image: &CanonicalImage, out: &mut Vec<f64>) {
        let size = image.size();
        let edge = |i: u32| i * size / self.grid;

        for zy in 0..self.grid {
            for zx in 0..self.grid {
                let (x0, x1, y0, y1) = (edge(zx), edge(zx + 1), edge(zy), edge(zy + 1));
                let area = (x1 - x0) * (y1 - y0);
                if area == 0 {
                    out.push(0.0);
                    continue;
                }
                let ink = (y0..y1)
                    .flat_map(|y| (x0..x1).map(move |x| (x, y)))
                    .filter(|&(x, y)| image.is_foreground(x, y))
                    .count();
                out.push(ink as f64 / area as f64);
            }
        }
    }
}

/// Stroke direction histograms from Sobel gradients, one per image quadrant
#[derive(Debug, Clone)]
pub struct DirectionFeatures {
    pub bins: usize,
}

impl Default for DirectionFeatures {
    fn default() -> Self {
        Self { bins: 8 }
    }
}

impl FeatureGroup for DirectionFeatures {
    fn name(&self) -> &'static str {
        "direction"
    }

    fn len(&self) -> usize {
        4 * self.bins
    }

    fn extend(&self, image: &CanonicalImage, out: &mut Vec<f64>) {
        let gx = imageproc::gradients::horizontal_sobel(image.pixels());
        let gy = imageproc::gradients::vertical_sobel(image.pixels());
        let size = image.size();

        let mut histogram = vec![0.0f64; self.len()];
        let mut total = 0.0f64;
        for y in 0..size {
            for x in 0..size {
                let dx = gx.get_pixel(x, y)[0] as f64;
                let dy = gy.get_pixel(x, y)[0] as f64;
                let magnitude = dx.hypot(dy);
                if magnitude == 0.0 {
                    continue;
                }
                let turn = (dy.atan2(dx) + PI) / (2.0 * PI);
                let bin = ((turn * self.bins as f64) as usize).min(self.bins - 1);
                let quadrant = (2 * y / size) as usize * 2 + (2 * x / size) as usize;
                histogram[quadrant * self.bins + bin] += magnitude;
                total += magnitude;
            }
        }

        if total > 0.0 {
            histogram.iter_mut().for_each(|v| *v /= total);
        }
        out.extend(histogram);
    }
}

/// Aspect ratio and ink density of the glyph's bounding box
#[derive(Debug, Clone, Default)]
pub struct ShapeFeatures;

impl FeatureGroup for ShapeFeatures {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn len(&self) -> usize {
        2
    }

    fn extend(&self, image: &CanonicalImage, out: &mut Vec<f64>) {
        match foreground_bounds(image.pixels()) {
            Some((_, _, width, height)) => {
                let (w, h) = (width as f64, height as f64);
                out.push(w / (w + h));
                out.push(image.foreground_count() as f64 / (w * h));
            }
            None => out.extend([0.0, 0.0]),
        }
    }
}

/// Centroid offset and normalized central moments up to third order.
///
/// Moments are compressed with a signed square root so thin strokes do not
/// dominate the distance.
#[derive(Debug, Clone, Default)]
pub struct MomentFeatures;

const MOMENT_ORDERS: [(i32, i32); 7] = [(2, 0), (0, 2), (1, 1), (2, 1), (1, 2), (3, 0), (0, 3)];

impl FeatureGroup for MomentFeatures {
    fn name(&self) -> &'static str {
        "moments"
    }

    fn len(&self) -> usize {
        2 + MOMENT_ORDERS.len()
    }

    fn extend(&self, image: &CanonicalImage, out: &mut Vec<f64>) {
        let size = image.size();
        let points: Vec<(f64, f64)> = image
            .pixels()
            .enumerate_pixels()
            .filter(|(x, y, _)| image.is_foreground(*x, *y))
            .map(|(x, y, _)| (x as f64 + 0.5, y as f64 + 0.5))
            .collect();

        if points.is_empty() {
            out.extend(std::iter::repeat(0.0).take(self.len()));
            return;
        }

        let m00 = points.len() as f64;
        let cx = points.iter().map(|p| p.0).sum::<f64>() / m00;
        let cy = points.iter().map(|p| p.1).sum::<f64>() / m00;
        out.push(cx / size as f64 - 0.5);
        out.push(cy / size as f64 - 0.5);

        for (p, q) in MOMENT_ORDERS {
            let mu: f64 = points
                .iter()
                .map(|&(x, y)| (x - cx).powi(p) * (y - cy).powi(q))
                .sum();
            let eta = mu / m00.powf(1.0 + (p + q) as f64 / 2.0);
            out.push(eta.signum() * eta.abs().sqrt());
        }
    }
}

/// Contour topology: pieces, enclosed loops, loop area and outline length
#[derive(Debug, Clone)]
pub struct TopologyFeatures {
    /// Holes enclosing no more area than this (in canonical pixels) are noise
    pub min_hole_area: f64,
}

impl Default for TopologyFeatures {
    fn default() -> Self {
        Self { min_hole_area: 4.0 }
    }
}

const MAX_COUNTED: usize = 4;

fn contour_ring(points: &[imageproc::point::Point<i32>]) -> LineString<f64> {
    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|p| Coord { x: p.x as f64, y: p.y as f64 })
        .collect();
    let mut ring = LineString::new(coords);
    ring.close();
    ring
}

impl FeatureGroup for TopologyFeatures {
    fn name(&self) -> &'static str {
        "topology"
    }

    fn len(&self) -> usize {
        4
    }

    fn extend(&self, image: &CanonicalImage, out: &mut Vec<f64>) {
        let size = image.size() as f64;
        let contours = find_contours::<i32>(image.pixels());

        let mut outer = 0usize;
        let mut holes = 0usize;
        let mut hole_area = 0.0f64;
        let mut perimeter = 0.0f64;

        for contour in &contours {
            let ring = contour_ring(&contour.points);
            match contour.border_type {
                BorderType::Outer => {
                    outer += 1;
                    perimeter += ring.euclidean_length();
                }
                BorderType::Hole => {
                    let area = Polygon::new(ring, vec![]).unsigned_area();
                    if area > self.min_hole_area {
                        holes += 1;
                        hole_area += area;
                    }
                }
            }
        }

        trace!("topology: {} outer, {} holes", outer, holes);
        out.push(outer.min(MAX_COUNTED) as f64 / MAX_COUNTED as f64);
        out.push(holes.min(MAX_COUNTED) as f64 / MAX_COUNTED as f64);
        out.push(hole_area / (size * size));
        out.push(perimeter / (4.0 * size));
    }
}

/// Composite descriptor made of ordered feature groups
pub struct GlyphDescriptor {
    groups: Vec<Box<dyn FeatureGroup>>,
}

impl GlyphDescriptor {
    pub fn new(groups: Vec<Box<dyn FeatureGroup>>) -> Self {
        Self { groups }
    }

    /// Name and index range of each group within the vector
    pub fn layout(&self) -> Vec<(&'static str, Range<usize>)> {
        let mut start = 0;
        self.groups
            .iter()
            .map(|group| {
                let range = start..start + group.len();
                start = range.end;
                (group.name(), range)
            })
            .collect()
    }
}

impl Default for GlyphDescriptor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ZoningFeatures::default()),
            Box::new(DirectionFeatures::default()),
            Box::new(ShapeFeatures),
            Box::new(MomentFeatures),
            Box::new(TopologyFeatures::default()),
        ])
    }
}

impl FeatureExtractor for GlyphDescriptor {
    fn dimension(&self) -> usize {
        self.groups.iter().map(|group| group.len()).sum()
    }

    fn extract(&self, image: &CanonicalImage) -> FeatureVector {
        let mut values = Vec::with_capacity(self.dimension());
        for group in &self.groups {
            group.extend(image, &mut values);
        }
        debug_assert_eq!(values.len(), self.dimension());
        debug_assert!(values.iter().all(|v| v.is_finite()));
        FeatureVector::new(values)
    }
}
