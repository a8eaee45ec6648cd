use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use crate::types::{Segment, BACKGROUND};

/// Splits a binary plate into 8-connected ink regions
#[derive(Debug, Clone)]
pub struct ComponentSegmenter {
    /// Regions with this many pixels or fewer are dropped
    pub min_area: u32,
}

impl Default for ComponentSegmenter {
    fn default() -> Self {
        Self { min_area: 30 }
    }
}

#[derive(Clone, Copy)]
struct Extent {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    area: u32,
}

impl ComponentSegmenter {
    /// Regions in reading order: top to bottom, then left to right
    pub fn segment(&self, binary: &GrayImage) -> Vec<Segment> {
        let labels = connected_components(binary, Connectivity::Eight, Luma([BACKGROUND]));

        let mut extents: Vec<Option<Extent>> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            if extents.len() <= label {
                extents.resize(label + 1, None);
            }
            extents[label] = Some(match extents[label] {
                None => Extent { x0: x, y0: y, x1: x, y1: y, area: 1 },
                Some(e) => Extent {
                    x0: e.x0.min(x),
                    y0: e.y0.min(y),
                    x1: e.x1.max(x),
                    y1: e.y1.max(y),
                    area: e.area + 1,
                },
            });
        }

        let mut segments: Vec<Segment> = extents
            .into_iter()
            .flatten()
            .filter(|e| e.area > self.min_area)
            .map(|e| Segment {
                x: e.x0,
                y: e.y0,
                width: e.x1 - e.x0 + 1,
                height: e.y1 - e.y0 + 1,
                area: e.area,
            })
            .collect();

        segments.sort_by_key(|s| (s.y, s.x));
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FOREGROUND;

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    #[test]
    fn test_segments_in_reading_order() {
        let mut plate = GrayImage::new(100, 100);
        fill(&mut plate, 60, 10, 80, 30);
        fill(&mut plate, 10, 12, 30, 32);
        fill(&mut plate, 10, 60, 40, 90);

        let segments = ComponentSegmenter::default().segment(&plate);
        let origins: Vec<(u32, u32)> = segments.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(origins, vec![(60, 10), (10, 12), (10, 60)]);
        assert_eq!(segments[2].width, 30);
        assert_eq!(segments[2].height, 30);
        assert_eq!(segments[2].area, 900);
    }

    #[test]
    fn test_small_regions_are_dropped() {
        let mut plate = GrayImage::new(50, 50);
        fill(&mut plate, 5, 5, 10, 10);
        fill(&mut plate, 20, 20, 40, 40);

        let segments = ComponentSegmenter::default().segment(&plate);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].x, 20);
    }

    #[test]
    fn test_blank_plate_has_no_segments() {
        assert!(ComponentSegmenter::default().segment(&GrayImage::new(10, 10)).is_empty());
    }
}
