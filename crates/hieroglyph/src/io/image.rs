use std::{fs, io::ErrorKind, path::Path};

use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::{error::LoadError, types::RasterImage};

/// Read and decode one image file
pub fn load<P: AsRef<Path>>(path: P) -> Result<RasterImage, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let raster = load_from_memory(&bytes)?;
    debug!(
        "Loaded {} ({}x{}, {} channels)",
        path.display(),
        raster.width(),
        raster.height(),
        raster.channels()
    );
    Ok(raster)
}

/// Decode an image from memory
pub fn load_from_memory(bytes: &[u8]) -> Result<RasterImage, LoadError> {
    let decoded = image::load_from_memory(bytes)?;
    from_dynamic(&decoded)
}

/// Convert a decoded image, flattening any alpha channel onto white paper
pub fn from_dynamic(image: &DynamicImage) -> Result<RasterImage, LoadError> {
    let channels = image.color().channel_count();
    let pixels = if image.color().has_alpha() {
        flatten_alpha(image)
    } else {
        image.to_rgb8()
    };

    RasterImage::new(pixels, channels).ok_or(LoadError::EmptyImage)
}

fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load(dir.path().join("nope.png")).expect_err("Should fail");
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").expect("write");

        let err = load(&path).expect_err("Should fail");
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load(dir.path()).expect_err("Should fail");
        assert!(matches!(err, LoadError::Unreadable { .. }));
    }

    #[test]
    fn test_grayscale_png_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gray.png");
        let mut gray = GrayImage::from_pixel(12, 7, Luma([255u8]));
        gray.put_pixel(3, 2, Luma([0u8]));
        gray.save(&path).expect("save");

        let raster = load(&path).expect("Should load");
        assert_eq!(raster.width(), 12);
        assert_eq!(raster.height(), 7);
        assert_eq!(raster.channels(), 1);
        assert_eq!(raster.pixels().get_pixel(3, 2).0, [0, 0, 0]);
        assert_eq!(raster.pixels().get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let mut rgba = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 1, Rgba([0, 0, 0, 255]));

        let raster = from_dynamic(&DynamicImage::ImageRgba8(rgba)).expect("Should convert");
        assert_eq!(raster.channels(), 4);
        assert_eq!(raster.pixels().get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(raster.pixels().get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_zero_sized_image_is_rejected() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 5));
        assert!(matches!(from_dynamic(&empty), Err(LoadError::EmptyImage)));
    }
}
