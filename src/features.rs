//! Image preprocessing: bitmap to classifier input.
//!
//! The classifier is trained on 32×32 greyscale thumbnails flattened row by
//! row, so every image goes through exactly the same three steps here.

use image::{imageops::FilterType, DynamicImage};

/// Side of the square grid every image is resampled to.
pub const GRID_SIDE: u32 = 32;

/// Length of every feature vector (`GRID_SIDE²`).
pub const FEATURE_LEN: usize = (GRID_SIDE * GRID_SIDE) as usize;

/// Converts to greyscale, resizes to `GRID_SIDE × GRID_SIDE`, and normalizes
/// pixels to [0, 1] in row-major order.
///
/// Returns a flat `Vec<f64>` of length `FEATURE_LEN`.
pub fn extract(img: &DynamicImage) -> Vec<f64> {
    let gray = img
        .grayscale()
        .resize_exact(GRID_SIDE, GRID_SIDE, FilterType::Lanczos3)
        .to_luma8();
    gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn any_image_gives_fixed_length_unit_range() {
        let sizes = [(1, 1), (7, 300), (64, 64), (500, 3)];
        for (w, h) in sizes {
            let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x * 13 % 256) as u8, (y * 7 % 256) as u8, 200]));
            let v = extract(&DynamicImage::ImageRgb8(img));
            assert_eq!(v.len(), FEATURE_LEN, "size {}x{}", w, h);
            assert!(v.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
    }

    #[test]
    fn flat_images_map_to_their_grey_level() {
        let white = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 40, Luma([255])));
        assert!(extract(&white).iter().all(|&x| x > 0.99));

        let black = DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 20, Luma([0])));
        assert!(extract(&black).iter().all(|&x| x < 0.01));
    }

    #[test]
    fn output_is_row_major() {
        // Top half black, bottom half white: the first rows come first.
        let img = GrayImage::from_fn(32, 32, |_, y| if y < 16 { Luma([0]) } else { Luma([255]) });
        let v = extract(&DynamicImage::ImageLuma8(img));
        assert!(v[..32].iter().all(|&x| x < 0.1));
        assert!(v[FEATURE_LEN - 32..].iter().all(|&x| x > 0.9));
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(50, 37, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8])));
        assert_eq!(extract(&img), extract(&img));
    }
}
