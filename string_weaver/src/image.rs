//! Turning decoded pictures into a working [`Raster`].

use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};

use crate::{config::Shape, Raster};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Preparation {
    /// Longest side after resizing. `None` keeps the original size.
    pub resolution: Option<u32>,
    /// Contrast change in percent, as understood by [`DynamicImage::adjust_contrast`].
    pub contrast: f32,
}

impl Default for Preparation {
    fn default() -> Self {
        Self {
            resolution: None,
            contrast: 12.0,
        }
    }
}

/// Grayscale raster ready for a run on `shape`.
///
/// Circles are cropped to the centred square and everything outside the
/// inscribed circle is painted white, so no thread is drawn towards the corners.
pub fn prepare(image: &DynamicImage, shape: Shape, options: Preparation) -> Raster {
    let mut image = match options.resolution {
        Some(resolution) => image.resize(resolution, resolution, FilterType::Lanczos3),
        None => image.clone(),
    };
    if shape == Shape::Circle {
        let side = image.width().min(image.height());
        image = image.crop_imm(
            (image.width() - side) / 2,
            (image.height() - side) / 2,
            side,
            side,
        );
    }
    if options.contrast != 0.0 {
        image = image.adjust_contrast(options.contrast);
    }
    let mut gray = image.into_luma8();
    if shape == Shape::Circle {
        mask_circle(&mut gray);
    }
    gray.into()
}

fn mask_circle(image: &mut GrayImage) {
    let radius = image.width().min(image.height()) as f32 / 2.0;
    let (cx, cy) = (image.width() as f32 / 2.0, image.height() as f32 / 2.0);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy > radius * radius {
            *pixel = Luma([Raster::MAX]);
        }
    }
}
