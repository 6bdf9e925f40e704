//! Alpha-only edge smoothing for cut-out islands.

use image::{GrayImage, Luma, RgbaImage};

/// Extract the alpha channel as a grayscale image.
pub fn alpha_channel(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| Luma([image.get_pixel(x, y)[3]]))
}

/// Gaussian-blur the alpha channel in place, leaving RGB untouched.
///
/// `radius` is the Gaussian standard deviation in pixels; values `<= 0` leave
/// the image unchanged.
pub fn smooth_alpha(image: &mut RgbaImage, radius: f32) {
    if radius <= 0.0 || image.width() == 0 || image.height() == 0 {
        return;
    }

    let blurred = image::imageops::blur(&alpha_channel(image), radius);
    for (pixel, alpha) in image.pixels_mut().zip(blurred.pixels()) {
        pixel[3] = alpha[0];
    }
}
