use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::data::pixel_rect::PixelRect;
use crate::core::data::point::Point;

/// A dense `width x height` canvas of 8-bit RGB pixels, row-major with y
/// growing downward. Backed by the same storage as [`PixelBuffer`]; created
/// empty and written once by the draw engine, then shared read-only.
pub type RgbImage = PixelBuffer;

#[must_use]
pub fn new_image(width: u32, height: u32) -> RgbImage {
    let pixel_rect = PixelRect::new(
        Point { x: 0, y: 0 },
        Point {
            x: width as i32 - 1,
            y: height as i32 - 1,
        },
    )
    .expect("width and height are validated positive before an image is allocated");

    PixelBuffer::new(pixel_rect)
}
