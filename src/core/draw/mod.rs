mod block_single;
mod incremental;
mod naive;
mod threaded;

use crate::core::actions::region_algebra::ImageRect;
use crate::core::data::fractal_params::{FractalParams, Strategy};
use crate::core::data::rgb_image::RgbImage;
use crate::core::sync::thread_pool::ThreadPool;
use std::sync::Arc;

/// Bookkeeping from a single [`draw`] call, reported alongside the rendered
/// image for logging and for tests that want to assert a particular
/// strategy took the path they expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub iterations: u64,
    pub copy_tasks: u32,
    pub fresh_pixels: u64,
}

impl DrawStats {
    fn whole_image(params: &FractalParams, iterations: u64) -> Self {
        Self {
            iterations,
            copy_tasks: 0,
            fresh_pixels: u64::from(params.width) * u64::from(params.height),
        }
    }
}

/// The single entry point the handlers call: renders `params` into
/// `image_out`, dispatching to the strategy named in `params.strategy` and
/// the numeric precision named in `params.precision`. `previous` carries the
/// prior request's params and image, consulted only by the incremental
/// strategy (every other strategy renders from scratch regardless).
#[must_use]
pub fn draw(
    params: &FractalParams,
    image_out: &mut RgbImage,
    previous: Option<(&FractalParams, &Arc<RgbImage>)>,
    pool: &ThreadPool,
) -> DrawStats {
    match params.strategy {
        Strategy::Naive => naive::draw_naive(params, image_out),
        Strategy::Block => block_single::draw_block_single(params, image_out),
        Strategy::BlockThreaded => threaded::draw_block_threaded(params, image_out, pool),
        Strategy::BlockThreadedIncremental => {
            incremental::draw_incremental(params, image_out, previous, pool)
        }
    }
}

/// Splits `region` into a column-spanning stack of row strips, each at most
/// `rows_per_task` rows tall. The last strip may be shorter.
fn split_rows(region: ImageRect, rows_per_task: u32) -> Vec<ImageRect> {
    let rows_per_task = rows_per_task.max(1);
    let mut out = Vec::new();
    let mut y = region.y_min;
    while y < region.y_max {
        let y_end = (y + rows_per_task).min(region.y_max);
        out.push(ImageRect {
            x_min: region.x_min,
            x_max: region.x_max,
            y_min: y,
            y_max: y_end,
        });
        y = y_end;
    }
    out
}

/// Copies every pixel of `src` (a full, locally-originated image) into
/// `dest` at the offset given by `dest_rect`. `src`'s dimensions must equal
/// `dest_rect`'s.
fn blit_into(dest: &mut RgbImage, dest_rect: ImageRect, src: &RgbImage) {
    use crate::core::data::point::Point;

    for y in 0..src.height() {
        for x in 0..src.width() {
            let pixel = src
                .get_pixel(Point { x: x as i32, y: y as i32 })
                .expect("src pixel in bounds of its own rect");
            dest.set_pixel(
                Point {
                    x: (dest_rect.x_min + x) as i32,
                    y: (dest_rect.y_min + y) as i32,
                },
                pixel,
            )
            .expect("dest_rect was carved out of dest's own bounds");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rows_covers_region_without_overlap() {
        let region = ImageRect { x_min: 0, x_max: 10, y_min: 0, y_max: 17 };
        let strips = split_rows(region, 5);

        assert_eq!(strips.len(), 4);
        let mut total = 0u64;
        for strip in &strips {
            total += strip.count_pixels();
        }
        assert_eq!(total, region.count_pixels());
        assert_eq!(strips.last().unwrap().height(), 2);
    }

    #[test]
    fn test_split_rows_clamps_zero_rows_per_task_to_one() {
        let region = ImageRect { x_min: 0, x_max: 4, y_min: 0, y_max: 3 };
        let strips = split_rows(region, 0);
        assert_eq!(strips.len(), 3);
    }
}
