use super::threaded::{build_polynomial, draw_block_threaded, render_region_to_buffer, STRIP_ROWS};
use super::{blit_into, split_rows, DrawStats};
use crate::core::actions::region_algebra::{compute_pan_only_delta, copy_overlap, ImageOverlap, ImageRect};
use crate::core::block::scalar::Scalar;
use crate::core::data::fractal_params::{FractalParams, Precision};
use crate::core::data::rgb_image::{new_image, RgbImage};
use crate::core::sync::task_group::TaskGroup;
use crate::core::sync::thread_pool::ThreadPool;
use std::sync::{Arc, Mutex};

/// Targets roughly this many pixels per fresh-region task, the same order of
/// magnitude as [`super::threaded::STRIP_ROWS`] rows at a typical viewport
/// width, so a b-only rectangle is cut into tasks of comparable size to the
/// strips `block_threaded` already uses.
const DESIRED_PIXELS_PER_TASK: u32 = STRIP_ROWS * 2000;

/// Reuses the overlapping region of `previous`'s image by copying it, and
/// renders only the genuinely new pixels. Falls back to a full
/// [`draw_block_threaded`] render whenever there's no previous frame to
/// reuse, or the two frames aren't a pure pan of one another (zoom, polynomial
/// change, or resize all bypass this strategy entirely — see DESIGN.md).
pub fn draw_incremental(
    params: &FractalParams,
    image_out: &mut RgbImage,
    previous: Option<(&FractalParams, &Arc<RgbImage>)>,
    pool: &ThreadPool,
) -> DrawStats {
    let Some((prev_params, prev_image)) = previous else {
        return draw_block_threaded(params, image_out, pool);
    };
    if !FractalParams::pan_only_differ(prev_params, params) {
        return draw_block_threaded(params, image_out, pool);
    }

    match params.precision {
        Precision::Single => draw_with::<f32>(params, image_out, prev_params, prev_image, pool),
        Precision::Double => draw_with::<f64>(params, image_out, prev_params, prev_image, pool),
    }
}

fn draw_with<S: Scalar>(
    params: &FractalParams,
    image_out: &mut RgbImage,
    prev_params: &FractalParams,
    prev_image: &Arc<RgbImage>,
    pool: &ThreadPool,
) -> DrawStats {
    let delta = compute_pan_only_delta(prev_params, params);

    let results: Arc<Mutex<Vec<(ImageRect, RgbImage)>>> = Arc::new(Mutex::new(Vec::new()));
    let iterations = Arc::new(Mutex::new(0u64));
    let mut copy_tasks = 0u32;
    let mut fresh_pixels = 0u64;
    let group = TaskGroup::new(pool);

    if let Some(overlap) = delta.overlap {
        copy_tasks = 1;
        let prev_image = Arc::clone(prev_image);
        let results = Arc::clone(&results);
        group.add(move || {
            let (rect, buffer) = copy_region(&prev_image, overlap);
            results
                .lock()
                .expect("incremental draw results mutex poisoned")
                .push((rect, buffer));
        });
    }

    let poly = build_polynomial::<S>(params);
    for region in &delta.b_only {
        fresh_pixels += region.count_pixels();
        let rows_per_task = (DESIRED_PIXELS_PER_TASK / region.width().max(1)).max(1);
        for strip in split_rows(*region, rows_per_task) {
            let params = params.clone();
            let poly = Arc::clone(&poly);
            let results = Arc::clone(&results);
            let iterations = Arc::clone(&iterations);
            group.add(move || {
                let (rect, buffer, total) = render_region_to_buffer(&params, &poly, strip);
                *iterations.lock().expect("iteration counter mutex poisoned") += total;
                results
                    .lock()
                    .expect("incremental draw results mutex poisoned")
                    .push((rect, buffer));
            });
        }
    }

    group.wait_until_done();

    for (rect, buffer) in results
        .lock()
        .expect("incremental draw results mutex poisoned")
        .drain(..)
    {
        blit_into(image_out, rect, &buffer);
    }

    DrawStats {
        iterations: *iterations.lock().expect("iteration counter mutex poisoned"),
        copy_tasks,
        fresh_pixels,
    }
}

/// Extracts the overlapping rectangle out of `prev_image` into a small,
/// locally-originated buffer sized to `overlap.b_region`, so it can be
/// blitted into the new image the same way every other task's output is.
fn copy_region(prev_image: &RgbImage, overlap: ImageOverlap) -> (ImageRect, RgbImage) {
    let dest_rect = overlap.b_region;
    let mut local = new_image(dest_rect.width(), dest_rect.height());

    let shifted = ImageOverlap {
        a_region: overlap.a_region,
        b_region: ImageRect::full(dest_rect.width(), dest_rect.height()),
    };
    copy_overlap(prev_image, &mut local, &shifted);

    (dest_rect, local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::colour::Colour;
    use crate::core::data::complex::Complex;
    use crate::core::data::fractal_params::{HandlerKind, PngEncoder, Strategy};
    use crate::core::data::point::Point;

    fn params(r_min: f64, width: u32, height: u32) -> FractalParams {
        FractalParams::new(
            "s".to_string(),
            1,
            0,
            0,
            r_min,
            -2.0,
            4.0,
            width,
            height,
            50,
            vec![
                Complex { real: 1.0, imag: 0.0 },
                Complex { real: -0.5, imag: 0.866_025_4 },
                Complex { real: -0.5, imag: -0.866_025_4 },
            ],
            vec![
                Colour { r: 255, g: 0, b: 0 },
                Colour { r: 0, g: 255, b: 0 },
                Colour { r: 0, g: 0, b: 255 },
            ],
            Precision::Single,
            Strategy::BlockThreadedIncremental,
            PngEncoder::default(),
            HandlerKind::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_draw_incremental_with_no_previous_frame_falls_back_to_full_render() {
        let p = params(-2.0, 30, 30);
        let pool = ThreadPool::new(2);
        let mut image = new_image(p.width, p.height);

        let stats = draw_incremental(&p, &mut image, None, &pool);
        assert_eq!(stats.copy_tasks, 0);
        assert_eq!(stats.fresh_pixels, 900);
    }

    #[test]
    fn test_draw_incremental_pan_submits_exactly_one_copy_task() {
        let prev = params(-2.0, 60, 60);
        let pool = ThreadPool::new(4);
        let mut prev_image = Arc::new(new_image(prev.width, prev.height));
        {
            let image = Arc::get_mut(&mut prev_image).unwrap();
            super::draw_block_threaded(&prev, image, &pool);
        }

        let next = params(-2.0 + prev.r_delta() * 10.0, 60, 60);
        let mut next_image = new_image(next.width, next.height);
        let stats = draw_incremental(&next, &mut next_image, Some((&prev, &prev_image)), &pool);

        assert_eq!(stats.copy_tasks, 1);
        assert!(stats.fresh_pixels > 0);
        assert!(stats.fresh_pixels < u64::from(next.width) * u64::from(next.height));
    }

    #[test]
    fn test_draw_incremental_pan_reuses_overlap_pixels_exactly() {
        let prev = params(-2.0, 60, 60);
        let pool = ThreadPool::new(4);
        let mut prev_image = Arc::new(new_image(prev.width, prev.height));
        {
            let image = Arc::get_mut(&mut prev_image).unwrap();
            super::draw_block_threaded(&prev, image, &pool);
        }

        let next = params(-2.0 + prev.r_delta() * 10.0, 60, 60);
        let mut next_image = new_image(next.width, next.height);
        draw_incremental(&next, &mut next_image, Some((&prev, &prev_image)), &pool);

        let mut reference_image = new_image(next.width, next.height);
        super::draw_block_threaded(&next, &mut reference_image, &pool);

        // Overlap pixels came from a copy of the previous frame, which was
        // rendered with the same algorithm, so they must match bit-for-bit.
        for y in 10..next.height as i32 {
            for x in 0..(next.width as i32 - 10) {
                let point = Point { x, y };
                assert_eq!(
                    next_image.get_pixel(point).unwrap(),
                    reference_image.get_pixel(point).unwrap(),
                    "mismatch at ({x},{y})"
                );
            }
        }
    }
}
