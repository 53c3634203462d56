use super::{blit_into, split_rows, DrawStats};
use crate::core::actions::region_algebra::ImageRect;
use crate::core::block::block_polynomial::BlockPolynomial;
use crate::core::block::iterator::BlockIterator;
use crate::core::block::scalar::Scalar;
use crate::core::data::fractal_params::{FractalParams, Precision};
use crate::core::data::point::Point;
use crate::core::data::polynomial::AnalyzedPolynomial;
use crate::core::data::rgb_image::{new_image, RgbImage};
use crate::core::pixel_stream::PixelStream;
use crate::core::sync::task_group::TaskGroup;
use crate::core::sync::thread_pool::ThreadPool;
use std::sync::{Arc, Mutex};

/// Strip height used to carve the image into independent row bands for the
/// pool. Small enough that late-finishing strips don't leave workers idle,
/// large enough that per-task overhead stays negligible next to the Newton
/// iteration it wraps.
pub(super) const STRIP_ROWS: u32 = 50;

pub(super) fn build_polynomial<S: Scalar>(params: &FractalParams) -> Arc<BlockPolynomial<S>> {
    let analyzed = AnalyzedPolynomial::new(params.zeros.clone())
        .expect("params.zeros is non-empty by FractalParams::new's own validation");
    Arc::new(BlockPolynomial::from_analyzed(&analyzed))
}

/// Renders one rectangle into a freshly allocated, rect-sized buffer. Takes
/// owned/`Arc` inputs so the whole call can be moved into a `'static`
/// [`TaskGroup`] closure — [`TaskGroup::add`] gives pool workers no way to
/// borrow the caller's image, so every task paints into its own private
/// buffer and the calling thread blits the results in after the join.
pub(super) fn render_region_to_buffer<S: Scalar>(
    params: &FractalParams,
    poly: &Arc<BlockPolynomial<S>>,
    rect: ImageRect,
) -> (ImageRect, RgbImage, u64) {
    let mut local = new_image(rect.width(), rect.height());
    let stream = PixelStream::new(params, rect);
    let iterator = BlockIterator::new(poly, stream, params.max_iters);

    let total = iterator.run(|metadata, zero_index| {
        local
            .set_pixel(
                Point {
                    x: (metadata.x - rect.x_min) as i32,
                    y: (metadata.y - rect.y_min) as i32,
                },
                params.colors[zero_index],
            )
            .expect("the stream only visits rect's own coordinates");
    });

    (rect, local, total)
}

/// Fan out the whole image across the pool as independent row strips, no
/// reuse of any previous frame.
pub fn draw_block_threaded(params: &FractalParams, image_out: &mut RgbImage, pool: &ThreadPool) -> DrawStats {
    match params.precision {
        Precision::Single => draw_with::<f32>(params, image_out, pool),
        Precision::Double => draw_with::<f64>(params, image_out, pool),
    }
}

fn draw_with<S: Scalar>(params: &FractalParams, image_out: &mut RgbImage, pool: &ThreadPool) -> DrawStats {
    let poly = build_polynomial::<S>(params);
    let regions = split_rows(ImageRect::full(params.width, params.height), STRIP_ROWS);

    let results: Arc<Mutex<Vec<(ImageRect, RgbImage)>>> = Arc::new(Mutex::new(Vec::new()));
    let iterations = Arc::new(Mutex::new(0u64));
    let group = TaskGroup::new(pool);

    for rect in regions {
        let params = params.clone();
        let poly = Arc::clone(&poly);
        let results = Arc::clone(&results);
        let iterations = Arc::clone(&iterations);
        group.add(move || {
            let (rect, buffer, total) = render_region_to_buffer(&params, &poly, rect);
            *iterations.lock().expect("iteration counter mutex poisoned") += total;
            results
                .lock()
                .expect("strip results mutex poisoned")
                .push((rect, buffer));
        });
    }

    group.wait_until_done();

    for (rect, buffer) in results.lock().expect("strip results mutex poisoned").drain(..) {
        blit_into(image_out, rect, &buffer);
    }

    DrawStats::whole_image(
        params,
        *iterations.lock().expect("iteration counter mutex poisoned"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::colour::Colour;
    use crate::core::data::complex::Complex;
    use crate::core::data::fractal_params::{HandlerKind, PngEncoder, Strategy};

    fn params(width: u32, height: u32) -> FractalParams {
        FractalParams::new(
            "s".to_string(),
            1,
            0,
            0,
            -2.0,
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
            Strategy::BlockThreaded,
            PngEncoder::default(),
            HandlerKind::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_draw_block_threaded_colors_every_pixel_matching_single_threaded() {
        let p = params(40, 130); // taller than one strip, exercises multiple tasks
        let pool = ThreadPool::new(4);

        let mut threaded_image = new_image(p.width, p.height);
        draw_block_threaded(&p, &mut threaded_image, &pool);

        let mut single_image = new_image(p.width, p.height);
        super::block_single::draw_block_single(&p, &mut single_image);

        for y in 0..p.height as i32 {
            for x in 0..p.width as i32 {
                let point = Point { x, y };
                assert_eq!(
                    threaded_image.get_pixel(point).unwrap(),
                    single_image.get_pixel(point).unwrap(),
                    "mismatch at ({x},{y})"
                );
            }
        }
    }

    #[test]
    fn test_draw_block_threaded_reports_whole_image_as_fresh() {
        let p = params(20, 20);
        let pool = ThreadPool::new(2);
        let mut image = new_image(p.width, p.height);
        let stats = draw_block_threaded(&p, &mut image, &pool);
        assert_eq!(stats.fresh_pixels, 400);
        assert_eq!(stats.copy_tasks, 0);
    }
}
