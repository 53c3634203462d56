use super::DrawStats;
use crate::core::actions::region_algebra::ImageRect;
use crate::core::data::complex::Complex;
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::point::Point;
use crate::core::data::polynomial::AnalyzedPolynomial;
use crate::core::data::rgb_image::RgbImage;
use crate::core::pixel_stream::PixelStream;

/// One thread, scalar `f64` complex arithmetic, one pixel fully iterated to
/// completion before moving to the next. No block packing, no parallelism —
/// a baseline for correctness comparisons against the other strategies, not
/// a strategy anyone picks for throughput.
pub fn draw_naive(params: &FractalParams, image_out: &mut RgbImage) -> DrawStats {
    let analyzed = AnalyzedPolynomial::new(params.zeros.clone())
        .expect("params.zeros is non-empty by FractalParams::new's own validation");

    let mut stream = PixelStream::new(params, ImageRect::full(params.width, params.height));
    let mut iterations = 0u64;

    while let Some((r, i, mut metadata)) = stream.next() {
        let mut z = Complex { real: r, imag: i };

        let zero_index = loop {
            z = analyzed.newton_step(z);
            metadata.iteration_count += 1;
            iterations += 1;

            if metadata.iteration_count >= params.max_iters {
                break analyzed.closest_zero_index(z);
            }
            if let Some(zero_index) = analyzed.converged_zero_index(z) {
                break zero_index;
            }
        };

        image_out
            .set_pixel(
                Point { x: metadata.x as i32, y: metadata.y as i32 },
                params.colors[zero_index],
            )
            .expect("pixel stream only yields coordinates within image_out's bounds");
    }

    DrawStats::whole_image(params, iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::colour::Colour;
    use crate::core::data::complex::Complex;
    use crate::core::data::fractal_params::{HandlerKind, PngEncoder, Precision, Strategy};
    use crate::core::data::rgb_image::new_image;

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
            Strategy::Naive,
            PngEncoder::default(),
            HandlerKind::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_draw_naive_colors_every_pixel_with_one_of_the_palette_colors() {
        let p = params(12, 12);
        let mut image = new_image(12, 12);
        draw_naive(&p, &mut image);

        for y in 0..12 {
            for x in 0..12 {
                let pixel = image
                    .get_pixel(crate::core::data::point::Point { x, y })
                    .unwrap();
                assert!(p.colors.contains(&pixel), "pixel ({x},{y}) = {pixel:?} not in palette");
            }
        }
    }

    #[test]
    fn test_draw_naive_reports_whole_image_pixel_count() {
        let p = params(8, 5);
        let mut image = new_image(8, 5);
        let stats = draw_naive(&p, &mut image);
        assert_eq!(stats.fresh_pixels, 40);
        assert_eq!(stats.copy_tasks, 0);
    }
}
