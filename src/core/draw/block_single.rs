use super::DrawStats;
use crate::core::actions::region_algebra::ImageRect;
use crate::core::block::block_polynomial::BlockPolynomial;
use crate::core::block::iterator::BlockIterator;
use crate::core::block::scalar::Scalar;
use crate::core::data::fractal_params::{FractalParams, Precision};
use crate::core::data::point::Point;
use crate::core::data::polynomial::AnalyzedPolynomial;
use crate::core::data::rgb_image::RgbImage;
use crate::core::pixel_stream::PixelStream;

/// One thread, the dynamic-block Newton iterator, over the whole image.
/// Dispatches on `params.precision` to pick `f32` or `f64` for the hot loop.
pub fn draw_block_single(params: &FractalParams, image_out: &mut RgbImage) -> DrawStats {
    match params.precision {
        Precision::Single => draw_with::<f32>(params, image_out),
        Precision::Double => draw_with::<f64>(params, image_out),
    }
}

fn draw_with<S: Scalar>(params: &FractalParams, image_out: &mut RgbImage) -> DrawStats {
    let analyzed = AnalyzedPolynomial::new(params.zeros.clone())
        .expect("params.zeros is non-empty by FractalParams::new's own validation");
    let polynomial: BlockPolynomial<S> = BlockPolynomial::from_analyzed(&analyzed);

    let rect = ImageRect::full(params.width, params.height);
    let stream = PixelStream::new(params, rect);
    let iterator = BlockIterator::new(&polynomial, stream, params.max_iters);

    let mut iterations = 0u64;
    let total = iterator.run(|metadata, zero_index| {
        image_out
            .set_pixel(
                Point { x: metadata.x as i32, y: metadata.y as i32 },
                params.colors[zero_index],
            )
            .expect("pixel stream only yields coordinates within image_out's bounds");
    });
    iterations += total;

    DrawStats::whole_image(params, iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::colour::Colour;
    use crate::core::data::complex::Complex;
    use crate::core::data::fractal_params::{HandlerKind, PngEncoder, Strategy};
    use crate::core::data::rgb_image::new_image;

    fn params(width: u32, height: u32, precision: Precision) -> FractalParams {
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
            precision,
            Strategy::Block,
            PngEncoder::default(),
            HandlerKind::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_draw_block_single_colors_every_pixel_with_a_palette_color_f32() {
        let p = params(10, 10, Precision::Single);
        let mut image = new_image(10, 10);
        draw_block_single(&p, &mut image);

        for y in 0..10 {
            for x in 0..10 {
                let pixel = image.get_pixel(crate::core::data::point::Point { x, y }).unwrap();
                assert!(p.colors.contains(&pixel));
            }
        }
    }

    #[test]
    fn test_draw_block_single_colors_every_pixel_with_a_palette_color_f64() {
        let p = params(10, 10, Precision::Double);
        let mut image = new_image(10, 10);
        draw_block_single(&p, &mut image);

        for y in 0..10 {
            for x in 0..10 {
                let pixel = image.get_pixel(crate::core::data::point::Point { x, y }).unwrap();
                assert!(p.colors.contains(&pixel));
            }
        }
    }
}
