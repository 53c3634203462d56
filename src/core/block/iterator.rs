use crate::core::block::block_polynomial::BlockPolynomial;
use crate::core::block::cplx::Cplx;
use crate::core::block::scalar::Scalar;
use crate::core::data::pixel_metadata::PixelMetadata;
use crate::core::pixel_stream::PixelStream;

/// Width of the SIMD-shaped block: a power of two, chosen as a compile-time
/// constant rather than a runtime knob (see DESIGN.md).
pub const BLOCK_WIDTH: usize = 32;

/// Drives Newton iteration over an N-wide block of in-flight pixels packed
/// into parallel real/imaginary arrays, retiring converged (or exhausted)
/// pixels and refilling their slot from the pixel stream until the stream is
/// drained and every slot is empty.
pub struct BlockIterator<'a, S: Scalar> {
    polynomial: &'a BlockPolynomial<S>,
    stream: PixelStream,
    max_iters: u32,
    re: [S; BLOCK_WIDTH],
    im: [S; BLOCK_WIDTH],
    metadata: [Option<PixelMetadata>; BLOCK_WIDTH],
}

impl<'a, S: Scalar> BlockIterator<'a, S> {
    pub fn new(polynomial: &'a BlockPolynomial<S>, mut stream: PixelStream, max_iters: u32) -> Self {
        let mut re = [S::zero(); BLOCK_WIDTH];
        let mut im = [S::zero(); BLOCK_WIDTH];
        let mut metadata: [Option<PixelMetadata>; BLOCK_WIDTH] = [None; BLOCK_WIDTH];

        for slot in 0..BLOCK_WIDTH {
            if let Some((r, i, meta)) = stream.next() {
                re[slot] = S::from_f64(r);
                im[slot] = S::from_f64(i);
                metadata[slot] = Some(meta);
            }
        }

        Self {
            polynomial,
            stream,
            max_iters,
            re,
            im,
            metadata,
        }
    }

    /// Runs every pass until the stream is exhausted and no slot remains
    /// active. `sink` is called once per finalized pixel with its metadata
    /// (position, final iteration count) and the index of the zero it was
    /// colored with. Returns the total number of Newton steps performed,
    /// for diagnostics only.
    pub fn run(mut self, mut sink: impl FnMut(PixelMetadata, usize)) -> u64 {
        let mut total_iterations: u64 = 0;

        loop {
            if self.metadata.iter().all(Option::is_none) {
                break;
            }

            // Step every slot, including empty ones: their output is ignored
            // and this keeps the pass branch-free over the block width.
            for slot in 0..BLOCK_WIDTH {
                let z = Cplx { re: self.re[slot], im: self.im[slot] };
                let next = self.polynomial.newton_step(z);
                self.re[slot] = next.re;
                self.im[slot] = next.im;
            }

            for slot in 0..BLOCK_WIDTH {
                let Some(meta) = &mut self.metadata[slot] else {
                    continue;
                };
                meta.iteration_count += 1;
                total_iterations += 1;
                let z = Cplx { re: self.re[slot], im: self.im[slot] };

                let finalized_zero = if meta.iteration_count >= self.max_iters {
                    Some(self.polynomial.closest_zero_index(z))
                } else {
                    self.polynomial.converged_zero_index(z)
                };

                if let Some(zero_index) = finalized_zero {
                    sink(*meta, zero_index);
                    match self.stream.next() {
                        Some((r, i, new_meta)) => {
                            self.re[slot] = S::from_f64(r);
                            self.im[slot] = S::from_f64(i);
                            self.metadata[slot] = Some(new_meta);
                        }
                        None => self.metadata[slot] = None,
                    }
                }
            }
        }

        total_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::region_algebra::ImageRect;
    use crate::core::block::block_polynomial::BlockPolynomial;
    use crate::core::data::colour::Colour;
    use crate::core::data::complex::Complex;
    use crate::core::data::fractal_params::{FractalParams, HandlerKind, PngEncoder, Precision, Strategy};
    use crate::core::data::polynomial::AnalyzedPolynomial;
    use std::collections::HashMap;

    fn params(width: u32, height: u32, max_iters: u32) -> FractalParams {
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
            max_iters,
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
            Strategy::default(),
            PngEncoder::default(),
            HandlerKind::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_run_colors_every_pixel_exactly_once() {
        let p = params(16, 16, 50);
        let analyzed = AnalyzedPolynomial::new(p.zeros.clone()).unwrap();
        let poly: BlockPolynomial<f64> = BlockPolynomial::from_analyzed(&analyzed);
        let rect = ImageRect { x_min: 0, x_max: p.width, y_min: 0, y_max: p.height };
        let stream = PixelStream::new(&p, rect);
        let iterator = BlockIterator::new(&poly, stream, p.max_iters);

        let mut colored: HashMap<(u32, u32), usize> = HashMap::new();
        iterator.run(|meta, zero_index| {
            colored.insert((meta.x, meta.y), zero_index);
        });

        assert_eq!(colored.len(), 16 * 16);
    }

    #[test]
    fn test_pixel_exactly_on_a_zero_converges_to_that_zero() {
        // width=height=4, r_range=4 => r_delta = i_delta = 1, so the zero at
        // (1, 0) lands exactly on pixel (x=3, y=1): a Newton step starting
        // exactly on a root stays there, so this is deterministic without
        // needing to reason about basin boundaries.
        let p = params(4, 4, 50);
        let analyzed = AnalyzedPolynomial::new(p.zeros.clone()).unwrap();
        let poly: BlockPolynomial<f64> = BlockPolynomial::from_analyzed(&analyzed);
        let rect = ImageRect { x_min: 0, x_max: p.width, y_min: 0, y_max: p.height };
        let stream = PixelStream::new(&p, rect);
        let iterator = BlockIterator::new(&poly, stream, p.max_iters);

        let mut colored: HashMap<(u32, u32), usize> = HashMap::new();
        iterator.run(|meta, zero_index| {
            colored.insert((meta.x, meta.y), zero_index);
        });

        assert_eq!(colored[&(3, 1)], 0);
    }

    #[test]
    fn test_run_with_tiny_max_iters_still_colors_every_pixel() {
        // Forces the closest-zero fallback for pixels that never converge.
        let p = params(8, 8, 1);
        let analyzed = AnalyzedPolynomial::new(p.zeros.clone()).unwrap();
        let poly: BlockPolynomial<f64> = BlockPolynomial::from_analyzed(&analyzed);
        let rect = ImageRect { x_min: 0, x_max: p.width, y_min: 0, y_max: p.height };
        let stream = PixelStream::new(&p, rect);
        let iterator = BlockIterator::new(&poly, stream, p.max_iters);

        let mut count = 0;
        iterator.run(|_, _| count += 1);
        assert_eq!(count, 64);
    }
}
