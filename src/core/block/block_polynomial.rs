use crate::core::block::cplx::Cplx;
use crate::core::block::scalar::Scalar;
use crate::core::data::polynomial::AnalyzedPolynomial;

/// [`AnalyzedPolynomial`] converted into a generic precision for the block
/// iterator's hot loop. Built once per draw from the `f64` analysis that the
/// handler boundary already produced from `params.zeros`.
pub struct BlockPolynomial<S: Scalar> {
    coefficients: Vec<Cplx<S>>,
    derivative_coefficients: Vec<Cplx<S>>,
    zeros: Vec<Cplx<S>>,
    convergence_radius: S,
    convergence_radius_squared: S,
}

impl<S: Scalar> BlockPolynomial<S> {
    #[must_use]
    pub fn from_analyzed(analyzed: &AnalyzedPolynomial) -> Self {
        let coefficients = analyzed
            .polynomial()
            .coefficients()
            .iter()
            .map(|&c| Cplx::from_complex(c))
            .collect();
        let derivative_coefficients = analyzed
            .derivative_polynomial()
            .coefficients()
            .iter()
            .map(|&c| Cplx::from_complex(c))
            .collect();
        let zeros = analyzed
            .zeros()
            .iter()
            .map(|&c| Cplx::from_complex(c))
            .collect();
        let convergence_radius = if analyzed.convergence_radius().is_infinite() {
            S::from_f64(f64::MAX)
        } else {
            S::from_f64(analyzed.convergence_radius())
        };

        Self {
            coefficients,
            derivative_coefficients,
            zeros,
            convergence_radius,
            convergence_radius_squared: convergence_radius * convergence_radius,
        }
    }

    fn evaluate(coefficients: &[Cplx<S>], z: Cplx<S>) -> Cplx<S> {
        let mut acc = Cplx { re: S::zero(), im: S::zero() };
        for &c in coefficients.iter().rev() {
            acc = acc * z + c;
        }
        acc
    }

    /// One Newton step: `z - p(z) / p'(z)`.
    #[must_use]
    pub fn newton_step(&self, z: Cplx<S>) -> Cplx<S> {
        z - Self::evaluate(&self.coefficients, z) / Self::evaluate(&self.derivative_coefficients, z)
    }

    /// Index of the zero whose convergence disc contains `z`, using the
    /// same box-test-before-magnitude-check shortcut as
    /// [`AnalyzedPolynomial::converged_zero_index`].
    #[must_use]
    pub fn converged_zero_index(&self, z: Cplx<S>) -> Option<usize> {
        self.zeros.iter().position(|&zero| {
            let dr = (z.re - zero.re).abs();
            let di = (z.im - zero.im).abs();
            if dr > self.convergence_radius || di > self.convergence_radius {
                return false;
            }
            (z - zero).magnitude_squared() <= self.convergence_radius_squared
        })
    }

    /// Index of the closest zero, the guaranteed-coloring fallback for
    /// pixels that exhaust `max_iters` without converging.
    #[must_use]
    pub fn closest_zero_index(&self, z: Cplx<S>) -> usize {
        self.zeros
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (z - **a).magnitude_squared();
                let db = (z - **b).magnitude_squared();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .expect("zeros is non-empty by AnalyzedPolynomial's construction invariant")
    }
}
