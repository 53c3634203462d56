use crate::core::data::complex::Complex;
use std::error::Error;
use std::fmt;

/// A polynomial stored as a dense coefficient list, lowest degree first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<Complex>,
}

impl Polynomial {
    /// Builds `prod(z - zero_i)` by repeated monomial multiplication.
    #[must_use]
    pub fn from_zeros(zeros: &[Complex]) -> Self {
        let mut coefficients = vec![Complex {
            real: 1.0,
            imag: 0.0,
        }];

        for &zero in zeros {
            let mut next = vec![Complex::ZERO; coefficients.len() + 1];
            for (i, &c) in coefficients.iter().enumerate() {
                next[i + 1] = next[i + 1] + c;
                next[i] = next[i] - c * zero;
            }
            coefficients = next;
        }

        Self { coefficients }
    }

    #[must_use]
    pub fn evaluate(&self, z: Complex) -> Complex {
        // Horner's method, highest degree first.
        let mut acc = Complex::ZERO;
        for &c in self.coefficients.iter().rev() {
            acc = acc * z + c;
        }
        acc
    }

    /// Dense coefficients, lowest degree first. Used by the block iterator
    /// to convert into its own precision-generic representation.
    #[must_use]
    pub fn coefficients(&self) -> &[Complex] {
        &self.coefficients
    }

    #[must_use]
    pub fn derivative(&self) -> Self {
        if self.coefficients.len() <= 1 {
            return Self {
                coefficients: vec![Complex::ZERO],
            };
        }

        let coefficients = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, &c)| {
                c * Complex {
                    real: power as f64,
                    imag: 0.0,
                }
            })
            .collect();

        Self { coefficients }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzedPolynomialError {
    EmptyZeroSet,
}

impl fmt::Display for AnalyzedPolynomialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyZeroSet => write!(f, "polynomial must have at least one zero"),
        }
    }
}

impl Error for AnalyzedPolynomialError {}

/// A polynomial derived from its zero set, together with the precomputed
/// quantities the Newton iterator and convergence test need on every step.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedPolynomial {
    zeros: Vec<Complex>,
    polynomial: Polynomial,
    derivative: Polynomial,
    convergence_radius: f64,
    convergence_radius_squared: f64,
}

impl AnalyzedPolynomial {
    pub fn new(zeros: Vec<Complex>) -> Result<Self, AnalyzedPolynomialError> {
        if zeros.is_empty() {
            return Err(AnalyzedPolynomialError::EmptyZeroSet);
        }

        let polynomial = Polynomial::from_zeros(&zeros);
        let derivative = polynomial.derivative();
        let convergence_radius = conservative_convergence_radius(&zeros);

        Ok(Self {
            zeros,
            polynomial,
            derivative,
            convergence_radius,
            convergence_radius_squared: convergence_radius * convergence_radius,
        })
    }

    #[must_use]
    pub fn zeros(&self) -> &[Complex] {
        &self.zeros
    }

    #[must_use]
    pub fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    #[must_use]
    pub fn derivative_polynomial(&self) -> &Polynomial {
        &self.derivative
    }

    #[must_use]
    pub fn convergence_radius(&self) -> f64 {
        self.convergence_radius
    }

    /// One Newton step: `z - p(z) / p'(z)`. May produce a non-finite result
    /// when `p'(z)` is zero or near-zero; callers do not special-case this,
    /// see [`crate::core::data::complex::Complex::div`].
    #[must_use]
    pub fn newton_step(&self, z: Complex) -> Complex {
        z - self.polynomial.evaluate(z) / self.derivative.evaluate(z)
    }

    /// Index of the zero whose convergence disc contains `z`, if any. Uses
    /// a cheap rectangular box test on the real/imaginary deltas before
    /// paying for the squared-magnitude comparison.
    #[must_use]
    pub fn converged_zero_index(&self, z: Complex) -> Option<usize> {
        self.zeros.iter().position(|&zero| {
            let dr = (z.real - zero.real).abs();
            let di = (z.imag - zero.imag).abs();
            if dr > self.convergence_radius || di > self.convergence_radius {
                return false;
            }
            z.distance_squared(zero) <= self.convergence_radius_squared
        })
    }

    /// Index of the zero closest to `z`, used as the guaranteed-coloring
    /// fallback when a pixel fails to converge within `max_iters`.
    #[must_use]
    pub fn closest_zero_index(&self, z: Complex) -> usize {
        self.zeros
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                z.distance_squared(**a)
                    .partial_cmp(&z.distance_squared(**b))
                    .expect("distances are always finite-comparable via total_cmp fallback")
            })
            .map(|(i, _)| i)
            .expect("zeros is non-empty by construction")
    }
}

/// Min pairwise distance between zeros, divided by 20. A single-zero
/// polynomial has no pairwise distance to measure; every point converges to
/// that one zero eventually via the closest-zero fallback regardless, so the
/// radius is defined as infinite in that degenerate case (see DESIGN.md).
fn conservative_convergence_radius(zeros: &[Complex]) -> f64 {
    if zeros.len() < 2 {
        return f64::INFINITY;
    }

    let mut min_distance_squared = f64::INFINITY;
    for i in 0..zeros.len() {
        for j in (i + 1)..zeros.len() {
            let d = zeros[i].distance_squared(zeros[j]);
            if d < min_distance_squared {
                min_distance_squared = d;
            }
        }
    }

    min_distance_squared.sqrt() / 20.0
}
