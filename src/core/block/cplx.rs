use crate::core::block::scalar::Scalar;
use crate::core::data::complex::Complex;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A complex number over a generic [`Scalar`], used inside the block
/// iterator so the same code runs the Newton step in `f32` or `f64`
/// depending on `params.precision`. Mirrors [`Complex`] exactly; kept
/// separate so [`Complex`] (used throughout the data model and region
/// algebra) stays concretely `f64`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cplx<S: Scalar> {
    pub re: S,
    pub im: S,
}

impl<S: Scalar> Cplx<S> {
    #[must_use]
    pub fn from_complex(value: Complex) -> Self {
        Self {
            re: S::from_f64(value.real),
            im: S::from_f64(value.imag),
        }
    }

    #[must_use]
    pub fn magnitude_squared(self) -> S {
        self.re * self.re + self.im * self.im
    }
}

impl<S: Scalar> Add for Cplx<S> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
}

impl<S: Scalar> Sub for Cplx<S> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

impl<S: Scalar> Neg for Cplx<S> {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl<S: Scalar> Mul for Cplx<S> {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }
}

impl<S: Scalar> Div for Cplx<S> {
    type Output = Self;

    /// Division by a zero or near-zero divisor is allowed to produce an
    /// infinite/NaN result, matching [`Complex::div`]: the block iterator
    /// treats this as a point outside every convergence disc rather than a
    /// special case.
    fn div(self, other: Self) -> Self {
        let denom = other.magnitude_squared();
        Self {
            re: (self.re * other.re + self.im * other.im) / denom,
            im: (self.im * other.re - self.re * other.im) / denom,
        }
    }
}
