use std::ops::{Add, Div, Mul, Neg, Sub};

/// The numeric precision the block iterator runs its Newton steps in.
/// Chosen per-request at the handler boundary (`params.precision`); below
/// that boundary, the block iterator and its polynomial are generic over
/// this trait so there is exactly one implementation of the hot loop.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn from_f64(value: f64) -> Self;
    fn zero() -> Self;
    fn abs(self) -> Self;
}

impl Scalar for f32 {
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn zero() -> Self {
        0.0
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }
}

impl Scalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn zero() -> Self {
        0.0
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }
}
