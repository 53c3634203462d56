use crate::core::data::colour::Colour;
use crate::core::data::complex::Complex;
use std::error::Error;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    Naive,
    Block,
    BlockThreaded,
    BlockThreadedIncremental,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::BlockThreadedIncremental
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PngEncoder {
    A,
    B,
}

impl Default for PngEncoder {
    fn default() -> Self {
        Self::A
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    Synchronous,
    Pipelined,
    Asynchronous,
}

impl Default for HandlerKind {
    fn default() -> Self {
        Self::Synchronous
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FractalParamsError {
    EmptySessionId,
    NonPositiveRequestId,
    NonFinite { field: &'static str },
    NonPositive { field: &'static str },
    ZeroDimension { field: &'static str },
    ZeroZeros,
    MismatchedLengths { zeros: usize, colors: usize },
}

impl fmt::Display for FractalParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySessionId => write!(f, "session_id must not be empty"),
            Self::NonPositiveRequestId => write!(f, "request_id must be positive"),
            Self::NonFinite { field } => write!(f, "{} must be finite", field),
            Self::NonPositive { field } => write!(f, "{} must be positive", field),
            Self::ZeroDimension { field } => write!(f, "{} must be a positive integer", field),
            Self::ZeroZeros => write!(f, "zeros must not be empty"),
            Self::MismatchedLengths { zeros, colors } => write!(
                f,
                "zeros and colors must be the same length, got {} and {}",
                zeros, colors
            ),
        }
    }
}

impl Error for FractalParamsError {}

/// A value describing one frame request: identity/watermarking, viewport,
/// raster size, the polynomial being drawn, and per-request strategy
/// options.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalParams {
    pub session_id: String,
    pub request_id: u64,
    pub last_data_id: u64,
    pub last_viewport_id: u64,

    pub r_min: f64,
    pub i_min: f64,
    pub r_range: f64,

    pub width: u32,
    pub height: u32,
    pub max_iters: u32,

    pub zeros: Vec<Complex>,
    pub colors: Vec<Colour>,

    pub precision: Precision,
    pub strategy: Strategy,
    pub png_encoder: PngEncoder,
    pub handler: HandlerKind,
}

impl FractalParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        request_id: u64,
        last_data_id: u64,
        last_viewport_id: u64,
        r_min: f64,
        i_min: f64,
        r_range: f64,
        width: u32,
        height: u32,
        max_iters: u32,
        zeros: Vec<Complex>,
        colors: Vec<Colour>,
        precision: Precision,
        strategy: Strategy,
        png_encoder: PngEncoder,
        handler: HandlerKind,
    ) -> Result<Self, FractalParamsError> {
        if session_id.is_empty() {
            return Err(FractalParamsError::EmptySessionId);
        }
        if request_id == 0 {
            return Err(FractalParamsError::NonPositiveRequestId);
        }
        if !r_min.is_finite() {
            return Err(FractalParamsError::NonFinite { field: "r_min" });
        }
        if !i_min.is_finite() {
            return Err(FractalParamsError::NonFinite { field: "i_min" });
        }
        if !r_range.is_finite() {
            return Err(FractalParamsError::NonFinite { field: "r_range" });
        }
        if r_range <= 0.0 {
            return Err(FractalParamsError::NonPositive { field: "r_range" });
        }
        if width == 0 {
            return Err(FractalParamsError::ZeroDimension { field: "width" });
        }
        if height == 0 {
            return Err(FractalParamsError::ZeroDimension { field: "height" });
        }
        if max_iters == 0 {
            return Err(FractalParamsError::ZeroDimension { field: "max_iters" });
        }
        if zeros.is_empty() {
            return Err(FractalParamsError::ZeroZeros);
        }
        if zeros.len() != colors.len() {
            return Err(FractalParamsError::MismatchedLengths {
                zeros: zeros.len(),
                colors: colors.len(),
            });
        }

        Ok(Self {
            session_id,
            request_id,
            last_data_id,
            last_viewport_id,
            r_min,
            i_min,
            r_range,
            width,
            height,
            max_iters,
            zeros,
            colors,
            precision,
            strategy,
            png_encoder,
            handler,
        })
    }

    /// The i-axis extent, derived so pixels are square: `r_range * height / width`.
    #[must_use]
    pub fn i_range(&self) -> f64 {
        self.r_range * self.height as f64 / self.width as f64
    }

    #[must_use]
    pub fn r_delta(&self) -> f64 {
        self.r_range / self.width as f64
    }

    #[must_use]
    pub fn i_delta(&self) -> f64 {
        self.i_range() / self.height as f64
    }

    /// Same width, height, max_iters, zeros, colors, precision, and same
    /// `r_range` — only `r_min`/`i_min` may differ.
    #[must_use]
    pub fn pan_only_differ(a: &Self, b: &Self) -> bool {
        a.width == b.width
            && a.height == b.height
            && a.max_iters == b.max_iters
            && a.zeros == b.zeros
            && a.colors == b.colors
            && a.precision == b.precision
            && a.r_range == b.r_range
    }

    /// Same width, height, max_iters, zeros, colors, precision; `r_min`,
    /// `i_min`, `r_range` may differ.
    #[must_use]
    pub fn viewport_only_differ(a: &Self, b: &Self) -> bool {
        a.width == b.width
            && a.height == b.height
            && a.max_iters == b.max_iters
            && a.zeros == b.zeros
            && a.colors == b.colors
            && a.precision == b.precision
    }
}

/// Parameters for the synchronous handler's `/save` route.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveParams {
    pub base: FractalParams,
    pub scale: u32,
    pub save_file: String,
    pub save_metadata: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_params(session_id: &str, request_id: u64) -> FractalParams {
        FractalParams::new(
            session_id.to_string(),
            request_id,
            0,
            0,
            -2.0,
            -2.0,
            4.0,
            64,
            64,
            50,
            vec![Complex {
                real: 1.0,
                imag: 0.0,
            }],
            vec![Colour { r: 255, g: 0, b: 0 }],
            Precision::Single,
            Strategy::default(),
            PngEncoder::default(),
            HandlerKind::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_empty_session_id() {
        let result = FractalParams::new(
            String::new(),
            1,
            0,
            0,
            -2.0,
            -2.0,
            4.0,
            64,
            64,
            50,
            vec![Complex::ZERO],
            vec![Colour { r: 0, g: 0, b: 0 }],
            Precision::Single,
            Strategy::default(),
            PngEncoder::default(),
            HandlerKind::default(),
        );
        assert_eq!(result, Err(FractalParamsError::EmptySessionId));
    }

    #[test]
    fn test_rejects_zero_request_id() {
        let result = FractalParams::new(
            "s".to_string(),
            0,
            0,
            0,
            -2.0,
            -2.0,
            4.0,
            64,
            64,
            50,
            vec![Complex::ZERO],
            vec![Colour { r: 0, g: 0, b: 0 }],
            Precision::Single,
            Strategy::default(),
            PngEncoder::default(),
            HandlerKind::default(),
        );
        assert_eq!(result, Err(FractalParamsError::NonPositiveRequestId));
    }

    #[test]
    fn test_rejects_non_finite_r_range() {
        let result = FractalParams::new(
            "s".to_string(),
            1,
            0,
            0,
            -2.0,
            -2.0,
            f64::NAN,
            64,
            64,
            50,
            vec![Complex::ZERO],
            vec![Colour { r: 0, g: 0, b: 0 }],
            Precision::Single,
            Strategy::default(),
            PngEncoder::default(),
            HandlerKind::default(),
        );
        assert_eq!(
            result,
            Err(FractalParamsError::NonFinite { field: "r_range" })
        );
    }

    #[test]
    fn test_rejects_mismatched_zero_and_color_counts() {
        let result = FractalParams::new(
            "s".to_string(),
            1,
            0,
            0,
            -2.0,
            -2.0,
            4.0,
            64,
            64,
            50,
            vec![
                Complex::ZERO,
                Complex {
                    real: 1.0,
                    imag: 0.0,
                },
            ],
            vec![Colour { r: 0, g: 0, b: 0 }],
            Precision::Single,
            Strategy::default(),
            PngEncoder::default(),
            HandlerKind::default(),
        );
        assert_eq!(
            result,
            Err(FractalParamsError::MismatchedLengths {
                zeros: 2,
                colors: 1
            })
        );
    }

    #[test]
    fn test_i_range_is_derived_from_aspect_ratio() {
        let mut params = valid_params("s", 1);
        params.width = 100;
        params.height = 50;
        params.r_range = 4.0;
        assert_eq!(params.i_range(), 2.0);
    }

    #[test]
    fn test_pan_only_differ_true_for_moved_origin() {
        let a = valid_params("s", 1);
        let mut b = a.clone();
        b.r_min += 1.0;
        b.i_min -= 1.0;
        assert!(FractalParams::pan_only_differ(&a, &b));
    }

    #[test]
    fn test_pan_only_differ_false_when_range_changes() {
        let a = valid_params("s", 1);
        let mut b = a.clone();
        b.r_range *= 2.0;
        assert!(!FractalParams::pan_only_differ(&a, &b));
    }

    #[test]
    fn test_viewport_only_differ_true_for_zoom() {
        let a = valid_params("s", 1);
        let mut b = a.clone();
        b.r_range /= 2.0;
        assert!(FractalParams::viewport_only_differ(&a, &b));
    }

    #[test]
    fn test_viewport_only_differ_false_when_zeros_change() {
        let a = valid_params("s", 1);
        let mut b = a.clone();
        b.zeros.push(Complex {
            real: -1.0,
            imag: 0.0,
        });
        b.colors.push(Colour { r: 0, g: 255, b: 0 });
        assert!(!FractalParams::viewport_only_differ(&a, &b));
    }
}
