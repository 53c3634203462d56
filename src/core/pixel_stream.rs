use crate::core::actions::region_algebra::ImageRect;
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::pixel_metadata::PixelMetadata;

/// Replays `start + step` repeatedly `count` times, the same way the region
/// algebra's range-overlap search does, so a pixel produced by a partial
/// stream over a sub-rectangle carries exactly the same `(r, i)` a full
/// from-scratch render would have produced for that pixel. A closed-form
/// `start + step * count` would drift from that accumulation by an ULP or
/// two and show up as a visible seam at strip boundaries.
fn accumulate(start: f64, step: f64, count: u32) -> f64 {
    let mut value = start;
    for _ in 0..count {
        value += step;
    }
    value
}

/// A restartable, finite, row-major enumerator of `(r, i, metadata)` over a
/// rectangle of an image. Rows are visited with `y` decreasing so that the
/// math-coordinate `i` increases monotonically, matching the accumulation
/// order the region algebra assumes when computing overlaps.
pub struct PixelStream {
    r_delta: f64,
    i_delta: f64,
    r_row_start: f64,
    x_min: u32,
    x_max: u32,
    y_min: u32,
    r: f64,
    i: f64,
    x: u32,
    y: i64,
}

impl PixelStream {
    #[must_use]
    pub fn new(params: &FractalParams, rect: ImageRect) -> Self {
        let r_delta = params.r_delta();
        let i_delta = params.i_delta();
        let r_row_start = accumulate(params.r_min, r_delta, rect.x_min);

        if rect.is_empty() {
            return Self {
                r_delta,
                i_delta,
                r_row_start,
                x_min: rect.x_min,
                x_max: rect.x_max,
                y_min: rect.y_min,
                r: r_row_start,
                i: params.i_min,
                x: rect.x_min,
                y: i64::from(rect.y_min) - 1,
            };
        }

        // i_min corresponds to the bottommost row (y = height - 1); walking
        // up to the first row of this rectangle takes `height - y_max` steps.
        let i_start = accumulate(params.i_min, i_delta, params.height - rect.y_max);

        Self {
            r_delta,
            i_delta,
            r_row_start,
            x_min: rect.x_min,
            x_max: rect.x_max,
            y_min: rect.y_min,
            r: r_row_start,
            i: i_start,
            x: rect.x_min,
            y: i64::from(rect.y_max) - 1,
        }
    }

    #[must_use]
    pub fn done(&self) -> bool {
        self.y < i64::from(self.y_min)
    }

    pub fn next(&mut self) -> Option<(f64, f64, PixelMetadata)> {
        if self.done() {
            return None;
        }

        let r = self.r;
        let i = self.i;
        let metadata = PixelMetadata {
            x: self.x,
            y: self.y as u32,
            iteration_count: 0,
        };

        self.x += 1;
        if self.x >= self.x_max {
            self.x = self.x_min;
            self.r = self.r_row_start;
            self.y -= 1;
            self.i += self.i_delta;
        } else {
            self.r += self.r_delta;
        }

        Some((r, i, metadata))
    }
}
