use crate::core::data::colour::Colour;
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::point::Point;
use crate::core::data::rgb_image::RgbImage;

/// A half-open rectangle, `[x_min, x_max) x [y_min, y_max)`, as used by the
/// region algebra. Distinct from [`crate::core::data::pixel_rect::PixelRect`],
/// which is inclusive on both corners and used for banding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageRect {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl ImageRect {
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x_min: 0,
            x_max: width,
            y_min: 0,
            y_max: height,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    #[must_use]
    pub fn count_pixels(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x_min >= self.x_max || self.y_min >= self.y_max
    }
}

/// Corresponding min points on two overlapping 1-D ranges, plus the shared
/// extent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RangeOverlap {
    pub a_min: u32,
    pub b_min: u32,
    pub extent: u32,
}

/// An overlap between two images `a` and `b`, represented as corresponding
/// rectangles in each.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageOverlap {
    pub a_region: ImageRect,
    pub b_region: ImageRect,
}

/// The delta between two images: the region of overlap (if any) plus the
/// rectangles unique to `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDelta {
    pub overlap: Option<ImageOverlap>,
    pub b_only: Vec<ImageRect>,
}

/// Replays the same accumulating addition the pixel stream uses, so
/// overlapping pixels are bit-identical to a re-render — no seams. This is
/// computed incrementally, never via `(end - start) / step`, to reproduce
/// the exact floating-point drift of the draw loop.
#[must_use]
pub fn find_range_overlap(a_min: f64, b_min: f64, step: f64, num_pixels: u32) -> Option<RangeOverlap> {
    let start = a_min.min(b_min);
    let end = a_min.max(b_min);

    let mut offset: u32 = 0;
    let mut curr = start;
    let mut prev = start;
    while offset < num_pixels && curr < end {
        offset += 1;
        prev = curr;
        curr += step;
    }
    if offset > 0 && (end - prev).abs() < (end - curr).abs() {
        offset -= 1;
    }
    if offset == num_pixels {
        return None;
    }

    if a_min < b_min {
        Some(RangeOverlap {
            a_min: offset,
            b_min: 0,
            extent: num_pixels - offset,
        })
    } else {
        Some(RangeOverlap {
            a_min: 0,
            b_min: offset,
            extent: num_pixels - offset,
        })
    }
}

/// Pan-only overlap: `a` and `b` share `width`, `height` and `r_range` (and
/// therefore the same step), differing only in `r_min`/`i_min`.
#[must_use]
pub fn find_pan_only_overlap(a: &FractalParams, b: &FractalParams) -> Option<ImageOverlap> {
    let width = a.width;
    let height = a.height;
    let r_step = a.r_delta();
    let i_step = a.i_delta();

    let r_overlap = find_range_overlap(a.r_min, b.r_min, r_step, width)?;
    let i_overlap = find_range_overlap(a.i_min, b.i_min, i_step, height)?;

    // The r/x part maps directly.
    let a_x_min = r_overlap.a_min;
    let a_x_max = r_overlap.a_min + r_overlap.extent;
    let b_x_min = r_overlap.b_min;
    let b_x_max = r_overlap.b_min + r_overlap.extent;

    // The i/y part runs in the opposite direction: y grows downward, i grows
    // upward.
    let a_y_max = height - i_overlap.a_min;
    let a_y_min = height - i_overlap.a_min - i_overlap.extent;
    let b_y_max = height - i_overlap.b_min;
    let b_y_min = height - i_overlap.b_min - i_overlap.extent;

    Some(ImageOverlap {
        a_region: ImageRect {
            x_min: a_x_min,
            x_max: a_x_max,
            y_min: a_y_min,
            y_max: a_y_max,
        },
        b_region: ImageRect {
            x_min: b_x_min,
            x_max: b_x_max,
            y_min: b_y_min,
            y_max: b_y_max,
        },
    })
}

/// The four b-only rectangles tile the complement of `b.overlap` inside `b`:
/// left strip full-height, right strip full-height, top/bottom strips
/// clipped to the overlap's x range. Empty strips are omitted.
#[must_use]
pub fn compute_pan_only_delta(a: &FractalParams, b: &FractalParams) -> ImageDelta {
    let overlap = find_pan_only_overlap(a, b);

    let Some(overlap) = overlap else {
        return ImageDelta {
            overlap: None,
            b_only: vec![ImageRect {
                x_min: 0,
                x_max: b.width,
                y_min: 0,
                y_max: b.height,
            }],
        };
    };

    let b_overlap = overlap.b_region;
    let mut b_only = Vec::with_capacity(4);

    if b_overlap.x_min > 0 {
        b_only.push(ImageRect {
            x_min: 0,
            x_max: b_overlap.x_min,
            y_min: 0,
            y_max: b.height,
        });
    }
    if b_overlap.x_max < b.width {
        b_only.push(ImageRect {
            x_min: b_overlap.x_max,
            x_max: b.width,
            y_min: 0,
            y_max: b.height,
        });
    }
    if b_overlap.y_min > 0 {
        b_only.push(ImageRect {
            x_min: b_overlap.x_min,
            x_max: b_overlap.x_max,
            y_min: 0,
            y_max: b_overlap.y_min,
        });
    }
    if b_overlap.y_max < b.height {
        b_only.push(ImageRect {
            x_min: b_overlap.x_min,
            x_max: b_overlap.x_max,
            y_min: b_overlap.y_max,
            y_max: b.height,
        });
    }

    ImageDelta {
        overlap: Some(overlap),
        b_only,
    }
}

/// General overlap, used when only the viewport differs (pan and/or zoom).
/// Maps `a`'s whole rectangle into `b`'s coordinate space via the affine
/// transform implied by each image's `(r_min, i_min, r_range, i_range)`,
/// clamps to `b`'s bounds, then round-trips back to `a` and clamps again so
/// both rectangles are valid and correspond.
#[must_use]
pub fn find_general_overlap(a: &FractalParams, b: &FractalParams) -> Option<ImageOverlap> {
    // a's full rectangle, mapped into b's r/i space then into b's pixel space.
    let a_r_min = a.r_min;
    let a_r_max = a.r_min + a.r_range;
    let a_i_min = a.i_min;
    let a_i_max = a.i_min + a.i_range();

    let b_x_of_r = |r: f64| -> f64 { (r - b.r_min) / b.r_delta() };
    let b_y_of_i = |i: f64| -> f64 { b.height as f64 - (i - b.i_min) / b.i_delta() };

    let b_x_min = b_x_of_r(a_r_min).clamp(0.0, b.width as f64);
    let b_x_max = b_x_of_r(a_r_max).clamp(0.0, b.width as f64);
    // y is inverted relative to i: i_max maps to the smaller y.
    let b_y_top = b_y_of_i(a_i_max).clamp(0.0, b.height as f64);
    let b_y_bottom = b_y_of_i(a_i_min).clamp(0.0, b.height as f64);

    if b_x_max <= b_x_min || b_y_bottom <= b_y_top {
        return None;
    }

    // Round-trip back into a's pixel space.
    let a_r_of_x = |x: f64| -> f64 { b.r_min + x * b.r_delta() };
    let a_i_of_y = |y: f64| -> f64 { b.i_min + (b.height as f64 - y) * b.i_delta() };

    let a_x_of_r = |r: f64| -> f64 { (r - a.r_min) / a.r_delta() };
    let a_y_of_i = |i: f64| -> f64 { a.height as f64 - (i - a.i_min) / a.i_delta() };

    let a_x_min = a_x_of_r(a_r_of_x(b_x_min)).clamp(0.0, a.width as f64);
    let a_x_max = a_x_of_r(a_r_of_x(b_x_max)).clamp(0.0, a.width as f64);
    let a_y_top = a_y_of_i(a_i_of_y(b_y_top)).clamp(0.0, a.height as f64);
    let a_y_bottom = a_y_of_i(a_i_of_y(b_y_bottom)).clamp(0.0, a.height as f64);

    if a_x_max <= a_x_min || a_y_bottom <= a_y_top {
        return None;
    }

    Some(ImageOverlap {
        a_region: ImageRect {
            x_min: a_x_min.round() as u32,
            x_max: a_x_max.round() as u32,
            y_min: a_y_top.round() as u32,
            y_max: a_y_bottom.round() as u32,
        },
        b_region: ImageRect {
            x_min: b_x_min.round() as u32,
            x_max: b_x_max.round() as u32,
            y_min: b_y_top.round() as u32,
            y_max: b_y_bottom.round() as u32,
        },
    })
}

/// Blits the overlapping rectangle from `from` to `to`. Callers (the
/// incremental draw orchestrator) guarantee the destination rectangle never
/// overlaps any other task's writes.
pub fn copy_overlap(from: &RgbImage, to: &mut RgbImage, overlap: &ImageOverlap) {
    let mut from_y = overlap.a_region.y_min;
    let mut to_y = overlap.b_region.y_min;
    while from_y < overlap.a_region.y_max {
        let mut from_x = overlap.a_region.x_min;
        let mut to_x = overlap.b_region.x_min;
        while from_x < overlap.a_region.x_max {
            let pixel = from
                .get_pixel(Point {
                    x: from_x as i32,
                    y: from_y as i32,
                })
                .expect("copy_overlap source rect validated against source image bounds");
            to.set_pixel(
                Point {
                    x: to_x as i32,
                    y: to_y as i32,
                },
                pixel,
            )
            .expect("copy_overlap destination rect validated against destination image bounds");
            from_x += 1;
            to_x += 1;
        }
        from_y += 1;
        to_y += 1;
    }
}

/// Fixed-point bilinear resize of the overlapping region of `from` into the
/// overlapping region of `to`. Non-overlap pixels of `to` are left
/// untouched (they default to black, an approximate frame during zoom).
pub fn resize_bilinear(from: &RgbImage, to: &mut RgbImage, overlap: &ImageOverlap) {
    const FACTOR: i64 = 2048;
    const SHIFT: u32 = 11;

    let from_rect = overlap.a_region;
    let to_rect = overlap.b_region;
    if to_rect.width() == 0 || to_rect.height() == 0 {
        return;
    }

    let x_scale = (FACTOR * i64::from(from_rect.width()) / i64::from(to_rect.width())).max(1);
    let y_scale = (FACTOR * i64::from(from_rect.height()) / i64::from(to_rect.height())).max(1);

    for y in 0..to_rect.height() as i64 {
        let to_y = y + i64::from(to_rect.y_min);
        let from_y_i = y * y_scale + i64::from(from_rect.y_min) * FACTOR;
        let from_y_0 = from_y_i >> SHIFT;
        let from_y_frac = from_y_i - (from_y_0 << SHIFT);

        if from_y_0 < 0 || from_y_0 + 1 >= i64::from(from.height()) {
            continue;
        }

        for x in 0..to_rect.width() as i64 {
            let to_x = x + i64::from(to_rect.x_min);
            let from_x_i = x * x_scale + i64::from(from_rect.x_min) * FACTOR;
            let from_x_0 = from_x_i >> SHIFT;
            let from_x_frac = from_x_i - (from_x_0 << SHIFT);

            if from_x_0 < 0 || from_x_0 + 1 >= i64::from(from.width()) {
                continue;
            }

            let p00 = from
                .get_pixel(Point { x: from_x_0 as i32, y: from_y_0 as i32 })
                .expect("bounds checked above");
            let p01 = from
                .get_pixel(Point { x: (from_x_0 + 1) as i32, y: from_y_0 as i32 })
                .expect("bounds checked above");
            let p10 = from
                .get_pixel(Point { x: from_x_0 as i32, y: (from_y_0 + 1) as i32 })
                .expect("bounds checked above");
            let p11 = from
                .get_pixel(Point { x: (from_x_0 + 1) as i32, y: (from_y_0 + 1) as i32 })
                .expect("bounds checked above");

            let blended = blend_channel(
                [p00.r, p01.r, p10.r, p11.r],
                from_x_frac,
                from_y_frac,
                FACTOR,
                SHIFT,
            );
            let blended_g = blend_channel(
                [p00.g, p01.g, p10.g, p11.g],
                from_x_frac,
                from_y_frac,
                FACTOR,
                SHIFT,
            );
            let blended_b = blend_channel(
                [p00.b, p01.b, p10.b, p11.b],
                from_x_frac,
                from_y_frac,
                FACTOR,
                SHIFT,
            );

            to.set_pixel(
                Point {
                    x: to_x as i32,
                    y: to_y as i32,
                },
                Colour {
                    r: blended,
                    g: blended_g,
                    b: blended_b,
                },
            )
            .expect("destination rect validated against destination image bounds");
        }
    }
}

fn blend_channel(corners: [u8; 4], x_frac: i64, y_frac: i64, factor: i64, shift: u32) -> u8 {
    let [c00, c01, c10, c11] = corners.map(i64::from);
    let p00 = c00 * (factor - x_frac) * (factor - y_frac);
    let p01 = c01 * x_frac * (factor - y_frac);
    let p10 = c10 * (factor - x_frac) * y_frac;
    let p11 = c11 * x_frac * y_frac;
    let blend = (p00 + p01 + p10 + p11 + (factor * factor / 2)) >> (2 * shift);
    blend.clamp(0, 255) as u8
}
