use std::error::Error;
use std::fmt;

use crate::core::data::fractal_params::FractalParams;
use crate::handlers::watermark::Watermark;

/// An encoded frame plus the watermark identifying what it shows, returned
/// by every handler's `handle_fractal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FractalImage {
    pub png_bytes: Vec<u8>,
    pub watermark: Watermark,
}

/// The one failure mode common to all three handlers: a background pipeline
/// that has been killed (by a session reset racing the request, or shutdown)
/// and will never produce another frame for the watermark requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerDead;

impl fmt::Display for HandlerDead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler pipeline was killed before it could serve this request")
    }
}

impl Error for HandlerDead {}

/// Behavior shared by all three handler strategies, dispatched to by
/// [`crate::handlers::group::HandlerGroup`].
pub trait Handler: Send + Sync {
    /// Accepts a fresh viewport/params update without waiting for a frame.
    fn handle_params(&self, params: FractalParams);

    /// Accepts params and blocks (this thread only — callers run it via
    /// `spawn_blocking`) until a corresponding frame is ready, returning its
    /// encoded bytes and watermark.
    fn handle_fractal(&self, params: FractalParams) -> Result<FractalImage, HandlerDead>;
}
