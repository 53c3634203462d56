use std::sync::{Arc, Mutex};

use crate::core::data::fractal_params::{FractalParams, SaveParams};
use crate::core::data::rgb_image::{new_image, RgbImage};
use crate::core::draw::draw;
use crate::core::sync::thread_pool::ThreadPool;
use crate::handlers::common::{FractalImage, Handler, HandlerDead};
use crate::handlers::watermark::Watermark;
use crate::adapters::png_encoder::encode_png;
use crate::storage::save::{save_fractal, SaveError};

struct State {
    session_id: Option<String>,
    previous: Option<(FractalParams, Arc<RgbImage>)>,
}

/// Compute, encode, and respond in one request thread, one frame per call.
/// No background threads: the simplest of the three handlers, and the only
/// one [`crate::handlers::group::HandlerGroup`] ever routes `/save` to,
/// since on-disk saves re-render at an explicit scale outside of any live
/// session's frame stream.
pub struct SynchronousHandler {
    pool: Arc<ThreadPool>,
    state: Mutex<State>,
}

impl SynchronousHandler {
    #[must_use]
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        Self {
            pool,
            state: Mutex::new(State {
                session_id: None,
                previous: None,
            }),
        }
    }

    fn guard_session(&self, params: &FractalParams) {
        let mut state = self.state.lock().expect("synchronous handler state poisoned");
        if state.session_id.as_deref() != Some(params.session_id.as_str()) {
            tracing::info!(
                old_session_id = state.session_id.as_deref().unwrap_or(""),
                new_session_id = %params.session_id,
                "synchronous handler session reset"
            );
            state.previous = None;
            state.session_id = Some(params.session_id.clone());
        }
    }

    /// Re-renders `save_params.base` at `save_params.scale` and writes it to
    /// disk under `base_dir`. Always a fresh full render: a save resolution
    /// generally doesn't match any live viewport's dimensions, so there is
    /// nothing to incrementally reuse.
    pub fn handle_save(&self, save_params: SaveParams, base_dir: &std::path::Path) -> Result<(), SaveError> {
        let mut scaled = save_params.base.clone();
        scaled.width = scaled.width.saturating_mul(save_params.scale).max(1);
        scaled.height = scaled.height.saturating_mul(save_params.scale).max(1);

        let start = std::time::Instant::now();
        let mut image = new_image(scaled.width, scaled.height);
        draw(&scaled, &mut image, None, &self.pool);
        let bytes = encode_png(&image, scaled.png_encoder);
        tracing::debug!(
            save_file = %save_params.save_file,
            width = scaled.width,
            height = scaled.height,
            duration_ms = start.elapsed().as_millis() as u64,
            "rendered save frame"
        );

        let result = save_fractal(base_dir, &save_params.save_file, &bytes, &save_params.save_metadata);
        if let Err(err) = &result {
            tracing::warn!(save_file = %save_params.save_file, error = %err, "save failed");
        }
        result
    }
}

impl Handler for SynchronousHandler {
    fn handle_params(&self, params: FractalParams) {
        self.guard_session(&params);
    }

    fn handle_fractal(&self, params: FractalParams) -> Result<FractalImage, HandlerDead> {
        self.guard_session(&params);

        let previous = {
            let state = self.state.lock().expect("synchronous handler state poisoned");
            state.previous.clone()
        };
        let previous_ref = previous.as_ref().map(|(p, img)| (p, img));

        let compute_start = std::time::Instant::now();
        let mut image = new_image(params.width, params.height);
        let stats = draw(&params, &mut image, previous_ref, &self.pool);
        let image = Arc::new(image);
        let compute_duration_ms = compute_start.elapsed().as_millis() as u64;

        {
            let mut state = self.state.lock().expect("synchronous handler state poisoned");
            state.previous = Some((params.clone(), Arc::clone(&image)));
        }

        let encode_start = std::time::Instant::now();
        let png_bytes = encode_png(&image, params.png_encoder);
        let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

        tracing::debug!(
            session_id = %params.session_id,
            request_id = params.request_id,
            copy_tasks = stats.copy_tasks,
            fresh_pixels = stats.fresh_pixels,
            compute_duration_ms,
            encode_duration_ms,
            "synchronous frame served"
        );

        Ok(FractalImage {
            png_bytes,
            watermark: Watermark::exact(params.request_id),
        })
    }
}
