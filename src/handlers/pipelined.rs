use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::adapters::png_encoder::encode_png;
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::rgb_image::{new_image, RgbImage};
use crate::core::draw::draw;
use crate::core::sync::thread_pool::ThreadPool;
use crate::core::sync::versioned_slot::{BlockingRead, VersionedSlot};
use crate::handlers::common::{FractalImage, Handler, HandlerDead};
use crate::handlers::watermark::Watermark;

/// The params that produced an image, alongside the image itself, so the
/// encode stage knows which `png_encoder` to use and the compute stage can
/// offer the image straight back to [`draw`] as `previous` on its next pass.
type RenderedFrame = (FractalParams, Arc<RgbImage>);

/// Two decoupled background stages, compute then encode, each a
/// newest-wins consumer of the stage before it. `handle_params` only ever
/// writes into `latest_params`; `handle_fractal` blocks on `latest_png`
/// until a version above the caller's own watermark appears. Because each
/// stage always picks up whatever is newest when it wakes, a burst of rapid
/// param updates collapses into exactly one compute and one encode per
/// settle, never a backlog.
pub struct PipelinedHandler {
    pool: Arc<ThreadPool>,
    latest_params: Arc<VersionedSlot<FractalParams, u64>>,
    latest_image: Arc<VersionedSlot<RenderedFrame, u64>>,
    latest_png: Arc<VersionedSlot<Vec<u8>, u64>>,
    session_id: Mutex<Option<String>>,
    threads: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
}

impl PipelinedHandler {
    #[must_use]
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        let handler = Self {
            pool,
            latest_params: Arc::new(VersionedSlot::new()),
            latest_image: Arc::new(VersionedSlot::new()),
            latest_png: Arc::new(VersionedSlot::new()),
            session_id: Mutex::new(None),
            threads: Mutex::new(None),
        };
        let threads = handler.spawn_pipeline();
        *handler
            .threads
            .lock()
            .expect("pipelined handler threads mutex poisoned") = Some(threads);
        handler
    }

    fn spawn_pipeline(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let compute = {
            let pool = Arc::clone(&self.pool);
            let latest_params = Arc::clone(&self.latest_params);
            let latest_image = Arc::clone(&self.latest_image);
            thread::spawn(move || compute_loop(&pool, &latest_params, &latest_image))
        };
        let encode = {
            let latest_image = Arc::clone(&self.latest_image);
            let latest_png = Arc::clone(&self.latest_png);
            thread::spawn(move || encode_loop(&latest_image, &latest_png))
        };
        (compute, encode)
    }

    /// Kills all three slots (waking every blocked reader as dead), joins
    /// the two background threads, resets the slots, and spawns a fresh
    /// pipeline. Called whenever a request arrives under a new
    /// `session_id`, so a stale in-flight computation for the old session
    /// can never surface under the new one.
    fn guard_session(&self, params: &FractalParams) {
        let mut session_id = self
            .session_id
            .lock()
            .expect("pipelined handler session mutex poisoned");
        if session_id.as_deref() == Some(params.session_id.as_str()) {
            return;
        }

        tracing::info!(
            old_session_id = session_id.as_deref().unwrap_or(""),
            new_session_id = %params.session_id,
            "pipelined handler session reset"
        );

        self.latest_params.kill();
        self.latest_image.kill();
        self.latest_png.kill();

        if let Some((compute, encode)) = self
            .threads
            .lock()
            .expect("pipelined handler threads mutex poisoned")
            .take()
        {
            let _ = compute.join();
            let _ = encode.join();
        }

        self.latest_params.reset();
        self.latest_image.reset();
        self.latest_png.reset();

        let threads = self.spawn_pipeline();
        *self
            .threads
            .lock()
            .expect("pipelined handler threads mutex poisoned") = Some(threads);
        *session_id = Some(params.session_id.clone());
    }
}

impl Handler for PipelinedHandler {
    fn handle_params(&self, params: FractalParams) {
        self.guard_session(&params);
        let version = params.request_id;
        self.latest_params.set(params, version);
    }

    fn handle_fractal(&self, params: FractalParams) -> Result<FractalImage, HandlerDead> {
        self.guard_session(&params);
        let version = params.request_id;
        self.latest_params.set(params.clone(), version);

        let watermark = params.last_data_id.max(params.last_viewport_id);
        match self.latest_png.get_above_version(watermark) {
            BlockingRead::Dead => Err(HandlerDead),
            BlockingRead::Alive { value, version } => Ok(FractalImage {
                png_bytes: (*value).clone(),
                watermark: Watermark::exact(version),
            }),
        }
    }
}

fn compute_loop(
    pool: &ThreadPool,
    latest_params: &VersionedSlot<FractalParams, u64>,
    latest_image: &VersionedSlot<RenderedFrame, u64>,
) {
    let mut last_seen = 0u64;
    let mut previous: Option<RenderedFrame> = None;

    loop {
        let (params, version) = match latest_params.get_above_version(last_seen) {
            BlockingRead::Dead => return,
            BlockingRead::Alive { value, version } => ((*value).clone(), version),
        };

        let previous_ref = previous.as_ref().map(|(p, img)| (p, img));
        let start = std::time::Instant::now();
        let mut image = new_image(params.width, params.height);
        let stats = draw(&params, &mut image, previous_ref, pool);
        let image = Arc::new(image);
        tracing::debug!(
            session_id = %params.session_id,
            version,
            copy_tasks = stats.copy_tasks,
            fresh_pixels = stats.fresh_pixels,
            duration_ms = start.elapsed().as_millis() as u64,
            "pipelined compute stage finished"
        );

        if !latest_image.set((params.clone(), Arc::clone(&image)), version) {
            return;
        }
        last_seen = version;
        previous = Some((params, image));
    }
}

fn encode_loop(latest_image: &VersionedSlot<RenderedFrame, u64>, latest_png: &VersionedSlot<Vec<u8>, u64>) {
    let mut last_seen = 0u64;
    loop {
        match latest_image.get_above_version(last_seen) {
            BlockingRead::Dead => return,
            BlockingRead::Alive { value, version } => {
                let (params, image) = &*value;
                let start = std::time::Instant::now();
                let bytes = encode_png(image, params.png_encoder);
                tracing::debug!(
                    session_id = %params.session_id,
                    version,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "pipelined encode stage finished"
                );
                if !latest_png.set(bytes, version) {
                    return;
                }
                last_seen = version;
            }
        }
    }
}
