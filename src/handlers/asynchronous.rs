use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::adapters::png_encoder::encode_png;
use crate::core::actions::region_algebra::{find_general_overlap, resize_bilinear, ImageOverlap};
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::rgb_image::{new_image, RgbImage};
use crate::core::draw::draw;
use crate::core::sync::paired_slots::{PairedRead, PairedSlots};
use crate::core::sync::thread_pool::ThreadPool;
use crate::core::sync::versioned_slot::{BlockingRead, TimedRead, VersionedSlot};
use crate::handlers::common::{FractalImage, Handler, HandlerDead};
use crate::handlers::watermark::Watermark;

/// How long the layout loop gives a pan a chance to land a fresh, exact
/// image before it falls back to an approximate resize of the stale one.
const PAN_SETTLE_TIMEOUT: Duration = Duration::from_millis(50);

type RenderedFrame = (FractalParams, Arc<RgbImage>);

/// Three independent background stages. `compute` reads from its own
/// `latest_params` watermark stream and publishes into the image half of
/// `pair`, exactly like [`super::pipelined::PipelinedHandler`]'s compute
/// stage. `layout` additionally republishes every request's params into
/// `pair`'s params half, so it can wake on *either* side advancing and pick
/// one of this module's five responses (see [`layout_once`]) instead of
/// simply waiting for a matching image like the pipelined handler does.
/// `handle_fractal` never blocks on compute directly; it only reads
/// whatever `latest_png` the layout stage most recently produced.
pub struct AsynchronousHandler {
    pool: Arc<ThreadPool>,
    latest_params: Arc<VersionedSlot<FractalParams, u64>>,
    pair: Arc<PairedSlots<FractalParams, u64, RenderedFrame, u64>>,
    latest_png: Arc<VersionedSlot<Vec<u8>, Watermark>>,
    session_id: Mutex<Option<String>>,
    threads: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
}

impl AsynchronousHandler {
    #[must_use]
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        let handler = Self {
            pool,
            latest_params: Arc::new(VersionedSlot::new()),
            pair: Arc::new(PairedSlots::new()),
            latest_png: Arc::new(VersionedSlot::new()),
            session_id: Mutex::new(None),
            threads: Mutex::new(None),
        };
        let threads = handler.spawn_pipeline();
        *handler
            .threads
            .lock()
            .expect("asynchronous handler threads mutex poisoned") = Some(threads);
        handler
    }

    fn spawn_pipeline(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let compute = {
            let pool = Arc::clone(&self.pool);
            let latest_params = Arc::clone(&self.latest_params);
            let pair = Arc::clone(&self.pair);
            thread::spawn(move || compute_loop(&pool, &latest_params, &pair))
        };
        let layout = {
            let pair = Arc::clone(&self.pair);
            let latest_png = Arc::clone(&self.latest_png);
            thread::spawn(move || layout_loop(&pair, &latest_png))
        };
        (compute, layout)
    }

    fn guard_session(&self, params: &FractalParams) {
        let mut session_id = self
            .session_id
            .lock()
            .expect("asynchronous handler session mutex poisoned");
        if session_id.as_deref() == Some(params.session_id.as_str()) {
            return;
        }

        tracing::info!(
            old_session_id = session_id.as_deref().unwrap_or(""),
            new_session_id = %params.session_id,
            "asynchronous handler session reset"
        );

        self.latest_params.kill();
        self.pair.kill();
        self.latest_png.kill();

        if let Some((compute, layout)) = self
            .threads
            .lock()
            .expect("asynchronous handler threads mutex poisoned")
            .take()
        {
            let _ = compute.join();
            let _ = layout.join();
        }

        self.latest_params.reset();
        self.pair.reset();
        self.latest_png.reset();

        let threads = self.spawn_pipeline();
        *self
            .threads
            .lock()
            .expect("asynchronous handler threads mutex poisoned") = Some(threads);
        *session_id = Some(params.session_id.clone());
    }
}

impl Handler for AsynchronousHandler {
    fn handle_params(&self, params: FractalParams) {
        self.guard_session(&params);
        let version = params.request_id;
        self.latest_params.set(params.clone(), version);
        self.pair.set_first(params, version);
    }

    fn handle_fractal(&self, params: FractalParams) -> Result<FractalImage, HandlerDead> {
        self.guard_session(&params);
        let version = params.request_id;
        self.latest_params.set(params.clone(), version);
        self.pair.set_first(params.clone(), version);

        let watermark = Watermark {
            data_id: params.last_data_id,
            viewport_id: params.last_viewport_id,
        };
        match self.latest_png.get_above_version(watermark) {
            BlockingRead::Dead => Err(HandlerDead),
            BlockingRead::Alive { value, version } => Ok(FractalImage {
                png_bytes: (*value).clone(),
                watermark: version,
            }),
        }
    }
}

fn compute_loop(
    pool: &ThreadPool,
    latest_params: &VersionedSlot<FractalParams, u64>,
    pair: &PairedSlots<FractalParams, u64, RenderedFrame, u64>,
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
            "asynchronous compute stage finished"
        );

        if !pair.set_second((params.clone(), Arc::clone(&image)), version) {
            return;
        }
        last_seen = version;
        previous = Some((params, image));
    }
}

/// The five-branch layout decision (SPEC_FULL.md §4.9.3): wake on either
/// side advancing, then decide how to turn the freshest `(params, image)`
/// pair into a servable frame and its watermark.
fn layout_loop(pair: &PairedSlots<FractalParams, u64, RenderedFrame, u64>, latest_png: &VersionedSlot<Vec<u8>, Watermark>) {
    let mut last_params_seen = 0u64;
    let mut last_image_seen = 0u64;

    loop {
        let (viewport_params, viewport_version, image_frame, image_version) =
            match pair.get_both_with_at_least_one_above_version(last_params_seen, last_image_seen) {
                PairedRead::Dead => return,
                PairedRead::Alive { first, second } => {
                    (first.0, first.1, second.0, second.1)
                }
            };
        last_params_seen = viewport_version;
        last_image_seen = image_version;

        let (image_params, source_image) = &*image_frame;

        let (data_id, viewport_id, output, decision) = if viewport_version == image_version {
            // No layout: the freshest image was rendered for exactly this viewport.
            (image_version, viewport_version, Arc::clone(source_image), "exact")
        } else if FractalParams::pan_only_differ(image_params, &viewport_params) {
            match pair.get_second_at_version_with_timeout(viewport_version, PAN_SETTLE_TIMEOUT) {
                TimedRead::Dead => return,
                TimedRead::Alive { value, version } => {
                    last_image_seen = version;
                    (version, version, Arc::clone(&value.1), "pan_settled")
                }
                TimedRead::TimedOut => {
                    match approximate_layout(image_params, source_image, &viewport_params) {
                        Some(resized) => (image_version, viewport_version, Arc::new(resized), "pan_timed_out_resized"),
                        None => (image_version, viewport_version, Arc::clone(source_image), "pan_timed_out_no_overlap"),
                    }
                }
            }
        } else if FractalParams::viewport_only_differ(image_params, &viewport_params) {
            match approximate_layout(image_params, source_image, &viewport_params) {
                Some(resized) => (image_version, viewport_version, Arc::new(resized), "viewport_resized"),
                None => (image_version, viewport_version, Arc::clone(source_image), "viewport_no_overlap"),
            }
        } else {
            // Fundamental change (polynomial, palette, precision, or size):
            // an approximate layout would be meaningless, so block for a
            // genuinely fresh render.
            match pair.get_second_above_version(image_version) {
                BlockingRead::Dead => return,
                BlockingRead::Alive { value, version } => {
                    last_image_seen = version;
                    (version, version, Arc::clone(&value.1), "fundamental_blocked")
                }
            }
        };

        tracing::debug!(
            session_id = %viewport_params.session_id,
            data_id,
            viewport_id,
            decision,
            "asynchronous layout decision"
        );

        let watermark = Watermark { data_id, viewport_id };
        let bytes = encode_png(&output, viewport_params.png_encoder);
        if !latest_png.set(bytes, watermark) {
            return;
        }
    }
}

/// Resizes `source_image` (rendered for `image_params`) into a canvas sized
/// for `viewport_params`, via the same general-overlap + bilinear machinery
/// the draw engine's region algebra already provides. Returns `None` when
/// the two viewports don't overlap at all, in which case the stale image is
/// reused verbatim rather than shown fully blank.
fn approximate_layout(
    image_params: &FractalParams,
    source_image: &RgbImage,
    viewport_params: &FractalParams,
) -> Option<RgbImage> {
    let overlap: ImageOverlap = find_general_overlap(image_params, viewport_params)?;
    let mut canvas = new_image(viewport_params.width, viewport_params.height);
    resize_bilinear(source_image, &mut canvas, &overlap);
    Some(canvas)
}
