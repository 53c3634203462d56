mod adapters;
pub mod config;
mod core;
mod handlers;
mod storage;

use std::sync::Arc;

use crate::adapters::http::{router, AppState};
use crate::config::Config;
use crate::core::sync::thread_pool::ThreadPool;
use crate::handlers::HandlerGroup;

/// Initializes logging, builds the shared worker pool and handler group,
/// and serves the three HTTP routes until the process is signaled to stop.
pub async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let pool_size = config.resolved_pool_size();
    tracing::info!(pool_size, bind_address = %config.bind_address, port = config.port, "starting server");

    let pool = Arc::new(ThreadPool::new(pool_size));
    let handlers = Arc::new(HandlerGroup::new(pool));
    let state = AppState {
        handlers,
        config: Arc::new(config.clone()),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind((config.bind_address.as_str(), config.port)).await?;
    tracing::info!(local_addr = ?listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Re-exports the pieces `benches/draw_strategies.rs` needs to drive `draw`
/// directly. Not part of the crate's real public surface; hidden from docs.
#[doc(hidden)]
pub mod bench_support {
    pub use crate::core::data::colour::Colour;
    pub use crate::core::data::complex::Complex;
    pub use crate::core::data::fractal_params::{FractalParams, HandlerKind, PngEncoder, Precision, Strategy};
    pub use crate::core::data::rgb_image::{new_image, RgbImage};
    pub use crate::core::draw::draw;
    pub use crate::core::sync::thread_pool::ThreadPool;
}
