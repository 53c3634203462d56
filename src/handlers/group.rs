use std::path::Path;
use std::sync::Arc;

use crate::core::data::fractal_params::{FractalParams, HandlerKind, SaveParams};
use crate::core::sync::thread_pool::ThreadPool;
use crate::handlers::asynchronous::AsynchronousHandler;
use crate::handlers::common::{FractalImage, Handler, HandlerDead};
use crate::handlers::pipelined::PipelinedHandler;
use crate::handlers::synchronous::SynchronousHandler;
use crate::storage::save::SaveError;

/// Holds one instance of each handler strategy and routes every call to the
/// one named by `params.handler`. `/save` is dispatched only to the
/// synchronous handler, which is the only one with a sensible notion of "a
/// single re-render at an explicit scale" outside of any live frame stream.
pub struct HandlerGroup {
    synchronous: SynchronousHandler,
    pipelined: PipelinedHandler,
    asynchronous: AsynchronousHandler,
}

impl HandlerGroup {
    #[must_use]
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        Self {
            synchronous: SynchronousHandler::new(Arc::clone(&pool)),
            pipelined: PipelinedHandler::new(Arc::clone(&pool)),
            asynchronous: AsynchronousHandler::new(pool),
        }
    }

    pub fn handle_params(&self, params: FractalParams) {
        match params.handler {
            HandlerKind::Synchronous => self.synchronous.handle_params(params),
            HandlerKind::Pipelined => self.pipelined.handle_params(params),
            HandlerKind::Asynchronous => self.asynchronous.handle_params(params),
        }
    }

    pub fn handle_fractal(&self, params: FractalParams) -> Result<FractalImage, HandlerDead> {
        match params.handler {
            HandlerKind::Synchronous => self.synchronous.handle_fractal(params),
            HandlerKind::Pipelined => self.pipelined.handle_fractal(params),
            HandlerKind::Asynchronous => self.asynchronous.handle_fractal(params),
        }
    }

    pub fn handle_save(&self, save_params: SaveParams, base_dir: &Path) -> Result<(), SaveError> {
        self.synchronous.handle_save(save_params, base_dir)
    }
}
