pub mod asynchronous;
pub mod common;
pub mod group;
pub mod pipelined;
pub mod synchronous;
pub mod watermark;

pub use common::{FractalImage, Handler, HandlerDead};
pub use group::HandlerGroup;
