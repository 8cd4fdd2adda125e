mod broadcaster;
mod signaling_service;
mod ws_handler;

pub use broadcaster::*;
pub use signaling_service::*;
pub use ws_handler::*;
