#[cfg(feature = "webrtc")]
mod webrtc_backend;

#[cfg(feature = "webrtc")]
pub use webrtc_backend::*;
