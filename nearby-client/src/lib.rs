pub mod agent;
pub mod config;
pub mod connection;
pub mod error;
pub mod presence;
pub mod proximity;
pub mod session;
pub mod transport;

pub use agent::*;
pub use config::{AgentConfig, CanvasBounds, ProximityConfig};
pub use connection::RelayConnection;
pub use error::{ConfigError, ConnectionError, MediaError};
pub use presence::*;
pub use proximity::{ProximityDetector, ProximityTrigger};
pub use session::*;

#[cfg(feature = "webrtc")]
pub use transport::WebRtcBackend;
