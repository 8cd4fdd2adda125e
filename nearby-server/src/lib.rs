//! Presence relay: tracks who is on the canvas and where, and passes call
//! signaling between exactly two channels. Holds no media.

pub mod config;
pub mod error;
pub mod relay;
pub mod server;
pub mod signaling;

pub use config::RelayConfig;
pub use error::ServerError;
pub use relay::*;
pub use server::RelayServer;
pub use signaling::*;
