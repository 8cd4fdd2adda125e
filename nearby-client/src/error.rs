use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("local capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("media transport error: {0}")]
    Transport(String),

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("session setup cancelled")]
    Cancelled,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid proximity radii: enter {enter}, exit {exit} (need 0 < enter <= exit)")]
    InvalidRadius { enter: f64, exit: f64 },

    #[error("canvas {width}x{height} cannot fit a {avatar_size}px avatar")]
    InvalidCanvas {
        width: f64,
        height: f64,
        avatar_size: f64,
    },
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to relay: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("relay connection closed")]
    Closed,
}
