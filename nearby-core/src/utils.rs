/// Spawn point of every participant.
pub const DEFAULT_X: f64 = 100.0;
pub const DEFAULT_Y: f64 = 100.0;

/// Distance below which two avatars are "near".
pub const PROXIMITY_RADIUS: f64 = 50.0;

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Path of the WebSocket endpoint on the relay.
pub const WS_PATH: &str = "/ws";
