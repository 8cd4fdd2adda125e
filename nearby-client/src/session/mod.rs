mod media;
mod session;
mod signaling_agent;

pub use media::*;
pub use session::{SessionKey, SessionPhase};
pub use signaling_agent::SignalingAgent;
pub(crate) use signaling_agent::SessionInbox;
