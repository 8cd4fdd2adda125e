pub use nearby_core::{ParticipantId, ProtocolError};

pub mod model {
    pub use nearby_core::model::*;
}

pub mod protocol {
    pub use nearby_core::protocol::*;
    pub use nearby_core::utils::{DEFAULT_PORT, WS_PATH};
}

#[cfg(feature = "server")]
pub mod server {
    pub use nearby_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use nearby_client::*;
}
