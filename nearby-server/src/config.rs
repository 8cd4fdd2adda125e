use nearby_core::utils::DEFAULT_PORT;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Settings for the relay process.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen_addr: SocketAddr,

    /// Directory served over plain HTTP; `/` maps to its `index.html`.
    pub static_dir: PathBuf,

    /// Depth of the queue between WebSocket handlers and the relay.
    pub command_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            static_dir: PathBuf::from("public"),
            command_capacity: 256,
        }
    }
}
