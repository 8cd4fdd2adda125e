use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server stopped: {0}")]
    Serve(#[source] std::io::Error),

    #[error("relay task is not running")]
    RelayGone,
}
