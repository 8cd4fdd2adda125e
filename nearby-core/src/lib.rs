pub mod error;
pub mod model;
pub mod protocol;
pub mod utils;

pub use error::ProtocolError;
pub use model::*;
pub use protocol::{ClientEvent, Frame, ServerEvent};
