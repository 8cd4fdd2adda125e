mod presence_store;
mod relay;
mod relay_command;

pub use presence_store::*;
pub use relay::*;
pub use relay_command::*;
