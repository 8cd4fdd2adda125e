mod agent_command;
mod client_agent;
mod view_event;

pub use agent_command::*;
pub use client_agent::*;
pub use view_event::*;
