mod activity;
mod mirror;

pub use activity::*;
pub use mirror::*;
