pub mod relay_helpers;

pub use mock_broadcaster::*;
pub use relay_helpers::*;
pub use test_client::*;
