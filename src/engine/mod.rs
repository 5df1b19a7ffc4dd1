pub mod relay;
pub mod types;

pub use relay::{NotificationRelay, RelaySettings, decide};
