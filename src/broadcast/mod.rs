//! Real-time fan-out: the hub and the bridge that feeds it

pub mod bridge;
pub mod hub;

pub use bridge::spawn_bridge;
pub use hub::{Hub, HubHandle, SubscriberId, Subscription};
