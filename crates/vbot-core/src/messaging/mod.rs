//! Platform-neutral outbound messages and the interaction response channel.

pub mod port;
pub mod types;
