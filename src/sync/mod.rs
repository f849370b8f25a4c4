//! Moves authoritative state and raw input across the peer channel.

pub mod layer;
pub mod protocol;

pub use layer::{route, GuestSync, HostSync, Inbound, StateMirror};
pub use protocol::Message;
