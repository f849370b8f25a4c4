//! Two-peer duel: the host owns the simulation and streams the world to the
//! guest, the guest only forwards its input and draws what it receives.
//!
//! - `sim`  - authoritative physics and combat (host only)
//! - `sync` - wire envelope, per-frame push of state/input, guest state mirror
//! - `core` - peer runtime: iroh link, session role controller, frame loop,
//!   keyboard input, terminal rendering and the lobby menu

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod sim;
pub mod sync;

// Re-export for convenience
pub use crate::core::session::{Phase, Session};
pub use crate::sim::{Role, SimulationEngine};
