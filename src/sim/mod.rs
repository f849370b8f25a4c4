//! Authoritative simulation. Only the host ever advances it.

pub mod attack;
pub mod engine;
pub mod math;
pub mod state;

pub use attack::{AttackEffect, MeleeSpec, RangedSpec, Weapon};
pub use engine::{SimConfig, SimEvent, SimulationEngine, GRAVITY};
pub use math::{Vec2, Vec3};
pub use state::{InputSnapshot, PlayerState, Projectile, Role, WorldSnapshot};
