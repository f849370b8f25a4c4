//! Attack resolution.
//!
//! A weapon never touches the world directly. It turns the attacker's current
//! state into an [`AttackEffect`], and the engine applies every effect the same way.

use super::math::Vec3;
use super::state::{PlayerState, Projectile, Role};

/// Thrown stone: leaves the attacker along its facing with a fixed upward boost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangedSpec {
    pub speed: f32,
    pub lift: f32,
    pub radius: f32,
    pub damage: u32,
}

/// Close-range strike measured on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeSpec {
    pub reach: f32,
    pub damage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weapon {
    RangedProjectile(RangedSpec),
    Melee(MeleeSpec),
}

impl Weapon {
    pub const SLING: Weapon = Weapon::RangedProjectile(RangedSpec {
        speed: 10.0,
        lift: 5.0,
        radius: 0.2,
        damage: 20,
    });

    pub const SPEAR: Weapon = Weapon::Melee(MeleeSpec {
        reach: 2.0,
        damage: 15,
    });

    /// Default loadout: the host throws stones, the guest thrusts a spear.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Host => Self::SLING,
            Role::Guest => Self::SPEAR,
        }
    }

    pub fn resolve(&self, attacker: &PlayerState) -> AttackEffect {
        match *self {
            Weapon::RangedProjectile(ranged) => {
                let dir = Vec3::forward(attacker.rotation.y);
                AttackEffect::SpawnProjectile(Projectile {
                    position: attacker.position,
                    velocity: Vec3::new(dir.x * ranged.speed, ranged.lift, dir.z * ranged.speed),
                    radius: ranged.radius,
                    damage: ranged.damage,
                    owner_id: attacker.player_id,
                    hit_player_id: None,
                    age: 0.0,
                })
            }
            Weapon::Melee(melee) => AttackEffect::DamageInRange {
                attacker: attacker.player_id,
                origin: attacker.position,
                reach: melee.reach,
                damage: melee.damage,
            },
        }
    }
}

/// What an attack does to the world.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackEffect {
    SpawnProjectile(Projectile),
    /// Damage every other standing player whose planar distance to `origin` is
    /// strictly less than `reach`.
    DamageInRange {
        attacker: Role,
        origin: Vec3,
        reach: f32,
        damage: u32,
    },
}
