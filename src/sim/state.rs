//! Authoritative world state: players, projectiles and the snapshot sent to the guest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::math::{Vec2, Vec3};

pub const STARTING_HEALTH: u32 = 100;
pub const DEFAULT_PLAYER_RADIUS: f32 = 1.0;

/// Largest per-frame turn accepted on either look axis.
pub const MAX_LOOK_STEP: f32 = std::f32::consts::PI;

/// Participant identifier. Serialized as `"host"` / `"guest"`, which are also the
/// keys of the player map on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Host, Role::Guest];

    /// The peer on the other end of a two-player session.
    pub fn opponent(self) -> Self {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame of player intent.
///
/// `look` is a rotation delta in radians for this frame, not a rate. `attack` is
/// edge-triggered: it is consumed by the first simulation update that sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    #[serde(rename = "move")]
    pub movement: Vec2,
    pub look: Vec2,
    pub attack: bool,
}

impl InputSnapshot {
    pub fn is_finite(&self) -> bool {
        self.movement.is_finite() && self.look.is_finite()
    }

    pub fn look_in_range(&self) -> bool {
        self.look.x.abs() <= MAX_LOOK_STEP && self.look.y.abs() <= MAX_LOOK_STEP
    }

    /// Movement axes pulled back into `[-1, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            movement: Vec2::new(self.movement.x.clamp(-1.0, 1.0), self.movement.y.clamp(-1.0, 1.0)),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub player_id: Role,
    pub position: Vec3,
    /// Euler angles: `x` pitch, `y` yaw, `z` roll.
    pub rotation: Vec3,
    pub health: u32,
    pub speed: f32,
    pub radius: f32,
    #[serde(default)]
    pub input: InputSnapshot,
}

impl PlayerState {
    /// Match-start state for a role: host at the origin facing +Z, guest ten units
    /// down +X facing back towards it.
    pub fn spawn(role: Role) -> Self {
        let (position, yaw, speed) = match role {
            Role::Host => (Vec3::ZERO, 0.0, 5.0),
            Role::Guest => (Vec3::new(10.0, 0.0, 0.0), std::f32::consts::PI, 4.0),
        };
        Self {
            player_id: role,
            position,
            rotation: Vec3::new(0.0, yaw, 0.0),
            health: STARTING_HEALTH,
            speed,
            radius: DEFAULT_PLAYER_RADIUS,
            input: InputSnapshot::default(),
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }

    /// Subtracts `amount`, flooring at zero. Returns true if this hit defeated the player.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        let was_standing = !self.is_defeated();
        self.health = self.health.saturating_sub(amount);
        was_standing && self.is_defeated()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub damage: u32,
    pub owner_id: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_player_id: Option<Role>,
    /// Seconds since spawn.
    #[serde(default)]
    pub age: f32,
}

impl Projectile {
    pub fn touches(&self, player: &PlayerState) -> bool {
        self.position.distance(player.position) < self.radius + player.radius
    }
}

/// Full copy of the world pushed to the guest every frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub players: BTreeMap<Role, PlayerState>,
    pub projectiles: Vec<Projectile>,
}

impl WorldSnapshot {
    /// The last player standing, once every other player is defeated.
    pub fn outcome(&self) -> Option<Role> {
        last_standing(self.players.values())
    }
}

/// The only undefeated player among two or more, if there is exactly one.
pub(crate) fn last_standing<'a, I>(players: I) -> Option<Role>
where
    I: ExactSizeIterator<Item = &'a PlayerState>,
{
    if players.len() < 2 {
        return None;
    }
    let mut standing = players.filter(|p| !p.is_defeated());
    match (standing.next(), standing.next()) {
        (Some(winner), None) => Some(winner.player_id),
        _ => None,
    }
}
