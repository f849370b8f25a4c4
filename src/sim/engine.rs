//! Host-side authoritative simulation.

use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

use tracing::{debug, trace};

use super::attack::{AttackEffect, Weapon};
use super::math::Vec3;
use super::state::{last_standing, InputSnapshot, PlayerState, Projectile, Role, WorldSnapshot};
use crate::error::SimError;

pub const GRAVITY: f32 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Seconds a projectile may fly before it is reclaimed.
    pub projectile_ttl: f32,
    /// Projectiles further than this from the origin (on the ground plane) are reclaimed.
    pub arena_radius: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            projectile_ttl: 10.0,
            arena_radius: 250.0,
        }
    }
}

/// Something worth reporting that happened during an update.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ProjectileSpawned { owner: Role },
    Hit { attacker: Role, victim: Role, damage: u32 },
    Defeated { role: Role },
    ProjectileExpired { owner: Role },
}

#[derive(Debug, Clone)]
struct Combatant {
    state: PlayerState,
    weapon: Weapon,
}

#[derive(Debug, Clone)]
pub struct SimulationEngine {
    config: SimConfig,
    players: BTreeMap<Role, Combatant>,
    projectiles: Vec<Projectile>,
}

impl SimulationEngine {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            players: BTreeMap::new(),
            projectiles: Vec::new(),
        }
    }

    /// Engine with both roles registered at their match-start positions.
    pub fn seeded(config: SimConfig) -> Self {
        let mut engine = Self::new(config);
        for role in Role::ALL {
            engine.players.insert(
                role,
                Combatant {
                    state: PlayerState::spawn(role),
                    weapon: Weapon::for_role(role),
                },
            );
        }
        engine
    }

    pub fn add_player(&mut self, role: Role, mut state: PlayerState, weapon: Weapon) -> Result<(), SimError> {
        if self.players.contains_key(&role) {
            return Err(SimError::DuplicatePlayer(role));
        }
        state.player_id = role;
        self.players.insert(role, Combatant { state, weapon });
        Ok(())
    }

    /// Replaces the stored input for `role`, movement clamped to `[-1, 1]`.
    /// Returns false, changing nothing, if the role is not registered.
    pub fn update_player_input(&mut self, role: Role, input: InputSnapshot) -> bool {
        match self.players.get_mut(&role) {
            Some(c) => {
                c.state.input = input.clamped();
                true
            }
            None => {
                trace!(%role, "input for unknown player ignored");
                false
            }
        }
    }

    pub fn player(&self, role: Role) -> Option<&PlayerState> {
        self.players.get(&role).map(|c| &c.state)
    }

    #[cfg(test)]
    fn player_mut(&mut self, role: Role) -> Option<&mut PlayerState> {
        self.players.get_mut(&role).map(|c| &mut c.state)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self.players.iter().map(|(role, c)| (*role, c.state.clone())).collect(),
            projectiles: self.projectiles.clone(),
        }
    }

    pub fn outcome(&self) -> Option<Role> {
        last_standing(self.players.values().map(|c| &c.state))
    }

    /// Advances the world by `dt` seconds. Negative or non-finite steps are ignored.
    pub fn update(&mut self, dt: f32) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if !dt.is_finite() || dt < 0.0 {
            debug!(dt, "ignoring invalid time step");
            return events;
        }

        let roles: Vec<Role> = self.players.keys().copied().collect();
        for role in roles {
            let Some(combatant) = self.players.get_mut(&role) else {
                continue;
            };
            let attacking = step_player(&mut combatant.state, dt);
            if attacking && !combatant.state.is_defeated() {
                let effect = combatant.weapon.resolve(&combatant.state);
                self.apply_effect(effect, &mut events);
            }
        }

        self.step_projectiles(dt, &mut events);
        events
    }

    fn apply_effect(&mut self, effect: AttackEffect, events: &mut Vec<SimEvent>) {
        match effect {
            AttackEffect::SpawnProjectile(projectile) => {
                events.push(SimEvent::ProjectileSpawned { owner: projectile.owner_id });
                self.projectiles.push(projectile);
            }
            AttackEffect::DamageInRange { attacker, origin, reach, damage } => {
                for (role, victim) in self.players.iter_mut() {
                    if *role == attacker || victim.state.is_defeated() {
                        continue;
                    }
                    if origin.planar_distance(victim.state.position) < reach {
                        hit(&mut victim.state, attacker, damage, events);
                    }
                }
            }
        }
    }

    fn step_projectiles(&mut self, dt: f32, events: &mut Vec<SimEvent>) {
        // Reverse order so removal never skips an element.
        for i in (0..self.projectiles.len()).rev() {
            let projectile = &mut self.projectiles[i];
            projectile.velocity.y -= GRAVITY * dt;
            projectile.position += projectile.velocity * dt;
            projectile.age += dt;

            let target = self
                .players
                .iter()
                .find(|(role, c)| {
                    **role != projectile.owner_id && !c.state.is_defeated() && projectile.touches(&c.state)
                })
                .map(|(role, _)| *role);

            if let Some(victim) = target {
                let mut projectile = self.projectiles.remove(i);
                projectile.hit_player_id = Some(victim);
                if let Some(c) = self.players.get_mut(&victim) {
                    hit(&mut c.state, projectile.owner_id, projectile.damage, events);
                }
                continue;
            }

            let projectile = &self.projectiles[i];
            if projectile.age > self.config.projectile_ttl
                || projectile.position.planar_distance(Vec3::ZERO) > self.config.arena_radius
            {
                let gone = self.projectiles.remove(i);
                events.push(SimEvent::ProjectileExpired { owner: gone.owner_id });
            }
        }
    }
}

/// Integrates look and move input for one player and consumes its one-shot input.
/// Returns whether the player pressed attack this step.
fn step_player(player: &mut PlayerState, dt: f32) -> bool {
    let input = &mut player.input;
    let attacking = std::mem::take(&mut input.attack);
    let look = std::mem::take(&mut input.look);

    if player.is_defeated() {
        return attacking;
    }

    player.rotation.y -= look.x;
    player.rotation.x = (player.rotation.x - look.y).clamp(-FRAC_PI_2, FRAC_PI_2);

    let yaw = player.rotation.y;
    let movement = player.input.movement;
    let step = Vec3::forward(yaw) * movement.y + Vec3::right(yaw) * movement.x;
    player.position += step * (player.speed * dt);

    attacking
}

fn hit(victim: &mut PlayerState, attacker: Role, damage: u32, events: &mut Vec<SimEvent>) {
    let role = victim.player_id;
    let defeated = victim.apply_damage(damage);
    debug!(%attacker, victim = %role, damage, health = victim.health, "hit");
    events.push(SimEvent::Hit { attacker, victim: role, damage });
    if defeated {
        events.push(SimEvent::Defeated { role });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::math::Vec2;
    use proptest::prelude::*;

    fn engine() -> SimulationEngine {
        SimulationEngine::seeded(SimConfig::default())
    }

    fn attack() -> InputSnapshot {
        InputSnapshot { attack: true, ..Default::default() }
    }

    fn place(engine: &mut SimulationEngine, role: Role, position: Vec3) {
        engine.player_mut(role).unwrap().position = position;
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut engine = engine();
        let err = engine
            .add_player(Role::Host, PlayerState::spawn(Role::Host), Weapon::SLING)
            .unwrap_err();
        assert!(matches!(err, SimError::DuplicatePlayer(Role::Host)));
        assert_eq!(engine.player(Role::Host).unwrap().health, 100);
    }

    #[test]
    fn unknown_role_input_is_ignored() {
        let mut engine = SimulationEngine::new(SimConfig::default());
        assert!(!engine.update_player_input(Role::Guest, attack()));
        assert!(engine.update(0.016).is_empty());
    }

    #[test]
    fn update_before_any_player_is_harmless() {
        let mut engine = SimulationEngine::new(SimConfig::default());
        engine.update(1.0);
        assert!(engine.snapshot().players.is_empty());
    }

    #[test]
    fn invalid_dt_changes_nothing() {
        let mut engine = engine();
        engine.update_player_input(
            Role::Host,
            InputSnapshot { movement: Vec2::new(0.0, 1.0), attack: true, ..Default::default() },
        );
        let before = engine.snapshot();
        engine.update(-1.0);
        engine.update(f32::NAN);
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn host_attack_spawns_stone() {
        let mut engine = engine();
        engine.update_player_input(Role::Host, attack());
        engine.update(0.016);

        let stones = engine.projectiles();
        assert_eq!(stones.len(), 1);
        let stone = &stones[0];
        assert_eq!(stone.owner_id, Role::Host);
        assert_eq!(stone.damage, 20);
        assert_eq!(stone.radius, 0.2);
        assert!(stone.velocity.x.abs() < 1e-4);
        assert!((stone.velocity.y - (5.0 - GRAVITY * 0.016)).abs() < 1e-4);
        assert!((stone.velocity.z - 10.0).abs() < 1e-4);
    }

    #[test]
    fn attack_flag_is_cleared_for_both_roles() {
        let mut engine = engine();
        for role in Role::ALL {
            engine.update_player_input(role, attack());
        }
        engine.update(0.016);
        for role in Role::ALL {
            assert!(!engine.player(role).unwrap().input.attack);
        }
        // One press, one stone.
        engine.update(0.016);
        assert_eq!(engine.projectiles().len(), 1);
    }

    #[test]
    fn look_input_is_consumed() {
        let mut engine = engine();
        engine.update_player_input(
            Role::Host,
            InputSnapshot { look: Vec2::new(0.5, 0.0), ..Default::default() },
        );
        engine.update(0.016);
        engine.update(0.016);
        let host = engine.player(Role::Host).unwrap();
        assert!((host.rotation.y + 0.5).abs() < 1e-6);
        assert_eq!(host.input.look, Vec2::ZERO);
    }

    #[test]
    fn spear_hits_within_reach() {
        let mut engine = engine();
        place(&mut engine, Role::Host, Vec3::ZERO);
        place(&mut engine, Role::Guest, Vec3::new(1.5, 0.0, 0.0));
        engine.update_player_input(Role::Guest, attack());
        let events = engine.update(0.016);
        assert_eq!(engine.player(Role::Host).unwrap().health, 85);
        assert!(events.contains(&SimEvent::Hit { attacker: Role::Guest, victim: Role::Host, damage: 15 }));
    }

    #[test]
    fn spear_misses_out_of_reach() {
        let mut engine = engine();
        place(&mut engine, Role::Host, Vec3::ZERO);
        place(&mut engine, Role::Guest, Vec3::new(3.0, 0.0, 0.0));
        engine.update_player_input(Role::Guest, attack());
        engine.update(0.016);
        assert_eq!(engine.player(Role::Host).unwrap().health, 100);
    }

    #[test]
    fn spear_reach_is_exclusive() {
        let mut engine = engine();
        place(&mut engine, Role::Host, Vec3::ZERO);
        place(&mut engine, Role::Guest, Vec3::new(0.0, 0.0, 2.0));
        engine.update_player_input(Role::Guest, attack());
        let events = engine.update(0.0);
        assert_eq!(engine.player(Role::Host).unwrap().health, 100);
        assert!(events.is_empty());
    }

    #[test]
    fn spear_reach_ignores_height() {
        let mut engine = engine();
        place(&mut engine, Role::Host, Vec3::new(0.0, 50.0, 0.0));
        place(&mut engine, Role::Guest, Vec3::new(0.0, 0.0, 1.0));
        engine.update_player_input(Role::Guest, attack());
        engine.update(0.0);
        assert_eq!(engine.player(Role::Host).unwrap().health, 85);
    }

    #[test]
    fn stone_hits_guest_once_and_is_removed() {
        let mut engine = engine();
        // Guest two units in front of the host.
        place(&mut engine, Role::Guest, Vec3::new(0.0, 0.0, 2.0));
        engine.update_player_input(Role::Host, attack());

        let mut hits = 0;
        for _ in 0..60 {
            hits += engine
                .update(0.016)
                .iter()
                .filter(|e| matches!(e, SimEvent::Hit { .. }))
                .count();
        }
        assert_eq!(hits, 1);
        assert!(engine.projectiles().is_empty());
        assert_eq!(engine.player(Role::Guest).unwrap().health, 80);
    }

    #[test]
    fn stone_never_hits_its_owner() {
        let mut engine = engine();
        engine.update_player_input(Role::Host, attack());
        engine.update(0.016);
        // Park the host inside the stone for a while.
        for _ in 0..30 {
            let at = engine.projectiles()[0].position;
            place(&mut engine, Role::Host, at);
            engine.update(0.001);
        }
        assert_eq!(engine.player(Role::Host).unwrap().health, 100);
        assert_eq!(engine.projectiles().len(), 1);
    }

    #[test]
    fn stray_stones_are_reclaimed() {
        let mut engine = SimulationEngine::seeded(SimConfig { projectile_ttl: 1.0, arena_radius: 250.0 });
        // Aim away from the guest.
        engine.player_mut(Role::Host).unwrap().rotation.y = std::f32::consts::PI;
        engine.update_player_input(Role::Host, attack());
        engine.update(0.016);
        assert_eq!(engine.projectiles().len(), 1);

        let mut expired = false;
        for _ in 0..100 {
            expired |= engine
                .update(0.016)
                .contains(&SimEvent::ProjectileExpired { owner: Role::Host });
        }
        assert!(expired);
        assert!(engine.projectiles().is_empty());
    }

    #[test]
    fn health_is_clamped_and_defeat_reported() {
        let mut engine = engine();
        place(&mut engine, Role::Guest, Vec3::new(1.0, 0.0, 0.0));
        engine.player_mut(Role::Host).unwrap().health = 10;
        engine.update_player_input(Role::Guest, attack());
        let events = engine.update(0.016);

        assert_eq!(engine.player(Role::Host).unwrap().health, 0);
        assert!(events.contains(&SimEvent::Defeated { role: Role::Host }));
        assert_eq!(engine.outcome(), Some(Role::Guest));

        // A defeated player cannot act but its attack is still consumed.
        engine.update_player_input(
            Role::Host,
            InputSnapshot { movement: Vec2::new(0.0, 1.0), attack: true, ..Default::default() },
        );
        engine.update(0.5);
        let host = engine.player(Role::Host).unwrap();
        assert!(!host.input.attack);
        assert_eq!(host.position, Vec3::ZERO);
        assert!(engine.projectiles().is_empty());
    }

    #[test]
    fn moves_along_facing() {
        let mut engine = engine();
        engine.update_player_input(
            Role::Host,
            InputSnapshot { movement: Vec2::new(0.0, 1.0), ..Default::default() },
        );
        engine.update(1.0);
        let host = engine.player(Role::Host).unwrap();
        assert!((host.position.z - 5.0).abs() < 1e-4);
        assert!(host.position.x.abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn pitch_stays_clamped(looks in prop::collection::vec((-10.0f32..10.0, -10.0f32..10.0), 1..40)) {
            let mut engine = engine();
            for (x, y) in looks {
                engine.update_player_input(Role::Guest, InputSnapshot { look: Vec2::new(x, y), ..Default::default() });
                engine.update(0.016);
                let pitch = engine.player(Role::Guest).unwrap().rotation.x;
                prop_assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&pitch));
            }
        }

        #[test]
        fn halved_steps_match_a_full_step(
            mx in -1.0f32..1.0,
            my in -1.0f32..1.0,
            yaw in -3.0f32..3.0,
            dt in 0.0f32..0.5,
        ) {
            let input = InputSnapshot { movement: Vec2::new(mx, my), ..Default::default() };

            let mut whole = engine();
            whole.player_mut(Role::Host).unwrap().rotation.y = yaw;
            whole.update_player_input(Role::Host, input);
            whole.update(dt);

            let mut halves = engine();
            halves.player_mut(Role::Host).unwrap().rotation.y = yaw;
            halves.update_player_input(Role::Host, input);
            halves.update(dt / 2.0);
            halves.update(dt / 2.0);

            let a = whole.player(Role::Host).unwrap().position;
            let b = halves.player(Role::Host).unwrap().position;
            prop_assert!(a.distance(b) < 1e-4);
        }

        #[test]
        fn spear_lands_only_inside_reach(gap in 0.0f32..4.0) {
            let mut engine = engine();
            place(&mut engine, Role::Host, Vec3::ZERO);
            place(&mut engine, Role::Guest, Vec3::new(gap, 0.0, 0.0));
            engine.update_player_input(Role::Guest, attack());
            engine.update(0.0);
            let expected = if gap < 2.0 { 85 } else { 100 };
            prop_assert_eq!(engine.player(Role::Host).unwrap().health, expected);
        }

        #[test]
        fn host_stones_never_hit_the_host(x in -20.0f32..20.0, z in -20.0f32..20.0) {
            let mut engine = engine();
            engine.update_player_input(Role::Host, attack());
            engine.update(0.0);
            place(&mut engine, Role::Host, Vec3::new(x, 0.0, z));
            let events = engine.update(0.016);
            let host_hit = events.iter().any(|e| matches!(e, SimEvent::Hit { victim: Role::Host, .. }));
            prop_assert!(!host_hit);
        }
    }
}
