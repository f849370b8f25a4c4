//! Per-process role controller: decides whether this peer simulates or relays.

use tracing::{debug, info, warn};

use crate::core::network::{Transport, TransportEvent};
use crate::sim::{InputSnapshot, Role, SimConfig, SimEvent, SimulationEngine, WorldSnapshot};
use crate::sync::{route, GuestSync, HostSync, Inbound, StateMirror};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Role known, channel not open yet.
    Negotiating,
    /// Channel open; frames simulate and sync.
    Active,
    /// Channel closed. Terminal: nothing advances, the last view stays up.
    Ended,
}

enum Side {
    Host {
        engine: SimulationEngine,
        sync: HostSync,
        published: WorldSnapshot,
    },
    Guest {
        sync: GuestSync,
        mirror: StateMirror,
    },
}

pub struct Session {
    role: Role,
    phase: Phase,
    side: Side,
}

impl Session {
    pub fn new(role: Role, config: SimConfig) -> Self {
        let side = match role {
            Role::Host => {
                let engine = SimulationEngine::seeded(config);
                let published = engine.snapshot();
                Side::Host {
                    engine,
                    sync: HostSync::new(),
                    published,
                }
            }
            Role::Guest => Side::Guest {
                sync: GuestSync,
                mirror: StateMirror::new(),
            },
        };
        Self {
            role,
            phase: Phase::Negotiating,
            side,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// What the renderer should draw this frame. `None` until a guest has
    /// received its first state.
    pub fn view(&self) -> Option<&WorldSnapshot> {
        match &self.side {
            Side::Host { published, .. } => Some(published),
            Side::Guest { mirror, .. } => mirror.current(),
        }
    }

    pub fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                if self.phase == Phase::Negotiating {
                    info!(role = %self.role, "channel open, session active");
                    self.phase = Phase::Active;
                }
            }
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Closed => {
                if self.phase != Phase::Ended {
                    info!(role = %self.role, "channel closed, session ended");
                    self.phase = Phase::Ended;
                }
            }
        }
    }

    fn on_message(&mut self, text: &str) {
        if self.phase == Phase::Ended {
            return;
        }
        let inbound = match route(text, self.role) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "rejected inbound message");
                return;
            }
        };
        match (inbound, &mut self.side) {
            (Inbound::RemoteInput(input), Side::Host { engine, .. }) => {
                engine.update_player_input(self.role.opponent(), input);
            }
            (Inbound::State { seq, snapshot }, Side::Guest { mirror, .. }) => {
                mirror.apply(seq, snapshot);
            }
            (Inbound::Ignored(reason), _) => debug!(reason, "inbound message ignored"),
            _ => {}
        }
    }

    /// One render frame. Only an active session simulates or sends anything.
    pub fn frame<T: Transport + ?Sized>(&mut self, transport: &T, dt: f32, input: InputSnapshot) {
        if self.phase != Phase::Active {
            return;
        }
        match &mut self.side {
            Side::Host { engine, sync, published } => {
                engine.update_player_input(self.role, input);
                for event in engine.update(dt) {
                    log_event(&event);
                }
                *published = engine.snapshot();
                sync.publish(transport, published);
            }
            Side::Guest { sync, .. } => {
                sync.push_input(transport, &input);
            }
        }
    }
}

fn log_event(event: &SimEvent) {
    match event {
        SimEvent::Defeated { role } => info!(%role, "player defeated"),
        other => debug!(?other, "sim event"),
    }
}
