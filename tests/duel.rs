use std::cell::{Cell, RefCell};

use goliath::core::network::{Transport, TransportEvent};
use goliath::sim::{InputSnapshot, Role, SimConfig, Vec2};
use goliath::sync::Message;
use goliath::{Phase, Session};

/// One direction of an in-memory link; the test moves frames across by hand.
#[derive(Default)]
struct Pipe {
    open: Cell<bool>,
    queue: RefCell<Vec<String>>,
}

impl Transport for Pipe {
    fn is_open(&self) -> bool {
        self.open.get()
    }

    fn send(&self, msg: String) {
        if self.is_open() {
            self.queue.borrow_mut().push(msg);
        }
    }
}

struct Link {
    host: Session,
    guest: Session,
    host_out: Pipe,
    guest_out: Pipe,
}

impl Link {
    fn new() -> Self {
        Self {
            host: Session::new(Role::Host, SimConfig::default()),
            guest: Session::new(Role::Guest, SimConfig::default()),
            host_out: Pipe::default(),
            guest_out: Pipe::default(),
        }
    }

    fn open(&mut self) {
        self.host_out.open.set(true);
        self.guest_out.open.set(true);
        self.host.on_transport(TransportEvent::Open);
        self.guest.on_transport(TransportEvent::Open);
    }

    /// Guest frame, deliver, host frame, deliver: one round of play.
    fn round(&mut self, dt: f32, host_input: InputSnapshot, guest_input: InputSnapshot) {
        self.guest.frame(&self.guest_out, dt, guest_input);
        for msg in self.guest_out.queue.take() {
            self.host.on_transport(TransportEvent::Message(msg));
        }
        self.host.frame(&self.host_out, dt, host_input);
        for msg in self.host_out.queue.take() {
            self.guest.on_transport(TransportEvent::Message(msg));
        }
    }
}

fn walk_forward() -> InputSnapshot {
    InputSnapshot { movement: Vec2::new(0.0, 1.0), ..Default::default() }
}

/// The guest spawns facing -Z with the host off to its right, so strafing right
/// closes the distance at its full speed of 4 units/s.
fn strafe_right() -> InputSnapshot {
    InputSnapshot { movement: Vec2::new(1.0, 0.0), ..Default::default() }
}

fn attack() -> InputSnapshot {
    InputSnapshot { attack: true, ..Default::default() }
}

#[test]
fn guest_mirrors_the_host_world_exactly() {
    let mut link = Link::new();
    link.open();
    link.round(0.016, attack(), walk_forward());
    link.round(0.016, walk_forward(), InputSnapshot::default());

    assert_eq!(link.guest.view(), link.host.view());
    assert_eq!(link.guest.view().unwrap().projectiles.len(), 1);
}

#[test]
fn nothing_flows_before_the_channel_opens() {
    let mut link = Link::new();
    link.round(0.016, attack(), attack());
    assert_eq!(link.host.phase(), Phase::Negotiating);
    assert!(link.guest.view().is_none());
    assert!(link.host.view().unwrap().projectiles.is_empty());
}

#[test]
fn guest_spear_lands_when_close() {
    let mut link = Link::new();
    link.open();
    // 10 units apart; 2.125 s of strafing leaves 1.5.
    link.round(2.125, InputSnapshot::default(), strafe_right());
    link.round(0.0, InputSnapshot::default(), attack());

    let world = link.guest.view().unwrap();
    let gap = world.players[&Role::Host].position.planar_distance(world.players[&Role::Guest].position);
    assert!((gap - 1.5).abs() < 1e-3, "gap was {gap}");
    assert_eq!(world.players[&Role::Host].health, 85);
}

#[test]
fn guest_spear_whiffs_from_afar() {
    let mut link = Link::new();
    link.open();
    link.round(1.75, InputSnapshot::default(), strafe_right()); // 3 units apart
    link.round(0.0, InputSnapshot::default(), attack());
    assert_eq!(link.guest.view().unwrap().players[&Role::Host].health, 100);
}

#[test]
fn host_stone_reaches_the_guest() {
    let mut link = Link::new();
    link.open();
    // Turn the host a quarter turn towards +X, where the guest stands.
    let turn = InputSnapshot { look: Vec2::new(-std::f32::consts::FRAC_PI_2, 0.0), ..Default::default() };
    link.round(0.0, turn, InputSnapshot::default());
    link.round(2.0, InputSnapshot::default(), strafe_right()); // guest now 2 units away
    link.round(0.0, attack(), InputSnapshot::default());
    for _ in 0..40 {
        link.round(0.016, InputSnapshot::default(), InputSnapshot::default());
    }

    let world = link.guest.view().unwrap();
    assert_eq!(world.players[&Role::Guest].health, 80);
    assert!(world.projectiles.is_empty());
}

#[test]
fn hostile_input_cannot_break_state_sync() {
    let mut link = Link::new();
    link.open();
    let hostile = r#"{"type":"input","input":{"move":{"x":3e38,"y":3e38},"look":{"x":0,"y":0},"attack":false}}"#;
    link.host.on_transport(TransportEvent::Message(hostile.into()));
    link.host.frame(&link.host_out, 1.0, InputSnapshot::default());
    link.host.on_transport(TransportEvent::Message(Message::Input { input: walk_forward() }.encode().unwrap()));

    let mut delivered = 0;
    for _ in 0..6 {
        link.host.frame(&link.host_out, 0.016, InputSnapshot::default());
        for msg in link.host_out.queue.take() {
            assert!(Message::decode(&msg).is_ok(), "undecodable state: {msg}");
            link.guest.on_transport(TransportEvent::Message(msg));
            delivered += 1;
        }
    }

    assert_eq!(delivered, 7);
    let world = link.guest.view().unwrap();
    assert_eq!(Some(world), link.host.view());
    let guest = world.players[&Role::Guest].position;
    assert!(guest.x.is_finite() && guest.z.is_finite());
}

#[test]
fn disconnect_freezes_both_sides() {
    let mut link = Link::new();
    link.open();
    link.round(0.016, walk_forward(), walk_forward());
    link.host.on_transport(TransportEvent::Closed);
    link.guest.on_transport(TransportEvent::Closed);
    let frozen = link.guest.view().cloned();

    link.round(1.0, walk_forward(), walk_forward());
    assert_eq!(link.host.phase(), Phase::Ended);
    assert_eq!(link.guest.view().cloned(), frozen);
}
