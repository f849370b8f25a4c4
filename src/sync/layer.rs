//! Per-frame push of state (host) and input (guest), and routing of what arrives.

use tracing::{trace, warn};

use super::protocol::Message;
use crate::core::network::Transport;
use crate::error::ProtocolError;
use crate::sim::{InputSnapshot, Role, WorldSnapshot};

/// Host side: stamps and sends one snapshot per frame.
#[derive(Debug, Default)]
pub struct HostSync {
    next_seq: u64,
}

impl HostSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends `snapshot` if the channel is open. A closed channel drops the frame;
    /// nothing is queued or retried.
    pub fn publish<T: Transport + ?Sized>(&mut self, transport: &T, snapshot: &WorldSnapshot) -> bool {
        if !transport.is_open() {
            trace!("channel not open, state frame dropped");
            return false;
        }
        self.next_seq += 1;
        let msg = Message::State {
            seq: Some(self.next_seq),
            state: snapshot.clone(),
        };
        send(transport, &msg)
    }
}

/// Guest side: forwards local input upstream.
#[derive(Debug, Default)]
pub struct GuestSync;

impl GuestSync {
    pub fn push_input<T: Transport + ?Sized>(&self, transport: &T, input: &InputSnapshot) -> bool {
        if !transport.is_open() {
            trace!("channel not open, input frame dropped");
            return false;
        }
        send(transport, &Message::Input { input: *input })
    }
}

fn send<T: Transport + ?Sized>(transport: &T, msg: &Message) -> bool {
    match msg.encode() {
        Ok(text) => {
            transport.send(text);
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to encode outbound message");
            false
        }
    }
}

/// What an inbound message means for the receiving peer.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Host: new input for the remote player.
    RemoteInput(InputSnapshot),
    /// Guest: a fresh world to display.
    State { seq: Option<u64>, snapshot: WorldSnapshot },
    /// Well-formed but not meant for this role.
    Ignored(&'static str),
}

/// Decodes `text` and classifies it for a peer playing `local`.
pub fn route(text: &str, local: Role) -> Result<Inbound, ProtocolError> {
    let inbound = match (Message::decode(text)?, local) {
        (Message::Input { input }, Role::Host) => Inbound::RemoteInput(input),
        (Message::State { seq, state }, Role::Guest) => Inbound::State { seq, snapshot: state },
        (Message::Input { .. }, _) => Inbound::Ignored("input is only accepted by the host"),
        (Message::State { .. }, _) => Inbound::Ignored("state is only accepted by the guest"),
    };
    Ok(inbound)
}

/// The guest's read-only copy of the host world.
///
/// Each accepted snapshot replaces the previous one whole; nothing is merged or
/// interpolated. Sequenced snapshots that are not newer than the last applied one
/// are discarded.
#[derive(Debug, Default)]
pub struct StateMirror {
    current: Option<WorldSnapshot>,
    last_seq: Option<u64>,
}

impl StateMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&WorldSnapshot> {
        self.current.as_ref()
    }

    #[cfg(test)]
    fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    /// Returns false if the snapshot was stale and discarded.
    pub fn apply(&mut self, seq: Option<u64>, snapshot: WorldSnapshot) -> bool {
        if let (Some(seq), Some(last)) = (seq, self.last_seq) {
            if seq <= last {
                trace!(seq, last, "stale state discarded");
                return false;
            }
        }
        if seq.is_some() {
            self.last_seq = seq;
        }
        self.current = Some(snapshot);
        true
    }
}
