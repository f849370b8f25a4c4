//! Wire envelope exchanged between the two peers.
//!
//! Every message is a self-contained JSON object discriminated by `type`:
//!
//! ```text
//! {"type":"input","input":{"move":{"x":0,"y":1},"look":{"x":0,"y":0},"attack":false}}
//! {"type":"state","seq":42,"state":{"players":{"host":{..},"guest":{..}},"projectiles":[..]}}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::sim::{InputSnapshot, WorldSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Guest -> host: the guest's input for this frame.
    Input { input: InputSnapshot },

    /// Host -> guest: the full post-update world.
    State {
        /// Monotonic per-session counter. Optional so unsequenced senders stay valid.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
        state: WorldSnapshot,
    },
}

impl Message {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses one envelope. Remote input is checked before it can reach the
    /// simulation: non-finite values and oversized turns are rejected, movement
    /// is clamped to its nominal range.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        match serde_json::from_str(text)? {
            Message::Input { input } => {
                if !input.is_finite() {
                    return Err(ProtocolError::NonFiniteInput);
                }
                if !input.look_in_range() {
                    return Err(ProtocolError::LookOutOfRange);
                }
                Ok(Message::Input { input: input.clamped() })
            }
            msg => Ok(msg),
        }
    }
}
