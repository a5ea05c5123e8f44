//! Wire frames.

use serde::{Deserialize, Serialize};

use crate::error::WireError;

use super::ReplicationEvent;

/// Everything that crosses the wire, in either direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// Authority → replica. `seq` starts at 0 and has no gaps.
    Event { seq: u64, event: ReplicationEvent },
    /// Replica → authority, after a turn settled.
    Ack { turn: u32 },
}

impl Frame {
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        bincode::serialize(self).map_err(WireError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        bincode::deserialize(bytes).map_err(WireError::Decode)
    }
}
