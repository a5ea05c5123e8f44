//! Host-authoritative replication.
//!
//! The authoritative side resolves everything and streams
//! [`ReplicationEvent`]s; the replica mirrors them without recomputing.
//! Ids on the wire are absolute, so both sides agree on every reference.

mod event;
mod codec;
mod timeout;
mod transport;
mod channel;
mod replica;

pub use event::{ReplicationEvent, RevivalCause};
pub use codec::Frame;
pub use timeout::AdaptiveTimeout;
pub use transport::{loopback_pair, LoopbackTransport, Transport};
pub use channel::{AckOutcome, ReplicationChannel};
pub use replica::ReplicaMirror;
