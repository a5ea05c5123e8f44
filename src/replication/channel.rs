//! Authority side of replication.
//!
//! The authority sequences every event drained from the session, sends it as
//! a [`Frame`], and after each settled lane turn waits (bounded by an
//! [`AdaptiveTimeout`]) for the replica's acknowledgement. A missing ack is
//! logged and the battle proceeds anyway.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::combat::{BattleSession, TurnBarrier};
use crate::core::AckConfig;
use crate::error::WireError;

use super::{AdaptiveTimeout, Frame, ReplicationEvent, Transport};

/// Result of waiting for a replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AckOutcome {
    Acknowledged { latency: Duration },
    TimedOut { waited: Duration },
}

impl AckOutcome {
    #[must_use]
    pub fn is_acknowledged(self) -> bool {
        matches!(self, AckOutcome::Acknowledged { .. })
    }
}

pub struct ReplicationChannel<T: Transport> {
    transport: T,
    next_seq: u64,
    timeout: AdaptiveTimeout,
}

impl<T: Transport> ReplicationChannel<T> {
    pub fn new(transport: T, ack: &AckConfig) -> Self {
        Self {
            transport,
            next_seq: 0,
            timeout: AdaptiveTimeout::new(ack),
        }
    }

    /// Sequence number the next event will carry.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn timeout(&self) -> &AdaptiveTimeout {
        &self.timeout
    }

    /// Sequence and send one event.
    pub fn publish(&mut self, event: ReplicationEvent) -> Result<(), WireError> {
        let seq = self.next_seq;
        let name = event.name();
        let bytes = Frame::Event { seq, event }.encode()?;
        self.next_seq += 1;
        self.transport.send(bytes)?;
        trace!(seq, event = name, "event published");
        Ok(())
    }
}

impl<T: Transport> TurnBarrier for ReplicationChannel<T> {
    fn broadcast(&mut self, session: &mut BattleSession) {
        for event in session.drain_events() {
            let name = event.name();
            if let Err(err) = self.publish(event) {
                warn!(event = name, error = %err, "failed to publish event");
            }
        }
    }

    fn await_ack(&mut self, turn: u32) -> AckOutcome {
        let bound = self.timeout.current();
        let started = Instant::now();

        loop {
            let elapsed = started.elapsed();
            if elapsed >= bound {
                break;
            }
            match self.transport.recv_timeout(bound - elapsed) {
                Ok(Some(bytes)) => match Frame::decode(&bytes) {
                    Ok(Frame::Ack { turn: acked }) if acked == turn => {
                        let latency = started.elapsed();
                        self.timeout.record_latency(latency);
                        debug!(turn, latency_us = latency.as_micros() as u64, "turn acknowledged");
                        return AckOutcome::Acknowledged { latency };
                    }
                    Ok(Frame::Ack { turn: acked }) => debug!(acked, turn, "stale ack ignored"),
                    Ok(Frame::Event { seq, .. }) => warn!(seq, "replica sent an event frame, ignored"),
                    Err(err) => warn!(error = %err, "undecodable frame from replica"),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!(turn, error = %err, "transport failed while waiting for ack");
                    break;
                }
            }
        }

        let waited = started.elapsed();
        self.timeout.record_timeout();
        warn!(
            turn,
            waited_ms = waited.as_millis() as u64,
            next_bound_ms = self.timeout.current().as_millis() as u64,
            "ack timed out"
        );
        AckOutcome::TimedOut { waited }
    }
}
