//! Status-effect queries.
//!
//! Status bookkeeping (application, duration, expiry) belongs to an external
//! system. The combat core only asks questions about it, plus spending one
//! immortal stack on revival.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::CombatantId;

/// Forces opposing attackers onto this hero's lane.
pub const TAUNTING: &str = "taunting";
/// Consumable buff that converts one death into a revival.
pub const IMMORTAL: &str = "immortal";
/// Suppresses all healing and revival.
pub const HEAL_BLOCK: &str = "healblock";
/// Reduces outgoing base attack.
pub const WEAKENED: &str = "weakened";
/// Prevents acting this turn.
pub const STUNNED: &str = "stunned";
/// Prevents acting this turn.
pub const FROZEN: &str = "frozen";

/// Query interface over the external status-effect system.
pub trait StatusEffects {
    /// Whether the combatant may act this turn (not stunned, frozen, ...).
    fn can_take_action(&self, id: CombatantId) -> bool;

    /// Current stack count of a named status.
    fn stacks(&self, id: CombatantId, name: &str) -> u32;

    fn has_status_effect(&self, id: CombatantId, name: &str) -> bool {
        self.stacks(id, name) > 0
    }

    /// Remove one stack. Returns false if there was none.
    fn consume_stack(&mut self, id: CombatantId, name: &str) -> bool;
}

/// Table-backed status store.
///
/// Suitable for tests and for hosts whose status system is a plain counter
/// table. `stunned` and `frozen` block actions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBoard {
    stacks: FxHashMap<CombatantId, FxHashMap<String, u32>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add stacks of a status (builder pattern).
    #[must_use]
    pub fn with(mut self, id: CombatantId, name: &str, count: u32) -> Self {
        self.add(id, name, count);
        self
    }

    pub fn add(&mut self, id: CombatantId, name: &str, count: u32) {
        if count == 0 {
            return;
        }
        *self
            .stacks
            .entry(id)
            .or_default()
            .entry(name.to_string())
            .or_insert(0) += count;
    }

    /// Remove every stack of a status.
    pub fn clear(&mut self, id: CombatantId, name: &str) {
        if let Some(entries) = self.stacks.get_mut(&id) {
            entries.remove(name);
        }
    }
}

impl StatusEffects for StatusBoard {
    fn can_take_action(&self, id: CombatantId) -> bool {
        self.stacks(id, STUNNED) == 0 && self.stacks(id, FROZEN) == 0
    }

    fn stacks(&self, id: CombatantId, name: &str) -> u32 {
        self.stacks
            .get(&id)
            .and_then(|entries| entries.get(name))
            .copied()
            .unwrap_or(0)
    }

    fn consume_stack(&mut self, id: CombatantId, name: &str) -> bool {
        let Some(count) = self.stacks.get_mut(&id).and_then(|e| e.get_mut(name)) else {
            return false;
        };
        if *count == 0 {
            return false;
        }
        *count -= 1;
        if *count == 0 {
            self.clear(id, name);
        }
        true
    }
}
