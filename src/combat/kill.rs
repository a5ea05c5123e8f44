use serde::{Deserialize, Serialize};

use crate::core::{CombatantId, CombatantKind};

/// Credit for a final death.
///
/// `revived` flips when the victim is later brought back by an external
/// revive; the record itself is never removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillRecord {
    pub killer: CombatantId,
    pub killer_name: String,
    pub target: CombatantId,
    pub target_name: String,
    pub target_kind: CombatantKind,
    pub turn: u32,
    pub revived: bool,
}
