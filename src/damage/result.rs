//! Damage values flowing through and out of the pipeline.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::CombatantId;

use super::DamageSource;

/// Outcome of one damage application.
///
/// `shield_damage + hp_damage == total` always holds. `hp_lost` can be
/// smaller than `hp_damage` when hp bottoms out at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DamageApplicationResult {
    pub total: u32,
    pub shield_damage: u32,
    pub hp_damage: u32,
    pub hp_lost: u32,
    /// Final death, on the first hp > 0 → 0 transition only.
    pub died: bool,
    /// Death prevented by an immortal stack.
    pub revived: bool,
}

/// Who is hit, by whom, and how.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageContext {
    pub attacker: Option<CombatantId>,
    pub source: DamageSource,
    /// Melee attacks fire reactive triggers; nothing else does.
    pub melee: bool,
}

impl DamageContext {
    pub fn attack(attacker: CombatantId, melee: bool) -> Self {
        Self {
            attacker: Some(attacker),
            source: DamageSource::Attack,
            melee,
        }
    }

    pub fn from_source(source: DamageSource, attacker: Option<CombatantId>) -> Self {
        Self {
            attacker,
            source,
            melee: false,
        }
    }
}

/// Damage after the pre-application stages, before anything is mutated.
///
/// Computing both lanes' `ResolvedDamage` before applying either keeps a
/// simultaneous turn independent of application order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDamage {
    pub target: CombatantId,
    pub context: DamageContext,
    pub base: f64,
    pub after_modifiers: f64,
    pub after_protection: f64,
    pub final_damage: f64,
    pub protector: Option<CombatantId>,
    pub resisted: bool,
    pub effects_triggered: SmallVec<[String; 2]>,
}

impl ResolvedDamage {
    /// Integer amount that will be split between shield and hp.
    #[must_use]
    pub fn amount(&self) -> u32 {
        if self.final_damage.is_finite() && self.final_damage > 0.0 {
            self.final_damage.floor().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }
}
