//! Damage source tags.

use serde::{Deserialize, Serialize};

/// What produced a damage application.
///
/// Travels with every application so collaborators can filter (for
/// example "on non-status damage taken") without the core knowing why.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    Attack,
    Spell,
    Poison,
    Burn,
    Recoil,
    Other(String),
}

impl DamageSource {
    /// Damage ticking from a status effect rather than an action.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, DamageSource::Poison | DamageSource::Burn)
    }
}

impl std::fmt::Display for DamageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DamageSource::Attack => write!(f, "attack"),
            DamageSource::Spell => write!(f, "spell"),
            DamageSource::Poison => write!(f, "poison"),
            DamageSource::Burn => write!(f, "burn"),
            DamageSource::Recoil => write!(f, "recoil"),
            DamageSource::Other(tag) => write!(f, "{tag}"),
        }
    }
}
