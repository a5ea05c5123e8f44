//! The damage pipeline.
//!
//! Every hit, whatever produced it, passes through the same ordered stages:
//!
//! 1. base attack (weakened attackers deal reduced damage)
//! 2. attacker modifiers
//! 3. protection
//! 4. damage-source modification (resistance)
//! 5. shield/hp split
//! 6. reactive triggers (melee only)
//! 7. immortal-revival check
//!
//! Stages 1–4 only read state and produce a [`ResolvedDamage`]. Stages 5–7
//! mutate the roster and emit replication events.

mod source;
mod result;
mod pipeline;

pub use source::DamageSource;
pub use result::{DamageApplicationResult, DamageContext, ResolvedDamage};
pub use pipeline::DamagePipeline;
