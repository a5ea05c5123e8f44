//! Hero shields.
//!
//! A shield is a hero-only buffer consumed before hp. The [`ShieldLedger`]
//! owns every write to it and reports each change as a [`ShieldChange`]
//! for replication.

mod ledger;

pub use ledger::{ShieldCause, ShieldChange, ShieldLedger};
