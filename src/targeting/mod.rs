//! Target selection for attacks and random trigger effects.
//!
//! - `TargetMode`: melee, ranged or fully random
//! - `TargetDescriptor`: the chosen target
//! - `TargetResolver`: taunt/lane/creature precedence rules

mod resolver;

pub use resolver::{TargetDescriptor, TargetMode, TargetResolver};
