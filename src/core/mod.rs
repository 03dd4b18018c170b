//! Core types: actors, gameplay tags, vector math, simulation time.
//!
//! These are the host-independent building blocks every other module uses.

pub mod actor;
pub mod math;
pub mod tags;

pub use actor::ActorId;
pub use math::Vec3;
pub use tags::{GameplayTag, TagError, TagRegistry, TagRequirements, TagSet};

/// Simulation time and durations, in seconds.
///
/// The host supplies "now" on every call; nothing in this crate reads a clock.
pub type Seconds = f32;
