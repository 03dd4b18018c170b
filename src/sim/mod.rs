//! Reference host for tests and tooling.
//!
//! `SimWorld` implements every host trait in memory and records what the
//! ability pipeline asked of it: applied specs, local executions, generic
//! damage and cues.

mod world;

pub use world::{AppliedEffect, CueEvent, DamageEvent, SimActor, SimWorld};
