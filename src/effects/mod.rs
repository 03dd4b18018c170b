//! Effect containers, targeting, spec building and application.
//!
//! The pipeline, from authored data to host calls:
//! - `EffectContainerRegistry`: trigger tag → `EffectContainer`
//! - `TargetResolver`: target strategy → hit results and actors
//! - `EffectSpecBuilder`: container + event → `EffectContainerSpec`s
//! - `EffectApplicationDispatcher`: authority-gated application of specs
//!
//! ## Design Philosophy
//!
//! Everything authored (containers, effect definitions) is plain data that
//! never changes at runtime. Everything built (specs, contexts) is created
//! per activation, owned by the activation, and dropped after application.
//! Host state is only ever reached through the traits in [`crate::host`].

mod builder;
mod container;
mod context;
mod definition;
mod dispatcher;
mod event;
mod spec;
mod targeting;
mod validation;

pub use builder::{EffectSpecBuilder, LevelPolicy, SpecSource, NO_LEVEL_OVERRIDE};
pub use container::{ContainerEntry, EffectContainer, EffectContainerRegistry, EffectEntry};
pub use context::{DamageType, EffectContext, HitResult, KnockbackMode};
pub use definition::{EffectCatalog, EffectClassId, EffectDefinition, EffectDuration};
pub use dispatcher::EffectApplicationDispatcher;
pub use event::EventPayload;
pub use spec::{EffectContainerSpec, EffectSpec, NonAbilityTarget, SetByCallerMagnitudes};
pub use targeting::{CustomTargetFn, TargetData, TargetResolver, TargetStrategy};
pub use validation::{validate_container, validate_targeted, ContainerError};
