//! # dino-abilities
//!
//! Engine-agnostic ability resolution for dinosaur combat: effect
//! containers, targeting, spec building, charged abilities and cooldowns.
//!
//! ## Design Principles
//!
//! 1. **Host-Agnostic**: No actors, attributes, animation or networking
//!    live here. The host engine is reached only through the traits in
//!    [`host`].
//!
//! 2. **Data Over Code**: Containers, effects and abilities are plain
//!    serde data, validated when authored and immutable at runtime.
//!
//! 3. **Explicit Time and Events**: The host passes "now" into every call
//!    and feeds fired timers back as values. Stale callbacks are recognised
//!    by activation key and dropped.
//!
//! ## Architecture
//!
//! - **Effect pipeline**: trigger tag → `EffectContainer` → `TargetResolver`
//!   → `EffectSpecBuilder` → `EffectApplicationDispatcher`.
//!
//! - **Authority gating**: the authority and predicting clients apply
//!   tracked effects; simulated clients only execute instant effects
//!   locally and keep cooldown delay entries until the server's cooldown
//!   replicates.
//!
//! - **Persistent tag sets**: O(1) snapshots via `im-rs` when capturing a
//!   target's tags onto a spec.
//!
//! ## Modules
//!
//! - `core`: Actor ids, gameplay tags, vector math, time
//! - `effects`: Effect containers, targeting, specs and dispatch
//! - `ability`: Ability definitions, instances, charge and cooldown
//! - `host`: Collaborator traits and the timer queue
//! - `replication`: Effect context wire format
//! - `sim`: In-memory reference host

pub mod core;
pub mod effects;
pub mod ability;
pub mod host;
pub mod replication;
pub mod sim;

// Re-export commonly used types
pub use crate::core::{ActorId, GameplayTag, Seconds, TagError, TagRegistry, TagRequirements, TagSet, Vec3};

pub use crate::effects::{
    ContainerEntry, ContainerError, DamageType, EffectApplicationDispatcher, EffectCatalog, EffectClassId,
    EffectContainer, EffectContainerRegistry, EffectContainerSpec, EffectContext, EffectDefinition,
    EffectDuration, EffectEntry, EffectSpec, EffectSpecBuilder, EventPayload, HitResult, KnockbackMode,
    LevelPolicy, NonAbilityTarget, TargetData, TargetResolver, TargetStrategy,
};

pub use crate::ability::{
    Ability, AbilityCapability, AbilityClassId, AbilityDefinition, AbilityKind, AbilitySystem,
    ActivationError, ActivationKey, ChargeConfig, ChargeController, CommitOutcome, CooldownConfig,
    CooldownError, CooldownLedger, HostFrame, NetAuthority, PredictionKey,
};

pub use crate::host::{
    AbilityHost, ActorTagQuery, Attribute, AttributeQuery, CueError, CueParams, CuePresentationHost,
    EffectApplicationHost, EffectHandle, TimerEvent, TimerHandle, TimerHost, TimerQueue,
};

pub use crate::replication::{decode_context, encode_context, ContextFields, WireError};
