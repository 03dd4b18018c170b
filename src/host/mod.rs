//! Collaborator interfaces implemented by the host engine.
//!
//! The pipeline never touches actors, attributes, effects or presentation
//! directly. It asks the host through these traits:
//!
//! - [`ActorTagQuery`]: owned tags and ability-system presence
//! - [`AttributeQuery`]: attribute snapshots (growth, movement speed)
//! - [`EffectApplicationHost`]: applying, executing and removing effects
//! - [`CuePresentationHost`]: fire-and-forget presentation cues
//! - [`TimerHost`]: scheduled events (see [`timer`])
//!
//! [`AbilityHost`] bundles the first four so call sites take one `&mut dyn`.

pub mod timer;

pub use timer::{TimerEvent, TimerHandle, TimerHost, TimerQueue};

use serde::{Deserialize, Serialize};

use crate::core::{ActorId, GameplayTag, TagSet, Vec3};
use crate::effects::{EffectClassId, EffectSpec, HitResult};

/// Handle to an effect the host is tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectHandle(pub u64);

impl std::fmt::Display for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Tag and capability queries about actors.
pub trait ActorTagQuery {
    /// Tags the actor currently owns. Unknown actors own nothing.
    fn owned_tags(&self, actor: ActorId) -> TagSet;

    /// True if the actor can receive full effect applications.
    fn has_ability_system(&self, actor: ActorId) -> bool;

    /// True if the id still refers to a live actor.
    fn is_valid(&self, actor: ActorId) -> bool;
}

/// Attributes the pipeline snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// Growth progress in `[0, 1]`.
    Growth,
    /// Current movement speed.
    MovementSpeed,
}

/// Attribute lookups.
pub trait AttributeQuery {
    /// Current value, or `None` if the actor has no such attribute yet.
    fn attribute(&self, actor: ActorId, attribute: Attribute) -> Option<f32>;
}

/// Effect application on the host.
pub trait EffectApplicationHost {
    /// Apply a spec with full semantics. Returns a handle for tracked
    /// (non-instant) effects; instant effects may return `None`.
    fn apply_spec(&mut self, spec: &EffectSpec, target: ActorId) -> Option<EffectHandle>;

    /// Client-local predicted execution of an instant spec. Allocates nothing
    /// the server would track.
    fn execute_instant(&mut self, spec: &EffectSpec, target: ActorId);

    /// Remove one tracked effect. Returns false if it was already gone.
    fn remove_effect(&mut self, handle: EffectHandle) -> bool;

    /// Remove every effect of `class` that `source` applied. Returns how many.
    fn remove_by_source_class(&mut self, source: ActorId, class: EffectClassId) -> usize;

    /// Generic point damage for targets without an ability system.
    fn apply_point_damage(
        &mut self,
        target: ActorId,
        amount: f32,
        direction: Vec3,
        hit: &HitResult,
        instigator: Option<ActorId>,
    );

    /// Generic undirected damage for targets without an ability system.
    fn apply_damage(&mut self, target: ActorId, amount: f32, instigator: Option<ActorId>);
}

/// Parameters handed to a presentation cue.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CueParams {
    pub instigator: Option<ActorId>,
    pub target: Option<ActorId>,
    pub location: Option<Vec3>,
    pub normal: Option<Vec3>,
    pub magnitude: f32,
}

/// Failures a host may report when firing a cue.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CueError {
    /// No handler is registered for the cue tag.
    #[error("no cue handler for `{0}`")]
    UnknownCue(GameplayTag),

    /// The presentation layer could not run the cue.
    #[error("cue `{tag}` failed: {reason}")]
    Failed { tag: GameplayTag, reason: String },
}

/// Visual/audio presentation. Failures never affect gameplay.
pub trait CuePresentationHost {
    fn fire_cue(&mut self, tag: &GameplayTag, params: &CueParams) -> Result<(), CueError>;
}

/// Everything the ability pipeline needs from the host, minus timers.
pub trait AbilityHost: ActorTagQuery + AttributeQuery + EffectApplicationHost + CuePresentationHost {}

impl<T> AbilityHost for T where T: ActorTagQuery + AttributeQuery + EffectApplicationHost + CuePresentationHost {}
