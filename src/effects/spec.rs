//! Built effect specs.
//!
//! Specs are the resolved, ready-to-apply counterpart of authored container
//! entries. They are created fresh for each activation, owned by the call
//! that built them, and dropped once applied.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{ActorId, GameplayTag, TagSet};

use super::context::{EffectContext, HitResult};
use super::definition::{EffectClassId, EffectDuration};
use super::targeting::TargetData;

/// Set-by-caller magnitudes keyed by tag.
pub type SetByCallerMagnitudes = FxHashMap<GameplayTag, f32>;

/// One effect class, ready to apply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub class: EffectClassId,
    pub level: i32,
    pub duration: EffectDuration,
    pub context: EffectContext,
    /// Magnitudes supplied by the ability and the call site.
    pub set_by_caller: SetByCallerMagnitudes,
    /// Tags the ability attaches to every spec it builds.
    pub dynamic_tags: TagSet,
    /// The struck actor's owned tags when the spec was built.
    pub captured_target_tags: TagSet,
}

impl EffectSpec {
    /// True for zero-duration effects.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.duration.is_instant()
    }

    /// A set-by-caller magnitude, if present.
    #[must_use]
    pub fn magnitude(&self, key: &GameplayTag) -> Option<f32> {
        self.set_by_caller.get(key).copied()
    }

    /// Deep copy for delayed reapplication, including the owned hit result.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            context: self.context.duplicate(),
            ..self.clone()
        }
    }
}

/// A target without an ability system. It only receives generic damage and
/// the entry's cues.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NonAbilityTarget {
    pub hit_result: Option<HitResult>,
    pub actor: Option<ActorId>,
    pub cue_tags: TagSet,
}

impl NonAbilityTarget {
    /// Wrap a hit.
    pub fn from_hit(hit: HitResult, cue_tags: TagSet) -> Self {
        Self {
            actor: hit.actor,
            hit_result: Some(hit),
            cue_tags,
        }
    }

    /// Wrap a bare actor.
    pub fn from_actor(actor: ActorId, cue_tags: TagSet) -> Self {
        Self {
            hit_result: None,
            actor: Some(actor),
            cue_tags,
        }
    }
}

/// The resolved form of one container entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectContainerSpec {
    /// Targets with an ability system (or supplied externally).
    pub target_data: TargetData,
    pub specs: Vec<EffectSpec>,
    pub non_ability_targets: Vec<NonAbilityTarget>,
    /// Event magnitude used for non-ability damage.
    pub event_magnitude: f32,
    /// The actor the entry was built for.
    pub source: Option<ActorId>,
}

impl EffectContainerSpec {
    /// Supply targets for an entry built without a target strategy.
    pub fn add_targets(&mut self, targets: TargetData) {
        self.target_data.append(targets);
    }

    /// Check if applying this spec would do nothing at all.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.non_ability_targets.is_empty() && (self.specs.is_empty() || self.target_data.is_empty())
    }
}
