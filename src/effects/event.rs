//! Gameplay event payloads.
//!
//! A payload is what a montage notify, hit detection or an ability hands to
//! the pipeline when it fires a trigger tag: who started it, what it struck,
//! and an optional caller-built context template.

use serde::{Deserialize, Serialize};

use crate::core::{ActorId, GameplayTag};

use super::context::{EffectContext, HitResult};

/// A gameplay event with contextual data.
///
/// Payloads are read-only for the pipeline; target strategies and the spec
/// builder copy what they need out of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// The trigger tag this event was fired under.
    pub event_tag: GameplayTag,
    /// The actor that started the event.
    pub instigator: Option<ActorId>,
    /// The actor the event is aimed at.
    pub target: Option<ActorId>,
    /// Geometry of the hit that produced the event.
    pub hit_result: Option<HitResult>,
    /// Event strength (base damage, heal amount, ...).
    pub magnitude: f32,
    /// Caller-supplied context template for built specs.
    pub context: Option<EffectContext>,
}

impl EventPayload {
    /// Create an event with just a tag.
    pub fn new(event_tag: GameplayTag) -> Self {
        Self {
            event_tag,
            instigator: None,
            target: None,
            hit_result: None,
            magnitude: 0.0,
            context: None,
        }
    }

    /// Create a hit event: instigator struck the hit actor.
    pub fn hit(event_tag: GameplayTag, instigator: ActorId, hit: HitResult, magnitude: f32) -> Self {
        Self::new(event_tag)
            .with_instigator(instigator)
            .with_hit(hit)
            .with_magnitude(magnitude)
    }

    /// Set the instigator (builder pattern).
    #[must_use]
    pub fn with_instigator(mut self, instigator: ActorId) -> Self {
        self.instigator = Some(instigator);
        self
    }

    /// Set the target actor (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the hit result (builder pattern).
    #[must_use]
    pub fn with_hit(mut self, hit: HitResult) -> Self {
        self.hit_result = Some(hit);
        self
    }

    /// Set the magnitude (builder pattern).
    #[must_use]
    pub fn with_magnitude(mut self, magnitude: f32) -> Self {
        self.magnitude = magnitude;
        self
    }

    /// Set the context template (builder pattern).
    #[must_use]
    pub fn with_context(mut self, context: EffectContext) -> Self {
        self.context = Some(context);
        self
    }

    /// The actor originally struck: the explicit target, else the hit actor.
    #[must_use]
    pub fn original_target(&self) -> Option<ActorId> {
        self.target
            .or_else(|| self.hit_result.as_ref().and_then(|hit| hit.actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(path: &str) -> GameplayTag {
        GameplayTag::new(path).unwrap()
    }

    #[test]
    fn test_hit_builder() {
        let event = EventPayload::hit(
            tag("Event.Montage.WeaponHit"),
            ActorId(1),
            HitResult::on_actor(ActorId(2)),
            40.0,
        );
        assert_eq!(event.instigator, Some(ActorId(1)));
        assert_eq!(event.magnitude, 40.0);
        assert_eq!(event.original_target(), Some(ActorId(2)));
    }

    #[test]
    fn test_explicit_target_wins() {
        let event = EventPayload::new(tag("Event.Hit"))
            .with_target(ActorId(5))
            .with_hit(HitResult::on_actor(ActorId(6)));
        assert_eq!(event.original_target(), Some(ActorId(5)));
        assert_eq!(EventPayload::new(tag("Event.Hit")).original_target(), None);
    }
}
