//! Effect targeting system.
//!
//! Defines how a container entry finds its targets:
//! - `TargetStrategy`: which targets an entry wants
//! - `TargetData`: the hit results and actors a strategy produced
//! - `TargetResolver`: dispatches strategies, including game-registered ones
//!
//! No strategy fails. An event with nothing to target resolves to empty
//! target data, and abilities treat that as a normal outcome.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::ActorId;

use super::context::HitResult;
use super::event::EventPayload;

/// How a container entry selects its targets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetStrategy {
    /// The actor that fired the event.
    UseOwner,
    /// The event's hit result, or failing that its target actor.
    UseEventData,
    /// The event's instigator.
    UseEventInstigator,
    /// A game-registered strategy, looked up by name.
    Custom(String),
}

/// Targets produced by a strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetData {
    pub hit_results: Vec<HitResult>,
    pub actors: Vec<ActorId>,
}

impl TargetData {
    /// Create empty target data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Target data holding one actor.
    #[must_use]
    pub fn actor(actor: ActorId) -> Self {
        Self {
            hit_results: Vec::new(),
            actors: vec![actor],
        }
    }

    /// Target data holding one hit.
    #[must_use]
    pub fn hit(hit: HitResult) -> Self {
        Self {
            hit_results: vec![hit],
            actors: Vec::new(),
        }
    }

    /// Append everything from `other`.
    pub fn append(&mut self, other: TargetData) {
        self.hit_results.extend(other.hit_results);
        self.actors.extend(other.actors);
    }

    /// Every actor referenced, hits first, in order. Hits without an actor
    /// are skipped.
    pub fn target_actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.hit_results
            .iter()
            .filter_map(|hit| hit.actor)
            .chain(self.actors.iter().copied())
    }

    /// Number of hits plus actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hit_results.len() + self.actors.len()
    }

    /// Check if there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hit_results.is_empty() && self.actors.is_empty()
    }
}

/// A game-registered targeting function.
pub type CustomTargetFn = Arc<dyn Fn(ActorId, &EventPayload) -> TargetData + Send + Sync>;

/// Dispatches target strategies.
///
/// ## Example
///
/// ```
/// use dino_abilities::core::{ActorId, GameplayTag};
/// use dino_abilities::effects::{EventPayload, TargetData, TargetResolver, TargetStrategy};
///
/// let mut resolver = TargetResolver::new();
/// resolver.register_custom("PackMates", |_owner, _event| {
///     TargetData { hit_results: Vec::new(), actors: vec![ActorId(4), ActorId(5)] }
/// });
///
/// let event = EventPayload::new("Event.Roar".parse::<GameplayTag>().unwrap());
/// let targets = resolver.resolve(&TargetStrategy::Custom("PackMates".into()), ActorId(1), &event);
/// assert_eq!(targets.actors.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct TargetResolver {
    custom: FxHashMap<String, CustomTargetFn>,
}

impl TargetResolver {
    /// Create a resolver with only the built-in strategies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named custom strategy, replacing any previous one.
    pub fn register_custom(
        &mut self,
        name: impl Into<String>,
        resolve: impl Fn(ActorId, &EventPayload) -> TargetData + Send + Sync + 'static,
    ) {
        self.custom.insert(name.into(), Arc::new(resolve));
    }

    /// Check if a custom strategy is registered.
    #[must_use]
    pub fn has_custom(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Produce targets for an event.
    #[must_use]
    pub fn resolve(
        &self,
        strategy: &TargetStrategy,
        triggering_actor: ActorId,
        payload: &EventPayload,
    ) -> TargetData {
        match strategy {
            TargetStrategy::UseOwner => TargetData::actor(triggering_actor),

            TargetStrategy::UseEventData => {
                if let Some(hit) = &payload.hit_result {
                    TargetData::hit(hit.clone())
                } else if let Some(target) = payload.target {
                    TargetData::actor(target)
                } else {
                    TargetData::new()
                }
            }

            TargetStrategy::UseEventInstigator => payload
                .instigator
                .map(TargetData::actor)
                .unwrap_or_default(),

            TargetStrategy::Custom(name) => match self.custom.get(name) {
                Some(resolve) => resolve(triggering_actor, payload),
                None => {
                    tracing::warn!(strategy = %name, actor = %triggering_actor, "unknown custom target strategy");
                    TargetData::new()
                }
            },
        }
    }
}

impl std::fmt::Debug for TargetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("TargetResolver").field("custom", &names).finish()
    }
}
