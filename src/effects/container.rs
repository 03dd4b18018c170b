//! Effect containers and their registry.
//!
//! A container is authored data: an ordered list of entries, each pairing a
//! target strategy with the effect classes to apply. The registry maps
//! trigger tags onto containers; several tags may share one container.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{GameplayTag, TagRequirements};

use super::definition::EffectClassId;
use super::targeting::TargetStrategy;
use super::validation::{validate_container, ContainerError};
use super::EffectCatalog;

/// Effect classes gated by a requirement on the invoking actor's tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectEntry {
    /// Classes to build specs for, in order.
    pub classes: Vec<EffectClassId>,
    /// Must be satisfied by the invoking actor. Empty means always.
    #[serde(default)]
    pub source_requirements: TagRequirements,
}

impl EffectEntry {
    /// Create an ungated entry.
    pub fn new(classes: impl IntoIterator<Item = EffectClassId>) -> Self {
        Self {
            classes: classes.into_iter().collect(),
            source_requirements: TagRequirements::none(),
        }
    }

    /// Gate the entry (builder pattern).
    #[must_use]
    pub fn requiring(mut self, requirements: TagRequirements) -> Self {
        self.source_requirements = requirements;
        self
    }
}

/// One target strategy and the effects applied to its targets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntry {
    /// `None` means targets are supplied externally after building.
    #[serde(default)]
    pub target: Option<TargetStrategy>,
    pub effects: Vec<EffectEntry>,
}

impl ContainerEntry {
    /// Create an entry with a strategy and no effects.
    pub fn new(target: TargetStrategy) -> Self {
        Self {
            target: Some(target),
            effects: Vec::new(),
        }
    }

    /// Create an entry whose targets are supplied by the caller.
    pub fn external() -> Self {
        Self::default()
    }

    /// Add an effect entry (builder pattern).
    #[must_use]
    pub fn with_effects(mut self, effects: EffectEntry) -> Self {
        self.effects.push(effects);
        self
    }

    /// Every class listed by this entry, in order.
    pub fn all_classes(&self) -> impl Iterator<Item = &EffectClassId> {
        self.effects.iter().flat_map(|entry| entry.classes.iter())
    }
}

/// An ordered list of container entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectContainer {
    /// Human-readable name (for logs).
    #[serde(default)]
    pub name: String,
    pub entries: Vec<ContainerEntry>,
}

impl EffectContainer {
    /// Create an empty container.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Add an entry (builder pattern).
    #[must_use]
    pub fn with_entry(mut self, entry: ContainerEntry) -> Self {
        self.entries.push(entry);
        self
    }
}

/// Maps trigger tags to effect containers.
///
/// Containers are stored behind `Arc` so every tag mapped to the same
/// container shares it and lookups hand out cheap clones.
#[derive(Clone, Debug, Default)]
pub struct EffectContainerRegistry {
    by_tag: FxHashMap<GameplayTag, Arc<EffectContainer>>,
}

impl EffectContainerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a trigger tag to a container. Returns the shared container.
    pub fn register(&mut self, trigger: GameplayTag, container: EffectContainer) -> Arc<EffectContainer> {
        let container = Arc::new(container);
        self.register_shared(trigger, Arc::clone(&container));
        container
    }

    /// Map another trigger tag onto an already shared container.
    pub fn register_shared(&mut self, trigger: GameplayTag, container: Arc<EffectContainer>) {
        if let Some(previous) = self.by_tag.insert(trigger.clone(), container) {
            tracing::debug!(tag = %trigger, previous = %previous.name, "trigger tag remapped");
        }
    }

    /// Remove a mapping.
    pub fn unregister(&mut self, trigger: &GameplayTag) -> Option<Arc<EffectContainer>> {
        self.by_tag.remove(trigger)
    }

    /// Container registered for exactly this tag.
    #[must_use]
    pub fn get(&self, trigger: &GameplayTag) -> Option<&Arc<EffectContainer>> {
        self.by_tag.get(trigger)
    }

    /// Container for an event tag: the exact mapping, else the mapping of the
    /// closest registered parent tag.
    #[must_use]
    pub fn find(&self, event_tag: &GameplayTag) -> Option<&Arc<EffectContainer>> {
        if let Some(container) = self.by_tag.get(event_tag) {
            return Some(container);
        }
        self.by_tag
            .iter()
            .filter(|(tag, _)| event_tag.matches(tag))
            .max_by_key(|(tag, _)| tag.depth())
            .map(|(_, container)| container)
    }

    /// Number of trigger tags mapped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Iterate over tag/container mappings.
    pub fn iter(&self) -> impl Iterator<Item = (&GameplayTag, &Arc<EffectContainer>)> {
        self.by_tag.iter()
    }

    /// Authoring-time validation of every registered container.
    ///
    /// Errors are sorted by trigger tag so reports are stable.
    pub fn validate(&self, catalog: &EffectCatalog) -> Result<(), Vec<(GameplayTag, ContainerError)>> {
        let mut errors: Vec<_> = self
            .by_tag
            .iter()
            .flat_map(|(tag, container)| {
                validate_container(container, catalog)
                    .err()
                    .into_iter()
                    .flatten()
                    .map(move |error| (tag.clone(), error))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort_by(|a, b| a.0.cmp(&b.0));
            Err(errors)
        }
    }
}
