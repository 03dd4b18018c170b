//! Effect class definitions.
//!
//! An effect class is the authored description of a gameplay effect: how
//! long it lasts, which presentation cues it plays and which tags it grants.
//! The `EffectCatalog` stores every class a game defines and answers the
//! lookups the builder and dispatcher need (cue aggregation, instant checks).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Seconds, TagSet};

/// Identifier of an effect class. Games assign meaning via `EffectDefinition`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectClassId(pub u32);

impl EffectClassId {
    /// Create a new effect class ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EffectClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// How long an applied effect persists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum EffectDuration {
    /// Executes once and leaves nothing behind (damage, heals).
    #[default]
    Instant,
    /// Lasts for a fixed number of seconds (cooldowns, buffs).
    Duration(Seconds),
    /// Lasts until removed.
    Infinite,
}

impl EffectDuration {
    /// True for zero-duration effects.
    #[must_use]
    pub fn is_instant(self) -> bool {
        matches!(self, Self::Instant)
    }

    /// Duration in seconds, if finite and non-instant.
    #[must_use]
    pub fn seconds(self) -> Option<Seconds> {
        match self {
            Self::Duration(secs) => Some(secs),
            _ => None,
        }
    }
}

/// Authored definition of an effect class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Unique identifier.
    pub id: EffectClassId,
    /// Human-readable name (for logs).
    pub name: String,
    /// Duration policy.
    #[serde(default)]
    pub duration: EffectDuration,
    /// Presentation cues played when this effect applies.
    #[serde(default)]
    pub cue_tags: TagSet,
    /// Tags granted to the target while the effect is active.
    #[serde(default)]
    pub granted_tags: TagSet,
}

impl EffectDefinition {
    /// Create an instant effect definition.
    pub fn new(id: EffectClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            duration: EffectDuration::Instant,
            cue_tags: TagSet::new(),
            granted_tags: TagSet::new(),
        }
    }

    /// Set a fixed duration (builder pattern).
    #[must_use]
    pub fn with_duration(mut self, seconds: Seconds) -> Self {
        self.duration = EffectDuration::Duration(seconds);
        self
    }

    /// Make the effect last until removed (builder pattern).
    #[must_use]
    pub fn infinite(mut self) -> Self {
        self.duration = EffectDuration::Infinite;
        self
    }

    /// Add presentation cues (builder pattern).
    #[must_use]
    pub fn with_cues(mut self, cues: impl IntoIterator<Item = crate::core::GameplayTag>) -> Self {
        self.cue_tags.extend(cues);
        self
    }

    /// Add granted tags (builder pattern).
    #[must_use]
    pub fn granting(mut self, tags: impl IntoIterator<Item = crate::core::GameplayTag>) -> Self {
        self.granted_tags.extend(tags);
        self
    }
}

/// Registry of effect class definitions.
///
/// ## Example
///
/// ```
/// use dino_abilities::effects::{EffectCatalog, EffectClassId, EffectDefinition};
///
/// let mut catalog = EffectCatalog::new();
/// catalog.register(EffectDefinition::new(EffectClassId::new(1), "Bite Damage"));
///
/// assert!(catalog.is_instant(EffectClassId::new(1)));
/// assert!(catalog.get(EffectClassId::new(2)).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct EffectCatalog {
    effects: FxHashMap<EffectClassId, EffectDefinition>,
}

impl EffectCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same ID.
    pub fn register(&mut self, definition: EffectDefinition) -> Option<EffectDefinition> {
        let previous = self.effects.insert(definition.id, definition);
        if let Some(previous) = &previous {
            tracing::debug!(class = %previous.id, name = %previous.name, "effect definition replaced");
        }
        previous
    }

    /// Get a definition by ID.
    #[must_use]
    pub fn get(&self, id: EffectClassId) -> Option<&EffectDefinition> {
        self.effects.get(&id)
    }

    /// Check if a class is registered.
    #[must_use]
    pub fn contains(&self, id: EffectClassId) -> bool {
        self.effects.contains_key(&id)
    }

    /// True if the class exists and is instant. Unknown classes are not instant.
    #[must_use]
    pub fn is_instant(&self, id: EffectClassId) -> bool {
        self.get(id).is_some_and(|def| def.duration.is_instant())
    }

    /// Union of the cue tags declared by every listed class.
    #[must_use]
    pub fn aggregate_cues<'a>(&self, classes: impl IntoIterator<Item = &'a EffectClassId>) -> TagSet {
        let mut cues = TagSet::new();
        for class in classes {
            if let Some(def) = self.get(*class) {
                cues.extend_from(&def.cue_tags);
            }
        }
        cues
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.values()
    }
}
