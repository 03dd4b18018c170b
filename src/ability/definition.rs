//! Ability definitions - static ability data.
//!
//! `AbilityDefinition` holds the authored, immutable properties of an
//! ability class: how it is driven (instant, charged, periodic), what
//! cooldown it commits, how it resolves its effect level, and which
//! magnitudes and tags it contributes to every spec it builds.
//!
//! Per-actor runtime state lives in [`Ability`](super::Ability).

use serde::{Deserialize, Serialize};

use crate::core::{GameplayTag, Seconds, TagRequirements, TagSet};
use crate::effects::{EffectClassId, LevelPolicy, SetByCallerMagnitudes};

use super::charge::ChargeConfig;

/// Unique identifier for an ability class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityClassId(pub u32);

impl AbilityClassId {
    /// Create a new ability class ID.
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

impl std::fmt::Display for AbilityClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ability({})", self.0)
    }
}

/// How an ability is driven once activated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Fires on activation.
    #[default]
    Instant,
    /// Press to charge, release to fire.
    Charged(ChargeConfig),
    /// Raises `event` every `interval` seconds while active.
    Periodic { interval: Seconds, event: GameplayTag },
}

/// The cooldown an ability commits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Effect class applied as the cooldown.
    pub effect: EffectClassId,
    /// Nominal duration, also used for the local delay entry.
    pub duration: Seconds,
}

/// Static ability definition.
///
/// ## Example
///
/// ```
/// use dino_abilities::ability::{AbilityClassId, AbilityDefinition};
/// use dino_abilities::core::GameplayTag;
/// use dino_abilities::effects::{EffectClassId, LevelPolicy};
///
/// let bite = AbilityDefinition::new(AbilityClassId::new(1), "Bite")
///     .with_cooldown(EffectClassId::new(90), 1.5)
///     .with_level(LevelPolicy::growth_scaled())
///     .with_magnitude("SetByCaller.Damage".parse::<GameplayTag>().unwrap(), 40.0);
///
/// assert_eq!(bite.cooldown.map(|c| c.duration), Some(1.5));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: AbilityClassId,

    /// Display/debugging name.
    pub name: String,

    #[serde(default)]
    pub kind: AbilityKind,

    /// Gameplay event that activates the ability on its own.
    #[serde(default)]
    pub trigger: Option<GameplayTag>,

    #[serde(default)]
    pub cooldown: Option<CooldownConfig>,

    #[serde(default)]
    pub level: LevelPolicy,

    /// Set-by-caller defaults merged into every spec.
    #[serde(default)]
    pub set_by_caller: SetByCallerMagnitudes,

    /// Tags attached to every spec.
    #[serde(default)]
    pub ability_tags: TagSet,

    /// Owner tags required (and blocked) for activation.
    #[serde(default)]
    pub activation_requirements: TagRequirements,

    /// May run alongside other abilities.
    #[serde(default)]
    pub non_exclusive: bool,
}

impl AbilityDefinition {
    /// Create an instant, exclusive ability with no cooldown.
    #[must_use]
    pub fn new(id: AbilityClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: AbilityKind::Instant,
            trigger: None,
            cooldown: None,
            level: LevelPolicy::default(),
            set_by_caller: SetByCallerMagnitudes::default(),
            ability_tags: TagSet::new(),
            activation_requirements: TagRequirements::none(),
            non_exclusive: false,
        }
    }

    /// Make the ability charged (builder pattern).
    #[must_use]
    pub fn charged(mut self, config: ChargeConfig) -> Self {
        self.kind = AbilityKind::Charged(config);
        self
    }

    /// Make the ability periodic (builder pattern).
    #[must_use]
    pub fn periodic(mut self, interval: Seconds, event: GameplayTag) -> Self {
        self.kind = AbilityKind::Periodic { interval, event };
        self
    }

    /// Activate on a gameplay event (builder pattern).
    #[must_use]
    pub fn triggered_by(mut self, event: GameplayTag) -> Self {
        self.trigger = Some(event);
        self
    }

    /// Commit a cooldown on activation (builder pattern).
    #[must_use]
    pub fn with_cooldown(mut self, effect: EffectClassId, duration: Seconds) -> Self {
        self.cooldown = Some(CooldownConfig { effect, duration });
        self
    }

    /// Set the level policy (builder pattern).
    #[must_use]
    pub fn with_level(mut self, level: LevelPolicy) -> Self {
        self.level = level;
        self
    }

    /// Add a set-by-caller default (builder pattern).
    #[must_use]
    pub fn with_magnitude(mut self, key: GameplayTag, value: f32) -> Self {
        self.set_by_caller.insert(key, value);
        self
    }

    /// Add ability tags (builder pattern).
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = GameplayTag>) -> Self {
        self.ability_tags.extend(tags);
        self
    }

    /// Set activation requirements (builder pattern).
    #[must_use]
    pub fn requiring(mut self, requirements: TagRequirements) -> Self {
        self.activation_requirements = requirements;
        self
    }

    /// Allow running alongside other abilities (builder pattern).
    #[must_use]
    pub fn non_exclusive(mut self) -> Self {
        self.non_exclusive = true;
        self
    }

    /// Charge configuration, for charged abilities.
    #[must_use]
    pub fn charge_config(&self) -> Option<&ChargeConfig> {
        match &self.kind {
            AbilityKind::Charged(config) => Some(config),
            _ => None,
        }
    }
}
