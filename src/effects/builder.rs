//! Effect spec construction.
//!
//! The `EffectSpecBuilder` turns an authored container plus a fired event
//! into one [`EffectContainerSpec`] per entry:
//!
//! 1. resolve the entry's targets and split off targets without an ability
//!    system (they get generic damage and cues only);
//! 2. resolve the effect level once per build;
//! 3. build one spec per effect class of every effect entry whose source
//!    requirements the invoking actor meets.
//!
//! Entries that build no specs still return their target data so cue-only
//! entries keep working downstream.

use serde::{Deserialize, Serialize};

use crate::core::{ActorId, TagSet};
use crate::host::{ActorTagQuery, Attribute, AttributeQuery};

use super::container::{ContainerEntry, EffectContainer};
use super::context::EffectContext;
use super::event::EventPayload;
use super::spec::{EffectContainerSpec, EffectSpec, NonAbilityTarget, SetByCallerMagnitudes};
use super::targeting::{TargetData, TargetResolver};
use super::EffectCatalog;

/// Sentinel for "no level override".
pub const NO_LEVEL_OVERRIDE: i32 = -1;

/// Levels are derived from growth in this many steps.
const GROWTH_LEVEL_STEPS: f32 = 5.0;

/// How an ability picks the level of the specs it builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelPolicy {
    /// Fixed level. Takes precedence over growth scaling.
    #[serde(default)]
    pub default_level: Option<i32>,
    /// Derive the level from the owner's growth attribute.
    #[serde(default)]
    pub scale_with_growth: bool,
}

impl LevelPolicy {
    /// Always use `level`.
    #[must_use]
    pub fn fixed(level: i32) -> Self {
        Self {
            default_level: Some(level),
            scale_with_growth: false,
        }
    }

    /// Derive the level from growth.
    #[must_use]
    pub fn growth_scaled() -> Self {
        Self {
            default_level: None,
            scale_with_growth: true,
        }
    }

    /// Resolve the effective level.
    ///
    /// Override first, then the default level, then growth scaling
    /// (`round(growth * 5)`, at least 1, uninitialized growth counts as 0),
    /// then 1.
    #[must_use]
    pub fn resolve(&self, override_level: i32, growth: Option<f32>) -> i32 {
        if override_level != NO_LEVEL_OVERRIDE {
            return override_level;
        }
        if let Some(level) = self.default_level {
            return level;
        }
        if self.scale_with_growth {
            let growth = growth.unwrap_or(0.0);
            return ((growth * GROWTH_LEVEL_STEPS).round() as i32).max(1);
        }
        1
    }
}

/// The ability on whose behalf specs are built.
#[derive(Clone, Copy, Debug)]
pub struct SpecSource<'a> {
    /// The invoking (triggering) actor.
    pub owner: ActorId,
    pub level: LevelPolicy,
    /// Ability-level set-by-caller defaults.
    pub set_by_caller: &'a SetByCallerMagnitudes,
    /// Tags attached to every built spec.
    pub ability_tags: &'a TagSet,
}

/// Builds effect container specs.
#[derive(Clone, Copy, Debug)]
pub struct EffectSpecBuilder<'a> {
    catalog: &'a EffectCatalog,
    resolver: &'a TargetResolver,
}

impl<'a> EffectSpecBuilder<'a> {
    /// Create a builder over a catalog and target resolver.
    #[must_use]
    pub fn new(catalog: &'a EffectCatalog, resolver: &'a TargetResolver) -> Self {
        Self { catalog, resolver }
    }

    /// Build one container spec per entry, in declared order.
    ///
    /// `set_by_caller` is merged over the ability defaults; call-site values
    /// win on key collision. `override_level` is [`NO_LEVEL_OVERRIDE`] unless
    /// the caller forces a level.
    pub fn build_specs<H>(
        &self,
        host: &H,
        source: &SpecSource<'_>,
        container: &EffectContainer,
        payload: &EventPayload,
        set_by_caller: &SetByCallerMagnitudes,
        override_level: i32,
    ) -> Vec<EffectContainerSpec>
    where
        H: ActorTagQuery + AttributeQuery + ?Sized,
    {
        let owner_tags = host.owned_tags(source.owner);
        let level = source
            .level
            .resolve(override_level, host.attribute(source.owner, Attribute::Growth));
        let context = self.base_context(host, source.owner, payload);

        let mut magnitudes = source.set_by_caller.clone();
        magnitudes.extend(set_by_caller.iter().map(|(key, value)| (key.clone(), *value)));

        let captured_target_tags = payload
            .hit_result
            .as_ref()
            .and_then(|hit| hit.actor)
            .map(|actor| host.owned_tags(actor))
            .unwrap_or_default();

        tracing::debug!(
            actor = %source.owner,
            container = %container.name,
            event = %payload.event_tag,
            level,
            "building effect specs"
        );

        container
            .entries
            .iter()
            .map(|entry| {
                let mut spec = EffectContainerSpec {
                    event_magnitude: context.event_magnitude,
                    source: Some(source.owner),
                    ..EffectContainerSpec::default()
                };

                if let Some(strategy) = &entry.target {
                    let targets = self.resolver.resolve(strategy, source.owner, payload);
                    if !targets.is_empty() {
                        self.split_targets(host, entry, targets, &mut spec);
                        if spec.target_data.is_empty() {
                            // Every target takes the generic fallback path.
                            return spec;
                        }
                    }
                }

                for effects in &entry.effects {
                    if !effects.source_requirements.requirements_met(&owner_tags) {
                        tracing::debug!(actor = %source.owner, "source requirements not met, skipping effect entry");
                        continue;
                    }

                    for class in &effects.classes {
                        let Some(definition) = self.catalog.get(*class) else {
                            tracing::warn!(%class, container = %container.name, "unknown effect class");
                            continue;
                        };
                        spec.specs.push(EffectSpec {
                            class: *class,
                            level,
                            duration: definition.duration,
                            context: context.duplicate(),
                            set_by_caller: magnitudes.clone(),
                            dynamic_tags: source.ability_tags.clone(),
                            captured_target_tags: captured_target_tags.clone(),
                        });
                    }
                }
                spec
            })
            .collect()
    }

    /// Move targets without an ability system into the fallback list.
    fn split_targets<H>(&self, host: &H, entry: &ContainerEntry, targets: TargetData, spec: &mut EffectContainerSpec)
    where
        H: ActorTagQuery + ?Sized,
    {
        let mut cues: Option<TagSet> = None;
        let mut entry_cues = || {
            cues.get_or_insert_with(|| self.catalog.aggregate_cues(entry.all_classes()))
                .clone()
        };

        for hit in targets.hit_results {
            match hit.actor {
                Some(actor) if host.has_ability_system(actor) => spec.target_data.hit_results.push(hit),
                _ => spec.non_ability_targets.push(NonAbilityTarget::from_hit(hit, entry_cues())),
            }
        }
        for actor in targets.actors {
            if host.has_ability_system(actor) {
                spec.target_data.actors.push(actor);
            } else {
                spec.non_ability_targets.push(NonAbilityTarget::from_actor(actor, entry_cues()));
            }
        }
    }

    /// The context every spec of this build starts from.
    fn base_context<H>(&self, host: &H, owner: ActorId, payload: &EventPayload) -> EffectContext
    where
        H: AttributeQuery + ?Sized,
    {
        let mut context = payload.context.clone().unwrap_or_default();

        if context.instigator.is_none() {
            context.instigator = Some(payload.instigator.unwrap_or(owner));
        }
        if context.causer.is_none() {
            context.causer = Some(owner);
        }
        if context.hit_result.is_none() {
            context.hit_result = payload.hit_result.clone();
        }
        if payload.magnitude != 0.0 {
            context.event_magnitude = payload.magnitude;
        }
        if context.movement_speed == 0.0 {
            if let Some(instigator) = context.instigator {
                context.movement_speed = host.attribute(instigator, Attribute::MovementSpeed).unwrap_or(0.0);
            }
        }

        if context.damage_type.is_reflected() {
            // The struck actor damages itself on the attacker's behalf.
            if let Some(target) = payload.original_target() {
                context.instigator = Some(target);
                context.causer = Some(target);
            }
            if let Some(hit) = context.hit_result.as_mut() {
                hit.swap_bones();
            }
        }

        context
    }
}
