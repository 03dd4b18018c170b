//! Effect container integration tests.
//!
//! These tests drive the build and apply pipeline against the in-memory
//! host: target resolution, the split between ability and non-ability
//! targets, context defaults and authority gating.

use dino_abilities::ability::NetAuthority;
use dino_abilities::core::{ActorId, GameplayTag, TagRequirements, TagSet, Vec3};
use dino_abilities::effects::{
    ContainerEntry, DamageType, EffectApplicationDispatcher, EffectCatalog, EffectClassId, EffectContainer,
    EffectContainerRegistry, EffectContext, EffectDefinition, EffectEntry, EffectSpecBuilder, EventPayload, HitResult,
    LevelPolicy, SetByCallerMagnitudes, SpecSource, TargetData, TargetResolver, TargetStrategy, NO_LEVEL_OVERRIDE,
};
use dino_abilities::host::Attribute;
use dino_abilities::sim::SimWorld;

const OWNER: ActorId = ActorId(1);
const RIVAL: ActorId = ActorId(2);
const STEGO: ActorId = ActorId(3);
const BOULDER: ActorId = ActorId(7);

const BITE_DAMAGE: EffectClassId = EffectClassId::new(10);
const SLOW: EffectClassId = EffectClassId::new(11);
const ENRAGED_BONUS: EffectClassId = EffectClassId::new(12);

fn tag(path: &str) -> GameplayTag {
    path.parse().unwrap()
}

fn catalog() -> EffectCatalog {
    let mut catalog = EffectCatalog::new();
    catalog.register(
        EffectDefinition::new(BITE_DAMAGE, "Bite Damage").with_cues([tag("GameplayCue.Hit.Bite"), tag("GameplayCue.Blood")]),
    );
    catalog.register(EffectDefinition::new(SLOW, "Slow").with_duration(3.0));
    catalog.register(EffectDefinition::new(ENRAGED_BONUS, "Enraged Bonus"));
    catalog
}

fn world() -> SimWorld {
    let mut world = SimWorld::new();
    world.spawn(OWNER);
    world.spawn(RIVAL);
    world.spawn_without_abilities(BOULDER);
    world
}

fn bite_container() -> EffectContainer {
    EffectContainer::new("Bite")
        .with_entry(ContainerEntry::new(TargetStrategy::UseEventData).with_effects(EffectEntry::new([BITE_DAMAGE])))
}

fn hit_on(actor: ActorId) -> HitResult {
    HitResult::on_actor(actor).at(Vec3::new(4.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0))
}

/// Defaults shared by most tests: no ability magnitudes or tags.
struct Source {
    set_by_caller: SetByCallerMagnitudes,
    tags: TagSet,
    level: LevelPolicy,
}

impl Source {
    fn new() -> Self {
        Self {
            set_by_caller: SetByCallerMagnitudes::default(),
            tags: TagSet::new(),
            level: LevelPolicy::fixed(1),
        }
    }

    fn spec_source(&self) -> SpecSource<'_> {
        SpecSource {
            owner: OWNER,
            level: self.level,
            set_by_caller: &self.set_by_caller,
            ability_tags: &self.tags,
        }
    }
}

/// A hit on an actor without an ability system becomes generic point damage
/// plus the container's cues.
#[test]
fn test_non_ability_hit_takes_fallback_path() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    let source = Source::new();

    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(BOULDER), 25.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &bite_container(),
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );

    assert_eq!(specs.len(), 1);
    let spec = &specs[0];
    assert!(spec.specs.is_empty(), "no effect specs for a non-ability target");
    assert!(spec.target_data.is_empty());
    assert_eq!(spec.non_ability_targets.len(), 1);
    let fallback = &spec.non_ability_targets[0];
    assert_eq!(fallback.hit_result.as_ref().and_then(|hit| hit.actor), Some(BOULDER));
    assert!(fallback.cue_tags.has_tag_exact(&tag("GameplayCue.Hit.Bite")));
    assert!(fallback.cue_tags.has_tag_exact(&tag("GameplayCue.Blood")));

    let handles = EffectApplicationDispatcher::apply(spec, NetAuthority::Authority, &mut world);

    assert!(handles.is_empty());
    assert_eq!(world.damage().len(), 1);
    let damage = &world.damage()[0];
    assert_eq!(damage.target, BOULDER);
    assert_eq!(damage.amount, 25.0);
    assert_eq!(damage.direction, Some(Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(damage.instigator, Some(OWNER));
    assert_eq!(world.health(BOULDER), Some(75.0));
    assert_eq!(world.cues().len(), 2);
    assert!(world.cues().iter().all(|cue| cue.params.target == Some(BOULDER)));
}

/// An explicit target actor without a hit falls back to generic damage.
#[test]
fn test_non_ability_actor_takes_generic_damage() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    let source = Source::new();

    let payload = EventPayload::new(tag("Event.Montage.Bite"))
        .with_target(BOULDER)
        .with_magnitude(10.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &bite_container(),
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );
    EffectApplicationDispatcher::apply_all(&specs, NetAuthority::Authority, &mut world);

    assert_eq!(world.damage().len(), 1);
    assert_eq!(world.damage()[0].direction, None);
    assert_eq!(world.health(BOULDER), Some(90.0));
}

/// Fallback targets that died between building and applying are skipped.
#[test]
fn test_dead_fallback_target_is_skipped() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    let source = Source::new();

    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(BOULDER), 25.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &bite_container(),
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );
    world.kill(BOULDER);
    EffectApplicationDispatcher::apply_all(&specs, NetAuthority::Authority, &mut world);

    assert!(world.damage().is_empty());
    assert!(world.cues().is_empty());
}

/// A hit on an actor with an ability system gets real effect specs.
#[test]
fn test_ability_target_gets_specs() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    world.add_tag(RIVAL, tag("State.Bleeding"));
    let mut source = Source::new();
    source.tags.insert(tag("Ability.Bite"));

    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(RIVAL), 40.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &bite_container(),
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );

    let spec = &specs[0];
    assert!(spec.non_ability_targets.is_empty());
    assert_eq!(spec.target_data.target_actors().collect::<Vec<_>>(), vec![RIVAL]);
    assert_eq!(spec.specs.len(), 1);
    assert_eq!(spec.event_magnitude, 40.0);
    assert_eq!(spec.source, Some(OWNER));

    let effect = &spec.specs[0];
    assert_eq!(effect.class, BITE_DAMAGE);
    assert_eq!(effect.context.instigator, Some(OWNER));
    assert_eq!(effect.context.causer, Some(OWNER));
    assert_eq!(effect.context.event_magnitude, 40.0);
    assert!(effect.captured_target_tags.has_tag(&tag("State.Bleeding")));
    assert!(effect.dynamic_tags.has_tag_exact(&tag("Ability.Bite")));
}

/// Effect entries gated on owner tags are skipped while the owner lacks them.
#[test]
fn test_source_requirements_gate_effects() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    let source = Source::new();

    let container = EffectContainer::new("Bite").with_entry(
        ContainerEntry::new(TargetStrategy::UseEventData)
            .with_effects(EffectEntry::new([BITE_DAMAGE]))
            .with_effects(
                EffectEntry::new([ENRAGED_BONUS])
                    .requiring(TagRequirements::none().requiring(tag("State.Enraged"))),
            ),
    );
    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(RIVAL), 40.0);
    let builder = EffectSpecBuilder::new(&catalog, &resolver);

    let calm = builder.build_specs(
        &world,
        &source.spec_source(),
        &container,
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );
    let classes: Vec<_> = calm[0].specs.iter().map(|spec| spec.class).collect();
    assert_eq!(classes, vec![BITE_DAMAGE]);

    world.add_tag(OWNER, tag("State.Enraged"));
    let enraged = builder.build_specs(
        &world,
        &source.spec_source(),
        &container,
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );
    let classes: Vec<_> = enraged[0].specs.iter().map(|spec| spec.class).collect();
    assert_eq!(classes, vec![BITE_DAMAGE, ENRAGED_BONUS]);
}

/// Reflected damage swaps the hit bones and credits the struck actor.
#[test]
fn test_spikes_damage_is_reflected() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    world.spawn(STEGO);
    let source = Source::new();

    let container = EffectContainer::new("Spikes").with_entry(
        ContainerEntry::new(TargetStrategy::UseEventInstigator).with_effects(EffectEntry::new([BITE_DAMAGE])),
    );
    let payload = EventPayload::hit(
        tag("Event.Hit.Spikes"),
        RIVAL,
        HitResult::on_actor(STEGO).with_bones("Head", "Root"),
        12.0,
    )
    .with_context(EffectContext::new().with_damage_type(DamageType::Spikes));

    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &container,
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );

    assert_eq!(specs[0].target_data.target_actors().collect::<Vec<_>>(), vec![RIVAL]);
    let context = &specs[0].specs[0].context;
    assert_eq!(context.instigator, Some(STEGO));
    assert_eq!(context.causer, Some(STEGO));
    let hit = context.hit_result.as_ref().unwrap();
    assert_eq!(hit.bone_name.as_deref(), Some("Root"));
    assert_eq!(hit.my_bone_name.as_deref(), Some("Head"));
}

/// Call-site magnitudes override ability defaults; other keys survive.
#[test]
fn test_set_by_caller_merge() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let world = world();
    let mut source = Source::new();
    source.set_by_caller.insert(tag("Magnitude.Damage"), 10.0);
    source.set_by_caller.insert(tag("Magnitude.Knockback"), 2.0);

    let mut caller = SetByCallerMagnitudes::default();
    caller.insert(tag("Magnitude.Damage"), 30.0);

    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(RIVAL), 0.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &bite_container(),
        &payload,
        &caller,
        NO_LEVEL_OVERRIDE,
    );

    let effect = &specs[0].specs[0];
    assert_eq!(effect.magnitude(&tag("Magnitude.Damage")), Some(30.0));
    assert_eq!(effect.magnitude(&tag("Magnitude.Knockback")), Some(2.0));
}

/// Levels come from the override, else the ability, else the owner's growth.
#[test]
fn test_spec_level_resolution() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    world.set_attribute(OWNER, Attribute::Growth, 0.6);
    let mut source = Source::new();
    source.level = LevelPolicy::growth_scaled();

    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(RIVAL), 0.0);
    let builder = EffectSpecBuilder::new(&catalog, &resolver);
    let build = |override_level| {
        builder.build_specs(
            &world,
            &source.spec_source(),
            &bite_container(),
            &payload,
            &SetByCallerMagnitudes::default(),
            override_level,
        )
    };

    assert_eq!(build(NO_LEVEL_OVERRIDE)[0].specs[0].level, 3);
    assert_eq!(build(8)[0].specs[0].level, 8);
}

/// The instigator's movement speed is snapshot into the context.
#[test]
fn test_movement_speed_snapshot() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    world.set_attribute(OWNER, Attribute::MovementSpeed, 450.0);
    let source = Source::new();

    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(RIVAL), 0.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &bite_container(),
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );
    world.set_attribute(OWNER, Attribute::MovementSpeed, 0.0);

    assert_eq!(specs[0].specs[0].context.movement_speed, 450.0);
}

/// Custom strategies can mix ability and non-ability targets.
#[test]
fn test_custom_strategy_splits_targets() {
    let catalog = catalog();
    let mut resolver = TargetResolver::new();
    resolver.register_custom("Stomp", |_, _| {
        let mut targets = TargetData::actor(RIVAL);
        targets.append(TargetData::actor(BOULDER));
        targets
    });
    let mut world = world();
    let source = Source::new();

    let container = EffectContainer::new("Stomp").with_entry(
        ContainerEntry::new(TargetStrategy::Custom("Stomp".into())).with_effects(EffectEntry::new([BITE_DAMAGE, SLOW])),
    );
    let payload = EventPayload::new(tag("Event.Montage.Stomp")).with_magnitude(15.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &container,
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );

    let spec = &specs[0];
    assert_eq!(spec.target_data.target_actors().collect::<Vec<_>>(), vec![RIVAL]);
    assert_eq!(spec.non_ability_targets.len(), 1);
    assert_eq!(spec.specs.len(), 2);

    let handles = EffectApplicationDispatcher::apply(spec, NetAuthority::Authority, &mut world);
    assert_eq!(handles.len(), 1, "only the slow is tracked");
    assert_eq!(world.applied_count(), 2);
    assert_eq!(world.health(BOULDER), Some(85.0));
}

/// Simulated proxies only run instant specs through local execution.
#[test]
fn test_simulated_authority_executes_instants_only() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    let source = Source::new();

    let container = EffectContainer::new("Bite").with_entry(
        ContainerEntry::new(TargetStrategy::UseEventData).with_effects(EffectEntry::new([BITE_DAMAGE, SLOW])),
    );
    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(RIVAL), 20.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &container,
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );

    let handles = EffectApplicationDispatcher::apply_all(&specs, NetAuthority::Simulated, &mut world);

    assert!(handles.is_empty());
    assert_eq!(world.applied_count(), 0);
    assert_eq!(world.executed().len(), 1);
    assert_eq!(world.executed()[0].0.class, BITE_DAMAGE);
    assert_eq!(world.executed()[0].1, RIVAL);
}

/// A failing cue is logged and the rest of the application goes ahead.
#[test]
fn test_failed_cue_does_not_abort_application() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    world.fail_cue(tag("GameplayCue.Blood"));
    let source = Source::new();

    let payload = EventPayload::hit(tag("Event.Montage.Bite"), OWNER, hit_on(BOULDER), 25.0);
    let specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &bite_container(),
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );
    EffectApplicationDispatcher::apply_all(&specs, NetAuthority::Authority, &mut world);

    assert_eq!(world.health(BOULDER), Some(75.0));
    assert_eq!(world.cues().len(), 1);
    assert_eq!(world.cues()[0].tag, tag("GameplayCue.Hit.Bite"));
}

/// Entries without a strategy build specs with no targets; targets can be
/// added afterwards.
#[test]
fn test_external_targets() {
    let (catalog, resolver) = (catalog(), TargetResolver::new());
    let mut world = world();
    let source = Source::new();

    let container =
        EffectContainer::new("Roar").with_entry(ContainerEntry::external().with_effects(EffectEntry::new([SLOW])));
    let payload = EventPayload::new(tag("Event.Montage.Roar"));
    let mut specs = EffectSpecBuilder::new(&catalog, &resolver).build_specs(
        &world,
        &source.spec_source(),
        &container,
        &payload,
        &SetByCallerMagnitudes::default(),
        NO_LEVEL_OVERRIDE,
    );
    assert!(specs[0].target_data.is_empty());
    assert_eq!(specs[0].specs.len(), 1);

    specs[0].add_targets(TargetData::actor(RIVAL));
    let handles = EffectApplicationDispatcher::apply_all(&specs, NetAuthority::Authority, &mut world);

    assert_eq!(handles.len(), 1);
    assert!(world.has_effect(handles[0]));
}

/// Registries resolve event tags to the closest registered parent.
#[test]
fn test_registry_hierarchical_lookup() {
    let mut registry = EffectContainerRegistry::new();
    let shared = registry.register(tag("Event.Hit"), bite_container());
    registry.register_shared(tag("Event.Montage.Bite"), shared);
    registry.register(tag("Event.Hit.Tail"), EffectContainer::new("Tail"));

    assert_eq!(registry.find(&tag("Event.Hit.Bite.Crit")).map(|c| c.name.as_str()), Some("Bite"));
    assert_eq!(registry.find(&tag("Event.Hit.Tail.Sweep")).map(|c| c.name.as_str()), Some("Tail"));
    assert_eq!(registry.find(&tag("Event.Montage.Bite")).map(|c| c.name.as_str()), Some("Bite"));
    assert!(registry.find(&tag("Event.Montage")).is_none());
}
