//! In-memory host world.

use rustc_hash::FxHashMap;

use crate::core::{ActorId, GameplayTag, TagSet, Vec3};
use crate::effects::{EffectClassId, EffectSpec, HitResult};
use crate::host::{
    ActorTagQuery, Attribute, AttributeQuery, CueError, CueParams, CuePresentationHost, EffectApplicationHost,
    EffectHandle,
};

const STARTING_HEALTH: f32 = 100.0;

/// One simulated actor.
#[derive(Clone, Debug)]
pub struct SimActor {
    pub id: ActorId,
    pub has_ability_system: bool,
    pub alive: bool,
    pub health: f32,
    pub tags: TagSet,
    pub attributes: FxHashMap<Attribute, f32>,
}

impl SimActor {
    fn new(id: ActorId, has_ability_system: bool) -> Self {
        Self {
            id,
            has_ability_system,
            alive: true,
            health: STARTING_HEALTH,
            tags: TagSet::new(),
            attributes: FxHashMap::default(),
        }
    }
}

/// A spec the world accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedEffect {
    /// `None` for instant effects.
    pub handle: Option<EffectHandle>,
    pub target: ActorId,
    pub spec: EffectSpec,
}

/// Generic damage dealt to an actor without an ability system.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageEvent {
    pub target: ActorId,
    pub amount: f32,
    /// Set for point damage.
    pub direction: Option<Vec3>,
    pub hit: Option<HitResult>,
    pub instigator: Option<ActorId>,
}

/// A cue the world presented.
#[derive(Clone, Debug, PartialEq)]
pub struct CueEvent {
    pub tag: GameplayTag,
    pub params: CueParams,
}

/// A deterministic host that records everything the pipeline asks of it.
///
/// ## Example
///
/// ```
/// use dino_abilities::core::ActorId;
/// use dino_abilities::host::{ActorTagQuery, EffectApplicationHost};
/// use dino_abilities::sim::SimWorld;
///
/// let mut world = SimWorld::new();
/// world.spawn(ActorId(1));
/// world.spawn_without_abilities(ActorId(2));
///
/// world.apply_damage(ActorId(2), 30.0, Some(ActorId(1)));
///
/// assert!(world.has_ability_system(ActorId(1)));
/// assert!(!world.has_ability_system(ActorId(2)));
/// assert_eq!(world.health(ActorId(2)), Some(70.0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SimWorld {
    actors: FxHashMap<ActorId, SimActor>,
    next_handle: u64,
    active: Vec<AppliedEffect>,
    applied: Vec<AppliedEffect>,
    executed: Vec<(EffectSpec, ActorId)>,
    damage: Vec<DamageEvent>,
    cues: Vec<CueEvent>,
    failing_cues: TagSet,
}

impl SimWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an actor with an ability system.
    pub fn spawn(&mut self, id: ActorId) -> &mut SimActor {
        self.actors.insert(id, SimActor::new(id, true));
        self.actor_mut(id)
    }

    /// Spawn an actor that only takes generic damage (props, destructibles).
    pub fn spawn_without_abilities(&mut self, id: ActorId) -> &mut SimActor {
        self.actors.insert(id, SimActor::new(id, false));
        self.actor_mut(id)
    }

    /// Mark an actor dead. Its id stays known but no longer resolves.
    pub fn kill(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.alive = false;
        }
    }

    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&SimActor> {
        self.actors.get(&id)
    }

    fn actor_mut(&mut self, id: ActorId) -> &mut SimActor {
        self.actors
            .entry(id)
            .or_insert_with(|| SimActor::new(id, false))
    }

    pub fn add_tag(&mut self, id: ActorId, tag: GameplayTag) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.tags.insert(tag);
        }
    }

    pub fn remove_tag(&mut self, id: ActorId, tag: &GameplayTag) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.tags.remove(tag);
        }
    }

    pub fn set_attribute(&mut self, id: ActorId, attribute: Attribute, value: f32) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.attributes.insert(attribute, value);
        }
    }

    /// Make every cue under `tag` fail.
    pub fn fail_cue(&mut self, tag: GameplayTag) {
        self.failing_cues.insert(tag);
    }

    #[must_use]
    pub fn health(&self, id: ActorId) -> Option<f32> {
        self.actors.get(&id).map(|actor| actor.health)
    }

    /// True if a tracked effect is still active.
    #[must_use]
    pub fn has_effect(&self, handle: EffectHandle) -> bool {
        self.active.iter().any(|effect| effect.handle == Some(handle))
    }

    /// Tracked effects still active.
    #[must_use]
    pub fn active_effects(&self) -> &[AppliedEffect] {
        &self.active
    }

    #[must_use]
    pub fn active_effect_count(&self) -> usize {
        self.active.len()
    }

    /// Every spec applied with full semantics, in order.
    #[must_use]
    pub fn applied(&self) -> &[AppliedEffect] {
        &self.applied
    }

    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Instant specs run through the local execution path.
    #[must_use]
    pub fn executed(&self) -> &[(EffectSpec, ActorId)] {
        &self.executed
    }

    #[must_use]
    pub fn damage(&self) -> &[DamageEvent] {
        &self.damage
    }

    #[must_use]
    pub fn cues(&self) -> &[CueEvent] {
        &self.cues
    }

    fn is_live(&self, id: ActorId) -> bool {
        self.actors.get(&id).is_some_and(|actor| actor.alive)
    }

    fn record_damage(&mut self, event: DamageEvent) {
        if let Some(actor) = self.actors.get_mut(&event.target) {
            actor.health -= event.amount;
        }
        self.damage.push(event);
    }
}

impl ActorTagQuery for SimWorld {
    fn owned_tags(&self, actor: ActorId) -> TagSet {
        self.actors
            .get(&actor)
            .map(|actor| actor.tags.clone())
            .unwrap_or_default()
    }

    fn has_ability_system(&self, actor: ActorId) -> bool {
        self.actors
            .get(&actor)
            .is_some_and(|actor| actor.alive && actor.has_ability_system)
    }

    fn is_valid(&self, actor: ActorId) -> bool {
        self.is_live(actor)
    }
}

impl AttributeQuery for SimWorld {
    fn attribute(&self, actor: ActorId, attribute: Attribute) -> Option<f32> {
        self.actors.get(&actor)?.attributes.get(&attribute).copied()
    }
}

impl EffectApplicationHost for SimWorld {
    fn apply_spec(&mut self, spec: &EffectSpec, target: ActorId) -> Option<EffectHandle> {
        if !self.has_ability_system(target) {
            tracing::debug!(%target, class = %spec.class, "apply_spec on actor without ability system");
            return None;
        }

        let handle = (!spec.is_instant()).then(|| {
            self.next_handle += 1;
            EffectHandle(self.next_handle)
        });
        let applied = AppliedEffect {
            handle,
            target,
            spec: spec.duplicate(),
        };
        if handle.is_some() {
            self.active.push(applied.clone());
        }
        self.applied.push(applied);
        handle
    }

    fn execute_instant(&mut self, spec: &EffectSpec, target: ActorId) {
        self.executed.push((spec.duplicate(), target));
    }

    fn remove_effect(&mut self, handle: EffectHandle) -> bool {
        let before = self.active.len();
        self.active.retain(|effect| effect.handle != Some(handle));
        self.active.len() != before
    }

    fn remove_by_source_class(&mut self, source: ActorId, class: EffectClassId) -> usize {
        let before = self.active.len();
        self.active
            .retain(|effect| !(effect.spec.class == class && effect.spec.context.instigator == Some(source)));
        before - self.active.len()
    }

    fn apply_point_damage(
        &mut self,
        target: ActorId,
        amount: f32,
        direction: Vec3,
        hit: &HitResult,
        instigator: Option<ActorId>,
    ) {
        self.record_damage(DamageEvent {
            target,
            amount,
            direction: Some(direction),
            hit: Some(hit.clone()),
            instigator,
        });
    }

    fn apply_damage(&mut self, target: ActorId, amount: f32, instigator: Option<ActorId>) {
        self.record_damage(DamageEvent {
            target,
            amount,
            direction: None,
            hit: None,
            instigator,
        });
    }
}

impl CuePresentationHost for SimWorld {
    fn fire_cue(&mut self, tag: &GameplayTag, params: &CueParams) -> Result<(), CueError> {
        if self.failing_cues.has_tag(tag) {
            return Err(CueError::Failed {
                tag: tag.clone(),
                reason: "presentation unavailable".into(),
            });
        }
        self.cues.push(CueEvent {
            tag: tag.clone(),
            params: params.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectContext, EffectDuration, SetByCallerMagnitudes};

    fn spec(class: u32, duration: EffectDuration, source: ActorId) -> EffectSpec {
        EffectSpec {
            class: EffectClassId::new(class),
            level: 1,
            duration,
            context: EffectContext::new().with_instigator(source, source),
            set_by_caller: SetByCallerMagnitudes::default(),
            dynamic_tags: TagSet::new(),
            captured_target_tags: TagSet::new(),
        }
    }

    #[test]
    fn test_instant_effects_are_not_tracked() {
        let mut world = SimWorld::new();
        world.spawn(ActorId(1));

        assert_eq!(world.apply_spec(&spec(1, EffectDuration::Instant, ActorId(1)), ActorId(1)), None);
        assert_eq!(world.applied_count(), 1);
        assert_eq!(world.active_effect_count(), 0);
    }

    #[test]
    fn test_remove_by_source_class() {
        let mut world = SimWorld::new();
        world.spawn(ActorId(1));
        world.spawn(ActorId(2));

        world.apply_spec(&spec(5, EffectDuration::Infinite, ActorId(1)), ActorId(2));
        world.apply_spec(&spec(5, EffectDuration::Infinite, ActorId(2)), ActorId(2));
        world.apply_spec(&spec(6, EffectDuration::Duration(3.0), ActorId(1)), ActorId(2));

        assert_eq!(world.remove_by_source_class(ActorId(1), EffectClassId::new(5)), 1);
        assert_eq!(world.active_effect_count(), 2);
    }

    #[test]
    fn test_dead_actors_do_not_resolve() {
        let mut world = SimWorld::new();
        world.spawn(ActorId(1));
        world.kill(ActorId(1));

        assert!(!world.is_valid(ActorId(1)));
        assert!(!world.has_ability_system(ActorId(1)));
        assert!(!world.is_valid(ActorId(42)));
    }

    #[test]
    fn test_failing_cue() {
        let mut world = SimWorld::new();
        let cue: GameplayTag = "GameplayCue.Hit".parse().unwrap();
        world.fail_cue(cue.clone());

        assert!(world.fire_cue(&cue, &CueParams::default()).is_err());
        assert!(world.cues().is_empty());
    }
}
