//! Per-actor ability instances.
//!
//! An `Ability` composes the authored definition with the runtime state one
//! actor needs to run it: an activation key, the charge controller of
//! charged abilities, and the periodic timer of periodic abilities. The
//! cooldown ledger is owned by the actor's [`AbilitySystem`](super::AbilitySystem)
//! and lent to the ability through [`AbilityContext`].
//!
//! ## Activation keys
//!
//! Every activation increments the instance's [`ActivationKey`]. Scheduled
//! timer events and montage-end notifications carry the key they were issued
//! under; a mismatched key belongs to a superseded activation and is
//! dropped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{ActorId, Seconds};
use crate::effects::{
    EffectApplicationDispatcher, EffectCatalog, EffectContainerRegistry, EffectSpecBuilder, EventPayload,
    SetByCallerMagnitudes, SpecSource, TargetResolver, NO_LEVEL_OVERRIDE,
};
use crate::host::{AbilityHost, EffectHandle, TimerEvent, TimerHandle, TimerHost};

use super::charge::{ChargeController, ChargeRelease, PressOutcome};
use super::cooldown::{CommitOutcome, CooldownLedger};
use super::definition::{AbilityClassId, AbilityDefinition, AbilityKind};
use super::prediction::NetAuthority;

/// Per-instance activation generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivationKey(pub u32);

impl ActivationKey {
    /// Create a key.
    #[must_use]
    pub const fn new(key: u32) -> Self {
        Self(key)
    }

    /// Get the raw key value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The key of the following activation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for ActivationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

/// Why an activation was refused.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ActivationError {
    #[error("{0} is not granted")]
    NotGranted(AbilityClassId),

    #[error("{0} is already active")]
    AlreadyActive(AbilityClassId),

    #[error("{ability} is on cooldown for {remaining}s")]
    OnCooldown { ability: AbilityClassId, remaining: Seconds },

    #[error("{0} activation tags not met")]
    TagsNotMet(AbilityClassId),

    #[error("{ability} blocked by active {active}")]
    Exclusive { ability: AbilityClassId, active: AbilityClassId },
}

/// Everything an ability touches while it runs.
pub struct AbilityContext<'a> {
    pub owner: ActorId,
    pub now: Seconds,
    pub authority: NetAuthority,
    pub host: &'a mut dyn AbilityHost,
    pub timers: &'a mut dyn TimerHost,
    pub ledger: &'a mut CooldownLedger,
    pub catalog: &'a EffectCatalog,
    pub resolver: &'a TargetResolver,
}

/// The lifecycle every ability variant implements.
pub trait AbilityCapability {
    /// Check activation preconditions against the owner's current state.
    fn can_activate(&self, ctx: &AbilityContext<'_>) -> Result<(), ActivationError>;

    /// Start a new activation and return its key.
    fn activate(&mut self, ctx: &mut AbilityContext<'_>) -> ActivationKey;

    /// Abort the current activation. Returns false if nothing was active.
    fn cancel(&mut self, ctx: &mut AbilityContext<'_>) -> bool;

    /// Finish the current activation. Returns false if nothing was active.
    fn end(&mut self, ctx: &mut AbilityContext<'_>) -> bool;
}

/// One ability granted to one actor.
#[derive(Clone, Debug)]
pub struct Ability {
    definition: Arc<AbilityDefinition>,
    containers: Arc<EffectContainerRegistry>,
    key: ActivationKey,
    active: bool,
    charge: Option<ChargeController>,
    release: Option<ChargeRelease>,
    periodic_timer: Option<TimerHandle>,
}

impl Ability {
    /// Create an inactive instance.
    #[must_use]
    pub fn new(definition: Arc<AbilityDefinition>, containers: Arc<EffectContainerRegistry>) -> Self {
        let charge = definition.charge_config().cloned().map(ChargeController::new);
        Self {
            definition,
            containers,
            key: ActivationKey::default(),
            active: false,
            charge,
            release: None,
            periodic_timer: None,
        }
    }

    #[must_use]
    pub fn class(&self) -> AbilityClassId {
        self.definition.id
    }

    #[must_use]
    pub fn definition(&self) -> &AbilityDefinition {
        &self.definition
    }

    #[must_use]
    pub fn containers(&self) -> &EffectContainerRegistry {
        &self.containers
    }

    /// Key of the current (or most recent) activation.
    #[must_use]
    pub fn key(&self) -> ActivationKey {
        self.key
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn charge(&self) -> Option<&ChargeController> {
        self.charge.as_ref()
    }

    /// The release of the current activation, once charging finished.
    #[must_use]
    pub fn charge_release(&self) -> Option<ChargeRelease> {
        self.release
    }

    /// True while active and not waiting on a charge.
    #[must_use]
    pub fn is_firing(&self) -> bool {
        self.active && (self.charge.is_none() || self.release.is_some())
    }

    /// Input pressed while already active. Re-pressing a charge is a no-op.
    pub fn input_pressed(&mut self, ctx: &mut AbilityContext<'_>) {
        if !self.active {
            return;
        }
        let event = TimerEvent::AutoRelease {
            ability: self.class(),
            key: self.key,
        };
        let outcome = match self.charge.as_mut() {
            Some(charge) if self.release.is_none() => charge.press(ctx.now, Some(event), &mut *ctx.timers),
            _ => return,
        };
        if let PressOutcome::ReleasedImmediately(release) = outcome {
            self.on_released(ctx, release);
        }
    }

    /// Input released. Finishes charging for charged abilities.
    pub fn input_released(&mut self, ctx: &mut AbilityContext<'_>) -> Option<ChargeRelease> {
        if !self.active {
            return None;
        }
        let release = self.charge.as_mut()?.release(ctx.now, &mut *ctx.timers)?;
        self.on_released(ctx, release);
        Some(release)
    }

    /// Route a fired timer event. Events from other activations are dropped.
    pub fn handle_timer(&mut self, ctx: &mut AbilityContext<'_>, event: &TimerEvent) -> Vec<EffectHandle> {
        match *event {
            TimerEvent::AutoRelease { key, .. } => {
                if !self.is_current(key) {
                    tracing::trace!(ability = %self.class(), %key, "stale auto-release");
                    return Vec::new();
                }
                if let Some(release) = self.charge.as_mut().and_then(|charge| charge.auto_release(ctx.now)) {
                    self.on_released(ctx, release);
                }
                Vec::new()
            }
            TimerEvent::PeriodicTick { key, .. } => {
                if !self.is_current(key) {
                    tracing::trace!(ability = %self.class(), %key, "stale periodic tick");
                    return Vec::new();
                }
                let definition = Arc::clone(&self.definition);
                match &definition.kind {
                    AbilityKind::Periodic { event: tick, .. } => {
                        let payload = EventPayload::new(tick.clone()).with_instigator(ctx.owner);
                        self.apply_event(ctx, &payload)
                    }
                    _ => Vec::new(),
                }
            }
            TimerEvent::CooldownDelayExpired { ability } => {
                ctx.ledger.handle_delay_expired(ability, ctx.now);
                Vec::new()
            }
        }
    }

    /// The montage of activation `key` finished. Ends the ability if the key
    /// is current.
    pub fn montage_ended(&mut self, ctx: &mut AbilityContext<'_>, key: ActivationKey) -> bool {
        if !self.is_current(key) {
            tracing::trace!(ability = %self.class(), %key, current = %self.key, "stale montage end");
            return false;
        }
        self.end(ctx)
    }

    /// Build and apply the container this ability maps to `payload`'s tag.
    ///
    /// Charged abilities apply nothing until released.
    pub fn apply_event(&mut self, ctx: &mut AbilityContext<'_>, payload: &EventPayload) -> Vec<EffectHandle> {
        if !self.is_firing() {
            return Vec::new();
        }
        let Some(container) = self.containers.find(&payload.event_tag) else {
            tracing::debug!(ability = %self.class(), event = %payload.event_tag, "no container for event");
            return Vec::new();
        };

        let mut payload = payload.clone();
        let mut magnitudes = SetByCallerMagnitudes::default();
        if let Some(release) = self.release {
            payload.context.get_or_insert_with(Default::default).charged_duration = release.charged_duration;
            if let Some(key) = self.charge.as_ref().and_then(|charge| charge.config().multiplier_key.clone()) {
                magnitudes.insert(key, release.multiplier);
            }
        }

        let definition = &self.definition;
        let source = SpecSource {
            owner: ctx.owner,
            level: definition.level,
            set_by_caller: &definition.set_by_caller,
            ability_tags: &definition.ability_tags,
        };
        let specs = EffectSpecBuilder::new(ctx.catalog, ctx.resolver).build_specs(
            &*ctx.host,
            &source,
            container,
            &payload,
            &magnitudes,
            NO_LEVEL_OVERRIDE,
        );
        EffectApplicationDispatcher::apply_all(&specs, ctx.authority, &mut *ctx.host)
    }

    fn is_current(&self, key: ActivationKey) -> bool {
        self.active && key == self.key
    }

    fn commit_cooldown(&self, ctx: &mut AbilityContext<'_>) -> Option<CommitOutcome> {
        let cooldown = self.definition.cooldown.as_ref()?;
        Some(ctx.ledger.commit(
            self.class(),
            cooldown,
            ctx.owner,
            ctx.authority,
            ctx.now,
            &mut *ctx.host,
            &mut *ctx.timers,
        ))
    }

    fn on_released(&mut self, ctx: &mut AbilityContext<'_>, release: ChargeRelease) {
        if release.cancelled {
            tracing::debug!(ability = %self.class(), charged = release.charged_duration, "released below min charge");
            self.cancel(ctx);
            return;
        }
        self.commit_cooldown(ctx);
        self.release = Some(release);
        tracing::debug!(
            ability = %self.class(),
            charged = release.charged_duration,
            multiplier = release.multiplier,
            "charge released"
        );
    }

    fn finish(&mut self, ctx: &mut AbilityContext<'_>) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.release = None;
        if let Some(timer) = self.periodic_timer.take() {
            ctx.timers.cancel(timer);
        }
        if let Some(charge) = self.charge.as_mut() {
            charge.reset(&mut *ctx.timers);
        }
        true
    }
}

impl AbilityCapability for Ability {
    fn can_activate(&self, ctx: &AbilityContext<'_>) -> Result<(), ActivationError> {
        let class = self.class();
        if self.active {
            return Err(ActivationError::AlreadyActive(class));
        }

        // Without an ability system the cooldown cannot be read; fail open.
        if ctx.host.has_ability_system(ctx.owner) && !ctx.ledger.check_cooldown(class, ctx.now) {
            return Err(ActivationError::OnCooldown {
                ability: class,
                remaining: ctx.ledger.remaining(class, ctx.now),
            });
        }

        let requirements = &self.definition.activation_requirements;
        if !requirements.is_empty() && !requirements.requirements_met(&ctx.host.owned_tags(ctx.owner)) {
            return Err(ActivationError::TagsNotMet(class));
        }
        Ok(())
    }

    fn activate(&mut self, ctx: &mut AbilityContext<'_>) -> ActivationKey {
        self.key = self.key.next();
        self.active = true;
        self.release = None;
        tracing::debug!(actor = %ctx.owner, ability = %self.class(), key = %self.key, "ability activated");

        let definition = Arc::clone(&self.definition);
        match &definition.kind {
            AbilityKind::Instant => {
                self.commit_cooldown(ctx);
            }
            AbilityKind::Charged(_) => {
                // Cooldown commits on release.
                self.input_pressed(ctx);
            }
            AbilityKind::Periodic { interval, .. } => {
                self.commit_cooldown(ctx);
                let event = TimerEvent::PeriodicTick {
                    ability: self.class(),
                    key: self.key,
                };
                self.periodic_timer = Some(ctx.timers.schedule(*interval, true, event));
            }
        }
        self.key
    }

    fn cancel(&mut self, ctx: &mut AbilityContext<'_>) -> bool {
        let cancelled = self.finish(ctx);
        if cancelled {
            tracing::debug!(actor = %ctx.owner, ability = %self.class(), key = %self.key, "ability cancelled");
        }
        cancelled
    }

    fn end(&mut self, ctx: &mut AbilityContext<'_>) -> bool {
        let ended = self.finish(ctx);
        if ended {
            tracing::debug!(actor = %ctx.owner, ability = %self.class(), key = %self.key, "ability ended");
        }
        ended
    }
}
