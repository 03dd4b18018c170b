//! Per-actor ability system.
//!
//! The `AbilitySystem` owns one actor's abilities, its cooldown ledger and
//! the list of running non-exclusive abilities. The host drives it from its
//! simulation tick:
//!
//! - input press / release
//! - gameplay events (montage notifies, hits, reactions)
//! - fired timer events
//! - montage-end notifications, matched by activation key
//!
//! Each call takes a [`HostFrame`] with the current time, network authority
//! and the host services for that call.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::core::{ActorId, Seconds};
use crate::effects::{EffectCatalog, EffectClassId, EffectContainerRegistry, EventPayload, TargetResolver};
use crate::host::{AbilityHost, ActorTagQuery, EffectHandle, TimerEvent, TimerHost};

use super::cooldown::{CooldownError, CooldownLedger};
use super::definition::{AbilityClassId, AbilityDefinition, AbilityKind};
use super::instance::{Ability, AbilityCapability, AbilityContext, ActivationError, ActivationKey};
use super::prediction::NetAuthority;

/// Host state lent to one ability-system call.
pub struct HostFrame<'a> {
    pub now: Seconds,
    pub authority: NetAuthority,
    pub host: &'a mut dyn AbilityHost,
    pub timers: &'a mut dyn TimerHost,
}

impl<'a> HostFrame<'a> {
    /// Create a frame.
    pub fn new(now: Seconds, authority: NetAuthority, host: &'a mut dyn AbilityHost, timers: &'a mut dyn TimerHost) -> Self {
        Self {
            now,
            authority,
            host,
            timers,
        }
    }
}

/// One actor's abilities.
#[derive(Debug)]
pub struct AbilitySystem {
    owner: ActorId,
    abilities: Vec<Ability>,
    ledger: CooldownLedger,
    catalog: Arc<EffectCatalog>,
    resolver: Arc<TargetResolver>,
    exclusive: Option<AbilityClassId>,
    non_exclusive: SmallVec<[AbilityClassId; 4]>,
}

impl AbilitySystem {
    /// Create an ability system with no abilities.
    #[must_use]
    pub fn new(owner: ActorId, catalog: Arc<EffectCatalog>, resolver: Arc<TargetResolver>) -> Self {
        Self {
            owner,
            abilities: Vec::new(),
            ledger: CooldownLedger::new(),
            catalog,
            resolver,
            exclusive: None,
            non_exclusive: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Grant an ability, replacing an inactive ability of the same class.
    ///
    /// Returns false if an ability of that class is currently active.
    pub fn grant(&mut self, definition: impl Into<Arc<AbilityDefinition>>, containers: Arc<EffectContainerRegistry>) -> bool {
        let ability = Ability::new(definition.into(), containers);
        let class = ability.class();
        match self.abilities.iter_mut().find(|existing| existing.class() == class) {
            Some(existing) if existing.is_active() => false,
            Some(existing) => {
                *existing = ability;
                true
            }
            None => {
                tracing::debug!(actor = %self.owner, ability = %class, "ability granted");
                self.abilities.push(ability);
                true
            }
        }
    }

    #[must_use]
    pub fn ability(&self, class: AbilityClassId) -> Option<&Ability> {
        self.abilities.iter().find(|ability| ability.class() == class)
    }

    pub fn abilities(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.iter()
    }

    #[must_use]
    pub fn is_active(&self, class: AbilityClassId) -> bool {
        self.ability(class).is_some_and(Ability::is_active)
    }

    /// The running exclusive ability.
    #[must_use]
    pub fn exclusive_active(&self) -> Option<AbilityClassId> {
        self.exclusive
    }

    /// Running non-exclusive abilities, in activation order.
    #[must_use]
    pub fn non_exclusive_active(&self) -> &[AbilityClassId] {
        &self.non_exclusive
    }

    #[must_use]
    pub fn ledger(&self) -> &CooldownLedger {
        &self.ledger
    }

    /// True iff `class` is off cooldown. An owner without an ability system
    /// on the host always passes.
    #[must_use]
    pub fn check_cooldown<H>(&self, class: AbilityClassId, now: Seconds, host: &H) -> bool
    where
        H: ActorTagQuery + ?Sized,
    {
        !host.has_ability_system(self.owner) || self.ledger.check_cooldown(class, now)
    }

    /// Seconds until `class` is off cooldown.
    #[must_use]
    pub fn cooldown_remaining(&self, class: AbilityClassId, now: Seconds) -> Seconds {
        self.ledger.remaining(class, now)
    }

    /// Activate an ability.
    pub fn try_activate(&mut self, class: AbilityClassId, frame: &mut HostFrame<'_>) -> Result<ActivationKey, ActivationError> {
        if let Some(active) = self.exclusive.filter(|active| *active != class) {
            let blocked = self
                .ability(class)
                .is_some_and(|ability| !ability.definition().non_exclusive);
            if blocked {
                return Err(ActivationError::Exclusive { ability: class, active });
            }
        }

        let result = self.with_ability(class, frame, |ability, ctx| -> Result<ActivationKey, ActivationError> {
            ability.can_activate(ctx)?;
            Ok(ability.activate(ctx))
        });
        let key = result.ok_or(ActivationError::NotGranted(class))??;

        self.sync_active(class);
        Ok(key)
    }

    /// Input bound to `class` was pressed.
    ///
    /// Activates the ability, or forwards the press to a running one (a
    /// repeated press of a charging ability is ignored).
    pub fn press_input(&mut self, class: AbilityClassId, frame: &mut HostFrame<'_>) -> Result<ActivationKey, ActivationError> {
        if self.is_active(class) {
            let key = self.with_ability(class, frame, |ability, ctx| {
                ability.input_pressed(ctx);
                ability.key()
            });
            self.sync_active(class);
            return key.ok_or(ActivationError::NotGranted(class));
        }
        self.try_activate(class, frame)
    }

    /// Input bound to `class` was released.
    ///
    /// Returns true if a charge was released (or cancelled by releasing too
    /// early).
    pub fn release_input(&mut self, class: AbilityClassId, frame: &mut HostFrame<'_>) -> bool {
        let released = self
            .with_ability(class, frame, |ability, ctx| ability.input_released(ctx).is_some())
            .unwrap_or(false);
        self.sync_active(class);
        released
    }

    /// Route a gameplay event.
    ///
    /// Firing abilities with a container for the event apply it. If none
    /// does, abilities triggered by the event are activated and apply it
    /// themselves; instant ones end right away.
    pub fn handle_gameplay_event(&mut self, payload: &EventPayload, frame: &mut HostFrame<'_>) -> Vec<EffectHandle> {
        let firing: Vec<AbilityClassId> = self
            .abilities
            .iter()
            .filter(|ability| ability.is_firing() && ability.containers().find(&payload.event_tag).is_some())
            .map(Ability::class)
            .collect();

        if !firing.is_empty() {
            return firing
                .into_iter()
                .flat_map(|class| {
                    self.with_ability(class, frame, |ability, ctx| ability.apply_event(ctx, payload))
                        .unwrap_or_default()
                })
                .collect();
        }

        let triggered: Vec<AbilityClassId> = self
            .abilities
            .iter()
            .filter(|ability| {
                ability
                    .definition()
                    .trigger
                    .as_ref()
                    .is_some_and(|trigger| payload.event_tag.matches(trigger))
            })
            .map(Ability::class)
            .collect();

        let mut handles = Vec::new();
        for class in triggered {
            if let Err(error) = self.try_activate(class, frame) {
                tracing::debug!(actor = %self.owner, ability = %class, %error, "triggered activation refused");
                continue;
            }
            let applied = self.with_ability(class, frame, |ability, ctx| {
                let applied = ability.apply_event(ctx, payload);
                if ability.definition().kind == AbilityKind::Instant {
                    ability.end(ctx);
                }
                applied
            });
            handles.extend(applied.unwrap_or_default());
            self.sync_active(class);
        }
        handles
    }

    /// Route a fired timer event to its ability.
    pub fn handle_timer_event(&mut self, event: &TimerEvent, frame: &mut HostFrame<'_>) -> Vec<EffectHandle> {
        let class = event.ability();
        let handles = match self.with_ability(class, frame, |ability, ctx| ability.handle_timer(ctx, event)) {
            Some(handles) => handles,
            None => {
                // Revoked abilities still own their cooldown bookkeeping.
                if let TimerEvent::CooldownDelayExpired { ability } = event {
                    self.ledger.handle_delay_expired(*ability, frame.now);
                }
                Vec::new()
            }
        };
        self.sync_active(class);
        handles
    }

    /// The montage started by activation `key` of `class` ended.
    pub fn montage_ended(&mut self, class: AbilityClassId, key: ActivationKey, frame: &mut HostFrame<'_>) -> bool {
        let ended = self
            .with_ability(class, frame, |ability, ctx| ability.montage_ended(ctx, key))
            .unwrap_or(false);
        self.sync_active(class);
        ended
    }

    /// End a running ability. Ending an inactive ability does nothing.
    pub fn end(&mut self, class: AbilityClassId, frame: &mut HostFrame<'_>) -> bool {
        let ended = self
            .with_ability(class, frame, |ability, ctx| ability.end(ctx))
            .unwrap_or(false);
        self.sync_active(class);
        ended
    }

    /// Cancel a running ability.
    pub fn cancel(&mut self, class: AbilityClassId, frame: &mut HostFrame<'_>) -> bool {
        let cancelled = self
            .with_ability(class, frame, |ability, ctx| ability.cancel(ctx))
            .unwrap_or(false);
        self.sync_active(class);
        cancelled
    }

    /// Cancel every running ability. Returns how many were cancelled.
    pub fn cancel_all(&mut self, frame: &mut HostFrame<'_>) -> usize {
        let running: Vec<AbilityClassId> = self
            .abilities
            .iter()
            .filter(|ability| ability.is_active())
            .map(Ability::class)
            .collect();
        running
            .into_iter()
            .filter(|class| self.cancel(*class, frame))
            .count()
    }

    /// The authoritative cooldown for `class` replicated to this client.
    pub fn observe_replicated_cooldown(
        &mut self,
        class: AbilityClassId,
        effect: EffectClassId,
        handle: EffectHandle,
        end_time: Seconds,
        frame: &mut HostFrame<'_>,
    ) {
        self.ledger
            .observe_replicated(class, effect, handle, end_time, &mut *frame.host, &mut *frame.timers);
    }

    /// The host removed an effect.
    pub fn on_effect_removed(&mut self, handle: EffectHandle) -> Option<AbilityClassId> {
        self.ledger.on_effect_removed(handle)
    }

    /// Remove every cooldown. Authority only.
    pub fn reset_all_cooldowns(&mut self, frame: &mut HostFrame<'_>) -> Result<usize, CooldownError> {
        self.ledger
            .reset_all_cooldowns(frame.authority, &mut *frame.host, &mut *frame.timers)
    }

    /// Remove every cooldown and its pending timers.
    pub fn remove_all_cooldowns(&mut self, frame: &mut HostFrame<'_>) -> usize {
        self.ledger
            .remove_all_cooldowns(&mut *frame.host, &mut *frame.timers)
    }

    fn with_ability<R>(
        &mut self,
        class: AbilityClassId,
        frame: &mut HostFrame<'_>,
        run: impl FnOnce(&mut Ability, &mut AbilityContext<'_>) -> R,
    ) -> Option<R> {
        let Some(ability) = self.abilities.iter_mut().find(|ability| ability.class() == class) else {
            tracing::warn!(actor = %self.owner, ability = %class, "ability not granted");
            return None;
        };
        let mut ctx = AbilityContext {
            owner: self.owner,
            now: frame.now,
            authority: frame.authority,
            host: &mut *frame.host,
            timers: &mut *frame.timers,
            ledger: &mut self.ledger,
            catalog: &self.catalog,
            resolver: &self.resolver,
        };
        Some(run(ability, &mut ctx))
    }

    /// Bring the active lists in line with the ability's state. Removing an
    /// ability that is not listed does nothing, so ending twice is safe.
    fn sync_active(&mut self, class: AbilityClassId) {
        let Some(ability) = self.ability(class) else {
            return;
        };
        let active = ability.is_active();
        let non_exclusive = ability.definition().non_exclusive;

        if non_exclusive {
            let listed = self.non_exclusive.contains(&class);
            if active && !listed {
                self.non_exclusive.push(class);
            } else if !active && listed {
                self.non_exclusive.retain(|listed| *listed != class);
            }
        } else if active {
            self.exclusive = Some(class);
        } else if self.exclusive == Some(class) {
            self.exclusive = None;
        }
    }
}
