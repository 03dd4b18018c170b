//! Cooldown bookkeeping with prediction reconciliation.
//!
//! The `CooldownLedger` tracks, per ability class, either:
//! - a **tracked** cooldown: a cooldown effect applied on the host, with the
//!   handle and end time, or
//! - a **delay** entry: client-side bookkeeping registered when the client
//!   may not predict the cooldown effect. It keeps the ability reporting
//!   "on cooldown" until the authoritative effect replicates.
//!
//! At most one tracked cooldown exists per class. Observing the replicated
//! cooldown clears the delay entry and cancels its timer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{ActorId, Seconds, TagSet};
use crate::effects::{EffectClassId, EffectContext, EffectDuration, EffectSpec, SetByCallerMagnitudes};
use crate::host::{ActorTagQuery, EffectApplicationHost, EffectHandle, TimerEvent, TimerHandle, TimerHost};

use super::definition::{AbilityClassId, CooldownConfig};
use super::prediction::NetAuthority;

/// Cooldown errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CooldownError {
    /// Only the authority may reset cooldowns.
    #[error("cooldown reset requires authority")]
    NotAuthoritative,
}

/// A cooldown effect live on the host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedCooldown {
    pub handle: EffectHandle,
    pub effect: EffectClassId,
    pub end_time: Seconds,
}

/// Client-side placeholder for a cooldown that could not be predicted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayEntry {
    pub effect: EffectClassId,
    pub duration: Seconds,
    pub started: Seconds,
    pub timer: Option<TimerHandle>,
}

impl DelayEntry {
    #[must_use]
    pub fn end_time(&self) -> Seconds {
        self.started + self.duration
    }
}

/// Cooldown state of one ability class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub tracked: Option<TrackedCooldown>,
    pub delay: Option<DelayEntry>,
}

impl CooldownRecord {
    /// Seconds until the cooldown ends, never negative.
    ///
    /// With both a tracked cooldown and a delay entry the later end wins.
    #[must_use]
    pub fn remaining(&self, now: Seconds) -> Seconds {
        let end = match (self.tracked, self.delay) {
            (Some(tracked), Some(delay)) => tracked.end_time.max(delay.end_time()),
            (Some(tracked), None) => tracked.end_time,
            (None, Some(delay)) => delay.end_time(),
            (None, None) => return 0.0,
        };
        (end - now).max(0.0)
    }

    fn is_empty(&self) -> bool {
        self.tracked.is_none() && self.delay.is_none()
    }
}

/// How a commit was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Applied on the authority.
    Authoritative(EffectHandle),
    /// Applied by a predicting client.
    Predicted(EffectHandle),
    /// Could not predict; a local delay entry stands in.
    Delayed,
    /// The actor has no ability system; nothing was committed.
    Skipped,
}

impl CommitOutcome {
    /// The cooldown effect handle, if one was created.
    #[must_use]
    pub fn handle(self) -> Option<EffectHandle> {
        match self {
            Self::Authoritative(handle) | Self::Predicted(handle) => Some(handle),
            Self::Delayed | Self::Skipped => None,
        }
    }
}

/// Per-actor cooldown ledger.
#[derive(Clone, Debug, Default)]
pub struct CooldownLedger {
    records: FxHashMap<AbilityClassId, CooldownRecord>,
}

impl CooldownLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cooldown state for a class.
    #[must_use]
    pub fn record(&self, class: AbilityClassId) -> Option<&CooldownRecord> {
        self.records.get(&class)
    }

    /// Number of classes with any cooldown state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Commit the cooldown of `class` for `owner`.
    ///
    /// With authority or a valid prediction key the cooldown effect is
    /// applied and tracked, replacing any earlier tracked cooldown of the
    /// class. Otherwise a delay entry with the nominal duration is registered
    /// and an expiry timer scheduled.
    #[allow(clippy::too_many_arguments)]
    pub fn commit<H, T>(
        &mut self,
        class: AbilityClassId,
        cooldown: &CooldownConfig,
        owner: ActorId,
        authority: NetAuthority,
        now: Seconds,
        host: &mut H,
        timers: &mut T,
    ) -> CommitOutcome
    where
        H: ActorTagQuery + EffectApplicationHost + ?Sized,
        T: TimerHost + ?Sized,
    {
        if !host.has_ability_system(owner) {
            tracing::warn!(actor = %owner, ability = %class, "no ability system, skipping cooldown commit");
            return CommitOutcome::Skipped;
        }

        if authority.can_apply_tracked() {
            let spec = cooldown_spec(cooldown, owner);
            match host.apply_spec(&spec, owner) {
                Some(handle) => {
                    self.track(class, cooldown.effect, handle, now + cooldown.duration, host, timers);
                    tracing::debug!(actor = %owner, ability = %class, %handle, "cooldown committed");
                    return if authority.is_authority() {
                        CommitOutcome::Authoritative(handle)
                    } else {
                        CommitOutcome::Predicted(handle)
                    };
                }
                None => {
                    tracing::warn!(actor = %owner, ability = %class, "host did not track cooldown effect, using delay entry");
                }
            }
        }

        let record = self.records.entry(class).or_default();
        if record.tracked.is_some_and(|tracked| tracked.end_time <= now) {
            record.tracked = None;
        }
        if let Some(timer) = record.delay.and_then(|delay| delay.timer) {
            timers.cancel(timer);
        }
        let timer = timers.schedule(
            cooldown.duration,
            false,
            TimerEvent::CooldownDelayExpired { ability: class },
        );
        record.delay = Some(DelayEntry {
            effect: cooldown.effect,
            duration: cooldown.duration,
            started: now,
            timer: Some(timer),
        });
        tracing::debug!(actor = %owner, ability = %class, duration = cooldown.duration, "cooldown delayed");
        CommitOutcome::Delayed
    }

    /// The authoritative cooldown for `class` has replicated.
    ///
    /// Tracks it in place of any predicted cooldown, whose effect is removed
    /// from the host, and drops any delay entry so the cooldown is not
    /// counted twice.
    pub fn observe_replicated<H, T>(
        &mut self,
        class: AbilityClassId,
        effect: EffectClassId,
        handle: EffectHandle,
        end_time: Seconds,
        host: &mut H,
        timers: &mut T,
    ) where
        H: EffectApplicationHost + ?Sized,
        T: TimerHost + ?Sized,
    {
        self.track(class, effect, handle, end_time, host, timers);
        tracing::debug!(ability = %class, %handle, "replicated cooldown observed");
    }

    /// Seconds until `class` is off cooldown, never negative.
    #[must_use]
    pub fn remaining(&self, class: AbilityClassId, now: Seconds) -> Seconds {
        self.records
            .get(&class)
            .map_or(0.0, |record| record.remaining(now))
    }

    /// True iff `class` is off cooldown.
    #[must_use]
    pub fn check_cooldown(&self, class: AbilityClassId, now: Seconds) -> bool {
        self.remaining(class, now) <= 0.0
    }

    /// Remove every cooldown. Authority only.
    ///
    /// Returns how many cooldown effects were removed from the host.
    pub fn reset_all_cooldowns<H, T>(
        &mut self,
        authority: NetAuthority,
        host: &mut H,
        timers: &mut T,
    ) -> Result<usize, CooldownError>
    where
        H: EffectApplicationHost + ?Sized,
        T: TimerHost + ?Sized,
    {
        if !authority.is_authority() {
            return Err(CooldownError::NotAuthoritative);
        }
        Ok(self.remove_all_cooldowns(host, timers))
    }

    /// Remove every tracked cooldown effect, drop every delay entry and cancel
    /// their timers.
    pub fn remove_all_cooldowns<H, T>(&mut self, host: &mut H, timers: &mut T) -> usize
    where
        H: EffectApplicationHost + ?Sized,
        T: TimerHost + ?Sized,
    {
        let mut removed = 0;
        for (_, record) in self.records.drain() {
            if let Some(tracked) = record.tracked {
                if host.remove_effect(tracked.handle) {
                    removed += 1;
                }
            }
            if let Some(timer) = record.delay.and_then(|delay| delay.timer) {
                timers.cancel(timer);
            }
        }
        removed
    }

    /// The host removed an effect. Forget it if it was a tracked cooldown.
    pub fn on_effect_removed(&mut self, handle: EffectHandle) -> Option<AbilityClassId> {
        let class = self
            .records
            .iter()
            .find(|(_, record)| record.tracked.is_some_and(|tracked| tracked.handle == handle))
            .map(|(class, _)| *class)?;

        if let Some(record) = self.records.get_mut(&class) {
            record.tracked = None;
            if record.is_empty() {
                self.records.remove(&class);
            }
        }
        Some(class)
    }

    /// A delay entry's expiry timer fired.
    ///
    /// Returns true if an elapsed entry was dropped. Entries re-registered
    /// after the timer was scheduled are kept.
    pub fn handle_delay_expired(&mut self, class: AbilityClassId, now: Seconds) -> bool {
        let Some(record) = self.records.get_mut(&class) else {
            return false;
        };
        match record.delay {
            Some(delay) if delay.end_time() <= now => {
                record.delay = None;
                if record.is_empty() {
                    self.records.remove(&class);
                }
                true
            }
            _ => false,
        }
    }

    fn track<H, T>(
        &mut self,
        class: AbilityClassId,
        effect: EffectClassId,
        handle: EffectHandle,
        end_time: Seconds,
        host: &mut H,
        timers: &mut T,
    ) where
        H: EffectApplicationHost + ?Sized,
        T: TimerHost + ?Sized,
    {
        let record = self.records.entry(class).or_default();
        if let Some(previous) = record.tracked.replace(TrackedCooldown {
            handle,
            effect,
            end_time,
        }) {
            if previous.handle != handle {
                host.remove_effect(previous.handle);
            }
        }
        if let Some(timer) = record.delay.take().and_then(|delay| delay.timer) {
            timers.cancel(timer);
        }
    }
}

fn cooldown_spec(cooldown: &CooldownConfig, owner: ActorId) -> EffectSpec {
    EffectSpec {
        class: cooldown.effect,
        level: 1,
        duration: EffectDuration::Duration(cooldown.duration),
        context: EffectContext::new().with_instigator(owner, owner),
        set_by_caller: SetByCallerMagnitudes::default(),
        dynamic_tags: TagSet::new(),
        captured_target_tags: TagSet::new(),
    }
}
