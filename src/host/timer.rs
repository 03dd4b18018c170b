//! Scheduled ability events.
//!
//! Instead of registering callbacks, abilities schedule plain [`TimerEvent`]
//! values. The host advances a [`TimerHost`] from its tick and feeds fired
//! events back into the owning [`AbilitySystem`](crate::ability::AbilitySystem).
//! Every activation-bound event carries the activation key it was scheduled
//! under, so events from a superseded activation are recognised and dropped.
//!
//! [`TimerQueue`] is a deterministic in-process implementation.
//!
//! ```
//! use dino_abilities::ability::{AbilityClassId, ActivationKey};
//! use dino_abilities::host::{TimerEvent, TimerHost, TimerQueue};
//!
//! let mut timers = TimerQueue::new();
//! let event = TimerEvent::AutoRelease { ability: AbilityClassId::new(1), key: ActivationKey::new(1) };
//! timers.schedule(2.0, false, event.clone());
//!
//! assert!(timers.advance_to(1.0).is_empty());
//! assert_eq!(timers.advance_to(2.0), vec![event]);
//! ```

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityClassId, ActivationKey};
use crate::core::Seconds;

/// Handle to a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// What a timer delivers when it fires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// A charged ability reached its auto-release time.
    AutoRelease { ability: AbilityClassId, key: ActivationKey },
    /// A periodic ability's next activation tick.
    PeriodicTick { ability: AbilityClassId, key: ActivationKey },
    /// A locally predicted cooldown delay elapsed.
    CooldownDelayExpired { ability: AbilityClassId },
}

impl TimerEvent {
    /// The ability this event belongs to.
    #[must_use]
    pub fn ability(&self) -> AbilityClassId {
        match self {
            Self::AutoRelease { ability, .. }
            | Self::PeriodicTick { ability, .. }
            | Self::CooldownDelayExpired { ability } => *ability,
        }
    }
}

/// Host scheduling service.
pub trait TimerHost {
    /// Schedule `event` after `delay` seconds. With `repeat`, the event fires
    /// every `delay` seconds until cancelled.
    fn schedule(&mut self, delay: Seconds, repeat: bool, event: TimerEvent) -> TimerHandle;

    /// Cancel a timer. Cancelling an unknown or fired timer is a no-op that
    /// returns false.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Clone, Debug)]
struct ScheduledTimer {
    handle: TimerHandle,
    due: Seconds,
    interval: Option<Seconds>,
    event: TimerEvent,
}

/// Deterministic timer queue driven by explicit time advancement.
///
/// Timers due at the same time fire in scheduling order.
#[derive(Clone, Debug, Default)]
pub struct TimerQueue {
    now: Seconds,
    next_handle: u64,
    timers: Vec<ScheduledTimer>,
}

impl TimerQueue {
    /// Create an empty queue at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue at `now`.
    #[must_use]
    pub fn starting_at(now: Seconds) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Current queue time.
    #[must_use]
    pub fn now(&self) -> Seconds {
        self.now
    }

    /// Number of live timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// True if the handle is still scheduled.
    #[must_use]
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|timer| timer.handle == handle)
    }

    /// Due time of a scheduled timer.
    #[must_use]
    pub fn due_time(&self, handle: TimerHandle) -> Option<Seconds> {
        self.timers
            .iter()
            .find(|timer| timer.handle == handle)
            .map(|timer| timer.due)
    }

    /// Advance to `now`, returning every event that fired, in due order.
    ///
    /// Time never moves backwards; an earlier `now` fires nothing.
    pub fn advance_to(&mut self, now: Seconds) -> Vec<TimerEvent> {
        if now > self.now {
            self.now = now;
        }

        let mut fired = Vec::new();
        while let Some(index) = self.next_due() {
            fired.push(self.timers[index].event.clone());

            match self.timers[index].interval {
                Some(interval) => self.timers[index].due += interval,
                None => {
                    self.timers.remove(index);
                }
            }
        }
        fired
    }

    fn next_due(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= self.now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.handle.cmp(&b.handle)))
            .map(|(index, _)| index)
    }
}

impl TimerHost for TimerQueue {
    fn schedule(&mut self, delay: Seconds, repeat: bool, event: TimerEvent) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        let delay = delay.max(0.0);

        // A zero interval would refire forever within one advance.
        let interval = (repeat && delay > 0.0).then_some(delay);
        self.timers.push(ScheduledTimer {
            handle,
            due: self.now + delay,
            interval,
            event,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }
}
