//! Press-and-hold charging.
//!
//! `ChargeController` is the per-ability state machine behind charged
//! abilities:
//!
//! ```text
//! Idle --press--> Pressed --release--> Released
//!                    |
//!                    +--auto-release timer--> AutoReleased
//! ```
//!
//! Releasing yields a [`ChargeRelease`] with the charged duration and the
//! multiplier the ability feeds into its effect specs. `reset` returns the
//! controller to `Idle` when the activation ends.
//!
//! ```
//! use dino_abilities::ability::{ChargeConfig, ChargeController};
//! use dino_abilities::host::TimerQueue;
//!
//! let config = ChargeConfig::new(0.5, 1.5).with_multipliers(1.0, 3.0);
//! let mut charge = ChargeController::new(config);
//! let mut timers = TimerQueue::new();
//!
//! charge.press(0.0, None, &mut timers);
//! let release = charge.release(1.0, &mut timers).unwrap();
//! assert_eq!(release.multiplier, 2.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{GameplayTag, Seconds};
use crate::host::{TimerEvent, TimerHandle, TimerHost};

fn one() -> f32 {
    1.0
}

/// Authored charge parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeConfig {
    pub min_charge_duration: Seconds,
    pub max_charge_duration: Seconds,

    #[serde(default = "one")]
    pub min_multiplier: f32,
    #[serde(default = "one")]
    pub max_multiplier: f32,

    /// Extra hold time past the max charge before releasing automatically.
    /// `None` disables auto-release.
    #[serde(default)]
    pub auto_release_delay: Option<Seconds>,

    /// Releasing before `min_charge_duration` cancels the ability.
    #[serde(default)]
    pub cancel_below_min_charge: bool,

    /// Set-by-caller key that receives the multiplier.
    #[serde(default)]
    pub multiplier_key: Option<GameplayTag>,
}

impl ChargeConfig {
    /// Charge between `min` and `max` seconds with a flat multiplier of 1.
    #[must_use]
    pub fn new(min_charge_duration: Seconds, max_charge_duration: Seconds) -> Self {
        Self {
            min_charge_duration,
            max_charge_duration,
            min_multiplier: 1.0,
            max_multiplier: 1.0,
            auto_release_delay: None,
            cancel_below_min_charge: false,
            multiplier_key: None,
        }
    }

    /// Set the multiplier range (builder pattern).
    #[must_use]
    pub fn with_multipliers(mut self, min: f32, max: f32) -> Self {
        self.min_multiplier = min;
        self.max_multiplier = max;
        self
    }

    /// Release automatically `delay` seconds after the max charge
    /// (builder pattern).
    #[must_use]
    pub fn with_auto_release(mut self, delay: Seconds) -> Self {
        self.auto_release_delay = Some(delay);
        self
    }

    /// Cancel on early release (builder pattern).
    #[must_use]
    pub fn cancel_below_min(mut self) -> Self {
        self.cancel_below_min_charge = true;
        self
    }

    /// Feed the multiplier into specs under `key` (builder pattern).
    #[must_use]
    pub fn with_multiplier_key(mut self, key: GameplayTag) -> Self {
        self.multiplier_key = Some(key);
        self
    }

    /// Charge fraction in `[0, 1]` for a charged duration.
    ///
    /// Equal min and max durations make this a step at the min duration.
    #[must_use]
    pub fn percentage(&self, charged: Seconds) -> f32 {
        let span = self.max_charge_duration - self.min_charge_duration;
        if span <= 0.0 {
            return if charged > self.min_charge_duration { 1.0 } else { 0.0 };
        }
        ((charged - self.min_charge_duration) / span).clamp(0.0, 1.0)
    }

    /// Multiplier for a charged duration.
    #[must_use]
    pub fn multiplier(&self, charged: Seconds) -> f32 {
        let t = self.percentage(charged);
        self.min_multiplier + (self.max_multiplier - self.min_multiplier) * t
    }

    /// Delay until auto-release, measured from the press.
    #[must_use]
    pub fn auto_release_after(&self) -> Option<Seconds> {
        self.auto_release_delay
            .map(|delay| delay + self.max_charge_duration)
    }
}

/// Where the controller is in its cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePhase {
    #[default]
    Idle,
    Pressed,
    Released,
    AutoReleased,
}

/// Timestamps of the current charge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeState {
    pub press_time: Option<Seconds>,
    pub release_time: Option<Seconds>,
    pub charged_duration: Seconds,
}

/// Result of ending a charge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeRelease {
    pub charged_duration: Seconds,
    pub percentage: f32,
    pub multiplier: f32,
    /// Released too early; the ability should cancel.
    pub cancelled: bool,
    /// Released by the auto-release timer.
    pub automatic: bool,
}

/// Result of a press.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PressOutcome {
    /// Already pressed; the first press stands.
    AlreadyPressed,
    /// Charging. Carries the auto-release timer, if one was scheduled.
    Charging(Option<TimerHandle>),
    /// The configured auto-release time was not positive.
    ReleasedImmediately(ChargeRelease),
}

/// Charge state machine for one ability instance.
#[derive(Clone, Debug)]
pub struct ChargeController {
    config: ChargeConfig,
    phase: ChargePhase,
    state: ChargeState,
    auto_release_timer: Option<TimerHandle>,
}

impl ChargeController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(config: ChargeConfig) -> Self {
        Self {
            config,
            phase: ChargePhase::Idle,
            state: ChargeState::default(),
            auto_release_timer: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ChargeConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> ChargePhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> ChargeState {
        self.state
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.phase == ChargePhase::Pressed
    }

    /// Pending auto-release timer.
    #[must_use]
    pub fn auto_release_timer(&self) -> Option<TimerHandle> {
        self.auto_release_timer
    }

    /// Start charging at `now`.
    ///
    /// `auto_release` is the event to schedule if auto-release is configured.
    pub fn press<T>(&mut self, now: Seconds, auto_release: Option<TimerEvent>, timers: &mut T) -> PressOutcome
    where
        T: TimerHost + ?Sized,
    {
        if self.phase == ChargePhase::Pressed {
            return PressOutcome::AlreadyPressed;
        }

        self.phase = ChargePhase::Pressed;
        self.state = ChargeState {
            press_time: Some(now),
            release_time: None,
            charged_duration: 0.0,
        };

        let Some(delay) = self.config.auto_release_after() else {
            return PressOutcome::Charging(None);
        };
        if delay <= 0.0 {
            return match self.finish(now, ChargePhase::AutoReleased) {
                Some(release) => PressOutcome::ReleasedImmediately(release),
                None => PressOutcome::Charging(None),
            };
        }

        let handle = auto_release.map(|event| timers.schedule(delay, false, event));
        self.auto_release_timer = handle;
        PressOutcome::Charging(handle)
    }

    /// Release at `now`. Returns `None` if not pressed.
    pub fn release<T>(&mut self, now: Seconds, timers: &mut T) -> Option<ChargeRelease>
    where
        T: TimerHost + ?Sized,
    {
        if self.phase != ChargePhase::Pressed {
            return None;
        }
        if let Some(handle) = self.auto_release_timer.take() {
            timers.cancel(handle);
        }
        self.finish(now, ChargePhase::Released)
    }

    /// Release because the auto-release timer fired at `now`.
    pub fn auto_release(&mut self, now: Seconds) -> Option<ChargeRelease> {
        if self.phase != ChargePhase::Pressed {
            return None;
        }
        // Already fired, nothing to cancel.
        self.auto_release_timer = None;
        self.finish(now, ChargePhase::AutoReleased)
    }

    /// Return to idle, cancelling a pending auto-release. Safe to repeat.
    pub fn reset<T>(&mut self, timers: &mut T)
    where
        T: TimerHost + ?Sized,
    {
        if let Some(handle) = self.auto_release_timer.take() {
            timers.cancel(handle);
        }
        self.phase = ChargePhase::Idle;
        self.state = ChargeState::default();
    }

    fn finish(&mut self, now: Seconds, phase: ChargePhase) -> Option<ChargeRelease> {
        let press_time = self.state.press_time?;
        let charged = (now - press_time).max(0.0);

        self.phase = phase;
        self.state.release_time = Some(now);
        self.state.charged_duration = charged;

        Some(ChargeRelease {
            charged_duration: charged,
            percentage: self.config.percentage(charged),
            multiplier: self.config.multiplier(charged),
            cancelled: self.config.cancel_below_min_charge && charged < self.config.min_charge_duration,
            automatic: phase == ChargePhase::AutoReleased,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityClassId, ActivationKey};
    use crate::host::TimerQueue;
    use proptest::prelude::*;

    fn auto_event() -> TimerEvent {
        TimerEvent::AutoRelease {
            ability: AbilityClassId::new(1),
            key: ActivationKey::new(1),
        }
    }

    #[test]
    fn test_release_computes_multiplier() {
        let mut charge = ChargeController::new(ChargeConfig::new(1.0, 3.0).with_multipliers(1.0, 2.0));
        let mut timers = TimerQueue::new();

        charge.press(10.0, None, &mut timers);
        let release = charge.release(12.0, &mut timers).unwrap();

        assert_eq!(release.charged_duration, 2.0);
        assert_eq!(release.percentage, 0.5);
        assert_eq!(release.multiplier, 1.5);
        assert_eq!(charge.phase(), ChargePhase::Released);
    }

    #[test]
    fn test_repress_keeps_first_timestamp() {
        let mut charge = ChargeController::new(ChargeConfig::new(0.0, 4.0));
        let mut timers = TimerQueue::new();

        assert!(matches!(charge.press(1.0, None, &mut timers), PressOutcome::Charging(None)));
        assert_eq!(charge.press(2.0, None, &mut timers), PressOutcome::AlreadyPressed);

        let release = charge.release(3.0, &mut timers).unwrap();
        assert_eq!(release.charged_duration, 2.0);
    }

    #[test]
    fn test_release_without_press() {
        let mut charge = ChargeController::new(ChargeConfig::new(0.0, 1.0));
        assert!(charge.release(1.0, &mut TimerQueue::new()).is_none());
        assert!(charge.auto_release(1.0).is_none());
    }

    #[test]
    fn test_auto_release_scheduled_at_delay_plus_max() {
        let config = ChargeConfig::new(0.5, 3.0).with_multipliers(1.0, 4.0).with_auto_release(2.0);
        let mut charge = ChargeController::new(config);
        let mut timers = TimerQueue::new();

        let PressOutcome::Charging(Some(handle)) = charge.press(0.0, Some(auto_event()), &mut timers) else {
            panic!("expected a scheduled auto-release");
        };
        assert_eq!(timers.due_time(handle), Some(5.0));

        assert!(timers.advance_to(4.9).is_empty());
        assert_eq!(timers.advance_to(5.0), vec![auto_event()]);

        let release = charge.auto_release(5.0).unwrap();
        assert!(release.automatic);
        assert_eq!(release.charged_duration, 5.0);
        assert_eq!(release.multiplier, 4.0);
        assert_eq!(charge.phase(), ChargePhase::AutoReleased);
    }

    #[test]
    fn test_manual_release_cancels_auto_release() {
        let mut charge = ChargeController::new(ChargeConfig::new(0.0, 1.0).with_auto_release(1.0));
        let mut timers = TimerQueue::new();

        charge.press(0.0, Some(auto_event()), &mut timers);
        assert_eq!(timers.pending(), 1);

        charge.release(0.5, &mut timers);
        assert_eq!(timers.pending(), 0);
        assert!(charge.auto_release_timer().is_none());
    }

    #[test]
    fn test_non_positive_auto_release_releases_immediately() {
        let mut charge = ChargeController::new(ChargeConfig::new(0.0, 0.0).with_auto_release(0.0));
        let mut timers = TimerQueue::new();

        let outcome = charge.press(2.0, Some(auto_event()), &mut timers);
        assert!(matches!(outcome, PressOutcome::ReleasedImmediately(release) if release.charged_duration == 0.0));
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_early_release_cancels() {
        let mut charge = ChargeController::new(ChargeConfig::new(1.0, 2.0).cancel_below_min());
        let mut timers = TimerQueue::new();

        charge.press(0.0, None, &mut timers);
        assert!(charge.release(0.5, &mut timers).unwrap().cancelled);

        charge.reset(&mut timers);
        charge.press(1.0, None, &mut timers);
        assert!(!charge.release(2.0, &mut timers).unwrap().cancelled);
    }

    #[test]
    fn test_equal_min_max_is_a_step() {
        let config = ChargeConfig::new(1.0, 1.0).with_multipliers(1.0, 2.0);
        assert_eq!(config.multiplier(0.5), 1.0);
        assert_eq!(config.multiplier(1.0), 1.0);
        assert_eq!(config.multiplier(1.5), 2.0);

        let instant = ChargeConfig::new(0.0, 0.0);
        assert_eq!(instant.percentage(0.0), 0.0);
        assert_eq!(instant.percentage(6.0e-8), 1.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut charge = ChargeController::new(ChargeConfig::new(0.0, 1.0).with_auto_release(1.0));
        let mut timers = TimerQueue::new();

        charge.press(0.0, Some(auto_event()), &mut timers);
        charge.reset(&mut timers);
        charge.reset(&mut timers);

        assert_eq!(charge.phase(), ChargePhase::Idle);
        assert_eq!(charge.state(), ChargeState::default());
        assert_eq!(timers.pending(), 0);
    }

    proptest! {
        #[test]
        fn prop_multiplier_clamps_outside_range(
            min in 0.0f32..5.0,
            span in 0.1f32..5.0,
            t in -10.0f32..20.0,
        ) {
            let config = ChargeConfig::new(min, min + span).with_multipliers(1.0, 3.0);
            let clamped = t.clamp(config.min_charge_duration, config.max_charge_duration);
            prop_assert!((config.multiplier(t) - config.multiplier(clamped)).abs() < 1e-5);
        }

        #[test]
        fn prop_multiplier_is_monotone(
            min in 0.0f32..5.0,
            span in 0.1f32..5.0,
            a in 0.0f32..10.0,
            b in 0.0f32..10.0,
        ) {
            let config = ChargeConfig::new(min, min + span).with_multipliers(0.5, 2.5);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (m_lo, m_hi) = (config.multiplier(lo), config.multiplier(hi));

            prop_assert!(m_lo <= m_hi + 1e-6);
            prop_assert!((0.5..=2.5).contains(&m_lo));
            prop_assert!((0.5..=2.5).contains(&m_hi));
        }
    }
}
