//! Abilities: activation, charging, cooldowns and prediction.
//!
//! - `AbilityDefinition`: authored ability data
//! - `Ability`: one actor's instance of an ability
//! - `ChargeController`: press/hold/release state machine
//! - `CooldownLedger`: cooldown bookkeeping with prediction reconciliation
//! - `AbilitySystem`: one actor's abilities, driven by the host tick

mod charge;
mod cooldown;
mod definition;
mod instance;
mod prediction;
mod system;

pub use charge::{ChargeConfig, ChargeController, ChargePhase, ChargeRelease, ChargeState, PressOutcome};
pub use cooldown::{CommitOutcome, CooldownError, CooldownLedger, CooldownRecord, DelayEntry, TrackedCooldown};
pub use definition::{AbilityClassId, AbilityDefinition, AbilityKind, CooldownConfig};
pub use instance::{Ability, AbilityCapability, AbilityContext, ActivationError, ActivationKey};
pub use prediction::{NetAuthority, PredictionKey};
pub use system::{AbilitySystem, HostFrame};
