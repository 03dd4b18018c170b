//! Per-application effect context.
//!
//! The context travels with every built effect spec: who caused it, what was
//! hit, how hard, and how the target should be knocked back. Contexts own
//! their hit result, so cloning a spec for delayed reapplication deep-copies
//! the hit geometry as well.

use serde::{Deserialize, Serialize};

use crate::core::{ActorId, GameplayTag, Seconds, Vec3};

/// Damage classification carried by a context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DamageType {
    #[default]
    Generic = 0,
    Bite = 1,
    Tail = 2,
    Claw = 3,
    Bleed = 4,
    Poison = 5,
    Fall = 6,
    Environmental = 7,
    /// Reflected damage: the struck target damages the attacker.
    Spikes = 8,
}

impl DamageType {
    /// True when damage flows back from the original target onto the attacker.
    #[must_use]
    pub fn is_reflected(self) -> bool {
        matches!(self, Self::Spikes)
    }

    /// Wire discriminant.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire discriminant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Generic,
            1 => Self::Bite,
            2 => Self::Tail,
            3 => Self::Claw,
            4 => Self::Bleed,
            5 => Self::Poison,
            6 => Self::Fall,
            7 => Self::Environmental,
            8 => Self::Spikes,
            _ => return None,
        })
    }
}

/// How a hit pushes the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KnockbackMode {
    #[default]
    None = 0,
    /// Along the attack direction.
    Directional = 1,
    /// Away from the world origin of the context.
    Radial = 2,
    /// Upward launch.
    Launch = 3,
}

impl KnockbackMode {
    /// Wire discriminant.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire discriminant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::Directional,
            2 => Self::Radial,
            3 => Self::Launch,
            _ => return None,
        })
    }
}

/// A copy of host hit geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    /// The actor that was hit, if it still resolved when the hit was recorded.
    pub actor: Option<ActorId>,
    /// World-space impact location.
    pub impact_point: Vec3,
    /// Surface normal at the impact.
    pub impact_normal: Vec3,
    /// Primary bone on the hit actor.
    pub bone_name: Option<String>,
    /// Secondary bone, on the side doing the hitting.
    pub my_bone_name: Option<String>,
}

impl HitResult {
    /// Create a hit against an actor.
    pub fn on_actor(actor: ActorId) -> Self {
        Self {
            actor: Some(actor),
            ..Self::default()
        }
    }

    /// Set the impact point and normal (builder pattern).
    #[must_use]
    pub fn at(mut self, point: Vec3, normal: Vec3) -> Self {
        self.impact_point = point;
        self.impact_normal = normal;
        self
    }

    /// Set the primary and secondary bones (builder pattern).
    #[must_use]
    pub fn with_bones(mut self, bone: impl Into<String>, my_bone: impl Into<String>) -> Self {
        self.bone_name = Some(bone.into());
        self.my_bone_name = Some(my_bone.into());
        self
    }

    /// Swap primary and secondary bones, used when a hit is reflected.
    pub fn swap_bones(&mut self) {
        std::mem::swap(&mut self.bone_name, &mut self.my_bone_name);
    }
}

/// Contextual payload attached to one effect application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectContext {
    pub instigator: Option<ActorId>,
    pub causer: Option<ActorId>,
    pub hit_result: Option<HitResult>,
    pub damage_type: DamageType,
    pub knockback_mode: KnockbackMode,
    pub knockback_force: f32,
    pub event_magnitude: f32,
    pub charged_duration: Seconds,
    /// Instigator movement speed when the context was built.
    pub movement_speed: f32,
    pub context_tag: Option<GameplayTag>,
    pub world_origin: Option<Vec3>,
    pub direction: Option<Vec3>,
}

impl EffectContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set instigator and causer (builder pattern).
    #[must_use]
    pub fn with_instigator(mut self, instigator: ActorId, causer: ActorId) -> Self {
        self.instigator = Some(instigator);
        self.causer = Some(causer);
        self
    }

    /// Set the hit result (builder pattern).
    #[must_use]
    pub fn with_hit(mut self, hit: HitResult) -> Self {
        self.hit_result = Some(hit);
        self
    }

    /// Set the damage type (builder pattern).
    #[must_use]
    pub fn with_damage_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = damage_type;
        self
    }

    /// Set knockback mode and force (builder pattern).
    #[must_use]
    pub fn with_knockback(mut self, mode: KnockbackMode, force: f32) -> Self {
        self.knockback_mode = mode;
        self.knockback_force = force;
        self
    }

    /// Set the event magnitude (builder pattern).
    #[must_use]
    pub fn with_magnitude(mut self, magnitude: f32) -> Self {
        self.event_magnitude = magnitude;
        self
    }

    /// Set the context tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: GameplayTag) -> Self {
        self.context_tag = Some(tag);
        self
    }

    /// Deep copy for delayed or duration-based reapplication.
    ///
    /// The hit result is owned, so the copy shares nothing with `self`.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_discriminants() {
        for value in 0..=8u8 {
            assert_eq!(DamageType::from_u8(value).map(DamageType::to_u8), Some(value));
        }
        assert_eq!(DamageType::from_u8(9), None);
        assert_eq!(KnockbackMode::from_u8(3), Some(KnockbackMode::Launch));
        assert_eq!(KnockbackMode::from_u8(4), None);
    }

    #[test]
    fn test_only_spikes_reflects() {
        assert!(DamageType::Spikes.is_reflected());
        assert!(!DamageType::Bite.is_reflected());
    }

    #[test]
    fn test_swap_bones() {
        let mut hit = HitResult::on_actor(ActorId(3)).with_bones("Head", "Root");
        hit.swap_bones();
        assert_eq!(hit.bone_name.as_deref(), Some("Root"));
        assert_eq!(hit.my_bone_name.as_deref(), Some("Head"));
    }

    #[test]
    fn test_duplicate_owns_hit() {
        let original = EffectContext::new().with_hit(HitResult::on_actor(ActorId(1)).with_bones("Neck", "Jaw"));
        let mut copy = original.duplicate();
        copy.hit_result.as_mut().unwrap().swap_bones();

        assert_eq!(original.hit_result.as_ref().unwrap().bone_name.as_deref(), Some("Neck"));
        assert_eq!(copy.hit_result.as_ref().unwrap().bone_name.as_deref(), Some("Jaw"));
    }
}
