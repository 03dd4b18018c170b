//! Sparse `EffectContext` wire format.
//!
//! Layout: a little-endian `u16` presence mask, then every present field in
//! mask-bit order. A field is present iff it differs from its default, so an
//! empty context costs two bytes. Field values use bincode's default
//! (little-endian, fixed-width) encoding.
//!
//! | bit | field            | encoding                  |
//! |-----|------------------|---------------------------|
//! | 0   | instigator       | `u32` actor id            |
//! | 1   | causer           | `u32` actor id            |
//! | 2   | hit result       | bincode `HitResult`       |
//! | 3   | damage type      | `u8` discriminant         |
//! | 4   | knockback mode   | `u8` discriminant         |
//! | 5   | knockback force  | `f32`                     |
//! | 6   | event magnitude  | `f32`                     |
//! | 7   | charged duration | `f32`                     |
//! | 8   | movement speed   | `f32`                     |
//! | 9   | context tag      | length-prefixed UTF-8     |
//! | 10  | world origin     | 3 × `f32`                 |
//! | 11  | direction        | 3 × `f32`                 |
//!
//! The bit order is part of the protocol and must not change.

use std::io::Write;

use bincode::Options;
use bitflags::bitflags;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::{ActorId, GameplayTag, TagError, Vec3};
use crate::effects::{DamageType, EffectContext, HitResult, KnockbackMode};

bitflags! {
    /// Presence mask of an encoded [`EffectContext`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ContextFields: u16 {
        const INSTIGATOR       = 1 << 0;
        const CAUSER           = 1 << 1;
        const HIT_RESULT       = 1 << 2;
        const DAMAGE_TYPE      = 1 << 3;
        const KNOCKBACK_MODE   = 1 << 4;
        const KNOCKBACK_FORCE  = 1 << 5;
        const EVENT_MAGNITUDE  = 1 << 6;
        const CHARGED_DURATION = 1 << 7;
        const MOVEMENT_SPEED   = 1 << 8;
        const CONTEXT_TAG      = 1 << 9;
        const WORLD_ORIGIN     = 1 << 10;
        const DIRECTION        = 1 << 11;
    }
}

/// Context codec errors.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The mask sets bits this protocol version does not know.
    #[error("unknown context fields in mask {0:#06x}")]
    UnknownFields(u16),

    #[error("invalid damage type {0}")]
    InvalidDamageType(u8),

    #[error("invalid knockback mode {0}")]
    InvalidKnockbackMode(u8),

    #[error("invalid context tag: {0}")]
    InvalidTag(#[from] TagError),

    /// Bytes left over after the last present field.
    #[error("{0} trailing bytes after context")]
    TrailingBytes(usize),

    #[error("context codec: {0}")]
    Codec(#[from] bincode::Error),
}

/// Fields of `context` that differ from their defaults.
#[must_use]
pub fn presence_mask(context: &EffectContext) -> ContextFields {
    let mut mask = ContextFields::empty();
    mask.set(ContextFields::INSTIGATOR, context.instigator.is_some());
    mask.set(ContextFields::CAUSER, context.causer.is_some());
    mask.set(ContextFields::HIT_RESULT, context.hit_result.is_some());
    mask.set(ContextFields::DAMAGE_TYPE, context.damage_type != DamageType::default());
    mask.set(ContextFields::KNOCKBACK_MODE, context.knockback_mode != KnockbackMode::default());
    mask.set(ContextFields::KNOCKBACK_FORCE, context.knockback_force != 0.0);
    mask.set(ContextFields::EVENT_MAGNITUDE, context.event_magnitude != 0.0);
    mask.set(ContextFields::CHARGED_DURATION, context.charged_duration != 0.0);
    mask.set(ContextFields::MOVEMENT_SPEED, context.movement_speed != 0.0);
    mask.set(ContextFields::CONTEXT_TAG, context.context_tag.is_some());
    mask.set(ContextFields::WORLD_ORIGIN, context.world_origin.is_some());
    mask.set(ContextFields::DIRECTION, context.direction.is_some());
    mask
}

/// Encode a context.
pub fn encode_context(context: &EffectContext) -> Result<Vec<u8>, WireError> {
    let mut out = Vec::with_capacity(32);
    write_context(&mut out, context)?;
    Ok(out)
}

/// Append an encoded context to `out`.
pub fn write_context<W: Write>(mut out: W, context: &EffectContext) -> Result<(), WireError> {
    let mask = presence_mask(context);
    put(&mut out, &mask.bits())?;

    if let Some(actor) = context.instigator {
        put(&mut out, &actor.raw())?;
    }
    if let Some(actor) = context.causer {
        put(&mut out, &actor.raw())?;
    }
    if let Some(hit) = &context.hit_result {
        put(&mut out, hit)?;
    }
    if mask.contains(ContextFields::DAMAGE_TYPE) {
        put(&mut out, &context.damage_type.to_u8())?;
    }
    if mask.contains(ContextFields::KNOCKBACK_MODE) {
        put(&mut out, &context.knockback_mode.to_u8())?;
    }
    for (field, value) in [
        (ContextFields::KNOCKBACK_FORCE, context.knockback_force),
        (ContextFields::EVENT_MAGNITUDE, context.event_magnitude),
        (ContextFields::CHARGED_DURATION, context.charged_duration),
        (ContextFields::MOVEMENT_SPEED, context.movement_speed),
    ] {
        if mask.contains(field) {
            put(&mut out, &value)?;
        }
    }
    if let Some(tag) = &context.context_tag {
        put(&mut out, tag.as_str())?;
    }
    if let Some(origin) = &context.world_origin {
        put(&mut out, origin)?;
    }
    if let Some(direction) = &context.direction {
        put(&mut out, direction)?;
    }
    Ok(())
}

/// Decode a context, rejecting trailing bytes.
pub fn decode_context(bytes: &[u8]) -> Result<EffectContext, WireError> {
    let mut reader = bytes;
    let context = read_context(&mut reader)?;
    if !reader.is_empty() {
        return Err(WireError::TrailingBytes(reader.len()));
    }
    Ok(context)
}

/// Read one context from the front of `reader`, advancing it.
pub fn read_context(reader: &mut &[u8]) -> Result<EffectContext, WireError> {
    let raw: u16 = take(reader)?;
    let mask = ContextFields::from_bits(raw).ok_or(WireError::UnknownFields(raw))?;
    let mut context = EffectContext::default();

    if mask.contains(ContextFields::INSTIGATOR) {
        context.instigator = Some(ActorId::new(take(reader)?));
    }
    if mask.contains(ContextFields::CAUSER) {
        context.causer = Some(ActorId::new(take(reader)?));
    }
    if mask.contains(ContextFields::HIT_RESULT) {
        context.hit_result = Some(take::<HitResult>(reader)?);
    }
    if mask.contains(ContextFields::DAMAGE_TYPE) {
        let raw: u8 = take(reader)?;
        context.damage_type = DamageType::from_u8(raw).ok_or(WireError::InvalidDamageType(raw))?;
    }
    if mask.contains(ContextFields::KNOCKBACK_MODE) {
        let raw: u8 = take(reader)?;
        context.knockback_mode = KnockbackMode::from_u8(raw).ok_or(WireError::InvalidKnockbackMode(raw))?;
    }
    if mask.contains(ContextFields::KNOCKBACK_FORCE) {
        context.knockback_force = take(reader)?;
    }
    if mask.contains(ContextFields::EVENT_MAGNITUDE) {
        context.event_magnitude = take(reader)?;
    }
    if mask.contains(ContextFields::CHARGED_DURATION) {
        context.charged_duration = take(reader)?;
    }
    if mask.contains(ContextFields::MOVEMENT_SPEED) {
        context.movement_speed = take(reader)?;
    }
    if mask.contains(ContextFields::CONTEXT_TAG) {
        let path: String = take(reader)?;
        context.context_tag = Some(GameplayTag::new(&path)?);
    }
    if mask.contains(ContextFields::WORLD_ORIGIN) {
        context.world_origin = Some(take::<Vec3>(reader)?);
    }
    if mask.contains(ContextFields::DIRECTION) {
        context.direction = Some(take::<Vec3>(reader)?);
    }
    Ok(context)
}

fn put<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), WireError> {
    bincode::serialize_into(out, value)?;
    Ok(())
}

fn take<T: DeserializeOwned>(reader: &mut &[u8]) -> Result<T, WireError> {
    // A corrupt length prefix may not claim more than what is left.
    let options = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(reader.len() as u64);
    Ok(options.deserialize_from(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_context() -> EffectContext {
        let mut context = EffectContext::new()
            .with_instigator(ActorId(7), ActorId(8))
            .with_hit(
                HitResult::on_actor(ActorId(9))
                    .at(Vec3::new(1.0, 2.0, 3.0), Vec3::UP)
                    .with_bones("Head", "Jaw"),
            )
            .with_damage_type(DamageType::Bite)
            .with_knockback(KnockbackMode::Radial, 600.0)
            .with_magnitude(45.0)
            .with_tag("Context.Ambush".parse().unwrap());
        context.charged_duration = 1.25;
        context.movement_speed = 320.0;
        context.world_origin = Some(Vec3::new(10.0, 0.0, -4.0));
        context.direction = Some(Vec3::new(0.0, 1.0, 0.0));
        context
    }

    #[test]
    fn test_empty_context_is_two_bytes() {
        let bytes = encode_context(&EffectContext::default()).unwrap();
        assert_eq!(bytes, vec![0, 0]);
        assert_eq!(decode_context(&bytes).unwrap(), EffectContext::default());
    }

    #[test]
    fn test_field_order_on_the_wire() {
        let context = EffectContext {
            instigator: Some(ActorId(7)),
            damage_type: DamageType::Spikes,
            ..EffectContext::default()
        };
        let bytes = encode_context(&context).unwrap();
        assert_eq!(bytes, vec![0b0000_1001, 0, 7, 0, 0, 0, 8]);
    }

    #[test]
    fn test_only_present_optionals_are_sent() {
        let context = EffectContext {
            direction: Some(Vec3::new(0.0, 0.0, 1.0)),
            ..EffectContext::default()
        };
        assert_eq!(presence_mask(&context), ContextFields::DIRECTION);

        let bytes = encode_context(&context).unwrap();
        assert_eq!(bytes.len(), 2 + 12);
        assert_eq!(decode_context(&bytes).unwrap(), context);
    }

    #[test]
    fn test_full_context_survives() {
        let context = full_context();
        assert_eq!(presence_mask(&context), ContextFields::all());
        assert_eq!(decode_context(&encode_context(&context).unwrap()).unwrap(), context);
    }

    #[test]
    fn test_unknown_mask_bits_rejected() {
        let err = decode_context(&[0x00, 0x80]).unwrap_err();
        assert!(matches!(err, WireError::UnknownFields(0x8000)));
    }

    #[test]
    fn test_invalid_damage_type_rejected() {
        let err = decode_context(&[0b0000_1000, 0, 42]).unwrap_err();
        assert!(matches!(err, WireError::InvalidDamageType(42)));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = encode_context(&full_context()).unwrap();
        let err = decode_context(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, WireError::Codec(_)));
    }

    #[test]
    fn test_oversized_tag_length_rejected() {
        let mut bytes = vec![0x00, 0x02];
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(decode_context(&bytes), Err(WireError::Codec(_))));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode_context(&EffectContext::default()).unwrap();
        bytes.push(0xff);
        assert!(matches!(decode_context(&bytes), Err(WireError::TrailingBytes(1))));
    }

    #[test]
    fn test_stream_of_contexts() {
        let mut buffer = Vec::new();
        write_context(&mut buffer, &full_context()).unwrap();
        write_context(&mut buffer, &EffectContext::default()).unwrap();

        let mut reader = buffer.as_slice();
        assert_eq!(read_context(&mut reader).unwrap(), full_context());
        assert_eq!(read_context(&mut reader).unwrap(), EffectContext::default());
        assert!(reader.is_empty());
    }
}
