//! Effect application - pushing built specs into the host.
//!
//! The `EffectApplicationDispatcher` is authority-gated. The server (or a
//! client predicting under a live key) applies every spec with full
//! semantics. Anyone else only runs instant specs through the host's local
//! execution path, so no tracked effect is created that the server's copy
//! would later duplicate.
//!
//! Targets without an ability system are handled afterwards with generic
//! damage plus the entry's cues.

use crate::ability::NetAuthority;
use crate::core::{ActorId, TagSet};
use crate::host::{AbilityHost, CueParams, EffectHandle};

use super::context::HitResult;
use super::spec::{EffectContainerSpec, NonAbilityTarget};

/// Applies effect container specs.
pub struct EffectApplicationDispatcher;

impl EffectApplicationDispatcher {
    /// Apply one container spec and return the handles of tracked effects.
    pub fn apply<H>(spec: &EffectContainerSpec, authority: NetAuthority, host: &mut H) -> Vec<EffectHandle>
    where
        H: AbilityHost + ?Sized,
    {
        let mut handles = Vec::new();

        if authority.can_apply_tracked() {
            for effect in &spec.specs {
                for target in spec.target_data.target_actors() {
                    if let Some(handle) = host.apply_spec(effect, target) {
                        handles.push(handle);
                    }
                }
            }
        } else {
            for effect in spec.specs.iter().filter(|effect| effect.is_instant()) {
                for target in spec.target_data.target_actors() {
                    host.execute_instant(effect, target);
                }
            }
        }

        let instigator = spec
            .specs
            .first()
            .and_then(|effect| effect.context.instigator)
            .or(spec.source);

        for target in &spec.non_ability_targets {
            Self::apply_fallback(host, target, spec.event_magnitude, instigator);
        }

        handles
    }

    /// Apply every spec in order, collecting all handles.
    pub fn apply_all<'a, H>(
        specs: impl IntoIterator<Item = &'a EffectContainerSpec>,
        authority: NetAuthority,
        host: &mut H,
    ) -> Vec<EffectHandle>
    where
        H: AbilityHost + ?Sized,
    {
        specs
            .into_iter()
            .flat_map(|spec| Self::apply(spec, authority, host))
            .collect()
    }

    fn apply_fallback<H>(host: &mut H, target: &NonAbilityTarget, magnitude: f32, instigator: Option<ActorId>)
    where
        H: AbilityHost + ?Sized,
    {
        let live_hit = target
            .hit_result
            .as_ref()
            .and_then(|hit| hit.actor.filter(|actor| host.is_valid(*actor)).map(|actor| (actor, hit)));

        if let Some((actor, hit)) = live_hit {
            host.apply_point_damage(actor, magnitude, hit.impact_normal, hit, instigator);
            Self::fire_cues(host, &target.cue_tags, cue_params(actor, Some(hit), magnitude, instigator));
            return;
        }

        match target.actor.filter(|actor| host.is_valid(*actor)) {
            Some(actor) => {
                host.apply_damage(actor, magnitude, instigator);
                Self::fire_cues(host, &target.cue_tags, cue_params(actor, None, magnitude, instigator));
            }
            None => tracing::debug!(actor = ?target.actor, "skipping stale non-ability target"),
        }
    }

    fn fire_cues<H>(host: &mut H, cues: &TagSet, params: CueParams)
    where
        H: AbilityHost + ?Sized,
    {
        for cue in cues.iter() {
            if let Err(error) = host.fire_cue(cue, &params) {
                tracing::warn!(%cue, %error, "cue failed");
            }
        }
    }
}

fn cue_params(target: ActorId, hit: Option<&HitResult>, magnitude: f32, instigator: Option<ActorId>) -> CueParams {
    CueParams {
        instigator,
        target: Some(target),
        location: hit.map(|hit| hit.impact_point),
        normal: hit.map(|hit| hit.impact_normal),
        magnitude,
    }
}
