use montage_timeline::TransitionKind;

use crate::transition::{lerp, EffectContext, EffectDelta, TransitionEffect};

/// Opacity ramp.
pub struct Fade;

impl TransitionEffect for Fade {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Fade
    }

    fn incoming(&self, _ctx: &EffectContext, p: f32) -> EffectDelta {
        EffectDelta {
            opacity: Some(lerp(0.0, 1.0, p)),
            ..Default::default()
        }
    }
}
