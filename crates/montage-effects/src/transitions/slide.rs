use montage_timeline::TransitionKind;

use crate::transition::{edge_vector, EffectContext, EffectDelta, TransitionEffect};

/// Enters from the `direction` edge and leaves back through it.
pub struct Slide;

impl TransitionEffect for Slide {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Slide
    }

    fn incoming(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        EffectDelta {
            offset: edge_vector(ctx.direction) * ctx.canvas * (1.0 - p),
            ..Default::default()
        }
    }
}
