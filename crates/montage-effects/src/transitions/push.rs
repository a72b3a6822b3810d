use montage_timeline::TransitionKind;

use crate::transition::{edge_vector, EffectContext, EffectDelta, TransitionEffect};

/// Moves content in `direction`: the incoming element originates at the
/// opposite edge, the outgoing element terminates at the `direction` edge.
pub struct Push;

impl TransitionEffect for Push {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Push
    }

    fn incoming(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        EffectDelta {
            offset: -edge_vector(ctx.direction) * ctx.canvas * (1.0 - p),
            ..Default::default()
        }
    }

    fn outgoing(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        EffectDelta {
            offset: edge_vector(ctx.direction) * ctx.canvas * p,
            ..Default::default()
        }
    }
}
