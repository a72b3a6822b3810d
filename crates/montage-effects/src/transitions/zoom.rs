use montage_timeline::{Direction, TransitionKind};

use crate::transition::{lerp, EffectContext, EffectDelta, TransitionEffect};

/// Scale from small (`in`) or large (`out`) to natural size.
pub struct Zoom;

impl TransitionEffect for Zoom {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Zoom
    }

    fn incoming(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        let from = match ctx.direction {
            Direction::Out => 2.0,
            _ => 0.1,
        };
        EffectDelta {
            scale: Some(lerp(from, 1.0, p)),
            ..Default::default()
        }
    }
}
