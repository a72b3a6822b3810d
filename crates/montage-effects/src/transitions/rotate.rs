use montage_timeline::{Direction, TransitionKind};

use crate::transition::{lerp, EffectContext, EffectDelta, TransitionEffect};

/// Degrees turned per second of transition.
const DEGREES_PER_SECOND: f32 = 720.0;

/// Spin into place. Counter-clockwise for `left`, clockwise otherwise.
pub struct Rotate;

impl TransitionEffect for Rotate {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Rotate
    }

    fn incoming(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        let sign = if ctx.direction == Direction::Left { -1.0 } else { 1.0 };
        let from = sign * DEGREES_PER_SECOND * ctx.duration as f32;
        EffectDelta {
            rotation: Some(lerp(from, 0.0, p)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_core::Vec2;
    use montage_timeline::Boundary;

    #[test]
    fn test_rotation_scales_with_duration() {
        let mut ctx = EffectContext {
            boundary: Boundary::Start,
            direction: Direction::Right,
            duration: 0.5,
            canvas: Vec2::new(100.0, 100.0),
        };
        assert_eq!(Rotate.evaluate(&ctx, 0.0).rotation, Some(360.0));
        assert_eq!(Rotate.evaluate(&ctx, 1.0).rotation, Some(0.0));

        ctx.direction = Direction::Left;
        assert_eq!(Rotate.evaluate(&ctx, 0.5).rotation, Some(-180.0));
    }
}
