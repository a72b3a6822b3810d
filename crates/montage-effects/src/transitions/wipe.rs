use montage_core::Insets;
use montage_timeline::{Direction, TransitionKind};

use crate::transition::{EffectContext, EffectDelta, TransitionEffect};

/// Rectangular reveal that grows from the `direction` edge.
pub struct Wipe;

impl TransitionEffect for Wipe {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Wipe
    }

    fn incoming(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        let hidden = 100.0 * (1.0 - p);
        let clip = match ctx.direction {
            Direction::Left => Insets::new(0.0, hidden, 0.0, 0.0),
            Direction::Right => Insets::new(hidden, 0.0, 0.0, 0.0),
            Direction::Top => Insets::new(0.0, 0.0, 0.0, hidden),
            Direction::Bottom => Insets::new(0.0, 0.0, hidden, 0.0),
            // Reveal from the centre outwards
            Direction::In | Direction::Out => {
                let half = hidden / 2.0;
                Insets::new(half, half, half, half)
            }
        };
        EffectDelta {
            clip: Some(clip),
            ..Default::default()
        }
    }
}
