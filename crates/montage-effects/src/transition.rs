//! Transition effect evaluation.

use montage_core::{Insets, Vec2};
use montage_timeline::{Boundary, Direction, Transition, TransitionKind};

/// Per-field changes a transition applies to an element at one instant.
///
/// `None` leaves the element's own value in place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectDelta {
    pub opacity: Option<f32>,
    pub scale: Option<f32>,
    /// Degrees
    pub rotation: Option<f32>,
    /// Canvas pixels added to the element's position
    pub offset: Vec2,
    /// Reveal region as insets in percent of the element's size
    pub clip: Option<Insets>,
}

impl EffectDelta {
    /// Fold a later delta into this one. Offsets accumulate; every other
    /// field is last-write-wins.
    pub fn merge(&mut self, later: EffectDelta) {
        self.offset += later.offset;
        if later.opacity.is_some() {
            self.opacity = later.opacity;
        }
        if later.scale.is_some() {
            self.scale = later.scale;
        }
        if later.rotation.is_some() {
            self.rotation = later.rotation;
        }
        if later.clip.is_some() {
            self.clip = later.clip;
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// What a transition effect needs to know besides progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectContext {
    pub boundary: Boundary,
    pub direction: Direction,
    /// Transition duration in seconds
    pub duration: f64,
    /// Canvas size in pixels
    pub canvas: Vec2,
}

impl EffectContext {
    pub fn for_transition(transition: &Transition, canvas: Vec2) -> Self {
        Self {
            boundary: transition.boundary,
            direction: transition.direction,
            duration: transition.duration,
            canvas,
        }
    }
}

/// A transition type's mapping from progress to an effect delta.
pub trait TransitionEffect: Send + Sync {
    fn kind(&self) -> TransitionKind;

    /// Delta for an incoming (start-edge) transition at progress `p`.
    fn incoming(&self, ctx: &EffectContext, p: f32) -> EffectDelta;

    /// Delta for an outgoing (end-edge) transition. Mirrors `incoming`
    /// unless overridden.
    fn outgoing(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        self.incoming(ctx, 1.0 - p)
    }

    fn evaluate(&self, ctx: &EffectContext, p: f32) -> EffectDelta {
        let p = p.clamp(0.0, 1.0);
        match ctx.boundary {
            Boundary::Start => self.incoming(ctx, p),
            Boundary::End => self.outgoing(ctx, p),
        }
    }
}

/// Registry of transition effects, one per kind.
pub struct TransitionRegistry {
    effects: Vec<Box<dyn TransitionEffect>>,
}

impl TransitionRegistry {
    /// Create a registry with all built-in transitions.
    pub fn new() -> Self {
        let mut reg = Self {
            effects: Vec::new(),
        };
        reg.register(Box::new(super::transitions::Fade));
        reg.register(Box::new(super::transitions::Slide));
        reg.register(Box::new(super::transitions::Push));
        reg.register(Box::new(super::transitions::Wipe));
        reg.register(Box::new(super::transitions::Zoom));
        reg.register(Box::new(super::transitions::Rotate));
        reg
    }

    /// Register an effect, replacing any effect of the same kind.
    pub fn register(&mut self, effect: Box<dyn TransitionEffect>) {
        self.effects.retain(|e| e.kind() != effect.kind());
        self.effects.push(effect);
    }

    pub fn find(&self, kind: TransitionKind) -> Option<&dyn TransitionEffect> {
        self.effects
            .iter()
            .find(|e| e.kind() == kind)
            .map(|e| e.as_ref())
    }

    pub fn kinds(&self) -> Vec<TransitionKind> {
        self.effects.iter().map(|e| e.kind()).collect()
    }
}

impl Default for TransitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Combined delta of every transition active at `time`, in the given order.
pub fn evaluate_transitions<'a>(
    registry: &TransitionRegistry,
    transitions: impl IntoIterator<Item = &'a Transition>,
    time: f64,
    canvas: Vec2,
) -> EffectDelta {
    let mut delta = EffectDelta::default();
    for transition in transitions.into_iter().filter(|t| t.is_active(time)) {
        let Some(effect) = registry.find(transition.kind) else {
            tracing::warn!(kind = %transition.kind, "No effect registered for transition");
            continue;
        };
        let ctx = EffectContext::for_transition(transition, canvas);
        delta.merge(effect.evaluate(&ctx, transition.progress(time) as f32));
    }
    delta
}

/// Linear interpolation that hits both endpoints exactly.
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Unit vector pointing at the canvas edge named by `direction`, in canvas
/// coordinates with y growing downwards. Zero for `in`/`out`.
pub(crate) fn edge_vector(direction: Direction) -> Vec2 {
    match direction {
        Direction::Left => Vec2::new(-1.0, 0.0),
        Direction::Right => Vec2::new(1.0, 0.0),
        Direction::Top => Vec2::new(0.0, -1.0),
        Direction::Bottom => Vec2::new(0.0, 1.0),
        Direction::In | Direction::Out => Vec2::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_timeline::{LayerIndex, Segment};

    const CANVAS: Vec2 = Vec2::new(1920.0, 1080.0);

    fn fade_in_at_ten() -> Transition {
        let seg = Segment::image("a.png", LayerIndex::visual(0), 10.0, 5.0, (100, 100));
        Transition::anchored(&seg, Boundary::Start, TransitionKind::Fade, 2.0, None).unwrap()
    }

    #[test]
    fn test_registry_has_builtins() {
        let reg = TransitionRegistry::new();
        for kind in TransitionKind::ALL {
            assert!(reg.find(kind).is_some(), "missing {kind}");
        }
        assert_eq!(reg.kinds().len(), 6);
    }

    #[test]
    fn test_fade_in_progress() {
        let reg = TransitionRegistry::new();
        let t = fade_in_at_ten();
        let at = |time| evaluate_transitions(&reg, [&t], time, CANVAS).opacity;
        assert_eq!(at(10.0), Some(0.0));
        assert_eq!(at(11.0), Some(0.5));
        assert_eq!(at(12.0), Some(1.0));
        assert_eq!(at(12.5), None);
    }

    #[test]
    fn test_merge_accumulates_offsets() {
        let mut a = EffectDelta {
            offset: Vec2::new(10.0, 0.0),
            opacity: Some(0.2),
            ..Default::default()
        };
        a.merge(EffectDelta {
            offset: Vec2::new(5.0, 3.0),
            opacity: Some(0.7),
            scale: Some(1.5),
            ..Default::default()
        });
        assert_eq!(a.offset, Vec2::new(15.0, 3.0));
        assert_eq!(a.opacity, Some(0.7));
        assert_eq!(a.scale, Some(1.5));
        assert!(a.rotation.is_none());
    }

    #[test]
    fn test_inactive_transitions_are_identity() {
        let reg = TransitionRegistry::new();
        let t = fade_in_at_ten();
        assert!(evaluate_transitions(&reg, [&t], 3.0, CANVAS).is_identity());
    }
}
