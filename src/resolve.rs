use crate::{
    align::normalize_token,
    core::{Fps, Transform2D, Vec2},
    ease::{Ease, spring_progress},
    model::AnimationBlock,
};

/// Instantaneous visual state of one animated block. Recomputed every frame,
/// never cached.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RenderState {
    pub visible: bool,
    pub opacity: f64,
    pub transform: Transform2D,
}

impl RenderState {
    pub fn settled() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
            transform: Transform2D::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimKind {
    #[default]
    None,
    Fade,
    SlideFromLeft,
    SlideFromRight,
    SlideFromTop,
    SlideFromBottom,
    Scale,
}

impl AnimKind {
    /// Resolve a legacy tag (`fadeIn`, `slideInLeft`, `scale_in`, ...) to a
    /// canonical kind. Unknown tags fall back to `None`.
    pub fn from_alias(raw: &str) -> Self {
        match normalize_token(raw).as_str() {
            "fade" | "fadein" => Self::Fade,
            "slideinleft" | "slidefromleft" => Self::SlideFromLeft,
            "slideinright" | "slidefromright" => Self::SlideFromRight,
            "slideintop" | "slidefromtop" | "slideindown" => Self::SlideFromTop,
            "slideinbottom" | "slidefrombottom" | "slideinup" => Self::SlideFromBottom,
            "scale" | "scalein" => Self::Scale,
            _ => Self::None,
        }
    }

    /// Pose before the animation has started. Translations are fractions of
    /// the block's own size.
    fn initial_pose(self) -> Transform2D {
        match self {
            Self::SlideFromLeft => translated(-1.0, 0.0),
            Self::SlideFromRight => translated(1.0, 0.0),
            Self::SlideFromTop => translated(0.0, -1.0),
            Self::SlideFromBottom => translated(0.0, 1.0),
            Self::Scale => scaled(0.8),
            Self::Fade | Self::None => Transform2D::default(),
        }
    }

    fn pose_at(self, progress: f64) -> Transform2D {
        let inverse = 1.0 - progress;
        match self {
            Self::SlideFromLeft => translated(-inverse, 0.0),
            Self::SlideFromRight => translated(inverse, 0.0),
            Self::SlideFromTop => translated(0.0, -inverse),
            Self::SlideFromBottom => translated(0.0, inverse),
            Self::Scale => scaled(0.8 + 0.2 * progress),
            Self::Fade | Self::None => Transform2D::default(),
        }
    }
}

fn translated(x: f64, y: f64) -> Transform2D {
    Transform2D {
        translate: Vec2::new(x, y),
        ..Transform2D::default()
    }
}

fn scaled(s: f64) -> Transform2D {
    Transform2D {
        scale: Vec2::new(s, s),
        ..Transform2D::default()
    }
}

/// Canonical kind of a block: explicit `animationType` wins, then the legacy
/// `type` tag, then `None`.
pub fn block_kind(block: &AnimationBlock) -> AnimKind {
    block.animation_type.unwrap_or_else(|| {
        block
            .raw_type
            .as_deref()
            .map(AnimKind::from_alias)
            .unwrap_or_default()
    })
}

/// Resolve the visual state of `block` at a global `frame`.
///
/// `child_index` offsets staggered group members. Purely functional: no
/// clock, no allocation beyond the returned value, safe to call from any
/// number of render workers at once.
pub fn resolve(
    block: Option<&AnimationBlock>,
    frame: u64,
    child_index: Option<usize>,
    fps: Fps,
) -> RenderState {
    let Some(block) = block else {
        return RenderState::settled();
    };

    let kind = block_kind(block);
    let stagger = block.stagger.unwrap_or(0);
    let effective_start = block.start_frame
        + block.delay.unwrap_or(0)
        + child_index.map_or(0, |i| i as u64 * stagger);

    if frame < effective_start {
        return RenderState {
            visible: false,
            opacity: 0.0,
            transform: kind.initial_pose(),
        };
    }

    if frame >= effective_start + block.duration_frames {
        return RenderState::settled();
    }

    let local = frame - effective_start;
    let linear = (local as f64 / block.duration_frames as f64).clamp(0.0, 1.0);
    let easing = block.easing.unwrap_or_default();
    let use_spring = block.use_spring.unwrap_or(false) || easing == Ease::Spring;
    let eased = if use_spring {
        spring_progress(
            local,
            block.duration_frames,
            fps,
            block.spring_config.unwrap_or_default(),
        )
    } else {
        easing.apply(linear)
    };

    RenderState {
        visible: true,
        opacity: eased.clamp(0.0, 1.0),
        transform: kind.pose_at(eased),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fps() -> Fps {
        Fps::new(30, 1).unwrap()
    }

    fn block(kind: AnimKind) -> AnimationBlock {
        AnimationBlock {
            block_id: "b".to_string(),
            animation_type: Some(kind),
            raw_type: None,
            start_frame: 10,
            duration_frames: 20,
            delay: None,
            stagger: None,
            easing: Some(Ease::EaseOut),
            use_spring: None,
            spring_config: None,
        }
    }

    const ALL_KINDS: [AnimKind; 6] = [
        AnimKind::Fade,
        AnimKind::SlideFromLeft,
        AnimKind::SlideFromRight,
        AnimKind::SlideFromTop,
        AnimKind::SlideFromBottom,
        AnimKind::Scale,
    ];

    #[test]
    fn absent_block_is_fully_visible() {
        let state = resolve(None, 0, None, fps());
        assert!(state.visible);
        assert_eq!(state.opacity, 1.0);
        assert!(state.transform.is_identity());
    }

    #[test]
    fn boundary_exactness_for_all_kinds() {
        for kind in ALL_KINDS {
            let b = block(kind);
            let before = resolve(Some(&b), 9, None, fps());
            assert!(!before.visible);
            assert_eq!(before.opacity, 0.0, "{kind:?}");

            let done = resolve(Some(&b), 30, None, fps());
            assert!(done.visible);
            assert_eq!(done.opacity, 1.0, "{kind:?}");
            assert!(done.transform.is_identity(), "{kind:?}");
        }
    }

    #[test]
    fn monotonic_reveal_under_ease_out_and_linear() {
        for easing in [Ease::EaseOut, Ease::Linear] {
            let mut b = block(AnimKind::Fade);
            b.easing = Some(easing);
            let mut last = -1.0;
            for f in 10..30 {
                let state = resolve(Some(&b), f, None, fps());
                assert!(state.opacity >= last, "{easing:?} at frame {f}");
                last = state.opacity;
            }
        }
    }

    #[test]
    fn initial_pose_matches_kind() {
        let b = block(AnimKind::SlideFromLeft);
        let state = resolve(Some(&b), 0, None, fps());
        assert_eq!(state.transform.translate.x, -1.0);

        let b = block(AnimKind::Scale);
        let state = resolve(Some(&b), 0, None, fps());
        assert_eq!(state.transform.scale.x, 0.8);
    }

    #[test]
    fn midflight_pose_interpolates() {
        let mut b = block(AnimKind::SlideFromRight);
        b.easing = Some(Ease::Linear);
        // Halfway: progress 0.5, so half the displacement remains.
        let state = resolve(Some(&b), 20, None, fps());
        assert!((state.transform.translate.x - 0.5).abs() < 1e-9);
        assert!((state.opacity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn delay_and_stagger_shift_effective_start() {
        let mut b = block(AnimKind::Fade);
        b.delay = Some(5);
        b.stagger = Some(4);
        // Child 2: start 10 + delay 5 + 2*4 = 23.
        assert!(!resolve(Some(&b), 22, Some(2), fps()).visible);
        let state = resolve(Some(&b), 23, Some(2), fps());
        assert!(state.visible);
        assert_eq!(resolve(Some(&b), 43, Some(2), fps()).opacity, 1.0);
    }

    #[test]
    fn alias_table_resolves_legacy_tags() {
        assert_eq!(AnimKind::from_alias("fadeIn"), AnimKind::Fade);
        assert_eq!(AnimKind::from_alias("fade_in"), AnimKind::Fade);
        assert_eq!(AnimKind::from_alias("slideInLeft"), AnimKind::SlideFromLeft);
        assert_eq!(AnimKind::from_alias("slide_in_up"), AnimKind::SlideFromBottom);
        assert_eq!(AnimKind::from_alias("scaleIn"), AnimKind::Scale);
        assert_eq!(AnimKind::from_alias("counterAnimation"), AnimKind::None);
        assert_eq!(AnimKind::from_alias("brush_reveal"), AnimKind::None);
    }

    #[test]
    fn explicit_kind_wins_over_alias() {
        let mut b = block(AnimKind::Scale);
        b.raw_type = Some("slideInLeft".to_string());
        assert_eq!(block_kind(&b), AnimKind::Scale);

        b.animation_type = None;
        assert_eq!(block_kind(&b), AnimKind::SlideFromLeft);
    }

    #[test]
    fn spring_easing_routes_through_oscillator() {
        let mut b = block(AnimKind::Fade);
        b.easing = Some(Ease::Spring);
        let early = resolve(Some(&b), 11, None, fps());
        let later = resolve(Some(&b), 25, None, fps());
        assert!(early.opacity < later.opacity);
        assert!(later.opacity <= 1.0);
        // Same inputs, same output.
        assert_eq!(resolve(Some(&b), 25, None, fps()), later);
    }
}
