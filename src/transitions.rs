use crate::{ease::Ease, model::SlideType};

/// Directive attached between two adjacent scheduled slides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    /// Cross-fade with a gentle scale, for slide pairs sharing visual
    /// elements.
    Morph,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TransitionDirective {
    pub kind: TransitionKind,
    pub duration_frames: u64,
}

/// Only the overview slide flowing into the question summary morphs; every
/// other adjacency is a hard cut.
pub fn should_transition(prev: SlideType, next: SlideType) -> bool {
    prev == SlideType::Case && next == SlideType::QSummary
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionDirection {
    Entering,
    Exiting,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct MorphState {
    pub opacity: f64,
    pub scale: f64,
}

/// Visual state of one side of a morph at `progress` through the transition
/// window. The entering slide fades up over the first 40% and settles its
/// scale over the first half; the exiting slide holds until halfway, then
/// fades and drifts slightly past full scale.
pub fn morph_progress(progress: f64, direction: TransitionDirection) -> MorphState {
    let p = progress.clamp(0.0, 1.0);
    match direction {
        TransitionDirection::Entering => {
            let fade = Ease::EaseOut.apply((p / 0.4).clamp(0.0, 1.0));
            let settle = Ease::EaseOut.apply((p / 0.5).clamp(0.0, 1.0));
            MorphState {
                opacity: fade,
                scale: 0.98 + 0.02 * settle,
            }
        }
        TransitionDirection::Exiting => {
            let t = Ease::EaseInOut.apply(((p - 0.5) / 0.5).clamp(0.0, 1.0));
            MorphState {
                opacity: 1.0 - t,
                scale: 1.0 + 0.02 * t,
            }
        }
    }
}
