//! Per-frame emphasis state for narrated text: which spoken word is live,
//! which list items are revealed and actively highlighted. All pure functions
//! of (loaded data, frame); recomputed every frame and discarded.

use crate::{
    align::{Segment, normalize_token},
    config::AlignConfig,
    core::{Fps, FrameIndex, FrameRange},
    model::{AudioTiming, BlockHighlight, KeywordSpec},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct WordHighlight {
    pub text: String,
    pub range: FrameRange,
    pub active: bool,
    pub keyword: bool,
}

/// Word-by-word emphasis flags for one narration track at `frame`.
/// A word is active from its start frame through its end frame inclusive.
pub fn word_highlights(
    timing: &AudioTiming,
    keywords: &[KeywordSpec],
    frame: u64,
    fps: Fps,
) -> Vec<WordHighlight> {
    let keyword_set: Vec<String> = keywords
        .iter()
        .map(|k| normalize_token(k.text()))
        .filter(|t| !t.is_empty())
        .collect();

    timing
        .words
        .iter()
        .map(|w| {
            let start = fps.secs_to_frames_round(w.start);
            let end = fps.secs_to_frames_round(w.end).max(start);
            WordHighlight {
                text: w.text.clone(),
                range: FrameRange {
                    start: FrameIndex(start),
                    end: FrameIndex(end),
                },
                active: start <= frame && frame <= end,
                keyword: keyword_set.contains(&normalize_token(&w.text)),
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ItemState {
    pub visible: bool,
    pub highlighted: bool,
    pub opacity: f64,
}

impl ItemState {
    fn hidden() -> Self {
        Self {
            visible: false,
            highlighted: false,
            opacity: 0.0,
        }
    }
}

/// Reveal/emphasis state of list item `index` at `frame`.
///
/// An item becomes visible once its own segment (or its predecessor's, so
/// items reveal one ahead of the narration) has started, gated by the
/// introduction of its column when `column_start` is set. It is highlighted
/// only while its own segment is live, and fades in over the configured ramp.
pub fn item_state(
    segments: &[Segment],
    index: usize,
    frame: u64,
    column_start: Option<u64>,
    cfg: &AlignConfig,
) -> ItemState {
    let Some(segment) = segments.get(index) else {
        return ItemState::hidden();
    };

    if let Some(gate) = column_start
        && frame < gate
    {
        return ItemState::hidden();
    }

    let appear = segment.range.start.0;
    let prev_started = index
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .is_some_and(|prev| frame >= prev.range.start.0);
    let visible = frame >= appear || prev_started;
    if !visible {
        return ItemState::hidden();
    }

    let highlighted = frame >= appear && frame < segment.range.end.0;
    let opacity = if cfg.item_fade_frames == 0 || frame >= appear + cfg.item_fade_frames {
        1.0
    } else {
        (frame.saturating_sub(appear) as f64 / cfg.item_fade_frames as f64).clamp(0.0, 1.0)
    };

    ItemState {
        visible,
        highlighted,
        opacity,
    }
}

/// Whether a block's highlight window is live at `frame`. A window with no
/// declared end stays active once entered.
pub fn block_active(highlight: &BlockHighlight, frame: u64) -> bool {
    frame >= highlight.start_frame && highlight.end_frame.is_none_or(|end| frame < end)
}
