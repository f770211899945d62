use crate::{core::Fps, model::SlideType};

/// Every tunable the timeline builder and alignment engine read. Defaults are
/// the production constants; all of them can be overridden from a config
/// document without code changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fps: Fps,
    /// Fallback animation length when an event declares none.
    pub default_slide_duration_sec: f64,
    /// Safety window appended after narration for non-feedback slides.
    pub buffer_frames: u64,
    /// Small tail after a feedback slide's choreography ends.
    pub feedback_end_buffer: u64,
    /// Hard cap on feedback slides; unexpectedly long narration must not run
    /// the timeline away.
    pub feedback_cap_frames: u64,
    pub narration_start: NarrationStartOffsets,
    /// Floor for the introductory slide so its settle/exit completes before
    /// the next slide begins.
    pub min_intro_frames: u64,
    pub transition_frames: u64,
    /// Trailing breathing room after each narration ends.
    pub breathing_pause: u64,
    pub case_extra_pause: u64,
    /// Cushion after a feedback slide before the closing table slide.
    pub feedback_tail_pause: u64,
    pub align: AlignConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let fps = Fps { num: 30, den: 1 };
        Self {
            fps,
            default_slide_duration_sec: 6.0,
            buffer_frames: 45,
            feedback_end_buffer: 12,
            feedback_cap_frames: 6000,
            narration_start: NarrationStartOffsets::default(),
            min_intro_frames: 320,
            transition_frames: 36,
            breathing_pause: 6,
            case_extra_pause: 20,
            feedback_tail_pause: u64::from(fps.num / fps.den), // one second
            align: AlignConfig::default(),
        }
    }
}

/// Per-slide-type frame offsets delaying narration past block entrances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NarrationStartOffsets {
    pub intro: u64,
    pub case: u64,
    pub q_summary: u64,
    pub feedback_blocks: u64,
    pub thinking_steps: u64,
}

impl Default for NarrationStartOffsets {
    fn default() -> Self {
        Self {
            intro: 80,
            case: 80,
            q_summary: 60,
            feedback_blocks: 30,
            thinking_steps: 24,
        }
    }
}

impl NarrationStartOffsets {
    pub fn for_slide(&self, slide_type: SlideType) -> u64 {
        match slide_type {
            SlideType::Intro => self.intro,
            SlideType::Case => self.case,
            SlideType::QSummary => self.q_summary,
            SlideType::FeedbackBlocks => self.feedback_blocks,
            SlideType::ThinkingSteps => self.thinking_steps,
        }
    }
}

/// Constants of the narration alignment heuristics, centralized. The source
/// behavior used slightly different leads/gaps per call site; one named
/// default per knob is kept here instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Segments end this many frames before the next item's anchor.
    pub lead_buffer_frames: u64,
    /// Floor on every segment's length.
    pub min_segment_frames: u64,
    /// Floor on the final segment past its anchor when no window end exists.
    pub last_segment_min_frames: u64,
    /// Synthetic per-item slot when a highlight window has no declared end.
    pub fallback_slot_frames: u64,
    /// How far before the block's declared start ordinal cues may be picked up.
    pub ordinal_lookback_frames: u64,
    /// Non-matching tokens tolerated between phrase words before a candidate
    /// match is abandoned.
    pub max_token_gap: usize,
    /// Opacity ramp for newly revealed list items.
    pub item_fade_frames: u64,
    /// Back-off applied to phrase-cued block entrances.
    pub entrance_lead_frames: u64,
    /// Leading-word anchors prefer the item's first token at least this long.
    pub anchor_token_min_len: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            lead_buffer_frames: 2,
            min_segment_frames: 6,
            last_segment_min_frames: 12,
            fallback_slot_frames: 30,
            ordinal_lookback_frames: 72,
            max_token_gap: 3,
            item_fade_frames: 6,
            entrance_lead_frames: 6,
            anchor_token_min_len: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.fps.as_f64(), 30.0);
        assert_eq!(cfg.buffer_frames, 45);
        assert_eq!(cfg.feedback_end_buffer, 12);
        assert_eq!(cfg.feedback_cap_frames, 6000);
        assert_eq!(cfg.min_intro_frames, 320);
        assert_eq!(cfg.transition_frames, 36);
        assert_eq!(cfg.feedback_tail_pause, 30);
        assert_eq!(cfg.narration_start.for_slide(SlideType::Intro), 80);
        assert_eq!(cfg.narration_start.for_slide(SlideType::ThinkingSteps), 24);
        assert_eq!(cfg.align.lead_buffer_frames, 2);
        assert_eq!(cfg.align.min_segment_frames, 6);
        assert_eq!(cfg.align.max_token_gap, 3);
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"buffer_frames": 20, "align": {"lead_buffer_frames": 4}}"#)
                .unwrap();
        assert_eq!(cfg.buffer_frames, 20);
        assert_eq!(cfg.align.lead_buffer_frames, 4);
        assert_eq!(cfg.feedback_cap_frames, 6000);
        assert_eq!(cfg.align.min_segment_frames, 6);
    }
}
