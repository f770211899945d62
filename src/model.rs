use crate::{
    ease::{Ease, SpringParams},
    error::{CuelineError, CuelineResult},
    resolve::AnimKind,
};

/// One narrated beat of the source session, as emitted by the manifest
/// pipeline. Immutable once loaded.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ManifestEvent {
    pub question_id: String,
    pub question_number: u32,
    pub slide_type: SlideType,
    pub slide_index: u32,
    #[serde(default)]
    pub anim_num: u32,
    #[serde(default)]
    pub shape_id: String,
    pub animation: AnimationSpec,
    #[serde(default)]
    pub narration: Option<NarrationSpec>,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    Intro,
    Case,
    QSummary,
    FeedbackBlocks,
    ThinkingSteps,
}

impl SlideType {
    /// Question-scoped slides need a matching content record to render.
    pub fn requires_question(self) -> bool {
        matches!(
            self,
            Self::QSummary | Self::FeedbackBlocks | Self::ThinkingSteps
        )
    }

    /// The manifest's tag for this slide type.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Case => "case",
            Self::QSummary => "q_summary",
            Self::FeedbackBlocks => "feedback_blocks",
            Self::ThinkingSteps => "thinking_steps",
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimationSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub delay_sec: Option<f64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum KeywordSpec {
    Plain(String),
    Weighted {
        text: String,
        #[serde(default)]
        importance: Option<serde_json::Value>,
    },
}

impl KeywordSpec {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Weighted { text, .. } => text,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NarrationSpec {
    pub text: String,
    pub audio_file: String,
    #[serde(default)]
    pub voice_style: Option<serde_json::Value>,
    #[serde(default)]
    pub keywords: Vec<KeywordSpec>,
}

/// Word-level transcript timestamps in seconds, supplied per audio file.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTiming {
    // Timing documents keep this one field in snake_case.
    #[serde(default, rename = "audio_file")]
    pub audio_file: String,
    pub duration_sec: f64,
    #[serde(default)]
    pub words: Vec<WordTiming>,
}

impl AudioTiming {
    pub fn validate(&self) -> CuelineResult<()> {
        if self.duration_sec < 0.0 {
            return Err(CuelineError::validation("audio duration_sec must be >= 0"));
        }
        if !self.words.windows(2).all(|w| w[0].start <= w[1].start) {
            return Err(CuelineError::validation(
                "word timings must be non-decreasing in start time",
            ));
        }
        Ok(())
    }
}

/// Word timestamps already converted to frames, as authored in choreography
/// documents.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFrame {
    pub word: String,
    pub start_frame: u64,
    pub end_frame: u64,
    #[serde(default)]
    pub duration_frames: Option<u64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationConfig {
    pub audio_file: String,
    #[serde(default)]
    pub start_frame: u64,
    #[serde(default)]
    pub duration_sec: f64,
    #[serde(default)]
    pub end_frame: Option<u64>,
    #[serde(default)]
    pub word_timings: Vec<WordFrame>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationBlock {
    pub block_id: String,
    /// Canonical animation kind; takes precedence over the legacy `type` tag.
    #[serde(default)]
    pub animation_type: Option<AnimKind>,
    /// Legacy alias tag (`fadeIn`, `slideInLeft`, ...), resolved through
    /// [`AnimKind::from_alias`].
    #[serde(default, rename = "type")]
    pub raw_type: Option<String>,
    pub start_frame: u64,
    pub duration_frames: u64,
    #[serde(default)]
    pub delay: Option<u64>,
    #[serde(default)]
    pub stagger: Option<u64>,
    #[serde(default)]
    pub easing: Option<Ease>,
    #[serde(default)]
    pub use_spring: Option<bool>,
    #[serde(default)]
    pub spring_config: Option<SpringParams>,
}

impl AnimationBlock {
    pub fn validate(&self) -> CuelineResult<()> {
        if self.block_id.trim().is_empty() {
            return Err(CuelineError::validation(
                "animation blockId must be non-empty",
            ));
        }
        if self.duration_frames == 0 {
            return Err(CuelineError::validation(format!(
                "animation block '{}' durationFrames must be > 0",
                self.block_id
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightSegment {
    #[serde(default)]
    pub text: Option<String>,
    pub start_frame: u64,
    pub end_frame: u64,
}

/// Frame window during which a content block is actively narrated.
/// Malformed windows degrade through the alignment fallback chain instead of
/// failing validation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHighlight {
    pub block_id: String,
    #[serde(default)]
    pub start_frame: u64,
    /// Absent or inverted ends degrade to a synthesized window end.
    #[serde(default)]
    pub end_frame: Option<u64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub segments: Option<Vec<HighlightSegment>>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub target_block_id: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Declarative per-slide timing document, authored independently of slide
/// content.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideChoreography {
    pub slide_id: String,
    #[serde(default)]
    pub slide_type: String,
    #[serde(default)]
    pub total_duration_frames: u64,
    #[serde(default)]
    pub narration: Option<NarrationConfig>,
    #[serde(default)]
    pub animations: Vec<AnimationBlock>,
    #[serde(default)]
    pub highlighting: Option<HighlightConfig>,
    #[serde(default)]
    pub highlights: Vec<BlockHighlight>,
}

impl SlideChoreography {
    pub fn validate(&self) -> CuelineResult<()> {
        if self.slide_id.trim().is_empty() {
            return Err(CuelineError::validation(
                "choreography slideId must be non-empty",
            ));
        }
        for block in &self.animations {
            block.validate()?;
        }
        Ok(())
    }

    pub fn animation(&self, block_id: &str) -> Option<&AnimationBlock> {
        self.animations.iter().find(|b| b.block_id == block_id)
    }

    pub fn highlight(&self, block_id: &str) -> Option<&BlockHighlight> {
        self.highlights.iter().find(|h| h.block_id == block_id)
    }
}

/// Session content keyed by question id, supplied by the content loader.
/// Fields the engine never reads stay as raw JSON values.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SessionContent {
    #[serde(default)]
    pub case_title: String,
    #[serde(default)]
    pub intro: Option<serde_json::Value>,
    #[serde(default)]
    pub questions: Vec<QuestionContent>,
}

impl SessionContent {
    pub fn question(&self, question_id: &str) -> Option<&QuestionContent> {
        self.questions
            .iter()
            .find(|q| q.question_id == question_id)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct QuestionContent {
    pub question_id: String,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub what_went_right: Vec<String>,
    #[serde(default)]
    pub what_went_wrong: Vec<String>,
    #[serde(default)]
    pub thinking_steps: Option<ThinkingSteps>,
}

/// Thinking-step tables come in two shapes: column-wise lists (current
/// backend output) and the older row-wise form.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ThinkingSteps {
    Rows(Vec<ThinkingStepRow>),
    Columns {
        #[serde(default)]
        steps: Vec<String>,
        #[serde(default)]
        how_you_thought: Vec<String>,
        #[serde(default)]
        thinking_advice: Vec<String>,
    },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ThinkingStepRow {
    pub step_title: String,
    #[serde(default)]
    pub your_approach: String,
    #[serde(default)]
    pub ideal: String,
}

impl ThinkingSteps {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Columns {
                steps,
                how_you_thought,
                thinking_advice,
            } => steps
                .len()
                .max(how_you_thought.len())
                .max(thinking_advice.len()),
        }
    }

    pub fn step_titles(&self) -> Vec<String> {
        match self {
            Self::Rows(rows) => rows.iter().map(|r| r.step_title.clone()).collect(),
            Self::Columns { steps, .. } => steps.clone(),
        }
    }

    pub fn approaches(&self) -> Vec<String> {
        match self {
            Self::Rows(rows) => rows.iter().map(|r| r.your_approach.clone()).collect(),
            Self::Columns {
                how_you_thought, ..
            } => how_you_thought.clone(),
        }
    }

    pub fn advice(&self) -> Vec<String> {
        match self {
            Self::Rows(rows) => rows.iter().map(|r| r.ideal.clone()).collect(),
            Self::Columns {
                thinking_advice, ..
            } => thinking_advice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_choreography() -> SlideChoreography {
        SlideChoreography {
            slide_id: "q1_feedback".to_string(),
            slide_type: "feedback_blocks".to_string(),
            total_duration_frames: 900,
            narration: Some(NarrationConfig {
                audio_file: "q1_feedback.mp3".to_string(),
                start_frame: 30,
                duration_sec: 28.5,
                end_frame: None,
                word_timings: vec![WordFrame {
                    word: "First".to_string(),
                    start_frame: 40,
                    end_frame: 52,
                    duration_frames: Some(12),
                }],
            }),
            animations: vec![AnimationBlock {
                block_id: "right_box".to_string(),
                animation_type: Some(AnimKind::SlideFromLeft),
                raw_type: None,
                start_frame: 10,
                duration_frames: 14,
                delay: None,
                stagger: None,
                easing: Some(Ease::EaseOut),
                use_spring: None,
                spring_config: None,
            }],
            highlighting: None,
            highlights: vec![BlockHighlight {
                block_id: "right_box".to_string(),
                start_frame: 30,
                end_frame: Some(420),
                color: None,
                segments: None,
            }],
        }
    }

    #[test]
    fn json_roundtrip_uses_document_field_names() {
        let choreo = basic_choreography();
        let s = serde_json::to_string_pretty(&choreo).unwrap();
        assert!(s.contains("\"slideId\""));
        assert!(s.contains("\"totalDurationFrames\""));
        assert!(s.contains("\"wordTimings\""));
        let de: SlideChoreography = serde_json::from_str(&s).unwrap();
        assert_eq!(de.animations.len(), 1);
        assert_eq!(de.highlights.len(), 1);
    }

    #[test]
    fn validate_rejects_zero_duration_block() {
        let mut choreo = basic_choreography();
        choreo.animations[0].duration_frames = 0;
        assert!(choreo.validate().is_err());
    }

    #[test]
    fn legacy_type_tag_deserializes() {
        let s = r#"{
            "blockId": "hero",
            "type": "fadeIn",
            "startFrame": 0,
            "durationFrames": 20
        }"#;
        let block: AnimationBlock = serde_json::from_str(s).unwrap();
        assert_eq!(block.raw_type.as_deref(), Some("fadeIn"));
        assert!(block.animation_type.is_none());
    }

    #[test]
    fn keyword_spec_accepts_both_shapes() {
        let plain: KeywordSpec = serde_json::from_str("\"revenue\"").unwrap();
        assert_eq!(plain.text(), "revenue");
        let weighted: KeywordSpec =
            serde_json::from_str(r#"{"text": "margin", "importance": "high"}"#).unwrap();
        assert_eq!(weighted.text(), "margin");
    }

    #[test]
    fn audio_timing_validates_word_order() {
        let bad = AudioTiming {
            audio_file: "a.mp3".to_string(),
            duration_sec: 3.0,
            words: vec![
                WordTiming {
                    text: "b".to_string(),
                    start: 2.0,
                    end: 2.5,
                },
                WordTiming {
                    text: "a".to_string(),
                    start: 1.0,
                    end: 1.5,
                },
            ],
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn thinking_steps_column_and_row_forms() {
        let cols: ThinkingSteps = serde_json::from_str(
            r#"{"steps": ["A", "B"], "how_you_thought": ["x"], "thinking_advice": ["y", "z", "w"]}"#,
        )
        .unwrap();
        assert_eq!(cols.row_count(), 3);
        assert_eq!(cols.step_titles(), vec!["A", "B"]);

        let rows: ThinkingSteps = serde_json::from_str(
            r#"[{"step_title": "A", "your_approach": "x", "ideal": "y"}]"#,
        )
        .unwrap();
        assert_eq!(rows.row_count(), 1);
        assert_eq!(rows.advice(), vec!["y"]);
    }

    #[test]
    fn manifest_event_parses_snake_case() {
        let s = r#"{
            "question_id": "q1",
            "question_number": 1,
            "slide_type": "feedback_blocks",
            "slide_index": 3,
            "anim_num": 0,
            "shape_id": "s1",
            "animation": { "type": "fade_in", "duration_sec": 4.0 },
            "narration": {
                "text": "First, the structure was sound.",
                "audio_file": "q1_feedback.mp3",
                "keywords": ["structure", {"text": "sound"}]
            }
        }"#;
        let event: ManifestEvent = serde_json::from_str(s).unwrap();
        assert_eq!(event.slide_type, SlideType::FeedbackBlocks);
        assert_eq!(event.narration.as_ref().unwrap().keywords.len(), 2);
    }
}
