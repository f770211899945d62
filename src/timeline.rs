//! Timeline construction: folds manifest events into ordered slide groups,
//! sizes each one from narration length and declared choreography, then
//! schedules the sequence with pauses and transition directives.
//!
//! Runs once per video, synchronously, before any frame is rendered. All
//! degradation is local to a slide; nothing here is fatal.

use std::collections::BTreeMap;

use crate::{
    config::EngineConfig,
    context::SessionContext,
    loader::{AudioTimingProvider as _, ChoreographyProvider as _, choreography_key},
    model::{ManifestEvent, SlideType},
    transitions::{TransitionDirective, TransitionKind, should_transition},
};

/// Placeholder the rendering host must present instead of a silent black
/// video when the manifest is empty.
pub const NO_CONTENT_NOTICE: &str =
    "No narration manifest found. Run the content pipeline before rendering.";

/// One visually distinct slide: all events sharing (question, type, index),
/// with the duration already resolved against narration and choreography.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SlideGroup {
    pub id: String,
    pub slide_type: SlideType,
    pub question_id: String,
    pub question_number: u32,
    pub slide_index: u32,
    pub events: Vec<ManifestEvent>,
    pub duration_frames: u64,
}

/// A slide group placed on the master timeline.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ScheduledSlide {
    #[serde(flatten)]
    pub group: SlideGroup,
    /// Group duration plus trailing breathing room, after floors and caps.
    pub padded_duration_frames: u64,
    pub start_frame: u64,
    /// Directive into the next slide; transitions overlap both neighbors.
    pub transition_after: Option<TransitionDirective>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct Timeline {
    pub slides: Vec<ScheduledSlide>,
    pub total_frames: u64,
}

impl Timeline {
    pub fn empty() -> Self {
        Self {
            slides: Vec::new(),
            total_frames: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

pub struct TimelineBuilder<'a> {
    ctx: &'a SessionContext,
    config: &'a EngineConfig,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(ctx: &'a SessionContext, config: &'a EngineConfig) -> Self {
        Self { ctx, config }
    }

    /// Deterministic: identical inputs always produce an identical timeline.
    #[tracing::instrument(skip_all, fields(events = self.ctx.events.len()))]
    pub fn build(&self) -> Timeline {
        let groups = self.fold_groups();
        if groups.is_empty() {
            tracing::info!("empty manifest, emitting no-content timeline");
            return Timeline::empty();
        }
        self.schedule(groups)
    }

    /// Fold events into groups keyed by (question, slide type, slide index).
    /// A group's duration is the max over its folded events and never shrinks.
    fn fold_groups(&self) -> Vec<SlideGroup> {
        let mut groups: BTreeMap<(String, SlideType, u32), SlideGroup> = BTreeMap::new();

        for event in &self.ctx.events {
            if event.slide_type.requires_question()
                && self.ctx.content.question(&event.question_id).is_none()
            {
                tracing::warn!(
                    question_id = %event.question_id,
                    slide_type = ?event.slide_type,
                    "dropping slide with no matching question content"
                );
                continue;
            }

            let duration = self.event_duration(event);
            let key = (
                event.question_id.clone(),
                event.slide_type,
                event.slide_index,
            );
            groups
                .entry(key)
                .and_modify(|g| {
                    g.events.push(event.clone());
                    g.duration_frames = g.duration_frames.max(duration);
                })
                .or_insert_with(|| SlideGroup {
                    id: format!(
                        "{}-{}-{}",
                        event.question_id,
                        event.slide_type.tag(),
                        event.slide_index
                    ),
                    slide_type: event.slide_type,
                    question_id: event.question_id.clone(),
                    question_number: event.question_number,
                    slide_index: event.slide_index,
                    events: vec![event.clone()],
                    duration_frames: duration,
                });
        }

        let mut ordered: Vec<SlideGroup> = groups.into_values().collect();
        ordered.sort_by_key(|g| g.slide_index);
        ordered
    }

    /// Candidate duration of one event: enough room for narration plus a
    /// buffer, honoring declared choreography, with the feedback cap.
    fn event_duration(&self, event: &ManifestEvent) -> u64 {
        let cfg = self.config;
        let fps = cfg.fps;
        let is_feedback = event.slide_type == SlideType::FeedbackBlocks;

        let choreo = self
            .ctx
            .choreographies
            .choreography(&choreography_key(event.slide_type, &event.question_id));
        let choreo_duration = choreo.map_or(0, |c| c.total_duration_frames);
        let choreo_narr_start = choreo
            .and_then(|c| c.narration.as_ref())
            .map_or(0, |n| n.start_frame);

        let narration_frames = match &event.narration {
            Some(narration) => match self.ctx.timings.timing(&narration.audio_file) {
                Some(timing) => fps.secs_to_frames_round(timing.duration_sec),
                None => {
                    tracing::debug!(
                        audio_file = %narration.audio_file,
                        "no timing for narration audio, using zero-length window"
                    );
                    0
                }
            },
            None => 0,
        };

        let narration_start = if choreo_narr_start > 0 {
            choreo_narr_start
        } else {
            cfg.narration_start.for_slide(event.slide_type)
        };
        let narration_total = narration_start + narration_frames;

        let anim_sec = event.animation.delay_sec.unwrap_or(0.0)
            + event
                .animation
                .duration_sec
                .unwrap_or(cfg.default_slide_duration_sec);
        let anim_frames = fps.secs_to_frames_round(anim_sec);

        let buffer = if is_feedback {
            cfg.feedback_end_buffer
        } else {
            cfg.buffer_frames
        };

        // Feedback slides trust their choreography: audio timings that run
        // past the visual script must not over-pad the slide.
        let candidate = if is_feedback && choreo_duration > 0 {
            choreo_duration + cfg.feedback_end_buffer
        } else {
            let declared = if choreo_duration > 0 {
                choreo_duration
            } else {
                anim_frames
            };
            declared.max(narration_total + buffer)
        };

        if is_feedback {
            candidate.min(cfg.feedback_cap_frames)
        } else {
            candidate
        }
    }

    /// Place the ordered groups: apply the intro floor and trailing pauses,
    /// decide transitions, and accumulate start frames (transitions overlap
    /// the adjoining slides).
    fn schedule(&self, groups: Vec<SlideGroup>) -> Timeline {
        let cfg = self.config;
        let mut slides = Vec::with_capacity(groups.len());
        let mut cursor = 0u64;

        for (index, group) in groups.iter().enumerate() {
            let base = if group.slide_type == SlideType::Intro {
                group.duration_frames.max(cfg.min_intro_frames)
            } else {
                group.duration_frames
            };

            let is_feedback = group.slide_type == SlideType::FeedbackBlocks;
            let pause = if is_feedback {
                cfg.feedback_tail_pause
            } else {
                cfg.breathing_pause
                    + if group.slide_type == SlideType::Case {
                        cfg.case_extra_pause
                    } else {
                        0
                    }
            };
            let mut padded = base + pause;
            if is_feedback {
                padded = padded.min(cfg.feedback_cap_frames);
            }

            let transition_after = groups.get(index + 1).and_then(|next| {
                should_transition(group.slide_type, next.slide_type).then_some(
                    TransitionDirective {
                        kind: TransitionKind::Morph,
                        duration_frames: cfg.transition_frames,
                    },
                )
            });

            let start_frame = cursor;
            let overlap = transition_after.map_or(0, |t| t.duration_frames.min(padded));
            cursor = start_frame + padded - overlap;

            slides.push(ScheduledSlide {
                group: group.clone(),
                padded_duration_frames: padded,
                start_frame,
                transition_after,
            });
        }

        let total_frames = slides
            .last()
            .map_or(0, |s| s.start_frame + s.padded_duration_frames);

        Timeline {
            slides,
            total_frames,
        }
    }
}
