//! Narration alignment: partitioning a block's highlight window into one
//! time segment per textual item, anchored to the spoken transcript when
//! possible.
//!
//! The fallback chain is fixed: explicit authored segments, then transcript
//! anchors (leading words, ordinal cues), then proportional slicing. A
//! missing or malformed transcript never fails a slide; the chain always
//! produces exactly one segment per item.

use crate::{
    config::AlignConfig,
    core::{FrameIndex, FrameRange},
    model::{BlockHighlight, WordFrame},
};

/// Sub-interval of a highlight window assigned to one list item or table
/// cell. Derived per frame set-up, holds no identity.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Segment {
    pub range: FrameRange,
    pub text: Option<String>,
}

impl Segment {
    fn new(start: u64, end: u64, text: Option<String>) -> Self {
        Self {
            // Inverted inputs collapse to zero length before flooring.
            range: FrameRange {
                start: FrameIndex(start),
                end: FrameIndex(end.max(start)),
            },
            text,
        }
    }
}

const ORDINAL_WORDS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "one", "two", "three", "four", "five",
];

/// Lowercase and strip everything outside `[a-z0-9]`; the comparison form for
/// all transcript matching.
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Partition the highlight window across `items`, one segment each.
///
/// Returns exactly `items.len()` segments, ordered, each at least
/// `min_segment_frames` long.
pub fn segments_for<S: AsRef<str>>(
    items: &[S],
    highlight: Option<&BlockHighlight>,
    transcript: &[WordFrame],
    cfg: &AlignConfig,
) -> Vec<Segment> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }

    let window = resolve_window(highlight, n, cfg);

    // Authored segments win when the count lines up; their ends are
    // authoritative, malformed ones collapse and get floored.
    if let Some(segments) = highlight.and_then(|h| h.segments.as_ref())
        && segments.len() == n
    {
        return segments
            .iter()
            .map(|s| {
                let seg = Segment::new(s.start_frame, s.end_frame, s.text.clone());
                floor_segment(seg, cfg.min_segment_frames)
            })
            .collect();
    }

    let fallback = proportional(window, n, cfg);

    let anchors = anchor_frames(items, transcript, window, cfg);
    if anchors.iter().all(Option::is_none) {
        return fallback;
    }

    let mut starts: Vec<u64> = (0..n)
        .map(|i| anchors[i].unwrap_or(fallback[i].range.start.0))
        .collect();
    // Anchors from mixed passes may land out of order; reveal order is
    // authoritative.
    for i in 1..n {
        starts[i] = starts[i].max(starts[i - 1]);
    }

    (0..n)
        .map(|i| {
            let start = starts[i];
            let end = if i + 1 < n {
                starts[i + 1]
                    .saturating_sub(cfg.lead_buffer_frames)
                    .max(start + cfg.min_segment_frames)
            } else {
                match window.declared_end {
                    Some(e) => e.max(start + cfg.min_segment_frames),
                    None => fallback[i]
                        .range
                        .end
                        .0
                        .max(start + cfg.last_segment_min_frames),
                }
            };
            Segment::new(start, end, None)
        })
        .collect()
}

#[derive(Clone, Copy, Debug)]
struct Window {
    start: u64,
    end: u64,
    declared_end: Option<u64>,
}

fn resolve_window(highlight: Option<&BlockHighlight>, n: usize, cfg: &AlignConfig) -> Window {
    let start = highlight.map_or(0, |h| h.start_frame);
    let declared_end = highlight
        .and_then(|h| h.end_frame)
        .filter(|&e| e >= start);
    let end = declared_end
        .unwrap_or_else(|| (start + n as u64 * cfg.fallback_slot_frames).max(start + 1));
    Window {
        start,
        end,
        declared_end,
    }
}

/// Equal slots over the window, rounded to frames.
fn proportional(window: Window, n: usize, cfg: &AlignConfig) -> Vec<Segment> {
    let slot = ((window.end - window.start) as f64 / n as f64).max(1.0);
    (0..n)
        .map(|i| {
            let start = (window.start as f64 + slot * i as f64).round() as u64;
            let end = if i == n - 1 {
                window.end
            } else {
                ((start as f64 + slot).round() as u64).min(window.end)
            };
            floor_segment(Segment::new(start, end, None), cfg.min_segment_frames)
        })
        .collect()
}

fn floor_segment(mut seg: Segment, min_frames: u64) -> Segment {
    let floor = seg.range.start.0 + min_frames;
    if seg.range.end.0 < floor {
        seg.range.end = FrameIndex(floor);
    }
    seg
}

/// One anchor frame per item: leading-word matches first, ordinal cues
/// filling the holes positionally.
fn anchor_frames<S: AsRef<str>>(
    items: &[S],
    transcript: &[WordFrame],
    window: Window,
    cfg: &AlignConfig,
) -> Vec<Option<u64>> {
    let n = items.len();
    if transcript.is_empty() {
        return vec![None; n];
    }

    let mut anchors = vec![None; n];
    let mut cursor = 0u64;
    for (i, item) in items.iter().enumerate() {
        for token in anchor_tokens(item.as_ref(), cfg) {
            if let Some(word) = transcript
                .iter()
                .find(|w| w.start_frame >= cursor && normalize_token(&w.word) == token)
            {
                anchors[i] = Some(word.start_frame);
                cursor = word.end_frame.max(word.start_frame.saturating_add(1));
                break;
            }
        }
    }

    if anchors.iter().any(Option::is_none) {
        let ordinals = ordinal_anchors(transcript, window.start, n, cfg);
        for (anchor, ordinal) in anchors.iter_mut().zip(ordinals) {
            if anchor.is_none() {
                *anchor = Some(ordinal);
            }
        }
    }

    anchors
}

/// Candidate match tokens for an item: its leading word, then its first word
/// of a useful length when that differs.
fn anchor_tokens(item: &str, cfg: &AlignConfig) -> Vec<String> {
    let tokens: Vec<String> = item
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect();
    let mut candidates = Vec::with_capacity(2);
    if let Some(first) = tokens.first() {
        candidates.push(first.clone());
    }
    if let Some(long) = tokens.iter().find(|t| t.len() >= cfg.anchor_token_min_len)
        && !candidates.contains(long)
    {
        candidates.push(long.clone());
    }
    candidates
}

/// Spoken ordinal cues ("first".."fifth", "one".."five") from shortly before
/// the window start onward, in spoken order.
fn ordinal_anchors(
    transcript: &[WordFrame],
    window_start: u64,
    max: usize,
    cfg: &AlignConfig,
) -> Vec<u64> {
    let gate = window_start.saturating_sub(cfg.ordinal_lookback_frames);
    let mut anchors = Vec::with_capacity(max);
    for word in transcript {
        if word.start_frame < gate {
            continue;
        }
        if ORDINAL_WORDS.contains(&normalize_token(&word.word).as_str()) {
            anchors.push(word.start_frame);
            if anchors.len() >= max {
                break;
            }
        }
    }
    anchors
}

/// Bounded-gap scan for `phrase` inside `tokens`, tolerating up to `max_gap`
/// non-matching tokens between consecutive phrase words. Returns the token
/// indices of the first and last matched word.
pub fn find_phrase_window(
    tokens: &[String],
    phrase: &[String],
    start_idx: usize,
    max_gap: usize,
) -> Option<(usize, usize)> {
    if phrase.is_empty() {
        return None;
    }
    let mut i = start_idx;
    while i < tokens.len() {
        if tokens[i] != phrase[0] {
            i += 1;
            continue;
        }
        let mut j = 0;
        let mut k = i;
        let mut last_match = i;
        while k < tokens.len() && j < phrase.len() {
            if tokens[k] == phrase[j] {
                last_match = k;
                j += 1;
            } else if k - last_match > max_gap {
                break;
            }
            k += 1;
        }
        if j == phrase.len() {
            return Some((i, last_match));
        }
        i += 1;
    }
    None
}

/// Frame at which a multi-word narration cue begins, if spoken.
pub fn phrase_cue_frame(
    transcript: &[WordFrame],
    phrase: &str,
    cfg: &AlignConfig,
) -> Option<u64> {
    let (tokens, frames): (Vec<String>, Vec<u64>) = transcript
        .iter()
        .filter_map(|w| {
            let t = normalize_token(&w.word);
            (!t.is_empty()).then_some((t, w.start_frame))
        })
        .unzip();
    let phrase_tokens: Vec<String> = phrase
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect();
    let (start_idx, _) = find_phrase_window(&tokens, &phrase_tokens, 0, cfg.max_token_gap)?;
    Some(frames[start_idx])
}

/// First spoken occurrence of a single token at or after `min_frame`.
pub fn first_token_frame(transcript: &[WordFrame], token: &str, min_frame: u64) -> Option<u64> {
    let norm = normalize_token(token);
    transcript
        .iter()
        .find(|w| w.start_frame >= min_frame && normalize_token(&w.word) == norm)
        .map(|w| w.start_frame)
}

/// Entrance frame for a block cued by narration: the cue phrase backed off by
/// the entrance lead, falling back to a single token, then to the highlight's
/// declared start.
pub fn entrance_frame(
    transcript: &[WordFrame],
    cue_phrase: &str,
    cue_token: Option<&str>,
    highlight: Option<&BlockHighlight>,
    cfg: &AlignConfig,
) -> u64 {
    let cue = phrase_cue_frame(transcript, cue_phrase, cfg)
        .or_else(|| cue_token.and_then(|t| first_token_frame(transcript, t, 0)));
    match cue {
        Some(frame) => frame.saturating_sub(cfg.entrance_lead_frames),
        None => highlight.map_or(0, |h| h.start_frame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HighlightSegment;

    fn cfg() -> AlignConfig {
        AlignConfig::default()
    }

    fn word(text: &str, start: u64, end: u64) -> WordFrame {
        WordFrame {
            word: text.to_string(),
            start_frame: start,
            end_frame: end,
            duration_frames: None,
        }
    }

    fn highlight(start: u64, end: u64) -> BlockHighlight {
        BlockHighlight {
            block_id: "b".to_string(),
            start_frame: start,
            end_frame: Some(end),
            color: None,
            segments: None,
        }
    }

    #[test]
    fn proportional_fallback_is_deterministic() {
        let items = ["a", "b", "c", "d"];
        let segs = segments_for(&items, Some(&highlight(100, 160)), &[], &cfg());
        assert_eq!(segs.len(), 4);
        let starts: Vec<u64> = segs.iter().map(|s| s.range.start.0).collect();
        assert_eq!(starts, vec![100, 115, 130, 145]);
        for s in &segs {
            assert_eq!(s.range.len_frames(), 15);
        }
        assert_eq!(segs[3].range.end.0, 160);
    }

    #[test]
    fn ordinal_anchor_scenario() {
        // Three bullets; narration speaks the ordinals at 40, 90, 130.
        let transcript = vec![
            word("so", 20, 25),
            word("First,", 40, 52),
            word("you", 55, 60),
            word("second", 90, 100),
            word("and", 110, 115),
            word("third", 130, 140),
        ];
        let items = ["Alpha beta", "Gamma delta", "Epsilon zeta"];
        let segs = segments_for(&items, Some(&highlight(30, 160)), &transcript, &cfg());
        let got: Vec<(u64, u64)> = segs
            .iter()
            .map(|s| (s.range.start.0, s.range.end.0))
            .collect();
        assert_eq!(got, vec![(40, 88), (90, 128), (130, 160)]);
    }

    #[test]
    fn leading_word_anchors_take_precedence() {
        let transcript = vec![
            word("structure", 50, 60),
            word("then", 70, 75),
            word("clarity", 80, 92),
        ];
        let items = ["Structure was sound", "Clarity of the answer"];
        let segs = segments_for(&items, Some(&highlight(40, 200)), &transcript, &cfg());
        assert_eq!(segs[0].range.start.0, 50);
        assert_eq!(segs[1].range.start.0, 80);
        assert_eq!(segs[0].range.end.0, 78); // 80 - lead buffer 2
        assert_eq!(segs[1].range.end.0, 200);
    }

    #[test]
    fn explicit_segments_used_verbatim() {
        let mut h = highlight(0, 300);
        h.segments = Some(vec![
            HighlightSegment {
                text: Some("a".to_string()),
                start_frame: 10,
                end_frame: 90,
            },
            HighlightSegment {
                text: None,
                start_frame: 90,
                end_frame: 210,
            },
        ]);
        let segs = segments_for(&["a", "b"], Some(&h), &[], &cfg());
        assert_eq!(segs[0].range.end.0, 90);
        assert_eq!(segs[1].range.start.0, 90);
        assert_eq!(segs[0].text.as_deref(), Some("a"));
    }

    #[test]
    fn malformed_explicit_segment_collapses_to_floor() {
        let mut h = highlight(0, 100);
        h.segments = Some(vec![HighlightSegment {
            text: None,
            start_frame: 50,
            end_frame: 20, // inverted
        }]);
        let segs = segments_for(&["only"], Some(&h), &[], &cfg());
        assert_eq!(segs[0].range.start.0, 50);
        assert_eq!(segs[0].range.end.0, 56);
    }

    #[test]
    fn segment_count_always_matches_items() {
        let items = ["a", "b", "c", "d", "e"];
        for h in [None, Some(highlight(10, 20))] {
            let segs = segments_for(&items, h.as_ref(), &[], &cfg());
            assert_eq!(segs.len(), items.len());
            for s in &segs {
                assert!(s.range.len_frames() >= 6);
            }
            for pair in segs.windows(2) {
                assert!(pair[0].range.start.0 <= pair[1].range.start.0);
            }
        }
    }

    #[test]
    fn missing_window_end_synthesizes_slots() {
        let mut h = highlight(60, 0);
        h.end_frame = None;
        let segs = segments_for(&["a", "b"], Some(&h), &[], &cfg());
        assert_eq!(segs[0].range.start.0, 60);
        // Two items at the 30-frame fallback slot.
        assert_eq!(segs[1].range.end.0, 120);
    }

    #[test]
    fn inverted_window_degrades_to_synthesized_end() {
        let segs = segments_for(&["a", "b"], Some(&highlight(100, 40)), &[], &cfg());
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].range.start.0, 100);
        assert!(segs[1].range.end.0 > 100);
    }

    #[test]
    fn empty_items_yield_no_segments() {
        let segs = segments_for::<&str>(&[], Some(&highlight(0, 100)), &[], &cfg());
        assert!(segs.is_empty());
    }

    #[test]
    fn phrase_window_tolerates_gaps() {
        let tokens: Vec<String> = ["now", "uh", "lets", "just", "see", "what", "went", "wrong"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let phrase: Vec<String> = ["now", "lets", "see", "what", "went", "wrong"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let window = find_phrase_window(&tokens, &phrase, 0, 3).unwrap();
        assert_eq!(window, (0, 7));
    }

    #[test]
    fn phrase_window_abandons_after_gap_limit() {
        let tokens: Vec<String> = ["went", "a", "b", "c", "d", "wrong"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let phrase: Vec<String> = ["went", "wrong"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_phrase_window(&tokens, &phrase, 0, 3), None);
    }

    #[test]
    fn entrance_backs_off_phrase_cue() {
        let transcript = vec![
            word("Now", 200, 205),
            word("let's", 206, 210),
            word("see", 211, 215),
            word("what", 216, 220),
            word("went", 221, 225),
            word("wrong.", 226, 232),
        ];
        let f = entrance_frame(
            &transcript,
            "now lets see what went wrong",
            Some("wrong"),
            None,
            &cfg(),
        );
        assert_eq!(f, 194); // 200 - entrance lead 6
    }

    #[test]
    fn entrance_falls_back_to_token_then_highlight() {
        let transcript = vec![word("wrong", 120, 130)];
        let f = entrance_frame(&transcript, "missing phrase", Some("wrong"), None, &cfg());
        assert_eq!(f, 114);

        let h = highlight(77, 200);
        let f = entrance_frame(&[], "missing phrase", Some("wrong"), Some(&h), &cfg());
        assert_eq!(f, 77);
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_token("First,"), "first");
        assert_eq!(normalize_token("don't"), "dont");
        assert_eq!(normalize_token("—"), "");
    }
}
