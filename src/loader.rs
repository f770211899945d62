//! Keyed lookup tables and JSON loaders for the documents the engine
//! consumes. Loading is forgiving at the collection level: an unreadable or
//! invalid file is logged and skipped, never fatal to the whole load.

use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::Path,
};

use crate::{
    error::{CuelineError, CuelineResult},
    model::{AudioTiming, ManifestEvent, SessionContent, SlideChoreography, SlideType},
};

pub trait AudioTimingProvider {
    fn timing(&self, audio_file: &str) -> Option<&AudioTiming>;
}

pub trait ChoreographyProvider {
    fn choreography(&self, key: &str) -> Option<&SlideChoreography>;
}

/// Choreography documents are addressed by slide key, never by constructed
/// file path.
pub fn choreography_key(slide_type: SlideType, question_id: &str) -> String {
    match slide_type {
        SlideType::Intro => "intro_welcome".to_string(),
        SlideType::Case => "case_overview".to_string(),
        SlideType::QSummary => format!("{question_id}_summary"),
        SlideType::FeedbackBlocks => format!("{question_id}_feedback"),
        SlideType::ThinkingSteps => format!("{question_id}_thinking"),
    }
}

#[derive(Clone, Debug, Default)]
pub struct AudioTimingTable {
    map: BTreeMap<String, AudioTiming>,
}

impl AudioTimingTable {
    pub fn insert(&mut self, key: impl Into<String>, timing: AudioTiming) -> CuelineResult<()> {
        timing.validate()?;
        self.map.insert(key.into(), timing);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl AudioTimingProvider for AudioTimingTable {
    fn timing(&self, audio_file: &str) -> Option<&AudioTiming> {
        self.map
            .get(audio_file)
            .or_else(|| self.map.get(file_stem(audio_file)))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChoreographyTable {
    map: BTreeMap<String, SlideChoreography>,
}

impl ChoreographyTable {
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        choreography: SlideChoreography,
    ) -> CuelineResult<()> {
        choreography.validate()?;
        self.map.insert(key.into(), choreography);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl ChoreographyProvider for ChoreographyTable {
    fn choreography(&self, key: &str) -> Option<&SlideChoreography> {
        self.map.get(key)
    }
}

fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CuelineResult<T> {
    let f = File::open(path).map_err(|e| {
        CuelineError::serde(format!("open '{}': {e}", path.display()))
    })?;
    let r = BufReader::new(f);
    serde_json::from_reader(r)
        .map_err(|e| CuelineError::serde(format!("parse '{}': {e}", path.display())))
}

/// The manifest is either a bare event array or wrapped in `{ "events": [..] }`.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ManifestDoc {
    Wrapped { events: Vec<ManifestEvent> },
    Bare(Vec<ManifestEvent>),
}

pub fn load_manifest(path: &Path) -> CuelineResult<Vec<ManifestEvent>> {
    let doc: ManifestDoc = read_json(path)?;
    Ok(match doc {
        ManifestDoc::Wrapped { events } => events,
        ManifestDoc::Bare(events) => events,
    })
}

pub fn load_session_content(path: &Path) -> CuelineResult<SessionContent> {
    read_json(path)
}

/// Load every `*.json` in `dir` as an [`AudioTiming`], keyed by its
/// `audio_file` reference (file stem when absent). Invalid files are skipped.
pub fn load_timings_dir(dir: &Path) -> CuelineResult<AudioTimingTable> {
    let mut table = AudioTimingTable::default();
    for path in json_files(dir)? {
        let timing: AudioTiming = match read_json(&path) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable timing file");
                continue;
            }
        };
        let key = if timing.audio_file.is_empty() {
            stem_of(&path)
        } else {
            timing.audio_file.clone()
        };
        if let Err(err) = table.insert(key, timing) {
            tracing::warn!(path = %path.display(), %err, "skipping invalid timing file");
        }
    }
    Ok(table)
}

/// Load every `*.json` in `dir` as a [`SlideChoreography`], keyed by file
/// stem. Invalid files are skipped.
pub fn load_choreography_dir(dir: &Path) -> CuelineResult<ChoreographyTable> {
    let mut table = ChoreographyTable::default();
    for path in json_files(dir)? {
        let choreography: SlideChoreography = match read_json(&path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable choreography");
                continue;
            }
        };
        if let Err(err) = table.insert(stem_of(&path), choreography) {
            tracing::warn!(path = %path.display(), %err, "skipping invalid choreography");
        }
    }
    Ok(table)
}

fn json_files(dir: &Path) -> CuelineResult<Vec<std::path::PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        CuelineError::serde(format!("read dir '{}': {e}", dir.display()))
    })?;
    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
