use std::path::Path;

use crate::{
    error::CuelineResult,
    loader::{
        AudioTimingTable, ChoreographyTable, load_choreography_dir, load_manifest,
        load_session_content, load_timings_dir,
    },
    model::{ManifestEvent, SessionContent},
};

/// Everything the timeline builder reads, loaded once at startup and
/// immutable for the lifetime of a render. Constructed explicitly and passed
/// by reference; there are no module-level singletons.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub events: Vec<ManifestEvent>,
    pub content: SessionContent,
    pub timings: AudioTimingTable,
    pub choreographies: ChoreographyTable,
}

impl SessionContext {
    pub fn new(
        events: Vec<ManifestEvent>,
        content: SessionContent,
        timings: AudioTimingTable,
        choreographies: ChoreographyTable,
    ) -> Self {
        Self {
            events,
            content,
            timings,
            choreographies,
        }
    }

    /// Load the full context from the standard on-disk layout.
    pub fn load(
        manifest_path: &Path,
        session_path: &Path,
        timings_dir: &Path,
        choreography_dir: &Path,
    ) -> CuelineResult<Self> {
        Ok(Self {
            events: load_manifest(manifest_path)?,
            content: load_session_content(session_path)?,
            timings: load_timings_dir(timings_dir)?,
            choreographies: load_choreography_dir(choreography_dir)?,
        })
    }
}
