use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    ease::Ease,
    error::{KeylineError, KeylineResult},
    model::{Project, Property, Sequence, TimeMs, Track, now_epoch_ms},
    preset::Preset,
    value::Value,
};

/// The storage medium behind the engine. The engine is agnostic to where
/// snapshots live; it only relies on load-or-nothing and whole-snapshot save.
pub trait ProjectPersistence {
    fn load(&mut self) -> KeylineResult<Option<Project>>;
    fn save(&mut self, project: &Project) -> KeylineResult<()>;
}

/// In-memory slot. First choice for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryPersistence {
    slot: Option<Project>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(project: Project) -> Self {
        Self {
            slot: Some(project),
        }
    }

    pub fn snapshot(&self) -> Option<&Project> {
        self.slot.as_ref()
    }
}

impl ProjectPersistence for MemoryPersistence {
    fn load(&mut self) -> KeylineResult<Option<Project>> {
        Ok(self.slot.clone())
    }

    fn save(&mut self, project: &Project) -> KeylineResult<()> {
        self.slot = Some(project.clone());
        Ok(())
    }
}

/// Whole-project JSON snapshots at a fixed path.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectPersistence for JsonFilePersistence {
    fn load(&mut self) -> KeylineResult<Option<Project>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path).map_err(|e| {
            KeylineError::persistence(format!("read '{}': {e}", self.path.display()))
        })?;
        let project = serde_json::from_slice(&bytes)
            .map_err(|e| KeylineError::serde(format!("parse '{}': {e}", self.path.display())))?;
        Ok(Some(project))
    }

    fn save(&mut self, project: &Project) -> KeylineResult<()> {
        let json = serde_json::to_string_pretty(project)
            .map_err(|e| KeylineError::serde(e.to_string()))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                KeylineError::persistence(format!("create '{}': {e}", parent.display()))
            })?;
        }
        fs::write(&self.path, json).map_err(|e| {
            KeylineError::persistence(format!("write '{}': {e}", self.path.display()))
        })?;
        Ok(())
    }
}

/// Owns the project and its persistence. Every mutation saves the whole
/// snapshot synchronously; a failed save is logged and the in-memory project
/// stays authoritative.
pub struct ProjectStore {
    project: Project,
    persistence: Box<dyn ProjectPersistence>,
}

impl ProjectStore {
    /// Load the persisted project, degrading to a fresh empty one when the
    /// backend has nothing, fails, or holds an invalid snapshot.
    pub fn open(mut persistence: Box<dyn ProjectPersistence>) -> Self {
        let project = match persistence.load() {
            Ok(Some(project)) => match project.validate() {
                Ok(()) => project,
                Err(e) => {
                    tracing::warn!(error = %e, "persisted project invalid, starting fresh");
                    Project::new()
                }
            },
            Ok(None) => Project::new(),
            Err(e) => {
                tracing::warn!(error = %e, "project load failed, starting fresh");
                Project::new()
            }
        };
        Self {
            project,
            persistence,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn active_sequence(&self) -> Option<&Sequence> {
        self.project.active()
    }

    fn commit(&mut self) {
        self.project.updated_at_ms = now_epoch_ms();
        if let Err(e) = self.persistence.save(&self.project) {
            tracing::warn!(error = %e, "project save skipped");
        }
    }

    /// Create an empty sequence and make it active. Returns its id.
    pub fn create_sequence(&mut self, name: impl Into<String>, duration: Option<TimeMs>) -> String {
        let seq = Sequence::new(name, duration.unwrap_or(TimeMs(3000)));
        let id = seq.id.clone();
        self.project.sequences.push(seq);
        self.project.active_sequence = Some(id.clone());
        self.commit();
        id
    }

    /// Point the store at another sequence (or none). `false` when the id
    /// does not resolve; the previous active pointer is kept in that case.
    pub fn set_active_sequence(&mut self, sequence_id: Option<&str>) -> bool {
        match sequence_id {
            None => {
                self.project.active_sequence = None;
                self.commit();
                true
            }
            Some(id) => {
                if self.project.sequence(id).is_none() {
                    return false;
                }
                self.project.active_sequence = Some(id.to_string());
                self.commit();
                true
            }
        }
    }

    /// Deep copy with fresh ids throughout. Returns the new sequence id.
    pub fn duplicate_sequence(&mut self, sequence_id: &str) -> Option<String> {
        let copy = self.project.sequence(sequence_id)?.duplicate();
        let id = copy.id.clone();
        self.project.sequences.push(copy);
        self.commit();
        Some(id)
    }

    /// Delete a sequence. If it was active, fall back to the first remaining
    /// sequence, or to no active sequence.
    pub fn delete_sequence(&mut self, sequence_id: &str) -> bool {
        let before = self.project.sequences.len();
        self.project.sequences.retain(|s| s.id != sequence_id);
        if self.project.sequences.len() == before {
            return false;
        }
        if self.project.active_sequence.as_deref() == Some(sequence_id) {
            self.project.active_sequence = self.project.sequences.first().map(|s| s.id.clone());
        }
        self.commit();
        true
    }

    /// Set a sequence duration, reconciled so no keyframe falls outside it.
    pub fn set_sequence_duration(&mut self, sequence_id: &str, duration: TimeMs) -> bool {
        let Some(seq) = self.project.sequence_mut(sequence_id) else {
            return false;
        };
        seq.duration = duration;
        seq.reconcile_duration();
        self.commit();
        true
    }

    pub fn set_sequence_looped(&mut self, sequence_id: &str, looped: bool) -> bool {
        let Some(seq) = self.project.sequence_mut(sequence_id) else {
            return false;
        };
        seq.looped = looped;
        self.commit();
        true
    }

    /// Attach a property track to an element. Returns the new track id.
    pub fn add_track(
        &mut self,
        sequence_id: &str,
        element_id: &str,
        property: Property,
    ) -> Option<String> {
        let seq = self.project.sequence_mut(sequence_id)?;
        let track = Track::new(element_id, property);
        let id = track.id.clone();
        seq.tracks.push(track);
        self.commit();
        Some(id)
    }

    /// Delete a track and all of its keyframes.
    pub fn remove_track(&mut self, sequence_id: &str, track_id: &str) -> bool {
        let Some(seq) = self.project.sequence_mut(sequence_id) else {
            return false;
        };
        let before = seq.tracks.len();
        seq.tracks.retain(|t| t.id != track_id);
        if seq.tracks.len() == before {
            return false;
        }
        self.commit();
        true
    }

    /// Suppress or restore a track's playback output without touching data.
    pub fn set_track_enabled(&mut self, sequence_id: &str, track_id: &str, enabled: bool) -> bool {
        let Some(track) = self
            .project
            .sequence_mut(sequence_id)
            .and_then(|s| s.track_mut(track_id))
        else {
            return false;
        };
        track.enabled = enabled;
        self.commit();
        true
    }

    /// Insert a keyframe (time clamped into the sequence duration). Inserting
    /// at an occupied time overwrites that keyframe in place.
    pub fn insert_keyframe(
        &mut self,
        sequence_id: &str,
        track_id: &str,
        time: TimeMs,
        value: Value,
        easing: Ease,
    ) -> Option<String> {
        let seq = self.project.sequence_mut(sequence_id)?;
        let clamped = TimeMs(time.0.min(seq.duration.0));
        let track = seq.track_mut(track_id)?;
        let id = track.insert_keyframe(clamped, value, easing);
        self.commit();
        Some(id)
    }

    pub fn update_keyframe(
        &mut self,
        sequence_id: &str,
        track_id: &str,
        keyframe_id: &str,
        value: Value,
        easing: Ease,
    ) -> bool {
        let Some(track) = self
            .project
            .sequence_mut(sequence_id)
            .and_then(|s| s.track_mut(track_id))
        else {
            return false;
        };
        if !track.update_keyframe(keyframe_id, value, easing) {
            return false;
        }
        self.commit();
        true
    }

    /// Move a keyframe in time, clamped to the sequence duration and
    /// optionally snapped to a grid.
    pub fn move_keyframe(
        &mut self,
        sequence_id: &str,
        track_id: &str,
        keyframe_id: &str,
        new_time: TimeMs,
        snap_ms: Option<u64>,
    ) -> bool {
        let Some(seq) = self.project.sequence_mut(sequence_id) else {
            return false;
        };
        let max_time = seq.duration;
        let Some(track) = seq.track_mut(track_id) else {
            return false;
        };
        if !track.move_keyframe(keyframe_id, new_time, max_time, snap_ms) {
            return false;
        }
        self.commit();
        true
    }

    pub fn remove_keyframe(&mut self, sequence_id: &str, track_id: &str, keyframe_id: &str) -> bool {
        let Some(track) = self
            .project
            .sequence_mut(sequence_id)
            .and_then(|s| s.track_mut(track_id))
        else {
            return false;
        };
        if !track.remove_keyframe(keyframe_id) {
            return false;
        }
        self.commit();
        true
    }

    /// Instantiate a preset's track templates onto an element, shifted by
    /// `start`, extending the sequence duration when the preset runs past
    /// its end. Returns the new track ids (empty when the sequence is gone).
    pub fn apply_preset(
        &mut self,
        sequence_id: &str,
        element_id: &str,
        preset: &Preset,
        start: TimeMs,
    ) -> Vec<String> {
        let Some(seq) = self.project.sequence_mut(sequence_id) else {
            return Vec::new();
        };

        let tracks = preset.instantiate(element_id, start);
        let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
        seq.tracks.extend(tracks);

        let end = TimeMs(start.0.saturating_add(preset.duration.0));
        if end > seq.duration {
            seq.duration = end;
        }

        self.commit();
        ids
    }
}
