use std::collections::BTreeMap;

use crate::{
    ease::Ease,
    model::{Property, Sequence, TimeMs},
    playback::{Clock, Direction, FrameScheduler, PlaybackState, TickHandle},
    preset::{PresetCategory, PresetLibrary},
    store::{ProjectPersistence, ProjectStore},
    value::Value,
};

/// Per-element property map emitted once per element per tick/seek.
pub type PropertyValues = BTreeMap<Property, Value>;

pub type UpdateSink = Box<dyn FnMut(&str, &PropertyValues)>;
pub type TimeObserver = Box<dyn FnMut(f64)>;
pub type StateObserver = Box<dyn FnMut(&PlaybackState)>;

/// Sample every enabled, non-empty track of a sequence at `time_ms`,
/// grouped by element. Elements with no contributing tracks are absent.
pub fn sample_sequence(sequence: &Sequence, time_ms: f64) -> Vec<(String, PropertyValues)> {
    let mut grouped: BTreeMap<String, PropertyValues> = BTreeMap::new();
    for track in &sequence.tracks {
        if !track.enabled {
            continue;
        }
        let Some(value) = track.value_at(time_ms) else {
            continue;
        };
        grouped
            .entry(track.element_id.clone())
            .or_default()
            .insert(track.property, value);
    }
    grouped.into_iter().collect()
}

/// The timeline engine: one project, one playback clock, injected
/// persistence and frame scheduling.
///
/// The host drives frames: after `play()`, each granted scheduler request is
/// answered by one `tick()` call. Emitted callbacks receive owned snapshots,
/// and the next frame is requested exactly once per completed tick.
pub struct TimelineEngine {
    store: ProjectStore,
    presets: PresetLibrary,
    playback: PlaybackState,
    clock: Box<dyn Clock>,
    scheduler: Box<dyn FrameScheduler>,
    pending_tick: Option<TickHandle>,
    last_tick_ms: f64,
    update_sink: Option<UpdateSink>,
    time_observer: Option<TimeObserver>,
    state_observer: Option<StateObserver>,
}

impl TimelineEngine {
    pub fn new(
        persistence: Box<dyn ProjectPersistence>,
        clock: Box<dyn Clock>,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Self {
        Self {
            store: ProjectStore::open(persistence),
            presets: PresetLibrary::with_builtins(),
            playback: PlaybackState::stopped(),
            clock,
            scheduler,
            pending_tick: None,
            last_tick_ms: 0.0,
            update_sink: None,
            time_observer: None,
            state_observer: None,
        }
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn presets(&self) -> &PresetLibrary {
        &self.presets
    }

    // Observer registration is replace-single-subscriber: a new registration
    // discards the previous one.

    pub fn set_update_sink(&mut self, sink: impl FnMut(&str, &PropertyValues) + 'static) {
        self.update_sink = Some(Box::new(sink));
    }

    pub fn set_time_observer(&mut self, observer: impl FnMut(f64) + 'static) {
        self.time_observer = Some(Box::new(observer));
    }

    pub fn set_state_observer(&mut self, observer: impl FnMut(&PlaybackState) + 'static) {
        self.state_observer = Some(Box::new(observer));
    }

    // ----- playback -----

    pub fn play(&mut self) {
        if self.playback.is_playing || self.store.active_sequence().is_none() {
            return;
        }
        tracing::debug!("playback started");
        self.playback.is_playing = true;
        self.playback.is_paused = false;
        self.last_tick_ms = self.clock.now_ms();
        self.schedule_tick();
        self.notify_state();
    }

    pub fn pause(&mut self) {
        if !self.playback.is_playing {
            return;
        }
        tracing::debug!("playback paused");
        self.cancel_pending();
        self.playback.is_playing = false;
        self.playback.is_paused = true;
        self.notify_state();
    }

    /// Unconditionally halt and rewind to 0. Time observers hear the reset.
    pub fn stop(&mut self) {
        tracing::debug!("playback stopped");
        self.cancel_pending();
        self.playback.is_playing = false;
        self.playback.is_paused = false;
        self.playback.current_time = 0.0;
        self.notify_time(0.0);
        self.notify_state();
    }

    /// Jump to `time_ms` (clamped into the sequence) and emit that instant's
    /// values. Play state is untouched.
    pub fn seek(&mut self, time_ms: f64) {
        let Some((t, updates)) = ({
            self.store.active_sequence().map(|seq| {
                let t = time_ms.clamp(0.0, seq.duration.as_f64());
                (t, sample_sequence(seq, t))
            })
        }) else {
            return;
        };
        self.playback.current_time = t;
        self.emit_updates(&updates);
        self.notify_time(t);
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.playback.playback_rate = PlaybackState::clamp_rate(rate);
    }

    /// Takes effect on the next tick.
    pub fn toggle_direction(&mut self) {
        self.playback.direction = self.playback.direction.toggled();
    }

    /// Advance the clock by the actual elapsed wall time, emit values, and
    /// request the next frame if playback continues.
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self) {
        // Taking the handle first makes rogue ticks no-ops and guarantees at
        // most one new request per completed tick.
        if self.pending_tick.take().is_none() {
            return;
        }
        if !self.playback.is_playing {
            return;
        }

        let now = self.clock.now_ms();
        let delta = (now - self.last_tick_ms).max(0.0) * self.playback.playback_rate;
        self.last_tick_ms = now;

        let Some((duration, looped)) = self
            .store
            .active_sequence()
            .map(|seq| (seq.duration.as_f64(), seq.looped))
        else {
            // Active sequence vanished mid-flight.
            self.playback.is_playing = false;
            self.playback.is_paused = false;
            self.notify_state();
            return;
        };

        let mut t = self.playback.current_time;
        let mut auto_paused = false;
        match self.playback.direction {
            Direction::Forward => {
                t += delta;
                if t > duration {
                    if looped {
                        t = 0.0;
                    } else {
                        t = duration;
                        auto_paused = true;
                    }
                }
            }
            Direction::Reverse => {
                t -= delta;
                if t < 0.0 {
                    if looped {
                        t = duration;
                    } else {
                        t = 0.0;
                        auto_paused = true;
                    }
                }
            }
        }

        self.playback.current_time = t;
        if auto_paused {
            tracing::debug!(t, "playback reached sequence boundary");
            self.playback.is_playing = false;
            self.playback.is_paused = true;
        }

        let updates = self
            .store
            .active_sequence()
            .map(|seq| sample_sequence(seq, t))
            .unwrap_or_default();
        self.emit_updates(&updates);
        self.notify_time(t);
        if auto_paused {
            self.notify_state();
        }
        if self.playback.is_playing {
            self.schedule_tick();
        }
    }

    // ----- sequence CRUD (playback-aware) -----

    /// Create an empty sequence and make it active. Playback against the
    /// previous sequence stops first.
    pub fn create_sequence(&mut self, name: impl Into<String>, duration: Option<TimeMs>) -> String {
        self.stop();
        self.store.create_sequence(name, duration)
    }

    /// Switching sequences implicitly stops playback first; the engine never
    /// keeps ticking against a sequence that is no longer active.
    pub fn set_active_sequence(&mut self, sequence_id: Option<&str>) -> bool {
        if let Some(id) = sequence_id
            && self.store.project().sequence(id).is_none()
        {
            return false;
        }
        self.stop();
        self.store.set_active_sequence(sequence_id)
    }

    pub fn duplicate_sequence(&mut self, sequence_id: &str) -> Option<String> {
        self.store.duplicate_sequence(sequence_id)
    }

    pub fn delete_sequence(&mut self, sequence_id: &str) -> bool {
        if self.store.project().active_sequence.as_deref() == Some(sequence_id) {
            self.stop();
        }
        self.store.delete_sequence(sequence_id)
    }

    pub fn set_sequence_duration(&mut self, sequence_id: &str, duration: TimeMs) -> bool {
        if !self.store.set_sequence_duration(sequence_id, duration) {
            return false;
        }
        if let Some(seq) = self.store.active_sequence() {
            let d = seq.duration.as_f64();
            if self.playback.current_time > d {
                self.playback.current_time = d;
            }
        }
        true
    }

    pub fn set_sequence_looped(&mut self, sequence_id: &str, looped: bool) -> bool {
        self.store.set_sequence_looped(sequence_id, looped)
    }

    // ----- track & keyframe CRUD -----

    pub fn add_track(
        &mut self,
        sequence_id: &str,
        element_id: &str,
        property: Property,
    ) -> Option<String> {
        self.store.add_track(sequence_id, element_id, property)
    }

    pub fn remove_track(&mut self, sequence_id: &str, track_id: &str) -> bool {
        self.store.remove_track(sequence_id, track_id)
    }

    pub fn set_track_enabled(&mut self, sequence_id: &str, track_id: &str, enabled: bool) -> bool {
        self.store.set_track_enabled(sequence_id, track_id, enabled)
    }

    pub fn insert_keyframe(
        &mut self,
        sequence_id: &str,
        track_id: &str,
        time: TimeMs,
        value: Value,
        easing: Ease,
    ) -> Option<String> {
        self.store
            .insert_keyframe(sequence_id, track_id, time, value, easing)
    }

    pub fn update_keyframe(
        &mut self,
        sequence_id: &str,
        track_id: &str,
        keyframe_id: &str,
        value: Value,
        easing: Ease,
    ) -> bool {
        self.store
            .update_keyframe(sequence_id, track_id, keyframe_id, value, easing)
    }

    pub fn move_keyframe(
        &mut self,
        sequence_id: &str,
        track_id: &str,
        keyframe_id: &str,
        new_time: TimeMs,
        snap_ms: Option<u64>,
    ) -> bool {
        self.store
            .move_keyframe(sequence_id, track_id, keyframe_id, new_time, snap_ms)
    }

    pub fn remove_keyframe(
        &mut self,
        sequence_id: &str,
        track_id: &str,
        keyframe_id: &str,
    ) -> bool {
        self.store.remove_keyframe(sequence_id, track_id, keyframe_id)
    }

    // ----- presets -----

    /// Instantiate a preset onto an element at `start`. Empty result when
    /// the sequence or preset id does not resolve.
    pub fn apply_preset(
        &mut self,
        sequence_id: &str,
        element_id: &str,
        preset_id: &str,
        start: TimeMs,
    ) -> Vec<String> {
        let Some(preset) = self.presets.get(preset_id).cloned() else {
            return Vec::new();
        };
        self.store
            .apply_preset(sequence_id, element_id, &preset, start)
    }

    /// Capture the named tracks of a sequence into a user preset.
    pub fn create_preset(
        &mut self,
        name: impl Into<String>,
        category: PresetCategory,
        sequence_id: &str,
        track_ids: &[String],
    ) -> Option<String> {
        let seq = self.store.project().sequence(sequence_id)?;
        let tracks: Vec<_> = seq
            .tracks
            .iter()
            .filter(|t| track_ids.contains(&t.id))
            .cloned()
            .collect();
        Some(self.presets.create_preset(name, category, &tracks))
    }

    // ----- internals -----

    fn schedule_tick(&mut self) {
        if self.pending_tick.is_none() {
            self.pending_tick = Some(self.scheduler.request_tick());
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel_tick(handle);
        }
    }

    fn emit_updates(&mut self, updates: &[(String, PropertyValues)]) {
        if let Some(sink) = self.update_sink.as_mut() {
            for (element, values) in updates {
                sink(element, values);
            }
        }
    }

    fn notify_time(&mut self, t: f64) {
        if let Some(observer) = self.time_observer.as_mut() {
            observer(t);
        }
    }

    fn notify_state(&mut self) {
        let snapshot = self.playback;
        if let Some(observer) = self.state_observer.as_mut() {
            observer(&snapshot);
        }
    }
}
