//! Keyline is a keyframe animation timeline engine.
//!
//! It models named sequences of per-property keyframe tracks, drives a
//! deterministic playback clock over them, and lowers the resolved motion
//! into a portable CSS `@keyframes` stylesheet.
//!
//! # Pipeline overview
//!
//! 1. **Model**: `Project` → `Sequence` → `Track` → `Keyframe` (pure data
//!    plus invariants)
//! 2. **Sample**: `Track::value_at` turns sparse keyframes into a continuous
//!    signal via the easing library
//! 3. **Play**: [`TimelineEngine`] advances a wall-clock-driven virtual time
//!    and emits per-element property maps to the host
//! 4. **Export** (optional): [`export_stylesheet`] renders a sequence as CSS
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No globals**: persistence, clock, and frame scheduling are injected,
//!   so independent engine instances and deterministic tests need no setup.
//! - **Tolerant by design**: stale ids are silent no-ops and out-of-range
//!   times clamp; a broken persistence backend degrades to a fresh project.
#![forbid(unsafe_code)]

pub mod ease;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod playback;
pub mod preset;
pub mod store;
pub mod value;

pub use ease::Ease;
pub use engine::{PropertyValues, TimelineEngine, sample_sequence};
pub use error::{KeylineError, KeylineResult};
pub use export::export_stylesheet;
pub use model::{Keyframe, Project, Property, Sequence, TimeMs, Track};
pub use playback::{
    Clock, Direction, FrameScheduler, ManualClock, ManualScheduler, PlaybackState, SystemClock,
    TickHandle,
};
pub use preset::{KeyframeTemplate, Preset, PresetCategory, PresetLibrary, TrackTemplate};
pub use store::{JsonFilePersistence, MemoryPersistence, ProjectPersistence, ProjectStore};
pub use value::{Value, interpolate};
