use crate::{
    ease::Ease,
    model::{Property, TimeMs, Track, fresh_id},
    value::Value,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PresetCategory {
    Entrance,
    Exit,
    Emphasis,
    Motion,
    Custom,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyframeTemplate {
    pub time: TimeMs,
    pub value: Value,
    pub easing: Ease,
}

/// A track with the element binding and ids stripped away.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackTemplate {
    pub property: Property,
    pub enabled: bool,
    pub keyframes: Vec<KeyframeTemplate>,
}

/// An immutable, element-agnostic bundle of track templates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub category: PresetCategory,
    /// Maximum keyframe time across the templates.
    pub duration: TimeMs,
    pub tracks: Vec<TrackTemplate>,
}

impl Preset {
    /// Capture live tracks into a template bundle. Element bindings and ids
    /// are dropped; property, keyframes, and the enabled flag are kept.
    pub fn from_tracks(
        id: impl Into<String>,
        name: impl Into<String>,
        category: PresetCategory,
        tracks: &[Track],
    ) -> Self {
        let templates: Vec<TrackTemplate> = tracks
            .iter()
            .map(|t| TrackTemplate {
                property: t.property,
                enabled: t.enabled,
                keyframes: t
                    .keyframes
                    .iter()
                    .map(|k| KeyframeTemplate {
                        time: k.time,
                        value: k.value.clone(),
                        easing: k.easing,
                    })
                    .collect(),
            })
            .collect();

        let duration = templates
            .iter()
            .flat_map(|t| t.keyframes.iter().map(|k| k.time))
            .max()
            .unwrap_or(TimeMs::ZERO);

        Self {
            id: id.into(),
            name: name.into(),
            category,
            duration,
            tracks: templates,
        }
    }

    /// Instantiate fresh tracks bound to `element_id`, every keyframe
    /// shifted by `start` and given a fresh id.
    pub fn instantiate(&self, element_id: &str, start: TimeMs) -> Vec<Track> {
        self.tracks
            .iter()
            .map(|template| Track {
                id: fresh_id(),
                element_id: element_id.to_string(),
                property: template.property,
                enabled: template.enabled,
                keyframes: template
                    .keyframes
                    .iter()
                    .map(|k| crate::model::Keyframe {
                        id: fresh_id(),
                        time: TimeMs(start.0.saturating_add(k.time.0)),
                        value: k.value.clone(),
                        easing: k.easing,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Built-in presets plus a user partition, looked up by stable string id.
pub struct PresetLibrary {
    builtin: Vec<Preset>,
    user: Vec<Preset>,
}

impl PresetLibrary {
    pub fn with_builtins() -> Self {
        Self {
            builtin: builtin_presets(),
            user: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            builtin: Vec::new(),
            user: Vec::new(),
        }
    }

    pub fn get(&self, preset_id: &str) -> Option<&Preset> {
        self.builtin
            .iter()
            .chain(&self.user)
            .find(|p| p.id == preset_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(&self.user)
    }

    pub fn user_presets(&self) -> &[Preset] {
        &self.user
    }

    /// Capture tracks into a new user preset. Returns its id.
    pub fn create_preset(
        &mut self,
        name: impl Into<String>,
        category: PresetCategory,
        tracks: &[Track],
    ) -> String {
        let preset = Preset::from_tracks(fresh_id(), name, category, tracks);
        let id = preset.id.clone();
        self.user.push(preset);
        id
    }

    /// Remove a user preset. Built-ins cannot be removed.
    pub fn remove_user_preset(&mut self, preset_id: &str) -> bool {
        let before = self.user.len();
        self.user.retain(|p| p.id != preset_id);
        self.user.len() != before
    }
}

impl Default for PresetLibrary {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn template(
    property: Property,
    keys: &[(u64, Value, Ease)],
) -> TrackTemplate {
    TrackTemplate {
        property,
        enabled: true,
        keyframes: keys
            .iter()
            .map(|(t, v, e)| KeyframeTemplate {
                time: TimeMs(*t),
                value: v.clone(),
                easing: *e,
            })
            .collect(),
    }
}

fn builtin(id: &str, name: &str, category: PresetCategory, tracks: Vec<TrackTemplate>) -> Preset {
    let duration = tracks
        .iter()
        .flat_map(|t| t.keyframes.iter().map(|k| k.time))
        .max()
        .unwrap_or(TimeMs::ZERO);
    Preset {
        id: id.to_string(),
        name: name.to_string(),
        category,
        duration,
        tracks,
    }
}

fn builtin_presets() -> Vec<Preset> {
    use Ease::*;
    use PresetCategory::*;
    use Property::*;

    let n = Value::Numeric;

    vec![
        builtin(
            "fade-in",
            "Fade In",
            Entrance,
            vec![template(
                Opacity,
                &[(0, n(0.0), OutCubic), (500, n(1.0), OutCubic)],
            )],
        ),
        builtin(
            "fade-out",
            "Fade Out",
            Exit,
            vec![template(
                Opacity,
                &[(0, n(1.0), InCubic), (500, n(0.0), InCubic)],
            )],
        ),
        builtin(
            "slide-in-left",
            "Slide In Left",
            Entrance,
            vec![
                template(PositionX, &[(0, n(-120.0), OutCubic), (600, n(0.0), OutCubic)]),
                template(Opacity, &[(0, n(0.0), Linear), (400, n(1.0), Linear)]),
            ],
        ),
        builtin(
            "pop-in",
            "Pop In",
            Entrance,
            vec![
                template(Scale, &[(0, n(0.0), OutElastic), (700, n(1.0), OutElastic)]),
                template(Opacity, &[(0, n(0.0), OutCubic), (250, n(1.0), OutCubic)]),
            ],
        ),
        builtin(
            "bounce-drop",
            "Bounce Drop",
            Entrance,
            vec![template(
                PositionY,
                &[(0, n(-200.0), OutBounce), (800, n(0.0), OutBounce)],
            )],
        ),
        builtin(
            "pulse",
            "Pulse",
            Emphasis,
            vec![template(
                Scale,
                &[
                    (0, n(1.0), InOutCubic),
                    (300, n(1.15), InOutCubic),
                    (600, n(1.0), InOutCubic),
                ],
            )],
        ),
        builtin(
            "spin",
            "Spin",
            Motion,
            vec![template(
                Rotation,
                &[(0, n(0.0), Linear), (1000, n(360.0), Linear)],
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_stable_ids_and_durations() {
        let lib = PresetLibrary::with_builtins();
        let fade = lib.get("fade-in").unwrap();
        assert_eq!(fade.duration, TimeMs(500));
        assert_eq!(fade.category, PresetCategory::Entrance);
        assert!(lib.get("spin").is_some());
        assert!(lib.get("missing").is_none());
    }

    #[test]
    fn instantiate_shifts_times_and_mints_fresh_ids() {
        let lib = PresetLibrary::with_builtins();
        let fade = lib.get("fade-in").unwrap();

        let a = fade.instantiate("el-1", TimeMs(100));
        let b = fade.instantiate("el-1", TimeMs(100));

        assert_eq!(a.len(), 1);
        assert_eq!(a[0].element_id, "el-1");
        assert_eq!(a[0].keyframes[0].time, TimeMs(100));
        assert_eq!(a[0].keyframes[1].time, TimeMs(600));
        assert_ne!(a[0].id, b[0].id);
        assert_ne!(a[0].keyframes[0].id, b[0].keyframes[0].id);
    }

    #[test]
    fn capture_drops_bindings_and_measures_duration() {
        let mut lib = PresetLibrary::with_builtins();
        let mut track = Track::new("el-7", Property::Opacity);
        track.insert_keyframe(TimeMs(0), Value::Numeric(0.0), Ease::Linear);
        track.insert_keyframe(TimeMs(750), Value::Numeric(1.0), Ease::Linear);
        track.enabled = false;

        let id = lib.create_preset("my fade", PresetCategory::Custom, &[track]);
        let preset = lib.get(&id).unwrap();

        assert_eq!(preset.duration, TimeMs(750));
        assert_eq!(preset.tracks.len(), 1);
        assert!(!preset.tracks[0].enabled);
        assert_eq!(lib.user_presets().len(), 1);
    }

    #[test]
    fn user_presets_can_be_removed_builtins_cannot() {
        let mut lib = PresetLibrary::with_builtins();
        let id = lib.create_preset("x", PresetCategory::Custom, &[]);
        assert!(lib.remove_user_preset(&id));
        assert!(!lib.remove_user_preset("fade-in"));
        assert!(lib.get("fade-in").is_some());
    }
}
