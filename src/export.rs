use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::{
    model::{Property, Sequence, TimeMs, Track},
    value::Value,
};

/// Render a sequence's resolved motion as a CSS text blob: one `@keyframes`
/// block per element sampled at the union of that element's keyframe
/// instants, plus a rule binding the element to its block.
///
/// Pure function, no side effects; the caller decides where the text goes.
#[tracing::instrument(skip(sequence), fields(sequence_id = %sequence.id))]
pub fn export_stylesheet(sequence: &Sequence) -> String {
    let mut by_element: BTreeMap<&str, Vec<&Track>> = BTreeMap::new();
    for track in &sequence.tracks {
        if !track.enabled || track.keyframes.is_empty() {
            continue;
        }
        by_element.entry(&track.element_id).or_default().push(track);
    }

    let duration_ms = sequence.duration.0.max(1);
    let mut css = String::new();

    for (element, tracks) in &by_element {
        let name = animation_name(&sequence.name, element);

        let times: BTreeSet<TimeMs> = tracks
            .iter()
            .flat_map(|t| t.keyframes.iter().map(|k| k.time))
            .collect();

        let _ = writeln!(css, "@keyframes {name} {{");
        for time in &times {
            let pct = time.as_f64() / duration_ms as f64 * 100.0;
            let _ = writeln!(css, "  {}% {{", fmt_number(pct));
            for line in declarations_at(tracks, time.as_f64()) {
                let _ = writeln!(css, "    {line}");
            }
            let _ = writeln!(css, "  }}");
        }
        let _ = writeln!(css, "}}");

        let iteration = if sequence.looped {
            "infinite".to_string()
        } else {
            "1 forwards".to_string()
        };
        let _ = writeln!(
            css,
            "#{element} {{\n  animation: {name} {}ms linear {iteration};\n}}",
            sequence.duration.0
        );
    }

    css
}

fn animation_name(sequence_name: &str, element_id: &str) -> String {
    format!("kl-{}-{}", slug(sequence_name), slug(element_id))
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push('x');
    }
    out
}

/// CSS declarations for every track's value at one instant. Transform
/// functions are folded into a single `transform:` declaration.
fn declarations_at(tracks: &[&Track], t: f64) -> Vec<String> {
    let mut plain: Vec<(&'static str, String)> = Vec::new();
    let mut transform_parts: Vec<String> = Vec::new();

    for track in tracks {
        let Some(value) = track.value_at(t) else {
            continue;
        };
        match css_text(track.property, &value) {
            CssText::Declaration(name, text) => plain.push((name, text)),
            CssText::Transform(func) => transform_parts.push(func),
        }
    }

    plain.sort_by_key(|(name, _)| *name);
    transform_parts.sort();

    let mut out: Vec<String> = plain
        .into_iter()
        .map(|(name, text)| format!("{name}: {text};"))
        .collect();
    if !transform_parts.is_empty() {
        out.push(format!("transform: {};", transform_parts.join(" ")));
    }
    out
}

enum CssText {
    Declaration(&'static str, String),
    Transform(String),
}

/// Fixed per-property unit mapping.
fn css_text(property: Property, value: &Value) -> CssText {
    let raw = value_text(value);
    match property {
        Property::PositionX => CssText::Declaration("left", format!("{raw}px")),
        Property::PositionY => CssText::Declaration("top", format!("{raw}px")),
        Property::Width => CssText::Declaration("width", format!("{raw}px")),
        Property::Height => CssText::Declaration("height", format!("{raw}px")),
        Property::Rotation => CssText::Transform(format!("rotate({raw}deg)")),
        Property::Scale => CssText::Transform(format!("scale({raw})")),
        Property::ScaleX => CssText::Transform(format!("scaleX({raw})")),
        Property::ScaleY => CssText::Transform(format!("scaleY({raw})")),
        Property::Opacity => CssText::Declaration("opacity", raw),
        Property::Fill => CssText::Declaration("fill", raw),
        Property::Stroke => CssText::Declaration("stroke", raw),
        Property::StrokeWidth => CssText::Declaration("stroke-width", format!("{raw}px")),
        Property::BorderRadius => CssText::Declaration("border-radius", format!("{raw}px")),
        Property::Blur => CssText::Declaration("filter", format!("blur({raw}px)")),
        Property::Shadow => CssText::Declaration("box-shadow", raw),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Numeric(v) => fmt_number(*v),
        Value::Discrete(s) => s.clone(),
    }
}

/// Round to 4 decimals and trim trailing zeros, so offsets like 33.3333%
/// stay readable and integers print bare.
fn fmt_number(v: f64) -> String {
    let rounded = (v * 10_000.0).round() / 10_000.0;
    let mut s = format!("{rounded:.4}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ease::Ease;

    fn sequence_two_tracks() -> Sequence {
        let mut seq = Sequence::new("Hero Intro", TimeMs(1000));

        let mut opacity = Track::new("card", Property::Opacity);
        opacity.insert_keyframe(TimeMs(0), Value::Numeric(0.0), Ease::Linear);
        opacity.insert_keyframe(TimeMs(500), Value::Numeric(1.0), Ease::Linear);
        seq.tracks.push(opacity);

        let mut x = Track::new("card", Property::PositionX);
        x.insert_keyframe(TimeMs(0), Value::Numeric(-100.0), Ease::Linear);
        x.insert_keyframe(TimeMs(300), Value::Numeric(-40.0), Ease::Linear);
        x.insert_keyframe(TimeMs(500), Value::Numeric(0.0), Ease::Linear);
        seq.tracks.push(x);

        seq
    }

    #[test]
    fn offsets_are_the_union_of_keyframe_times() {
        let css = export_stylesheet(&sequence_two_tracks());

        assert!(css.contains("0% {"));
        assert!(css.contains("30% {"));
        assert!(css.contains("50% {"));

        // The opacity track has no keyframe at 300ms but still contributes
        // its interpolated value there.
        let block_300 = css.split("30% {").nth(1).unwrap();
        let block_300 = &block_300[..block_300.find('}').unwrap()];
        assert!(block_300.contains("opacity: 0.6;"));
        assert!(block_300.contains("left: -40px;"));
    }

    #[test]
    fn non_looping_sequences_hold_their_final_state() {
        let css = export_stylesheet(&sequence_two_tracks());
        assert!(css.contains("animation: kl-hero-intro-card 1000ms linear 1 forwards;"));
        assert!(css.contains("#card {"));
    }

    #[test]
    fn looping_sequences_repeat_indefinitely() {
        let mut seq = sequence_two_tracks();
        seq.looped = true;
        let css = export_stylesheet(&seq);
        assert!(css.contains("animation: kl-hero-intro-card 1000ms linear infinite;"));
    }

    #[test]
    fn transform_functions_fold_into_one_declaration() {
        let mut seq = Sequence::new("s", TimeMs(1000));
        let mut rot = Track::new("el", Property::Rotation);
        rot.insert_keyframe(TimeMs(0), Value::Numeric(45.0), Ease::Linear);
        seq.tracks.push(rot);
        let mut scale = Track::new("el", Property::Scale);
        scale.insert_keyframe(TimeMs(0), Value::Numeric(1.5), Ease::Linear);
        seq.tracks.push(scale);

        let css = export_stylesheet(&seq);
        assert!(css.contains("transform: rotate(45deg) scale(1.5);"));
    }

    #[test]
    fn discrete_values_pass_through_verbatim() {
        let mut seq = Sequence::new("s", TimeMs(400));
        let mut fill = Track::new("el", Property::Fill);
        fill.insert_keyframe(TimeMs(0), Value::Discrete("#ff0000".into()), Ease::Linear);
        fill.insert_keyframe(TimeMs(400), Value::Discrete("#00ff00".into()), Ease::Linear);
        seq.tracks.push(fill);

        let css = export_stylesheet(&seq);
        assert!(css.contains("fill: #ff0000;"));
        assert!(css.contains("fill: #00ff00;"));
    }

    #[test]
    fn disabled_and_empty_tracks_are_excluded() {
        let mut seq = sequence_two_tracks();
        seq.tracks[1].enabled = false;
        seq.tracks.push(Track::new("card", Property::Width));

        let css = export_stylesheet(&seq);
        assert!(!css.contains("left:"));
        assert!(!css.contains("width:"));
        assert!(css.contains("opacity:"));
    }

    #[test]
    fn empty_sequences_export_nothing() {
        let seq = Sequence::new("empty", TimeMs(1000));
        assert_eq!(export_stylesheet(&seq), "");
    }

    #[test]
    fn number_formatting_trims_noise() {
        assert_eq!(fmt_number(30.0), "30");
        assert_eq!(fmt_number(33.333333), "33.3333");
        assert_eq!(fmt_number(0.6000000000000001), "0.6");
        assert_eq!(fmt_number(-0.00001), "0");
    }
}
