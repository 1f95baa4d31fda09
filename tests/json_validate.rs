use keyline::{Project, TimeMs, Value};

#[test]
fn json_fixture_validates() {
    let s = include_str!("data/simple_project.json");
    let project: Project = serde_json::from_str(s).unwrap();
    project.validate().unwrap();

    let seq = project.active().unwrap();
    assert_eq!(seq.name, "Badge Intro");
    assert_eq!(seq.duration, TimeMs(1000));
    assert_eq!(seq.tracks.len(), 3);
}

#[test]
fn json_fixture_round_trips() {
    let s = include_str!("data/simple_project.json");
    let project: Project = serde_json::from_str(s).unwrap();

    let out = serde_json::to_string_pretty(&project).unwrap();
    let back: Project = serde_json::from_str(&out).unwrap();
    assert_eq!(back, project);
}

#[test]
fn fixture_tracks_sample_as_expected() {
    let s = include_str!("data/simple_project.json");
    let project: Project = serde_json::from_str(s).unwrap();
    let seq = project.active().unwrap();

    let x = seq.track("track-x").unwrap();
    assert_eq!(x.value_at(150.0), Some(Value::Numeric(-70.0)));
    assert_eq!(x.value_at(300.0), Some(Value::Numeric(-40.0)));
    assert_eq!(x.value_at(900.0), Some(Value::Numeric(0.0)));
}
