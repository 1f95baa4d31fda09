use keyline::{Project, export_stylesheet};

fn fixture_project() -> Project {
    let s = include_str!("data/simple_project.json");
    serde_json::from_str(s).unwrap()
}

#[test]
fn stylesheet_matches_expected_text() {
    let project = fixture_project();
    let seq = project.active().unwrap();

    // Offsets are the union of both tracks' keyframe times {0, 300, 500};
    // the opacity track has no key at 300 yet contributes its interpolated
    // value there. The disabled fill track is absent entirely.
    let expected = "\
@keyframes kl-badge-intro-badge {
  0% {
    left: -100px;
    opacity: 0;
  }
  30% {
    left: -40px;
    opacity: 0.6;
  }
  50% {
    left: 0px;
    opacity: 1;
  }
}
#badge {
  animation: kl-badge-intro-badge 1000ms linear 1 forwards;
}
";
    assert_eq!(export_stylesheet(seq), expected);
}

#[test]
fn loop_flag_switches_the_binding_rule() {
    let mut project = fixture_project();
    project.sequences[0].looped = true;

    let css = export_stylesheet(&project.sequences[0]);
    assert!(css.contains("animation: kl-badge-intro-badge 1000ms linear infinite;"));
    assert!(!css.contains("forwards"));
}
