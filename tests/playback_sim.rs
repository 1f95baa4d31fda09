//! End-to-end playback drive over the JSON fixture: a host loop that answers
//! every scheduler request with one tick, exactly as a frame callback would.

use std::cell::RefCell;
use std::rc::Rc;

use keyline::{
    ManualClock, ManualScheduler, MemoryPersistence, Project, Property, TimelineEngine, Value,
};

fn fixture_engine() -> (TimelineEngine, ManualClock, ManualScheduler) {
    let s = include_str!("data/simple_project.json");
    let project: Project = serde_json::from_str(s).unwrap();

    let clock = ManualClock::new();
    let scheduler = ManualScheduler::new();
    let engine = TimelineEngine::new(
        Box::new(MemoryPersistence::with_project(project)),
        Box::new(clock.clone()),
        Box::new(scheduler.clone()),
    );
    (engine, clock, scheduler)
}

#[test]
fn playback_runs_to_completion_and_pauses_at_the_boundary() {
    let (mut engine, clock, scheduler) = fixture_engine();

    let times: Rc<RefCell<Vec<f64>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = times.clone();
    engine.set_time_observer(move |t| sink.borrow_mut().push(t));

    engine.play();
    assert!(engine.playback().is_playing);

    let mut frames = 0;
    while scheduler.has_pending() {
        frames += 1;
        assert!(frames < 200, "playback never completed");
        clock.advance(16.0);
        scheduler.take_pending();
        engine.tick();
    }

    let times = times.borrow();
    assert!(!times.is_empty());
    assert!(times.windows(2).all(|w| w[0] <= w[1]), "time went backwards");
    assert_eq!(*times.last().unwrap(), 1000.0);

    let state = engine.playback();
    assert!(state.is_paused);
    assert!(!state.is_playing);
    assert_eq!(state.current_time, 1000.0);
}

#[test]
fn looped_playback_wraps_and_keeps_running() {
    let (mut engine, clock, scheduler) = fixture_engine();
    engine.set_sequence_looped("seq-badge-intro", true);

    engine.play();
    let mut wrapped = false;
    let mut last = 0.0;
    for _ in 0..100 {
        clock.advance(16.0);
        scheduler.take_pending();
        engine.tick();
        let t = engine.playback().current_time;
        if t < last {
            wrapped = true;
            assert_eq!(t, 0.0, "wrap must land on the opposite boundary");
        }
        last = t;
    }

    assert!(wrapped, "looped playback never wrapped");
    assert!(engine.playback().is_playing);
    assert!(scheduler.has_pending());
}

#[test]
fn ticks_emit_per_element_value_maps() {
    let (mut engine, clock, scheduler) = fixture_engine();

    let emitted: Rc<RefCell<Vec<(String, Vec<Property>)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = emitted.clone();
    engine.set_update_sink(move |element, values| {
        sink.borrow_mut()
            .push((element.to_string(), values.keys().copied().collect()));
    });

    engine.play();
    clock.advance(250.0);
    scheduler.take_pending();
    engine.tick();

    let emitted = emitted.borrow();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].0, "badge");
    // The disabled fill track contributes nothing.
    assert_eq!(emitted[0].1, vec![Property::PositionX, Property::Opacity]);
}

#[test]
fn seek_emits_the_same_values_playback_would() {
    let (mut engine, _clock, _scheduler) = fixture_engine();

    let seen: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    engine.set_update_sink(move |_, values| {
        *sink.borrow_mut() = values.get(&Property::Opacity).cloned();
    });

    engine.seek(250.0);
    assert_eq!(*seen.borrow(), Some(Value::Numeric(0.5)));
    assert!(!engine.playback().is_playing);
}
