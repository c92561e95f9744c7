use std::cell::RefCell;
use std::rc::Rc;

use mnemoscope::config::AppConfig;
use mnemoscope::core::circ::circ_dist_deg;
use mnemoscope::task::ports::{FeedbackSink, MemStore, NullFeedback, NullRender, ParamStore};
use mnemoscope::task::response::InputEvent;
use mnemoscope::task::session::keys;
use mnemoscope::task::trial_engine::{Phase, TrialEngine};
use mnemoscope::task::Millis;

fn run_to_test(engine: &mut TrialEngine, start: Millis) -> Millis {
    engine.begin_trial(start);
    let mut t = start;
    while engine.phase() != Phase::Test {
        t = engine.next_deadline().expect("phase timer pending");
        engine.on_timer(t);
    }
    t
}

#[test]
fn fast_correct_change_detection_awards_fifteen_points() {
    let mut store = MemStore::new();
    store.save_num(keys::SET_SIZE, 5.0);
    let mut engine = TrialEngine::new(
        AppConfig::default(),
        31,
        Box::new(NullRender),
        Box::new(NullFeedback),
        Box::new(store),
    );

    let mut now = 0;
    for _ in 0..50 {
        let t = run_to_test(&mut engine, now);
        let trial = engine.trial().unwrap().clone();
        let points_before = engine.session().points;
        if trial.change {
            // A "different" trial: the probed bar moved by exactly 20°.
            let probe = trial.probe_index.unwrap();
            let before = trial.memory[probe].angle_deg().unwrap();
            let after = trial.test[probe].angle_deg().unwrap();
            assert!((circ_dist_deg(before, after, 180.0) - 20.0).abs() < 1e-3);

            engine.handle_input(InputEvent::Different, t + 400);
            let outcome = engine.last_outcome().unwrap();
            assert!(outcome.correct);
            assert_eq!(outcome.rt_ms, 400);
            assert_eq!(outcome.awarded, 15, "10 base + 5 fast bonus");
            assert_eq!(engine.session().points, points_before + 15);
            return;
        }
        engine.handle_input(InputEvent::Same, t + 400);
        now = t + 1000;
    }
    panic!("no change trial in 50 coin flips");
}

#[test]
fn slow_correct_response_misses_the_bonus() {
    let mut engine = TrialEngine::new(
        AppConfig::default(),
        32,
        Box::new(NullRender),
        Box::new(NullFeedback),
        Box::new(MemStore::new()),
    );
    let t = run_to_test(&mut engine, 0);
    let change = engine.trial().unwrap().change;
    let event = if change {
        InputEvent::Different
    } else {
        InputEvent::Same
    };
    engine.handle_input(event, t + 900);
    let outcome = engine.last_outcome().unwrap();
    assert!(outcome.correct);
    assert_eq!(outcome.awarded, 10);
}

#[derive(Default)]
struct RecordingFeedback {
    rank_ups: Rc<RefCell<Vec<String>>>,
}

impl FeedbackSink for RecordingFeedback {
    fn on_rank_up(&mut self, rank: &str) {
        self.rank_ups.borrow_mut().push(rank.to_string());
    }
}

#[test]
fn crossing_a_rank_threshold_fires_one_notification() {
    let mut store = MemStore::new();
    store.save_num(keys::POINTS, 145.0);
    let rank_ups: Rc<RefCell<Vec<String>>> = Rc::default();
    let feedback = RecordingFeedback {
        rank_ups: rank_ups.clone(),
    };
    let mut engine = TrialEngine::new(
        AppConfig::default(),
        33,
        Box::new(NullRender),
        Box::new(feedback),
        Box::new(store),
    );

    let mut now = 0;
    // The first correct answer crosses 150 points; later ones stay within
    // the same rank band.
    for _ in 0..3 {
        let t = run_to_test(&mut engine, now);
        let change = engine.trial().unwrap().change;
        let event = if change {
            InputEvent::Different
        } else {
            InputEvent::Same
        };
        engine.handle_input(event, t + 200);
        now = t + 1000;
    }
    assert!(engine.session().points >= 150 + 20);
    assert_eq!(rank_ups.borrow().as_slice(), ["Apprentice"]);
}

#[test]
fn incorrect_responses_never_reduce_points() {
    let mut store = MemStore::new();
    store.save_num(keys::POINTS, 77.0);
    let mut engine = TrialEngine::new(
        AppConfig::default(),
        34,
        Box::new(NullRender),
        Box::new(NullFeedback),
        Box::new(store),
    );
    let t = run_to_test(&mut engine, 0);
    let change = engine.trial().unwrap().change;
    let event = if change {
        InputEvent::Same
    } else {
        InputEvent::Different
    };
    engine.handle_input(event, t + 300);
    let outcome = engine.last_outcome().unwrap();
    assert!(!outcome.correct);
    assert_eq!(engine.session().points, 77);
}
