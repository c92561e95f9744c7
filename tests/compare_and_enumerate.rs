use mnemoscope::config::AppConfig;
use mnemoscope::task::ports::{MemStore, NullFeedback, NullRender, ParamStore};
use mnemoscope::task::response::InputEvent;
use mnemoscope::task::session::keys;
use mnemoscope::task::trial_engine::{Phase, TrialEngine};
use mnemoscope::task::Millis;

fn numerosity_engine(submode: &str, anchor: f64, delta: f64, seed: u64) -> TrialEngine {
    let mut store = MemStore::new();
    store.save_str(keys::MODE, "numerosity");
    store.save_str(keys::SUBMODE, submode);
    store.save_num(keys::NUM_ANCHOR, anchor);
    store.save_num(keys::NUM_COMPARE_DELTA, delta);
    TrialEngine::new(
        AppConfig::default(),
        seed,
        Box::new(NullRender),
        Box::new(NullFeedback),
        Box::new(store),
    )
}

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
fn anchor_five_delta_two_always_yields_four_and_six() {
    for seed in 0..20u64 {
        let mut engine = numerosity_engine("compare", 5.0, 2.0, seed);
        let t = run_to_test(&mut engine, 0);
        let trial = engine.trial().unwrap();
        let a = trial.count_a.unwrap();
        let b = trial.count_b.unwrap();
        let mut counts = [a, b];
        counts.sort_unstable();
        assert_eq!(counts, [4, 6], "seed {seed}: counts {a}/{b}");
        assert_eq!(trial.b_larger, b == 6);
        assert_eq!(trial.memory.len(), a as usize);
        assert_eq!(trial.test.len(), b as usize);
        // Answer with the larger side; must score correct.
        let event = if trial.b_larger {
            InputEvent::BLarger
        } else {
            InputEvent::ALarger
        };
        engine.handle_input(event, t + 350);
        assert!(engine.last_outcome().unwrap().correct);
    }
}

#[test]
fn both_larger_sides_occur_over_seeds() {
    let mut saw_a = false;
    let mut saw_b = false;
    for seed in 0..40u64 {
        let mut engine = numerosity_engine("compare", 6.0, 2.0, seed);
        run_to_test(&mut engine, 0);
        if engine.trial().unwrap().b_larger {
            saw_b = true;
        } else {
            saw_a = true;
        }
    }
    assert!(saw_a && saw_b, "larger side should be a fair coin");
}

#[test]
fn enumerate_test_screen_is_blank_recall() {
    let mut engine = numerosity_engine("enumerate", 6.0, 2.0, 3);
    let t = run_to_test(&mut engine, 0);
    let trial = engine.trial().unwrap();
    assert!(trial.test.is_empty(), "nothing is re-displayed at recall");
    let count = trial.memory.len() as u8;
    assert!((5..=7).contains(&count), "count jitters around the anchor");

    engine.handle_input(InputEvent::Digit(count), t + 500);
    assert!(engine.last_outcome().unwrap().correct);
}

#[test]
fn wrong_count_scores_incorrect() {
    let mut engine = numerosity_engine("enumerate", 6.0, 2.0, 4);
    let t = run_to_test(&mut engine, 0);
    let count = engine.trial().unwrap().memory.len() as u8;
    let wrong = if count == 10 { 4 } else { count + 1 };
    engine.handle_input(InputEvent::Digit(wrong), t + 500);
    assert!(!engine.last_outcome().unwrap().correct);
}

#[test]
fn enumerate_counts_cover_the_jitter_band() {
    let mut seen = std::collections::BTreeSet::new();
    for seed in 0..30u64 {
        let mut engine = numerosity_engine("enumerate", 6.0, 2.0, seed);
        run_to_test(&mut engine, 0);
        seen.insert(engine.trial().unwrap().memory.len());
    }
    assert!(seen.len() >= 2, "jitter should vary the count, saw {seen:?}");
}
