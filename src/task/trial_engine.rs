//! The trial phase machine.
//!
//! One trial is a finite plan of timed phases consumed by a single
//! cancellable deadline; the test phase alone exits early, on the accepted
//! response. The engine runs entirely on a logical millisecond clock passed
//! in by the host, so the same code path is driven by wall time in the
//! binary and by hand in tests.

use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::core::geom::{polar_point, Vec2};
use crate::task::adaptive::{
    block_update, jittered_count, window_update, OutcomeWindow, Staircase, BLOCK_SIZE, COUNT_MAX,
    COUNT_MIN,
};
use crate::task::change::inject;
use crate::task::phase_timer::PhaseTimer;
use crate::task::ports::{FeedbackSink, ParamStore, RenderSink};
use crate::task::response::{is_correct, InputEvent, ResponseGate};
use crate::task::scoring::{score, ScoreOutcome};
use crate::task::session::{Mode, NumerositySubmode, Session};
use crate::task::stimulus::{
    compare_counts, gen_color_array, gen_frequency_array, gen_orientation_array, gen_shape_field,
    ShapeFieldParams, StimulusItem,
};
use crate::task::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fix,
    PreBlank,
    Mem,
    MemA,
    IsiA,
    MemB,
    IsiB,
    SaccadeOn,
    SaccadeBlank,
    Isi,
    Test,
}

/// Immutable-per-trial snapshot: built fresh when a trial starts, read by
/// every later phase. Only the runtime bookkeeping fields (`saccade_hit`,
/// `test_onset`) change after construction.
#[derive(Debug, Clone)]
pub struct Trial {
    pub memory: Vec<StimulusItem>,
    /// Test array; array B in compare mode; empty for enumerate recall.
    pub test: Vec<StimulusItem>,
    pub probe_index: Option<usize>,
    pub change: bool,
    pub count_a: Option<u8>,
    pub count_b: Option<u8>,
    pub b_larger: bool,
    pub saccade_target: Option<Vec2>,
    pub saccade_hit: bool,
    pub test_onset: Option<Millis>,
}

pub struct TrialEngine {
    cfg: AppConfig,
    session: Session,
    trial: Option<Trial>,
    phase: Phase,
    plan: Vec<(Phase, Millis)>,
    plan_pos: usize,
    timer: PhaseTimer,
    gate: ResponseGate,
    staircase: Staircase,
    window: OutcomeWindow,
    paused: bool,
    help_open: bool,
    pause_started: Option<Millis>,
    last_outcome: Option<ScoreOutcome>,
    rng: SmallRng,
    render: Box<dyn RenderSink>,
    feedback: Box<dyn FeedbackSink>,
    store: Box<dyn ParamStore>,
}

fn build_plan(
    mode: Mode,
    submode: NumerositySubmode,
    cfg: &AppConfig,
    exposure_ms: Millis,
) -> Vec<(Phase, Millis)> {
    let t = &cfg.timing;
    let mut plan = vec![(Phase::Fix, t.fix_ms), (Phase::PreBlank, t.pre_blank_ms)];
    match (mode, submode) {
        (Mode::Numerosity, NumerositySubmode::Compare) => {
            // Two separately timed exposures; each inter-array blank is half
            // the full ISI, and the second one doubles as the pre-test gap.
            let half_isi = t.isi_ms / 2;
            plan.push((Phase::MemA, exposure_ms));
            plan.push((Phase::IsiA, half_isi));
            plan.push((Phase::MemB, exposure_ms));
            plan.push((Phase::IsiB, half_isi));
        }
        (Mode::Numerosity, NumerositySubmode::Enumerate) => {
            plan.push((Phase::Mem, exposure_ms));
            plan.push((Phase::Isi, t.isi_ms));
        }
        (Mode::Saccade, _) => {
            plan.push((Phase::Mem, t.mem_ms));
            plan.push((Phase::SaccadeOn, t.saccade_on_ms));
            plan.push((Phase::SaccadeBlank, t.saccade_blank_ms));
            plan.push((Phase::Isi, t.isi_ms));
        }
        _ => {
            plan.push((Phase::Mem, t.mem_ms));
            plan.push((Phase::Isi, t.isi_ms));
        }
    }
    plan.push((Phase::Test, t.resp_window_ms));
    plan
}

impl TrialEngine {
    pub fn new(
        cfg: AppConfig,
        seed: u64,
        render: Box<dyn RenderSink>,
        feedback: Box<dyn FeedbackSink>,
        store: Box<dyn ParamStore>,
    ) -> Self {
        let session = Session::load(store.as_ref());
        Self {
            cfg,
            session,
            trial: None,
            phase: Phase::Idle,
            plan: Vec::new(),
            plan_pos: 0,
            timer: PhaseTimer::new(),
            gate: ResponseGate::new(),
            staircase: Staircase::new(),
            window: OutcomeWindow::new(),
            paused: false,
            help_open: false,
            pause_started: None,
            last_outcome: None,
            rng: SmallRng::seed_from_u64(seed),
            render,
            feedback,
            store,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn trial(&self) -> Option<&Trial> {
        self.trial.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&ScoreOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn help_open(&self) -> bool {
        self.help_open
    }

    /// Deadline of the pending phase timer, if any. The host sleeps until
    /// this instant and then calls [`TrialEngine::on_timer`].
    pub fn next_deadline(&self) -> Option<Millis> {
        self.timer.deadline()
    }

    /// Switch the task before a trial starts, re-clamping the set size into
    /// the new mode's domain.
    pub fn set_task(&mut self, mode: Option<Mode>, submode: Option<NumerositySubmode>) {
        if self.phase != Phase::Idle {
            return;
        }
        if let Some(mode) = mode {
            self.session.mode = mode;
            let (set_min, set_max) = mode.set_size_bounds();
            self.session.set_size = self.session.set_size.clamp(set_min, set_max);
            self.staircase.reset();
        }
        if let Some(submode) = submode {
            self.session.submode = submode;
        }
        self.session.save(self.store.as_mut());
    }

    /// Start the next trial: synthesize arrays for the active mode, build
    /// the phase plan and enter fixation. No-op outside idle or while
    /// paused.
    pub fn begin_trial(&mut self, now: Millis) {
        if self.phase != Phase::Idle || self.paused {
            return;
        }
        let trial = self.make_trial();
        let exposure = self.session.difficulty.exposure_ms;
        self.plan = build_plan(self.session.mode, self.session.submode, &self.cfg, exposure);
        self.plan_pos = 0;
        self.trial = Some(trial);
        self.gate.reset();
        debug!(
            trial = self.session.trial_index,
            mode = self.session.mode.as_str(),
            "trial start"
        );
        self.enter_current(now);
    }

    fn make_trial(&mut self) -> Trial {
        let budget = self.cfg.sampling.feature_retry_budget;
        let n = self.session.set_size as usize;
        let mut trial = Trial {
            memory: Vec::new(),
            test: Vec::new(),
            probe_index: None,
            change: false,
            count_a: None,
            count_b: None,
            b_larger: false,
            saccade_target: None,
            saccade_hit: false,
            test_onset: None,
        };
        match (self.session.mode, self.session.submode) {
            (Mode::Orientation, _) => {
                trial.memory = gen_orientation_array(&mut self.rng, n, budget);
                self.inject_change(&mut trial);
            }
            (Mode::Color, _) => {
                trial.memory = gen_color_array(&mut self.rng, n, budget);
                self.inject_change(&mut trial);
            }
            (Mode::SpatialFrequency, _) => {
                trial.memory = gen_frequency_array(&mut self.rng, n, budget);
                self.inject_change(&mut trial);
            }
            (Mode::Saccade, _) => {
                trial.memory = gen_orientation_array(&mut self.rng, n, budget);
                self.inject_change(&mut trial);
                let angle = self.rng.random_range(0.0..TAU);
                let radius =
                    self.rng.random_range(0.35f32..0.95) * self.cfg.field.field_radius_px;
                trial.saccade_target = Some(polar_point(angle, radius));
            }
            (Mode::Numerosity, NumerositySubmode::Enumerate) => {
                let count = jittered_count(&mut self.rng, self.session.difficulty.anchor);
                trial.memory = self.shape_field(count).items;
            }
            (Mode::Numerosity, NumerositySubmode::Compare) => {
                let (count_a, count_b, b_larger) = compare_counts(
                    &mut self.rng,
                    self.session.difficulty.anchor,
                    self.session.difficulty.compare_delta,
                    COUNT_MIN,
                    COUNT_MAX,
                );
                trial.memory = self.shape_field(count_a).items;
                trial.test = self.shape_field(count_b).items;
                trial.count_a = Some(count_a);
                trial.count_b = Some(count_b);
                trial.b_larger = b_larger;
            }
        }
        trial
    }

    fn inject_change(&mut self, trial: &mut Trial) {
        let (test, plan) = inject(&mut self.rng, &trial.memory);
        trial.test = test;
        trial.change = plan.change;
        trial.probe_index = plan.probe_index;
    }

    fn shape_field(&mut self, count: u8) -> crate::task::stimulus::ShapeField {
        let params = ShapeFieldParams {
            count: count as usize,
            min_separation_px: self.session.difficulty.min_separation_px,
            similarity: self.session.difficulty.similarity,
            field_radius_px: self.cfg.field.field_radius_px,
            attempt_budget: self.cfg.sampling.placement_retry_budget,
        };
        gen_shape_field(&mut self.rng, &params)
    }

    fn enter_current(&mut self, now: Millis) {
        let (phase, duration) = self.plan[self.plan_pos];
        self.phase = phase;
        if phase == Phase::Test {
            if let Some(trial) = self.trial.as_mut() {
                trial.test_onset = Some(now);
            }
            self.gate.reset();
        }
        // One cancel, then one arm: a stale deadline must never survive a
        // phase change.
        self.timer.cancel();
        self.timer.arm(now, duration);
        self.render
            .render(self.phase, &self.session, self.trial.as_ref());
    }

    /// Advance on deadline expiry. Early or stale wakeups (deadline already
    /// cancelled) are no-ops.
    pub fn on_timer(&mut self, now: Millis) {
        if self.paused || !self.timer.expired(now) {
            return;
        }
        self.timer.cancel();
        if self.phase == Phase::Test {
            // Window elapsed with no input: scored incorrect at the full
            // window duration.
            let rt = self.cfg.timing.resp_window_ms;
            self.complete_trial(false, rt);
            return;
        }
        if self.phase == Phase::Idle {
            return;
        }
        self.plan_pos += 1;
        self.enter_current(now);
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Millis) {
        match event {
            InputEvent::TogglePause => self.toggle_pause(now),
            InputEvent::ToggleHelp => {
                self.help_open = !self.help_open;
            }
            InputEvent::ResetStats => {
                self.session.reset_stats(self.store.as_mut());
                self.staircase.reset();
                self.window = OutcomeWindow::new();
                info!("session statistics reset");
            }
            InputEvent::Pointer { x, y } => self.handle_pointer(x, y),
            _ => self.handle_judgement(event, now),
        }
    }

    fn toggle_pause(&mut self, now: Millis) {
        if self.paused {
            self.timer.resume(now);
            if let (Phase::Test, Some(started)) = (self.phase, self.pause_started) {
                // Time spent paused never counts toward reaction time.
                if let Some(trial) = self.trial.as_mut() {
                    if let Some(onset) = trial.test_onset {
                        trial.test_onset = Some(onset + now.saturating_sub(started));
                    }
                }
            }
            self.paused = false;
            self.pause_started = None;
            debug!("resumed");
        } else {
            self.timer.pause(now);
            self.paused = true;
            self.pause_started = Some(now);
            debug!("paused");
        }
    }

    fn handle_pointer(&mut self, x: f32, y: f32) {
        if self.phase != Phase::SaccadeOn || self.paused {
            return;
        }
        if let Some(trial) = self.trial.as_mut() {
            if let Some(target) = trial.saccade_target {
                if target.dist(Vec2::new(x, y)) <= self.cfg.field.saccade_hit_radius_px {
                    trial.saccade_hit = true;
                }
            }
        }
    }

    fn handle_judgement(&mut self, event: InputEvent, now: Millis) {
        if self.phase != Phase::Test || self.paused || self.help_open {
            return;
        }
        let judgement =
            match self
                .gate
                .try_accept(self.session.mode, self.session.submode, &event)
            {
                Some(j) => j,
                None => return,
            };
        // Cancel before scoring so the window timeout can never fire on a
        // trial that was just answered.
        self.timer.cancel();
        let (correct, rt) = match self.trial.as_ref() {
            Some(trial) => {
                let onset = trial.test_onset.unwrap_or(now);
                (is_correct(trial, judgement), now.saturating_sub(onset))
            }
            None => return,
        };
        self.complete_trial(correct, rt);
    }

    fn complete_trial(&mut self, correct: bool, rt_ms: Millis) {
        let outcome = score(self.session.points, correct, rt_ms);
        self.session.points = outcome.points_after;
        if correct {
            self.feedback.on_correct();
        } else {
            self.feedback.on_incorrect();
        }
        if outcome.rank_changed() {
            info!(rank = outcome.rank_after, "rank up");
            self.feedback.on_rank_up(outcome.rank_after);
        }

        if let Some(trial) = self.trial.as_ref() {
            if trial.saccade_hit {
                self.session.saccade_hits += 1;
            }
        }

        match self.session.mode {
            Mode::Orientation | Mode::Color | Mode::Saccade => {
                self.session.set_size = self.staircase.update(self.session.set_size, correct);
            }
            Mode::Numerosity => {
                self.window.push(correct, rt_ms);
                window_update(&mut self.session.difficulty, &self.window);
            }
            Mode::SpatialFrequency => {}
        }

        self.session.block_total += 1;
        if correct {
            self.session.block_correct += 1;
        }
        if self.session.block_total >= BLOCK_SIZE {
            if self.session.mode == Mode::SpatialFrequency {
                self.session.set_size = block_update(
                    self.session.set_size,
                    self.session.block_correct,
                    self.session.block_total,
                );
            }
            self.session.block_correct = 0;
            self.session.block_total = 0;
        }

        self.session.trial_index += 1;
        self.session.save(self.store.as_mut());

        info!(
            trial = self.session.trial_index,
            correct,
            rt_ms,
            awarded = outcome.awarded,
            points = self.session.points,
            "trial complete"
        );
        self.last_outcome = Some(outcome);
        self.phase = Phase::Idle;
        self.render
            .render(self.phase, &self.session, self.trial.as_ref());
    }

    /// Abandon whatever is pending. Safe to call twice.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.phase = Phase::Idle;
        info!(
            trials = self.session.trial_index,
            points = self.session.points,
            saccade_hits = self.session.saccade_hits,
            "session closed"
        );
    }
}
