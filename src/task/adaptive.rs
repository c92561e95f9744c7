//! Difficulty adaptation: three policies selected by task mode.
//!
//! Orientation, color and saccade modes run a per-trial staircase; spatial
//! frequency adapts only at block boundaries; numerosity steers five
//! parameters off a sliding window of recent outcomes.

use std::collections::VecDeque;

use rand::Rng;

use crate::task::Millis;

pub const BLOCK_SIZE: u32 = 20;

pub const SET_SIZE_MIN: u8 = 2;
pub const SET_SIZE_MAX: u8 = 10;
pub const SET_SIZE_DEFAULT: u8 = 3;
pub const SPATIAL_SET_MIN: u8 = 1;
pub const SPATIAL_SET_MAX: u8 = 7;

pub const COUNT_MIN: u8 = 4;
pub const COUNT_MAX: u8 = 10;

pub const WINDOW_LEN: usize = 16;

const STREAK_TO_ADVANCE: u32 = 3;
const BLOCK_ADVANCE_ACCURACY: f32 = 0.90;

const HARDER_MIN_ACCURACY: f32 = 0.75;
const HARDER_MAX_MEDIAN_RT: Millis = 900;
const EASIER_MAX_ACCURACY: f32 = 0.65;
const EASIER_MIN_MEDIAN_RT: Millis = 1150;

const EXPOSURE_STEP_MS: Millis = 20;
pub const EXPOSURE_MIN_MS: Millis = 120;
pub const EXPOSURE_MAX_MS: Millis = 350;
pub const EXPOSURE_DEFAULT_MS: Millis = 250;

const SEPARATION_STEP_PX: f32 = 2.0;
pub const SEPARATION_MIN_PX: f32 = 18.0;
pub const SEPARATION_MAX_PX: f32 = 48.0;
pub const SEPARATION_DEFAULT_PX: f32 = 32.0;

const SIMILARITY_STEP: f32 = 0.06;
pub const SIMILARITY_DEFAULT: f32 = 0.3;

pub const ANCHOR_MIN: u8 = COUNT_MIN + 1;
pub const ANCHOR_MAX: u8 = COUNT_MAX - 1;
pub const ANCHOR_DEFAULT: u8 = 6;

pub const COMPARE_DELTA_MIN: u8 = 1;
pub const COMPARE_DELTA_MAX: u8 = 3;
pub const COMPARE_DELTA_DEFAULT: u8 = 2;

/// Per-trial staircase: three consecutive correct responses step the set
/// size up, any error steps it down; either event resets the streak.
#[derive(Debug, Default, Clone)]
pub struct Staircase {
    streak: u32,
}

impl Staircase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, set_size: u8, correct: bool) -> u8 {
        if correct {
            self.streak += 1;
            if self.streak >= STREAK_TO_ADVANCE {
                self.streak = 0;
                return (set_size + 1).min(SET_SIZE_MAX);
            }
            set_size
        } else {
            self.streak = 0;
            set_size.saturating_sub(1).max(SET_SIZE_MIN)
        }
    }

    pub fn reset(&mut self) {
        self.streak = 0;
    }
}

/// Block staircase for spatial-frequency mode, applied only when a block of
/// trials completes.
pub fn block_update(set_size: u8, block_correct: u32, block_total: u32) -> u8 {
    if block_total == 0 {
        return set_size.clamp(SPATIAL_SET_MIN, SPATIAL_SET_MAX);
    }
    let accuracy = block_correct as f32 / block_total as f32;
    if accuracy >= BLOCK_ADVANCE_ACCURACY {
        (set_size + 2).min(SPATIAL_SET_MAX)
    } else {
        set_size.saturating_sub(1).max(SPATIAL_SET_MIN)
    }
}

/// The five numerosity difficulty parameters steered by the windowed
/// controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyParams {
    pub exposure_ms: Millis,
    pub min_separation_px: f32,
    pub similarity: f32,
    pub anchor: u8,
    pub compare_delta: u8,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self {
            exposure_ms: EXPOSURE_DEFAULT_MS,
            min_separation_px: SEPARATION_DEFAULT_PX,
            similarity: SIMILARITY_DEFAULT,
            anchor: ANCHOR_DEFAULT,
            compare_delta: COMPARE_DELTA_DEFAULT,
        }
    }
}

impl DifficultyParams {
    /// Clamp every field into its valid domain (used on persisted values).
    pub fn clamped(mut self) -> Self {
        self.exposure_ms = self.exposure_ms.clamp(EXPOSURE_MIN_MS, EXPOSURE_MAX_MS);
        self.min_separation_px = self
            .min_separation_px
            .clamp(SEPARATION_MIN_PX, SEPARATION_MAX_PX);
        self.similarity = self.similarity.clamp(0.0, 1.0);
        self.anchor = self.anchor.clamp(ANCHOR_MIN, ANCHOR_MAX);
        self.compare_delta = self.compare_delta.clamp(COMPARE_DELTA_MIN, COMPARE_DELTA_MAX);
        self
    }

    fn harder(&mut self) {
        self.exposure_ms = self
            .exposure_ms
            .saturating_sub(EXPOSURE_STEP_MS)
            .max(EXPOSURE_MIN_MS);
        self.min_separation_px = (self.min_separation_px - SEPARATION_STEP_PX).max(SEPARATION_MIN_PX);
        self.similarity = (self.similarity + SIMILARITY_STEP).min(1.0);
        self.anchor = (self.anchor + 1).min(ANCHOR_MAX);
        self.compare_delta = self.compare_delta.saturating_sub(1).max(COMPARE_DELTA_MIN);
    }

    fn easier(&mut self) {
        self.exposure_ms = (self.exposure_ms + EXPOSURE_STEP_MS).min(EXPOSURE_MAX_MS);
        self.min_separation_px = (self.min_separation_px + SEPARATION_STEP_PX).min(SEPARATION_MAX_PX);
        self.similarity = (self.similarity - SIMILARITY_STEP).max(0.0);
        self.anchor = self.anchor.saturating_sub(1).max(ANCHOR_MIN);
        self.compare_delta = (self.compare_delta + 1).min(COMPARE_DELTA_MAX);
    }
}

/// Sliding window of the most recent (correct, reaction time) outcomes.
#[derive(Debug, Default, Clone)]
pub struct OutcomeWindow {
    outcomes: VecDeque<(bool, Millis)>,
}

impl OutcomeWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, correct: bool, rt_ms: Millis) {
        if self.outcomes.len() == WINDOW_LEN {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back((correct, rt_ms));
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn accuracy(&self) -> f32 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let correct = self.outcomes.iter().filter(|(c, _)| *c).count();
        correct as f32 / self.outcomes.len() as f32
    }

    /// Median reaction time; even-length windows average the two middle
    /// values.
    pub fn median_rt(&self) -> Millis {
        if self.outcomes.is_empty() {
            return 0;
        }
        let mut rts: Vec<Millis> = self.outcomes.iter().map(|(_, rt)| *rt).collect();
        rts.sort_unstable();
        let mid = rts.len() / 2;
        if rts.len() % 2 == 1 {
            rts[mid]
        } else {
            (rts[mid - 1] + rts[mid]) / 2
        }
    }
}

/// Move the numerosity parameters one step toward harder or easier, or hold,
/// based on the rolling window. No movement until the window is full;
/// rolling stats over a handful of trials swing too wildly to steer five
/// parameters at once.
pub fn window_update(params: &mut DifficultyParams, window: &OutcomeWindow) {
    if window.len() < WINDOW_LEN {
        return;
    }
    let accuracy = window.accuracy();
    let median = window.median_rt();
    if accuracy >= HARDER_MIN_ACCURACY && median <= HARDER_MAX_MEDIAN_RT {
        params.harder();
    } else if accuracy < EASIER_MAX_ACCURACY || median > EASIER_MIN_MEDIAN_RT {
        params.easier();
    }
}

/// Next enumerate-trial count: the anchor plus a uniform jitter in
/// {−1, 0, +1}, clamped to the count bounds. The jitter keeps the next
/// count from being predictable off the staircase alone.
pub fn jittered_count<R: Rng + ?Sized>(rng: &mut R, anchor: u8) -> u8 {
    let jitter: i32 = rng.random_range(-1..=1);
    (anchor as i32 + jitter).clamp(COUNT_MIN as i32, COUNT_MAX as i32) as u8
}
