//! Process-lifetime session state and its persistence.
//!
//! Everything loaded from the store is clamped into its valid domain before
//! use; malformed or missing values fall back to defaults. The session is
//! mutated only at trial-completion boundaries and by the explicit reset
//! command.

use tracing::debug;

use crate::task::adaptive::{
    DifficultyParams, ANCHOR_DEFAULT, BLOCK_SIZE, COMPARE_DELTA_DEFAULT, EXPOSURE_DEFAULT_MS,
    SEPARATION_DEFAULT_PX, SET_SIZE_DEFAULT, SET_SIZE_MAX, SET_SIZE_MIN, SIMILARITY_DEFAULT,
    SPATIAL_SET_MAX, SPATIAL_SET_MIN,
};
use crate::task::ports::ParamStore;

pub mod keys {
    pub const POINTS: &str = "points";
    pub const TRIAL_INDEX: &str = "trial_index";
    pub const BLOCK_CORRECT: &str = "block_correct";
    pub const BLOCK_TOTAL: &str = "block_total";
    pub const SET_SIZE: &str = "set_size";
    pub const MODE: &str = "mode";
    pub const SUBMODE: &str = "numerosity_submode";
    pub const CONTRAST: &str = "contrast";
    pub const NUM_EXPOSURE_MS: &str = "num_exposure_ms";
    pub const NUM_MIN_SEPARATION_PX: &str = "num_min_separation_px";
    pub const NUM_SIMILARITY: &str = "num_similarity";
    pub const NUM_ANCHOR: &str = "num_anchor";
    pub const NUM_COMPARE_DELTA: &str = "num_compare_delta";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Orientation,
    Color,
    SpatialFrequency,
    Numerosity,
    Saccade,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orientation => "orientation",
            Self::Color => "color",
            Self::SpatialFrequency => "spatial",
            Self::Numerosity => "numerosity",
            Self::Saccade => "saccade",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "color" => Self::Color,
            "spatial" | "spatial-frequency" => Self::SpatialFrequency,
            "numerosity" => Self::Numerosity,
            "saccade" => Self::Saccade,
            _ => Self::Orientation,
        }
    }

    /// Valid set-size domain for the memory array in this mode. Numerosity
    /// counts are governed by the anchor, not the set size.
    pub fn set_size_bounds(&self) -> (u8, u8) {
        match self {
            Self::SpatialFrequency => (SPATIAL_SET_MIN, SPATIAL_SET_MAX),
            _ => (SET_SIZE_MIN, SET_SIZE_MAX),
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumerositySubmode {
    Enumerate,
    Compare,
}

impl NumerositySubmode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enumerate => "enumerate",
            Self::Compare => "compare",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "compare" => Self::Compare,
            _ => Self::Enumerate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastCondition {
    Sharp,
    Blurred,
}

impl ContrastCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sharp => "sharp",
            Self::Blurred => "blurred",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "blurred" => Self::Blurred,
            _ => Self::Sharp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Cumulative score; only ever increases.
    pub points: u64,
    pub trial_index: u64,
    pub block_correct: u32,
    pub block_total: u32,
    pub set_size: u8,
    pub mode: Mode,
    pub submode: NumerositySubmode,
    pub contrast: ContrastCondition,
    pub difficulty: DifficultyParams,
    /// Saccade-compliance tally for this process run; not persisted.
    pub saccade_hits: u64,
}

fn load_clamped(store: &dyn ParamStore, key: &str, min: f64, max: f64, default: f64) -> f64 {
    match store.load_num(key) {
        Some(v) if v.is_finite() => {
            let clamped = v.clamp(min, max);
            if clamped != v {
                debug!(key, raw = v, clamped, "persisted value out of domain");
            }
            clamped
        }
        Some(v) => {
            debug!(key, raw = v, default, "persisted value not finite");
            default
        }
        None => default,
    }
}

impl Session {
    pub fn load(store: &dyn ParamStore) -> Self {
        let mode = store
            .load_str(keys::MODE)
            .map(|s| Mode::from_str(&s))
            .unwrap_or(Mode::Orientation);
        let submode = store
            .load_str(keys::SUBMODE)
            .map(|s| NumerositySubmode::from_str(&s))
            .unwrap_or(NumerositySubmode::Enumerate);
        let contrast = store
            .load_str(keys::CONTRAST)
            .map(|s| ContrastCondition::from_str(&s))
            .unwrap_or(ContrastCondition::Sharp);

        let (set_min, set_max) = mode.set_size_bounds();
        let set_size = load_clamped(
            store,
            keys::SET_SIZE,
            set_min as f64,
            set_max as f64,
            SET_SIZE_DEFAULT.clamp(set_min, set_max) as f64,
        ) as u8;

        let difficulty = DifficultyParams {
            exposure_ms: load_clamped(
                store,
                keys::NUM_EXPOSURE_MS,
                0.0,
                f64::MAX,
                EXPOSURE_DEFAULT_MS as f64,
            ) as u64,
            min_separation_px: load_clamped(
                store,
                keys::NUM_MIN_SEPARATION_PX,
                0.0,
                f64::MAX,
                SEPARATION_DEFAULT_PX as f64,
            ) as f32,
            similarity: load_clamped(store, keys::NUM_SIMILARITY, 0.0, 1.0, SIMILARITY_DEFAULT as f64)
                as f32,
            anchor: load_clamped(store, keys::NUM_ANCHOR, 0.0, 255.0, ANCHOR_DEFAULT as f64) as u8,
            compare_delta: load_clamped(
                store,
                keys::NUM_COMPARE_DELTA,
                0.0,
                255.0,
                COMPARE_DELTA_DEFAULT as f64,
            ) as u8,
        }
        .clamped();

        Self {
            points: load_clamped(store, keys::POINTS, 0.0, u64::MAX as f64, 0.0) as u64,
            trial_index: load_clamped(store, keys::TRIAL_INDEX, 0.0, u64::MAX as f64, 0.0) as u64,
            block_correct: load_clamped(store, keys::BLOCK_CORRECT, 0.0, BLOCK_SIZE as f64, 0.0)
                as u32,
            block_total: load_clamped(store, keys::BLOCK_TOTAL, 0.0, BLOCK_SIZE as f64, 0.0) as u32,
            set_size,
            mode,
            submode,
            contrast,
            difficulty,
            saccade_hits: 0,
        }
    }

    pub fn save(&self, store: &mut dyn ParamStore) {
        store.save_num(keys::POINTS, self.points as f64);
        store.save_num(keys::TRIAL_INDEX, self.trial_index as f64);
        store.save_num(keys::BLOCK_CORRECT, self.block_correct as f64);
        store.save_num(keys::BLOCK_TOTAL, self.block_total as f64);
        store.save_num(keys::SET_SIZE, self.set_size as f64);
        store.save_str(keys::MODE, self.mode.as_str());
        store.save_str(keys::SUBMODE, self.submode.as_str());
        store.save_str(keys::CONTRAST, self.contrast.as_str());
        store.save_num(keys::NUM_EXPOSURE_MS, self.difficulty.exposure_ms as f64);
        store.save_num(
            keys::NUM_MIN_SEPARATION_PX,
            self.difficulty.min_separation_px as f64,
        );
        store.save_num(keys::NUM_SIMILARITY, self.difficulty.similarity as f64);
        store.save_num(keys::NUM_ANCHOR, self.difficulty.anchor as f64);
        store.save_num(keys::NUM_COMPARE_DELTA, self.difficulty.compare_delta as f64);
    }

    /// Zero the performance counters and return the set size to its
    /// starting value. Mode, contrast, sub-mode and the numerosity
    /// difficulty parameters are left untouched.
    pub fn reset_stats(&mut self, store: &mut dyn ParamStore) {
        self.points = 0;
        self.trial_index = 0;
        self.block_correct = 0;
        self.block_total = 0;
        let (set_min, set_max) = self.mode.set_size_bounds();
        self.set_size = SET_SIZE_DEFAULT.clamp(set_min, set_max);
        store.save_num(keys::POINTS, 0.0);
        store.save_num(keys::TRIAL_INDEX, 0.0);
        store.save_num(keys::BLOCK_CORRECT, 0.0);
        store.save_num(keys::BLOCK_TOTAL, 0.0);
        store.save_num(keys::SET_SIZE, self.set_size as f64);
    }
}
