//! Change injection between the memory and test arrays.
//!
//! A fair coin decides whether the trial is "different"; on a different
//! trial one uniformly chosen item has its judged feature perturbed by a
//! fixed step. Numerosity modes never go through here: enumerate trials
//! probe recall of a count and compare trials judge two independent arrays.

use rand::Rng;

use crate::core::circ::wrap_deg;
use crate::task::stimulus::{
    StimulusItem, FREQ_MAX, FREQ_MIN, HUE_PERIOD_DEG, ORI_PERIOD_DEG,
};

pub const ORI_SHIFT_DEG: f32 = 20.0;
pub const HUE_SHIFT_DEG: f32 = 30.0;
pub const FREQ_STEP_FRAC: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangePlan {
    pub change: bool,
    pub probe_index: Option<usize>,
}

fn perturb(rng: &mut impl Rng, item: StimulusItem) -> StimulusItem {
    let up = rng.random_bool(0.5);
    let sign = if up { 1.0 } else { -1.0 };
    match item {
        StimulusItem::Bar { angle_deg } => StimulusItem::Bar {
            angle_deg: wrap_deg(angle_deg + sign * ORI_SHIFT_DEG, ORI_PERIOD_DEG),
        },
        StimulusItem::ColoredBar { angle_deg, hue_deg } => StimulusItem::ColoredBar {
            angle_deg,
            hue_deg: wrap_deg(hue_deg + sign * HUE_SHIFT_DEG, HUE_PERIOD_DEG),
        },
        StimulusItem::GaborPatch { cycles } => StimulusItem::GaborPatch {
            cycles: (cycles * (1.0 + sign * FREQ_STEP_FRAC)).clamp(FREQ_MIN, FREQ_MAX),
        },
        // Shapes never carry a probed feature; compare/enumerate trials do
        // not inject changes.
        shape @ StimulusItem::Shape { .. } => shape,
    }
}

/// Build the test array from the memory array: identical on a "same" trial,
/// one probed item perturbed on a "different" trial.
pub fn inject(rng: &mut impl Rng, memory: &[StimulusItem]) -> (Vec<StimulusItem>, ChangePlan) {
    let mut test: Vec<StimulusItem> = memory.to_vec();
    if memory.is_empty() || !rng.random_bool(0.5) {
        return (
            test,
            ChangePlan {
                change: false,
                probe_index: None,
            },
        );
    }
    let probe = rng.random_range(0..memory.len());
    test[probe] = perturb(rng, test[probe]);
    (
        test,
        ChangePlan {
            change: true,
            probe_index: Some(probe),
        },
    )
}
