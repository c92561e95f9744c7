//! Input events and the one-shot response gate.
//!
//! The gate accepts exactly one qualifying judgement per trial; everything
//! else (wrong event for the mode, out-of-range digit, second input after
//! acceptance) is silently dropped.

use crate::task::adaptive::{COUNT_MAX, COUNT_MIN};
use crate::task::session::{Mode, NumerositySubmode};
use crate::task::trial_engine::Trial;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Same,
    Different,
    Digit(u8),
    ALarger,
    BLarger,
    Pointer { x: f32, y: f32 },
    ToggleHelp,
    TogglePause,
    ResetStats,
}

/// A validated judgement extracted from an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgement {
    /// true = respondent said "different".
    SaidDifferent(bool),
    /// Reported item count (enumerate).
    Count(u8),
    /// true = respondent said "B is larger" (compare).
    SaidBLarger(bool),
}

#[derive(Debug, Default)]
pub struct ResponseGate {
    accepted: bool,
}

impl ResponseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-open the gate for a fresh trial.
    pub fn reset(&mut self) {
        self.accepted = false;
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Accept the first qualifying event for the active mode; every later
    /// call returns None until the gate is reset.
    pub fn try_accept(
        &mut self,
        mode: Mode,
        submode: NumerositySubmode,
        event: &InputEvent,
    ) -> Option<Judgement> {
        if self.accepted {
            return None;
        }
        let judgement = match (mode, event) {
            (Mode::Numerosity, ev) => match (submode, ev) {
                (NumerositySubmode::Enumerate, InputEvent::Digit(d))
                    if (COUNT_MIN..=COUNT_MAX).contains(d) =>
                {
                    Some(Judgement::Count(*d))
                }
                (NumerositySubmode::Compare, InputEvent::ALarger) => {
                    Some(Judgement::SaidBLarger(false))
                }
                (NumerositySubmode::Compare, InputEvent::BLarger) => {
                    Some(Judgement::SaidBLarger(true))
                }
                _ => None,
            },
            (_, InputEvent::Same) => Some(Judgement::SaidDifferent(false)),
            (_, InputEvent::Different) => Some(Judgement::SaidDifferent(true)),
            _ => None,
        }?;
        self.accepted = true;
        Some(judgement)
    }
}

/// Correctness of a judgement against the trial's ground truth.
pub fn is_correct(trial: &Trial, judgement: Judgement) -> bool {
    match judgement {
        Judgement::SaidDifferent(said) => said == trial.change,
        Judgement::Count(count) => count as usize == trial.memory.len(),
        Judgement::SaidBLarger(said_b) => said_b == trial.b_larger,
    }
}
