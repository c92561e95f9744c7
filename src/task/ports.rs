//! Collaborator ports: rendering, feedback, and parameter persistence.
//!
//! The engine only ever talks to these traits; hosts plug in real sinks and
//! tests plug in nulls or in-memory stores. Feedback methods default to
//! no-ops so an absent capability is just the trait's default body.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::task::session::Session;
use crate::task::trial_engine::{Phase, Trial};

pub trait RenderSink {
    /// Pure read of current state to produce a frame. The engine never
    /// waits on rendering.
    fn render(&mut self, phase: Phase, session: &Session, trial: Option<&Trial>);
}

#[derive(Debug, Default)]
pub struct NullRender;

impl RenderSink for NullRender {
    fn render(&mut self, _phase: Phase, _session: &Session, _trial: Option<&Trial>) {}
}

/// Fire-and-forget feedback events. A sink that cannot produce feedback
/// (no audio device, headless test) simply keeps the default bodies.
pub trait FeedbackSink {
    fn on_correct(&mut self) {}
    fn on_incorrect(&mut self) {}
    fn on_rank_up(&mut self, _rank: &str) {}
}

#[derive(Debug, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {}

/// Key/value persistence port. Values round-trip as numbers or strings;
/// the session layer owns clamping whatever comes back into valid domains.
pub trait ParamStore {
    fn load_num(&self, key: &str) -> Option<f64>;
    fn save_num(&mut self, key: &str, value: f64);
    fn load_str(&self, key: &str) -> Option<String>;
    fn save_str(&mut self, key: &str, value: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    nums: BTreeMap<String, f64>,
    strs: BTreeMap<String, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParamStore for MemStore {
    fn load_num(&self, key: &str) -> Option<f64> {
        self.nums.get(key).copied()
    }

    fn save_num(&mut self, key: &str, value: f64) {
        self.nums.insert(key.to_string(), value);
    }

    fn load_str(&self, key: &str) -> Option<String> {
        self.strs.get(key).cloned()
    }

    fn save_str(&mut self, key: &str, value: &str) {
        self.strs.insert(key.to_string(), value.to_string());
    }
}

/// Flat TOML file store, written through on every save. Unreadable or
/// malformed files start empty; the session defaults fill the gaps.
#[derive(Debug)]
pub struct TomlStore {
    path: PathBuf,
    values: toml::value::Table,
}

impl TomlStore {
    pub fn open(path: &str) -> Self {
        let path_obj = Path::new(path);
        let values = match fs::read_to_string(path_obj) {
            Ok(contents) => match toml::from_str::<toml::value::Table>(&contents) {
                Ok(table) => table,
                Err(err) => {
                    warn!(path, %err, "state file unparsable, starting fresh");
                    toml::value::Table::new()
                }
            },
            Err(_) => toml::value::Table::new(),
        };
        Self {
            path: path_obj.to_path_buf(),
            values,
        }
    }

    fn write_through(&self) {
        match toml::to_string_pretty(&self.values) {
            Ok(text) => {
                if let Err(err) = fs::write(&self.path, text) {
                    warn!(path = %self.path.display(), %err, "failed to write state file");
                }
            }
            Err(err) => warn!(%err, "failed to serialize state"),
        }
    }
}

impl ParamStore for TomlStore {
    fn load_num(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(toml::Value::Integer(i)) => Some(*i as f64),
            Some(toml::Value::Float(f)) => Some(*f),
            _ => None,
        }
    }

    fn save_num(&mut self, key: &str, value: f64) {
        let v = if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            toml::Value::Integer(value as i64)
        } else {
            toml::Value::Float(value)
        };
        self.values.insert(key.to_string(), v);
        self.write_through();
    }

    fn load_str(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(toml::Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn save_str(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), toml::Value::String(value.to_string()));
        self.write_through();
    }
}
