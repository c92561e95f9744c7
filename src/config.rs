use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::task::Millis;

/// Durations of the timed display phases, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_fix_ms")]
    pub fix_ms: Millis,
    #[serde(default = "TimingConfig::default_pre_blank_ms")]
    pub pre_blank_ms: Millis,
    #[serde(default = "TimingConfig::default_mem_ms")]
    pub mem_ms: Millis,
    #[serde(default = "TimingConfig::default_isi_ms")]
    pub isi_ms: Millis,
    #[serde(default = "TimingConfig::default_resp_window_ms")]
    pub resp_window_ms: Millis,
    #[serde(default = "TimingConfig::default_saccade_on_ms")]
    pub saccade_on_ms: Millis,
    #[serde(default = "TimingConfig::default_saccade_blank_ms")]
    pub saccade_blank_ms: Millis,
}

impl TimingConfig {
    fn default_fix_ms() -> Millis {
        500
    }
    fn default_pre_blank_ms() -> Millis {
        500
    }
    fn default_mem_ms() -> Millis {
        500
    }
    fn default_isi_ms() -> Millis {
        800
    }
    fn default_resp_window_ms() -> Millis {
        2500
    }
    fn default_saccade_on_ms() -> Millis {
        350
    }
    fn default_saccade_blank_ms() -> Millis {
        450
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fix_ms: Self::default_fix_ms(),
            pre_blank_ms: Self::default_pre_blank_ms(),
            mem_ms: Self::default_mem_ms(),
            isi_ms: Self::default_isi_ms(),
            resp_window_ms: Self::default_resp_window_ms(),
            saccade_on_ms: Self::default_saccade_on_ms(),
            saccade_blank_ms: Self::default_saccade_blank_ms(),
        }
    }
}

/// Retry budgets bounding worst-case generation latency. Exhaustion falls
/// back to a deterministic layout, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "SamplingConfig::default_feature_retry_budget")]
    pub feature_retry_budget: u32,
    #[serde(default = "SamplingConfig::default_placement_retry_budget")]
    pub placement_retry_budget: u32,
}

impl SamplingConfig {
    fn default_feature_retry_budget() -> u32 {
        999
    }
    fn default_placement_retry_budget() -> u32 {
        5000
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            feature_retry_budget: Self::default_feature_retry_budget(),
            placement_retry_budget: Self::default_placement_retry_budget(),
        }
    }
}

/// Stimulus field geometry, in logical pixels centered on fixation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default = "FieldConfig::default_ring_radius_px")]
    pub ring_radius_px: f32,
    #[serde(default = "FieldConfig::default_field_radius_px")]
    pub field_radius_px: f32,
    #[serde(default = "FieldConfig::default_saccade_hit_radius_px")]
    pub saccade_hit_radius_px: f32,
}

impl FieldConfig {
    fn default_ring_radius_px() -> f32 {
        140.0
    }
    fn default_field_radius_px() -> f32 {
        220.0
    }
    fn default_saccade_hit_radius_px() -> f32 {
        48.0
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            ring_radius_px: Self::default_ring_radius_px(),
            field_radius_px: Self::default_field_radius_px(),
            saccade_hit_radius_px: Self::default_saccade_hit_radius_px(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub field: FieldConfig,
}

impl AppConfig {
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write commented defaults and return them.
        let default_cfg = Self::default();
        if let Ok(text) = toml::to_string_pretty(&default_cfg) {
            let mut commented = String::new();
            for line in text.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    commented.push('\n');
                } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                    commented.push_str(line);
                    commented.push('\n');
                } else {
                    commented.push_str("# ");
                    commented.push_str(line);
                    commented.push('\n');
                }
            }
            if let Err(err) = fs::write(path_obj, commented) {
                eprintln!("Failed to write default config to {path}: {err}");
            }
        } else {
            eprintln!("Failed to serialize default config; continuing with defaults");
        }
        default_cfg
    }
}
