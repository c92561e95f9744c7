//! Per-mode stimulus array synthesis.
//!
//! Feature values are rejection-sampled under pairwise distinctness
//! constraints with a bounded retry budget; placement inside the numerosity
//! field works the same way. Budget exhaustion never fails a trial: feature
//! sampling falls through (orientation/hue) or refills deterministically
//! (frequency), and shape placement completes on a deterministic ring.

use rand::Rng;
use tracing::warn;

use crate::core::circ::{circ_dist_deg, rel_separation, wrap_deg};
use crate::core::geom::{disc_point, ring_point, Vec2};

pub const ORI_PERIOD_DEG: f32 = 180.0;
pub const HUE_PERIOD_DEG: f32 = 360.0;
pub const ORI_MIN_SEP_DEG: f32 = 20.0;
pub const HUE_MIN_SEP_DEG: f32 = 30.0;

/// Grating frequency bounds, in cycles per stimulus diameter (viewing
/// geometry is not modeled, so these are not cycles per degree).
pub const FREQ_MIN: f32 = 1.0;
pub const FREQ_MAX: f32 = 6.0;
pub const FREQ_MIN_REL_SEP: f32 = 0.12;

/// Ceiling on the probability of reusing the base shape kind, however high
/// the similarity parameter goes; a fully homogeneous field would make the
/// count trivially groupable.
pub const KIND_REUSE_CAP: f32 = 0.84;
const HUE_JITTER_HALF_DEG: f32 = 90.0;

const SHAPE_SIZE_MIN_PX: f32 = 14.0;
const SHAPE_SIZE_MAX_PX: f32 = 26.0;
const SHAPE_MARGIN_PX: f32 = 14.0;
const FALLBACK_RING_FRACTION: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Bar,
}

impl ShapeKind {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..4u8) {
            0 => Self::Circle,
            1 => Self::Square,
            2 => Self::Triangle,
            _ => Self::Bar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StimulusItem {
    Bar {
        angle_deg: f32,
    },
    ColoredBar {
        angle_deg: f32,
        hue_deg: f32,
    },
    GaborPatch {
        cycles: f32,
    },
    Shape {
        kind: ShapeKind,
        size_px: f32,
        rotation_deg: f32,
        hue_deg: f32,
        pos: Vec2,
    },
}

impl StimulusItem {
    pub fn angle_deg(&self) -> Option<f32> {
        match self {
            Self::Bar { angle_deg } | Self::ColoredBar { angle_deg, .. } => Some(*angle_deg),
            _ => None,
        }
    }

    pub fn hue_deg(&self) -> Option<f32> {
        match self {
            Self::ColoredBar { hue_deg, .. } | Self::Shape { hue_deg, .. } => Some(*hue_deg),
            _ => None,
        }
    }

    pub fn cycles(&self) -> Option<f32> {
        match self {
            Self::GaborPatch { cycles } => Some(*cycles),
            _ => None,
        }
    }

    pub fn pos(&self) -> Option<Vec2> {
        match self {
            Self::Shape { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}

/// Position of ring-mode item `index` of `len`. Render sinks and tests use
/// the same function, so layout stays a pure function of the array.
pub fn ring_position(index: usize, len: usize, ring_radius_px: f32) -> Vec2 {
    ring_point(index, len, ring_radius_px)
}

/// Whole-array restarts before the fall-through: a corner left by earlier
/// placements is cheaper to unwind by restarting than to escape by
/// redrawing the stuck item.
const ARRAY_RESTARTS: u32 = 50;

/// One sequential pass: each item gets up to `budget` draws to clear the
/// `distinct` constraint against everything already accepted.
fn try_sample_distinct<R, S, D>(
    rng: &mut R,
    n: usize,
    budget: u32,
    sample: &mut S,
    distinct: &D,
) -> Option<Vec<f32>>
where
    R: Rng + ?Sized,
    S: FnMut(&mut R) -> f32,
    D: Fn(f32, f32) -> bool,
{
    let mut values: Vec<f32> = Vec::with_capacity(n);
    while values.len() < n {
        let mut attempts = budget;
        loop {
            let candidate = sample(rng);
            if values.iter().all(|&v| distinct(candidate, v)) {
                values.push(candidate);
                break;
            }
            if attempts == 0 {
                return None;
            }
            attempts -= 1;
        }
    }
    Some(values)
}

/// Draw `n` pairwise-distinct values, restarting the array when a pass gets
/// stuck. Past the circle's packing capacity (nine 20°-separated
/// orientations, twelve 30°-separated hues) no pass can finish; the final
/// pass then accepts close values so the array always completes.
fn sample_distinct<R, S, D>(
    rng: &mut R,
    n: usize,
    budget: u32,
    mut sample: S,
    distinct: D,
    what: &str,
) -> Vec<f32>
where
    R: Rng + ?Sized,
    S: FnMut(&mut R) -> f32,
    D: Fn(f32, f32) -> bool,
{
    for _ in 0..ARRAY_RESTARTS {
        if let Some(values) = try_sample_distinct(rng, n, budget, &mut sample, &distinct) {
            return values;
        }
    }
    warn!(what, n, "distinctness budget exhausted, accepting close values");
    let mut values: Vec<f32> = Vec::with_capacity(n);
    while values.len() < n {
        let mut attempts = budget;
        let mut candidate = sample(rng);
        while attempts > 0 && !values.iter().all(|&v| distinct(candidate, v)) {
            attempts -= 1;
            candidate = sample(rng);
        }
        values.push(candidate);
    }
    values
}

/// Memory array for orientation mode: bars on the ring, orientations
/// pairwise ≥ 20° apart on the 180° circle.
pub fn gen_orientation_array<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    retry_budget: u32,
) -> Vec<StimulusItem> {
    let angles = sample_distinct(
        rng,
        n,
        retry_budget,
        |rng| rng.random_range(0.0..ORI_PERIOD_DEG),
        |a, b| circ_dist_deg(a, b, ORI_PERIOD_DEG) >= ORI_MIN_SEP_DEG,
        "orientation",
    );
    angles
        .into_iter()
        .map(|angle_deg| StimulusItem::Bar { angle_deg })
        .collect()
}

/// Memory array for color mode: hued bars, hues pairwise ≥ 30° apart on the
/// 360° circle. Orientations are free (not the judged feature).
pub fn gen_color_array<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    retry_budget: u32,
) -> Vec<StimulusItem> {
    let hues = sample_distinct(
        rng,
        n,
        retry_budget,
        |rng| rng.random_range(0.0..HUE_PERIOD_DEG),
        |a, b| circ_dist_deg(a, b, HUE_PERIOD_DEG) >= HUE_MIN_SEP_DEG,
        "hue",
    );
    hues.into_iter()
        .map(|hue_deg| StimulusItem::ColoredBar {
            angle_deg: rng.random_range(0.0..ORI_PERIOD_DEG),
            hue_deg,
        })
        .collect()
}

/// Evenly spaced frequency grid across the full range; for the set sizes
/// this mode runs at, adjacent grid values always clear the relative
/// separation floor.
fn linear_frequency_fill(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![(FREQ_MIN + FREQ_MAX) * 0.5];
    }
    let step = (FREQ_MAX - FREQ_MIN) / (n - 1) as f32;
    (0..n).map(|i| FREQ_MIN + step * i as f32).collect()
}

/// Memory array for spatial-frequency mode: windowed gratings, frequencies
/// pairwise ≥ 12% apart in relative separation. Falls back to the
/// deterministic grid when sampling cannot place all items.
pub fn gen_frequency_array<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    retry_budget: u32,
) -> Vec<StimulusItem> {
    let mut values = None;
    for _ in 0..ARRAY_RESTARTS {
        values = try_sample_distinct(
            rng,
            n,
            retry_budget,
            &mut |rng: &mut R| rng.random_range(FREQ_MIN..FREQ_MAX),
            &|a, b| rel_separation(a, b) >= FREQ_MIN_REL_SEP,
        );
        if values.is_some() {
            break;
        }
    }
    let values = values.unwrap_or_else(|| {
        warn!(n, "frequency sampling exhausted, using linear fill");
        linear_frequency_fill(n)
    });
    values
        .into_iter()
        .map(|cycles| StimulusItem::GaborPatch { cycles })
        .collect()
}

/// Parameters for a numerosity shape field.
#[derive(Debug, Clone, Copy)]
pub struct ShapeFieldParams {
    pub count: usize,
    pub min_separation_px: f32,
    /// Perceptual grouping knob in [0,1]: high values reuse one base shape
    /// kind and squeeze hue variation toward a single color.
    pub similarity: f32,
    pub field_radius_px: f32,
    pub attempt_budget: u32,
}

#[derive(Debug, Clone)]
pub struct ShapeField {
    pub items: Vec<StimulusItem>,
    /// True when rejection sampling ran out of attempts and the ring layout
    /// completed the field; separation is not guaranteed in that case.
    pub degraded: bool,
}

/// `count` shapes placed area-uniformly inside the field disc, pairwise at
/// least `min_separation_px` apart. Placement that cannot satisfy the
/// separation within the attempt budget completes on a deterministic ring,
/// so exactly `count` shapes always come back.
pub fn gen_shape_field<R: Rng + ?Sized>(rng: &mut R, params: &ShapeFieldParams) -> ShapeField {
    let similarity = params.similarity.clamp(0.0, 1.0);
    let base_kind = ShapeKind::sample(rng);
    let base_hue = rng.random_range(0.0..HUE_PERIOD_DEG);
    let hue_jitter = (1.0 - similarity) * HUE_JITTER_HALF_DEG;
    let reuse_p = similarity.min(KIND_REUSE_CAP) as f64;
    let place_radius = (params.field_radius_px - SHAPE_MARGIN_PX).max(1.0);

    let mut positions: Vec<Vec2> = Vec::with_capacity(params.count);
    let mut attempts = params.attempt_budget;
    let mut degraded = false;
    while positions.len() < params.count {
        if attempts == 0 {
            degraded = true;
            break;
        }
        attempts -= 1;
        let p = disc_point(rng, place_radius);
        if positions
            .iter()
            .all(|&q| p.dist(q) >= params.min_separation_px)
        {
            positions.push(p);
        }
    }
    if degraded {
        let missing = params.count - positions.len();
        warn!(
            count = params.count,
            missing, "shape placement budget exhausted, filling on ring"
        );
        let ring_radius = params.field_radius_px * FALLBACK_RING_FRACTION;
        let start = positions.len();
        for i in 0..missing {
            positions.push(ring_point(start + i, params.count.max(1), ring_radius));
        }
    }

    let items = positions
        .into_iter()
        .map(|pos| {
            let kind = if rng.random_bool(reuse_p) {
                base_kind
            } else {
                ShapeKind::sample(rng)
            };
            let hue_deg = if hue_jitter > 0.0 {
                wrap_deg(
                    base_hue + rng.random_range(-hue_jitter..hue_jitter),
                    HUE_PERIOD_DEG,
                )
            } else {
                base_hue
            };
            StimulusItem::Shape {
                kind,
                size_px: rng.random_range(SHAPE_SIZE_MIN_PX..SHAPE_SIZE_MAX_PX),
                rotation_deg: rng.random_range(0.0..360.0),
                hue_deg,
                pos,
            }
        })
        .collect();

    ShapeField { items, degraded }
}

/// Counts for a comparison trial: the pair differs by exactly `delta`,
/// shifted (never squeezed) into the count bounds, larger side chosen by a
/// fair coin. Returns (count_a, count_b, b_larger).
pub fn compare_counts<R: Rng + ?Sized>(
    rng: &mut R,
    anchor: u8,
    delta: u8,
    count_min: u8,
    count_max: u8,
) -> (u8, u8, bool) {
    let delta = delta.max(1) as i32;
    let mut low = anchor as i32 - delta / 2;
    let mut high = low + delta;
    if low < count_min as i32 {
        let shift = count_min as i32 - low;
        low += shift;
        high += shift;
    }
    if high > count_max as i32 {
        let shift = high - count_max as i32;
        low -= shift;
        high -= shift;
    }
    let low = low.clamp(count_min as i32, count_max as i32) as u8;
    let high = high.clamp(count_min as i32, count_max as i32) as u8;
    let b_larger = rng.random_bool(0.5);
    if b_larger {
        (low, high, true)
    } else {
        (high, low, false)
    }
}
