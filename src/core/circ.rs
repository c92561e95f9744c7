//! Wrapped-domain arithmetic for periodic feature spaces (orientation is
//! 180-periodic, hue is 360-periodic).

#[inline]
pub fn wrap_deg(x: f32, period: f32) -> f32 {
    x.rem_euclid(period)
}

/// Shortest distance between two values on a circle of the given period.
#[inline]
pub fn circ_dist_deg(a: f32, b: f32, period: f32) -> f32 {
    let d = (a - b).abs().rem_euclid(period);
    d.min(period - d)
}

/// Relative separation of two positive scalars: |a−b| / mean(a, b).
#[inline]
pub fn rel_separation(a: f32, b: f32) -> f32 {
    (a - b).abs() / ((a + b) * 0.5)
}
