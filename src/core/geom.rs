//! Plane geometry for stimulus layout: ring positions for the feature
//! modes, area-uniform disc sampling for numerosity fields.

use std::f32::consts::TAU;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dist(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn norm(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Position of item `index` of `n` on a ring of the given radius, centered
/// on the origin. Item 0 sits at angle 0; the rest follow at 2π·i/n.
pub fn ring_point(index: usize, n: usize, radius: f32) -> Vec2 {
    let n = n.max(1);
    let angle = TAU * index as f32 / n as f32;
    Vec2::new(radius * angle.cos(), radius * angle.sin())
}

/// Area-uniform random point inside a disc of the given radius. Radius is
/// sampled as R·√u so density is uniform over area, not over radius.
pub fn disc_point<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec2 {
    let r = radius * rng.random::<f32>().sqrt();
    let angle = rng.random_range(0.0..TAU);
    Vec2::new(r * angle.cos(), r * angle.sin())
}

/// Point at a polar offset from the origin.
pub fn polar_point(angle: f32, radius: f32) -> Vec2 {
    Vec2::new(radius * angle.cos(), radius * angle.sin())
}
