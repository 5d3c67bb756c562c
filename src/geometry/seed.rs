//! World-to-tracker seed transform and movement hysteresis
//!
//! A probe pose arrives in world coordinates. The tracking engine wants seeds
//! in its own native space, reached through the inverse of the session affine.
//! The tract worker only asks for new tracts when the probe has moved far
//! enough from the last position it tracked from, which is the pipeline's
//! main brake against a fast pose source.

use crate::error::{Result, TractError};
use crate::types::Pose;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Determinants at or below this magnitude are treated as singular
const SINGULAR_EPSILON: f64 = 1e-12;

/// Map a world-space position to tracker-space through `affine⁻¹`
///
/// The position is augmented to `[x, y, z, 1]`, multiplied by the inverse
/// affine, and the first three coordinates are returned. A singular affine
/// is an error; identity is never substituted.
pub fn compute_seed(position: &Point3<f64>, affine: &Matrix4<f64>) -> Result<Point3<f64>> {
    let inverse = invert_affine(affine)?;
    Ok(apply(&inverse, position))
}

fn invert_affine(affine: &Matrix4<f64>) -> Result<Matrix4<f64>> {
    if affine.iter().any(|v| !v.is_finite()) {
        return Err(TractError::Transform(
            "affine contains non-finite entries".to_string(),
        ));
    }

    let det = affine.determinant();
    if det.abs() <= SINGULAR_EPSILON {
        return Err(TractError::Transform(format!(
            "affine is singular (determinant {:e})",
            det
        )));
    }

    affine
        .try_inverse()
        .ok_or_else(|| TractError::Transform("affine could not be inverted".to_string()))
}

fn apply(matrix: &Matrix4<f64>, position: &Point3<f64>) -> Point3<f64> {
    let h = matrix * Vector4::new(position.x, position.y, position.z, 1.0);
    Point3::new(h.x, h.y, h.z)
}

/// Session affine between world and tracker space, with its inverse cached
///
/// Supplied once at session start and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    forward: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl AffineTransform {
    /// Validate and invert a world-to-tracker affine
    pub fn new(affine: Matrix4<f64>) -> Result<Self> {
        let inverse = invert_affine(&affine)?;
        Ok(Self {
            forward: affine,
            inverse,
        })
    }

    /// The identity transform
    pub fn identity() -> Self {
        Self {
            forward: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    /// The affine as supplied
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.forward
    }

    /// The cached inverse
    pub fn inverse(&self) -> &Matrix4<f64> {
        &self.inverse
    }

    /// World position to tracker-space seed
    pub fn to_tracker(&self, world: &Point3<f64>) -> Point3<f64> {
        apply(&self.inverse, world)
    }

    /// Tracker-space point back to world coordinates
    pub fn to_world(&self, tracker: &Point3<f64>) -> Point3<f64> {
        apply(&self.forward, tracker)
    }
}

/// Probe position used for seeding, in world coordinates
///
/// With a coregistered matrix, the translation column is stepped back by
/// `seed_offset` along the matrix's third column (the probe's pointing
/// axis). Without one, the raw position is used unchanged.
pub fn probe_position(pose: &Pose, seed_offset: f64) -> Point3<f64> {
    match pose.matrix {
        Some(m) => {
            let origin = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
            let axis = Vector3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]);
            Point3::from(origin - axis * seed_offset)
        }
        None => pose.position,
    }
}

/// Movement hysteresis on the probe position
///
/// Remembers the last accepted position and accepts a new one only when it
/// lies strictly further than `threshold` away. The first position after
/// construction or [`reset`](Self::reset) is always accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementGate {
    threshold: f64,
    last: Option<Point3<f64>>,
}

impl MovementGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last: None,
        }
    }

    /// Distance from the last accepted position, if any
    pub fn distance(&self, position: &Point3<f64>) -> Option<f64> {
        self.last.map(|last| (position - last).norm())
    }

    /// Accept `position` if it moved past the threshold, remembering it
    pub fn accept(&mut self, position: Point3<f64>) -> bool {
        let moved = match self.distance(&position) {
            Some(d) => d > self.threshold,
            None => true,
        };
        if moved {
            self.last = Some(position);
        }
        moved
    }

    /// Last accepted position
    pub fn last(&self) -> Option<Point3<f64>> {
        self.last
    }

    /// Forget the last accepted position
    pub fn reset(&mut self) {
        self.last = None;
    }
}
