//! Direction-to-color encoding for streamlines
//!
//! Each point gets the absolute unit tangent of the segment leaving it,
//! scaled to a byte per channel: left-right runs red, front-back green,
//! up-down blue.

use crate::types::Rgb;
use nalgebra::{Point3, Vector3};

/// Encode per-point tangent directions as colors
///
/// Differences are taken between consecutive points. The last point has no
/// successor, so it reuses the difference to its predecessor with the sign
/// flipped, keeping the tangent pointing forward at the tail. Coincident
/// consecutive points give a zero color instead of NaN.
///
/// Returns one color per point, or nothing for fewer than 2 points since no
/// direction exists there.
pub fn simple_direction(points: &[Point3<f64>]) -> Vec<Rgb> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    (0..n)
        .map(|i| {
            let diff = if i + 1 < n {
                points[i + 1] - points[i]
            } else {
                -(points[n - 2] - points[n - 1])
            };
            encode(&diff)
        })
        .collect()
}

fn encode(diff: &Vector3<f64>) -> Rgb {
    let norm = diff.norm();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return [0, 0, 0];
    }
    let unit = diff / norm;
    [to_byte(unit.x), to_byte(unit.y), to_byte(unit.z)]
}

fn to_byte(component: f64) -> u8 {
    (255.0 * component.abs()).clamp(0.0, 255.0) as u8
}
